//! Marketplace application services: cart persistence, checkout, order status and messaging
//! over pluggable backend collaborators.

pub mod config;
pub mod context;
pub mod domain;
pub mod observability;
pub mod repository;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test;
