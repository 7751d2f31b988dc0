//! Marketplace
//!
//! Client-side domain model for a neighbourhood marketplace: a cart partitioned by shop,
//! checkout pricing and validation, the order status lifecycle and order-linked messaging.

pub mod cart;
pub mod checkout;
pub mod ids;
pub mod messaging;
pub mod orders;
pub mod prelude;
pub mod pricing;
