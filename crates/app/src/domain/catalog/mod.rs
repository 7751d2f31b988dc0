//! Shops and their stock.

pub mod repository;

pub use repository::*;
