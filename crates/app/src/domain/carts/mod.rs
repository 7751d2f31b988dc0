//! Carts

pub mod errors;
pub mod service;

pub use errors::CartsServiceError;
pub use service::*;
