//! Messaging

pub mod errors;
pub mod notifier;
pub mod repository;
pub mod service;

pub use errors::MessagingServiceError;
pub use notifier::*;
pub use repository::*;
pub use service::*;
