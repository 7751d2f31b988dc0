//! Device-local key-value storage.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Key the cart is stored under.
pub const CART_KEY: &str = "cart";

/// Key the signed-in user's session is stored under.
pub const SESSION_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed")]
    Io(#[from] std::io::Error),

    #[error("storage file is malformed")]
    Malformed(#[source] serde_json::Error),

    #[error("storage file could not be encoded")]
    Encode(#[source] serde_json::Error),
}

/// A string key-value store that survives app restarts.
#[automock]
#[async_trait]
pub trait LocalStorage: Send + Sync {
    /// Read a value.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key succeeds.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
