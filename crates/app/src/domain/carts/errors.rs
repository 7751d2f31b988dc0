//! Carts service errors.

use marketplace::cart::CartError;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("failed to load saved cart")]
    Storage(#[from] StorageError),

    #[error("cart change was refused")]
    Refused(#[from] CartError),
}
