//! Checkout service errors.

use marketplace::checkout::CheckoutError;
use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    #[error(transparent)]
    Validation(#[from] CheckoutError),

    #[error("failed to place order")]
    PlacementFailed(#[source] RepositoryError),
}
