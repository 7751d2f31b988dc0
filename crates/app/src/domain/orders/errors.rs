//! Orders service errors.

use marketplace::orders::StatusError;
use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("only the shop can change an order's status")]
    ReadOnly,

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error("failed to update order")]
    Repository(#[from] RepositoryError),
}
