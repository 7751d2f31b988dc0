//! Messaging service errors.

use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum MessagingServiceError {
    #[error("you can't start a conversation with yourself")]
    SelfConversation,

    #[error("failed to open conversation")]
    Thread(#[source] RepositoryError),

    #[error("failed to send message")]
    Send(#[source] RepositoryError),

    #[error("failed to load messages")]
    Load(#[source] RepositoryError),

    #[error("failed to mark conversation as read")]
    MarkRead(#[source] RepositoryError),
}
