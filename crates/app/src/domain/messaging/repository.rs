//! Threads Repository

use async_trait::async_trait;
use marketplace::{
    ids::{ThreadUuid, UserUuid},
    messaging::{Message, NewMessage, Participants, Thread},
};
use mockall::automock;

use crate::repository::RepositoryError;

#[automock]
#[async_trait]
pub trait ThreadsRepository: Send + Sync {
    /// Return the thread between `participants`, creating it when missing.
    ///
    /// `initial` is stored as the first message only when the thread is created.
    async fn create_or_get_thread(
        &self,
        participants: Participants,
        initial: Option<NewMessage>,
    ) -> Result<Thread, RepositoryError>;

    /// Append a message and make it the thread's latest.
    async fn send_message(
        &self,
        thread: ThreadUuid,
        message: NewMessage,
    ) -> Result<Message, RepositoryError>;

    /// Record that `user` has read `thread` up to now.
    async fn mark_thread_as_read(
        &self,
        thread: ThreadUuid,
        user: UserUuid,
    ) -> Result<(), RepositoryError>;

    async fn get_threads_for_user(&self, user: UserUuid) -> Result<Vec<Thread>, RepositoryError>;

    async fn get_messages_for_thread(
        &self,
        thread: ThreadUuid,
    ) -> Result<Vec<Message>, RepositoryError>;
}
