//! Messaging service.
//!
//! Two-party threads between buyers and shop owners. Sending a message also pushes a
//! notification to the recipient; that push runs in the background and never fails the send.

use std::{cmp::Reverse, sync::Arc};

use async_trait::async_trait;
use marketplace::{
    ids::{ThreadUuid, UserUuid},
    messaging::{self, Message, MessageBody, NewMessage, Thread},
};
use mockall::automock;
use tracing::{debug, warn};

use crate::domain::messaging::{
    errors::MessagingServiceError,
    notifier::{MessageNotification, Notifier},
    repository::ThreadsRepository,
};

/// A message to send to the other participant of a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub thread_id: ThreadUuid,
    pub sender_id: UserUuid,
    pub sender_name: String,
    pub recipient_id: UserUuid,
    pub body: MessageBody,
}

/// A thread as listed in a user's inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadOverview {
    pub thread: Thread,
    pub unread: bool,
}

#[derive(Clone)]
pub struct BackendMessagingService {
    threads: Arc<dyn ThreadsRepository>,
    notifier: Arc<dyn Notifier>,
}

impl BackendMessagingService {
    #[must_use]
    pub fn new(threads: Arc<dyn ThreadsRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self { threads, notifier }
    }

    fn notify(&self, notification: MessageNotification) {
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            let thread_id = notification.thread_id;
            let recipient_id = notification.recipient_id;

            if let Err(error) = notifier.send_message_notification(notification).await {
                warn!(%thread_id, %recipient_id, %error, "failed to send message notification");
            }
        });
    }
}

impl std::fmt::Debug for BackendMessagingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendMessagingService").finish_non_exhaustive()
    }
}

#[async_trait]
impl MessagingService for BackendMessagingService {
    async fn create_or_get_thread(
        &self,
        a: UserUuid,
        b: UserUuid,
        initial: Option<NewMessage>,
    ) -> Result<Thread, MessagingServiceError> {
        if a == b {
            return Err(MessagingServiceError::SelfConversation);
        }

        let thread = self
            .threads
            .create_or_get_thread(messaging::participants(a, b), initial)
            .await
            .map_err(MessagingServiceError::Thread)?;

        debug!(thread_id = %thread.id, "opened thread");

        Ok(thread)
    }

    async fn send_message(
        &self,
        message: OutgoingMessage,
    ) -> Result<Message, MessagingServiceError> {
        let OutgoingMessage {
            thread_id,
            sender_id,
            sender_name,
            recipient_id,
            body,
        } = message;

        let content = body.preview();
        let kind = body.kind();

        let sent = self
            .threads
            .send_message(thread_id, NewMessage { sender_id, body })
            .await
            .map_err(MessagingServiceError::Send)?;

        debug!(%thread_id, message_id = %sent.id, %kind, "sent message");

        self.notify(MessageNotification {
            thread_id,
            recipient_id,
            sender_name,
            content,
            kind,
        });

        Ok(sent)
    }

    async fn mark_thread_as_read(
        &self,
        thread: ThreadUuid,
        user: UserUuid,
    ) -> Result<(), MessagingServiceError> {
        self.threads
            .mark_thread_as_read(thread, user)
            .await
            .map_err(MessagingServiceError::MarkRead)
    }

    async fn threads_for_user(
        &self,
        user: UserUuid,
    ) -> Result<Vec<ThreadOverview>, MessagingServiceError> {
        let mut threads = self
            .threads
            .get_threads_for_user(user)
            .await
            .map_err(MessagingServiceError::Load)?;

        threads.sort_by_key(|thread| Reverse(thread.updated_at));

        Ok(threads
            .into_iter()
            .map(|thread| ThreadOverview {
                unread: thread.is_unread_for(user),
                thread,
            })
            .collect())
    }

    async fn messages_for_thread(
        &self,
        thread: ThreadUuid,
    ) -> Result<Vec<Message>, MessagingServiceError> {
        let mut messages = self
            .threads
            .get_messages_for_thread(thread)
            .await
            .map_err(MessagingServiceError::Load)?;

        messages.sort_by_key(|message| message.sent_at);

        Ok(messages)
    }

    async fn unread_count(&self, user: UserUuid) -> Result<usize, MessagingServiceError> {
        let threads = self
            .threads
            .get_threads_for_user(user)
            .await
            .map_err(MessagingServiceError::Load)?;

        Ok(messaging::unread_count(&threads, user))
    }
}

#[automock]
#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Open the thread between two users, creating it with `initial` when missing.
    async fn create_or_get_thread(
        &self,
        a: UserUuid,
        b: UserUuid,
        initial: Option<NewMessage>,
    ) -> Result<Thread, MessagingServiceError>;

    /// Store a message and notify the recipient in the background.
    async fn send_message(
        &self,
        message: OutgoingMessage,
    ) -> Result<Message, MessagingServiceError>;

    async fn mark_thread_as_read(
        &self,
        thread: ThreadUuid,
        user: UserUuid,
    ) -> Result<(), MessagingServiceError>;

    /// A user's threads, most recently active first.
    async fn threads_for_user(
        &self,
        user: UserUuid,
    ) -> Result<Vec<ThreadOverview>, MessagingServiceError>;

    /// A thread's messages, oldest first.
    async fn messages_for_thread(
        &self,
        thread: ThreadUuid,
    ) -> Result<Vec<Message>, MessagingServiceError>;

    /// Number of threads with messages `user` has not read.
    async fn unread_count(&self, user: UserUuid) -> Result<usize, MessagingServiceError>;
}
