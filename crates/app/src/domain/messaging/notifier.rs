//! Push notifications.

use async_trait::async_trait;
use marketplace::{
    ids::{ThreadUuid, UserUuid},
    messaging::MessageKind,
};
use mockall::automock;

use crate::repository::RepositoryError;

/// A push notification for a newly sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNotification {
    pub thread_id: ThreadUuid,
    pub recipient_id: UserUuid,
    pub sender_name: String,
    pub content: String,
    pub kind: MessageKind,
}

#[automock]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification to the recipient's devices.
    async fn send_message_notification(
        &self,
        notification: MessageNotification,
    ) -> Result<(), RepositoryError>;
}
