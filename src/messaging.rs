//! Messaging
//!
//! Two-party threads between a buyer and a shop owner. Order messages carry a snapshot of the
//! order so a thread can be rendered without fetching the order itself.

use std::fmt::{self, Display, Formatter};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::{
    ids::{MessageUuid, OrderGroupUuid, OrderUuid, ShopUuid, ThreadUuid, UserUuid},
    orders::{DeliveryOption, Order, OrderItem, OrderStatus},
    pricing::format_minor,
};

/// The two participants of a thread, in a canonical order.
pub type Participants = SmallVec<[UserUuid; 2]>;

/// Build the participant list for a conversation between two users.
///
/// The pair is sorted so the same two users always map to the same thread.
pub fn participants(a: UserUuid, b: UserUuid) -> Participants {
    if a <= b { smallvec![a, b] } else { smallvec![b, a] }
}

/// Kind of message, as reported to push notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Free text.
    Text,

    /// An order summary.
    Order,
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Order => "order",
        })
    }
}

/// Snapshot of an order for display in a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    /// The summarised order.
    pub order_id: OrderUuid,

    /// Checkout the order belongs to.
    pub group: OrderGroupUuid,

    /// Shop fulfilling the order.
    pub shop_id: ShopUuid,

    /// Shop name.
    pub shop_name: String,

    /// Ordered lines.
    pub items: Vec<OrderItem>,

    /// Order total.
    pub total: u64,

    /// Status when the snapshot was taken.
    pub status: OrderStatus,

    /// Pickup or delivery.
    pub delivery_option: DeliveryOption,

    /// Where to deliver, if delivering.
    pub delivery_address: String,

    /// How many orders for this recipient the checkout produced.
    pub order_count: usize,
}

impl OrderSummary {
    /// Summarise the first of a recipient's orders.
    pub fn from_orders(orders: &[&Order]) -> Option<Self> {
        let first = orders.first()?;

        Some(Self {
            order_id: first.id,
            group: first.group,
            shop_id: first.shop_id,
            shop_name: first.shop_name.clone(),
            items: first.items.clone(),
            total: first.total,
            status: first.status,
            delivery_option: first.delivery_option,
            delivery_address: first.delivery_address.clone(),
            order_count: orders.len(),
        })
    }

    /// One-line description used for previews and notifications.
    pub fn headline(&self) -> String {
        let units: u64 = self.items.iter().map(|item| u64::from(item.quantity)).sum();
        let noun = if units == 1 { "item" } else { "items" };

        format!(
            "New {} order from {}: {units} {noun}, {}",
            self.delivery_option,
            self.shop_name,
            format_minor(self.total)
        )
    }
}

/// Message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBody {
    /// Free text.
    Text {
        /// The text.
        text: String,
    },

    /// An order summary.
    Order(OrderSummary),
}

impl MessageBody {
    /// Plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The kind of message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text { .. } => MessageKind::Text,
            Self::Order(_) => MessageKind::Order,
        }
    }

    /// Short text used for thread previews and notifications.
    pub fn preview(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Order(summary) => summary.headline(),
        }
    }
}

/// A message that has not yet been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    /// Author.
    pub sender_id: UserUuid,

    /// Content.
    pub body: MessageBody,
}

/// A stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Document identity.
    pub id: MessageUuid,

    /// Thread the message belongs to.
    pub thread_id: ThreadUuid,

    /// Author.
    pub sender_id: UserUuid,

    /// When it was sent.
    pub sent_at: Timestamp,

    /// Content.
    pub body: MessageBody,
}

/// Denormalised copy of a thread's latest message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    /// Author.
    pub sender_id: UserUuid,

    /// Preview text.
    pub preview: String,

    /// Kind of message.
    pub kind: MessageKind,

    /// When it was sent.
    pub sent_at: Timestamp,
}

impl From<&Message> for LastMessage {
    fn from(message: &Message) -> Self {
        Self {
            sender_id: message.sender_id,
            preview: message.body.preview(),
            kind: message.body.kind(),
            sent_at: message.sent_at,
        }
    }
}

/// A conversation between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Document identity.
    pub id: ThreadUuid,

    /// The two users taking part.
    pub participants: Participants,

    /// Latest message, if any.
    pub last_message: Option<LastMessage>,

    /// When each participant last read the thread.
    #[serde(default)]
    pub last_read: FxHashMap<UserUuid, Timestamp>,

    /// Last time the thread changed.
    pub updated_at: Timestamp,
}

impl Thread {
    /// Whether `user` takes part in this thread.
    pub fn has_participant(&self, user: UserUuid) -> bool {
        self.participants.contains(&user)
    }

    /// The participant who isn't `user`.
    pub fn other_participant(&self, user: UserUuid) -> Option<UserUuid> {
        self.participants.iter().copied().find(|&p| p != user)
    }

    /// Whether the latest message is from someone else and arrived after `user` last read.
    pub fn is_unread_for(&self, user: UserUuid) -> bool {
        let Some(last) = &self.last_message else {
            return false;
        };

        if last.sender_id == user {
            return false;
        }

        self.last_read
            .get(&user)
            .is_none_or(|&read_at| last.sent_at > read_at)
    }

    /// Record that `user` read the thread at `at`.
    pub fn mark_read(&mut self, user: UserUuid, at: Timestamp) {
        self.last_read.insert(user, at);
    }

    /// Record a newly sent message as the latest.
    pub fn record_message(&mut self, message: &Message) {
        self.last_message = Some(LastMessage::from(message));
        self.updated_at = message.sent_at;
    }
}

/// Number of threads with unread messages for `user`.
pub fn unread_count<'a>(threads: impl IntoIterator<Item = &'a Thread>, user: UserUuid) -> usize {
    threads
        .into_iter()
        .filter(|thread| thread.is_unread_for(user))
        .count()
}
