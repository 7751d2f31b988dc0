//! Orders
//!
//! One order document is created per shop at checkout. Orders from the same checkout share an
//! [`OrderGroupUuid`] but are otherwise independent documents.

use std::fmt::{self, Display, Formatter};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    cart::CartItem,
    ids::{ItemUuid, OrderGroupUuid, OrderUuid, ShopUuid, UserUuid},
    pricing::{PricingError, line_total},
};

pub mod status;

pub use status::{OrderRole, OrderStatus, StatusError};

/// How a shop order reaches the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryOption {
    /// The buyer collects from the shop.
    Pickup,

    /// The shop delivers locally for a fee.
    Delivery,
}

impl Display for DeliveryOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        })
    }
}

/// How the buyer intends to pay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Card payment, settled by the payment processor.
    #[default]
    Card,

    /// Cash on pickup or delivery.
    Cash,
}

/// A line item captured on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Catalogue item that was ordered.
    pub item_id: ItemUuid,

    /// Name at the time of ordering.
    pub name: String,

    /// Unit price at the time of ordering.
    pub price: u64,

    /// Units ordered.
    pub quantity: u32,

    /// Optional product photo.
    pub photo_url: Option<String>,
}

impl OrderItem {
    /// Price of the whole line.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when the line total does not fit.
    pub fn line_total(&self) -> Result<u64, PricingError> {
        line_total(self.price, self.quantity)
    }
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            item_id: item.item_id,
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            photo_url: item.photo_url.clone(),
        }
    }
}

/// An order that has not yet been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Checkout this order was placed in.
    pub group: OrderGroupUuid,

    /// Buyer.
    pub user_id: UserUuid,

    /// Shop fulfilling the order.
    pub shop_id: ShopUuid,

    /// Shop name at the time of ordering.
    pub shop_name: String,

    /// Shop photo at the time of ordering.
    pub shop_photo_url: Option<String>,

    /// Ordered lines.
    pub items: Vec<OrderItem>,

    /// Sum of the line totals.
    pub subtotal: u64,

    /// Sales tax on the subtotal.
    pub tax: u64,

    /// Delivery fee, zero for pickup.
    pub delivery_fee: u64,

    /// Always zero; reserved for tipping.
    pub tip: u64,

    /// Subtotal plus tax, delivery fee and tip.
    pub total: u64,

    /// Lifecycle status.
    pub status: OrderStatus,

    /// When the buyer can expect the order.
    pub estimated_delivery_time: Option<Timestamp>,

    /// How the buyer pays.
    pub payment_method: PaymentMethod,

    /// Delivery address; may be empty for pickup.
    pub delivery_address: String,

    /// Phone number the shop can reach the buyer on.
    pub contact_phone: String,

    /// Pickup or delivery.
    pub delivery_option: DeliveryOption,

    /// Free-text notes for the shop.
    pub special_instructions: String,

    /// When the order was placed.
    pub created_at: Timestamp,
}

/// A stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[expect(missing_docs, reason = "fields mirror NewOrder")]
pub struct Order {
    /// Document identity assigned by the backend.
    pub id: OrderUuid,
    pub group: OrderGroupUuid,
    pub user_id: UserUuid,
    pub shop_id: ShopUuid,
    pub shop_name: String,
    pub shop_photo_url: Option<String>,
    pub items: Vec<OrderItem>,
    pub subtotal: u64,
    pub tax: u64,
    pub delivery_fee: u64,
    pub tip: u64,
    pub total: u64,
    pub status: OrderStatus,
    pub estimated_delivery_time: Option<Timestamp>,
    pub payment_method: PaymentMethod,
    pub delivery_address: String,
    pub contact_phone: String,
    pub delivery_option: DeliveryOption,
    pub special_instructions: String,
    pub created_at: Timestamp,
}

impl Order {
    /// Attach a document identity to a new order.
    pub fn from_new(id: OrderUuid, order: NewOrder) -> Self {
        let NewOrder {
            group,
            user_id,
            shop_id,
            shop_name,
            shop_photo_url,
            items,
            subtotal,
            tax,
            delivery_fee,
            tip,
            total,
            status,
            estimated_delivery_time,
            payment_method,
            delivery_address,
            contact_phone,
            delivery_option,
            special_instructions,
            created_at,
        } = order;

        Self {
            id,
            group,
            user_id,
            shop_id,
            shop_name,
            shop_photo_url,
            items,
            subtotal,
            tax,
            delivery_fee,
            tip,
            total,
            status,
            estimated_delivery_time,
            payment_method,
            delivery_address,
            contact_phone,
            delivery_option,
            special_instructions,
            created_at,
        }
    }

    /// Whether this is the order identified by `(id, shop_id)`.
    pub fn is(&self, id: OrderUuid, shop_id: ShopUuid) -> bool {
        self.id == id && self.shop_id == shop_id
    }

    /// Total units across every line.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

/// Orders visible to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLists {
    /// Orders the user placed as a buyer.
    pub placed: Vec<Order>,

    /// Orders placed with shops the user owns.
    pub received: Vec<Order>,

    /// Every order the user can see, placed or received.
    pub all: Vec<Order>,
}

impl OrderLists {
    /// Reflect a status change in every list holding the order.
    ///
    /// Returns the number of entries updated.
    pub fn apply_status(
        &mut self,
        id: OrderUuid,
        shop_id: ShopUuid,
        status: OrderStatus,
    ) -> usize {
        let mut updated = 0;

        for order in self
            .placed
            .iter_mut()
            .chain(self.received.iter_mut())
            .chain(self.all.iter_mut())
            .filter(|order| order.is(id, shop_id))
        {
            order.status = status;
            updated += 1;
        }

        updated
    }

    /// Orders in `all` that are still in progress.
    pub fn active(&self) -> impl Iterator<Item = &Order> {
        self.all.iter().filter(|order| !order.status.is_terminal())
    }

    /// Orders in `all` that have finished.
    pub fn history(&self) -> impl Iterator<Item = &Order> {
        self.all.iter().filter(|order| order.status.is_terminal())
    }
}
