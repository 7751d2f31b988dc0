//! Marketplace prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{CartAggregate, CartError, CartItem, ShopCart, ShopMeta},
    checkout::{
        CheckoutDetails, CheckoutError, CheckoutQuote, DeliverySelections, OwnerOrders,
        ShopQuote, default_delivery_option, group_by_owner, new_orders, quote, validate,
    },
    ids::{
        ItemUuid, MessageUuid, OrderGroupUuid, OrderUuid, ShopUuid, ThreadUuid, TypedUuid,
        UserUuid,
    },
    messaging::{
        LastMessage, Message, MessageBody, MessageKind, NewMessage, OrderSummary, Thread,
        participants, unread_count,
    },
    orders::{
        DeliveryOption, NewOrder, Order, OrderItem, OrderLists, OrderRole, OrderStatus,
        PaymentMethod, StatusError,
    },
    pricing::{DELIVERY_FEE, PricingError, TAX_RATE, format_minor},
};
