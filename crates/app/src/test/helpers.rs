//! Test Helpers

use jiff::Timestamp;
use marketplace::{
    cart::{CartItem, ShopMeta},
    checkout::CheckoutDetails,
    ids::{ItemUuid, OrderGroupUuid, OrderUuid, ShopUuid, UserUuid},
    orders::{DeliveryOption, Order, OrderItem, OrderStatus, PaymentMethod},
};

use crate::{domain::carts::CartsService, session::Session};

pub(crate) fn session(name: &str) -> Session {
    Session::new(UserUuid::now_v7(), name)
}

pub(crate) fn details(address: &str, phone: &str) -> CheckoutDetails {
    CheckoutDetails {
        payment_method: PaymentMethod::Card,
        delivery_address: address.to_string(),
        contact_phone: phone.to_string(),
        special_instructions: String::new(),
    }
}

/// Add a single item from a new pickup-only shop, returning the shop.
pub(crate) fn add_shop_item(
    carts: &CartsService,
    shop_name: &str,
    price: u64,
    quantity: u32,
) -> ShopUuid {
    let shop = ShopUuid::now_v7();

    let added = carts.add_to_cart(
        CartItem::new(ItemUuid::now_v7(), format!("{shop_name} special"), price, quantity),
        shop,
        shop_name,
        ShopMeta {
            photo_url: None,
            allow_pickup: true,
            local_delivery: false,
        },
    );

    assert!(matches!(added, Ok(true)), "item was not added: {added:?}");

    shop
}

/// A pending order with the given `(item, quantity)` lines, each priced at one dollar.
pub(crate) fn order_with_items(lines: &[(ItemUuid, u32)], option: DeliveryOption) -> Order {
    let items: Vec<OrderItem> = lines
        .iter()
        .map(|&(item_id, quantity)| OrderItem {
            item_id,
            name: "Item".to_string(),
            price: 1_00,
            quantity,
            photo_url: None,
        })
        .collect();

    let subtotal = items.iter().filter_map(|item| item.line_total().ok()).sum();

    Order {
        id: OrderUuid::now_v7(),
        group: OrderGroupUuid::now_v7(),
        user_id: UserUuid::now_v7(),
        shop_id: ShopUuid::now_v7(),
        shop_name: "Corner Shop".to_string(),
        shop_photo_url: None,
        items,
        subtotal,
        tax: 0,
        delivery_fee: 0,
        tip: 0,
        total: subtotal,
        status: OrderStatus::Pending,
        estimated_delivery_time: None,
        payment_method: PaymentMethod::Card,
        delivery_address: String::new(),
        contact_phone: "555-0100".to_string(),
        delivery_option: option,
        special_instructions: String::new(),
        created_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn pending_order(option: DeliveryOption) -> Order {
    order_with_items(&[(ItemUuid::now_v7(), 1)], option)
}
