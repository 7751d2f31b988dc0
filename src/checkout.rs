//! Checkout
//!
//! Pure checkout logic: per-shop delivery choices, validation, fee computation and drafting the
//! orders that a submission will store.

use jiff::{SignedDuration, Timestamp};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{CartAggregate, ShopCart},
    ids::{OrderGroupUuid, ShopUuid, UserUuid},
    orders::{DeliveryOption, NewOrder, Order, OrderItem, OrderStatus, PaymentMethod},
    pricing::{DELIVERY_FEE, PricingError, checked_sum, tax_on},
};

/// How long a pickup order is expected to take.
pub const PICKUP_ESTIMATE: SignedDuration = SignedDuration::from_mins(30);

/// How long a delivery order is expected to take.
pub const DELIVERY_ESTIMATE: SignedDuration = SignedDuration::from_mins(60);

/// Reasons a checkout cannot go ahead. Checked in declaration order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// Nobody is signed in.
    #[error("please sign in to place an order")]
    NotAuthenticated,

    /// Delivery was chosen for a shop but there is no address.
    #[error("please enter a delivery address")]
    MissingDeliveryAddress,

    /// There is no contact phone number.
    #[error("please enter a contact phone number")]
    MissingContactPhone,

    /// A shop has neither pickup nor delivery selected.
    #[error("please choose pickup or delivery for {shop_name}")]
    MissingDeliveryOption {
        /// Shop without a choice.
        shop_id: ShopUuid,
        /// Its display name.
        shop_name: String,
    },

    /// There is nothing to order.
    #[error("your cart is empty")]
    EmptyCart,

    /// Fees could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// The delivery option preselected for a shop: pickup when offered, otherwise delivery when
/// offered, otherwise nothing.
pub fn default_delivery_option(allow_pickup: bool, local_delivery: bool) -> Option<DeliveryOption> {
    if allow_pickup {
        Some(DeliveryOption::Pickup)
    } else if local_delivery {
        Some(DeliveryOption::Delivery)
    } else {
        None
    }
}

/// Per-shop delivery choices made at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliverySelections {
    choices: FxHashMap<ShopUuid, DeliveryOption>,
}

impl DeliverySelections {
    /// Start with no shop selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preselect every shop in the cart using [`default_delivery_option`].
    pub fn with_defaults(cart: &CartAggregate) -> Self {
        let choices = cart
            .iter()
            .filter_map(|shop| {
                default_delivery_option(shop.allow_pickup(), shop.local_delivery())
                    .map(|option| (shop.shop_id(), option))
            })
            .collect();

        Self { choices }
    }

    /// Choose how a shop's order is fulfilled.
    pub fn select(&mut self, shop_id: ShopUuid, option: DeliveryOption) {
        self.choices.insert(shop_id, option);
    }

    /// The choice for a shop, if one was made.
    pub fn get(&self, shop_id: ShopUuid) -> Option<DeliveryOption> {
        self.choices.get(&shop_id).copied()
    }

    /// Whether any shop still in the cart is set to delivery.
    pub fn any_delivery(&self, cart: &CartAggregate) -> bool {
        cart.iter()
            .any(|shop| self.get(shop.shop_id()) == Some(DeliveryOption::Delivery))
    }
}

/// Free-text and payment details entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDetails {
    /// How the buyer pays.
    pub payment_method: PaymentMethod,

    /// Required when any shop is set to delivery.
    pub delivery_address: String,

    /// Always required.
    pub contact_phone: String,

    /// Optional notes passed to every shop.
    pub special_instructions: String,
}

/// Check that a checkout may be submitted.
///
/// # Errors
///
/// Returns the first failing rule, in the order the [`CheckoutError`] variants are declared.
pub fn validate(
    authenticated: bool,
    cart: &CartAggregate,
    selections: &DeliverySelections,
    details: &CheckoutDetails,
) -> Result<(), CheckoutError> {
    if !authenticated {
        return Err(CheckoutError::NotAuthenticated);
    }

    if selections.any_delivery(cart) && details.delivery_address.trim().is_empty() {
        return Err(CheckoutError::MissingDeliveryAddress);
    }

    if details.contact_phone.trim().is_empty() {
        return Err(CheckoutError::MissingContactPhone);
    }

    if let Some(shop) = cart.iter().find(|shop| selections.get(shop.shop_id()).is_none()) {
        return Err(CheckoutError::MissingDeliveryOption {
            shop_id: shop.shop_id(),
            shop_name: shop.shop_name().to_string(),
        });
    }

    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    Ok(())
}

/// Fees for one shop's order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopQuote {
    /// Shop the quote is for.
    pub shop_id: ShopUuid,

    /// Chosen delivery option, if any.
    pub delivery_option: Option<DeliveryOption>,

    /// Sum of the shop's line totals.
    pub subtotal: u64,

    /// Tax on the subtotal.
    pub tax: u64,

    /// Delivery fee, charged only for delivery.
    pub delivery_fee: u64,

    /// Always zero.
    pub tip: u64,

    /// Subtotal plus tax, delivery fee and tip.
    pub total: u64,
}

impl ShopQuote {
    /// Price a shop cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if tax or the total cannot be computed.
    pub fn for_shop(shop: &ShopCart, option: Option<DeliveryOption>) -> Result<Self, PricingError> {
        let subtotal = shop.subtotal();
        let tax = tax_on(subtotal)?;
        let delivery_fee = delivery_fee_for(option);
        let tip = 0;

        Ok(Self {
            shop_id: shop.shop_id(),
            delivery_option: option,
            subtotal,
            tax,
            delivery_fee,
            tip,
            total: checked_sum([subtotal, tax, delivery_fee, tip])?,
        })
    }
}

/// Fees for a whole checkout.
///
/// Tax is taken on the combined subtotal, so it can differ from the sum of the per-shop tax by
/// a rounding cent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutQuote {
    /// One quote per shop, in cart order.
    pub shops: Vec<ShopQuote>,

    /// Combined subtotal.
    pub subtotal: u64,

    /// Tax on the combined subtotal.
    pub tax: u64,

    /// One delivery fee per shop set to delivery.
    pub delivery_fee: u64,

    /// Always zero.
    pub tip: u64,

    /// Grand total.
    pub total: u64,
}

/// Price every shop in the cart. Shops without a choice are priced without a delivery fee.
///
/// # Errors
///
/// Returns [`CheckoutError::Pricing`] if tax or a total cannot be computed.
pub fn quote(
    cart: &CartAggregate,
    selections: &DeliverySelections,
) -> Result<CheckoutQuote, CheckoutError> {
    let shops = cart
        .iter()
        .map(|shop| ShopQuote::for_shop(shop, selections.get(shop.shop_id())))
        .collect::<Result<Vec<_>, _>>()?;

    let subtotal = cart.total_subtotal();
    let tax = tax_on(subtotal)?;
    let delivery_fee = checked_sum(shops.iter().map(|shop| shop.delivery_fee))?;
    let tip = 0;

    Ok(CheckoutQuote {
        shops,
        subtotal,
        tax,
        delivery_fee,
        tip,
        total: checked_sum([subtotal, tax, delivery_fee, tip])?,
    })
}

fn delivery_fee_for(option: Option<DeliveryOption>) -> u64 {
    match option {
        Some(DeliveryOption::Delivery) => DELIVERY_FEE,
        Some(DeliveryOption::Pickup) | None => 0,
    }
}

/// When an order placed at `created_at` should be ready.
pub fn estimated_delivery_time(created_at: Timestamp, option: DeliveryOption) -> Option<Timestamp> {
    let estimate = match option {
        DeliveryOption::Pickup => PICKUP_ESTIMATE,
        DeliveryOption::Delivery => DELIVERY_ESTIMATE,
    };

    created_at.checked_add(estimate).ok()
}

/// Draft one pending order per shop in the cart.
///
/// # Errors
///
/// - [`CheckoutError::MissingDeliveryOption`]: a shop has no delivery choice.
/// - [`CheckoutError::Pricing`]: tax could not be computed.
pub fn new_orders(
    cart: &CartAggregate,
    selections: &DeliverySelections,
    details: &CheckoutDetails,
    buyer: UserUuid,
    group: OrderGroupUuid,
    created_at: Timestamp,
) -> Result<Vec<NewOrder>, CheckoutError> {
    cart.iter()
        .map(|shop| {
            let option =
                selections
                    .get(shop.shop_id())
                    .ok_or_else(|| CheckoutError::MissingDeliveryOption {
                        shop_id: shop.shop_id(),
                        shop_name: shop.shop_name().to_string(),
                    })?;

            let quote = ShopQuote::for_shop(shop, Some(option))?;

            Ok(NewOrder {
                group,
                user_id: buyer,
                shop_id: shop.shop_id(),
                shop_name: shop.shop_name().to_string(),
                shop_photo_url: shop.shop_photo_url().map(str::to_string),
                items: shop.items().iter().map(OrderItem::from).collect(),
                subtotal: quote.subtotal,
                tax: quote.tax,
                delivery_fee: quote.delivery_fee,
                tip: quote.tip,
                total: quote.total,
                status: OrderStatus::Pending,
                estimated_delivery_time: estimated_delivery_time(created_at, option),
                payment_method: details.payment_method,
                delivery_address: details.delivery_address.trim().to_string(),
                contact_phone: details.contact_phone.trim().to_string(),
                delivery_option: option,
                special_instructions: details.special_instructions.trim().to_string(),
                created_at,
            })
        })
        .collect()
}

/// Orders bound for one shop owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerOrders<'a> {
    /// The shop owner to notify.
    pub owner: UserUuid,

    /// Their orders, in creation order.
    pub orders: Vec<&'a Order>,
}

/// Group orders by the owner of each order's shop, in first-seen order.
///
/// Orders for shops the purchaser owns, or whose owner is unknown, are left out.
pub fn group_by_owner<'a>(
    orders: &'a [Order],
    owners: &FxHashMap<ShopUuid, UserUuid>,
    purchaser: UserUuid,
) -> Vec<OwnerOrders<'a>> {
    let mut groups: Vec<OwnerOrders<'a>> = Vec::new();
    let mut positions: FxHashMap<UserUuid, usize> = FxHashMap::default();

    for order in orders {
        let Some(&owner) = owners.get(&order.shop_id) else {
            continue;
        };

        if owner == purchaser {
            continue;
        }

        match positions.get(&owner).and_then(|&idx| groups.get_mut(idx)) {
            Some(group) => group.orders.push(order),
            None => {
                positions.insert(owner, groups.len());
                groups.push(OwnerOrders {
                    owner,
                    orders: vec![order],
                });
            }
        }
    }

    groups
}
