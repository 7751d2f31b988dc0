//! Cart
//!
//! A buyer's cart is partitioned by shop. Each [`ShopCart`] keeps its own line items and a
//! subtotal that is recomputed on every mutation. Shop carts are dropped as soon as their last
//! item is removed, so the aggregate never holds an empty partition.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ids::{ItemUuid, ShopUuid},
    pricing::{self, PricingError, checked_sum},
};

/// Errors raised by cart changes and while restoring a persisted cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// The change would push a subtotal past what can be represented.
    #[error("cart total is too large")]
    Pricing(#[from] PricingError),

    /// The change would push a line quantity past `u32::MAX`.
    #[error("too many units of one item")]
    TooManyUnits,

    /// The stored cart could not be decoded.
    #[error("stored cart is malformed")]
    Malformed(#[source] serde_json::Error),

    /// The cart could not be encoded for storage.
    #[error("cart could not be encoded")]
    Encode(#[source] serde_json::Error),
}

/// A line item in a shop cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Catalogue item this line refers to.
    pub item_id: ItemUuid,

    /// Display name captured when the item was added.
    pub name: String,

    /// Unit price in minor units.
    pub price: u64,

    /// Number of units, always at least one once stored.
    pub quantity: u32,

    /// Optional product photo.
    #[serde(default)]
    pub photo_url: Option<String>,

    /// Whether the seller accepts offers on this item.
    #[serde(default)]
    pub negotiable: bool,
}

impl CartItem {
    /// Create a line item with no photo that is not negotiable.
    pub fn new(item_id: ItemUuid, name: impl Into<String>, price: u64, quantity: u32) -> Self {
        Self {
            item_id,
            name: name.into(),
            price,
            quantity,
            photo_url: None,
            negotiable: false,
        }
    }

    /// Price of the whole line.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when the line total does not fit.
    pub fn line_total(&self) -> Result<u64, PricingError> {
        pricing::line_total(self.price, self.quantity)
    }
}

/// Shop details captured alongside the first item added from that shop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopMeta {
    /// Shop photo shown in the cart.
    pub photo_url: Option<String>,

    /// Whether the shop lets buyers collect in person.
    pub allow_pickup: bool,

    /// Whether the shop delivers locally.
    pub local_delivery: bool,
}

/// The per-shop partition of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopCart {
    shop_id: ShopUuid,
    shop_name: String,
    #[serde(default)]
    shop_photo_url: Option<String>,
    allow_pickup: bool,
    local_delivery: bool,
    items: Vec<CartItem>,
    subtotal: u64,
}

impl ShopCart {
    fn new(
        shop_id: ShopUuid,
        shop_name: String,
        meta: ShopMeta,
        item: CartItem,
    ) -> Result<Self, PricingError> {
        Ok(Self {
            shop_id,
            shop_name,
            shop_photo_url: meta.photo_url,
            allow_pickup: meta.allow_pickup,
            local_delivery: meta.local_delivery,
            subtotal: item.line_total()?,
            items: vec![item],
        })
    }

    /// Shop this partition belongs to.
    pub fn shop_id(&self) -> ShopUuid {
        self.shop_id
    }

    /// Shop display name.
    pub fn shop_name(&self) -> &str {
        &self.shop_name
    }

    /// Shop photo, if any.
    pub fn shop_photo_url(&self) -> Option<&str> {
        self.shop_photo_url.as_deref()
    }

    /// Whether the shop offers pickup.
    pub fn allow_pickup(&self) -> bool {
        self.allow_pickup
    }

    /// Whether the shop offers local delivery.
    pub fn local_delivery(&self) -> bool {
        self.local_delivery
    }

    /// Line items in the order they were added.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up a line item.
    pub fn item(&self, item_id: ItemUuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.item_id == item_id)
    }

    /// Sum of every line total.
    pub fn subtotal(&self) -> u64 {
        self.subtotal
    }

    /// Total units across every line.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

fn subtotal_of(items: &[CartItem]) -> Result<u64, PricingError> {
    items.iter().try_fold(0_u64, |subtotal, item| {
        subtotal
            .checked_add(item.line_total()?)
            .ok_or(PricingError::Overflow)
    })
}

/// Every shop cart for the current session, in the order shops were first added.
///
/// Every line total, shop subtotal and the combined subtotal fit in a `u64`; changes that would
/// break this are refused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CartAggregate {
    shops: Vec<ShopCart>,
}

impl CartAggregate {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a cart from its stored JSON form.
    ///
    /// The stored lines are replayed through [`CartAggregate::add_to_cart`], so broken entries
    /// are repaired rather than rejected: zero quantities and empty shops are dropped, repeated
    /// shops and items are merged in first-seen order, and subtotals are recomputed.
    ///
    /// # Errors
    ///
    /// - [`CartError::Malformed`]: the JSON does not describe a cart.
    /// - [`CartError::Pricing`] or [`CartError::TooManyUnits`]: the merged cart would overflow.
    pub fn from_json(json: &str) -> Result<Self, CartError> {
        let stored: Vec<ShopCart> = serde_json::from_str(json).map_err(CartError::Malformed)?;
        let mut cart = Self::new();

        for shop in stored {
            let ShopCart {
                shop_id,
                shop_name,
                shop_photo_url,
                allow_pickup,
                local_delivery,
                items,
                ..
            } = shop;

            for item in items {
                let meta = ShopMeta {
                    photo_url: shop_photo_url.clone(),
                    allow_pickup,
                    local_delivery,
                };

                cart.add_to_cart(item, shop_id, shop_name.as_str(), meta)?;
            }
        }

        Ok(cart)
    }

    /// Encode the cart for storage.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Encode`] when serialization fails.
    pub fn to_json(&self) -> Result<String, CartError> {
        serde_json::to_string(self).map_err(CartError::Encode)
    }

    /// Add an item, merging with an existing line for the same item.
    ///
    /// A repeated item has its quantity increased; its stored name and price are kept. Items with
    /// a zero quantity are ignored. Returns `true` when the cart changed.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the cart unchanged, when the new quantity or totals would
    /// overflow.
    pub fn add_to_cart(
        &mut self,
        item: CartItem,
        shop_id: ShopUuid,
        shop_name: impl Into<String>,
        meta: ShopMeta,
    ) -> Result<bool, CartError> {
        if item.quantity == 0 {
            return Ok(false);
        }

        if self.shop(shop_id).is_none() {
            let shop = ShopCart::new(shop_id, shop_name.into(), meta, item)?;

            checked_sum([self.total_subtotal(), shop.subtotal])?;
            self.shops.push(shop);

            return Ok(true);
        }

        self.edit_shop(shop_id, |items| {
            match items
                .iter_mut()
                .find(|existing| existing.item_id == item.item_id)
            {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .checked_add(item.quantity)
                        .ok_or(CartError::TooManyUnits)?;
                }
                None => items.push(item),
            }

            Ok(true)
        })
    }

    /// Remove a line item, dropping the shop cart if it becomes empty.
    ///
    /// Unknown shops and items are ignored. Returns `true` when the cart changed.
    ///
    /// # Errors
    ///
    /// Only fails if the stored totals were already out of range.
    pub fn remove_from_cart(
        &mut self,
        shop_id: ShopUuid,
        item_id: ItemUuid,
    ) -> Result<bool, CartError> {
        let changed = self.edit_shop(shop_id, |items| {
            let before = items.len();

            items.retain(|item| item.item_id != item_id);

            Ok(items.len() != before)
        })?;

        if self.shop(shop_id).is_some_and(|shop| shop.items.is_empty()) {
            self.clear_shop_cart(shop_id);
        }

        Ok(changed)
    }

    /// Set a line item's quantity. A quantity of zero removes the line.
    ///
    /// Returns `true` when the cart changed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Pricing`], leaving the cart unchanged, when the new totals would
    /// overflow.
    pub fn update_item_quantity(
        &mut self,
        shop_id: ShopUuid,
        item_id: ItemUuid,
        quantity: u32,
    ) -> Result<bool, CartError> {
        if quantity == 0 {
            return self.remove_from_cart(shop_id, item_id);
        }

        self.edit_shop(shop_id, |items| {
            let Some(item) = items.iter_mut().find(|item| item.item_id == item_id) else {
                return Ok(false);
            };

            if item.quantity == quantity {
                return Ok(false);
            }

            item.quantity = quantity;

            Ok(true)
        })
    }

    /// Apply `edit` to a copy of one shop's lines and keep it only if every total still fits.
    fn edit_shop(
        &mut self,
        shop_id: ShopUuid,
        edit: impl FnOnce(&mut Vec<CartItem>) -> Result<bool, CartError>,
    ) -> Result<bool, CartError> {
        let others = checked_sum(
            self.shops
                .iter()
                .filter(|shop| shop.shop_id != shop_id)
                .map(ShopCart::subtotal),
        )?;

        let Some(shop) = self.shop_mut(shop_id) else {
            return Ok(false);
        };

        let mut items = shop.items.clone();

        if !edit(&mut items)? {
            return Ok(false);
        }

        let subtotal = subtotal_of(&items)?;

        checked_sum([others, subtotal])?;

        shop.items = items;
        shop.subtotal = subtotal;

        Ok(true)
    }

    /// Drop a shop's cart regardless of its contents.
    pub fn clear_shop_cart(&mut self, shop_id: ShopUuid) -> bool {
        let before = self.shops.len();

        self.shops.retain(|shop| shop.shop_id != shop_id);

        self.shops.len() != before
    }

    /// Empty the whole cart.
    pub fn clear(&mut self) -> bool {
        let changed = !self.shops.is_empty();

        self.shops.clear();

        changed
    }

    /// Look up a shop cart.
    pub fn shop(&self, shop_id: ShopUuid) -> Option<&ShopCart> {
        self.shops.iter().find(|shop| shop.shop_id == shop_id)
    }

    fn shop_mut(&mut self, shop_id: ShopUuid) -> Option<&mut ShopCart> {
        self.shops.iter_mut().find(|shop| shop.shop_id == shop_id)
    }

    /// Iterate over the shop carts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ShopCart> {
        self.shops.iter()
    }

    /// Sum of every shop subtotal.
    pub fn total_subtotal(&self) -> u64 {
        self.shops.iter().map(ShopCart::subtotal).sum()
    }

    /// Total units across every shop.
    pub fn item_count(&self) -> u64 {
        self.shops.iter().map(ShopCart::item_count).sum()
    }

    /// Number of shops with items in the cart.
    pub fn shop_count(&self) -> usize {
        self.shops.len()
    }

    /// Whether the cart holds no items at all.
    pub fn is_empty(&self) -> bool {
        self.shops.is_empty()
    }
}

impl<'a> IntoIterator for &'a CartAggregate {
    type Item = &'a ShopCart;
    type IntoIter = std::slice::Iter<'a, ShopCart>;

    fn into_iter(self) -> Self::IntoIter {
        self.shops.iter()
    }
}
