//! Carts service.
//!
//! Holds the process-wide cart. Mutations apply to memory immediately and are written through
//! to local storage by a background task; callers never wait on the write. The task always
//! writes the newest snapshot, so a burst of mutations collapses into fewer writes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use marketplace::{
    cart::{CartAggregate, CartError, CartItem, ShopMeta},
    ids::{ItemUuid, ShopUuid},
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    domain::carts::errors::CartsServiceError,
    storage::{CART_KEY, LocalStorage},
};

#[derive(Debug, Clone, Default)]
struct Snapshot {
    version: u64,
    json: Arc<str>,
}

#[derive(Debug)]
pub struct CartsService {
    cart: Mutex<CartAggregate>,
    snapshots: watch::Sender<Snapshot>,
    persisted: watch::Receiver<u64>,
}

impl CartsService {
    /// Restore the saved cart and start writing changes back to `storage`.
    ///
    /// A saved cart that cannot be decoded is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`CartsServiceError::Storage`] when storage cannot be read.
    pub async fn load(storage: Arc<dyn LocalStorage>) -> Result<Self, CartsServiceError> {
        let cart = match storage.get_item(CART_KEY).await? {
            Some(json) => CartAggregate::from_json(&json).unwrap_or_else(|error| {
                warn!(%error, "discarding unreadable saved cart");

                CartAggregate::new()
            }),
            None => CartAggregate::new(),
        };

        debug!(
            shops = cart.shop_count(),
            items = cart.item_count(),
            "loaded cart"
        );

        let (snapshots, snapshot_rx) = watch::channel(Snapshot::default());
        let (persisted_tx, persisted) = watch::channel(0);

        tokio::spawn(persist(storage, snapshot_rx, persisted_tx));

        Ok(Self {
            cart: Mutex::new(cart),
            snapshots,
            persisted,
        })
    }

    /// Add an item, merging with an existing line for the same item.
    ///
    /// # Errors
    ///
    /// Returns [`CartsServiceError::Refused`] when the change would overflow a quantity or total.
    /// The cart is left as it was.
    pub fn add_to_cart(
        &self,
        item: CartItem,
        shop_id: ShopUuid,
        shop_name: impl Into<String>,
        meta: ShopMeta,
    ) -> Result<bool, CartsServiceError> {
        let item_id = item.item_id;
        let quantity = item.quantity;

        self.try_mutate(|cart| {
            let changed = cart.add_to_cart(item, shop_id, shop_name, meta)?;

            debug!(%shop_id, %item_id, quantity, changed, "add to cart");

            Ok(changed)
        })
    }

    /// Remove a line item.
    ///
    /// # Errors
    ///
    /// Returns [`CartsServiceError::Refused`] if the stored totals are out of range.
    pub fn remove_from_cart(
        &self,
        shop_id: ShopUuid,
        item_id: ItemUuid,
    ) -> Result<bool, CartsServiceError> {
        self.try_mutate(|cart| {
            let changed = cart.remove_from_cart(shop_id, item_id)?;

            debug!(%shop_id, %item_id, changed, "remove from cart");

            Ok(changed)
        })
    }

    /// Set a line item's quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartsServiceError::Refused`] when the new totals would overflow. The cart is
    /// left as it was.
    pub fn update_item_quantity(
        &self,
        shop_id: ShopUuid,
        item_id: ItemUuid,
        quantity: u32,
    ) -> Result<bool, CartsServiceError> {
        self.try_mutate(|cart| {
            let changed = cart.update_item_quantity(shop_id, item_id, quantity)?;

            debug!(%shop_id, %item_id, quantity, changed, "update cart quantity");

            Ok(changed)
        })
    }

    /// Drop one shop's items.
    pub fn clear_shop_cart(&self, shop_id: ShopUuid) -> bool {
        let mut cart = self.lock();
        let changed = cart.clear_shop_cart(shop_id);

        if changed {
            self.publish(&cart);
        }

        changed
    }

    /// Empty the cart.
    pub fn clear_cart(&self) -> bool {
        let mut cart = self.lock();
        let changed = cart.clear();

        if changed {
            self.publish(&cart);
        }

        changed
    }

    /// A copy of the current cart.
    pub fn snapshot(&self) -> CartAggregate {
        self.lock().clone()
    }

    pub fn total_subtotal(&self) -> u64 {
        self.lock().total_subtotal()
    }

    pub fn item_count(&self) -> u64 {
        self.lock().item_count()
    }

    pub fn shop_count(&self) -> usize {
        self.lock().shop_count()
    }

    /// Wait until every change made so far has been handed to storage.
    ///
    /// Failed writes count as handled; they are logged by the writer.
    pub async fn settle(&self) {
        let target = self.snapshots.borrow().version;
        let mut persisted = self.persisted.clone();

        if persisted.wait_for(|&version| version >= target).await.is_err() {
            warn!("cart writer stopped before saving the latest cart");
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartAggregate> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_mutate(
        &self,
        apply: impl FnOnce(&mut CartAggregate) -> Result<bool, CartError>,
    ) -> Result<bool, CartsServiceError> {
        let mut cart = self.lock();

        let changed = apply(&mut cart).inspect_err(|error| warn!(%error, "cart change refused"))?;

        if changed {
            self.publish(&cart);
        }

        Ok(changed)
    }

    /// Hand the newest cart to the background writer.
    fn publish(&self, cart: &CartAggregate) {
        match cart.to_json() {
            Ok(json) => {
                let json: Arc<str> = json.into();

                self.snapshots.send_modify(|snapshot| {
                    snapshot.version += 1;
                    snapshot.json = json;
                });
            }
            Err(error) => warn!(%error, "cart could not be encoded for saving"),
        }
    }
}

async fn persist(
    storage: Arc<dyn LocalStorage>,
    mut snapshots: watch::Receiver<Snapshot>,
    persisted: watch::Sender<u64>,
) {
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();

        if let Err(error) = storage.set_item(CART_KEY, &snapshot.json).await {
            warn!(%error, version = snapshot.version, "failed to save cart");
        }

        persisted.send_replace(snapshot.version);
    }
}

#[cfg(test)]
mod tests {
    use marketplace::cart::ShopCart;
    use testresult::TestResult;

    use crate::storage::{MemoryStorage, MockLocalStorage, StorageError};

    use super::*;

    fn meta() -> ShopMeta {
        ShopMeta {
            photo_url: None,
            allow_pickup: true,
            local_delivery: true,
        }
    }

    #[tokio::test]
    async fn mutations_are_written_through() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        let carts = CartsService::load(storage.clone()).await?;
        let shop = ShopUuid::now_v7();
        let item = ItemUuid::now_v7();

        carts.add_to_cart(CartItem::new(item, "Cheddar", 4_00, 2), shop, "Dairy", meta())?;
        carts.update_item_quantity(shop, item, 3)?;
        carts.settle().await;

        let saved = storage.get_item(CART_KEY).await?.ok_or("cart was not saved")?;
        let restored = CartAggregate::from_json(&saved)?;

        assert_eq!(restored, carts.snapshot());
        assert_eq!(restored.shop(shop).map(ShopCart::subtotal), Some(12_00));

        Ok(())
    }

    #[tokio::test]
    async fn saved_cart_is_restored_on_load() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        let shop = ShopUuid::now_v7();

        {
            let carts = CartsService::load(storage.clone()).await?;

            carts.add_to_cart(
                CartItem::new(ItemUuid::now_v7(), "Brie", 6_00, 1),
                shop,
                "Dairy",
                meta(),
            )?;
            carts.settle().await;
        }

        let carts = CartsService::load(storage).await?;

        assert_eq!(carts.shop_count(), 1);
        assert_eq!(carts.total_subtotal(), 6_00);

        Ok(())
    }

    #[tokio::test]
    async fn unreadable_saved_cart_starts_empty() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());

        storage.set_item(CART_KEY, "{{{").await?;

        let carts = CartsService::load(storage).await?;

        assert_eq!(carts.item_count(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn unchanged_cart_is_not_rewritten() -> TestResult {
        let mut storage = MockLocalStorage::new();

        storage.expect_get_item().returning(|_| Ok(None));
        storage.expect_set_item().never();

        let carts = CartsService::load(Arc::new(storage)).await?;

        assert!(!carts.remove_from_cart(ShopUuid::now_v7(), ItemUuid::now_v7())?);
        assert!(!carts.clear_cart());

        carts.settle().await;

        Ok(())
    }

    #[tokio::test]
    async fn failed_writes_do_not_affect_the_cart() -> TestResult {
        let mut storage = MockLocalStorage::new();

        storage.expect_get_item().returning(|_| Ok(None));
        storage.expect_set_item().returning(|_, _| {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        });

        let carts = CartsService::load(Arc::new(storage)).await?;

        assert!(carts.add_to_cart(
            CartItem::new(ItemUuid::now_v7(), "Feta", 3_00, 1),
            ShopUuid::now_v7(),
            "Dairy",
            meta(),
        )?);

        carts.settle().await;

        assert_eq!(carts.item_count(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn load_fails_when_storage_is_unreadable() {
        let mut storage = MockLocalStorage::new();

        storage
            .expect_get_item()
            .returning(|_| Err(StorageError::Io(std::io::Error::other("locked"))));

        let result = CartsService::load(Arc::new(storage)).await;

        assert!(
            matches!(result, Err(CartsServiceError::Storage(_))),
            "expected Storage error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn refused_changes_are_not_written() -> TestResult {
        let mut storage = MockLocalStorage::new();

        storage.expect_get_item().returning(|_| Ok(None));
        storage.expect_set_item().times(1).returning(|_, _| Ok(()));

        let carts = CartsService::load(Arc::new(storage)).await?;
        let shop = ShopUuid::now_v7();
        let item = ItemUuid::now_v7();

        carts.add_to_cart(CartItem::new(item, "Tractor", u64::MAX, 1), shop, "Farm", meta())?;
        carts.settle().await;

        let result = carts.update_item_quantity(shop, item, 2);

        assert!(
            matches!(result, Err(CartsServiceError::Refused(_))),
            "expected Refused, got {result:?}"
        );
        assert_eq!(carts.total_subtotal(), u64::MAX);

        carts.settle().await;

        Ok(())
    }
}
