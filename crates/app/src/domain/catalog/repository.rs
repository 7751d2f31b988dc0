//! Catalog repositories.

use async_trait::async_trait;
use marketplace::ids::{ItemUuid, ShopUuid, UserUuid};
use mockall::automock;

use crate::repository::RepositoryError;

#[automock]
#[async_trait]
pub trait ShopsRepository: Send + Sync {
    /// Resolve the user who owns a shop.
    async fn get_shop_owner(&self, shop: ShopUuid) -> Result<UserUuid, RepositoryError>;
}

#[automock]
#[async_trait]
pub trait ItemsRepository: Send + Sync {
    /// Change an item's stock level by `delta` units.
    async fn adjust_quantity(&self, item: ItemUuid, delta: i64) -> Result<(), RepositoryError>;
}
