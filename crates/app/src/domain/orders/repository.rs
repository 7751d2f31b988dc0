//! Orders Repository

use async_trait::async_trait;
use marketplace::{
    ids::{OrderUuid, ShopUuid, UserUuid},
    orders::{NewOrder, Order, OrderLists, OrderStatus},
};
use mockall::automock;

use crate::repository::RepositoryError;

#[automock]
#[async_trait]
pub trait OrdersRepository: Send + Sync {
    /// Store a new order, returning it with its document identity.
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    /// Set the status of the order identified by `(order, shop)`.
    async fn update_order_status(
        &self,
        order: OrderUuid,
        shop: ShopUuid,
        status: OrderStatus,
    ) -> Result<(), RepositoryError>;

    /// Orders a user placed, orders their shops received, and both combined.
    async fn get_orders_for_user(&self, user: UserUuid) -> Result<OrderLists, RepositoryError>;
}
