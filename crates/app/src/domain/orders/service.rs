//! Orders service.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use marketplace::{
    ids::{OrderUuid, ShopUuid, UserUuid},
    orders::{Order, OrderLists, OrderRole, OrderStatus},
};
use mockall::automock;
use tracing::{info, warn};

use crate::domain::{
    catalog::ItemsRepository,
    orders::{errors::OrdersServiceError, repository::OrdersRepository},
};

/// Outcome of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub order_id: OrderUuid,
    pub shop_id: ShopUuid,
    pub from: OrderStatus,
    pub to: OrderStatus,

    /// Line items whose stock could not be decremented.
    pub inventory_failures: usize,
}

impl StatusUpdate {
    /// Reflect the change in locally held order lists.
    pub fn apply(&self, lists: &mut OrderLists) -> usize {
        lists.apply_status(self.order_id, self.shop_id, self.to)
    }
}

#[derive(Clone)]
pub struct BackendOrdersService {
    orders: Arc<dyn OrdersRepository>,
    items: Arc<dyn ItemsRepository>,
}

impl BackendOrdersService {
    #[must_use]
    pub fn new(orders: Arc<dyn OrdersRepository>, items: Arc<dyn ItemsRepository>) -> Self {
        Self { orders, items }
    }

    /// Take every ordered line out of stock. Each line is attempted regardless of the others.
    async fn decrement_inventory(&self, order: &Order) -> usize {
        let results = join_all(order.items.iter().map(|item| async move {
            let delta = -i64::from(item.quantity);

            self.items
                .adjust_quantity(item.item_id, delta)
                .await
                .map_err(|error| (item.item_id, error))
        }))
        .await;

        results
            .into_iter()
            .filter_map(Result::err)
            .inspect(|(item_id, error)| {
                warn!(order_id = %order.id, %item_id, %error, "failed to decrement inventory");
            })
            .count()
    }
}

impl std::fmt::Debug for BackendOrdersService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendOrdersService").finish_non_exhaustive()
    }
}

#[async_trait]
impl OrdersService for BackendOrdersService {
    async fn update_status(
        &self,
        role: OrderRole,
        order: &Order,
        next: OrderStatus,
    ) -> Result<StatusUpdate, OrdersServiceError> {
        if role == OrderRole::Buyer {
            return Err(OrdersServiceError::ReadOnly);
        }

        let from = order.status;
        let to = from.transition_to(next)?;

        let inventory_failures = if from.decrements_inventory(to) {
            self.decrement_inventory(order).await
        } else {
            0
        };

        self.orders
            .update_order_status(order.id, order.shop_id, to)
            .await?;

        info!(order_id = %order.id, shop_id = %order.shop_id, %from, %to, "order status changed");

        Ok(StatusUpdate {
            order_id: order.id,
            shop_id: order.shop_id,
            from,
            to,
            inventory_failures,
        })
    }

    async fn orders_for_user(&self, user: UserUuid) -> Result<OrderLists, OrdersServiceError> {
        Ok(self.orders.get_orders_for_user(user).await?)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Move an order to its next status on behalf of `role`.
    ///
    /// Accepting a pending order also takes its items out of stock; stock failures are logged
    /// and counted but never block the status change.
    async fn update_status(
        &self,
        role: OrderRole,
        order: &Order,
        next: OrderStatus,
    ) -> Result<StatusUpdate, OrdersServiceError>;

    /// Fetch the orders visible to a user.
    async fn orders_for_user(&self, user: UserUuid) -> Result<OrderLists, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use marketplace::{
        ids::ItemUuid,
        orders::{DeliveryOption, StatusError},
    };
    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::{
        domain::catalog::MockItemsRepository,
        repository::RepositoryError,
        test::helpers::{order_with_items, pending_order},
    };

    use super::{super::repository::MockOrdersRepository, *};

    fn service(orders: MockOrdersRepository, items: MockItemsRepository) -> BackendOrdersService {
        BackendOrdersService::new(Arc::new(orders), Arc::new(items))
    }

    #[tokio::test]
    async fn accepting_decrements_each_line_even_when_one_fails() -> TestResult {
        let item_a = ItemUuid::now_v7();
        let item_b = ItemUuid::now_v7();
        let order = order_with_items(&[(item_a, 3), (item_b, 1)], DeliveryOption::Pickup);

        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);

        let mut items = MockItemsRepository::new();

        items
            .expect_adjust_quantity()
            .times(2)
            .returning(move |item, delta| {
                recorded
                    .lock()
                    .map_err(|_poisoned| RepositoryError::Unavailable("poisoned".into()))?
                    .push((item, delta));

                if item == item_a {
                    Err(RepositoryError::Unavailable("timeout".into()))
                } else {
                    Ok(())
                }
            });

        let mut orders = MockOrdersRepository::new();

        orders
            .expect_update_order_status()
            .with(eq(order.id), eq(order.shop_id), eq(OrderStatus::Preparing))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let update = service(orders, items)
            .update_status(OrderRole::ShopOwner, &order, OrderStatus::Preparing)
            .await?;

        let mut calls = calls.lock().map_err(|_poisoned| "poisoned")?.clone();

        calls.sort_by_key(|&(_, delta)| delta);

        assert_eq!(calls, vec![(item_a, -3), (item_b, -1)]);
        assert_eq!(update.inventory_failures, 1);
        assert_eq!(update.to, OrderStatus::Preparing);

        Ok(())
    }

    #[tokio::test]
    async fn later_transitions_leave_inventory_alone() -> TestResult {
        let mut order = pending_order(DeliveryOption::Delivery);

        order.status = OrderStatus::Preparing;

        let mut items = MockItemsRepository::new();

        items.expect_adjust_quantity().never();

        let mut orders = MockOrdersRepository::new();

        orders
            .expect_update_order_status()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let update = service(orders, items)
            .update_status(OrderRole::ShopOwner, &order, OrderStatus::Ready)
            .await?;

        assert_eq!(update.from, OrderStatus::Preparing);
        assert_eq!(update.inventory_failures, 0);

        Ok(())
    }

    #[tokio::test]
    async fn ready_pickup_orders_go_out_for_delivery() -> TestResult {
        let mut order = pending_order(DeliveryOption::Pickup);

        order.status = OrderStatus::Ready;

        let mut orders = MockOrdersRepository::new();

        orders
            .expect_update_order_status()
            .with(eq(order.id), eq(order.shop_id), eq(OrderStatus::InDelivery))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let update = service(orders, MockItemsRepository::new())
            .update_status(OrderRole::ShopOwner, &order, OrderStatus::InDelivery)
            .await?;

        assert_eq!(update.to, OrderStatus::InDelivery);

        Ok(())
    }

    #[tokio::test]
    async fn buyers_cannot_change_status() {
        let order = pending_order(DeliveryOption::Pickup);

        let mut orders = MockOrdersRepository::new();

        orders.expect_update_order_status().never();

        let result = service(orders, MockItemsRepository::new())
            .update_status(OrderRole::Buyer, &order, OrderStatus::Cancelled)
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::ReadOnly)),
            "expected ReadOnly, got {result:?}"
        );
    }

    #[tokio::test]
    async fn invalid_transition_makes_no_calls() {
        let order = pending_order(DeliveryOption::Pickup);

        let mut orders = MockOrdersRepository::new();
        let mut items = MockItemsRepository::new();

        orders.expect_update_order_status().never();
        items.expect_adjust_quantity().never();

        let result = service(orders, items)
            .update_status(OrderRole::ShopOwner, &order, OrderStatus::Completed)
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Status(StatusError::InvalidTransition { .. }))
            ),
            "expected InvalidTransition, got {result:?}"
        );
    }

    #[tokio::test]
    async fn status_update_failure_is_reported() {
        let order = pending_order(DeliveryOption::Pickup);

        let mut orders = MockOrdersRepository::new();

        orders
            .expect_update_order_status()
            .returning(|_, _, _| Err(RepositoryError::Unavailable("offline".into())));

        let result = service(orders, MockItemsRepository::new())
            .update_status(OrderRole::ShopOwner, &order, OrderStatus::Cancelled)
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::Repository(_))),
            "expected Repository error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn applying_an_update_touches_matching_orders() -> TestResult {
        let order = pending_order(DeliveryOption::Pickup);

        let mut lists = OrderLists {
            placed: vec![order.clone()],
            received: Vec::new(),
            all: vec![order.clone()],
        };

        let mut orders = MockOrdersRepository::new();

        orders
            .expect_update_order_status()
            .returning(|_, _, _| Ok(()));

        let update = service(orders, MockItemsRepository::new())
            .update_status(OrderRole::ShopOwner, &order, OrderStatus::Cancelled)
            .await?;

        assert_eq!(update.apply(&mut lists), 2);
        assert_eq!(lists.history().count(), 1);

        Ok(())
    }
}
