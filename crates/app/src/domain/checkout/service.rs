//! Checkout service.
//!
//! Turns the cart into one order per shop and lets each shop owner know. Orders are created
//! independently; a failure part-way leaves earlier orders in place and the cart untouched,
//! so retrying can duplicate them.

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use jiff::Timestamp;
use marketplace::{
    cart::CartAggregate,
    checkout::{self, CheckoutDetails, CheckoutError, DeliverySelections, OwnerOrders},
    ids::{OrderGroupUuid, ShopUuid, UserUuid},
    messaging::{MessageBody, OrderSummary},
    orders::{Order, OrderLists},
};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::{
    domain::{
        carts::CartsService,
        catalog::ShopsRepository,
        checkout::errors::CheckoutServiceError,
        messaging::{MessagingService, MessagingServiceError, OutgoingMessage},
        orders::OrdersRepository,
    },
    repository::RepositoryError,
    session::Session,
};

/// The result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrders {
    /// Shared by every order from this checkout.
    pub group: OrderGroupUuid,

    /// One order per shop, in cart order.
    pub orders: Vec<Order>,

    /// The buyer's refreshed orders, if they could be fetched.
    pub order_lists: Option<OrderLists>,
}

pub struct CheckoutService {
    carts: Arc<CartsService>,
    shops: Arc<dyn ShopsRepository>,
    orders: Arc<dyn OrdersRepository>,
    messaging: Arc<dyn MessagingService>,
}

impl CheckoutService {
    #[must_use]
    pub fn new(
        carts: Arc<CartsService>,
        shops: Arc<dyn ShopsRepository>,
        orders: Arc<dyn OrdersRepository>,
        messaging: Arc<dyn MessagingService>,
    ) -> Self {
        Self {
            carts,
            shops,
            orders,
            messaging,
        }
    }

    /// Place one order per shop in the cart.
    ///
    /// Shop owners are messaged a summary of their orders; failing to reach one is logged and
    /// does not affect the others. The cart is cleared once every order exists.
    ///
    /// # Errors
    ///
    /// - [`CheckoutServiceError::Validation`]: the checkout is incomplete. Nothing is sent to the
    ///   backend.
    /// - [`CheckoutServiceError::PlacementFailed`]: a shop owner could not be resolved or an order
    ///   could not be stored.
    pub async fn place_order(
        &self,
        session: Option<&Session>,
        selections: &DeliverySelections,
        details: &CheckoutDetails,
    ) -> Result<PlacedOrders, CheckoutServiceError> {
        let cart = self.carts.snapshot();

        checkout::validate(session.is_some(), &cart, selections, details)?;

        let Some(session) = session else {
            return Err(CheckoutError::NotAuthenticated.into());
        };

        let group = OrderGroupUuid::now_v7();
        let drafts = checkout::new_orders(
            &cart,
            selections,
            details,
            session.user_id,
            group,
            Timestamp::now(),
        )?;

        let owners = self
            .resolve_owners(&cart)
            .await
            .map_err(CheckoutServiceError::PlacementFailed)?;

        let orders = try_join_all(drafts.into_iter().map(|draft| self.orders.create_order(draft)))
            .await
            .map_err(|error| {
                warn!(%group, %error, "failed to create orders");

                CheckoutServiceError::PlacementFailed(error)
            })?;

        info!(%group, orders = orders.len(), buyer = %session.user_id, "placed orders");

        self.notify_owners(session, &orders, &owners).await;

        let order_lists = match self.orders.get_orders_for_user(session.user_id).await {
            Ok(lists) => Some(lists),
            Err(error) => {
                warn!(%group, %error, "failed to refresh orders after checkout");

                None
            }
        };

        self.carts.clear_cart();

        Ok(PlacedOrders {
            group,
            orders,
            order_lists,
        })
    }

    async fn resolve_owners(
        &self,
        cart: &CartAggregate,
    ) -> Result<FxHashMap<ShopUuid, UserUuid>, RepositoryError> {
        let shops: Vec<ShopUuid> = cart.iter().map(|shop| shop.shop_id()).collect();

        let owners = try_join_all(shops.iter().map(|&shop| self.shops.get_shop_owner(shop)))
            .await
            .inspect_err(|error| warn!(%error, "failed to resolve shop owners"))?;

        Ok(shops.into_iter().zip(owners).collect())
    }

    async fn notify_owners(
        &self,
        session: &Session,
        orders: &[Order],
        owners: &FxHashMap<ShopUuid, UserUuid>,
    ) {
        let groups = checkout::group_by_owner(orders, owners, session.user_id);

        let results = join_all(groups.iter().map(|group| self.notify_owner(session, group))).await;

        for (group, result) in groups.iter().zip(results) {
            match result {
                Ok(()) => debug!(owner = %group.owner, "notified shop owner"),
                Err(error) => {
                    warn!(owner = %group.owner, %error, "failed to notify shop owner of order");
                }
            }
        }
    }

    async fn notify_owner(
        &self,
        session: &Session,
        group: &OwnerOrders<'_>,
    ) -> Result<(), MessagingServiceError> {
        let Some(summary) = OrderSummary::from_orders(&group.orders) else {
            return Ok(());
        };

        let thread = self
            .messaging
            .create_or_get_thread(session.user_id, group.owner, None)
            .await?;

        self.messaging
            .send_message(OutgoingMessage {
                thread_id: thread.id,
                sender_id: session.user_id,
                sender_name: session.display_name.clone(),
                recipient_id: group.owner,
                body: MessageBody::Order(summary),
            })
            .await?;

        Ok(())
    }
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService")
            .field("carts", &self.carts)
            .finish_non_exhaustive()
    }
}
