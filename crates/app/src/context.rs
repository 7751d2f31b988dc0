//! App Context

use std::sync::{Arc, PoisonError, RwLock};

use marketplace::checkout::{CheckoutDetails, DeliverySelections};
use thiserror::Error;
use tracing::info;

use crate::{
    domain::{
        carts::{CartsService, CartsServiceError},
        catalog::{ItemsRepository, ShopsRepository},
        checkout::{CheckoutService, CheckoutServiceError, PlacedOrders},
        messaging::{BackendMessagingService, MessagingService, Notifier, ThreadsRepository},
        orders::{BackendOrdersService, OrdersRepository, OrdersService},
    },
    session::{self, Session, SessionError},
    storage::LocalStorage,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to restore session")]
    Session(#[from] SessionError),

    #[error("failed to restore cart")]
    Cart(#[from] CartsServiceError),
}

/// Backend collaborators the app talks to.
#[derive(Clone)]
pub struct Backend {
    pub shops: Arc<dyn ShopsRepository>,
    pub items: Arc<dyn ItemsRepository>,
    pub orders: Arc<dyn OrdersRepository>,
    pub threads: Arc<dyn ThreadsRepository>,
    pub notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}

pub struct AppContext {
    pub carts: Arc<CartsService>,
    pub checkout: Arc<CheckoutService>,
    pub orders: Arc<dyn OrdersService>,
    pub messaging: Arc<dyn MessagingService>,
    storage: Arc<dyn LocalStorage>,
    session: RwLock<Option<Session>>,
}

impl AppContext {
    /// Restore the saved session and cart, and wire services to `backend`.
    ///
    /// # Errors
    ///
    /// Returns an error when local storage cannot be read.
    pub async fn connect(
        backend: Backend,
        storage: Arc<dyn LocalStorage>,
    ) -> Result<Self, AppInitError> {
        let session = session::load(storage.as_ref()).await?;
        let carts = Arc::new(CartsService::load(Arc::clone(&storage)).await?);

        let messaging: Arc<dyn MessagingService> = Arc::new(BackendMessagingService::new(
            backend.threads,
            backend.notifier,
        ));

        let orders: Arc<dyn OrdersService> = Arc::new(BackendOrdersService::new(
            Arc::clone(&backend.orders),
            backend.items,
        ));

        let checkout = Arc::new(CheckoutService::new(
            Arc::clone(&carts),
            backend.shops,
            backend.orders,
            Arc::clone(&messaging),
        ));

        info!(signed_in = session.is_some(), "app context connected");

        Ok(Self {
            carts,
            checkout,
            orders,
            messaging,
            storage,
            session: RwLock::new(session),
        })
    }

    /// The signed-in user, if any.
    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remember `session` as the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error when the session cannot be saved.
    pub async fn sign_in(&self, session: Session) -> Result<(), SessionError> {
        session::save(self.storage.as_ref(), &session).await?;

        info!(user_id = %session.user_id, "signed in");

        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);

        Ok(())
    }

    /// Forget the signed-in user. The cart is kept.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored session cannot be removed.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        session::clear(self.storage.as_ref()).await?;

        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;

        info!("signed out");

        Ok(())
    }

    /// Check out the cart as the signed-in user.
    ///
    /// # Errors
    ///
    /// See [`CheckoutService::place_order`].
    pub async fn place_order(
        &self,
        selections: &DeliverySelections,
        details: &CheckoutDetails,
    ) -> Result<PlacedOrders, CheckoutServiceError> {
        let session = self.session();

        self.checkout
            .place_order(session.as_ref(), selections, details)
            .await
    }

    /// Wait for pending cart writes before the app is suspended or exits.
    pub async fn disconnect(self) {
        self.carts.settle().await;
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("carts", &self.carts)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
