use std::sync::Arc;

use domain::{AddressService, CartService, CheckoutService, OrderQueryService, TimelineService};
use store::Store;

use crate::auth::Authenticator;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub addresses: AddressService<S>,
    pub cart: CartService<S>,
    pub checkout: CheckoutService<S>,
    pub timeline: TimelineService<S>,
    pub orders: OrderQueryService<S>,
    pub authenticator: Arc<dyn Authenticator>,
}

impl<S: Store> AppState<S> {
    /// Builds every service over one store.
    pub fn new(
        store: S,
        authenticator: Arc<dyn Authenticator>,
        order_number_attempts: u32,
    ) -> Self {
        Self {
            addresses: AddressService::new(store.clone()),
            cart: CartService::new(store.clone()),
            checkout: CheckoutService::new(store.clone()).with_max_attempts(order_number_attempts),
            timeline: TimelineService::new(store.clone()),
            orders: OrderQueryService::new(store),
            authenticator,
        }
    }
}
