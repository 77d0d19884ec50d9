//! Orders: checkout, status timeline and ownership-scoped reads.

mod checkout;
mod number;
mod query;
mod timeline;

pub use checkout::{
    CheckoutLine, CheckoutRequest, CheckoutService, DEFAULT_ORDER_NUMBER_ATTEMPTS,
    INITIAL_REMARKS,
};
pub use number::{OrderNumberGenerator, RandomOrderNumbers};
pub use query::{OrderDetails, OrderQueryService};
pub use timeline::TimelineService;

use common::{OrderId, UserId};
use store::{Order, OrderStore};

use crate::error::{DomainError, Result};

/// Loads an order for its owner.
///
/// An order owned by someone else is reported exactly like a missing one so
/// callers cannot probe for other users' order ids.
pub(crate) async fn owned_order<S: OrderStore>(
    store: &S,
    user_id: UserId,
    order_id: OrderId,
) -> Result<Order> {
    store
        .get_order(order_id)
        .await?
        .filter(|order| order.user_id == user_id)
        .ok_or_else(|| DomainError::not_found("order", order_id))
}
