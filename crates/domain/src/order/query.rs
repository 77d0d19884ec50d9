use common::{OrderId, UserId};
use serde::Serialize;
use store::{Order, OrderLine, OrderStore, StatusEvent};

use super::{TimelineService, owned_order};
use crate::error::Result;

/// An order with its line snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderLine>,
}

/// Read-only, ownership-scoped views over orders.
#[derive(Clone)]
pub struct OrderQueryService<S> {
    store: S,
    timeline: TimelineService<S>,
}

impl<S: OrderStore + Clone> OrderQueryService<S> {
    pub fn new(store: S) -> Self {
        Self {
            timeline: TimelineService::new(store.clone()),
            store,
        }
    }

    /// The user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.list_orders(user_id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, user_id: UserId, order_id: OrderId) -> Result<OrderDetails> {
        let order = owned_order(&self.store, user_id, order_id).await?;
        let items = self.store.order_lines(order_id).await?;
        Ok(OrderDetails { order, items })
    }

    /// The order's status timeline, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn track(&self, user_id: UserId, order_id: OrderId) -> Result<Vec<StatusEvent>> {
        owned_order(&self.store, user_id, order_id).await?;
        self.timeline.history(order_id).await
    }
}

#[cfg(test)]
mod tests {
    use common::{AddressType, Money, OrderStatus, PaymentMethod, ProductId};
    use store::{AddressFields, AddressStore, InMemoryStore, NewOrder, NewOrderLine};

    use super::*;
    use crate::error::DomainError;

    async fn place(store: &InMemoryStore, user: UserId, number: &str) -> OrderId {
        let fields = AddressFields {
            full_name: "Asha".into(),
            phone: "1".into(),
            line1: "x".into(),
            line2: None,
            city: "y".into(),
            state: "z".into(),
            pincode: "1".into(),
            address_type: AddressType::Home,
        };
        let address = store.insert_address(user, fields, false).await.unwrap();
        let order = NewOrder {
            order_number: number.into(),
            user_id: user,
            address_id: address.id,
            delivery_address: Some("Gate 2".into()),
            payment_method: PaymentMethod::Card,
            subtotal: Money::from_cents(300),
            delivery_fee: Money::zero(),
            discount_amount: Money::zero(),
            total_amount: Money::from_cents(300),
            lines: vec![NewOrderLine {
                product_id: ProductId::new(5),
                product_name: "Eggs".into(),
                product_image: None,
                quantity: 3,
                unit_price: Money::from_cents(100),
            }],
            initial_remarks: "Order received successfully".into(),
        };
        store.create_order(order).await.unwrap().order.id
    }

    #[tokio::test]
    async fn list_is_newest_first_and_per_user() {
        let store = InMemoryStore::new();
        let queries = OrderQueryService::new(store.clone());
        let user = UserId::new(1);
        let first = place(&store, user, "ORD-1").await;
        let second = place(&store, user, "ORD-2").await;
        place(&store, UserId::new(2), "ORD-3").await;

        let orders = queries.list_for_user(user).await.unwrap();
        let ids: Vec<_> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn details_and_tracking_for_owner() {
        let store = InMemoryStore::new();
        let queries = OrderQueryService::new(store.clone());
        let user = UserId::new(1);
        let order_id = place(&store, user, "ORD-1").await;

        let details = queries.get_by_id(user, order_id).await.unwrap();
        assert_eq!(details.order.delivery_address, "Gate 2");
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].total_price, Money::from_cents(300));

        let events = queries.track(user, order_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, OrderStatus::Placed);
    }

    #[tokio::test]
    async fn other_users_order_is_not_found() {
        let store = InMemoryStore::new();
        let queries = OrderQueryService::new(store.clone());
        let order_id = place(&store, UserId::new(1), "ORD-1").await;
        let intruder = UserId::new(2);

        assert!(matches!(
            queries.get_by_id(intruder, order_id).await,
            Err(DomainError::NotFound { resource: "order", .. })
        ));
        assert!(matches!(
            queries.track(intruder, order_id).await,
            Err(DomainError::NotFound { resource: "order", .. })
        ));
        assert!(matches!(
            queries.get_by_id(intruder, OrderId::new(999)).await,
            Err(DomainError::NotFound { resource: "order", .. })
        ));
    }
}
