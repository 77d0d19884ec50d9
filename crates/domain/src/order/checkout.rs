use std::sync::Arc;
use std::time::Instant;

use common::{AddressId, Money, PaymentMethod, ProductId, UserId};
use serde::Deserialize;
use store::{
    AddressStore, CreatedOrder, NewOrder, NewOrderLine, ORDER_NUMBER_CONSTRAINT, OrderStore,
};

use super::number::{OrderNumberGenerator, RandomOrderNumbers};
use crate::error::{DomainError, Result};
use crate::pricing::{Charges, checked_subtotal};

/// Remarks on the first timeline entry of every order.
pub const INITIAL_REMARKS: &str = "Order received successfully";

pub const DEFAULT_ORDER_NUMBER_ATTEMPTS: u32 = 5;

/// A checkout as submitted by the client.
///
/// `price`, `productName` and `productImage` are frozen into the order as
/// given; they are not re-read from the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub address_id: Option<AddressId>,
    /// Delivery snapshot text. Rendered from the stored address when absent.
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub items: Vec<CheckoutLine>,
    pub total_amount: Option<Money>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
    #[serde(default)]
    pub product_name: String,
    pub product_image: Option<String>,
}

/// Turns a cart snapshot into an order in one atomic unit.
#[derive(Clone)]
pub struct CheckoutService<S> {
    store: S,
    numbers: Arc<dyn OrderNumberGenerator>,
    max_attempts: u32,
    charges: Charges,
}

impl<S: AddressStore + OrderStore> CheckoutService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            numbers: Arc::new(RandomOrderNumbers),
            max_attempts: DEFAULT_ORDER_NUMBER_ATTEMPTS,
            charges: Charges::default(),
        }
    }

    /// Replaces the order number source.
    pub fn with_order_numbers(mut self, numbers: Arc<dyn OrderNumberGenerator>) -> Self {
        self.numbers = numbers;
        self
    }

    /// Sets how many order numbers are tried before giving up. At least one.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Validates the request and persists header, lines and the initial
    /// `PLACED` event together.
    ///
    /// Fails with `Validation` before any write, with `NotFound` when the
    /// address is missing or not the user's, and with `Conflict` once every
    /// order number attempt has collided. A failed attempt leaves no rows.
    #[tracing::instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: CheckoutRequest,
    ) -> Result<CreatedOrder> {
        let started = Instant::now();
        let template = self.prepare(user_id, request)?;

        for attempt in 1..=self.max_attempts {
            let order = NewOrder {
                order_number: self.numbers.generate(),
                ..template.clone()
            };
            let order_number = order.order_number.clone();

            match self.store.create_order(order).await {
                Ok(created) => {
                    metrics::counter!("orders_created_total").increment(1);
                    metrics::histogram!("checkout_duration_seconds")
                        .record(started.elapsed().as_secs_f64());
                    tracing::info!(
                        order_id = %created.order.id,
                        order_number = %created.order.order_number,
                        total = %created.order.total_amount,
                        "order placed"
                    );
                    return Ok(created);
                }
                Err(err) if err.is_conflict_on(ORDER_NUMBER_CONSTRAINT) => {
                    metrics::counter!("order_number_collisions_total").increment(1);
                    tracing::warn!(%order_number, attempt, "order number collision, retrying");
                }
                Err(err) => {
                    metrics::counter!("checkout_failures_total").increment(1);
                    return Err(err.into());
                }
            }
        }

        metrics::counter!("checkout_failures_total").increment(1);
        Err(DomainError::Conflict(format!(
            "no unique order number after {} attempts",
            self.max_attempts
        )))
    }

    /// Fail-fast validation. Builds everything but the order number.
    fn prepare(&self, user_id: UserId, request: CheckoutRequest) -> Result<NewOrder> {
        let invalid = || DomainError::validation("Invalid order data");

        let address_id = request.address_id.ok_or_else(invalid)?;
        let claimed_total = request.total_amount.ok_or_else(invalid)?;
        if request.items.is_empty() {
            return Err(invalid());
        }
        if let Some(line) = request.items.iter().find(|l| l.quantity == 0) {
            return Err(DomainError::validation(format!(
                "Quantity for product {} must be at least 1",
                line.product_id
            )));
        }
        if let Some(line) = request
            .items
            .iter()
            .find(|l| i32::try_from(l.quantity).is_err())
        {
            return Err(DomainError::validation(format!(
                "Quantity for product {} is too large",
                line.product_id
            )));
        }
        if request.items.iter().any(|l| l.price.is_negative()) {
            return Err(DomainError::validation("Item price cannot be negative"));
        }
        if request.items.iter().any(|l| !l.price.fits_storage()) {
            return Err(DomainError::validation("Item price is too large"));
        }

        let subtotal = checked_subtotal(request.items.iter().map(|l| (l.price, l.quantity)))
            .filter(Money::fits_storage)
            .ok_or_else(|| DomainError::validation("Order total is too large"))?;
        let totals = self.charges.apply(subtotal);
        if totals.total_amount != claimed_total {
            return Err(DomainError::validation(format!(
                "totalAmount {claimed_total} does not match computed total {}",
                totals.total_amount
            )));
        }

        let delivery_address = request
            .delivery_address
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        let lines = request
            .items
            .into_iter()
            .map(|line| NewOrderLine {
                product_id: line.product_id,
                product_name: line.product_name,
                product_image: line.product_image,
                quantity: line.quantity,
                unit_price: line.price,
            })
            .collect();

        Ok(NewOrder {
            order_number: String::new(),
            user_id,
            address_id,
            delivery_address,
            payment_method: request.payment_method,
            subtotal: totals.subtotal,
            delivery_fee: totals.delivery_fee,
            discount_amount: totals.discount_amount,
            total_amount: totals.total_amount,
            lines,
            initial_remarks: INITIAL_REMARKS.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use common::{AddressType, OrderStatus};
    use store::{AddressFields, InMemoryStore};

    use super::*;

    /// Replays a fixed list of numbers, then repeats the last one.
    struct Scripted(Mutex<Vec<&'static str>>);

    impl OrderNumberGenerator for Scripted {
        fn generate(&self) -> String {
            let mut numbers = self.0.lock().unwrap();
            if numbers.len() > 1 {
                numbers.remove(0).to_string()
            } else {
                numbers[0].to_string()
            }
        }
    }

    async fn store_with_address(user: UserId) -> (InMemoryStore, AddressId) {
        let store = InMemoryStore::new();
        let fields = AddressFields {
            full_name: "Asha".into(),
            phone: "9800000000".into(),
            line1: "12 MG Road".into(),
            line2: None,
            city: "Bengaluru".into(),
            state: "KA".into(),
            pincode: "560001".into(),
            address_type: AddressType::Home,
        };
        let address = store.insert_address(user, fields, true).await.unwrap();
        (store, address.id)
    }

    fn line(product: i64, quantity: u32, cents: i64) -> CheckoutLine {
        CheckoutLine {
            product_id: ProductId::new(product),
            quantity,
            price: Money::from_cents(cents),
            product_name: format!("Product {product}"),
            product_image: None,
        }
    }

    fn request(address_id: AddressId, total_cents: i64) -> CheckoutRequest {
        CheckoutRequest {
            address_id: Some(address_id),
            delivery_address: None,
            payment_method: PaymentMethod::Cod,
            items: vec![line(1, 2, 1_000), line(2, 1, 500)],
            total_amount: Some(Money::from_cents(total_cents)),
        }
    }

    #[tokio::test]
    async fn places_order_with_server_computed_subtotal() {
        let user = UserId::new(1);
        let (store, address_id) = store_with_address(user).await;
        let service = CheckoutService::new(store.clone());

        let created = service.place_order(user, request(address_id, 2_500)).await.unwrap();

        assert_eq!(created.order.subtotal, Money::from_cents(2_500));
        assert_eq!(created.order.status, OrderStatus::Placed);
        assert_eq!(created.lines.len(), 2);
        assert_eq!(created.initial_event.remarks.as_deref(), Some(INITIAL_REMARKS));
        assert!(created.order.order_number.starts_with("ORD"));
    }

    #[tokio::test]
    async fn rejects_invalid_payloads_without_writing() {
        let user = UserId::new(1);
        let (store, address_id) = store_with_address(user).await;
        let service = CheckoutService::new(store.clone());

        let mut no_items = request(address_id, 0);
        no_items.items.clear();
        let mut zero_quantity = request(address_id, 1_500);
        zero_quantity.items[0].quantity = 0;
        let mut no_total = request(address_id, 2_500);
        no_total.total_amount = None;
        let mut no_address = request(address_id, 2_500);
        no_address.address_id = None;
        let wrong_total = request(address_id, 100);

        for bad in [no_items, zero_quantity, no_total, no_address, wrong_total] {
            assert!(matches!(
                service.place_order(user, bad).await,
                Err(DomainError::Validation(_))
            ));
        }
        assert_eq!(store.order_row_counts().await, (0, 0, 0));
    }

    #[tokio::test]
    async fn rejects_amounts_beyond_storage_range() {
        let user = UserId::new(1);
        let (store, address_id) = store_with_address(user).await;
        let service = CheckoutService::new(store.clone());

        let overflowing: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "addressId": address_id,
            "items": [{ "productId": 1, "quantity": 4_000_000_000u32, "price": 1e20 }],
            "totalAmount": 1.0
        }))
        .unwrap();

        let mut huge_quantity = request(address_id, 2_500);
        huge_quantity.items[0].quantity = u32::MAX;
        let mut huge_price = request(address_id, 2_500);
        huge_price.items[0].price = Money::from_cents(Money::MAX_STORED_CENTS + 1);
        let mut huge_sum = request(address_id, 2_500);
        huge_sum.items = vec![
            line(1, 1, Money::MAX_STORED_CENTS),
            line(2, 1, Money::MAX_STORED_CENTS),
        ];

        for bad in [overflowing, huge_quantity, huge_price, huge_sum] {
            assert!(matches!(
                service.place_order(user, bad).await,
                Err(DomainError::Validation(_))
            ));
        }
        assert_eq!(store.order_row_counts().await, (0, 0, 0));
    }

    #[tokio::test]
    async fn foreign_address_is_not_found() {
        let (store, address_id) = store_with_address(UserId::new(1)).await;
        let service = CheckoutService::new(store.clone());

        let err = service
            .place_order(UserId::new(2), request(address_id, 2_500))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::NotFound {
                resource: "address",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn retries_on_order_number_collision() {
        let user = UserId::new(1);
        let (store, address_id) = store_with_address(user).await;
        let numbers = Arc::new(Scripted(Mutex::new(vec!["ORD-A", "ORD-A", "ORD-B"])));
        let service = CheckoutService::new(store.clone()).with_order_numbers(numbers);

        let first = service.place_order(user, request(address_id, 2_500)).await.unwrap();
        let second = service.place_order(user, request(address_id, 2_500)).await.unwrap();

        assert_eq!(first.order.order_number, "ORD-A");
        assert_eq!(second.order.order_number, "ORD-B");
        assert_eq!(store.order_row_counts().await, (2, 4, 2));
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let user = UserId::new(1);
        let (store, address_id) = store_with_address(user).await;
        let numbers = Arc::new(Scripted(Mutex::new(vec!["ORD-A"])));
        let service = CheckoutService::new(store.clone())
            .with_order_numbers(numbers)
            .with_max_attempts(3);

        service.place_order(user, request(address_id, 2_500)).await.unwrap();
        let err = service
            .place_order(user, request(address_id, 2_500))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(store.order_row_counts().await, (1, 2, 1));
    }

    #[tokio::test]
    async fn failed_status_insert_leaves_nothing_behind() {
        let user = UserId::new(1);
        let (store, address_id) = store_with_address(user).await;
        let service = CheckoutService::new(store.clone());

        store.fail_next_status_insert();
        let err = service
            .place_order(user, request(address_id, 2_500))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Persistence(_)));
        assert_eq!(store.order_row_counts().await, (0, 0, 0));
    }

    #[test]
    fn request_deserializes_camel_case_only() {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "addressId": 3,
            "paymentMethod": "UPI",
            "items": [{"productId": 1, "quantity": 2, "price": 10.0}],
            "totalAmount": 20.0,
            "total_amount": 99.0
        }))
        .unwrap();

        assert_eq!(request.address_id, Some(AddressId::new(3)));
        assert_eq!(request.payment_method, PaymentMethod::Upi);
        assert_eq!(request.total_amount, Some(Money::from_cents(2_000)));
        assert_eq!(request.items[0].product_name, "");
    }
}
