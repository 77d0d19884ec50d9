//! End-to-end order lifecycle scenarios on the in-memory store.

use std::sync::Arc;

use domain::{
    AddressDraft, AddressService, CartService, CheckoutLine, CheckoutRequest, CheckoutService,
    DomainError, OrderQueryService, TimelineService,
};
use futures_util::future::join_all;
use store::{AddressId, InMemoryStore, Money, OrderStatus, PaymentMethod, UserId};

struct Services {
    store: InMemoryStore,
    addresses: AddressService<InMemoryStore>,
    cart: CartService<InMemoryStore>,
    checkout: CheckoutService<InMemoryStore>,
    timeline: TimelineService<InMemoryStore>,
    queries: OrderQueryService<InMemoryStore>,
}

fn services() -> Services {
    let store = InMemoryStore::new();
    Services {
        addresses: AddressService::new(store.clone()),
        cart: CartService::new(store.clone()),
        checkout: CheckoutService::new(store.clone()),
        timeline: TimelineService::new(store.clone()),
        queries: OrderQueryService::new(store.clone()),
        store,
    }
}

fn draft(name: &str, is_default: bool) -> AddressDraft {
    AddressDraft {
        full_name: name.to_string(),
        phone: "9800000000".to_string(),
        address_line1: format!("{name} Street"),
        city: "Pune".to_string(),
        state: "MH".to_string(),
        pincode: "411001".to_string(),
        is_default,
        ..AddressDraft::default()
    }
}

/// Converts the live cart into a checkout request, as the mobile client does.
async fn checkout_from_cart(
    services: &Services,
    user: UserId,
    address_id: AddressId,
) -> CheckoutRequest {
    let summary = services.cart.summarize(user).await.unwrap();
    CheckoutRequest {
        address_id: Some(address_id),
        delivery_address: None,
        payment_method: PaymentMethod::Cod,
        items: summary
            .items
            .iter()
            .map(|item| CheckoutLine {
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.product.price,
                product_name: item.product.name.clone(),
                product_image: item.product.image_url.clone(),
            })
            .collect(),
        total_amount: Some(summary.totals.total_amount),
    }
}

mod checkout_scenarios {
    use super::*;

    #[tokio::test]
    async fn cart_to_order_to_delivery() {
        let s = services();
        let user = UserId::new(1);
        let milk = s.store.insert_product("Milk", Money::from_cents(1_000)).await;
        let bread = s.store.insert_product("Bread", Money::from_cents(500)).await;
        let address = s.addresses.create(user, draft("Home", true)).await.unwrap();

        s.cart.add_item(user, milk.id, 1).await.unwrap();
        s.cart.add_item(user, milk.id, 1).await.unwrap();
        s.cart.add_item(user, bread.id, 1).await.unwrap();

        let request = checkout_from_cart(&s, user, address.id).await;
        let created = s.checkout.place_order(user, request).await.unwrap();
        s.cart.clear(user).await.unwrap();

        let order = &created.order;
        assert_eq!(order.subtotal, Money::from_cents(2_500));
        assert_eq!(
            order.total_amount,
            order.subtotal + order.delivery_fee - order.discount_amount
        );
        assert_eq!(created.lines.len(), 2);
        assert_eq!(s.store.order_row_counts().await, (1, 2, 1));

        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Packed,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            s.timeline.advance(order.id, status, None).await.unwrap();
        }

        let events = s.queries.track(user, order.id).await.unwrap();
        assert_eq!(events.first().unwrap().status, OrderStatus::Placed);
        assert_eq!(events.last().unwrap().status, OrderStatus::Delivered);
        assert!(events.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        assert!(s.cart.summarize(user).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn order_lines_survive_catalog_changes() {
        let s = services();
        let user = UserId::new(1);
        let milk = s.store.insert_product("Milk", Money::from_cents(1_000)).await;
        let address = s.addresses.create(user, draft("Home", false)).await.unwrap();
        s.cart.add_item(user, milk.id, 2).await.unwrap();

        let request = checkout_from_cart(&s, user, address.id).await;
        let created = s.checkout.place_order(user, request).await.unwrap();

        s.store
            .set_product_price(milk.id, Money::from_cents(5_000))
            .await;
        s.addresses.delete(user, address.id).await.unwrap();

        let details = s.queries.get_by_id(user, created.order.id).await.unwrap();
        assert_eq!(details.items[0].unit_price, Money::from_cents(1_000));
        assert_eq!(details.items[0].total_price, Money::from_cents(2_000));
        assert_eq!(details.order.address_id, None);
        assert_eq!(details.order.delivery_address, created.order.delivery_address);
    }

    #[tokio::test]
    async fn failure_mid_checkout_leaves_no_rows() {
        let s = services();
        let user = UserId::new(1);
        let milk = s.store.insert_product("Milk", Money::from_cents(1_000)).await;
        let address = s.addresses.create(user, draft("Home", false)).await.unwrap();
        s.cart.add_item(user, milk.id, 2).await.unwrap();
        let request = checkout_from_cart(&s, user, address.id).await;

        s.store.fail_next_status_insert();
        let err = s
            .checkout
            .place_order(user, request.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Persistence(_)));
        assert_eq!(s.store.order_row_counts().await, (0, 0, 0));
        assert!(s.queries.list_for_user(user).await.unwrap().is_empty());

        // The cart is untouched, so the client can simply retry.
        s.checkout.place_order(user, request).await.unwrap();
        assert_eq!(s.store.order_row_counts().await, (1, 1, 1));
    }

    #[tokio::test]
    async fn cancelled_order_accepts_no_further_status() {
        let s = services();
        let user = UserId::new(1);
        let milk = s.store.insert_product("Milk", Money::from_cents(1_000)).await;
        let address = s.addresses.create(user, draft("Home", false)).await.unwrap();
        s.cart.add_item(user, milk.id, 1).await.unwrap();
        let request = checkout_from_cart(&s, user, address.id).await;
        let order_id = s.checkout.place_order(user, request).await.unwrap().order.id;

        let order = s
            .timeline
            .cancel(user, order_id, Some("wrong address".into()))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.cancellation_reason.as_deref(), Some("wrong address"));

        let err = s
            .timeline
            .advance(order_id, OrderStatus::Confirmed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_are_all_counted() {
        let s = Arc::new(services());
        let user = UserId::new(1);
        let milk = s.store.insert_product("Milk", Money::from_cents(1_000)).await;

        let tasks = (0..50).map(|_| {
            let s = Arc::clone(&s);
            tokio::spawn(async move { s.cart.add_item(user, milk.id, 2).await })
        });
        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let summary = s.cart.summarize(user).await.unwrap();
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.item_count, 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_set_default_keeps_one_default() {
        let s = Arc::new(services());
        let user = UserId::new(1);
        let mut ids = Vec::new();
        for i in 0..8 {
            let address = s
                .addresses
                .create(user, draft(&format!("A{i}"), i == 0))
                .await
                .unwrap();
            ids.push(address.id);
        }

        let tasks = ids.iter().cycle().take(40).map(|id| {
            let s = Arc::clone(&s);
            let id = *id;
            tokio::spawn(async move { s.addresses.set_default(user, id).await })
        });
        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let defaults = s
            .addresses
            .list(user)
            .await
            .unwrap()
            .into_iter()
            .filter(|a| a.is_default)
            .count();
        assert_eq!(defaults, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checkouts_get_distinct_numbers() {
        let s = Arc::new(services());
        let user = UserId::new(1);
        let milk = s.store.insert_product("Milk", Money::from_cents(1_000)).await;
        let address = s.addresses.create(user, draft("Home", true)).await.unwrap();
        s.cart.add_item(user, milk.id, 1).await.unwrap();
        let request = checkout_from_cart(&s, user, address.id).await;

        let tasks = (0..20).map(|_| {
            let s = Arc::clone(&s);
            let request = request.clone();
            tokio::spawn(async move { s.checkout.place_order(user, request).await })
        });
        let mut numbers: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap().order.order_number)
            .collect();
        numbers.sort();
        numbers.dedup();

        assert_eq!(numbers.len(), 20);
        assert_eq!(s.queries.list_for_user(user).await.unwrap().len(), 20);
    }
}
