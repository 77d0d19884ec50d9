use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    AddressId, CartLineId, Money, OrderId, OrderStatus, ProductId, Result, StatusEventId,
    StoreError, UserId,
    error::ORDER_NUMBER_CONSTRAINT,
    model::{
        Address, AddressFields, CartLine, CartLineDetail, CartUpsert, CreatedOrder, NewOrder,
        Order, OrderLine, Product, StatusChange, StatusEvent,
    },
    store::{AddressStore, CartStore, CatalogStore, OrderStore},
};

#[derive(Default)]
struct Tables {
    last_id: i64,
    products: BTreeMap<ProductId, Product>,
    addresses: BTreeMap<AddressId, Address>,
    cart: BTreeMap<CartLineId, CartLine>,
    orders: BTreeMap<OrderId, Order>,
    order_lines: Vec<OrderLine>,
    events: Vec<StatusEvent>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    /// Wall-clock time, clamped so an order's timeline never goes backwards.
    fn event_timestamp(&self, order_id: OrderId) -> DateTime<Utc> {
        let now = Utc::now();
        self.events
            .iter()
            .filter(|e| e.order_id == order_id)
            .map(|e| e.created_at)
            .max()
            .map_or(now, |last| last.max(now))
    }

    fn clear_defaults(&mut self, user_id: UserId) {
        for address in self.addresses.values_mut() {
            if address.user_id == user_id {
                address.is_default = false;
            }
        }
    }
}

/// In-memory store implementation for tests and local runs.
///
/// All tables sit behind one lock and every write takes it exactly once, so
/// each trait method is trivially atomic. Rows are staged before the lock's
/// tables are touched, which gives failed order creations the same
/// all-or-nothing outcome as the PostgreSQL transaction.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    fail_status_insert: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product to the catalog.
    pub async fn insert_product(&self, name: impl Into<String>, price: Money) -> Product {
        let mut tables = self.tables.write().await;
        let product = Product {
            id: ProductId::new(tables.next_id()),
            name: name.into(),
            image_url: None,
            price,
            is_available: true,
        };
        tables.products.insert(product.id, product.clone());
        product
    }

    /// Changes a catalog price, as the catalog owner would.
    pub async fn set_product_price(&self, product_id: ProductId, price: Money) -> bool {
        let mut tables = self.tables.write().await;
        match tables.products.get_mut(&product_id) {
            Some(product) => {
                product.price = price;
                true
            }
            None => false,
        }
    }

    /// Makes the next order creation fail after its lines are staged but
    /// before its initial status event is written.
    pub fn fail_next_status_insert(&self) {
        self.fail_status_insert.store(true, Ordering::SeqCst);
    }

    /// Returns (orders, order lines, status events) row counts.
    pub async fn order_row_counts(&self) -> (usize, usize, usize) {
        let tables = self.tables.read().await;
        (
            tables.orders.len(),
            tables.order_lines.len(),
            tables.events.len(),
        )
    }
}

#[async_trait]
impl AddressStore for InMemoryStore {
    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>> {
        let tables = self.tables.read().await;
        let mut addresses: Vec<_> = tables
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        addresses.sort_by_key(|a| (!a.is_default, a.id));
        Ok(addresses)
    }

    async fn get_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Option<Address>> {
        let tables = self.tables.read().await;
        Ok(tables
            .addresses
            .get(&address_id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    async fn insert_address(
        &self,
        user_id: UserId,
        fields: AddressFields,
        is_default: bool,
    ) -> Result<Address> {
        let mut tables = self.tables.write().await;
        if is_default {
            tables.clear_defaults(user_id);
        }
        let address = Address {
            id: AddressId::new(tables.next_id()),
            user_id,
            full_name: fields.full_name,
            phone: fields.phone,
            line1: fields.line1,
            line2: fields.line2,
            city: fields.city,
            state: fields.state,
            pincode: fields.pincode,
            address_type: fields.address_type,
            is_default,
            created_at: Utc::now(),
        };
        tables.addresses.insert(address.id, address.clone());
        Ok(address)
    }

    async fn update_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
        fields: AddressFields,
        is_default: bool,
    ) -> Result<Option<Address>> {
        let mut tables = self.tables.write().await;
        if !tables
            .addresses
            .get(&address_id)
            .is_some_and(|a| a.user_id == user_id)
        {
            return Ok(None);
        }
        if is_default {
            tables.clear_defaults(user_id);
        }
        let Some(address) = tables.addresses.get_mut(&address_id) else {
            return Ok(None);
        };
        address.full_name = fields.full_name;
        address.phone = fields.phone;
        address.line1 = fields.line1;
        address.line2 = fields.line2;
        address.city = fields.city;
        address.state = fields.state;
        address.pincode = fields.pincode;
        address.address_type = fields.address_type;
        address.is_default = is_default;
        Ok(Some(address.clone()))
    }

    async fn delete_address(&self, user_id: UserId, address_id: AddressId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables
            .addresses
            .get(&address_id)
            .is_some_and(|a| a.user_id == user_id)
        {
            return Ok(false);
        }
        tables.addresses.remove(&address_id);
        for order in tables.orders.values_mut() {
            if order.address_id == Some(address_id) {
                order.address_id = None;
            }
        }
        Ok(true)
    }

    async fn set_default_address(&self, user_id: UserId, address_id: AddressId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables
            .addresses
            .get(&address_id)
            .is_some_and(|a| a.user_id == user_id)
        {
            return Ok(false);
        }
        tables.clear_defaults(user_id);
        if let Some(address) = tables.addresses.get_mut(&address_id) {
            address.is_default = true;
        }
        Ok(true)
    }
}

/// Cart quantities live in an `INTEGER` column.
fn ensure_storable_quantity(quantity: u32) -> Result<()> {
    i32::try_from(quantity)
        .map(|_| ())
        .map_err(|_| StoreError::OutOfRange("cart quantity".to_string()))
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products.get(&product_id).cloned())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn upsert_cart_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartUpsert> {
        ensure_storable_quantity(quantity)?;
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&product_id) {
            return Err(StoreError::InvalidReference { entity: "product" });
        }

        let now = Utc::now();
        if let Some(line) = tables
            .cart
            .values_mut()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
        {
            let merged = line
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| StoreError::OutOfRange("cart quantity".to_string()))?;
            ensure_storable_quantity(merged)?;
            line.quantity = merged;
            line.updated_at = now;
            return Ok(CartUpsert {
                line: line.clone(),
                created: false,
            });
        }

        let line = CartLine {
            id: CartLineId::new(tables.next_id()),
            user_id,
            product_id,
            quantity,
            added_at: now,
            updated_at: now,
        };
        tables.cart.insert(line.id, line.clone());
        Ok(CartUpsert {
            line,
            created: true,
        })
    }

    async fn set_cart_quantity(
        &self,
        user_id: UserId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<Option<CartLine>> {
        ensure_storable_quantity(quantity)?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .cart
            .get_mut(&line_id)
            .filter(|l| l.user_id == user_id)
            .map(|line| {
                line.quantity = quantity;
                line.updated_at = Utc::now();
                line.clone()
            }))
    }

    async fn remove_cart_line(&self, user_id: UserId, line_id: CartLineId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables
            .cart
            .get(&line_id)
            .is_some_and(|l| l.user_id == user_id)
        {
            tables.cart.remove(&line_id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.cart.len();
        tables.cart.retain(|_, l| l.user_id != user_id);
        Ok((before - tables.cart.len()) as u64)
    }

    async fn cart_details(&self, user_id: UserId) -> Result<Vec<CartLineDetail>> {
        let tables = self.tables.read().await;
        Ok(tables
            .cart
            .values()
            .filter(|l| l.user_id == user_id)
            .filter_map(|line| {
                tables.products.get(&line.product_id).map(|product| CartLineDetail {
                    line: line.clone(),
                    product: product.clone(),
                })
            })
            .collect())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_order(&self, new: NewOrder) -> Result<CreatedOrder> {
        let mut tables = self.tables.write().await;

        let address = tables
            .addresses
            .get(&new.address_id)
            .filter(|a| a.user_id == new.user_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "address",
                id: new.address_id.get(),
            })?;

        if tables
            .orders
            .values()
            .any(|o| o.order_number == new.order_number)
        {
            return Err(StoreError::Conflict {
                constraint: ORDER_NUMBER_CONSTRAINT.to_string(),
            });
        }

        // Stage every row first; tables are only touched once all succeed.
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(tables.next_id()),
            order_number: new.order_number,
            user_id: new.user_id,
            address_id: Some(address.id),
            delivery_address: new.delivery_address.unwrap_or_else(|| address.formatted()),
            payment_method: new.payment_method,
            subtotal: new.subtotal,
            delivery_fee: new.delivery_fee,
            discount_amount: new.discount_amount,
            total_amount: new.total_amount,
            status: OrderStatus::Placed,
            order_date: now,
            cancelled_at: None,
            cancellation_reason: None,
        };

        let mut lines = Vec::with_capacity(new.lines.len());
        for line in new.lines {
            lines.push(OrderLine {
                id: tables.next_id(),
                order_id: order.id,
                product_id: line.product_id,
                total_price: line.total_price(),
                product_name: line.product_name,
                product_image: line.product_image,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        if self.fail_status_insert.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::Protocol(
                "injected failure before status event insert".to_string(),
            )));
        }

        let initial_event = StatusEvent {
            id: StatusEventId::new(tables.next_id()),
            order_id: order.id,
            status: OrderStatus::Placed,
            remarks: Some(new.initial_remarks),
            created_at: now,
        };

        tables.orders.insert(order.id, order.clone());
        tables.order_lines.extend(lines.iter().cloned());
        tables.events.push(initial_event.clone());

        Ok(CreatedOrder {
            order,
            lines,
            initial_event,
        })
    }

    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<_> = tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&order_id).cloned())
    }

    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let tables = self.tables.read().await;
        Ok(tables
            .order_lines
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn status_history(&self, order_id: OrderId) -> Result<Vec<StatusEvent>> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn latest_status_event(&self, order_id: OrderId) -> Result<Option<StatusEvent>> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .rev()
            .find(|e| e.order_id == order_id)
            .cloned())
    }

    async fn append_status(
        &self,
        order_id: OrderId,
        change: StatusChange,
    ) -> Result<(Order, StatusEvent)> {
        let mut tables = self.tables.write().await;
        let current = tables
            .orders
            .get(&order_id)
            .map(|o| o.status)
            .ok_or(StoreError::NotFound {
                entity: "order",
                id: order_id.get(),
            })?;

        if !change.allowed_from.contains(&current) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: change.status,
            });
        }

        let created_at = tables.event_timestamp(order_id);
        let event = StatusEvent {
            id: StatusEventId::new(tables.next_id()),
            order_id,
            status: change.status,
            remarks: change.remarks,
            created_at,
        };
        tables.events.push(event.clone());

        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::NotFound {
                entity: "order",
                id: order_id.get(),
            })?;
        order.status = change.status;
        if change.status == OrderStatus::Cancelled {
            order.cancelled_at = Some(created_at);
            order.cancellation_reason = change.cancellation_reason;
        }
        Ok((order.clone(), event))
    }
}
