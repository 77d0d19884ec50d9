use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction, postgres::PgPoolOptions};

use crate::{
    AddressId, CartLineId, Money, OrderId, OrderStatus, ProductId, Result, StatusEventId,
    StoreError, UserId,
    model::{
        Address, AddressFields, CartLine, CartLineDetail, CartUpsert, CreatedOrder, NewOrder,
        Order, OrderLine, Product, StatusChange, StatusEvent,
    },
    store::{AddressStore, CartStore, CatalogStore, OrderStore},
};

const ADDRESS_COLUMNS: &str = "id, user_id, full_name, phone, line1, line2, city, state, \
     pincode, address_type, is_default, created_at";

const CART_COLUMNS: &str = "id, user_id, product_id, quantity, added_at, updated_at";

const ORDER_COLUMNS: &str = "id, order_number, user_id, address_id, delivery_address, \
     payment_method, subtotal, delivery_fee, discount_amount, total_amount, status, \
     order_date, cancelled_at, cancellation_reason";

const ORDER_LINE_COLUMNS: &str = "id, order_id, product_id, product_name, product_image, \
     quantity, unit_price, total_price";

const EVENT_COLUMNS: &str = "id, order_id, status, remarks, created_at";

#[derive(FromRow)]
struct AddressRow {
    id: i64,
    user_id: i64,
    full_name: String,
    phone: String,
    line1: String,
    line2: Option<String>,
    city: String,
    state: String,
    pincode: String,
    address_type: String,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<AddressRow> for Address {
    type Error = StoreError;

    fn try_from(row: AddressRow) -> Result<Self> {
        Ok(Address {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            full_name: row.full_name,
            phone: row.phone,
            line1: row.line1,
            line2: row.line2,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            address_type: row.address_type.parse()?,
            is_default: row.is_default,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    image_url: Option<String>,
    price: Decimal,
    is_available: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::new(row.id),
            name: row.name,
            image_url: row.image_url,
            price: Money::from(row.price),
            is_available: row.is_available,
        }
    }
}

#[derive(FromRow)]
struct CartLineRow {
    id: i64,
    user_id: i64,
    product_id: i64,
    quantity: i32,
    added_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = StoreError;

    fn try_from(row: CartLineRow) -> Result<Self> {
        Ok(CartLine {
            id: CartLineId::new(row.id),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            quantity: stored_quantity(row.quantity)?,
            added_at: row.added_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CartUpsertRow {
    #[sqlx(flatten)]
    line: CartLineRow,
    inserted: bool,
}

#[derive(FromRow)]
struct CartDetailRow {
    #[sqlx(flatten)]
    line: CartLineRow,
    product_name: String,
    product_image_url: Option<String>,
    product_price: Decimal,
    product_is_available: bool,
}

#[derive(FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    user_id: i64,
    address_id: Option<i64>,
    delivery_address: String,
    payment_method: String,
    subtotal: Decimal,
    delivery_fee: Decimal,
    discount_amount: Decimal,
    total_amount: Decimal,
    status: String,
    order_date: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self> {
        Ok(Order {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            user_id: UserId::new(row.user_id),
            address_id: row.address_id.map(AddressId::new),
            delivery_address: row.delivery_address,
            payment_method: row.payment_method.parse()?,
            subtotal: Money::from(row.subtotal),
            delivery_fee: Money::from(row.delivery_fee),
            discount_amount: Money::from(row.discount_amount),
            total_amount: Money::from(row.total_amount),
            status: row.status.parse()?,
            order_date: row.order_date,
            cancelled_at: row.cancelled_at,
            cancellation_reason: row.cancellation_reason,
        })
    }
}

#[derive(FromRow)]
struct OrderLineRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    product_name: String,
    product_image: Option<String>,
    quantity: i32,
    unit_price: Decimal,
    total_price: Decimal,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = StoreError;

    fn try_from(row: OrderLineRow) -> Result<Self> {
        Ok(OrderLine {
            id: row.id,
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            product_image: row.product_image,
            quantity: stored_quantity(row.quantity)?,
            unit_price: Money::from(row.unit_price),
            total_price: Money::from(row.total_price),
        })
    }
}

#[derive(FromRow)]
struct EventRow {
    id: i64,
    order_id: i64,
    status: String,
    remarks: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for StatusEvent {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self> {
        Ok(StatusEvent {
            id: StatusEventId::new(row.id),
            order_id: OrderId::new(row.order_id),
            status: row.status.parse()?,
            remarks: row.remarks,
            created_at: row.created_at,
        })
    }
}

fn stored_quantity(quantity: i32) -> Result<u32> {
    u32::try_from(quantity).map_err(|_| StoreError::Corrupt(format!("quantity {quantity}")))
}

fn bind_quantity(quantity: u32) -> Result<i32> {
    i32::try_from(quantity).map_err(|_| StoreError::OutOfRange(format!("quantity {quantity}")))
}

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool of at most `max_connections` to `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Serializes default-address changes for one user until the transaction ends.
    async fn lock_user_addresses(
        tx: &mut Transaction<'_, Postgres>,
        user_id: UserId,
    ) -> Result<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(user_id.get())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn clear_default(tx: &mut Transaction<'_, Postgres>, user_id: UserId) -> Result<()> {
        sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND is_default")
            .bind(user_id.get())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AddressStore for PostgresStore {
    #[tracing::instrument(skip(self))]
    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 \
             ORDER BY is_default DESC, id ASC"
        );
        let rows: Vec<AddressRow> = sqlx::query_as(&sql)
            .bind(user_id.get())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Address::try_from).collect()
    }

    async fn get_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Option<Address>> {
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 AND user_id = $2");
        let row: Option<AddressRow> = sqlx::query_as(&sql)
            .bind(address_id.get())
            .bind(user_id.get())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Address::try_from).transpose()
    }

    #[tracing::instrument(skip(self, fields))]
    async fn insert_address(
        &self,
        user_id: UserId,
        fields: AddressFields,
        is_default: bool,
    ) -> Result<Address> {
        let mut tx = self.pool.begin().await?;
        if is_default {
            Self::lock_user_addresses(&mut tx, user_id).await?;
            Self::clear_default(&mut tx, user_id).await?;
        }

        let sql = format!(
            "INSERT INTO addresses (user_id, full_name, phone, line1, line2, city, state, \
             pincode, address_type, is_default) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ADDRESS_COLUMNS}"
        );
        let row: AddressRow = sqlx::query_as(&sql)
            .bind(user_id.get())
            .bind(&fields.full_name)
            .bind(&fields.phone)
            .bind(&fields.line1)
            .bind(&fields.line2)
            .bind(&fields.city)
            .bind(&fields.state)
            .bind(&fields.pincode)
            .bind(fields.address_type.as_str())
            .bind(is_default)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StoreError::from_write(e, "address"))?;

        tx.commit().await?;
        Address::try_from(row)
    }

    #[tracing::instrument(skip(self, fields))]
    async fn update_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
        fields: AddressFields,
        is_default: bool,
    ) -> Result<Option<Address>> {
        let mut tx = self.pool.begin().await?;
        if is_default {
            Self::lock_user_addresses(&mut tx, user_id).await?;
            // Other addresses only; the target row is rewritten below.
            sqlx::query(
                "UPDATE addresses SET is_default = FALSE \
                 WHERE user_id = $1 AND is_default AND id <> $2",
            )
            .bind(user_id.get())
            .bind(address_id.get())
            .execute(&mut *tx)
            .await?;
        }

        let sql = format!(
            "UPDATE addresses SET full_name = $3, phone = $4, line1 = $5, line2 = $6, \
             city = $7, state = $8, pincode = $9, address_type = $10, is_default = $11 \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {ADDRESS_COLUMNS}"
        );
        let row: Option<AddressRow> = sqlx::query_as(&sql)
            .bind(address_id.get())
            .bind(user_id.get())
            .bind(&fields.full_name)
            .bind(&fields.phone)
            .bind(&fields.line1)
            .bind(&fields.line2)
            .bind(&fields.city)
            .bind(&fields.state)
            .bind(&fields.pincode)
            .bind(fields.address_type.as_str())
            .bind(is_default)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::from_write(e, "address"))?;

        let Some(row) = row else {
            // Not owned: roll back so no other default was cleared.
            tx.rollback().await?;
            return Ok(None);
        };
        tx.commit().await?;
        Address::try_from(row).map(Some)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_address(&self, user_id: UserId, address_id: AddressId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(address_id.get())
            .bind(user_id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn set_default_address(&self, user_id: UserId, address_id: AddressId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        Self::lock_user_addresses(&mut tx, user_id).await?;

        let owned: Option<i64> =
            sqlx::query_scalar("SELECT id FROM addresses WHERE id = $1 AND user_id = $2")
                .bind(address_id.get())
                .bind(user_id.get())
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        Self::clear_default(&mut tx, user_id).await?;
        sqlx::query("UPDATE addresses SET is_default = TRUE WHERE id = $1")
            .bind(address_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::from_write(e, "address"))?;

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, name, image_url, price, is_available FROM products WHERE id = $1",
        )
        .bind(product_id.get())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    #[tracing::instrument(skip(self))]
    async fn upsert_cart_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartUpsert> {
        // xmax is zero only for a freshly inserted tuple.
        let sql = format!(
            "INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, product_id) DO UPDATE \
             SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW() \
             RETURNING {CART_COLUMNS}, (xmax = 0) AS inserted"
        );
        let row: CartUpsertRow = sqlx::query_as(&sql)
            .bind(user_id.get())
            .bind(product_id.get())
            .bind(bind_quantity(quantity)?)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::from_write(e, "product"))?;

        Ok(CartUpsert {
            line: CartLine::try_from(row.line)?,
            created: row.inserted,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn set_cart_quantity(
        &self,
        user_id: UserId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<Option<CartLine>> {
        let sql = format!(
            "UPDATE cart_items SET quantity = $3, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING {CART_COLUMNS}"
        );
        let row: Option<CartLineRow> = sqlx::query_as(&sql)
            .bind(line_id.get())
            .bind(user_id.get())
            .bind(bind_quantity(quantity)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::from_write(e, "cart line"))?;
        row.map(CartLine::try_from).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn remove_cart_line(&self, user_id: UserId, line_id: CartLineId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(line_id.get())
            .bind(user_id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn clear_cart(&self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn cart_details(&self, user_id: UserId) -> Result<Vec<CartLineDetail>> {
        let rows: Vec<CartDetailRow> = sqlx::query_as(
            "SELECT c.id, c.user_id, c.product_id, c.quantity, c.added_at, c.updated_at, \
                    p.name AS product_name, p.image_url AS product_image_url, \
                    p.price AS product_price, p.is_available AS product_is_available \
             FROM cart_items c JOIN products p ON p.id = c.product_id \
             WHERE c.user_id = $1 \
             ORDER BY c.added_at ASC, c.id ASC",
        )
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let product = Product {
                    id: ProductId::new(row.line.product_id),
                    name: row.product_name,
                    image_url: row.product_image_url,
                    price: Money::from(row.product_price),
                    is_available: row.product_is_available,
                };
                Ok(CartLineDetail {
                    line: CartLine::try_from(row.line)?,
                    product,
                })
            })
            .collect()
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[tracing::instrument(
        skip(self, new),
        fields(order_number = %new.order_number, user_id = %new.user_id)
    )]
    async fn create_order(&self, new: NewOrder) -> Result<CreatedOrder> {
        // Dropping `tx` on any early return rolls every insert back.
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 AND user_id = $2 FOR SHARE"
        );
        let address: AddressRow = sqlx::query_as(&sql)
            .bind(new.address_id.get())
            .bind(new.user_id.get())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "address",
                id: new.address_id.get(),
            })?;
        let address = Address::try_from(address)?;
        let delivery_address = new
            .delivery_address
            .unwrap_or_else(|| address.formatted());

        let sql = format!(
            "INSERT INTO orders (order_number, user_id, address_id, delivery_address, \
             payment_method, subtotal, delivery_fee, discount_amount, total_amount, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'PLACED') \
             RETURNING {ORDER_COLUMNS}"
        );
        let order: OrderRow = sqlx::query_as(&sql)
            .bind(&new.order_number)
            .bind(new.user_id.get())
            .bind(address.id.get())
            .bind(&delivery_address)
            .bind(new.payment_method.as_str())
            .bind(new.subtotal.amount())
            .bind(new.delivery_fee.amount())
            .bind(new.discount_amount.amount())
            .bind(new.total_amount.amount())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StoreError::from_write(e, "address"))?;
        let order = Order::try_from(order)?;

        let sql = format!(
            "INSERT INTO order_items (order_id, product_id, product_name, product_image, \
             quantity, unit_price, total_price) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ORDER_LINE_COLUMNS}"
        );
        let mut lines = Vec::with_capacity(new.lines.len());
        for line in &new.lines {
            let row: OrderLineRow = sqlx::query_as(&sql)
                .bind(order.id.get())
                .bind(line.product_id.get())
                .bind(&line.product_name)
                .bind(&line.product_image)
                .bind(bind_quantity(line.quantity)?)
                .bind(line.unit_price.amount())
                .bind(line.total_price().amount())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| StoreError::from_write(e, "order"))?;
            lines.push(OrderLine::try_from(row)?);
        }

        let sql = format!(
            "INSERT INTO order_status_history (order_id, status, remarks, created_at) \
             VALUES ($1, 'PLACED', $2, $3) \
             RETURNING {EVENT_COLUMNS}"
        );
        let event: EventRow = sqlx::query_as(&sql)
            .bind(order.id.get())
            .bind(&new.initial_remarks)
            .bind(order.order_date)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StoreError::from_write(e, "order"))?;
        let initial_event = StatusEvent::try_from(event)?;

        tx.commit().await?;
        Ok(CreatedOrder {
            order,
            lines,
            initial_event,
        })
    }

    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY order_date DESC, id DESC"
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(user_id.get())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(order_id.get())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let sql = format!(
            "SELECT {ORDER_LINE_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id ASC"
        );
        let rows: Vec<OrderLineRow> = sqlx::query_as(&sql)
            .bind(order_id.get())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(OrderLine::try_from).collect()
    }

    async fn status_history(&self, order_id: OrderId) -> Result<Vec<StatusEvent>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM order_status_history WHERE order_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        let rows: Vec<EventRow> = sqlx::query_as(&sql)
            .bind(order_id.get())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(StatusEvent::try_from).collect()
    }

    async fn latest_status_event(&self, order_id: OrderId) -> Result<Option<StatusEvent>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM order_status_history WHERE order_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        let row: Option<EventRow> = sqlx::query_as(&sql)
            .bind(order_id.get())
            .fetch_optional(&self.pool)
            .await?;
        row.map(StatusEvent::try_from).transpose()
    }

    #[tracing::instrument(skip(self, change), fields(status = %change.status))]
    async fn append_status(
        &self,
        order_id: OrderId,
        change: StatusChange,
    ) -> Result<(Order, StatusEvent)> {
        let mut tx = self.pool.begin().await?;

        // The row lock makes the check below and the append one step.
        let current: String =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id.get())
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::NotFound {
                    entity: "order",
                    id: order_id.get(),
                })?;
        let current: OrderStatus = current.parse()?;
        if !change.allowed_from.contains(&current) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: change.status,
            });
        }

        let sql = format!(
            "INSERT INTO order_status_history (order_id, status, remarks, created_at) \
             VALUES ($1, $2, $3, GREATEST(clock_timestamp(), \
                 (SELECT MAX(created_at) FROM order_status_history WHERE order_id = $1))) \
             RETURNING {EVENT_COLUMNS}"
        );
        let event: EventRow = sqlx::query_as(&sql)
            .bind(order_id.get())
            .bind(change.status.as_str())
            .bind(&change.remarks)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StoreError::from_write(e, "order"))?;
        let event = StatusEvent::try_from(event)?;

        let order: OrderRow = if change.status == OrderStatus::Cancelled {
            let sql = format!(
                "UPDATE orders SET status = $2, cancelled_at = $3, cancellation_reason = $4 \
                 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
            );
            sqlx::query_as(&sql)
                .bind(order_id.get())
                .bind(change.status.as_str())
                .bind(event.created_at)
                .bind(&change.cancellation_reason)
                .fetch_one(&mut *tx)
                .await?
        } else {
            let sql =
                format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}");
            sqlx::query_as(&sql)
                .bind(order_id.get())
                .bind(change.status.as_str())
                .fetch_one(&mut *tx)
                .await?
        };
        let order = Order::try_from(order)?;

        tx.commit().await?;
        Ok((order, event))
    }
}
