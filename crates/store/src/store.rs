use async_trait::async_trait;
use common::{AddressId, CartLineId, OrderId, ProductId, UserId};

use crate::model::{
    Address, AddressFields, CartLine, CartLineDetail, CartUpsert, CreatedOrder, NewOrder, Order,
    OrderLine, Product, StatusChange, StatusEvent,
};
use crate::Result;

/// Address persistence with the single-default invariant.
///
/// For a fixed user at most one address has `is_default` set, before and
/// after every call, including under concurrent calls for the same user.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Lists a user's addresses, default first, then by id.
    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>>;

    /// Fetches an address only if it belongs to `user_id`.
    async fn get_address(&self, user_id: UserId, address_id: AddressId)
    -> Result<Option<Address>>;

    /// Inserts an address. When `is_default` is set, existing defaults are
    /// cleared in the same atomic unit.
    async fn insert_address(
        &self,
        user_id: UserId,
        fields: AddressFields,
        is_default: bool,
    ) -> Result<Address>;

    /// Replaces an owned address's fields. Returns `None` if not owned.
    async fn update_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
        fields: AddressFields,
        is_default: bool,
    ) -> Result<Option<Address>>;

    /// Deletes an owned address. Returns false if not owned.
    async fn delete_address(&self, user_id: UserId, address_id: AddressId) -> Result<bool>;

    /// Atomically makes `address_id` the user's only default.
    /// Returns false if the address is not owned by the user.
    async fn set_default_address(&self, user_id: UserId, address_id: AddressId) -> Result<bool>;
}

/// Read access to the product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>>;
}

/// Cart persistence with additive merge semantics.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Adds `quantity` to the user's line for `product_id`, creating it if
    /// absent. Concurrent calls for the same pair are all reflected.
    async fn upsert_cart_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartUpsert>;

    /// Replaces an owned line's quantity. Returns `None` if not owned.
    async fn set_cart_quantity(
        &self,
        user_id: UserId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<Option<CartLine>>;

    /// Removes an owned line. Returns false if not owned.
    async fn remove_cart_line(&self, user_id: UserId, line_id: CartLineId) -> Result<bool>;

    /// Removes every line of the user's cart, returning how many were removed.
    async fn clear_cart(&self, user_id: UserId) -> Result<u64>;

    /// Lists the user's lines joined to their live products, oldest first.
    async fn cart_details(&self, user_id: UserId) -> Result<Vec<CartLineDetail>>;
}

/// Order, order line and status timeline persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Writes the order header, every line and the initial `PLACED` event as
    /// one transaction.
    ///
    /// Fails with `NotFound { entity: "address" }` if the address is not owned
    /// by the order's user, and with `Conflict` on [`crate::ORDER_NUMBER_CONSTRAINT`]
    /// if the order number is taken. On any failure nothing is persisted.
    async fn create_order(&self, order: NewOrder) -> Result<CreatedOrder>;

    /// Lists a user's orders, newest first.
    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>>;

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>>;

    /// Returns the order's timeline in append order.
    async fn status_history(&self, order_id: OrderId) -> Result<Vec<StatusEvent>>;

    /// Returns the most recently appended event.
    async fn latest_status_event(&self, order_id: OrderId) -> Result<Option<StatusEvent>>;

    /// Appends a status event and updates the order's status in the same
    /// transaction, provided the current status is in `change.allowed_from`.
    async fn append_status(&self, order_id: OrderId, change: StatusChange)
    -> Result<(Order, StatusEvent)>;
}

/// Everything the services need from one backing store.
pub trait Store: AddressStore + CartStore + CatalogStore + OrderStore + Clone + 'static {}

impl<T> Store for T where
    T: AddressStore + CartStore + CatalogStore + OrderStore + Clone + 'static
{
}
