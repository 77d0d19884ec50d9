//! Entity records as they are persisted and returned to callers.

use chrono::{DateTime, Utc};
use common::{
    AddressId, AddressType, CartLineId, Money, OrderId, OrderStatus, PaymentMethod, ProductId,
    StatusEventId, UserId,
};
use serde::Serialize;

/// A saved delivery address. Owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub full_name: String,
    pub phone: String,
    #[serde(rename = "addressLine1")]
    pub line1: String,
    #[serde(rename = "addressLine2")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub address_type: AddressType,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// Renders the address on one line, the form frozen into orders.
    pub fn formatted(&self) -> String {
        let mut text = self.line1.clone();
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.trim().is_empty()) {
            text.push_str(", ");
            text.push_str(line2);
        }
        format!("{text}, {}, {} - {}", self.city, self.state, self.pincode)
    }
}

/// Validated, user-editable address fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFields {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub address_type: AddressType,
}

/// Catalog product, read-only from this system's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub price: Money,
    pub is_available: bool,
}

/// Desired quantity of one product in a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: CartLineId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of an additive cart write.
#[derive(Debug, Clone)]
pub struct CartUpsert {
    pub line: CartLine,
    /// True when a new row was inserted, false when an existing one was merged into.
    pub created: bool,
}

/// A cart line joined to the live product it refers to.
#[derive(Debug, Clone)]
pub struct CartLineDetail {
    pub line: CartLine,
    pub product: Product,
}

/// Immutable record of a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    /// Null once the address has been deleted; the snapshot below survives.
    pub address_id: Option<AddressId>,
    pub delivery_address: String,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

/// Price, name and image of one product at the moment the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
}

/// One entry of an order's append-only status timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub id: StatusEventId,
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to persist an order header, its lines and its first
/// status event in one transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: UserId,
    /// Must resolve to an address owned by `user_id`.
    pub address_id: AddressId,
    /// Snapshot text. When `None` the stored address is rendered instead.
    pub delivery_address: Option<String>,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
    pub lines: Vec<NewOrderLine>,
    pub initial_remarks: String,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
}

impl NewOrderLine {
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// The rows written by a successful order creation.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub initial_event: StatusEvent,
}

/// A guarded status append.
///
/// The store checks the order's current status against `allowed_from` while
/// holding the order row, so two concurrent appends cannot both pass the check.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub remarks: Option<String>,
    pub allowed_from: Vec<OrderStatus>,
    /// Recorded on the order when `status` is `CANCELLED`.
    pub cancellation_reason: Option<String>,
}
