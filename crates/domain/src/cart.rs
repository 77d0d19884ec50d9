//! Per-user shopping carts with additive merge.

use chrono::{DateTime, Utc};
use common::{CartLineId, Money, ProductId, UserId};
use serde::Serialize;
use store::{CartLine, CartStore, CatalogStore, Product};

use crate::error::{DomainError, Result};
use crate::pricing::{Charges, Totals, subtotal};

/// A cart line joined to its live product and priced at today's price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub product: Product,
    pub line_total: Money,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    /// Sum of quantities, not of lines.
    pub item_count: u64,
    #[serde(flatten)]
    pub totals: Totals,
}

/// Outcome of [`CartService::add_item`].
#[derive(Debug, Clone)]
pub struct AddedItem {
    pub line: CartLine,
    /// False when the quantity was merged into an existing line.
    pub created: bool,
}

#[derive(Clone)]
pub struct CartService<S> {
    store: S,
    charges: Charges,
}

impl<S: CartStore + CatalogStore> CartService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            charges: Charges::default(),
        }
    }

    /// Adds `quantity` of a product, merging into an existing line if there
    /// is one. Concurrent adds for the same product are all counted.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<AddedItem> {
        if quantity == 0 {
            return Err(DomainError::validation(
                "Product ID and positive quantity required",
            ));
        }
        if self.store.get_product(product_id).await?.is_none() {
            return Err(DomainError::validation(format!(
                "Unknown product {product_id}"
            )));
        }

        let upsert = self
            .store
            .upsert_cart_line(user_id, product_id, quantity)
            .await?;
        metrics::counter!("cart_items_added_total").increment(u64::from(quantity));
        Ok(AddedItem {
            line: upsert.line,
            created: upsert.created,
        })
    }

    /// Replaces the quantity of an owned line. Zero is rejected, not treated
    /// as removal.
    #[tracing::instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<CartLine> {
        if quantity == 0 {
            return Err(DomainError::validation("Valid quantity required"));
        }
        self.store
            .set_cart_quantity(user_id, line_id, quantity)
            .await?
            .ok_or_else(|| DomainError::not_found("cart item", line_id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, user_id: UserId, line_id: CartLineId) -> Result<()> {
        if !self.store.remove_cart_line(user_id, line_id).await? {
            return Err(DomainError::not_found("cart item", line_id));
        }
        Ok(())
    }

    /// Empties the cart. Clearing an empty cart succeeds.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<()> {
        let removed = self.store.clear_cart(user_id).await?;
        tracing::debug!(removed, "cart cleared");
        Ok(())
    }

    /// Prices the cart against live product prices.
    #[tracing::instrument(skip(self))]
    pub async fn summarize(&self, user_id: UserId) -> Result<CartSummary> {
        let details = self.store.cart_details(user_id).await?;

        let items: Vec<CartItem> = details
            .into_iter()
            .map(|detail| CartItem {
                id: detail.line.id,
                product_id: detail.line.product_id,
                quantity: detail.line.quantity,
                added_at: detail.line.added_at,
                updated_at: detail.line.updated_at,
                line_total: detail.product.price.multiply(detail.line.quantity),
                product: detail.product,
            })
            .collect();

        let item_count = items.iter().map(|i| u64::from(i.quantity)).sum();
        let subtotal = subtotal(items.iter().map(|i| (i.product.price, i.quantity)));

        Ok(CartSummary {
            items,
            item_count,
            totals: self.charges.apply(subtotal),
        })
    }
}
