//! Shopping cart.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{CartLineId, ProductId};
use domain::CartSummary;
use serde::{Deserialize, Serialize};
use store::Store;

use super::{Data, Done, NoIds, data, done};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemIds {
    pub cart_item_id: CartLineId,
}

/// GET /cart
#[tracing::instrument(skip(state, user), fields(user_id = %user.0.user_id))]
pub async fn summary<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Json<Data<CartSummary>>, ApiError> {
    Ok(data(state.cart.summarize(user.0.user_id).await?))
}

/// POST /cart/add: 201 for a new line, 200 when merged into an existing one.
#[tracing::instrument(skip(state, user), fields(user_id = %user.0.user_id))]
pub async fn add<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    ApiJson(req): ApiJson<AddItemRequest>,
) -> Result<(StatusCode, Json<Done<CartItemIds>>), ApiError> {
    let added = state
        .cart
        .add_item(user.0.user_id, req.product_id, req.quantity)
        .await?;
    let ids = CartItemIds {
        cart_item_id: added.line.id,
    };
    if added.created {
        Ok((StatusCode::CREATED, done("Product added to cart", ids)))
    } else {
        Ok((StatusCode::OK, done("Cart item quantity updated", ids)))
    }
}

/// PUT /cart/update/{id}
#[tracing::instrument(skip(state, user), fields(user_id = %user.0.user_id))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    ApiPath(line_id): ApiPath<CartLineId>,
    ApiJson(req): ApiJson<UpdateQuantityRequest>,
) -> Result<Json<Done<CartItemIds>>, ApiError> {
    state
        .cart
        .set_quantity(user.0.user_id, line_id, req.quantity)
        .await?;
    Ok(done(
        "Cart item updated",
        CartItemIds {
            cart_item_id: line_id,
        },
    ))
}

/// DELETE /cart/remove/{id}
#[tracing::instrument(skip(state, user), fields(user_id = %user.0.user_id))]
pub async fn remove<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    ApiPath(line_id): ApiPath<CartLineId>,
) -> Result<Json<Done<NoIds>>, ApiError> {
    state.cart.remove(user.0.user_id, line_id).await?;
    Ok(done("Cart item removed", NoIds {}))
}

/// DELETE /cart/clear
#[tracing::instrument(skip(state, user), fields(user_id = %user.0.user_id))]
pub async fn clear<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Json<Done<NoIds>>, ApiError> {
    state.cart.clear(user.0.user_id).await?;
    Ok(done("Cart cleared", NoIds {}))
}
