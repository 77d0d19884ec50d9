//! Checkout, order history and tracking.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use common::OrderId;
use domain::{CheckoutRequest, OrderDetails};
use serde::{Deserialize, Serialize};
use store::{Order, StatusEvent, Store};

use super::{Data, Done, data, done, list as list_body};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub order_number: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// POST /orders/create
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.0.user_id))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Done<OrderPlaced>>), ApiError> {
    let created = state.checkout.place_order(user.0.user_id, req).await?;
    Ok((
        StatusCode::CREATED,
        done(
            "Order placed",
            OrderPlaced {
                order_id: created.order.id,
                order_number: created.order.order_number,
            },
        ),
    ))
}

/// GET /orders: newest first.
#[tracing::instrument(skip(state, user), fields(user_id = %user.0.user_id))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Json<Data<Vec<Order>>>, ApiError> {
    Ok(list_body(state.orders.list_for_user(user.0.user_id).await?))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state, user), fields(user_id = %user.0.user_id))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    ApiPath(order_id): ApiPath<OrderId>,
) -> Result<Json<Data<OrderDetails>>, ApiError> {
    Ok(data(state.orders.get_by_id(user.0.user_id, order_id).await?))
}

/// GET /orders/{id}/track
#[tracing::instrument(skip(state, user), fields(user_id = %user.0.user_id))]
pub async fn track<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    ApiPath(order_id): ApiPath<OrderId>,
) -> Result<Json<Data<Vec<StatusEvent>>>, ApiError> {
    Ok(data(state.orders.track(user.0.user_id, order_id).await?))
}

/// POST /orders/{id}/cancel: the `{"reason": ...}` body is optional.
#[tracing::instrument(skip(state, user, body), fields(user_id = %user.0.user_id))]
pub async fn cancel<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    ApiPath(order_id): ApiPath<OrderId>,
    body: Bytes,
) -> Result<Json<Data<Order>>, ApiError> {
    let req: CancelRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CancelRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };
    let reason = req.reason;
    let order = state
        .timeline
        .cancel(user.0.user_id, order_id, reason)
        .await?;
    Ok(data(order))
}
