//! Operator endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::{OrderId, OrderStatus};
use serde::Deserialize;
use store::{StatusEvent, Store};

use super::{Data, data};
use crate::auth::OperatorUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
    pub remarks: Option<String>,
}

/// POST /admin/orders/{id}/status: appends the next timeline entry.
#[tracing::instrument(skip(state, operator), fields(operator_id = %operator.0.user_id))]
pub async fn update_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    operator: OperatorUser,
    ApiPath(order_id): ApiPath<OrderId>,
    ApiJson(req): ApiJson<StatusUpdateRequest>,
) -> Result<Json<Data<StatusEvent>>, ApiError> {
    let (_, event) = state
        .timeline
        .advance(order_id, req.status, req.remarks)
        .await?;
    Ok(data(event))
}
