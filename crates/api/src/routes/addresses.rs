//! Saved delivery addresses.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::AddressId;
use domain::AddressDraft;
use serde::Serialize;
use store::{Address, Store};

use super::{Data, Done, NoIds, data, done, list as list_body};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressIds {
    pub address_id: AddressId,
}

/// GET /addresses: default first.
#[tracing::instrument(skip(state, user), fields(user_id = %user.0.user_id))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Json<Data<Vec<Address>>>, ApiError> {
    let addresses = state.addresses.list(user.0.user_id).await?;
    Ok(list_body(addresses))
}

/// POST /addresses
#[tracing::instrument(skip(state, user, draft), fields(user_id = %user.0.user_id))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    ApiJson(draft): ApiJson<AddressDraft>,
) -> Result<(StatusCode, Json<Done<AddressIds>>), ApiError> {
    let address = state.addresses.create(user.0.user_id, draft).await?;
    Ok((
        StatusCode::CREATED,
        done(
            "Address added",
            AddressIds {
                address_id: address.id,
            },
        ),
    ))
}

/// PUT /addresses/{id}: replaces every field.
#[tracing::instrument(skip(state, user, draft), fields(user_id = %user.0.user_id))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    ApiPath(address_id): ApiPath<AddressId>,
    ApiJson(draft): ApiJson<AddressDraft>,
) -> Result<Json<Data<Address>>, ApiError> {
    let address = state
        .addresses
        .update(user.0.user_id, address_id, draft)
        .await?;
    Ok(data(address))
}

/// DELETE /addresses/{id}
#[tracing::instrument(skip(state, user), fields(user_id = %user.0.user_id))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    ApiPath(address_id): ApiPath<AddressId>,
) -> Result<Json<Done<NoIds>>, ApiError> {
    state.addresses.delete(user.0.user_id, address_id).await?;
    Ok(done("Address deleted", NoIds {}))
}

/// PUT /addresses/{id}/default
#[tracing::instrument(skip(state, user), fields(user_id = %user.0.user_id))]
pub async fn set_default<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    ApiPath(address_id): ApiPath<AddressId>,
) -> Result<Json<Done<AddressIds>>, ApiError> {
    state
        .addresses
        .set_default(user.0.user_id, address_id)
        .await?;
    Ok(done("Default address updated", AddressIds { address_id }))
}
