//! Bearer-token authentication.
//!
//! Token issuance lives outside this service. Handlers only see the
//! [`Principal`] a token resolves to, through the [`AuthUser`] and
//! [`OperatorUser`] extractors.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::UserId;
use store::Store;
use thiserror::Error;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller behind a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    /// May drive order status changes for any order.
    pub is_operator: bool,
}

/// Resolves bearer tokens to principals.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Option<Principal>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenTableError {
    #[error("token entry '{0}' must look like token:user_id[:operator]")]
    Malformed(String),
    #[error("token entry '{entry}' has invalid user id '{user_id}'")]
    InvalidUserId { entry: String, user_id: String },
}

/// Fixed token table, configured from `API_TOKENS`.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a token.
    pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }

    /// Parses comma-separated `token:user_id[:operator]` entries.
    pub fn parse(table: &str) -> Result<Self, TokenTableError> {
        let mut authenticator = Self::new();
        for entry in table.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            let (token, user_id, is_operator) = match parts.as_slice() {
                [token, user_id] => (*token, *user_id, false),
                [token, user_id, "operator"] => (*token, *user_id, true),
                _ => return Err(TokenTableError::Malformed(entry.to_string())),
            };
            if token.is_empty() {
                return Err(TokenTableError::Malformed(entry.to_string()));
            }
            let user_id: i64 = user_id.parse().map_err(|_| TokenTableError::InvalidUserId {
                entry: entry.to_string(),
                user_id: user_id.to_string(),
            })?;
            authenticator = authenticator.with_token(
                token,
                Principal {
                    user_id: UserId::new(user_id),
                    is_operator,
                },
            );
        }
        Ok(authenticator)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Option<Principal> {
        self.tokens.get(token).copied()
    }
}

fn bearer_token(parts: &Parts) -> Result<String, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ApiError::Unauthorized("Expected 'Authorization: Bearer <token>'".to_string())
        })
}

/// Any authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Principal);

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        match state.authenticator.authenticate(&token).await {
            Some(principal) => Ok(Self(principal)),
            None => {
                metrics::counter!("auth_rejections_total").increment(1);
                tracing::debug!("rejected unknown bearer token");
                Err(ApiError::Unauthorized("Invalid token".to_string()))
            }
        }
    }
}

/// An authenticated caller with the operator flag.
#[derive(Debug, Clone, Copy)]
pub struct OperatorUser(pub Principal);

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for OperatorUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        if !principal.is_operator {
            return Err(ApiError::Forbidden("Operator access required".to_string()));
        }
        Ok(Self(principal))
    }
}
