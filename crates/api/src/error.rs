//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

const INTERNAL_MESSAGE: &str = "internal server error";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request body or path.
    BadRequest(String),
    /// Missing or unknown bearer token.
    Unauthorized(String),
    /// Authenticated, but not allowed.
    Forbidden(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "success": false, "message": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::NotFound { resource, .. } => {
            (StatusCode::NOT_FOUND, format!("{} not found", capitalize(resource)))
        }
        DomainError::InvalidTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
        DomainError::Conflict(_) | DomainError::Persistence(_) => {
            tracing::error!(error = %err, "request failed in persistence layer");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use common::OrderStatus;
    use store::StoreError;

    use super::*;

    fn status_of(err: DomainError) -> (StatusCode, String) {
        domain_error_to_response(err)
    }

    #[test]
    fn not_found_hides_the_id() {
        let (status, message) = status_of(DomainError::NotFound {
            resource: "cart item",
            id: 12,
        });
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "Cart item not found");
    }

    #[test]
    fn transitions_are_conflicts() {
        let (status, _) = status_of(DomainError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
        });
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[test]
    fn persistence_details_stay_server_side() {
        let err = DomainError::Persistence(StoreError::Corrupt("status ON_HOLD".into()));
        let (status, message) = status_of(err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, INTERNAL_MESSAGE);
    }
}
