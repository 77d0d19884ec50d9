pub mod addresses;
pub mod admin;
pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;

use axum::Json;
use serde::Serialize;

/// `{"success": true, "data": ...}` with a `count` for lists.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
}

pub(crate) fn data<T: Serialize>(data: T) -> Json<Data<T>> {
    Json(Data {
        success: true,
        count: None,
        data,
    })
}

pub(crate) fn list<T: Serialize>(items: Vec<T>) -> Json<Data<Vec<T>>> {
    Json(Data {
        success: true,
        count: Some(items.len()),
        data: items,
    })
}

/// `{"success": true, "message": ...}` plus any ids of what was written.
#[derive(Debug, Serialize)]
pub struct Done<T> {
    pub success: bool,
    pub message: &'static str,
    #[serde(flatten)]
    pub ids: T,
}

/// No ids to report.
#[derive(Debug, Serialize)]
pub struct NoIds {}

pub(crate) fn done<T: Serialize>(message: &'static str, ids: T) -> Json<Done<T>> {
    Json(Done {
        success: true,
        message,
        ids,
    })
}
