//! HTTP handlers for the invoice bridge.

pub mod invoice;
pub mod webhook;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "invoice-bridge",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
