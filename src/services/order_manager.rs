//! Order-management system client.
//!
//! The invoice's free-text reference is the only link back to the
//! originating order, so the order number is recovered by pattern match on
//! the bracketed suffix the bridge itself composed at creation time.

use crate::config::OrderManagerConfig;
use crate::error::AppError;
use crate::services::token::VENDOR_TIMEOUT;
use anyhow::Context as _;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde_json::{json, Value};

static ORDER_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d+)\]").expect("hardcoded pattern is valid"));

/// Pull the bracketed order number out of an invoice reference.
/// `"WEB-1532TEST [6662]"` yields 6662; no bracket, no match.
pub fn extract_order_number(reference: &str) -> Option<u64> {
    ORDER_NUMBER_RE
        .captures(reference)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

#[derive(Clone)]
pub struct OrderManagerClient {
    http: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl OrderManagerClient {
    pub fn new(config: &OrderManagerConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(VENDOR_TIMEOUT)
            .build()
            .context("failed to build order-manager HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Push a status update for an order. The API acknowledges with an "ok"
    /// marker under one of two field names depending on its version.
    pub async fn update_order_status(
        &self,
        order_number: u64,
        status: &str,
    ) -> Result<(), AppError> {
        let url = format!("{}/orders/{}/status", self.base_url, order_number);

        let response = self
            .http
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .json(&json!({ "status": status }))
            .send()
            .await
            .map_err(|e| AppError::VendorRejected(e.to_string()))?;

        let http_status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::VendorRejected(e.to_string()))?;

        tracing::debug!(order_number, status = %http_status, body = %body, "Order-manager response");

        let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        let acknowledged =
            parsed["status"] == "ok" || parsed["result"] == "ok";

        if !http_status.is_success() || !acknowledged {
            tracing::error!(
                order_number,
                status = %http_status,
                body = %body,
                "Order-manager rejected status update"
            );
            return Err(AppError::VendorRejected(format!(
                "order-manager update for {} failed: {}",
                order_number, body
            )));
        }

        tracing::info!(order_number, new_status = status, "Order status updated");
        Ok(())
    }
}
