//! Payment webhook handler.
//!
//! The vendor notifies on invoice status changes; paid invoices are pushed
//! back into the order-management system. One malformed or failing event
//! never aborts the batch, and the batch is always acknowledged with 200 —
//! only a signature mismatch earns a 401, which the vendor's
//! intent-to-receive handshake requires.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};
use secrecy::ExposeSecret;

use crate::error::AppError;
use crate::services::order_manager::extract_order_number;
use crate::services::xero::{
    verify_webhook_signature, WebhookEvent, WebhookPayload, PLACEHOLDER_RESOURCE_ID,
};
use crate::AppState;

const SIGNATURE_HEADER: &str = "x-xero-signature";

/// Status pushed to the order-management system once an invoice is paid.
const ORDER_STATUS_PAID: &str = "paid";

pub async fn xero_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, AppError> {
    match state.config.xero.webhook_key.as_ref() {
        Some(key) => {
            let signature = headers
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    tracing::warn!("Missing webhook signature header");
                    AppError::Unauthorized(anyhow::anyhow!("missing webhook signature"))
                })?;

            if !verify_webhook_signature(&body, signature, key.expose_secret()) {
                tracing::warn!("Webhook signature mismatch");
                return Err(AppError::Unauthorized(anyhow::anyhow!(
                    "invalid webhook signature"
                )));
            }
        }
        None => {
            tracing::warn!("Webhook key not configured; accepting unsigned webhook");
        }
    }

    let batch: WebhookPayload = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("invalid webhook payload: {}", e)))?;

    tracing::info!(events = batch.events.len(), "Processing webhook batch");

    for event in &batch.events {
        if let Err(e) = process_event(&state, event).await {
            tracing::error!(
                resource_id = %event.resource_id,
                error = %e,
                "Webhook event failed; continuing with the batch"
            );
        }
    }

    Ok(StatusCode::OK)
}

async fn process_event(state: &AppState, event: &WebhookEvent) -> Result<(), AppError> {
    if !event.is_invoice_update() {
        tracing::debug!(
            category = %event.event_category,
            event_type = %event.event_type,
            "Ignoring non-invoice-update event"
        );
        return Ok(());
    }

    if event.resource_id == PLACEHOLDER_RESOURCE_ID {
        tracing::debug!("Ignoring intent-to-receive placeholder event");
        return Ok(());
    }

    let ready = state.session.ensure_ready().await?;
    let invoice = state.xero.get_invoice(&ready, &event.resource_id).await?;

    if !invoice.is_paid() {
        tracing::debug!(
            invoice_id = %invoice.invoice_id,
            status = ?invoice.status,
            "Invoice not paid; nothing to reconcile"
        );
        return Ok(());
    }

    let reference = invoice.reference.as_deref().unwrap_or_default();
    match extract_order_number(reference) {
        Some(order_number) => {
            state
                .order_manager
                .update_order_status(order_number, ORDER_STATUS_PAID)
                .await
        }
        None => {
            // Not fatal: invoices raised outside the bridge carry arbitrary
            // references with nothing to map back to.
            tracing::warn!(
                invoice_id = %invoice.invoice_id,
                reference,
                "No order number in invoice reference; skipping"
            );
            Ok(())
        }
    }
}
