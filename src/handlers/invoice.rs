//! Invoice-creation handler.
//!
//! Maps an inbound order payload into the vendor invoice schema and submits
//! it. Mark-as-paid and email-customer are follow-ups: their failures are
//! logged but never fail the overall result, because the invoice already
//! exists on the vendor side by then.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::error::AppError;
use crate::models::OrderPayload;
use crate::services::builder::{build_invoice_model, payment_amount};
use crate::services::derive_context;
use crate::AppState;

/// Created-invoice summary returned to the workflow tool.
#[derive(Debug, Serialize)]
pub struct CreateInvoiceResponse {
    pub invoice_id: String,
    pub invoice_number: Option<String>,
    pub reference: String,
    pub status: Option<String>,
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<OrderPayload>,
) -> Result<(StatusCode, Json<CreateInvoiceResponse>), AppError> {
    let context = derive_context(&payload, &state.config);
    let model = build_invoice_model(&payload, &context, &state.config);

    tracing::info!(
        reference = %model.reference,
        contact = %model.contact.name,
        web_order = context.is_web_order,
        category = %context.category,
        lines = model.line_items.len(),
        "Creating invoice"
    );

    let ready = state.session.ensure_ready().await?;
    let invoice = state.xero.create_invoice(&ready, &model).await?;

    tracing::info!(
        invoice_id = %invoice.invoice_id,
        invoice_number = ?invoice.invoice_number,
        "Invoice created"
    );

    if context.mark_as_paid {
        match payment_amount(&payload) {
            Some(amount) => {
                if let Err(e) = state
                    .xero
                    .create_payment(&ready, &invoice.invoice_id, &context.clearing_account, amount)
                    .await
                {
                    tracing::error!(
                        invoice_id = %invoice.invoice_id,
                        error = %e,
                        "Mark-as-paid failed; invoice stands"
                    );
                }
            }
            None => {
                tracing::warn!(
                    invoice_id = %invoice.invoice_id,
                    "Mark-as-paid requested but the payload carries no usable totals"
                );
            }
        }
    }

    if context.email_customer {
        if let Err(e) = state.xero.email_invoice(&ready, &invoice.invoice_id).await {
            tracing::error!(
                invoice_id = %invoice.invoice_id,
                error = %e,
                "Invoice email failed; invoice stands"
            );
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateInvoiceResponse {
            invoice_id: invoice.invoice_id,
            invoice_number: invoice.invoice_number,
            reference: model.reference,
            status: invoice.status,
        }),
    ))
}
