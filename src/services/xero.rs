//! Accounting API client.
//!
//! Every call is bearer-authorized with the session's access token and
//! tenant-scoped via the `xero-tenant-id` header. Error bodies from the
//! vendor surface as `VendorRejected` with the vendor detail attached.

use crate::config::XeroConfig;
use crate::error::AppError;
use crate::models::InvoiceModel;
use crate::services::token::{Ready, VENDOR_TIMEOUT};
use anyhow::Context as _;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;

/// The intent-to-receive handshake sends events with this resource id; they
/// carry nothing worth processing.
pub const PLACEHOLDER_RESOURCE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[derive(Clone)]
pub struct XeroClient {
    http: Client,
    base_url: String,
}

/// Invoice summary as returned by the Accounting API.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct XeroInvoice {
    #[serde(rename = "InvoiceID")]
    pub invoice_id: String,
    pub invoice_number: Option<String>,
    pub reference: Option<String>,
    pub status: Option<String>,
    pub amount_due: Option<f64>,
    pub amount_paid: Option<f64>,
}

impl XeroInvoice {
    pub fn is_paid(&self) -> bool {
        self.status.as_deref() == Some("PAID")
    }
}

#[derive(Debug, Deserialize)]
struct InvoicesResponse {
    #[serde(rename = "Invoices", default)]
    invoices: Vec<XeroInvoice>,
}

/// Webhook batch envelope.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookPayload {
    pub events: Vec<WebhookEvent>,
    pub first_event_sequence: Option<i64>,
    pub last_event_sequence: Option<i64>,
    pub entropy: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookEvent {
    pub resource_id: String,
    pub event_category: String,
    pub event_type: String,
    pub event_date_utc: Option<String>,
    pub tenant_id: Option<String>,
}

impl WebhookEvent {
    pub fn is_invoice_update(&self) -> bool {
        self.event_category == "INVOICE" && self.event_type == "UPDATE"
    }
}

/// Verify the webhook signature header: base64(HMAC-SHA256(body, key)).
pub fn verify_webhook_signature(body: &str, signature: &str, key: &str) -> bool {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = match HmacSha256::new_from_slice(key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body.as_bytes());
    let expected = STANDARD.encode(mac.finalize().into_bytes());
    expected == signature
}

impl XeroClient {
    pub fn new(config: &XeroConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(VENDOR_TIMEOUT)
            .build()
            .context("failed to build accounting HTTP client")?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
        })
    }

    fn request(&self, method: Method, ready: &Ready, path: &str) -> RequestBuilder {
        let url = format!("{}/api.xro/2.0/{}", self.base_url, path);
        self.http
            .request(method, url)
            .bearer_auth(&ready.access_token)
            .header("xero-tenant-id", &ready.tenant_id)
            .header("Accept", "application/json")
    }

    /// Submit the invoice. The API takes a wrapped list and echoes the
    /// created documents back.
    pub async fn create_invoice(
        &self,
        ready: &Ready,
        invoice: &InvoiceModel,
    ) -> Result<XeroInvoice, AppError> {
        let body = json!({ "Invoices": [invoice] });

        let response = self
            .request(Method::POST, ready, "Invoices")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::VendorRejected(e.to_string()))?;

        let created: InvoicesResponse = Self::parse(response, "create invoice").await?;
        created
            .invoices
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::VendorRejected("create invoice returned an empty list".to_string())
            })
    }

    pub async fn get_invoice(
        &self,
        ready: &Ready,
        invoice_id: &str,
    ) -> Result<XeroInvoice, AppError> {
        let response = self
            .request(Method::GET, ready, &format!("Invoices/{}", invoice_id))
            .send()
            .await
            .map_err(|e| AppError::VendorRejected(e.to_string()))?;

        let fetched: InvoicesResponse = Self::parse(response, "get invoice").await?;
        fetched.invoices.into_iter().next().ok_or_else(|| {
            AppError::VendorRejected(format!("invoice {} not found", invoice_id))
        })
    }

    /// Record a payment against the invoice on the clearing account, dated
    /// today, for the tax-inclusive total.
    pub async fn create_payment(
        &self,
        ready: &Ready,
        invoice_id: &str,
        account_code: &str,
        amount: f64,
    ) -> Result<(), AppError> {
        let body = json!({
            "Payments": [{
                "Invoice": { "InvoiceID": invoice_id },
                "Account": { "Code": account_code },
                "Date": Utc::now().date_naive().format("%Y-%m-%d").to_string(),
                "Amount": amount,
            }]
        });

        let response = self
            .request(Method::PUT, ready, "Payments")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::VendorRejected(e.to_string()))?;

        Self::check(response, "create payment").await
    }

    /// Ask the vendor to email the invoice to its contact. The action takes
    /// an empty body.
    pub async fn email_invoice(&self, ready: &Ready, invoice_id: &str) -> Result<(), AppError> {
        let response = self
            .request(Method::POST, ready, &format!("Invoices/{}/Email", invoice_id))
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| AppError::VendorRejected(e.to_string()))?;

        Self::check(response, "email invoice").await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<T, AppError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::VendorRejected(e.to_string()))?;

        tracing::debug!(operation, status = %status, body = %body, "Accounting API response");

        if !status.is_success() {
            tracing::error!(operation, status = %status, body = %body, "Accounting API rejected call");
            return Err(AppError::VendorRejected(format!("{}: {}", status, body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            AppError::VendorRejected(format!("unparsable {} response: {}", operation, e))
        })
    }

    async fn check(response: reqwest::Response, operation: &str) -> Result<(), AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response
            .text()
            .await
            .map_err(|e| AppError::VendorRejected(e.to_string()))?;
        tracing::error!(operation, status = %status, body = %body, "Accounting API rejected call");
        Err(AppError::VendorRejected(format!("{}: {}", status, body)))
    }
}
