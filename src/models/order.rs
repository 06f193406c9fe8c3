//! Inbound order payload from the workflow automation tool.
//!
//! No schema is enforced upstream: every field is optional and defaulted,
//! and numeric/boolean fields arrive as whatever JSON type the workflow
//! tool felt like sending that day. Accessors coerce explicitly.

use crate::models::InvoiceLineItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Order document as posted by the workflow automation tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderPayload {
    pub order_number: Option<Value>,
    /// Free-text purchase-order/job reference. Web orders carry a fixed
    /// "WEB-" prefix here.
    pub order_po: Option<String>,
    /// Invoice template / category hint.
    pub template: Option<String>,
    pub customer_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub customer_email: Option<String>,
    pub total_ex_vat: Option<Value>,
    pub vat: Option<Value>,
    pub mark_as_paid: Option<Value>,
    pub email_customer: Option<Value>,
    /// Escape hatch: explicit invoice lines bypass all derivation.
    #[serde(rename = "lineItems")]
    pub line_items: Option<Vec<InvoiceLineItem>>,
    /// Nested customer-order-detail block.
    pub pl_order: Option<OrderDetail>,
}

/// Customer-order-detail block nested under `pl_order`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderDetail {
    pub customer_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub customer_email: Option<String>,
    pub category: Option<String>,
    pub date_invoiced: Option<String>,
    pub date_due: Option<String>,
    pub total_ex_vat: Option<Value>,
    pub vat: Option<Value>,
    /// Line items keyed by arbitrary upstream ids. BTreeMap keeps the
    /// iteration order deterministic regardless of what order the keys
    /// arrived in.
    pub items: Option<BTreeMap<String, OrderItem>>,
}

/// A single item record inside the order detail block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderItem {
    pub title: Option<String>,
    pub detail: Option<String>,
    pub quantity: Option<Value>,
    /// Already-computed line total, NOT a per-unit price. See the line-item
    /// builder for the full contract.
    pub price: Option<Value>,
    pub vat_rate: Option<String>,
}

impl OrderPayload {
    pub fn detail(&self) -> Option<&OrderDetail> {
        self.pl_order.as_ref()
    }

    /// Order number rendered as text, however it arrived (number or string).
    pub fn order_number_text(&self) -> Option<String> {
        as_string(self.order_number.as_ref())
    }
}

/// Loose boolean coercion: literal bool, or case-insensitive "true"/"1"/"yes".
/// Everything else, including absent, is false.
pub fn as_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
        }
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}

/// Loose numeric coercion: JSON number, or a string that parses as one.
pub fn as_f64(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Render a loose value as non-empty text.
pub fn as_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
