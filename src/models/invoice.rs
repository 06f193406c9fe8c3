//! Invoice document in the accounting vendor's schema.
//!
//! Serialized PascalCase as the Accounting API expects. Line items also
//! deserialize from the workflow tool's camelCase escape-hatch payload via
//! field aliases.

use serde::{Deserialize, Serialize};

/// Sales invoice as submitted to the Accounting API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceModel {
    /// Always "ACCREC" (accounts receivable).
    #[serde(rename = "Type")]
    pub invoice_type: String,
    pub contact: Contact,
    pub line_items: Vec<InvoiceLineItem>,
    /// Issue date, yyyy-mm-dd.
    pub date: String,
    pub due_date: String,
    /// Composed from the PO reference and bracketed order number.
    pub reference: String,
    /// Always "AUTHORISED", never "DRAFT": the vendor treats the invoice as
    /// finalized immediately.
    pub status: String,
    /// Always "Exclusive": line amounts are ex-tax.
    pub line_amount_types: String,
    #[serde(skip_serializing_if = "Option::is_none", rename = "BrandingThemeID")]
    pub branding_theme_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Contact {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

/// A single invoice line.
///
/// `unit_amount` carries the full line total and `quantity` is always 1;
/// the upstream "price" field is an already-computed total, not a per-unit
/// price. The human-readable quantity lives in the description instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceLineItem {
    #[serde(alias = "description")]
    pub description: String,
    #[serde(alias = "quantity")]
    pub quantity: f64,
    #[serde(alias = "unitAmount")]
    pub unit_amount: f64,
    #[serde(alias = "accountCode", skip_serializing_if = "Option::is_none")]
    pub account_code: Option<String>,
    #[serde(alias = "taxType", skip_serializing_if = "Option::is_none")]
    pub tax_type: Option<String>,
    #[serde(alias = "tracking", skip_serializing_if = "Option::is_none")]
    pub tracking: Option<Vec<TrackingCategory>>,
}

/// Tracking category option attached to a line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrackingCategory {
    #[serde(alias = "name")]
    pub name: String,
    #[serde(alias = "option")]
    pub option: String,
}

impl TrackingCategory {
    pub fn channel(label: impl Into<String>) -> Self {
        Self {
            name: "Channel".to_string(),
            option: label.into(),
        }
    }
}
