//! Line-item and invoice-model assembly.
//!
//! Pricing contract, worth reading twice: the upstream `price` field on an
//! item is the ALREADY-COMPUTED LINE TOTAL, not a per-unit price. Output
//! quantity is therefore always forced to 1 and the unit amount carries the
//! total; the human-readable quantity only appears in the description.

use crate::config::Config;
use crate::models::{as_f64, Contact, InvoiceLineItem, InvoiceModel, OrderPayload, TrackingCategory};
use crate::services::context::DerivedContext;
use crate::services::mapping;
use chrono::{Duration, NaiveDate, Utc};

/// Upstream placeholder meaning "no due date was picked".
const ZERO_DATE_SENTINEL: &str = "0000-00-00";

/// Days added to the issue date when the payload carries no due date.
const DUE_DATE_OFFSET_DAYS: i64 = 10;

/// Build the invoice lines for an order.
///
/// An explicit non-empty `lineItems` list on the payload wins outright and
/// is passed through verbatim. Otherwise lines are derived from the order's
/// item map in key order; items are never filtered, so quantity-zero
/// (free/shipping) lines still appear.
pub fn build_line_items(
    payload: &OrderPayload,
    tracking_label: Option<&str>,
    config: &Config,
) -> Vec<InvoiceLineItem> {
    if let Some(explicit) = payload.line_items.as_ref() {
        if !explicit.is_empty() {
            return explicit.clone();
        }
    }

    let items = match payload.detail().and_then(|d| d.items.as_ref()) {
        Some(items) => items,
        None => return Vec::new(),
    };

    items
        .values()
        .map(|item| {
            let quantity = as_f64(item.quantity.as_ref());
            let total = as_f64(item.price.as_ref()).unwrap_or(0.0);

            let mut description = item.title.clone().unwrap_or_default();
            if let Some(q) = quantity {
                description.push_str(&format!(" (Qty {})", format_quantity(q)));
            }
            let detail = item.detail.as_deref().unwrap_or_default().trim();
            if !detail.is_empty() {
                description.push_str(&format!(" - {}", detail));
            }

            InvoiceLineItem {
                description,
                quantity: 1.0,
                unit_amount: total,
                account_code: Some(config.xero.sales_account_code.clone()),
                tax_type: Some(mapping::map_tax_type(item.vat_rate.as_deref()).to_string()),
                tracking: tracking_label.map(|label| vec![TrackingCategory::channel(label)]),
            }
        })
        .collect()
}

/// Assemble the full invoice document from the payload and derived context.
pub fn build_invoice_model(
    payload: &OrderPayload,
    context: &DerivedContext,
    config: &Config,
) -> InvoiceModel {
    let detail = payload.detail();
    let order_number = payload.order_number_text();

    let contact_name = first_non_empty([
        payload.customer_name.as_deref(),
        detail.and_then(|d| d.customer_name.as_deref()),
        payload.contact_name.as_deref(),
        detail.and_then(|d| d.contact_name.as_deref()),
    ])
    .unwrap_or_else(|| {
        format!(
            "Customer {}",
            order_number.as_deref().unwrap_or("(unknown order)")
        )
    });

    let email_address = first_non_empty([
        payload.email.as_deref(),
        detail.and_then(|d| d.email.as_deref()),
        payload.customer_email.as_deref(),
        detail.and_then(|d| d.customer_email.as_deref()),
    ]);

    let today = Utc::now().date_naive();
    let issue_date =
        parse_date(detail.and_then(|d| d.date_invoiced.as_deref())).unwrap_or(today);
    let due_date = resolve_due_date(detail.and_then(|d| d.date_due.as_deref()), issue_date, today);

    InvoiceModel {
        invoice_type: "ACCREC".to_string(),
        contact: Contact {
            name: contact_name,
            email_address,
        },
        line_items: build_line_items(payload, context.tracking_label.as_deref(), config),
        date: issue_date.format("%Y-%m-%d").to_string(),
        due_date: due_date.format("%Y-%m-%d").to_string(),
        reference: compose_reference(payload.order_po.as_deref(), order_number.as_deref()),
        status: "AUTHORISED".to_string(),
        line_amount_types: "Exclusive".to_string(),
        branding_theme_id: context.branding_theme_id.clone(),
    }
}

/// Compose the invoice reference: `"<PO> [<order_number>]"` when both are
/// present, either alone, empty when neither.
pub fn compose_reference(po: Option<&str>, order_number: Option<&str>) -> String {
    let po = po.unwrap_or_default().trim();
    let number = order_number.unwrap_or_default().trim();

    match (po.is_empty(), number.is_empty()) {
        (false, false) => format!("{} [{}]", po, number),
        (false, true) => po.to_string(),
        (true, false) => format!("[{}]", number),
        (true, true) => String::new(),
    }
}

/// Tax-inclusive total for the mark-as-paid follow-up, from whichever payload
/// level supplies both a pre-tax total and a tax amount.
pub fn payment_amount(payload: &OrderPayload) -> Option<f64> {
    let pair = |total: Option<f64>, tax: Option<f64>| Some(total? + tax?);

    pair(
        as_f64(payload.total_ex_vat.as_ref()),
        as_f64(payload.vat.as_ref()),
    )
    .or_else(|| {
        let detail = payload.detail()?;
        pair(
            as_f64(detail.total_ex_vat.as_ref()),
            as_f64(detail.vat.as_ref()),
        )
    })
}

fn first_non_empty<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        quantity.to_string()
    }
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    // Upstream sometimes sends a full timestamp; the leading date is enough.
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn resolve_due_date(raw: Option<&str>, issue_date: NaiveDate, today: NaiveDate) -> NaiveDate {
    match raw.map(str::trim) {
        None | Some("") => issue_date + Duration::days(DUE_DATE_OFFSET_DAYS),
        // The zero-date placeholder means "unset": substitute today.
        Some(ZERO_DATE_SENTINEL) => today,
        Some(other) => parse_date(Some(other)).unwrap_or(today),
    }
}
