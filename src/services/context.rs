//! Per-request context derivation from the inbound order payload.

use crate::config::Config;
use crate::models::{as_bool, OrderPayload};
use crate::services::mapping;

/// Prefix that marks an order as originating from the web store.
const WEB_PO_PREFIX: &str = "WEB-";

/// Fallback clearing account when neither configured source is set.
const DEFAULT_CLEARING_ACCOUNT: &str = "090";

/// Flags and ids derived once per request. Immutable after creation, never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedContext {
    pub template: String,
    pub is_web_order: bool,
    pub category: String,
    pub branding_theme_id: Option<String>,
    pub tracking_label: Option<String>,
    pub mark_as_paid: bool,
    pub email_customer: bool,
    pub clearing_account: String,
}

/// Derive the request context. Pure: no I/O, same input gives the same
/// output.
pub fn derive_context(payload: &OrderPayload, config: &Config) -> DerivedContext {
    let po = payload.order_po.as_deref().unwrap_or_default();
    let is_web_order = !po.is_empty() && po.starts_with(WEB_PO_PREFIX);

    let template = payload
        .template
        .clone()
        .or_else(|| payload.detail().and_then(|d| d.category.clone()))
        .unwrap_or_default();

    // One hardwired special case: the "ebay" template canonicalizes the
    // category name and pins branding and tracking. Every other template is
    // a default bucket that passes straight through.
    let (category, branding_theme_id, tracking_label) =
        if template.eq_ignore_ascii_case("ebay") {
            (
                "eBay".to_string(),
                config.xero.branding.ebay.clone(),
                Some("eBay".to_string()),
            )
        } else {
            let branding =
                mapping::select_branding_theme(&template, is_web_order, &config.xero.branding);
            let tracking = mapping::select_tracking_label(&template, is_web_order)
                .map(str::to_string)
                .or_else(|| (!template.is_empty()).then(|| template.clone()));
            (template.clone(), branding, tracking)
        };

    let clearing_account = [
        config.xero.payment_account_code.as_deref(),
        config.xero.clearing_account_code.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|c| !c.trim().is_empty())
    .unwrap_or(DEFAULT_CLEARING_ACCOUNT)
    .to_string();

    DerivedContext {
        template,
        is_web_order,
        category,
        branding_theme_id,
        tracking_label,
        mark_as_paid: as_bool(payload.mark_as_paid.as_ref()),
        email_customer: as_bool(payload.email_customer.as_ref()),
        clearing_account,
    }
}
