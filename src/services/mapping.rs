//! Tax-type and sales-channel mapping.
//!
//! Channel matching is an ordered list of (substring, label) rules evaluated
//! against the lowercased category text; extending the channel set means
//! adding a rule, not touching control flow.

use crate::config::BrandingConfig;

/// 20% VAT on income.
pub const TAX_STANDARD: &str = "OUTPUT2";
/// Exempt supply.
pub const TAX_EXEMPT: &str = "EXEMPTOUTPUT";
/// 5% reduced rate.
pub const TAX_REDUCED: &str = "RROUTPUT";

/// Sales channel rules in priority order. The web store comes first: it is
/// also the fallback for orders flagged as web orders.
const CHANNEL_RULES: &[(&str, &str)] = &[
    ("web", "Web Store"),
    ("ebay", "eBay"),
    ("amazon", "Amazon"),
    ("etsy", "Etsy"),
];

/// Map a VAT-rate string onto the vendor tax type.
///
/// Matching is exact float equality against 0/5/20: the upstream tool sends
/// clean "0"/"5"/"20" strings, and anything else (including other numeric
/// rates and unparsable text) falls back to the standard-rate code.
pub fn map_tax_type(rate_text: Option<&str>) -> &'static str {
    let rate: f64 = match rate_text.and_then(|t| t.trim().parse().ok()) {
        Some(r) => r,
        None => return TAX_STANDARD,
    };

    if rate == 0.0 {
        TAX_EXEMPT
    } else if rate == 20.0 {
        TAX_STANDARD
    } else if rate == 5.0 {
        TAX_REDUCED
    } else {
        TAX_STANDARD
    }
}

fn matching_rule(category: &str) -> Option<&'static (&'static str, &'static str)> {
    let lowered = category.to_lowercase();
    CHANNEL_RULES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
}

/// Resolve the branding theme id for a category.
///
/// Falls back to the web store theme for web-flagged orders that match no
/// rule; `None` means the vendor default branding applies downstream.
pub fn select_branding_theme(
    category: &str,
    is_web: bool,
    branding: &BrandingConfig,
) -> Option<String> {
    let theme_for = |label: &str| match label {
        "Web Store" => branding.web_store.clone(),
        "eBay" => branding.ebay.clone(),
        "Amazon" => branding.amazon.clone(),
        "Etsy" => branding.etsy.clone(),
        _ => None,
    };

    match matching_rule(category) {
        Some((_, label)) => theme_for(label),
        None if is_web => branding.web_store.clone(),
        None => None,
    }
}

/// Resolve the tracking label for a category. Same rule order as the theme
/// lookup, but yields the fixed label and needs no configuration.
pub fn select_tracking_label(category: &str, is_web: bool) -> Option<&'static str> {
    match matching_rule(category) {
        Some((_, label)) => Some(label),
        None if is_web => Some(CHANNEL_RULES[0].1),
        None => None,
    }
}
