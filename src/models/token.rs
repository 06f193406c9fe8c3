//! Persisted OAuth token set.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Full token record as persisted to disk.
///
/// Unknown vendor fields (id token, scope, token type, ...) are captured in
/// `extra` and written back verbatim on every refresh; the vendor owns that
/// part of the schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Expiry as epoch seconds.
    pub expires_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenSet {
    /// A refresh credential is usable when present and non-empty.
    pub fn has_refresh_credential(&self) -> bool {
        self.refresh_token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }
}
