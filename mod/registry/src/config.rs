use std::collections::HashMap;

use serde::Deserialize;

/// Registry configuration: which course codes a student must hold to
/// be considered complete, plus optional display helpers.
///
/// Passed explicitly into [`crate::service::RegistryService`] at
/// construction — never read from ambient global state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Required course codes, in display order.
    pub required_certs: Vec<String>,

    /// Legacy code → canonical required code, applied before matching.
    pub cert_aliases: HashMap<String, String>,

    /// Static fallback badge image URL per required code, used when a
    /// matched certification has no badge of its own.
    pub badge_fallbacks: HashMap<String, String>,
}

impl RegistryConfig {
    /// Config with only a required-code list.
    pub fn with_required<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_certs: codes.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Translate a code through the alias map; unknown codes pass
    /// through unchanged.
    pub fn canonical_code<'a>(&'a self, code: &'a str) -> &'a str {
        self.cert_aliases
            .get(code)
            .map(String::as_str)
            .unwrap_or(code)
    }

    /// Is this (already canonical) code in the required list?
    pub fn is_required(&self, code: &str) -> bool {
        self.required_certs.iter().any(|c| c == code)
    }
}
