use serde::{Deserialize, Serialize};

/// Student — a registered learner tracked by the registry.
///
/// Public identity is the `slug` (URL-safe, unique, derived from the
/// name); `email` is unique as well. `full_name` is derived and kept
/// in sync on every save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Internal id (generated).
    pub id: String,

    pub first_name: String,
    pub last_name: String,

    /// Always "{first_name} {last_name}" trimmed. Never set directly.
    pub full_name: String,

    /// Unique email address.
    pub email: String,

    /// Unique, non-empty URL identifier (e.g. "jvasquez").
    pub slug: String,

    /// Free-text cohort / section label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Derive the display name from its parts, trimming the join so a
/// missing half doesn't leave stray whitespace.
pub fn derive_full_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name.trim(), last_name.trim())
        .trim()
        .to_string()
}
