use serde::{Deserialize, Serialize};

/// Course — an independent reference entity shared across many
/// certifications. Primary key is `code`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Unique course code (e.g. "IC", "CBHC").
    pub code: String,

    /// Human-readable course name.
    pub name: String,

    /// Unique URL identifier, derived once from "name-code" and never
    /// regenerated after the first save.
    pub slug: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Course artwork, used as a badge fallback on the detail view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_active() -> bool {
    true
}
