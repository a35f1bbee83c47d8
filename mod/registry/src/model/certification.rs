use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Certification — a badge a student has earned.
///
/// Owned by the student (deleting the student deletes these). The
/// course link is optional: records predating course definitions carry
/// only the legacy free-text `cert_type` label, and deleting a course
/// nulls out the link without touching the certification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    /// Internal id (generated).
    pub id: String,

    pub student_id: String,

    /// Linked course code, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,

    /// Legacy free-text label, kept for records with no linked course.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cert_type: String,

    /// External credential URL (Credly).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credly_url: Option<String>,

    /// Issue date. Absent dates sort before any real date when the
    /// classifier picks the most recent certification per code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<NaiveDate>,

    /// Stored badge file, relative to the media root. Takes precedence
    /// over `badge_image_url` when both are set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_image_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Where a certification's effective code comes from.
///
/// Resolved in exactly one place ([`Certification::source`]) instead of
/// scattering course/label null checks around the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertSource {
    /// A linked course; carries the course code.
    Linked(String),
    /// No course link; carries the legacy free-text label.
    Legacy(String),
    /// Neither a course nor a label. Such a record can never match a
    /// required code and is always classified as extra.
    Unset,
}

impl Certification {
    /// Resolve the source of this certification's effective code.
    pub fn source(&self) -> CertSource {
        if let Some(code) = self.course_code.as_deref() {
            if !code.is_empty() {
                return CertSource::Linked(code.to_string());
            }
        }
        if !self.cert_type.is_empty() {
            return CertSource::Legacy(self.cert_type.clone());
        }
        CertSource::Unset
    }

    /// The code used for required-list matching, if there is one.
    pub fn effective_code(&self) -> Option<String> {
        match self.source() {
            CertSource::Linked(code) | CertSource::Legacy(code) => Some(code),
            CertSource::Unset => None,
        }
    }

    /// Badge image source for display: the stored file wins over the
    /// external URL.
    pub fn badge_src(&self) -> Option<String> {
        if let Some(path) = self.badge_image_path.as_deref() {
            if !path.is_empty() {
                return Some(format!("/media/{}", path));
            }
        }
        self.badge_image_url.clone().filter(|u| !u.is_empty())
    }
}
