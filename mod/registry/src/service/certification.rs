use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use certreg_core::{ServiceError, new_id, now_rfc3339};
use certreg_sql::Value;

use super::RegistryService;
use crate::model::{Certification, Course};

/// Payload for recording a certification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCertification {
    /// The owning student's public slug.
    pub student_slug: String,

    /// Linked course code. Either this or `cert_type` must be given.
    #[serde(default)]
    pub course_code: Option<String>,

    /// Legacy free-text label for records with no linked course.
    #[serde(default)]
    pub cert_type: Option<String>,

    #[serde(default)]
    pub credly_url: Option<String>,

    #[serde(default)]
    pub issued_at: Option<NaiveDate>,

    #[serde(default)]
    pub badge_image_path: Option<String>,

    #[serde(default)]
    pub badge_image_url: Option<String>,
}

/// A certification with its linked course attached and the badge
/// source resolved for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationEntry {
    #[serde(flatten)]
    pub certification: Certification,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<Course>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_src: Option<String>,
}

impl CertificationEntry {
    pub fn new(certification: Certification, course: Option<Course>) -> Self {
        let badge_src = certification.badge_src();
        Self {
            certification,
            course,
            badge_src,
        }
    }
}

impl RegistryService {
    /// Record a certification for a student.
    ///
    /// At most one certification per (student, course) pair — enforced
    /// by the UNIQUE constraint. Legacy records (no linked course) get
    /// the same treatment per (student, label) via a probe, since NULL
    /// course codes are distinct to SQLite's UNIQUE index.
    pub fn add_certification(
        &self,
        new: NewCertification,
    ) -> Result<Certification, ServiceError> {
        let student = self.get_student(&new.student_slug)?;

        let course_code = new.course_code.clone().filter(|c| !c.is_empty());
        let cert_type = new.cert_type.clone().unwrap_or_default().trim().to_string();

        if let Some(code) = course_code.as_deref() {
            // Reject unknown codes up front — a dangling link would
            // silently classify as legacy.
            self.get_course(code).map_err(|e| match e {
                ServiceError::NotFound(_) => {
                    ServiceError::Validation(format!("unknown course code '{}'", code))
                }
                other => other,
            })?;
        } else if cert_type.is_empty() {
            return Err(ServiceError::Validation(
                "certification needs a linked course or a legacy label".into(),
            ));
        } else if self.legacy_label_taken(&student.id, &cert_type)? {
            return Err(ServiceError::Conflict(format!(
                "student '{}' already has a certification labeled '{}'",
                new.student_slug, cert_type
            )));
        }

        let record = Certification {
            id: new_id(),
            student_id: student.id.clone(),
            course_code: course_code.clone(),
            cert_type,
            credly_url: new.credly_url.clone().filter(|u| !u.is_empty()),
            issued_at: new.issued_at,
            badge_image_path: new.badge_image_path.clone().filter(|p| !p.is_empty()),
            badge_image_url: new.badge_image_url.clone().filter(|u| !u.is_empty()),
            created_at: Some(now_rfc3339()),
        };

        self.insert_record(
            "certifications",
            &record.id,
            &record,
            &[
                ("student_id", Value::Text(record.student_id.clone())),
                (
                    "course_code",
                    match &record.course_code {
                        Some(code) => Value::Text(code.clone()),
                        None => Value::Null,
                    },
                ),
                ("cert_type", Value::Text(record.cert_type.clone())),
                (
                    "issued_at",
                    match &record.issued_at {
                        Some(d) => Value::Text(d.to_string()),
                        None => Value::Null,
                    },
                ),
                (
                    "created_at",
                    Value::Text(record.created_at.clone().unwrap_or_default()),
                ),
            ],
        )
        .map_err(|e| match e {
            ServiceError::Conflict(_) => ServiceError::Conflict(format!(
                "student '{}' already has a certification for course '{}'",
                new.student_slug,
                course_code.as_deref().unwrap_or(""),
            )),
            other => other,
        })?;

        info!(
            "recorded certification for student '{}' ({})",
            new.student_slug,
            record.course_code.as_deref().unwrap_or(&record.cert_type),
        );
        Ok(record)
    }

    fn legacy_label_taken(&self, student_id: &str, label: &str) -> Result<bool, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT COUNT(*) AS cnt FROM certifications
                 WHERE student_id = ?1 AND course_code IS NULL AND cert_type = ?2",
                &[
                    Value::Text(student_id.to_string()),
                    Value::Text(label.to_string()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) > 0)
    }

    /// All certifications of one student, linked courses attached.
    pub fn list_certifications(
        &self,
        student_slug: &str,
    ) -> Result<Vec<CertificationEntry>, ServiceError> {
        let student = self.get_student(student_slug)?;
        let certs = self.certifications_of(&student.id)?;

        let codes: Vec<String> = certs
            .iter()
            .filter_map(|c| c.course_code.clone())
            .collect();
        let courses = self.courses_by_codes(&codes)?;

        Ok(certs
            .into_iter()
            .map(|cert| {
                let course = cert
                    .course_code
                    .as_deref()
                    .and_then(|code| courses.get(code))
                    .cloned();
                CertificationEntry::new(cert, course)
            })
            .collect())
    }

    /// Raw certifications of one student, oldest first.
    pub(crate) fn certifications_of(
        &self,
        student_id: &str,
    ) -> Result<Vec<Certification>, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT data FROM certifications WHERE student_id = ?1 ORDER BY created_at",
                &[Value::Text(student_id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Self::rows_to_items(&rows)
    }

    pub fn remove_certification(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_record("certifications", id)
    }
}
