use std::collections::HashMap;

use serde::Deserialize;
use tracing::info;

use certreg_core::{ListParams, ListResult, ServiceError, now_rfc3339};
use certreg_sql::Value;

use super::{RegistryService, SLUG_INSERT_RETRIES};
use crate::model::{Certification, Course};
use crate::slug;

/// Course slugs come from "name-code" and may run long; cap before
/// suffixing.
const COURSE_SLUG_MAX_LEN: usize = 160;

/// Payload for creating a course.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl RegistryService {
    /// Create a course. The slug is derived exactly once, from
    /// "name-code", and never regenerated afterwards.
    pub fn create_course(&self, new: NewCourse) -> Result<Course, ServiceError> {
        let code = new.code.trim().to_string();
        let name = new.name.trim().to_string();
        if code.is_empty() {
            return Err(ServiceError::Validation("course code is required".into()));
        }
        if name.is_empty() {
            return Err(ServiceError::Validation("course name is required".into()));
        }

        let now = now_rfc3339();
        let base = slug::slugify(&format!("{}-{}", name, code));

        let mut last_err = None;
        for _ in 0..=SLUG_INSERT_RETRIES {
            let unique = self.unique_slug("courses", &base, COURSE_SLUG_MAX_LEN)?;
            let record = Course {
                code: code.clone(),
                name: name.clone(),
                slug: unique,
                description: new.description.clone().filter(|d| !d.is_empty()),
                image_url: new.image_url.clone().filter(|u| !u.is_empty()),
                active: new.active,
                created_at: Some(now.clone()),
                updated_at: Some(now.clone()),
            };
            match self.insert_course(&record) {
                Ok(()) => {
                    info!("created course '{}'", record.code);
                    return Ok(record);
                }
                Err(ServiceError::Conflict(msg)) if msg.contains("courses.slug") => {
                    last_err = Some(ServiceError::Conflict(msg));
                }
                // The row id is the code, so a duplicate trips the
                // primary key ("courses.id") before the code column.
                Err(ServiceError::Conflict(msg))
                    if msg.contains("courses.id") || msg.contains("courses.code") =>
                {
                    return Err(ServiceError::Conflict(format!(
                        "course code '{}' already exists",
                        code
                    )));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            ServiceError::Conflict(format!("slug space exhausted for '{}'", base))
        }))
    }

    fn insert_course(&self, record: &Course) -> Result<(), ServiceError> {
        self.insert_record(
            "courses",
            &record.code,
            record,
            &[
                ("code", Value::Text(record.code.clone())),
                ("slug", Value::Text(record.slug.clone())),
                ("active", Value::Integer(record.active as i64)),
                (
                    "created_at",
                    Value::Text(record.created_at.clone().unwrap_or_default()),
                ),
                (
                    "updated_at",
                    Value::Text(record.updated_at.clone().unwrap_or_default()),
                ),
            ],
        )
    }

    pub fn get_course(&self, code: &str) -> Result<Course, ServiceError> {
        self.get_record_by("courses", "code", code, "course")
    }

    /// List courses, optionally only active ones, ordered by code.
    pub fn list_courses(
        &self,
        params: &ListParams,
        active_only: bool,
    ) -> Result<ListResult<Course>, ServiceError> {
        let limit = params.limit.min(500);

        let where_sql = if active_only { " WHERE active = 1" } else { "" };

        let count_sql = format!("SELECT COUNT(*) AS cnt FROM courses{}", where_sql);
        let rows = self
            .sql
            .query(&count_sql, &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let total = rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize;

        let sql = format!(
            "SELECT data FROM courses{} ORDER BY code LIMIT ?1 OFFSET ?2",
            where_sql,
        );
        let rows = self
            .sql
            .query(
                &sql,
                &[
                    Value::Integer(limit as i64),
                    Value::Integer(params.offset as i64),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(ListResult {
            items: Self::rows_to_items(&rows)?,
            total,
        })
    }

    /// Patch a course. Code and slug are immutable; `updated_at` is
    /// bumped.
    pub fn update_course(
        &self,
        code: &str,
        patch: serde_json::Value,
    ) -> Result<Course, ServiceError> {
        let current = self.get_course(code)?;
        let mut updated: Course =
            Self::apply_patch(&current, patch, &["code", "slug", "createdAt", "updatedAt"])?;
        updated.name = updated.name.trim().to_string();
        if updated.name.is_empty() {
            return Err(ServiceError::Validation("course name is required".into()));
        }
        updated.updated_at = Some(now_rfc3339());

        self.update_record(
            "courses",
            &current.code,
            &updated,
            &[
                ("active", Value::Integer(updated.active as i64)),
                (
                    "updated_at",
                    Value::Text(updated.updated_at.clone().unwrap_or_default()),
                ),
            ],
        )?;

        Ok(updated)
    }

    /// Delete a course. Certifications that referenced it keep existing
    /// with the link nulled out — the course is a shared reference
    /// entity, not an owner.
    pub fn delete_course(&self, code: &str) -> Result<(), ServiceError> {
        let course = self.get_course(code)?;

        let rows = self
            .sql
            .query(
                "SELECT data FROM certifications WHERE course_code = ?1",
                &[Value::Text(course.code.clone())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let certs: Vec<Certification> = Self::rows_to_items(&rows)?;

        // The stored documents are denormalized, so the unlink has to
        // rewrite each one, not just the indexed column.
        for mut cert in certs {
            cert.course_code = None;
            self.update_record(
                "certifications",
                &cert.id.clone(),
                &cert,
                &[("course_code", Value::Null)],
            )?;
        }

        self.delete_record("courses", &course.code)?;
        info!("deleted course '{}'", code);
        Ok(())
    }

    /// Fetch courses by code into a code → course map. Used for eager
    /// course attachment and required-row display names.
    pub(crate) fn courses_by_codes(
        &self,
        codes: &[String],
    ) -> Result<HashMap<String, Course>, ServiceError> {
        if codes.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders: Vec<String> = (1..=codes.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT data FROM courses WHERE code IN ({})",
            placeholders.join(", "),
        );
        let params: Vec<Value> = codes.iter().map(|c| Value::Text(c.clone())).collect();
        let rows = self
            .sql
            .query(&sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let courses: Vec<Course> = Self::rows_to_items(&rows)?;

        Ok(courses.into_iter().map(|c| (c.code.clone(), c)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::test_service;

    fn new_course(code: &str, name: &str) -> NewCourse {
        NewCourse {
            code: code.into(),
            name: name.into(),
            description: None,
            image_url: None,
            active: true,
        }
    }

    #[test]
    fn slug_derived_from_name_and_code() {
        let svc = test_service();
        let c = svc
            .create_course(new_course("IC", "Introduction to Cybersecurity"))
            .unwrap();
        assert_eq!(c.slug, "introduction-to-cybersecurity-ic");
    }

    #[test]
    fn duplicate_code_conflicts() {
        let svc = test_service();
        svc.create_course(new_course("IC", "Introduction to Cybersecurity"))
            .unwrap();
        let err = svc
            .create_course(new_course("IC", "Something Else"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        // The raw constraint message must not leak to the client.
        assert_eq!(err.to_string(), "course code 'IC' already exists");
    }

    #[test]
    fn patch_rejects_blank_name() {
        let svc = test_service();
        svc.create_course(new_course("IC", "Introduction to Cybersecurity"))
            .unwrap();
        let err = svc
            .update_course("IC", serde_json::json!({"name": "  "}))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let stored = svc.get_course("IC").unwrap();
        assert_eq!(stored.name, "Introduction to Cybersecurity");
    }

    #[test]
    fn update_keeps_code_and_slug() {
        let svc = test_service();
        let c = svc
            .create_course(new_course("IC", "Introduction to Cybersecurity"))
            .unwrap();
        let updated = svc
            .update_course(
                "IC",
                serde_json::json!({"name": "Intro to Cyber", "code": "XX", "slug": "xx"}),
            )
            .unwrap();
        assert_eq!(updated.name, "Intro to Cyber");
        assert_eq!(updated.code, "IC");
        assert_eq!(updated.slug, c.slug);
    }

    #[test]
    fn list_can_filter_to_active() {
        let svc = test_service();
        svc.create_course(new_course("IC", "Intro")).unwrap();
        let mut retired = new_course("OLD", "Retired Course");
        retired.active = false;
        svc.create_course(retired).unwrap();

        let all = svc.list_courses(&ListParams::default(), false).unwrap();
        assert_eq!(all.total, 2);

        let active = svc.list_courses(&ListParams::default(), true).unwrap();
        assert_eq!(active.total, 1);
        assert_eq!(active.items[0].code, "IC");
    }

    #[test]
    fn missing_code_or_name_rejected() {
        let svc = test_service();
        assert!(matches!(
            svc.create_course(new_course("", "Intro")).unwrap_err(),
            ServiceError::Validation(_)
        ));
        assert!(matches!(
            svc.create_course(new_course("IC", "  ")).unwrap_err(),
            ServiceError::Validation(_)
        ));
    }
}
