use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use certreg_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339};
use certreg_sql::Value;

use super::{RegistryService, SLUG_INSERT_RETRIES};
use crate::model::student::derive_full_name;
use crate::model::Student;
use crate::service::certification::CertificationEntry;
use crate::slug;

/// Student slugs are capped before suffixing.
const STUDENT_SLUG_MAX_LEN: usize = 50;

/// Placeholder base when neither the name nor the email local-part
/// yields anything slug-worthy.
const STUDENT_SLUG_PLACEHOLDER: &str = "student";

/// Payload for creating a student.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub cohort: Option<String>,
    /// Explicit slug; derived from the name when absent.
    #[serde(default)]
    pub slug: Option<String>,
}

/// A student with certifications eagerly attached, as returned by the
/// listing query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEntry {
    #[serde(flatten)]
    pub student: Student,
    pub certifications: Vec<CertificationEntry>,
}

impl RegistryService {
    /// Create a student, deriving `full_name` and a unique slug.
    ///
    /// The slug base is the slugified full name, falling back to the
    /// email local-part, then a fixed placeholder. The availability
    /// probe picks a candidate; the UNIQUE constraint on the slug
    /// column is authoritative, and the insert is retried with a fresh
    /// candidate when two writers race the same base.
    pub fn create_student(&self, new: NewStudent) -> Result<Student, ServiceError> {
        let first_name = new.first_name.trim().to_string();
        let last_name = new.last_name.trim().to_string();
        let email = new.email.trim().to_string();

        check_email(&email)?;

        let full_name = derive_full_name(&first_name, &last_name);
        let now = now_rfc3339();
        let id = new_id();

        let make = |slug: String| Student {
            id: id.clone(),
            first_name: first_name.clone(),
            last_name: last_name.clone(),
            full_name: full_name.clone(),
            email: email.clone(),
            slug,
            cohort: new.cohort.clone().filter(|c| !c.is_empty()),
            created_at: Some(now.clone()),
        };

        if self.email_taken(&email)? {
            return Err(ServiceError::Conflict(format!(
                "student email '{}' already exists",
                email
            )));
        }

        // An explicit slug is taken as-is: collide → conflict, no
        // suffix probing.
        if let Some(explicit) = new.slug.as_deref().map(slug::slugify).filter(|s| !s.is_empty()) {
            let record = make(explicit.clone());
            self.insert_student(&record).map_err(|e| match e {
                ServiceError::Conflict(msg) if msg.contains("students.slug") => {
                    ServiceError::Conflict(format!("student slug '{}' already exists", explicit))
                }
                other => other,
            })?;
            return Ok(record);
        }

        let base = student_slug_base(&full_name, &email);

        let mut last_err = None;
        for _ in 0..=SLUG_INSERT_RETRIES {
            let unique = self.unique_slug("students", &base, STUDENT_SLUG_MAX_LEN)?;
            let record = make(unique);
            match self.insert_student(&record) {
                Ok(()) => {
                    info!("created student '{}'", record.slug);
                    return Ok(record);
                }
                // Constraint messages name the violated column; only a
                // slug race is worth re-probing.
                Err(ServiceError::Conflict(msg)) if msg.contains("students.slug") => {
                    warn!("slug '{}' lost a race, re-probing", record.slug);
                    last_err = Some(ServiceError::Conflict(msg));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            ServiceError::Conflict(format!("slug space exhausted for '{}'", base))
        }))
    }

    fn insert_student(&self, record: &Student) -> Result<(), ServiceError> {
        self.insert_record(
            "students",
            &record.id,
            record,
            &[
                ("email", Value::Text(record.email.clone())),
                ("slug", Value::Text(record.slug.clone())),
                ("first_name", Value::Text(record.first_name.clone())),
                ("last_name", Value::Text(record.last_name.clone())),
                (
                    "created_at",
                    Value::Text(record.created_at.clone().unwrap_or_default()),
                ),
            ],
        )
    }

    fn email_taken(&self, email: &str) -> Result<bool, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT COUNT(*) AS cnt FROM students WHERE email = ?1",
                &[Value::Text(email.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) > 0)
    }

    /// Look up a student by slug.
    pub fn get_student(&self, slug: &str) -> Result<Student, ServiceError> {
        self.get_record_by("students", "slug", slug, "student")
    }

    /// List students with certifications eagerly attached.
    ///
    /// `q` filters by case-insensitive substring on first or last name;
    /// `sort` is `last_name` (default) or `first_name`.
    pub fn list_students(
        &self,
        params: &ListParams,
    ) -> Result<ListResult<StudentEntry>, ServiceError> {
        let limit = params.limit.min(500);

        let order = match params.sort.as_deref() {
            Some("first_name") => "first_name COLLATE NOCASE, last_name COLLATE NOCASE",
            _ => "last_name COLLATE NOCASE, first_name COLLATE NOCASE",
        };

        let mut where_sql = String::new();
        let mut sql_params: Vec<Value> = Vec::new();
        if let Some(q) = params.q.as_deref().filter(|q| !q.is_empty()) {
            where_sql =
                " WHERE (first_name LIKE ?1 ESCAPE '\\' OR last_name LIKE ?1 ESCAPE '\\')"
                    .to_string();
            sql_params.push(Value::Text(format!("%{}%", escape_like(q))));
        }

        let count_sql = format!("SELECT COUNT(*) AS cnt FROM students{}", where_sql);
        let rows = self
            .sql
            .query(&count_sql, &sql_params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let total = rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize;

        let limit_idx = sql_params.len() + 1;
        let offset_idx = sql_params.len() + 2;
        sql_params.push(Value::Integer(limit as i64));
        sql_params.push(Value::Integer(params.offset as i64));

        let sql = format!(
            "SELECT data FROM students{} ORDER BY {} LIMIT ?{} OFFSET ?{}",
            where_sql, order, limit_idx, offset_idx,
        );
        let rows = self
            .sql
            .query(&sql, &sql_params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let students: Vec<Student> = Self::rows_to_items(&rows)?;

        // One extra query for all certifications, not one per student.
        let ids: Vec<&str> = students.iter().map(|s| s.id.as_str()).collect();
        let mut by_student = self.certifications_for_students(&ids)?;

        let items = students
            .into_iter()
            .map(|student| {
                let certifications = by_student.remove(&student.id).unwrap_or_default();
                StudentEntry {
                    student,
                    certifications,
                }
            })
            .collect();

        Ok(ListResult { items, total })
    }

    /// Patch a student. `full_name` is re-derived from the patched name
    /// parts; the slug is never regenerated once set.
    pub fn update_student(
        &self,
        slug: &str,
        patch: serde_json::Value,
    ) -> Result<Student, ServiceError> {
        let current = self.get_student(slug)?;
        let mut updated: Student =
            Self::apply_patch(&current, patch, &["id", "slug", "fullName", "createdAt"])?;
        updated.first_name = updated.first_name.trim().to_string();
        updated.last_name = updated.last_name.trim().to_string();
        updated.email = updated.email.trim().to_string();
        check_email(&updated.email)?;
        updated.full_name = derive_full_name(&updated.first_name, &updated.last_name);

        self.update_record(
            "students",
            &current.id,
            &updated,
            &[
                ("email", Value::Text(updated.email.clone())),
                ("first_name", Value::Text(updated.first_name.clone())),
                ("last_name", Value::Text(updated.last_name.clone())),
            ],
        )?;

        Ok(updated)
    }

    /// Delete a student and, with it, all of their certifications.
    pub fn delete_student(&self, slug: &str) -> Result<(), ServiceError> {
        let student = self.get_student(slug)?;
        self.sql
            .exec(
                "DELETE FROM certifications WHERE student_id = ?1",
                &[Value::Text(student.id.clone())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        self.delete_record("students", &student.id)?;
        info!("deleted student '{}'", slug);
        Ok(())
    }
}

/// Minimal structural check; full address validation is the mail
/// system's problem.
fn check_email(email: &str) -> Result<(), ServiceError> {
    if email.is_empty() || !email.contains('@') {
        return Err(ServiceError::Validation(format!(
            "invalid student email '{}'",
            email
        )));
    }
    Ok(())
}

/// Escape LIKE wildcards so a search term matches as literal text.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Slug base for a student: the name, else the email local-part, else
/// the placeholder.
fn student_slug_base(full_name: &str, email: &str) -> String {
    let base = slug::slugify(full_name);
    if !base.is_empty() {
        return base;
    }
    let local = email.split('@').next().unwrap_or("");
    let base = slug::slugify(local);
    if !base.is_empty() {
        return base;
    }
    STUDENT_SLUG_PLACEHOLDER.to_string()
}

/// Group certifications (with linked courses) by student id.
impl RegistryService {
    fn certifications_for_students(
        &self,
        student_ids: &[&str],
    ) -> Result<HashMap<String, Vec<CertificationEntry>>, ServiceError> {
        if student_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders: Vec<String> = (1..=student_ids.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT data FROM certifications WHERE student_id IN ({}) ORDER BY created_at",
            placeholders.join(", "),
        );
        let params: Vec<Value> = student_ids
            .iter()
            .map(|id| Value::Text(id.to_string()))
            .collect();
        let rows = self
            .sql
            .query(&sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let certs: Vec<crate::model::Certification> = Self::rows_to_items(&rows)?;

        let codes: Vec<String> = certs
            .iter()
            .filter_map(|c| c.course_code.clone())
            .collect();
        let courses = self.courses_by_codes(&codes)?;

        let mut by_student: HashMap<String, Vec<CertificationEntry>> = HashMap::new();
        for cert in certs {
            let course = cert
                .course_code
                .as_deref()
                .and_then(|code| courses.get(code))
                .cloned();
            by_student
                .entry(cert.student_id.clone())
                .or_default()
                .push(CertificationEntry::new(cert, course));
        }
        Ok(by_student)
    }
}
