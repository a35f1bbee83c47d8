pub mod certification;
pub mod course;
pub mod progress;
pub mod schema;
pub mod student;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use certreg_core::{ServiceError, merge_patch};
use certreg_sql::{SQLError, SQLStore, Value};

use crate::config::RegistryConfig;
use crate::slug;

/// Give up deriving a suffixed slug after this many candidates. Hitting
/// the bound means the slug space for a base is effectively exhausted;
/// fail loudly instead of probing forever.
pub(crate) const MAX_SLUG_ATTEMPTS: u32 = 64;

/// How many times an insert is retried when the slug UNIQUE constraint
/// fires after the availability probe passed (two writers racing the
/// same base).
pub(crate) const SLUG_INSERT_RETRIES: u32 = 2;

/// Registry service — business logic over the SQL store.
///
/// Records are stored as JSON documents in a `data` column with
/// extracted indexed columns for filtering and uniqueness.
pub struct RegistryService {
    pub(crate) sql: Arc<dyn SQLStore>,
    config: RegistryConfig,
}

impl RegistryService {
    pub fn new(sql: Arc<dyn SQLStore>, config: RegistryConfig) -> Result<Self, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Self { sql, config })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ── Generic CRUD helpers ──

    /// Map a storage write error, surfacing constraint violations as
    /// conflicts.
    pub(crate) fn write_err(e: SQLError) -> ServiceError {
        if e.is_constraint() {
            ServiceError::Conflict(e.to_string())
        } else {
            ServiceError::Storage(e.to_string())
        }
    }

    /// Insert a record as JSON into a table with indexed columns.
    pub(crate) fn insert_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), ServiceError> {
        let json = serde_json::to_string(record)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut cols = vec!["id", "data"];
        let mut placeholders = vec!["?1".to_string(), "?2".to_string()];
        let mut params = vec![Value::Text(id.to_string()), Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            let idx = i + 3;
            cols.push(col);
            placeholders.push(format!("?{}", idx));
            params.push(val.clone());
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            placeholders.join(", "),
        );

        self.sql.exec(&sql, &params).map_err(Self::write_err)?;
        Ok(())
    }

    /// Get a record by an indexed column, deserializing the JSON `data`
    /// column. `what` names the resource in not-found messages.
    pub(crate) fn get_record_by<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        key: &str,
        what: &str,
    ) -> Result<T, ServiceError> {
        let sql = format!("SELECT data FROM {} WHERE {} = ?1", table, column);
        let rows = self
            .sql
            .query(&sql, &[Value::Text(key.to_string())])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("{} '{}' not found", what, key)))?;
        let data = row
            .get_str("data")
            .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
        serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))
    }

    /// Update a record's JSON data and indexed columns by id.
    pub(crate) fn update_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), ServiceError> {
        let json = serde_json::to_string(record)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut sets = vec!["data = ?1".to_string()];
        let mut params: Vec<Value> = vec![Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            let idx = i + 2;
            sets.push(format!("{} = ?{}", col, idx));
            params.push(val.clone());
        }

        let id_idx = params.len() + 1;
        params.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            sets.join(", "),
            id_idx,
        );

        let affected = self.sql.exec(&sql, &params).map_err(Self::write_err)?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!("{}/{}", table, id)));
        }
        Ok(())
    }

    /// Delete a record by id.
    pub(crate) fn delete_record(&self, table: &str, id: &str) -> Result<(), ServiceError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table);
        let affected = self
            .sql
            .exec(&sql, &[Value::Text(id.to_string())])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!("{}/{}", table, id)));
        }
        Ok(())
    }

    /// Deserialize the `data` column of every row.
    pub(crate) fn rows_to_items<T: DeserializeOwned>(
        rows: &[certreg_sql::Row],
    ) -> Result<Vec<T>, ServiceError> {
        rows.iter()
            .map(|row| {
                let data = row
                    .get_str("data")
                    .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
                serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))
            })
            .collect()
    }

    /// Apply a JSON merge-patch to a record, stripping immutable keys
    /// from the patch first.
    pub(crate) fn apply_patch<T: Serialize + DeserializeOwned>(
        current: &T,
        patch: serde_json::Value,
        immutable: &[&str],
    ) -> Result<T, ServiceError> {
        let mut json = serde_json::to_value(current)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut patch = patch;
        if let Some(obj) = patch.as_object_mut() {
            for key in immutable {
                obj.remove(*key);
            }
        }

        merge_patch(&mut json, &patch);
        serde_json::from_value(json)
            .map_err(|e| ServiceError::Validation(format!("invalid patch: {}", e)))
    }

    // ── Slug uniqueness ──

    /// Is `candidate` already used as a slug in `table`?
    fn slug_taken(&self, table: &str, candidate: &str) -> Result<bool, ServiceError> {
        let sql = format!("SELECT COUNT(*) AS cnt FROM {} WHERE slug = ?1", table);
        let rows = self
            .sql
            .query(&sql, &[Value::Text(candidate.to_string())])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) > 0)
    }

    /// Derive a free slug from `base`: truncate, then probe `base`,
    /// `base-2`, `base-3`, ... up to [`MAX_SLUG_ATTEMPTS`].
    ///
    /// The probe alone cannot guarantee uniqueness under concurrent
    /// writes; the slug columns carry UNIQUE constraints and callers
    /// retry the insert on a constraint conflict.
    pub(crate) fn unique_slug(
        &self,
        table: &str,
        base: &str,
        max_len: usize,
    ) -> Result<String, ServiceError> {
        let base = slug::truncate(base, max_len);

        for n in 1..=MAX_SLUG_ATTEMPTS {
            let candidate = slug::candidate(&base, n);
            if !self.slug_taken(table, &candidate)? {
                return Ok(candidate);
            }
        }

        Err(ServiceError::Conflict(format!(
            "slug space exhausted for '{}'",
            base
        )))
    }
}
