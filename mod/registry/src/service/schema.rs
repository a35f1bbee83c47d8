use certreg_core::ServiceError;
use certreg_sql::SQLStore;

/// SQL DDL for the registry schema.
///
/// Each table stores the full JSON document in a `data` TEXT column,
/// with indexed columns extracted for filtering and uniqueness. The
/// UNIQUE constraints on `students.email`, `students.slug`,
/// `courses.code`, `courses.slug` and `(student_id, course_code)` are
/// the authoritative guards — the service's availability probes only
/// pick candidates.
///
/// SQLite treats NULLs as distinct in UNIQUE indexes, so legacy
/// certifications (no linked course) are not constrained here; the
/// service checks those per (student, cert_type) before insert.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS students (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        email TEXT UNIQUE,
        slug TEXT UNIQUE,
        first_name TEXT,
        last_name TEXT,
        created_at TEXT
    );

    CREATE TABLE IF NOT EXISTS courses (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        code TEXT UNIQUE,
        slug TEXT UNIQUE,
        active INTEGER,
        created_at TEXT,
        updated_at TEXT
    );

    CREATE TABLE IF NOT EXISTS certifications (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        student_id TEXT NOT NULL,
        course_code TEXT,
        cert_type TEXT,
        issued_at TEXT,
        created_at TEXT,
        UNIQUE(student_id, course_code)
    );

    CREATE INDEX IF NOT EXISTS idx_student_name ON students(last_name, first_name);
    CREATE INDEX IF NOT EXISTS idx_cert_student ON certifications(student_id);
    CREATE INDEX IF NOT EXISTS idx_cert_course ON certifications(course_code);
";

pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    sql.exec_batch(SCHEMA)
        .map_err(|e| ServiceError::Storage(format!("schema init failed: {}", e)))
}
