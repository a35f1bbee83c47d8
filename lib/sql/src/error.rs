use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    /// A uniqueness or other constraint was violated.
    ///
    /// Kept separate from [`SQLError::Execution`] so callers can map it to
    /// a conflict (and retry where that makes sense) without inspecting
    /// the message text.
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("connection error: {0}")]
    Connection(String),
}

impl SQLError {
    /// True if this error is a constraint violation (duplicate key etc.).
    pub fn is_constraint(&self) -> bool {
        matches!(self, SQLError::Constraint(_))
    }
}
