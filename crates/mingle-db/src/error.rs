use thiserror::Error;

/// Domain errors surfaced by the query layer. Handlers map these onto the
/// HTTP error surface; everything else in the enum is an unexpected
/// persistence failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("an outstanding request for this pair already exists")]
    DuplicateRequest,

    #[error("recipient does not resolve to an existing user")]
    UnknownRecipient,

    #[error("record not found")]
    NotFound,

    #[error("sender cannot message themselves")]
    SelfMessage,

    #[error("message content cannot be empty")]
    EmptyContent,

    #[error("{0} is already taken")]
    Conflict(&'static str),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Internal(String),
}

impl StoreError {
    /// True when the underlying SQLite error is a constraint violation,
    /// used to translate UNIQUE failures into domain errors.
    pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
