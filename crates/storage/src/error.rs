use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("{0} is not supported by this store")]
    Unsupported(&'static str),

    #[error("core error: {0}")]
    Core(#[from] slotkit_core::CoreError),
}
