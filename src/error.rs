use thiserror::Error;

/// Main error type for Staffload
#[derive(Error, Debug)]
pub enum StaffloadError {
    /// Database-related errors outside an ingestion write
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upload rejected before any storage interaction (file count, filename, empty file)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Row rejected by the strict coercion policy. Never raised under the lenient policy.
    #[error("Coercion error in {file} (row {row}, column {column}): cannot coerce {value:?}")]
    Coercion {
        file: String,
        row: usize,
        column: &'static str,
        value: String,
    },

    /// Storage failure while loading a file; the run's transaction is left uncommitted
    #[error("Write error while loading {file}: {source}")]
    Write {
        file: String,
        #[source]
        source: Box<StaffloadError>,
    },

    /// Storage unreachable or schema bootstrap failed at startup
    #[error("Connection error: {0}")]
    Connection(String),

    /// A blocking worker task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StaffloadError {
    /// Wrap a storage failure as a write error attributed to `file`.
    ///
    /// Validation and coercion errors pass through untouched so callers can still tell them apart.
    pub fn into_write(self, file: &str) -> Self {
        match self {
            e @ (StaffloadError::Validation(_)
            | StaffloadError::Coercion { .. }
            | StaffloadError::Write { .. }) => e,
            other => StaffloadError::Write {
                file: file.to_string(),
                source: Box::new(other),
            },
        }
    }
}

/// Convenient Result type using StaffloadError
pub type Result<T> = std::result::Result<T, StaffloadError>;
