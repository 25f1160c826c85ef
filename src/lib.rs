pub mod config;
pub mod error;
pub mod db;
pub mod ingest;
pub mod reports;
pub mod http;

pub use config::Config;
pub use error::{StaffloadError, Result};
pub use ingest::{IngestionOrchestrator, IngestOptions, UploadedFile};
