//! CSV ingestion: coercion, reconciliation against stored state, batched writes.

pub mod schema;
pub mod coerce;
pub mod existing;
pub mod dedup;
pub mod reconcile;
pub mod batch_writer;
pub mod orchestrator;
pub mod walker;

pub use schema::{Department, Entity, EntityKind, Field, HireRecord, Job, RecordSchema};
pub use coerce::{coerce_records, read_raw_rows, CoercionPolicy, RawRow};
pub use existing::{read_table, snapshot, ExistingState};
pub use dedup::{dedup_against, DedupMode};
pub use reconcile::reconcile;
pub use batch_writer::{BatchWriter, WritePlan, WriteStats, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
pub use orchestrator::{
    CommitMode, FileResult, IngestOptions, IngestionOrchestrator, RunReport, RunState, UploadedFile, WriteStrategy,
};
pub use walker::{discover_csv_files, CsvFile};
