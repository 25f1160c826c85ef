//! One ingestion run over a set of uploaded files.
//!
//! `Idle → Validating → (Coercing → Reconciling → Writing)* → Committed | Failed`
//!
//! Validation happens before any storage access. Files are then written one at a time through a
//! single session; under [`CommitMode::EndOfRun`] nothing becomes visible until every file has
//! been written, and a failure on any file leaves the whole run uncommitted.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tokio::task;
use uuid::Uuid;

use super::batch_writer::{BatchWriter, WritePlan, DEFAULT_BATCH_SIZE};
use super::coerce::{coerce_records, read_raw_rows, CoercionPolicy, RawRow};
use super::dedup::{dedup_against, DedupMode};
use super::existing::{snapshot, ExistingState};
use super::reconcile::reconcile;
use super::schema::{Department, Entity, EntityKind, HireRecord, Job};
use crate::db::{Db, Storage};
use crate::error::{Result, StaffloadError};

/// How incoming records are reconciled with stored ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStrategy {
    /// Merge every record by natural key; re-runs are idempotent
    #[default]
    Upsert,
    /// Insert rows whose entire contents are not already stored
    InsertOnly,
    /// Insert rows whose key is not already stored
    InsertOnlyByKey,
}

impl WriteStrategy {
    /// Dedup rule for the insert-only strategies, `None` for upsert.
    pub fn dedup_mode(self) -> Option<DedupMode> {
        match self {
            WriteStrategy::Upsert => None,
            WriteStrategy::InsertOnly => Some(DedupMode::FullRow),
            WriteStrategy::InsertOnlyByKey => Some(DedupMode::Key),
        }
    }
}

/// When a run's writes become durable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// One commit after every file has been written
    #[default]
    EndOfRun,
    /// Commit after each file; earlier files survive a later failure
    PerFile,
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub batch_size: usize,
    pub strategy: WriteStrategy,
    pub commit_mode: CommitMode,
    pub coercion: CoercionPolicy,
    pub max_files: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            strategy: WriteStrategy::default(),
            commit_mode: CommitMode::default(),
            coercion: CoercionPolicy::default(),
            max_files: 3,
        }
    }
}

/// A named file handed to a run
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub contents: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            contents: contents.into(),
        }
    }
}

/// Per-file outcome returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileResult {
    pub filename: String,
    /// First record of the file as coerced
    pub first_record_preview: serde_json::Value,
    pub rows_parsed: usize,
    pub rows_written: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Validating,
    Coercing,
    Reconciling,
    Writing,
    Committed,
    Failed,
}

/// Result of a committed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub state: RunState,
    pub files: Vec<FileResult>,
}

struct RunTracker {
    run_id: Uuid,
    state: RunState,
}

impl RunTracker {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: RunState::Idle,
        }
    }

    fn transition(&mut self, next: RunState) {
        log::debug!("Run {}: {:?} -> {:?}", self.run_id, self.state, next);
        self.state = next;
    }

    fn fail(&mut self, err: &StaffloadError) {
        log::error!("Ingestion run {} failed: {}", self.run_id, err);
        self.transition(RunState::Failed);
    }
}

/// An upload that passed validation, parsed into raw rows
struct ValidatedFile {
    filename: String,
    kind: EntityKind,
    rows: Vec<RawRow>,
}

/// Drives ingestion runs against one database.
///
/// Runs are not serialized here; callers sharing a database must not overlap runs.
#[derive(Debug, Clone)]
pub struct IngestionOrchestrator {
    db: Db,
    options: IngestOptions,
}

impl IngestionOrchestrator {
    pub fn new(db: Db, options: IngestOptions) -> Self {
        Self { db, options }
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Validate, coerce, reconcile and write every file, then commit.
    pub async fn run(&self, files: Vec<UploadedFile>) -> Result<RunReport> {
        let mut run = RunTracker::new();
        log::info!(
            "Starting ingestion run {} ({} file(s), strategy {:?}, commit {:?})",
            run.run_id,
            files.len(),
            self.options.strategy,
            self.options.commit_mode
        );

        run.transition(RunState::Validating);
        let validated = match validate(files, self.options.max_files) {
            Ok(validated) => validated,
            Err(e) => {
                run.fail(&e);
                return Err(e);
            }
        };

        let existing = match self.load_existing_state(&validated).await {
            Ok(existing) => existing,
            Err(e) => {
                run.fail(&e);
                return Err(e);
            }
        };

        let run_id = run.run_id;
        let db = self.db.clone();
        let options = self.options.clone();
        let (mut run, outcome) = task::spawn_blocking(move || {
            let outcome = write_run(&db, &options, &validated, &existing, &mut run);
            (run, outcome)
        })
        .await
        .map_err(|e| StaffloadError::Task(format!("ingestion run {}: {}", run_id, e)))?;

        match outcome {
            Ok(files) => {
                log::info!("Ingestion run {} committed ({} file(s))", run.run_id, files.len());
                Ok(RunReport {
                    run_id: run.run_id,
                    state: run.state,
                    files,
                })
            }
            Err(e) => {
                run.fail(&e);
                Err(e)
            }
        }
    }

    /// Snapshot the target tables for the insert-only strategies; upsert needs none.
    async fn load_existing_state(&self, files: &[ValidatedFile]) -> Result<ExistingState> {
        if self.options.strategy.dedup_mode().is_none() {
            return Ok(ExistingState::default());
        }
        let kinds: Vec<EntityKind> = files.iter().map(|f| f.kind).collect();
        let existing = snapshot(&self.db, &kinds).await.map_err(|e| {
            let first = files.first().map(|f| f.filename.as_str()).unwrap_or("upload");
            e.into_write(first)
        })?;
        for kind in &kinds {
            log::debug!(
                "Existing {}: {} row(s)",
                kind.schema().table,
                existing.row_count(*kind)
            );
        }
        Ok(existing)
    }
}

/// Check file count, filenames and non-emptiness, parsing each file's rows.
fn validate(files: Vec<UploadedFile>, max_files: usize) -> Result<Vec<ValidatedFile>> {
    if files.is_empty() {
        return Err(StaffloadError::Validation("no files uploaded".to_string()));
    }
    if files.len() > max_files {
        return Err(StaffloadError::Validation(format!(
            "at most {} files may be uploaded at once, got {}",
            max_files,
            files.len()
        )));
    }

    let mut kinds = Vec::with_capacity(files.len());
    let mut seen = HashSet::new();
    for file in &files {
        let kind = EntityKind::from_filename(&file.filename).ok_or_else(|| {
            StaffloadError::Validation(format!(
                "unrecognized file name {:?}: expected one of employees, departments, jobs",
                file.filename
            ))
        })?;
        if !seen.insert(kind) {
            return Err(StaffloadError::Validation(format!(
                "more than one {} file in the upload",
                kind.keyword()
            )));
        }
        kinds.push(kind);
    }

    files
        .into_iter()
        .zip(kinds)
        .map(|(file, kind)| {
            let rows = read_raw_rows(&file.contents, kind.schema());
            if rows.is_empty() {
                return Err(StaffloadError::Validation(format!(
                    "{} has no data rows",
                    file.filename
                )));
            }
            Ok(ValidatedFile {
                filename: file.filename,
                kind,
                rows,
            })
        })
        .collect()
}

/// Write every file through one session and commit per the commit mode.
fn write_run(
    db: &Db,
    options: &IngestOptions,
    files: &[ValidatedFile],
    existing: &ExistingState,
    run: &mut RunTracker,
) -> Result<Vec<FileResult>> {
    let first = files.first().map(|f| f.filename.as_str()).unwrap_or("upload");
    let mut session = db.open_session().map_err(|e| e.into_write(first))?;
    let writer = BatchWriter::new(options.batch_size);
    let mut results = Vec::with_capacity(files.len());

    for file in files {
        let result = match file.kind {
            EntityKind::HireRecords => load_file::<HireRecord, _>(&mut session, file, existing, options, &writer, run),
            EntityKind::Departments => load_file::<Department, _>(&mut session, file, existing, options, &writer, run),
            EntityKind::Jobs => load_file::<Job, _>(&mut session, file, existing, options, &writer, run),
        }?;

        if options.commit_mode == CommitMode::PerFile {
            session.commit().map_err(|e| e.into_write(&file.filename))?;
            log::info!("Committed {}", file.filename);
        }
        results.push(result);
    }

    if options.commit_mode == CommitMode::EndOfRun {
        let last = files.last().map(|f| f.filename.as_str()).unwrap_or("upload");
        session.commit().map_err(|e| e.into_write(last))?;
    }
    run.transition(RunState::Committed);

    Ok(results)
}

/// Coerce, reconcile and write one file.
fn load_file<E: Entity, S: Storage>(
    storage: &mut S,
    file: &ValidatedFile,
    existing: &ExistingState,
    options: &IngestOptions,
    writer: &BatchWriter,
    run: &mut RunTracker,
) -> Result<FileResult> {
    run.transition(RunState::Coercing);
    let records: Vec<E> = coerce_records(&file.rows, options.coercion, &file.filename)?;
    let rows_parsed = records.len();
    let first_record_preview = records
        .first()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| StaffloadError::InvalidInput(format!("cannot preview {}: {}", file.filename, e)))?
        .unwrap_or(serde_json::Value::Null);

    run.transition(RunState::Reconciling);
    let plan = match options.strategy.dedup_mode() {
        Some(mode) => WritePlan::Insert(dedup_against(records, &existing.records::<E>(), mode)),
        None => WritePlan::Merge(reconcile(records)),
    };
    if plan.len() < rows_parsed {
        log::debug!(
            "{}: {} of {} rows dropped as duplicates",
            file.filename,
            rows_parsed - plan.len(),
            rows_parsed
        );
    }

    run.transition(RunState::Writing);
    let stats = writer
        .write(storage, &plan)
        .map_err(|e| e.into_write(&file.filename))?;

    log::info!(
        "✓ {} → {} ({} parsed, {} inserted, {} updated, {} batch(es))",
        file.filename,
        E::schema().table,
        rows_parsed,
        stats.inserted,
        stats.updated,
        stats.batches
    );

    Ok(FileResult {
        filename: file.filename.clone(),
        first_record_preview,
        rows_parsed,
        rows_written: stats.written(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_test_db;
    use serde_json::json;

    const EMPLOYEES_CSV: &str = "id,name,datetime,department_id,job_id\n\
        1,John Doe,2021-01-01T00:00:00Z,1,1\n\
        2,Jane Roe,2021-04-15T09:30:00Z,2,1\n";
    const DEPARTMENTS_CSV: &str = "id,department\n1,IT\n2,Sales\n";
    const JOBS_CSV: &str = "id,job\n1,Engineer\n";

    fn three_files() -> Vec<UploadedFile> {
        vec![
            UploadedFile::new("hired_employees.csv", EMPLOYEES_CSV),
            UploadedFile::new("departments.csv", DEPARTMENTS_CSV),
            UploadedFile::new("jobs.csv", JOBS_CSV),
        ]
    }

    fn orchestrator(db: &Db, strategy: WriteStrategy) -> IngestionOrchestrator {
        IngestionOrchestrator::new(
            db.clone(),
            IngestOptions {
                strategy,
                ..IngestOptions::default()
            },
        )
    }

    fn count(db: &Db, table: &str) -> i64 {
        let conn = db.open_connection().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    fn total_rows(db: &Db) -> i64 {
        count(db, "employees") + count(db, "departments") + count(db, "jobs")
    }

    #[tokio::test]
    async fn test_three_file_upload_reports_each_file() {
        let (db, _temp_dir) = setup_test_db();
        let report = orchestrator(&db, WriteStrategy::Upsert)
            .run(three_files())
            .await
            .unwrap();

        assert_eq!(report.state, RunState::Committed);
        assert_eq!(report.files.len(), 3);
        assert_eq!(report.files[0].filename, "hired_employees.csv");
        assert_eq!(
            report.files[0].first_record_preview,
            json!({
                "id": 1,
                "name": "John Doe",
                "hired_at": "2021-01-01T00:00:00Z",
                "department_id": 1,
                "job_id": 1
            })
        );
        assert_eq!(report.files[1].first_record_preview, json!({"id": 1, "department": "IT"}));
        assert_eq!(report.files[2].first_record_preview, json!({"id": 1, "job": "Engineer"}));
        assert_eq!(report.files[0].rows_parsed, 2);
        assert_eq!(report.files[0].rows_written, 2);

        assert_eq!(count(&db, "employees"), 2);
        assert_eq!(count(&db, "departments"), 2);
        assert_eq!(count(&db, "jobs"), 1);
    }

    #[tokio::test]
    async fn test_four_files_rejected_without_writes() {
        let (db, _temp_dir) = setup_test_db();
        let mut files = three_files();
        files.push(UploadedFile::new("more_jobs.csv", JOBS_CSV));

        let err = orchestrator(&db, WriteStrategy::Upsert).run(files).await.unwrap_err();
        assert!(matches!(err, StaffloadError::Validation(_)));
        assert_eq!(total_rows(&db), 0);
    }

    #[tokio::test]
    async fn test_unrecognized_and_duplicate_names_rejected() {
        let (db, _temp_dir) = setup_test_db();
        let orchestrator = orchestrator(&db, WriteStrategy::Upsert);

        let err = orchestrator
            .run(vec![
                UploadedFile::new("jobs.csv", JOBS_CSV),
                UploadedFile::new("salaries.csv", "1,100\n"),
            ])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("salaries.csv"));

        let err = orchestrator
            .run(vec![
                UploadedFile::new("jobs.csv", JOBS_CSV),
                UploadedFile::new("jobs_2.csv", JOBS_CSV),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StaffloadError::Validation(_)));

        let err = orchestrator.run(vec![]).await.unwrap_err();
        assert!(matches!(err, StaffloadError::Validation(_)));
        assert_eq!(total_rows(&db), 0);
    }

    #[tokio::test]
    async fn test_empty_file_rejected_before_any_write() {
        let (db, _temp_dir) = setup_test_db();
        let err = orchestrator(&db, WriteStrategy::Upsert)
            .run(vec![
                UploadedFile::new("jobs.csv", JOBS_CSV),
                UploadedFile::new("departments.csv", "id,department\n"),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StaffloadError::Validation(ref m) if m.contains("departments.csv")));
        assert_eq!(total_rows(&db), 0);
    }

    #[tokio::test]
    async fn test_upsert_rerun_is_idempotent() {
        let (db, _temp_dir) = setup_test_db();
        let orchestrator = orchestrator(&db, WriteStrategy::Upsert);

        orchestrator.run(three_files()).await.unwrap();
        let report = orchestrator.run(three_files()).await.unwrap();
        assert_eq!(report.files[0].rows_written, 2);

        assert_eq!(count(&db, "employees"), 2);
        assert_eq!(count(&db, "departments"), 2);
        assert_eq!(count(&db, "jobs"), 1);

        let conn = db.open_connection().unwrap();
        let name: String = conn
            .query_row("SELECT name FROM employees WHERE id = 2", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "Jane Roe");
    }

    #[tokio::test]
    async fn test_upsert_updates_non_key_values() {
        let (db, _temp_dir) = setup_test_db();
        let orchestrator = orchestrator(&db, WriteStrategy::Upsert);

        orchestrator.run(vec![UploadedFile::new("departments.csv", DEPARTMENTS_CSV)]).await.unwrap();
        orchestrator
            .run(vec![UploadedFile::new("departments.csv", "1,Information Technology\n")])
            .await
            .unwrap();

        let conn = db.open_connection().unwrap();
        let rows: Vec<(i64, String)> = conn
            .prepare("SELECT id, department FROM departments ORDER BY id")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(rows, vec![(1, "Information Technology".to_string()), (2, "Sales".to_string())]);
    }

    #[tokio::test]
    async fn test_insert_only_identical_rerun_inserts_nothing() {
        let (db, _temp_dir) = setup_test_db();
        let orchestrator = orchestrator(&db, WriteStrategy::InsertOnly);

        orchestrator.run(three_files()).await.unwrap();
        let report = orchestrator.run(three_files()).await.unwrap();

        assert!(report.files.iter().all(|f| f.rows_written == 0));
        assert_eq!(count(&db, "employees"), 2);
        assert_eq!(count(&db, "departments"), 2);
    }

    #[tokio::test]
    async fn test_insert_only_changed_value_duplicates_key() {
        let (db, _temp_dir) = setup_test_db();
        let orchestrator = orchestrator(&db, WriteStrategy::InsertOnly);

        orchestrator.run(vec![UploadedFile::new("departments.csv", DEPARTMENTS_CSV)]).await.unwrap();
        let report = orchestrator
            .run(vec![UploadedFile::new("departments.csv", "id,department\n1,Information Technology\n2,Sales\n")])
            .await
            .unwrap();

        // Full-row comparison: id 1 with a new name is a new row, id 2 is unchanged
        assert_eq!(report.files[0].rows_written, 1);
        let conn = db.open_connection().unwrap();
        let with_key_1: i64 = conn
            .query_row("SELECT COUNT(*) FROM departments WHERE id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(with_key_1, 2);
    }

    #[tokio::test]
    async fn test_insert_only_by_key_skips_changed_value() {
        let (db, _temp_dir) = setup_test_db();
        let orchestrator = orchestrator(&db, WriteStrategy::InsertOnlyByKey);

        orchestrator.run(vec![UploadedFile::new("departments.csv", DEPARTMENTS_CSV)]).await.unwrap();
        let report = orchestrator
            .run(vec![UploadedFile::new("departments.csv", "1,Information Technology\n3,Legal\n")])
            .await
            .unwrap();

        assert_eq!(report.files[0].rows_written, 1);
        let conn = db.open_connection().unwrap();
        let name: String = conn
            .query_row("SELECT department FROM departments WHERE id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "IT");
        assert_eq!(count(&db, "departments"), 3);
    }

    #[tokio::test]
    async fn test_bad_timestamp_stored_as_null_and_still_joins() {
        let (db, _temp_dir) = setup_test_db();
        orchestrator(&db, WriteStrategy::Upsert)
            .run(vec![
                UploadedFile::new("hired_employees.csv", "7,Jane Roe,not-a-date,2,3\n"),
                UploadedFile::new("departments.csv", "2,Sales\n"),
                UploadedFile::new("jobs.csv", "3,Analyst\n"),
            ])
            .await
            .unwrap();

        let conn = db.open_connection().unwrap();
        let (hired_at, department, job): (Option<String>, String, String) = conn
            .query_row(
                "SELECT e.hired_at, d.department, j.job FROM employees e \
                 JOIN departments d ON e.department_id = d.id \
                 JOIN jobs j ON e.job_id = j.id WHERE e.id = 7",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(hired_at, None);
        assert_eq!(department, "Sales");
        assert_eq!(job, "Analyst");
    }

    #[tokio::test]
    async fn test_failure_on_second_file_leaves_nothing_visible() {
        let (db, _temp_dir) = setup_test_db();
        db.open_connection().unwrap().execute_batch("DROP TABLE jobs").unwrap();

        let err = orchestrator(&db, WriteStrategy::Upsert)
            .run(vec![
                UploadedFile::new("hired_employees.csv", EMPLOYEES_CSV),
                UploadedFile::new("jobs.csv", JOBS_CSV),
                UploadedFile::new("departments.csv", DEPARTMENTS_CSV),
            ])
            .await
            .unwrap_err();

        match err {
            StaffloadError::Write { file, .. } => assert_eq!(file, "jobs.csv"),
            other => panic!("expected write error, got {other:?}"),
        }
        assert_eq!(count(&db, "employees"), 0);
        assert_eq!(count(&db, "departments"), 0);
    }

    #[tokio::test]
    async fn test_per_file_commit_keeps_earlier_files() {
        let (db, _temp_dir) = setup_test_db();
        db.open_connection().unwrap().execute_batch("DROP TABLE jobs").unwrap();
        let orchestrator = IngestionOrchestrator::new(
            db.clone(),
            IngestOptions {
                commit_mode: CommitMode::PerFile,
                ..IngestOptions::default()
            },
        );

        let err = orchestrator
            .run(vec![
                UploadedFile::new("hired_employees.csv", EMPLOYEES_CSV),
                UploadedFile::new("jobs.csv", JOBS_CSV),
                UploadedFile::new("departments.csv", DEPARTMENTS_CSV),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, StaffloadError::Write { .. }));
        assert_eq!(count(&db, "employees"), 2);
        assert_eq!(count(&db, "departments"), 0);
    }

    #[tokio::test]
    async fn test_strict_coercion_fails_run_with_coercion_error() {
        let (db, _temp_dir) = setup_test_db();
        let orchestrator = IngestionOrchestrator::new(
            db.clone(),
            IngestOptions {
                coercion: CoercionPolicy::Strict,
                ..IngestOptions::default()
            },
        );

        let err = orchestrator
            .run(vec![
                UploadedFile::new("jobs.csv", JOBS_CSV),
                UploadedFile::new("hired_employees.csv", "7,Jane Roe,not-a-date,2,3\n"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, StaffloadError::Coercion { row: 1, .. }));
        assert_eq!(total_rows(&db), 0);
    }

    #[tokio::test]
    async fn test_unreachable_store_is_write_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db = Db::new(temp_dir.path().join("missing").join("test.db"));

        let err = orchestrator(&db, WriteStrategy::Upsert)
            .run(three_files())
            .await
            .unwrap_err();
        assert!(matches!(err, StaffloadError::Write { .. }));

        let err = orchestrator(&db, WriteStrategy::InsertOnly)
            .run(three_files())
            .await
            .unwrap_err();
        assert!(matches!(err, StaffloadError::Write { .. }));
    }

    #[tokio::test]
    async fn test_oversized_batch_option_is_clamped() {
        let (db, _temp_dir) = setup_test_db();
        let orchestrator = IngestionOrchestrator::new(
            db.clone(),
            IngestOptions {
                batch_size: 10_000,
                ..IngestOptions::default()
            },
        );
        let csv: String = (1..=6000).map(|i| format!("{i},E{i},2021-01-01T00:00:00Z,1,1\n")).collect();

        let report = orchestrator
            .run(vec![UploadedFile::new("hired_employees.csv", csv)])
            .await
            .unwrap();
        assert_eq!(report.files[0].rows_written, 6000);
        assert_eq!(count(&db, "employees"), 6000);
    }

    #[test]
    fn test_strategy_dedup_modes() {
        assert_eq!(WriteStrategy::Upsert.dedup_mode(), None);
        assert_eq!(WriteStrategy::InsertOnly.dedup_mode(), Some(DedupMode::FullRow));
        assert_eq!(WriteStrategy::InsertOnlyByKey.dedup_mode(), Some(DedupMode::Key));
    }
}
