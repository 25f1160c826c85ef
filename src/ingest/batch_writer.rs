use rusqlite::types::Value;

use super::schema::{Entity, RecordSchema};
use crate::db::Storage;
use crate::error::Result;

/// Default number of records per batch
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Largest batch a multi-row insert may carry without exceeding SQLite's bound-parameter limit
/// for the widest table (5 columns).
pub const MAX_BATCH_SIZE: usize = 5000;

/// Records to write for one file, and how to write them
#[derive(Debug, Clone, PartialEq)]
pub enum WritePlan<E> {
    /// Plain inserts of rows already known to be absent
    Insert(Vec<E>),
    /// Per-record merges matched on the natural key
    Merge(Vec<E>),
}

impl<E> WritePlan<E> {
    pub fn len(&self) -> usize {
        match self {
            WritePlan::Insert(records) | WritePlan::Merge(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of writing one plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub inserted: usize,
    pub updated: usize,
    pub batches: usize,
}

impl WriteStats {
    pub fn written(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Writes plans in fixed-size batches through a storage session.
///
/// Nothing is committed here; the caller decides when the session commits.
#[derive(Debug, Clone, Copy)]
pub struct BatchWriter {
    batch_size: usize,
}

impl Default for BatchWriter {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchWriter {
    /// Batch sizes outside `1..=MAX_BATCH_SIZE` are clamped into range.
    pub fn new(batch_size: usize) -> Self {
        let clamped = batch_size.clamp(1, MAX_BATCH_SIZE);
        if clamped != batch_size {
            log::warn!("Batch size {} out of range, using {}", batch_size, clamped);
        }
        Self { batch_size: clamped }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn write<E: Entity, S: Storage>(&self, storage: &mut S, plan: &WritePlan<E>) -> Result<WriteStats> {
        match plan {
            WritePlan::Insert(records) => self.insert_batches(storage, records),
            WritePlan::Merge(records) => self.merge_batches(storage, records),
        }
    }

    /// One multi-row INSERT statement per batch.
    fn insert_batches<E: Entity, S: Storage>(&self, storage: &mut S, records: &[E]) -> Result<WriteStats> {
        let schema = E::schema();
        let mut stats = WriteStats::default();

        for batch in records.chunks(self.batch_size) {
            let sql = multi_row_insert_sql(schema, batch.len());
            let params: Vec<Value> = batch.iter().flat_map(Entity::to_params).collect();
            stats.inserted += storage.execute(&sql, &params)?;
            stats.batches += 1;
            log::debug!(
                "{}: batch {} inserted {} rows",
                schema.table,
                stats.batches,
                batch.len()
            );
        }

        Ok(stats)
    }

    /// One merge per record: an UPDATE keyed on the natural key, then an INSERT for every
    /// record whose UPDATE matched nothing. The batch only bounds how many merges run per step.
    fn merge_batches<E: Entity, S: Storage>(&self, storage: &mut S, records: &[E]) -> Result<WriteStats> {
        let schema = E::schema();
        let update_sql = update_by_key_sql(schema);
        let insert_sql = multi_row_insert_sql(schema, 1);
        let key_indices = schema.key_indices();
        let value_indices = schema.value_indices();
        let mut stats = WriteStats::default();

        for batch in records.chunks(self.batch_size) {
            let rows: Vec<Vec<Value>> = batch.iter().map(Entity::to_params).collect();
            let update_params: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    value_indices
                        .iter()
                        .chain(key_indices.iter())
                        .map(|&idx| row[idx].clone())
                        .collect()
                })
                .collect();

            let matched = storage.execute_batch(&update_sql, &update_params)?;
            let misses: Vec<Vec<Value>> = rows
                .into_iter()
                .zip(matched)
                .filter(|(_, affected)| *affected == 0)
                .map(|(row, _)| row)
                .collect();

            if !misses.is_empty() {
                storage.execute_batch(&insert_sql, &misses)?;
            }

            stats.updated += batch.len() - misses.len();
            stats.inserted += misses.len();
            stats.batches += 1;
            log::debug!(
                "{}: merge batch {} ({} updated, {} inserted)",
                schema.table,
                stats.batches,
                batch.len() - misses.len(),
                misses.len()
            );
        }

        Ok(stats)
    }
}

/// `INSERT INTO t (a, b) VALUES (?, ?), (?, ?), ...` for `rows` rows.
fn multi_row_insert_sql(schema: &RecordSchema, rows: usize) -> String {
    let placeholders = format!("({})", vec!["?"; schema.columns.len()].join(", "));
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        schema.table,
        schema.column_names().join(", "),
        vec![placeholders; rows].join(", ")
    )
}

/// `UPDATE t SET <value cols> = ? WHERE <key cols> = ?`, value parameters first.
fn update_by_key_sql(schema: &RecordSchema) -> String {
    let value_columns: Vec<&str> = schema
        .value_indices()
        .into_iter()
        .map(|idx| schema.columns[idx].name)
        .collect();
    let assignments = if value_columns.is_empty() {
        // Key-only table: a match is all that matters
        schema.key.iter().map(|k| format!("{k} = {k}")).collect::<Vec<_>>()
    } else {
        value_columns.iter().map(|c| format!("{c} = ?")).collect()
    };
    let condition: Vec<String> = schema.key.iter().map(|k| format!("{k} = ?")).collect();

    format!(
        "UPDATE {} SET {} WHERE {}",
        schema.table,
        assignments.join(", "),
        condition.join(" AND ")
    )
}
