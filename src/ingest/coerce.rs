//! Raw CSV rows → typed records.
//!
//! Under the default [`CoercionPolicy::Lenient`] policy coercion never fails: a missing or
//! unparseable integer becomes `0`, a missing string becomes `""`, and an unparseable timestamp
//! becomes null. This keeps every row loadable at the cost of silently normalised data (a missing
//! id becomes `0` and may collide). [`CoercionPolicy::Strict`] rejects such rows instead and
//! reports them as [`StaffloadError::Coercion`].

use csv::ReaderBuilder;
use serde::Deserialize;

use super::schema::{parse_timestamp, ColumnType, Entity, Field, RecordSchema};
use crate::error::{Result, StaffloadError};

/// How the coercer treats missing and malformed values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionPolicy {
    /// Fill defaults, never reject a row
    #[default]
    Lenient,
    /// Reject rows with missing or malformed values
    Strict,
}

/// One CSV row as read from the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line in the source file
    pub line: usize,
    pub fields: Vec<String>,
}

impl RawRow {
    /// Field at `idx`, `None` when absent or empty.
    fn get(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).map(String::as_str).filter(|s| !s.is_empty())
    }
}

/// Read every data row of a CSV payload.
///
/// Files may or may not carry a header: a first row whose first field names the schema's first
/// column is treated as a header and skipped. Empty lines never reach here (the reader skips
/// them), but a delimiter-only row such as `,,,,` is kept and coerced to defaults like any
/// other row with missing values. Invalid UTF-8 is replaced rather than rejected.
pub fn read_raw_rows(bytes: &[u8], schema: &RecordSchema) -> Vec<RawRow> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let header_name = schema.columns.first().map(|c| c.name).unwrap_or("");
    let mut rows = Vec::new();

    for (idx, result) in reader.byte_records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping unreadable CSV record {} for {}: {}", idx + 1, schema.table, e);
                continue;
            }
        };

        let fields: Vec<String> = record
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();

        if rows.is_empty()
            && fields
                .first()
                .is_some_and(|f| f.trim().eq_ignore_ascii_case(header_name))
        {
            log::debug!("Skipping header row for {}", schema.table);
            continue;
        }

        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);
        rows.push(RawRow { line, fields });
    }

    rows
}

/// Integer from a CSV cell, accepting float-formatted integral values like `3.0`.
fn parse_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

/// Coerce one raw row into fields ordered as `schema.columns`.
pub fn coerce_row(
    row: &RawRow,
    schema: &RecordSchema,
    policy: CoercionPolicy,
    file: &str,
) -> Result<Vec<Field>> {
    let reject = |column: &'static str, value: Option<&str>| StaffloadError::Coercion {
        file: file.to_string(),
        row: row.line,
        column,
        value: value.unwrap_or("").to_string(),
    };

    let mut fields = Vec::with_capacity(schema.columns.len());
    for (idx, column) in schema.columns.iter().enumerate() {
        let raw = row.get(idx);
        let field = match column.ty {
            ColumnType::Int => match (raw.and_then(parse_int), policy) {
                (Some(v), _) => Field::Int(v),
                (None, CoercionPolicy::Lenient) => Field::Int(0),
                (None, CoercionPolicy::Strict) => return Err(reject(column.name, raw)),
            },
            ColumnType::Text => match (raw, policy) {
                (Some(s), _) => Field::Text(s.to_string()),
                (None, CoercionPolicy::Lenient) => Field::Text(String::new()),
                (None, CoercionPolicy::Strict) => return Err(reject(column.name, raw)),
            },
            ColumnType::Timestamp => match (raw, raw.and_then(parse_timestamp), policy) {
                (Some(s), None, CoercionPolicy::Strict) => return Err(reject(column.name, Some(s))),
                (_, ts, _) => Field::Timestamp(ts),
            },
        };
        fields.push(field);
    }

    Ok(fields)
}

/// Coerce every raw row of a file into typed records.
pub fn coerce_records<E: Entity>(rows: &[RawRow], policy: CoercionPolicy, file: &str) -> Result<Vec<E>> {
    rows.iter()
        .map(|row| coerce_row(row, E::schema(), policy, file).map(E::from_fields))
        .collect()
}
