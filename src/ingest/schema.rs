//! Static record schemas for the three loaded entity types.

use std::hash::Hash;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Value;
use serde::Serialize;

/// Wire and storage format of `hired_at`.
pub const HIRED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Declared column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Text,
    /// Nullable UTC timestamp in [`HIRED_AT_FORMAT`]
    Timestamp,
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

/// Columns, types and natural key of one table.
#[derive(Debug)]
pub struct RecordSchema {
    pub table: &'static str,
    pub columns: &'static [Column],
    pub key: &'static [&'static str],
}

impl RecordSchema {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Positions of the key columns within `columns`.
    pub fn key_indices(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| self.key.contains(&c.name))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Positions of the non-key columns within `columns`.
    pub fn value_indices(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !self.key.contains(&c.name))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Decode a stored row using the same column types the coercer produces.
    pub fn decode_row(&self, values: Vec<Value>) -> Vec<Field> {
        let mut values = values.into_iter();
        self.columns
            .iter()
            .map(|col| Field::decode(col.ty, values.next().unwrap_or(Value::Null)))
            .collect()
    }
}

pub static DEPARTMENTS: RecordSchema = RecordSchema {
    table: "departments",
    columns: &[
        Column { name: "id", ty: ColumnType::Int },
        Column { name: "department", ty: ColumnType::Text },
    ],
    key: &["id"],
};

pub static JOBS: RecordSchema = RecordSchema {
    table: "jobs",
    columns: &[
        Column { name: "id", ty: ColumnType::Int },
        Column { name: "job", ty: ColumnType::Text },
    ],
    key: &["id"],
};

pub static EMPLOYEES: RecordSchema = RecordSchema {
    table: "employees",
    columns: &[
        Column { name: "id", ty: ColumnType::Int },
        Column { name: "name", ty: ColumnType::Text },
        Column { name: "hired_at", ty: ColumnType::Timestamp },
        Column { name: "department_id", ty: ColumnType::Int },
        Column { name: "job_id", ty: ColumnType::Int },
    ],
    key: &["id"],
};

/// The entity a file loads into, recognised from its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    HireRecords,
    Departments,
    Jobs,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::HireRecords, EntityKind::Departments, EntityKind::Jobs];

    pub fn schema(self) -> &'static RecordSchema {
        match self {
            EntityKind::HireRecords => &EMPLOYEES,
            EntityKind::Departments => &DEPARTMENTS,
            EntityKind::Jobs => &JOBS,
        }
    }

    /// Word a filename must contain to load into this entity.
    pub fn keyword(self) -> &'static str {
        match self {
            EntityKind::HireRecords => "employees",
            EntityKind::Departments => "departments",
            EntityKind::Jobs => "jobs",
        }
    }

    /// Match a filename such as `hired_employees.csv` to its entity.
    ///
    /// The lowercased file stem must contain exactly one entity keyword.
    pub fn from_filename(filename: &str) -> Option<EntityKind> {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())?
            .to_lowercase();

        let mut matches = Self::ALL.into_iter().filter(|kind| stem.contains(kind.keyword()));
        match (matches.next(), matches.next()) {
            (Some(kind), None) => Some(kind),
            _ => None,
        }
    }
}

/// One typed column value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Int(i64),
    Text(String),
    Timestamp(Option<DateTime<Utc>>),
}

impl Field {
    pub fn to_sql(&self) -> Value {
        match self {
            Field::Int(v) => Value::Integer(*v),
            Field::Text(s) => Value::Text(s.clone()),
            Field::Timestamp(Some(ts)) => Value::Text(ts.format(HIRED_AT_FORMAT).to_string()),
            Field::Timestamp(None) => Value::Null,
        }
    }

    /// Decode a stored value; anything that does not fit the column type takes its default.
    pub fn decode(ty: ColumnType, value: Value) -> Field {
        match ty {
            ColumnType::Int => Field::Int(match value {
                Value::Integer(v) => v,
                Value::Real(f) if f.is_finite() => f as i64,
                Value::Text(s) => s.trim().parse().unwrap_or(0),
                _ => 0,
            }),
            ColumnType::Text => Field::Text(match value {
                Value::Text(s) => s,
                Value::Integer(v) => v.to_string(),
                Value::Real(f) => f.to_string(),
                _ => String::new(),
            }),
            ColumnType::Timestamp => Field::Timestamp(match value {
                Value::Text(s) => parse_timestamp(&s),
                _ => None,
            }),
        }
    }
}

/// Parse `YYYY-MM-DDThh:mm:ssZ`; anything else is `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), HIRED_AT_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// A typed record bound to its table schema.
pub trait Entity: Clone + Eq + Hash + Serialize + Send + Sync + 'static {
    const KIND: EntityKind;

    fn schema() -> &'static RecordSchema {
        Self::KIND.schema()
    }

    /// Build from fields ordered as the schema's columns.
    fn from_fields(fields: Vec<Field>) -> Self;

    /// Fields ordered as the schema's columns.
    fn to_fields(&self) -> Vec<Field>;

    fn key(&self) -> Vec<Field> {
        let fields = self.to_fields();
        Self::schema()
            .key_indices()
            .into_iter()
            .map(|idx| fields[idx].clone())
            .collect()
    }

    fn to_params(&self) -> Vec<Value> {
        self.to_fields().iter().map(Field::to_sql).collect()
    }
}

fn take_int(fields: &mut impl Iterator<Item = Field>) -> i64 {
    match fields.next() {
        Some(Field::Int(v)) => v,
        _ => 0,
    }
}

fn take_text(fields: &mut impl Iterator<Item = Field>) -> String {
    match fields.next() {
        Some(Field::Text(s)) => s,
        _ => String::new(),
    }
}

fn take_timestamp(fields: &mut impl Iterator<Item = Field>) -> Option<DateTime<Utc>> {
    match fields.next() {
        Some(Field::Timestamp(ts)) => ts,
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Department {
    pub id: i64,
    pub department: String,
}

impl Entity for Department {
    const KIND: EntityKind = EntityKind::Departments;

    fn from_fields(fields: Vec<Field>) -> Self {
        let mut fields = fields.into_iter();
        Self {
            id: take_int(&mut fields),
            department: take_text(&mut fields),
        }
    }

    fn to_fields(&self) -> Vec<Field> {
        vec![Field::Int(self.id), Field::Text(self.department.clone())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Job {
    pub id: i64,
    pub job: String,
}

impl Entity for Job {
    const KIND: EntityKind = EntityKind::Jobs;

    fn from_fields(fields: Vec<Field>) -> Self {
        let mut fields = fields.into_iter();
        Self {
            id: take_int(&mut fields),
            job: take_text(&mut fields),
        }
    }

    fn to_fields(&self) -> Vec<Field> {
        vec![Field::Int(self.id), Field::Text(self.job.clone())]
    }
}

/// One row of the `employees` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HireRecord {
    pub id: i64,
    pub name: String,
    pub hired_at: Option<DateTime<Utc>>,
    pub department_id: i64,
    pub job_id: i64,
}

impl Entity for HireRecord {
    const KIND: EntityKind = EntityKind::HireRecords;

    fn from_fields(fields: Vec<Field>) -> Self {
        let mut fields = fields.into_iter();
        Self {
            id: take_int(&mut fields),
            name: take_text(&mut fields),
            hired_at: take_timestamp(&mut fields),
            department_id: take_int(&mut fields),
            job_id: take_int(&mut fields),
        }
    }

    fn to_fields(&self) -> Vec<Field> {
        vec![
            Field::Int(self.id),
            Field::Text(self.name.clone()),
            Field::Timestamp(self.hired_at),
            Field::Int(self.department_id),
            Field::Int(self.job_id),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_from_filename() {
        assert_eq!(EntityKind::from_filename("hired_employees.csv"), Some(EntityKind::HireRecords));
        assert_eq!(EntityKind::from_filename("Departments.CSV"), Some(EntityKind::Departments));
        assert_eq!(EntityKind::from_filename("jobs.csv"), Some(EntityKind::Jobs));
        assert_eq!(EntityKind::from_filename("salaries.csv"), None);
        // Ambiguous names are not guessed
        assert_eq!(EntityKind::from_filename("employees_jobs.csv"), None);
        // Only the stem counts
        assert_eq!(EntityKind::from_filename("jobs/report.csv"), None);
    }

    #[test]
    fn test_key_and_value_indices() {
        assert_eq!(EMPLOYEES.key_indices(), vec![0]);
        assert_eq!(EMPLOYEES.value_indices(), vec![1, 2, 3, 4]);
        assert_eq!(DEPARTMENTS.column_names(), vec!["id", "department"]);
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2021-07-27T16:02:08Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2021, 7, 27, 16, 2, 8).unwrap());
        assert!(parse_timestamp("not-a-date").is_none());
        assert!(parse_timestamp("2021-07-27").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_timestamp_stored_in_source_format() {
        let ts = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            Field::Timestamp(Some(ts)).to_sql(),
            Value::Text("2021-01-01T00:00:00Z".to_string())
        );
        assert_eq!(Field::Timestamp(None).to_sql(), Value::Null);
    }

    #[test]
    fn test_decode_row_defaults() {
        let fields = EMPLOYEES.decode_row(vec![
            Value::Integer(7),
            Value::Null,
            Value::Text("garbage".into()),
            Value::Real(2.0),
        ]);
        let record = HireRecord::from_fields(fields);
        assert_eq!(
            record,
            HireRecord {
                id: 7,
                name: String::new(),
                hired_at: None,
                department_id: 2,
                job_id: 0,
            }
        );
    }

    #[test]
    fn test_entity_key() {
        let job = Job { id: 4, job: "Engineer".to_string() };
        assert_eq!(job.key(), vec![Field::Int(4)]);
        assert_eq!(job.to_params(), vec![Value::Integer(4), Value::Text("Engineer".into())]);
    }
}
