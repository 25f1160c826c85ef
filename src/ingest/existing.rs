//! Existing-state reads: the full current contents of a target table.
//!
//! Tables are read whole; the expected ceiling is a few hundred thousand rows. If that grows,
//! this is where a streaming or keyed-lookup read would go.

use std::collections::HashMap;

use futures_util::future::try_join_all;

use super::schema::{Entity, EntityKind, Field, RecordSchema};
use crate::db::{Db, Storage};
use crate::error::{Result, StaffloadError};

/// Read every stored row of `schema.table`, decoded with the schema's column types.
pub fn read_rows<S: Storage>(storage: &mut S, schema: &RecordSchema) -> Result<Vec<Vec<Field>>> {
    let sql = format!(
        "SELECT {} FROM {}",
        schema.column_names().join(", "),
        schema.table
    );
    let rows = storage.query(&sql, &[])?;
    Ok(rows.into_iter().map(|row| schema.decode_row(row)).collect())
}

/// Read every stored record of entity `E`.
pub fn read_table<E: Entity, S: Storage>(storage: &mut S) -> Result<Vec<E>> {
    Ok(read_rows(storage, E::schema())?
        .into_iter()
        .map(E::from_fields)
        .collect())
}

/// Decoded contents of several tables, taken before a run writes anything.
#[derive(Debug, Default)]
pub struct ExistingState {
    tables: HashMap<EntityKind, Vec<Vec<Field>>>,
}

impl ExistingState {
    /// Stored records of `E`; empty when its table was not part of the snapshot.
    pub fn records<E: Entity>(&self) -> Vec<E> {
        self.tables
            .get(&E::KIND)
            .map(|rows| rows.iter().cloned().map(E::from_fields).collect())
            .unwrap_or_default()
    }

    pub fn row_count(&self, kind: EntityKind) -> usize {
        self.tables.get(&kind).map_or(0, Vec::len)
    }
}

/// Snapshot the given tables, reading them in parallel on separate connections.
///
/// Each read targets a different table and only sees committed data.
pub async fn snapshot(db: &Db, kinds: &[EntityKind]) -> Result<ExistingState> {
    let reads = kinds.iter().map(|&kind| {
        let db = db.clone();
        async move {
            let rows = db
                .with_session(move |session| read_rows(session, kind.schema()))
                .await?;
            log::debug!("Read {} existing rows from {}", rows.len(), kind.schema().table);
            Ok::<_, StaffloadError>((kind, rows))
        }
    });

    let tables = try_join_all(reads).await?.into_iter().collect();
    Ok(ExistingState { tables })
}
