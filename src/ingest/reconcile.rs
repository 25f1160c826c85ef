//! Upsert reconciliation by natural key.
//!
//! No existing state is read: each surviving record becomes one merge that storage resolves as
//! "update the row with this key" or "insert it". Running the same file twice therefore
//! converges to the same table contents.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::schema::{Entity, Field};

/// One merge per distinct key.
///
/// A key repeated within `incoming` keeps the values of its last occurrence at the position of
/// its first, which is what applying every row as a sequential merge would leave behind.
pub fn reconcile<E: Entity>(incoming: Vec<E>) -> Vec<E> {
    let mut positions: HashMap<Vec<Field>, usize> = HashMap::with_capacity(incoming.len());
    let mut merges: Vec<E> = Vec::with_capacity(incoming.len());

    for record in incoming {
        match positions.entry(record.key()) {
            Entry::Occupied(slot) => merges[*slot.get()] = record,
            Entry::Vacant(slot) => {
                slot.insert(merges.len());
                merges.push(record);
            }
        }
    }

    merges
}
