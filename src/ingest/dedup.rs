//! Insert-only deduplication against existing stored state.

use std::collections::HashSet;

use super::schema::{Entity, Field};

/// What counts as "already present" on the insert-only path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupMode {
    /// Entire row must match. A stored key with different values does not block an insert,
    /// so the same key can end up stored twice.
    FullRow,
    /// Key must match; values are not compared.
    Key,
}

/// Incoming records absent from `existing`, in incoming order.
///
/// Repeats within `incoming` collapse to their first occurrence under the same rule.
pub fn dedup_against<E: Entity>(incoming: Vec<E>, existing: &[E], mode: DedupMode) -> Vec<E> {
    match mode {
        DedupMode::FullRow => {
            let mut seen: HashSet<E> = existing.iter().cloned().collect();
            incoming
                .into_iter()
                .filter(|record| seen.insert(record.clone()))
                .collect()
        }
        DedupMode::Key => {
            let mut seen: HashSet<Vec<Field>> = existing.iter().map(Entity::key).collect();
            incoming
                .into_iter()
                .filter(|record| seen.insert(record.key()))
                .collect()
        }
    }
}
