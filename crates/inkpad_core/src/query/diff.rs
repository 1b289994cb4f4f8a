//! Snapshot differ producing the minimal delta batch.
//!
//! # Responsibility
//! - Compute row/section deltas between two consecutive snapshots.
//! - Enforce that surviving rows neither move nor change their sort key.
//!
//! # Invariants
//! - Emit order: row deletes (ascending old index), section delete,
//!   section insert, row inserts (ascending new index). At most one of the
//!   two section deltas can occur per batch.
//! - In-place field edits on surviving rows produce no delta.

use super::{ListDelta, ListRow, QueryError, QueryResult};
use crate::model::RecordId;
use std::collections::HashMap;

/// Diffs `old` against `new`, both ordered by the subscription's sort.
pub(crate) fn diff_rows(old: &[ListRow], new: &[ListRow]) -> QueryResult<Vec<ListDelta>> {
    let old_positions: HashMap<RecordId, usize> = old
        .iter()
        .enumerate()
        .map(|(index, row)| (row.id, index))
        .collect();
    let new_positions: HashMap<RecordId, usize> = new
        .iter()
        .enumerate()
        .map(|(index, row)| (row.id, index))
        .collect();

    check_survivors(old, &old_positions, new, &new_positions)?;

    let mut deltas = Vec::new();

    for (index, row) in old.iter().enumerate() {
        if !new_positions.contains_key(&row.id) {
            deltas.push(ListDelta::RowDelete { index });
        }
    }

    if !old.is_empty() && new.is_empty() {
        deltas.push(ListDelta::SectionDelete { index: 0 });
    }
    if old.is_empty() && !new.is_empty() {
        deltas.push(ListDelta::SectionInsert { index: 0 });
    }

    for (index, row) in new.iter().enumerate() {
        if !old_positions.contains_key(&row.id) {
            deltas.push(ListDelta::RowInsert {
                index,
                row: row.clone(),
            });
        }
    }

    Ok(deltas)
}

/// Rows present in both snapshots must keep their sort key and their
/// relative order; anything else would need an update/move delta, which
/// the protocol does not define.
fn check_survivors(
    old: &[ListRow],
    old_positions: &HashMap<RecordId, usize>,
    new: &[ListRow],
    new_positions: &HashMap<RecordId, usize>,
) -> QueryResult<()> {
    for row in old {
        let Some(&new_index) = new_positions.get(&row.id) else {
            continue;
        };
        if new[new_index].creation_date != row.creation_date {
            return Err(QueryError::CreationDateChanged(row.id));
        }
    }

    let survivors_in_old: Vec<RecordId> = old
        .iter()
        .filter(|row| new_positions.contains_key(&row.id))
        .map(|row| row.id)
        .collect();
    let survivors_in_new: Vec<RecordId> = new
        .iter()
        .filter(|row| old_positions.contains_key(&row.id))
        .map(|row| row.id)
        .collect();

    for (from_old, from_new) in survivors_in_old.iter().zip(survivors_in_new.iter()) {
        if from_old != from_new {
            return Err(QueryError::RowMoved(*from_new));
        }
    }

    Ok(())
}
