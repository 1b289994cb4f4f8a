//! Entity model for notebook/note records.
//!
//! # Responsibility
//! - Define the two persisted record kinds and their shared identity rules.
//! - Stamp creation metadata exactly once, at construction.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another record.
//! - `creation_date` is assigned at construction and never mutated afterwards.

use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub mod note;
pub mod notebook;

pub use note::Note;
pub use notebook::Notebook;

/// Stable identifier shared by both record kinds.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type RecordId = Uuid;

/// The two persisted record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Named container owning an ordered set of notes.
    Notebook,
    /// Free-text entry belonging to exactly one notebook.
    Note,
}

/// Current wall-clock time in epoch milliseconds.
///
/// Creation dates sort list snapshots; ties are broken by `uuid` at query
/// time, so millisecond resolution is sufficient.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::now_epoch_ms;

    #[test]
    fn now_epoch_ms_is_positive_and_non_decreasing() {
        let first = now_epoch_ms();
        let second = now_epoch_ms();
        assert!(first > 0);
        assert!(second >= first);
    }
}
