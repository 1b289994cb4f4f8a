//! Working context: the staged-mutation buffer behind `commit()`.
//!
//! # Responsibility
//! - Hold mutations in order until the next commit makes them durable.
//!
//! # Invariants
//! - Staged order is the apply order inside the commit transaction.
//! - `take()` leaves the context empty; a failed batch is not re-staged.

use crate::model::{Note, Notebook, RecordId};

/// One staged mutation awaiting commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingChange {
    InsertNotebook(Notebook),
    RenameNotebook { id: RecordId, name: String },
    DeleteNotebook(RecordId),
    InsertNote(Note),
    EditNoteText { id: RecordId, text: String },
    DeleteNote(RecordId),
}

/// Ordered buffer of staged mutations.
#[derive(Debug, Default)]
pub(crate) struct WorkingContext {
    staged: Vec<PendingChange>,
}

impl WorkingContext {
    pub(crate) fn stage(&mut self, change: PendingChange) {
        self.staged.push(change);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.staged.len()
    }

    /// Drains the buffer for one commit attempt.
    pub(crate) fn take(&mut self) -> Vec<PendingChange> {
        std::mem::take(&mut self.staged)
    }
}
