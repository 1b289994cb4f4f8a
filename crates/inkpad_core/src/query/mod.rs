//! Live list queries and the change-notification contract.
//!
//! # Responsibility
//! - Describe list subscriptions: record kind, optional notebook filter,
//!   sort order.
//! - Define the batched delta protocol delivered after every commit.
//!
//! # Invariants
//! - Every delivered batch is bracketed: one `will_change`, zero or more
//!   deltas, one `did_change`.
//! - Delete indices refer to the previous snapshot, insert indices to the
//!   new one.
//! - The list has at most one section, existing while the snapshot is
//!   non-empty; only the empty/non-empty transitions emit section deltas.
//! - The protocol has no row-update or row-move variant. A diff that would
//!   need one fails the commit cycle instead (see [`QueryError`]).

use crate::model::{Note, Notebook, RecordId, RecordKind};
use crate::repo::{
    NoteRepository, NotebookRepository, RepoResult, SortOrder, SqliteNoteRepository,
    SqliteNotebookRepository,
};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod diff;

pub(crate) use diff::diff_rows;

pub type QueryResult<T> = Result<T, QueryError>;

/// Errors from subscription setup and the per-commit diff cycle.
#[derive(Debug)]
pub enum QueryError {
    /// The notebook filter only applies to note subscriptions.
    FilterNotApplicable { kind: RecordKind },
    /// A surviving row's creation date changed between snapshots.
    ///
    /// Creation dates are immutable by contract; a change here means the
    /// stored data was corrupted out-of-band.
    CreationDateChanged(RecordId),
    /// A surviving row changed relative position without an insert or
    /// delete explaining it. The change protocol has no move variant.
    RowMoved(RecordId),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FilterNotApplicable { kind } => {
                write!(f, "notebook filter is not applicable to {kind:?} queries")
            }
            Self::CreationDateChanged(id) => {
                write!(f, "creation date changed for live row {id}")
            }
            Self::RowMoved(id) => write!(
                f,
                "live row {id} moved without an insert/delete; the change protocol has no move variant"
            ),
        }
    }
}

impl Error for QueryError {}

/// Description of one live list subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Record kind this subscription tracks.
    pub kind: RecordKind,
    /// Equality filter on the owning notebook. Notes only.
    pub notebook: Option<RecordId>,
    /// Snapshot ordering. Newest-first by default.
    pub sort: SortOrder,
}

impl ListQuery {
    /// All notebooks, newest first.
    pub fn notebooks() -> Self {
        Self {
            kind: RecordKind::Notebook,
            notebook: None,
            sort: SortOrder::default(),
        }
    }

    /// All notes across notebooks, newest first.
    pub fn all_notes() -> Self {
        Self {
            kind: RecordKind::Note,
            notebook: None,
            sort: SortOrder::default(),
        }
    }

    /// Notes owned by one notebook, newest first.
    pub fn notes_in(notebook: RecordId) -> Self {
        Self {
            kind: RecordKind::Note,
            notebook: Some(notebook),
            sort: SortOrder::default(),
        }
    }

    /// Overrides the snapshot ordering.
    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub(crate) fn validate(&self) -> QueryResult<()> {
        if self.kind == RecordKind::Notebook && self.notebook.is_some() {
            return Err(QueryError::FilterNotApplicable { kind: self.kind });
        }
        Ok(())
    }
}

/// One row of a live snapshot.
///
/// A flattened read model over both record kinds, so one observer protocol
/// serves both list screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    /// Stable record id.
    pub id: RecordId,
    /// Record kind of this row.
    pub kind: RecordKind,
    /// Notebook name or note body, depending on kind.
    pub display_text: String,
    /// Sort key. Immutable for the record's lifetime.
    pub creation_date: i64,
    /// Owning notebook for note rows, `None` for notebook rows.
    pub notebook: Option<RecordId>,
}

impl ListRow {
    fn from_notebook(notebook: Notebook) -> Self {
        Self {
            id: notebook.uuid,
            kind: RecordKind::Notebook,
            display_text: notebook.name,
            creation_date: notebook.creation_date,
            notebook: None,
        }
    }

    fn from_note(note: Note) -> Self {
        Self {
            id: note.uuid,
            kind: RecordKind::Note,
            display_text: note.text,
            creation_date: note.creation_date,
            notebook: Some(note.notebook_uuid),
        }
    }
}

/// Structural change between two consecutive snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum ListDelta {
    /// Row appeared at `index` in the new snapshot.
    RowInsert { index: usize, row: ListRow },
    /// Row at `index` in the previous snapshot is gone.
    RowDelete { index: usize },
    /// The section materialized (snapshot went empty to non-empty).
    SectionInsert { index: usize },
    /// The section vanished (snapshot went non-empty to empty).
    SectionDelete { index: usize },
}

/// Listener side of a subscription. One observer per subscription.
///
/// Callbacks run under the store lock, on whichever thread performed the
/// commit. Observers must not call mutating store APIs from a callback;
/// [`ObserverHandle::unsubscribe`] is the only permitted store interaction.
pub trait ListObserver: Send {
    /// Opens a batch. Always paired with [`ListObserver::did_change`].
    fn will_change(&mut self);
    /// Delivers one delta of the current batch.
    fn apply(&mut self, delta: ListDelta);
    /// Closes the batch. The whole batch is one atomic UI transition.
    fn did_change(&mut self);
}

/// Cancellation handle for one subscription.
///
/// Cloneable; any clone cancels the same subscription. Unsubscribing is
/// idempotent and safe from inside a notification callback: an in-flight
/// batch still completes, and delivery stops from the next commit cycle.
#[derive(Debug, Clone)]
pub struct ObserverHandle {
    cancelled: Arc<AtomicBool>,
}

impl ObserverHandle {
    pub fn unsubscribe(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the subscription still receives notifications.
    pub fn is_active(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst)
    }
}

/// Registered subscription state owned by the store.
pub(crate) struct Subscription {
    pub(crate) query: ListQuery,
    pub(crate) rows: Vec<ListRow>,
    pub(crate) observer: Box<dyn ListObserver>,
    cancelled: Arc<AtomicBool>,
}

impl Subscription {
    pub(crate) fn new(
        query: ListQuery,
        rows: Vec<ListRow>,
        observer: Box<dyn ListObserver>,
    ) -> (Self, ObserverHandle) {
        let cancelled = Arc::new(AtomicBool::new(false));
        let handle = ObserverHandle {
            cancelled: Arc::clone(&cancelled),
        };
        (
            Self {
                query,
                rows,
                observer,
                cancelled,
            },
            handle,
        )
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn is_owned_by(&self, handle: &ObserverHandle) -> bool {
        Arc::ptr_eq(&self.cancelled, &handle.cancelled)
    }
}

/// Runs the full fetch backing a subscription snapshot.
pub(crate) fn fetch_rows(conn: &Connection, query: &ListQuery) -> RepoResult<Vec<ListRow>> {
    match query.kind {
        RecordKind::Notebook => {
            let notebooks = SqliteNotebookRepository::new(conn).list_notebooks(query.sort)?;
            Ok(notebooks.into_iter().map(ListRow::from_notebook).collect())
        }
        RecordKind::Note => {
            let notes = SqliteNoteRepository::new(conn).list_notes(query.notebook, query.sort)?;
            Ok(notes.into_iter().map(ListRow::from_note).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ListQuery, QueryError};
    use crate::model::RecordKind;
    use uuid::Uuid;

    #[test]
    fn notebook_query_rejects_notebook_filter() {
        let mut query = ListQuery::notebooks();
        query.notebook = Some(Uuid::new_v4());
        let err = query.validate().unwrap_err();
        assert!(matches!(
            err,
            QueryError::FilterNotApplicable {
                kind: RecordKind::Notebook
            }
        ));
    }

    #[test]
    fn note_queries_validate() {
        assert!(ListQuery::all_notes().validate().is_ok());
        assert!(ListQuery::notes_in(Uuid::new_v4()).validate().is_ok());
    }
}
