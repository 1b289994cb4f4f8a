//! Store lifecycle: database handle, working context, commit, autosave.
//!
//! # Responsibility
//! - Own the single database connection and the single working context.
//! - Apply staged mutations atomically and drive the observer cycle.
//! - Own the autosave task and stop it when the store closes.
//!
//! # Invariants
//! - All reads and writes funnel through the store's lock: at most one
//!   in-flight mutation, and a committed mutation is visible to the next
//!   fetch-or-diff cycle before any later mutation is accepted.
//! - Commit is a no-op when the working context is empty.
//! - Commit errors are surfaced to the caller; only autosave ticks degrade
//!   to logging them.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::{Note, Notebook, RecordId};
use crate::query::{
    diff_rows, fetch_rows, ListObserver, ListQuery, ListRow, ObserverHandle, QueryError,
    Subscription,
};
use crate::repo::{
    NoteRepository, NotebookRepository, RepoError, SortOrder, SqliteNoteRepository,
    SqliteNotebookRepository,
};
use log::{debug, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

mod autosave;
mod context;

use autosave::AutosaveHandle;
use context::{PendingChange, WorkingContext};

/// Autosave cadence used when the embedding application has no opinion.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by store lifecycle and commit operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Repo(RepoError),
    Query(QueryError),
    /// A commit batch failed and was discarded. `dropped` counts the staged
    /// changes that were lost with it.
    CommitFailed { dropped: usize, source: RepoError },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::CommitFailed { dropped, source } => write!(
                f,
                "commit failed, {dropped} staged change(s) discarded: {source}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::CommitFailed { source, .. } => Some(source),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<QueryError> for StoreError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

/// Lock-guarded store state shared with the autosave thread.
pub(crate) struct StoreInner {
    conn: Connection,
    pub(crate) context: WorkingContext,
    subscriptions: Vec<Subscription>,
}

/// Owner of one persistent database and its working context.
///
/// Pass the store explicitly to every consumer; there is no process-global
/// instance. Consumers issue mutations, call [`Store::commit`], and receive
/// batched deltas through their subscriptions.
pub struct Store {
    inner: Arc<Mutex<StoreInner>>,
    autosave: Option<AutosaveHandle>,
}

impl Store {
    /// Opens (or creates) the named database file.
    ///
    /// Migration failures, including a schema version newer than this
    /// binary supports, are unrecoverable here: there is no retry or
    /// repair path, and the application is expected to treat the error as
    /// fatal.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = open_db(path)?;
        info!("event=store_open module=store status=ok mode=file");
        Ok(Self::from_connection(conn))
    }

    /// Opens an in-memory store. Used by tests and the smoke CLI.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = open_db_in_memory()?;
        info!("event=store_open module=store status=ok mode=memory");
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                conn,
                context: WorkingContext::default(),
                subscriptions: Vec::new(),
            })),
            autosave: None,
        }
    }

    // ---- staging -------------------------------------------------------

    /// Stages a new notebook and returns it. Durable after the next commit.
    pub fn create_notebook(&self, name: impl Into<String>) -> Notebook {
        let notebook = Notebook::new(name);
        let mut inner = self.lock();
        debug!(
            "event=stage module=store action=create_notebook id={}",
            notebook.uuid
        );
        inner
            .context
            .stage(PendingChange::InsertNotebook(notebook.clone()));
        notebook
    }

    /// Stages a notebook rename. The creation date is untouched.
    pub fn rename_notebook(&self, id: RecordId, name: impl Into<String>) {
        let mut inner = self.lock();
        debug!("event=stage module=store action=rename_notebook id={id}");
        inner.context.stage(PendingChange::RenameNotebook {
            id,
            name: name.into(),
        });
    }

    /// Stages a notebook delete. Owned notes go with it, atomically.
    pub fn delete_notebook(&self, id: RecordId) {
        let mut inner = self.lock();
        debug!("event=stage module=store action=delete_notebook id={id}");
        inner.context.stage(PendingChange::DeleteNotebook(id));
    }

    /// Stages a new note with placeholder text and returns it.
    pub fn create_note(&self, notebook_uuid: RecordId) -> Note {
        let note = Note::new(notebook_uuid);
        let mut inner = self.lock();
        debug!(
            "event=stage module=store action=create_note id={} notebook={}",
            note.uuid, notebook_uuid
        );
        inner.context.stage(PendingChange::InsertNote(note.clone()));
        note
    }

    /// Stages a note body edit. The creation date is untouched.
    pub fn edit_note(&self, id: RecordId, text: impl Into<String>) {
        let mut inner = self.lock();
        debug!("event=stage module=store action=edit_note id={id}");
        inner.context.stage(PendingChange::EditNoteText {
            id,
            text: text.into(),
        });
    }

    /// Stages a note delete.
    pub fn delete_note(&self, id: RecordId) {
        let mut inner = self.lock();
        debug!("event=stage module=store action=delete_note id={id}");
        inner.context.stage(PendingChange::DeleteNote(id));
    }

    /// Whether the working context holds staged, uncommitted mutations.
    pub fn has_changes(&self) -> bool {
        !self.lock().context.is_empty()
    }

    // ---- commit --------------------------------------------------------

    /// Flushes staged mutations to durable storage and runs one observer
    /// diff-and-notify cycle. No-op when nothing is staged.
    ///
    /// A failed batch is discarded: replaying it on every later commit
    /// would wedge the store behind one poison mutation. The error reports
    /// how many staged changes were lost.
    pub fn commit(&self) -> StoreResult<()> {
        self.lock().commit()
    }

    // ---- reads ---------------------------------------------------------

    /// All committed notebooks in the requested order.
    pub fn fetch_notebooks(&self, sort: SortOrder) -> StoreResult<Vec<Notebook>> {
        let inner = self.lock();
        let notebooks = SqliteNotebookRepository::new(&inner.conn).list_notebooks(sort)?;
        Ok(notebooks)
    }

    /// Committed notes, optionally restricted to one notebook.
    pub fn fetch_notes(
        &self,
        notebook: Option<RecordId>,
        sort: SortOrder,
    ) -> StoreResult<Vec<Note>> {
        let inner = self.lock();
        let notes = SqliteNoteRepository::new(&inner.conn).list_notes(notebook, sort)?;
        Ok(notes)
    }

    /// One committed notebook by id.
    pub fn get_notebook(&self, id: RecordId) -> StoreResult<Option<Notebook>> {
        let inner = self.lock();
        let notebook = SqliteNotebookRepository::new(&inner.conn).get_notebook(id)?;
        Ok(notebook)
    }

    /// One committed note by id.
    pub fn get_note(&self, id: RecordId) -> StoreResult<Option<Note>> {
        let inner = self.lock();
        let note = SqliteNoteRepository::new(&inner.conn).get_note(id)?;
        Ok(note)
    }

    /// Number of committed notes owned by the notebook.
    pub fn note_count(&self, id: RecordId) -> StoreResult<u64> {
        let inner = self.lock();
        let count = SqliteNotebookRepository::new(&inner.conn).note_count(id)?;
        Ok(count)
    }

    // ---- subscriptions -------------------------------------------------

    /// Registers a live subscription and returns its cancellation handle
    /// plus the synchronously fetched initial snapshot.
    ///
    /// A failed initial fetch propagates its error; the application treats
    /// it like open-time corruption.
    pub fn subscribe(
        &self,
        query: ListQuery,
        observer: Box<dyn ListObserver>,
    ) -> StoreResult<(ObserverHandle, Vec<ListRow>)> {
        query.validate()?;

        let mut inner = self.lock();
        let rows = fetch_rows(&inner.conn, &query)?;
        info!(
            "event=subscribe module=store kind={:?} filtered={} rows={}",
            query.kind,
            query.notebook.is_some(),
            rows.len()
        );

        let (subscription, handle) = Subscription::new(query, rows.clone(), observer);
        inner.subscriptions.push(subscription);
        Ok((handle, rows))
    }

    /// Current snapshot behind a subscription, or `None` once it has been
    /// cancelled and pruned. Not callable from inside a notification
    /// callback (the store lock is held there).
    pub fn snapshot(&self, handle: &ObserverHandle) -> Option<Vec<ListRow>> {
        let inner = self.lock();
        inner
            .subscriptions
            .iter()
            .find(|subscription| subscription.is_owned_by(handle))
            .map(|subscription| subscription.rows.clone())
    }

    // ---- autosave / lifecycle ------------------------------------------

    /// Starts the periodic best-effort commit loop.
    ///
    /// A zero interval is rejected: the loop does not start and no error
    /// is surfaced. Calling while a loop is already running is a no-op.
    pub fn start_autosave(&mut self, interval: Duration) {
        if interval.is_zero() {
            warn!("event=autosave_start module=store status=rejected reason=zero_interval");
            return;
        }
        if self.autosave.is_some() {
            warn!("event=autosave_start module=store status=rejected reason=already_running");
            return;
        }
        self.autosave = Some(AutosaveHandle::spawn(Arc::downgrade(&self.inner), interval));
    }

    /// Whether the autosave loop is currently running.
    pub fn autosave_running(&self) -> bool {
        self.autosave.is_some()
    }

    /// Stops the autosave loop, waiting for an in-flight tick to finish.
    pub fn stop_autosave(&mut self) {
        if let Some(mut handle) = self.autosave.take() {
            handle.stop();
        }
    }

    /// Stops autosave and flushes any remaining staged changes.
    pub fn close(mut self) -> StoreResult<()> {
        self.stop_autosave();
        let result = self.lock().commit();
        info!(
            "event=store_close module=store status={}",
            if result.is_ok() { "ok" } else { "error" }
        );
        result
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        lock_inner(&self.inner)
    }
}

/// Recovers the guard from a poisoned lock: the store's own invariants are
/// transactional (SQLite rolls a failed batch back), so a panicking
/// observer must not wedge every later store call.
pub(crate) fn lock_inner(inner: &Mutex<StoreInner>) -> MutexGuard<'_, StoreInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StoreInner {
    pub(crate) fn commit(&mut self) -> StoreResult<()> {
        if self.context.is_empty() {
            debug!("event=commit module=store status=ok changes=0");
            return Ok(());
        }

        let changes = self.context.take();
        let staged = changes.len();

        if let Err(source) = self.apply_batch(&changes) {
            warn!(
                "event=commit module=store status=error changes={} error={}",
                staged, source
            );
            return Err(StoreError::CommitFailed {
                dropped: staged,
                source,
            });
        }

        debug!("event=commit module=store status=ok changes={staged}");
        self.notify_subscriptions()
    }

    fn apply_batch(&mut self, changes: &[PendingChange]) -> Result<(), RepoError> {
        let tx = self.conn.transaction().map_err(RepoError::from)?;

        for change in changes {
            match change {
                PendingChange::InsertNotebook(notebook) => {
                    SqliteNotebookRepository::new(&tx).insert_notebook(notebook)?;
                }
                PendingChange::RenameNotebook { id, name } => {
                    SqliteNotebookRepository::new(&tx).rename_notebook(*id, name)?;
                }
                PendingChange::DeleteNotebook(id) => {
                    SqliteNotebookRepository::new(&tx).delete_notebook(*id)?;
                }
                PendingChange::InsertNote(note) => {
                    SqliteNoteRepository::new(&tx).insert_note(note)?;
                }
                PendingChange::EditNoteText { id, text } => {
                    SqliteNoteRepository::new(&tx).update_note_text(*id, text)?;
                }
                PendingChange::DeleteNote(id) => {
                    SqliteNoteRepository::new(&tx).delete_note(*id)?;
                }
            }
        }

        tx.commit().map_err(RepoError::from)
    }

    /// One diff-and-notify cycle over all live subscriptions.
    ///
    /// Cancelled subscriptions are pruned before delivery, releasing their
    /// snapshots. A subscription whose snapshot is unchanged receives
    /// nothing; in-place field edits deliver an empty bracketed batch so
    /// consumers re-read the refreshed snapshot.
    fn notify_subscriptions(&mut self) -> StoreResult<()> {
        let StoreInner {
            conn,
            subscriptions,
            ..
        } = self;

        subscriptions.retain(|subscription| !subscription.is_cancelled());

        for subscription in subscriptions.iter_mut() {
            let new_rows = fetch_rows(conn, &subscription.query)?;
            if new_rows == subscription.rows {
                continue;
            }

            let deltas = diff_rows(&subscription.rows, &new_rows)?;
            subscription.rows = new_rows;

            subscription.observer.will_change();
            for delta in deltas {
                subscription.observer.apply(delta);
            }
            subscription.observer.did_change();
        }

        Ok(())
    }
}
