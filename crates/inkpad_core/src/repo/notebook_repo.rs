//! Notebook repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `notebooks` storage.
//! - Expose the note-count read model used by list consumers.
//!
//! # Invariants
//! - `creation_date` is written once at insert and never updated.
//! - Deleting a notebook removes its notes through the schema cascade;
//!   callers must run deletes on a `foreign_keys=ON` connection.

use crate::model::{Notebook, RecordId};
use crate::repo::{parse_record_uuid, RepoError, RepoResult, SortOrder};
use rusqlite::{params, Connection, Row};

const NOTEBOOK_SELECT_SQL: &str = "SELECT uuid, name, creation_date FROM notebooks";

/// Repository interface for notebook operations.
pub trait NotebookRepository {
    /// Persists one notebook row.
    fn insert_notebook(&self, notebook: &Notebook) -> RepoResult<()>;
    /// Replaces the notebook label. `creation_date` is untouched.
    fn rename_notebook(&self, id: RecordId, name: &str) -> RepoResult<()>;
    /// Deletes the notebook and, via cascade, all owned notes.
    fn delete_notebook(&self, id: RecordId) -> RepoResult<()>;
    /// Gets one notebook by id.
    fn get_notebook(&self, id: RecordId) -> RepoResult<Option<Notebook>>;
    /// Lists all notebooks in the requested order.
    fn list_notebooks(&self, sort: SortOrder) -> RepoResult<Vec<Notebook>>;
    /// Number of notes currently owned by the notebook.
    fn note_count(&self, id: RecordId) -> RepoResult<u64>;
}

/// SQLite-backed notebook repository.
pub struct SqliteNotebookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotebookRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NotebookRepository for SqliteNotebookRepository<'_> {
    fn insert_notebook(&self, notebook: &Notebook) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO notebooks (uuid, name, creation_date) VALUES (?1, ?2, ?3);",
            params![
                notebook.uuid.to_string(),
                notebook.name.as_str(),
                notebook.creation_date,
            ],
        )?;
        Ok(())
    }

    fn rename_notebook(&self, id: RecordId, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notebooks SET name = ?2 WHERE uuid = ?1;",
            params![id.to_string(), name],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_notebook(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notebooks WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_notebook(&self, id: RecordId) -> RepoResult<Option<Notebook>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTEBOOK_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_notebook_row(row)?));
        }

        Ok(None)
    }

    fn list_notebooks(&self, sort: SortOrder) -> RepoResult<Vec<Notebook>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTEBOOK_SELECT_SQL} {};", sort.order_by_sql()))?;

        let mut rows = stmt.query([])?;
        let mut notebooks = Vec::new();
        while let Some(row) = rows.next()? {
            notebooks.push(parse_notebook_row(row)?);
        }

        Ok(notebooks)
    }

    fn note_count(&self, id: RecordId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE notebook_uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

fn parse_notebook_row(row: &Row<'_>) -> RepoResult<Notebook> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Notebook {
        uuid: parse_record_uuid("notebooks.uuid", &uuid_text)?,
        name: row.get("name")?,
        creation_date: row.get("creation_date")?,
    })
}
