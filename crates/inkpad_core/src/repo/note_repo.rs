//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `notes` storage.
//! - Own the notebook equality filter used by list consumers.
//!
//! # Invariants
//! - `creation_date` and `notebook_uuid` are written once at insert and
//!   never updated (no reparenting).
//! - Filtered lists never return a note from another notebook.

use crate::model::{Note, RecordId};
use crate::repo::{parse_record_uuid, RepoError, RepoResult, SortOrder};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const NOTE_SELECT_SQL: &str = "SELECT uuid, text, creation_date, notebook_uuid FROM notes";

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Persists one note row under its owning notebook.
    fn insert_note(&self, note: &Note) -> RepoResult<()>;
    /// Replaces the note body. `creation_date` and ownership are untouched.
    fn update_note_text(&self, id: RecordId, text: &str) -> RepoResult<()>;
    /// Deletes one note.
    fn delete_note(&self, id: RecordId) -> RepoResult<()>;
    /// Gets one note by id.
    fn get_note(&self, id: RecordId) -> RepoResult<Option<Note>>;
    /// Lists notes, optionally restricted to one notebook.
    fn list_notes(&self, notebook: Option<RecordId>, sort: SortOrder) -> RepoResult<Vec<Note>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, note: &Note) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO notes (uuid, text, creation_date, notebook_uuid)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                note.uuid.to_string(),
                note.text.as_str(),
                note.creation_date,
                note.notebook_uuid.to_string(),
            ],
        )?;
        Ok(())
    }

    fn update_note_text(&self, id: RecordId, text: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes SET text = ?2 WHERE uuid = ?1;",
            params![id.to_string(), text],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_note(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_note(&self, id: RecordId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }

        Ok(None)
    }

    fn list_notes(&self, notebook: Option<RecordId>, sort: SortOrder) -> RepoResult<Vec<Note>> {
        let mut sql = String::from(NOTE_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(notebook_uuid) = notebook {
            sql.push_str(" WHERE notebook_uuid = ?");
            bind_values.push(Value::Text(notebook_uuid.to_string()));
        }

        sql.push(' ');
        sql.push_str(sort.order_by_sql());

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }

        Ok(notes)
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let notebook_text: String = row.get("notebook_uuid")?;
    Ok(Note {
        uuid: parse_record_uuid("notes.uuid", &uuid_text)?,
        text: row.get("text")?,
        creation_date: row.get("creation_date")?,
        notebook_uuid: parse_record_uuid("notes.notebook_uuid", &notebook_text)?,
    })
}
