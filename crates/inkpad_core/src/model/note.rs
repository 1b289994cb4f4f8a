//! Note domain record.
//!
//! # Invariants
//! - A note belongs to exactly one notebook for its entire lifetime.
//! - `creation_date` is set once in the constructor and never changes.

use super::{now_epoch_ms, RecordId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body text given to every freshly created note.
pub const NEW_NOTE_PLACEHOLDER: &str = "New Note";

/// Free-text entry owned by one notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable identifier, assigned at creation.
    pub uuid: RecordId,
    /// Free text body. Starts as [`NEW_NOTE_PLACEHOLDER`].
    pub text: String,
    /// Epoch milliseconds, assigned exactly once at creation.
    pub creation_date: i64,
    /// Owning notebook. Fixed for the note's lifetime; no reparenting.
    pub notebook_uuid: RecordId,
}

impl Note {
    /// Creates a note inside `notebook_uuid` with placeholder text.
    pub fn new(notebook_uuid: RecordId) -> Self {
        Self::with_id(Uuid::new_v4(), notebook_uuid)
    }

    /// Creates a note with a caller-provided stable id.
    pub fn with_id(uuid: RecordId, notebook_uuid: RecordId) -> Self {
        Self {
            uuid,
            text: NEW_NOTE_PLACEHOLDER.to_string(),
            creation_date: now_epoch_ms(),
            notebook_uuid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Note, NEW_NOTE_PLACEHOLDER};
    use uuid::Uuid;

    #[test]
    fn new_note_starts_with_placeholder_text() {
        let parent = Uuid::new_v4();
        let note = Note::new(parent);
        assert_eq!(note.text, NEW_NOTE_PLACEHOLDER);
        assert_eq!(note.notebook_uuid, parent);
        assert!(note.creation_date > 0);
    }

    #[test]
    fn serializes_with_parent_reference() {
        let parent = Uuid::new_v4();
        let note = Note::new(parent);
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["notebook_uuid"], parent.to_string());
        assert_eq!(json["text"], NEW_NOTE_PLACEHOLDER);
    }
}
