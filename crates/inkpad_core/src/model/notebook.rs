//! Notebook domain record.
//!
//! # Invariants
//! - `creation_date` is set once in the constructor and never changes.
//! - Deleting a notebook deletes every note it owns, atomically.

use super::{now_epoch_ms, RecordId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Named container owning an ordered collection of notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    /// Stable identifier, assigned at creation.
    pub uuid: RecordId,
    /// User-visible label. Defaults empty.
    pub name: String,
    /// Epoch milliseconds, assigned exactly once at creation.
    pub creation_date: i64,
}

impl Notebook {
    /// Creates a notebook with a generated id and the current timestamp.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a notebook with a caller-provided stable id.
    ///
    /// Used by read paths reconstructing persisted rows.
    pub fn with_id(uuid: RecordId, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            creation_date: now_epoch_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Notebook;

    #[test]
    fn new_assigns_identity_and_creation_date() {
        let notebook = Notebook::new("Recipes");
        assert_eq!(notebook.name, "Recipes");
        assert!(notebook.creation_date > 0);
    }

    #[test]
    fn distinct_notebooks_get_distinct_ids() {
        let a = Notebook::new("A");
        let b = Notebook::new("B");
        assert_ne!(a.uuid, b.uuid);
    }

    #[test]
    fn serializes_with_stable_field_names() {
        let notebook = Notebook::new("Travel");
        let json = serde_json::to_value(&notebook).unwrap();
        assert_eq!(json["name"], "Travel");
        assert!(json["creation_date"].is_i64());
        assert!(json["uuid"].is_string());
    }
}
