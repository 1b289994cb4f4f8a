use inkpad_core::db::open_db_in_memory;
use inkpad_core::{
    Note, Notebook, NoteRepository, NotebookRepository, RepoError, SortOrder,
    SqliteNoteRepository, SqliteNotebookRepository, NEW_NOTE_PLACEHOLDER,
};
use uuid::Uuid;

fn notebook_at(name: &str, creation_date: i64) -> Notebook {
    let mut notebook = Notebook::new(name);
    notebook.creation_date = creation_date;
    notebook
}

fn note_at(notebook: &Notebook, creation_date: i64) -> Note {
    let mut note = Note::new(notebook.uuid);
    note.creation_date = creation_date;
    note
}

#[test]
fn notebook_create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNotebookRepository::new(&conn);

    let notebook = Notebook::new("Groceries");
    repo.insert_notebook(&notebook).unwrap();

    let loaded = repo.get_notebook(notebook.uuid).unwrap().unwrap();
    assert_eq!(loaded, notebook);
}

#[test]
fn note_create_and_get_roundtrip_keeps_placeholder_and_parent() {
    let conn = open_db_in_memory().unwrap();
    let notebooks = SqliteNotebookRepository::new(&conn);
    let notes = SqliteNoteRepository::new(&conn);

    let notebook = Notebook::new("Travel");
    notebooks.insert_notebook(&notebook).unwrap();

    let note = Note::new(notebook.uuid);
    notes.insert_note(&note).unwrap();

    let loaded = notes.get_note(note.uuid).unwrap().unwrap();
    assert_eq!(loaded.text, NEW_NOTE_PLACEHOLDER);
    assert_eq!(loaded.notebook_uuid, notebook.uuid);
    assert_eq!(loaded.creation_date, note.creation_date);
}

#[test]
fn rename_notebook_preserves_creation_date() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNotebookRepository::new(&conn);

    let notebook = notebook_at("Drafts", 1_000);
    repo.insert_notebook(&notebook).unwrap();
    repo.rename_notebook(notebook.uuid, "Archive").unwrap();

    let loaded = repo.get_notebook(notebook.uuid).unwrap().unwrap();
    assert_eq!(loaded.name, "Archive");
    assert_eq!(loaded.creation_date, 1_000);
}

#[test]
fn update_note_text_preserves_creation_date_and_parent() {
    let conn = open_db_in_memory().unwrap();
    let notebooks = SqliteNotebookRepository::new(&conn);
    let notes = SqliteNoteRepository::new(&conn);

    let notebook = Notebook::new("Journal");
    notebooks.insert_notebook(&notebook).unwrap();
    let note = note_at(&notebook, 2_000);
    notes.insert_note(&note).unwrap();

    notes.update_note_text(note.uuid, "Dear diary").unwrap();

    let loaded = notes.get_note(note.uuid).unwrap().unwrap();
    assert_eq!(loaded.text, "Dear diary");
    assert_eq!(loaded.creation_date, 2_000);
    assert_eq!(loaded.notebook_uuid, notebook.uuid);
}

#[test]
fn mutations_on_missing_records_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let notebooks = SqliteNotebookRepository::new(&conn);
    let notes = SqliteNoteRepository::new(&conn);

    let missing = Uuid::new_v4();
    assert!(matches!(
        notebooks.rename_notebook(missing, "x").unwrap_err(),
        RepoError::NotFound(id) if id == missing
    ));
    assert!(matches!(
        notebooks.delete_notebook(missing).unwrap_err(),
        RepoError::NotFound(id) if id == missing
    ));
    assert!(matches!(
        notes.update_note_text(missing, "x").unwrap_err(),
        RepoError::NotFound(id) if id == missing
    ));
    assert!(matches!(
        notes.delete_note(missing).unwrap_err(),
        RepoError::NotFound(id) if id == missing
    ));
}

#[test]
fn notebook_list_is_ordered_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNotebookRepository::new(&conn);

    let oldest = notebook_at("oldest", 100);
    let middle = notebook_at("middle", 200);
    let newest = notebook_at("newest", 300);
    for notebook in [&middle, &oldest, &newest] {
        repo.insert_notebook(notebook).unwrap();
    }

    let listed = repo.list_notebooks(SortOrder::CreationDateDesc).unwrap();
    let names: Vec<&str> = listed.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["newest", "middle", "oldest"]);
}

#[test]
fn equal_creation_dates_tie_break_by_uuid_stably() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNotebookRepository::new(&conn);

    let first = notebook_at("a", 500);
    let second = notebook_at("b", 500);
    repo.insert_notebook(&first).unwrap();
    repo.insert_notebook(&second).unwrap();

    let listed_once = repo.list_notebooks(SortOrder::CreationDateDesc).unwrap();
    let listed_again = repo.list_notebooks(SortOrder::CreationDateDesc).unwrap();
    assert_eq!(listed_once, listed_again);

    let mut expected = vec![first.uuid.to_string(), second.uuid.to_string()];
    expected.sort();
    let actual: Vec<String> = listed_once.iter().map(|n| n.uuid.to_string()).collect();
    assert_eq!(actual, expected);
}

#[test]
fn note_list_filter_restricts_to_one_notebook() {
    let conn = open_db_in_memory().unwrap();
    let notebooks = SqliteNotebookRepository::new(&conn);
    let notes = SqliteNoteRepository::new(&conn);

    let groceries = Notebook::new("Groceries");
    let travel = Notebook::new("Travel");
    notebooks.insert_notebook(&groceries).unwrap();
    notebooks.insert_notebook(&travel).unwrap();

    for creation_date in [10, 20, 30] {
        notes.insert_note(&note_at(&groceries, creation_date)).unwrap();
    }
    notes.insert_note(&note_at(&travel, 40)).unwrap();

    let filtered = notes
        .list_notes(Some(groceries.uuid), SortOrder::CreationDateDesc)
        .unwrap();
    assert_eq!(filtered.len(), 3);
    assert!(filtered.iter().all(|n| n.notebook_uuid == groceries.uuid));

    let all = notes.list_notes(None, SortOrder::CreationDateDesc).unwrap();
    assert_eq!(all.len(), 4);
}

#[test]
fn deleting_notebook_cascades_to_owned_notes() {
    let conn = open_db_in_memory().unwrap();
    let notebooks = SqliteNotebookRepository::new(&conn);
    let notes = SqliteNoteRepository::new(&conn);

    let doomed = Notebook::new("Doomed");
    let survivor = Notebook::new("Survivor");
    notebooks.insert_notebook(&doomed).unwrap();
    notebooks.insert_notebook(&survivor).unwrap();

    let doomed_note = note_at(&doomed, 10);
    let surviving_note = note_at(&survivor, 20);
    notes.insert_note(&doomed_note).unwrap();
    notes.insert_note(&surviving_note).unwrap();

    notebooks.delete_notebook(doomed.uuid).unwrap();

    assert!(notes.get_note(doomed_note.uuid).unwrap().is_none());
    assert!(notes.get_note(surviving_note.uuid).unwrap().is_some());
    assert_eq!(notebooks.note_count(survivor.uuid).unwrap(), 1);
}

#[test]
fn note_count_reflects_owned_notes_only() {
    let conn = open_db_in_memory().unwrap();
    let notebooks = SqliteNotebookRepository::new(&conn);
    let notes = SqliteNoteRepository::new(&conn);

    let notebook = Notebook::new("Counts");
    notebooks.insert_notebook(&notebook).unwrap();
    assert_eq!(notebooks.note_count(notebook.uuid).unwrap(), 0);

    let note = note_at(&notebook, 10);
    notes.insert_note(&note).unwrap();
    assert_eq!(notebooks.note_count(notebook.uuid).unwrap(), 1);

    notes.delete_note(note.uuid).unwrap();
    assert_eq!(notebooks.note_count(notebook.uuid).unwrap(), 0);
}
