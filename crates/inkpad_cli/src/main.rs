//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `inkpad_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use inkpad_core::{SortOrder, Store};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("inkpad_core version={}", inkpad_core::core_version());

    // Why: an in-memory create/commit/read round-trip exercises the whole
    // open -> stage -> commit -> fetch path without touching the filesystem.
    match smoke_round_trip() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("smoke round-trip failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn smoke_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open_in_memory()?;
    let notebook = store.create_notebook("Scratch");
    let _note = store.create_note(notebook.uuid);
    store.commit()?;

    let notebooks = store.fetch_notebooks(SortOrder::default())?;
    let notes = store.fetch_notes(Some(notebook.uuid), SortOrder::default())?;
    println!("notebooks={} notes={}", notebooks.len(), notes.len());

    store.close()?;
    Ok(())
}
