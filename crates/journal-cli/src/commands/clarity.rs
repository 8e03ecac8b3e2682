//! Clarity command - digest the notes in a directory.

use journal_ai::{AIError, InMemoryNotes, Note, Timeframe};
use std::path::Path;
use std::time::SystemTime;

use super::{interrupt_token, print_chunk, start_service};

pub(crate) async fn run(
    timeframe: &str,
    notes_dir: &Path,
    attach: bool,
    wait: u64,
) -> miette::Result<()> {
    let timeframe: Timeframe = timeframe.parse().map_err(|e| miette::miette!("{}", e))?;
    let notes = load_notes(notes_dir)?;
    tracing::debug!("Loaded {} notes from {}", notes.len(), notes_dir.display());

    let mut service = start_service(attach, wait).await?;
    let cancel = interrupt_token();

    let result = match service
        .clarity_for_timeframe_until(&notes, timeframe, &cancel, print_chunk)
        .await
    {
        Ok(used) => {
            println!();
            eprintln!("Digest covered {} notes", used);
            Ok(())
        }
        Err(AIError::NoNotes(_)) => {
            println!(
                "No notes found for the past {}. Write a few entries and try again.",
                timeframe
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    };

    if !attach {
        service.shutdown().await.map_err(|e| miette::miette!("{}", e))?;
    }
    result
}

/// Load every regular file in `dir` as a note, oldest first.
///
/// The file stem is the title; creation time falls back to modification time.
pub(crate) fn load_notes(dir: &Path) -> miette::Result<InMemoryNotes> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| miette::miette!("Failed to read notes directory {}: {}", dir.display(), e))?;

    let mut notes = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| miette::miette!("Failed to read notes directory: {}", e))?;
        let path = entry.path();
        let metadata = entry
            .metadata()
            .map_err(|e| miette::miette!("Failed to stat {}: {}", path.display(), e))?;
        if !metadata.is_file() {
            continue;
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| miette::miette!("Failed to read {}: {}", path.display(), e))?;
        let updated_at = metadata.modified().unwrap_or_else(|_| SystemTime::now());
        let created_at = metadata.created().unwrap_or(updated_at);
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut note = Note::new(id, title, content, created_at);
        note.updated_at = updated_at;
        notes.push(note);
    }

    notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(InMemoryNotes::new(notes))
}
