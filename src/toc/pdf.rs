//! PDF chapter maps via shell delegation
//!
//! PDF outline extraction with printed page labels needs a real PDF
//! library; rather than linking one, the work is delegated to an
//! external command (configured via `CHAPTER_MAP_COMMAND`). The
//! contract: invoked as `<command> <file>`, it prints a JSON array of
//! `{"title", "label", "level"}` objects ordered by position, where
//! `label` is the printed page label matching Zotero's
//! `annotationPageLabel` values.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::render::{ChapterMap, ChapterMapEntry};

use super::{dedup_consecutive_titles, TocError};

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    label: String,
    #[serde(default = "default_level")]
    level: u32,
}

fn default_level() -> u32 {
    1
}

/// Run the configured chapter-map command on `path` and parse its
/// output.
pub fn chapter_map_from_command(
    command: &str,
    path: &Path,
    max_depth: u32,
) -> Result<ChapterMap, TocError> {
    debug!(command, file = %path.display(), "running chapter map command");
    let output = Command::new(command)
        .arg(path)
        .output()
        .map_err(|e| TocError::Command(format!("{}: {}", command, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TocError::Command(format!(
            "{} exited with {}: {}",
            command,
            output.status,
            stderr.trim()
        )));
    }

    parse_chapter_map_json(&String::from_utf8_lossy(&output.stdout), max_depth)
}

/// Parse the command's JSON output into a chapter map.
pub fn parse_chapter_map_json(json: &str, max_depth: u32) -> Result<ChapterMap, TocError> {
    let raw: Vec<RawEntry> = serde_json::from_str(json)?;
    let entries = raw
        .into_iter()
        .filter(|entry| entry.level >= 1 && entry.level <= max_depth)
        .filter(|entry| !entry.title.trim().is_empty() && !entry.label.is_empty())
        .map(|entry| ChapterMapEntry::new(entry.title.trim(), &entry.label, entry.level))
        .collect();
    Ok(dedup_consecutive_titles(entries))
}
