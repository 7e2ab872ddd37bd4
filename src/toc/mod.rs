//! Chapter map extraction
//!
//! Produces the flat, depth-tagged outline the render engine consumes
//! (`ChapterMapEntry` lists, ascending by position), keyed by
//! attachment. EPUB outlines are read in-process from the book's nav
//! structure; PDF outlines come from an external chapter-mapping
//! command. Everything degrades to "no chapter map": a missing file,
//! unset command, or garbled output means annotations simply render
//! without chapter headings.

mod cache;
mod epub;
mod pdf;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::annotations::{Attachment, ItemAnnotations};
use crate::config::{StorageConfig, TocConfig};
use crate::render::{ChapterMap, ChapterMapEntry, ChapterMaps};

pub use cache::ChapterMapCache;
pub use epub::chapter_map_for_epub;
pub use pdf::{chapter_map_from_command, parse_chapter_map_json};

/// Chapter map extraction errors
#[derive(Error, Debug)]
pub enum TocError {
    #[error("Failed to open EPUB: {0}")]
    EpubOpen(String),

    #[error("Chapter map command failed: {0}")]
    Command(String),

    #[error("Invalid chapter map JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolves and caches chapter maps per attachment
pub struct ChapterMapService {
    toc: TocConfig,
    storage_dir: PathBuf,
    cache: ChapterMapCache,
}

impl ChapterMapService {
    pub fn new(toc: TocConfig, storage: &StorageConfig) -> Self {
        let cache = ChapterMapCache::new(toc.cache_size);
        Self {
            toc,
            storage_dir: storage.zotero_dir.clone(),
            cache,
        }
    }

    /// Chapter map for one attachment, or `None` when unavailable.
    ///
    /// Results (including misses) are cached by (attachment key,
    /// filename) so failed lookups are not retried per render.
    pub fn chapter_map_for(&self, attachment: &Attachment) -> Option<ChapterMap> {
        let cache_key = (attachment.key.clone(), attachment.filename.clone());
        if let Some(cached) = self.cache.get(&cache_key) {
            return cached;
        }

        let resolved = self.extract(attachment);
        self.cache.put(cache_key, resolved.clone());
        resolved
    }

    /// Chapter maps for every attachment of an item, keyed for the
    /// document assembler.
    pub fn chapter_maps_for_item(&self, item: &ItemAnnotations) -> ChapterMaps {
        let mut maps = ChapterMaps::new();
        for attachment in &item.attachments {
            if let Some(map) = self.chapter_map_for(attachment) {
                if !map.is_empty() {
                    maps.insert(attachment.key.clone(), map);
                }
            }
        }
        maps
    }

    fn extract(&self, attachment: &Attachment) -> Option<ChapterMap> {
        let path = resolve_attachment_path(attachment, &self.storage_dir)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let result = match extension.as_str() {
            "epub" => chapter_map_for_epub(&path, self.toc.max_depth),
            "pdf" => {
                let Some(command) = &self.toc.pdf_command else {
                    debug!(file = %path.display(), "no chapter map command configured");
                    return None;
                };
                chapter_map_from_command(command, &path, self.toc.max_depth)
            }
            _ => return None,
        };

        match result {
            Ok(map) => Some(map),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "chapter map extraction failed");
                None
            }
        }
    }
}

/// Locate an attachment's file on disk.
///
/// An absolute path reported by the source wins; otherwise the file is
/// expected in the Zotero storage layout `{storage}/{key}/{filename}`.
fn resolve_attachment_path(attachment: &Attachment, storage_dir: &Path) -> Option<PathBuf> {
    if let Some(path) = &attachment.path {
        let path = PathBuf::from(path);
        if path.is_absolute() && path.exists() {
            return Some(path);
        }
    }

    if attachment.key.is_empty() || attachment.filename.is_empty() {
        return None;
    }
    let candidate = storage_dir.join(&attachment.key).join(&attachment.filename);
    if candidate.exists() {
        Some(candidate)
    } else {
        None
    }
}

/// Drop entries whose title repeats the directly preceding one; PDF
/// outlines often list a chapter once per page range.
pub(crate) fn dedup_consecutive_titles(entries: Vec<ChapterMapEntry>) -> Vec<ChapterMapEntry> {
    let mut deduped: Vec<ChapterMapEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if deduped.last().map(|prev| prev.title.as_str()) != Some(entry.title.as_str()) {
            deduped.push(entry);
        }
    }
    deduped
}
