//! EPUB chapter maps
//!
//! Reads the book's nav structure with rbook and flattens it into the
//! engine's chapter map form. Positions are spine indices zero-padded
//! to five digits, matching the synthetic position labels Zotero uses
//! for EPUB annotations; levels come from nav nesting depth.

use std::collections::HashMap;
use std::path::Path;

use rbook::prelude::*;
use rbook::Epub;

use crate::render::{ChapterMap, ChapterMapEntry};

use super::{dedup_consecutive_titles, TocError};

/// Width of a zero-padded spine position label
const SPINE_LABEL_WIDTH: usize = 5;

/// One nav point lifted out of rbook's borrowed representation
#[derive(Debug, Clone)]
struct NavNode {
    title: String,
    target: String,
    children: Vec<NavNode>,
}

/// Extract a chapter map from an EPUB file.
pub fn chapter_map_for_epub(path: &Path, max_depth: u32) -> Result<ChapterMap, TocError> {
    // Lenient parsing: books with sloppy metadata still have usable navs
    let epub = Epub::options()
        .strict(false)
        .open(path)
        .map_err(|e| TocError::EpubOpen(e.to_string()))?;

    let manifest = epub.manifest();
    let spine = epub.spine();
    let mut spine_positions: HashMap<String, usize> = HashMap::new();
    for (index, item) in spine.entries().enumerate() {
        let idref = item.idref().to_string();
        if let Some(entry) = manifest.by_id(&idref) {
            spine_positions.insert(normalize_href(&entry.href().to_string()), index);
        }
    }

    let toc = epub.toc();
    let Some(root) = toc.contents() else {
        return Ok(Vec::new());
    };
    let nodes: Vec<NavNode> = root.children().iter().map(convert_entry).collect();

    let mut entries = Vec::new();
    flatten(&nodes, 1, max_depth, &spine_positions, &mut entries);
    Ok(dedup_consecutive_titles(entries))
}

fn convert_entry<'a>(entry: impl rbook::prelude::TocEntry<'a>) -> NavNode {
    let title = entry.label().to_string();
    let target = entry
        .resource()
        .map(|r| {
            use rbook::ebook::resource::ResourceKey;
            match r.key() {
                ResourceKey::Value(s) => s.to_string(),
                ResourceKey::Position(pos) => pos.to_string(),
            }
        })
        .unwrap_or_default();
    let children: Vec<NavNode> = entry.children().iter().map(convert_entry).collect();

    NavNode {
        title,
        target,
        children,
    }
}

/// Walk the nav tree, resolving targets to spine positions.
fn flatten(
    nodes: &[NavNode],
    level: u32,
    max_depth: u32,
    spine_positions: &HashMap<String, usize>,
    out: &mut Vec<ChapterMapEntry>,
) {
    if level > max_depth {
        return;
    }
    for node in nodes {
        let title = node.title.trim();
        if !title.is_empty() {
            if let Some(position) = resolve_spine_position(&node.target, spine_positions) {
                out.push(ChapterMapEntry::new(
                    title,
                    &format!("{:0width$}", position, width = SPINE_LABEL_WIDTH),
                    level,
                ));
            }
        }
        flatten(&node.children, level + 1, max_depth, spine_positions, out);
    }
}

/// Resolve a nav target to its spine index.
///
/// Targets are hrefs (with optional fragment) or, for position-keyed
/// resources, the spine index itself.
fn resolve_spine_position(target: &str, spine_positions: &HashMap<String, usize>) -> Option<usize> {
    if target.is_empty() {
        return None;
    }
    let href = target.split('#').next().unwrap_or(target);
    if let Some(&position) = spine_positions.get(href) {
        return Some(position);
    }
    if let Some(&position) = spine_positions.get(&normalize_href(href)) {
        return Some(position);
    }
    // Position-keyed resource: the target is already a spine index
    if !href.is_empty() && href.bytes().all(|b| b.is_ascii_digit()) {
        return href.parse().ok();
    }
    None
}

/// Strip leading slashes and common EPUB content directory prefixes
/// so nav hrefs and manifest hrefs compare equal.
fn normalize_href(href: &str) -> String {
    let href = href.trim_start_matches('/');
    let href = href
        .strip_prefix("OEBPS/")
        .or_else(|| href.strip_prefix("OPS/"))
        .or_else(|| href.strip_prefix("EPUB/"))
        .unwrap_or(href);
    href.to_string()
}
