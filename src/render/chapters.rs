//! Chapter resolution against a flat, depth-tagged outline
//!
//! A chapter map is an ordered list of (title, position label, level)
//! entries describing a document's outline. Given an annotation's
//! position, `chapters_at` returns the chain of ancestor headings
//! active there, shallowest first. `HeadingStack` applies the same
//! per-level eviction rule during document assembly so lookup and
//! emission never diverge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One outline entry: heading title, position label, nesting level
/// (1 = top). Maps arrive already ordered ascending by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMapEntry {
    pub title: String,
    /// Numeric-as-string page label, or an exact non-numeric label
    pub label: String,
    pub level: u32,
}

impl ChapterMapEntry {
    pub fn new(title: &str, label: &str, level: u32) -> Self {
        Self {
            title: title.to_string(),
            label: label.to_string(),
            level,
        }
    }
}

pub type ChapterMap = Vec<ChapterMapEntry>;

/// Whether a page label looks like a synthetic EPUB spine index:
/// all digits and long enough that it can't be a real page number.
pub fn is_spine_index(label: &str) -> bool {
    label.len() >= 5 && label.bytes().all(|b| b.is_ascii_digit())
}

/// The position label chapter lookup should use for an annotation.
///
/// A real page label wins. Spine-indexed or missing labels fall back
/// to the leading numeric field of the sort index (the spine position
/// for EPUB annotations), then to the 0-indexed raw page converted to
/// 1-indexed.
pub fn effective_position(page_label: &str, sort_index: &str, page_index: Option<u32>) -> String {
    if !page_label.is_empty() && !is_spine_index(page_label) {
        return page_label.to_string();
    }

    let leading = sort_index.split('|').next().unwrap_or("");
    if !leading.is_empty() && leading.bytes().all(|b| b.is_ascii_digit()) {
        return leading.to_string();
    }

    if let Some(index) = page_index {
        return (index + 1).to_string();
    }

    page_label.to_string()
}

/// Ancestor headings active at `position`, ordered shallowest first.
///
/// Numeric positions take the nearest preceding entry at each level,
/// with deeper levels evicted whenever a shallower-or-equal heading
/// supersedes them. Non-numeric (or zero) positions match an entry's
/// label exactly or resolve to nothing.
pub fn chapters_at(map: &[ChapterMapEntry], position: &str) -> Vec<(String, u32)> {
    if map.is_empty() || position.is_empty() {
        return Vec::new();
    }

    match position.trim().parse::<i64>() {
        Ok(target) if target != 0 => chapters_numeric(map, target),
        _ => chapters_exact(map, position),
    }
}

fn chapters_numeric(map: &[ChapterMapEntry], target: i64) -> Vec<(String, u32)> {
    let mut nearest: BTreeMap<u32, String> = BTreeMap::new();

    for entry in map {
        let Ok(page) = entry.label.trim().parse::<i64>() else {
            continue;
        };
        if page <= target {
            nearest.insert(entry.level, entry.title.clone());
            // A new heading invalidates deeper ones that preceded it
            nearest.split_off(&(entry.level + 1));
        }
    }

    nearest.into_iter().map(|(level, title)| (title, level)).collect()
}

fn chapters_exact(map: &[ChapterMapEntry], position: &str) -> Vec<(String, u32)> {
    map.iter()
        .find(|entry| entry.label == position)
        .map(|entry| vec![(entry.title.clone(), entry.level)])
        .unwrap_or_default()
}

/// Per-attachment heading state during document assembly.
///
/// Tracks the currently-open heading at each level so repeated or
/// superseded headings are never emitted twice. Levels are small
/// bounded integers, so a sorted map keyed by level is the structure.
#[derive(Debug, Default)]
pub struct HeadingStack {
    open: BTreeMap<u32, String>,
}

impl HeadingStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `title` as the open heading at `level`.
    ///
    /// Returns true when the heading was not already open (the caller
    /// should emit it). Opening a heading evicts all deeper levels,
    /// mirroring the lookup rule in `chapters_numeric`.
    pub fn advance(&mut self, title: &str, level: u32) -> bool {
        if self.open.get(&level).map(String::as_str) == Some(title) {
            return false;
        }
        self.open.insert(level, title.to_string());
        self.open.split_off(&(level + 1));
        true
    }
}
