//! Document assembly
//!
//! Orchestrates sorting, chapter-heading emission, and per-annotation
//! block rendering into one final text document. Pure: the only state
//! is a per-attachment [`HeadingStack`], created fresh for each
//! attachment and discarded afterwards, so documents may be assembled
//! concurrently.

use std::collections::HashMap;

use crate::annotations::{CollectionAnnotations, ItemAnnotations, Library};
use crate::encoding::repair;
use crate::render::block::{render_block, BlockContext};
use crate::render::chapters::{chapters_at, effective_position, ChapterMap, HeadingStack};
use crate::render::order::sorted_annotations;
use crate::render::syntax::Syntax;

/// Resolved chapter maps, keyed by attachment key
pub type ChapterMaps = HashMap<String, ChapterMap>;

/// Assemble one item's annotations into a document.
///
/// `citation_key` overrides the key carried on the item itself. An
/// item with an error marker renders as a single error comment line.
pub fn assemble_item(
    item: &ItemAnnotations,
    library: &Library,
    citation_key: Option<&str>,
    chapter_maps: &ChapterMaps,
    syntax: Syntax,
) -> String {
    if let Some(error) = &item.error {
        return format!("# Error: {}\n", error);
    }

    let citation_key = citation_key.or(item.citation_key.as_deref());
    let mut lines = item_header(item, citation_key, syntax);

    let multi_attachment = item.attachments.len() > 1;
    let base_depth = if multi_attachment { 2 } else { 1 };

    for attachment in &item.attachments {
        if multi_attachment {
            lines.push(syntax.heading(2, &repair(&attachment.title)));
            lines.push(String::new());
        }

        if attachment.annotations.is_empty() {
            lines.push("No annotations found.".to_string());
            lines.push(String::new());
            continue;
        }

        let content_type = attachment.effective_content_type();
        let ctx = BlockContext {
            library,
            attachment_key: &attachment.key,
            content_type: &content_type,
            citation_key,
        };
        let chapter_map = chapter_maps.get(&attachment.key);
        let mut open_headings = HeadingStack::new();

        for annotation in sorted_annotations(&attachment.annotations) {
            if let Some(map) = chapter_map {
                let position = effective_position(
                    &annotation.page_label,
                    &annotation.sort_index,
                    annotation.page_index,
                );
                for (title, level) in chapters_at(map, &position) {
                    if open_headings.advance(&title, level) {
                        lines.push(syntax.heading(base_depth + level, &title));
                        lines.push(String::new());
                    }
                }
            }

            let block = render_block(&annotation, &ctx, syntax);
            if !block.is_empty() {
                lines.extend(block);
                lines.push(String::new());
            }
        }
    }

    lines.join("\n")
}

/// Assemble a collection: header, then each item's document with its
/// headings demoted one level.
pub fn assemble_collection(
    collection: &CollectionAnnotations,
    chapter_maps: &ChapterMaps,
    syntax: Syntax,
) -> String {
    if let Some(error) = &collection.error {
        return format!("# Error: {}\n", error);
    }

    let library = Library::from_id(if collection.library_id == 0 {
        1
    } else {
        collection.library_id
    });
    let mut lines = collection_header(collection, &library, syntax);

    if collection.items.is_empty() {
        lines.push("No items with annotations found in this collection.".to_string());
        lines.push(String::new());
        return lines.join("\n");
    }

    for item in &collection.items {
        let document = assemble_item(item, &library, None, chapter_maps, syntax);
        lines.extend(demote_headings(&document, syntax));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Flat listing of an item's annotations: sorted blocks only, no item
/// header, no chapter headings.
///
/// Backs the quick `list` preview; uses the simple block renderer
/// (empty note comments skipped, fallback text left raw).
pub fn render_annotation_listing(
    item: &ItemAnnotations,
    library: &Library,
    citation_key: Option<&str>,
    syntax: Syntax,
) -> String {
    if let Some(error) = &item.error {
        return format!("# Error: {}\n", error);
    }

    let citation_key = citation_key.or(item.citation_key.as_deref());
    let multi_attachment = item.attachments.len() > 1;
    let mut lines = Vec::new();

    for attachment in &item.attachments {
        if multi_attachment {
            lines.push(format!("--- {} ---", repair(&attachment.title)));
            lines.push(String::new());
        }
        if attachment.annotations.is_empty() {
            lines.push("No annotations found.".to_string());
            lines.push(String::new());
            continue;
        }

        let content_type = attachment.effective_content_type();
        let ctx = BlockContext {
            library,
            attachment_key: &attachment.key,
            content_type: &content_type,
            citation_key,
        };
        for annotation in sorted_annotations(&attachment.annotations) {
            let block = crate::render::block::render_block_simple(&annotation, &ctx, syntax);
            if !block.is_empty() {
                lines.extend(block);
                lines.push(String::new());
            }
        }
    }

    lines.join("\n")
}

fn item_header(item: &ItemAnnotations, citation_key: Option<&str>, syntax: Syntax) -> Vec<String> {
    let title = repair(&item.title);
    match syntax {
        Syntax::Org => {
            let mut lines = vec![
                format!("* {}", title),
                "  :PROPERTIES:".to_string(),
                format!("  :ITEM_TYPE: {}", item.item_type),
                format!("  :ZOTERO_KEY: {}", item.key),
            ];
            if let Some(key) = citation_key {
                lines.push(format!("  :CUSTOM_ID: {}", key));
            }
            lines.push("  :END:".to_string());
            lines.push(String::new());
            lines
        }
        Syntax::Markdown => {
            let mut lines = vec![
                format!("# {}", title),
                String::new(),
                format!("**Item Type:** {}", item.item_type),
                format!("**Zotero Key:** {}", item.key),
            ];
            if let Some(key) = citation_key {
                lines.push(format!("**Citation Key:** {}", key));
            }
            lines.push(String::new());
            lines
        }
    }
}

fn collection_header(
    collection: &CollectionAnnotations,
    library: &Library,
    syntax: Syntax,
) -> Vec<String> {
    let name = repair(&collection.name);
    let annotated = collection.items.len();
    match syntax {
        Syntax::Org => {
            let mut lines = vec![
                format!("* Collection: {}", name),
                "  :PROPERTIES:".to_string(),
                format!("  :COLLECTION_ID: {}", collection.key),
            ];
            if let Library::Group(id) = library {
                lines.push(format!("  :LIBRARY_ID: {}", id));
            }
            lines.push(format!("  :TOTAL_ITEMS: {}", collection.total_items));
            lines.push(format!("  :ITEMS_WITH_ANNOTATIONS: {}", annotated));
            lines.push("  :END:".to_string());
            lines.push(String::new());
            lines
        }
        Syntax::Markdown => {
            let mut lines = vec![
                format!("# Collection: {}", name),
                String::new(),
                format!("**Collection ID:** {}", collection.key),
            ];
            if let Library::Group(id) = library {
                lines.push(format!("**Library ID:** {}", id));
            }
            lines.push(format!("**Total Items:** {}", collection.total_items));
            lines.push(format!("**Items with Annotations:** {}", annotated));
            lines.push(String::new());
            lines
        }
    }
}

/// Push every heading in `document` one level deeper.
///
/// Only genuine heading lines move: a run of marker characters
/// followed by a space. Tag hashtags and org block keywords are left
/// alone.
fn demote_headings(document: &str, syntax: Syntax) -> Vec<String> {
    let marker = match syntax {
        Syntax::Org => '*',
        Syntax::Markdown => '#',
    };
    document
        .lines()
        .map(|line| {
            let trimmed = line.trim_start_matches(marker);
            let run = line.len() - trimmed.len();
            if run > 0 && trimmed.starts_with(' ') {
                format!("{}{}", marker, line)
            } else {
                line.to_string()
            }
        })
        .collect()
}
