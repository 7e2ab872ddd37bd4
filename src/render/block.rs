//! Per-annotation block rendering
//!
//! Each annotation renders to a self-contained group of lines: a link
//! line, a type-specific body, then optional comment, citation marker,
//! and tags. Two variants exist for two call sites:
//!
//! - [`render_block`] is used by the chapter-aware document assembler.
//!   Note comment blocks are always emitted (possibly empty) and the
//!   generic fallback text is repaired.
//! - [`render_block_simple`] backs the flat annotation listing. Empty
//!   note comments skip the block entirely and fallback text passes
//!   through raw.

use crate::annotations::{Annotation, AnnotationKind, Library, EPUB_CONTENT_TYPE};
use crate::encoding::repair;
use crate::render::chapters::is_spine_index;
use crate::render::links::build_annotation_link;
use crate::render::syntax::Syntax;

/// Everything a block needs besides the annotation itself
#[derive(Debug, Clone, Copy)]
pub struct BlockContext<'a> {
    pub library: &'a Library,
    pub attachment_key: &'a str,
    pub content_type: &'a str,
    pub citation_key: Option<&'a str>,
}

/// Render one annotation for chapter-aware document assembly.
pub fn render_block(annotation: &Annotation, ctx: &BlockContext, syntax: Syntax) -> Vec<String> {
    render(annotation, ctx, syntax, RenderMode::Full)
}

/// Render one annotation for the flat per-item listing.
pub fn render_block_simple(
    annotation: &Annotation,
    ctx: &BlockContext,
    syntax: Syntax,
) -> Vec<String> {
    render(annotation, ctx, syntax, RenderMode::Simple)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderMode {
    Full,
    Simple,
}

fn render(
    annotation: &Annotation,
    ctx: &BlockContext,
    syntax: Syntax,
    mode: RenderMode,
) -> Vec<String> {
    let link = build_annotation_link(
        ctx.library,
        ctx.attachment_key,
        &annotation.key,
        &link_location(annotation, ctx.content_type),
        ctx.content_type,
    );
    let link_line = syntax.link_line(&link.uri, &link.label);

    let mut lines = Vec::new();

    match annotation.kind {
        AnnotationKind::Highlight | AnnotationKind::Underline => {
            if annotation.text.is_empty() {
                // Nothing to quote: no block, no link
                return lines;
            }
            lines.push(link_line);
            lines.extend(syntax.quote_block(&repair(&annotation.text)));
            if !annotation.comment.is_empty() {
                push_paragraph(&mut lines, &repair(&annotation.comment));
            }
            if let Some(cite_key) = ctx.citation_key {
                let page = if annotation.page_label.is_empty() {
                    "?"
                } else {
                    annotation.page_label.as_str()
                };
                push_paragraph(&mut lines, &format!("[cite:@{}, p.{}]", cite_key, page));
            }
        }
        AnnotationKind::Note => {
            lines.push(link_line);
            let comment = repair(&annotation.comment);
            match mode {
                RenderMode::Full => lines.extend(syntax.comment_block(&comment)),
                RenderMode::Simple => {
                    if !comment.is_empty() {
                        lines.extend(syntax.comment_block(&comment));
                    }
                }
            }
        }
        AnnotationKind::Image | AnnotationKind::Ink => {
            lines.push(link_line);
            let placeholder = format!("{} annotation, {}", annotation.kind.display_name(), link.label);
            lines.extend(syntax.placeholder_block(&placeholder, mode == RenderMode::Full));
            if !annotation.comment.is_empty() {
                push_paragraph(&mut lines, &repair(&annotation.comment));
            }
        }
        AnnotationKind::Other => {
            lines.push(link_line);
            let fallback = if !annotation.text.is_empty() {
                &annotation.text
            } else {
                &annotation.comment
            };
            if !fallback.is_empty() {
                let fallback = match mode {
                    RenderMode::Full => repair(fallback),
                    RenderMode::Simple => fallback.clone(),
                };
                push_paragraph(&mut lines, &fallback);
            }
        }
    }

    let tag_line = match mode {
        RenderMode::Full => syntax.tag_line(&annotation.tags),
        RenderMode::Simple => syntax.tag_listing(&annotation.tags),
    };
    if let Some(tag_line) = tag_line {
        match syntax {
            Syntax::Org => lines.push(tag_line),
            Syntax::Markdown => push_paragraph(&mut lines, &tag_line),
        }
    }

    lines
}

/// Location string fed to the link builder.
///
/// EPUB attachments keep their label only when it reads as a real
/// location (chapter name or EPUBCFI); synthetic spine indices display
/// as the generic "Location" instead.
fn link_location(annotation: &Annotation, content_type: &str) -> String {
    if content_type == EPUB_CONTENT_TYPE && is_spine_index(&annotation.page_label) {
        return String::new();
    }
    annotation.page_label.clone()
}

fn push_paragraph(lines: &mut Vec<String>, text: &str) {
    lines.push(String::new());
    lines.push(text.to_string());
}
