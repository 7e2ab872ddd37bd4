//! Annotation rendering engine
//!
//! Pure, synchronous transformation of a normalized annotation set
//! (plus optional chapter maps) into one org-mode or Markdown
//! document. Collaborators that block (the local API, Better BibTeX,
//! chapter-map extraction) run strictly upstream and hand this module
//! already-resolved inputs.

pub mod block;
pub mod chapters;
pub mod document;
pub mod links;
pub mod order;
pub mod syntax;

pub use block::{render_block, render_block_simple, BlockContext};
pub use chapters::{
    chapters_at, effective_position, is_spine_index, ChapterMap, ChapterMapEntry, HeadingStack,
};
pub use document::{assemble_collection, assemble_item, render_annotation_listing, ChapterMaps};
pub use links::{build_annotation_link, build_open_pdf_link, AnnotationLink};
pub use order::{reading_order_key, sort_annotations, sorted_annotations};
pub use syntax::Syntax;
