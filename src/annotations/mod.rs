//! Normalized annotation model
//!
//! Both upstream sources (the Zotero local API and the Better BibTeX
//! JSON-RPC bridge) are normalized into these types before the render
//! engine ever sees them.

mod types;

pub use types::{
    Annotation, AnnotationKind, Attachment, CollectionAnnotations, ItemAnnotations, Library,
    EPUB_CONTENT_TYPE, PDF_CONTENT_TYPE,
};
