//! Marginalia
//!
//! Renders a Zotero library's PDF/EPUB annotations into structured
//! org-mode and Markdown documents, preserving reading order,
//! hierarchical chapter context, and citation metadata.
//!
//! # Modules
//!
//! - `annotations`: normalized annotation model
//! - `render`: the pure rendering engine (sorting, chapter headings,
//!   per-annotation blocks, document assembly)
//! - `api`: Zotero local API client
//! - `bbt`: Better BibTeX JSON-RPC client
//! - `citekey`: citation key resolution
//! - `toc`: chapter map extraction and caching
//! - `encoding`: repair of mis-encoded annotation text

pub mod annotations;
pub mod api;
pub mod bbt;
pub mod citekey;
pub mod config;
pub mod encoding;
pub mod error;
pub mod render;
pub mod toc;
