//! Zotero local API client
//!
//! Upstream collaborator that fetches items, attachments, and raw
//! annotation records from a running Zotero's local web API and
//! normalizes them into the engine model. Fetch failures become the
//! aggregate error marker, never a panic or a rendered stack trace.

mod client;
mod types;

pub use client::ZoteroClient;
pub use types::{ApiRecord, GroupRecord, RecordData, TagRecord};
