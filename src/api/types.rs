//! Wire types for the Zotero local API
//!
//! The API wraps every record's fields in a `data` object. One
//! permissive `RecordData` covers items, attachments, and annotations;
//! absent fields default to empty, matching the engine's "defaults,
//! never errors" contract.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::annotations::{Annotation, AnnotationKind, Attachment};

/// One record as returned by the API: `{ "key": ..., "data": {...} }`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRecord {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub data: RecordData,
}

/// The `data` payload of an item, attachment, or annotation record
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordData {
    pub key: String,
    pub item_type: String,
    pub title: String,
    pub content_type: String,
    pub filename: String,
    pub parent_item: String,
    pub annotation_type: String,
    pub annotation_text: String,
    pub annotation_comment: String,
    pub annotation_color: String,
    pub annotation_page_label: String,
    pub annotation_sort_index: String,
    /// Raw position blob; an object or a JSON-encoded string of one
    pub annotation_position: Value,
    pub tags: Vec<TagRecord>,
    pub date_added: String,
    pub date_modified: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagRecord {
    #[serde(default)]
    pub tag: String,
}

/// A group library row from `/api/users/0/groups`
#[derive(Debug, Clone, Deserialize)]
pub struct GroupRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data: GroupData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupData {
    #[serde(default)]
    pub name: String,
}

impl GroupRecord {
    pub fn display_name(&self) -> &str {
        if !self.data.name.is_empty() {
            &self.data.name
        } else {
            &self.name
        }
    }
}

impl ApiRecord {
    /// The record key, preferring the data payload's copy
    pub fn record_key(&self) -> &str {
        if !self.data.key.is_empty() {
            &self.data.key
        } else {
            &self.key
        }
    }

    pub fn is_attachment(&self) -> bool {
        self.data.item_type == "attachment"
    }

    pub fn is_annotation(&self) -> bool {
        self.data.item_type == "annotation"
    }

    /// Normalize an annotation record into the engine model.
    pub fn to_annotation(&self) -> Annotation {
        let data = &self.data;
        Annotation {
            key: self.record_key().to_string(),
            kind: AnnotationKind::from_str(&data.annotation_type),
            text: data.annotation_text.clone(),
            comment: data.annotation_comment.clone(),
            color: data.annotation_color.clone(),
            page_label: data.annotation_page_label.clone(),
            sort_index: data.annotation_sort_index.clone(),
            page_index: data.page_index(),
            tags: data
                .tags
                .iter()
                .filter(|t| !t.tag.is_empty())
                .map(|t| t.tag.clone())
                .collect(),
            date_added: parse_timestamp(&data.date_added),
            date_modified: parse_timestamp(&data.date_modified),
        }
    }

    /// Normalize an attachment record (without its annotations).
    pub fn to_attachment(&self) -> Attachment {
        Attachment {
            key: self.record_key().to_string(),
            title: self.data.title.clone(),
            filename: self.data.filename.clone(),
            path: None,
            content_type: self.data.content_type.clone(),
            annotations: Vec::new(),
        }
    }
}

impl RecordData {
    /// 0-indexed physical page from the raw annotation position.
    ///
    /// The position arrives either as an object or as a JSON-encoded
    /// string of one; both forms carry `pageIndex` for PDFs.
    pub fn page_index(&self) -> Option<u32> {
        let position = match &self.annotation_position {
            Value::Object(_) => self.annotation_position.clone(),
            Value::String(raw) => serde_json::from_str(raw).ok()?,
            _ => return None,
        };
        position.get("pageIndex")?.as_u64().map(|i| i as u32)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
