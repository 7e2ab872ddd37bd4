//! Core annotation types
//!
//! A read-only snapshot of one item's annotations: the item, its file
//! attachments, and each attachment's annotation records in the order
//! the source returned them. The render engine never mutates these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MIME type selecting the PDF link scheme
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
/// MIME type selecting the EPUB link scheme
pub const EPUB_CONTENT_TYPE: &str = "application/epub+zip";

/// Which library an item lives in, for API paths and deep links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Library {
    /// The personal library (id 1 by convention)
    Personal,
    /// A shared group library
    Group(i64),
}

impl Library {
    /// Interpret a numeric library id (1 = personal, anything else a group)
    pub fn from_id(id: i64) -> Self {
        if id == 1 {
            Library::Personal
        } else {
            Library::Group(id)
        }
    }

    /// Numeric id as used by Better BibTeX
    pub fn id(&self) -> i64 {
        match self {
            Library::Personal => 1,
            Library::Group(id) => *id,
        }
    }

    /// Path segment for `zotero://` links: `library` or `groups/{id}`
    pub fn link_segment(&self) -> String {
        match self {
            Library::Personal => "library".to_string(),
            Library::Group(id) => format!("groups/{}", id),
        }
    }

    /// Path prefix for the local web API
    pub fn api_prefix(&self) -> String {
        match self {
            Library::Personal => "/api/users/0".to_string(),
            Library::Group(id) => format!("/api/groups/{}", id),
        }
    }
}

impl Default for Library {
    fn default() -> Self {
        Library::Personal
    }
}

/// Annotation kinds understood by the renderer
///
/// Anything the source reports that we don't model falls back to
/// `Other` and renders through the generic path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Highlight,
    Underline,
    Note,
    Image,
    Ink,
    Other,
}

impl<'de> Deserialize<'de> for AnnotationKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(AnnotationKind::from_str(&raw))
    }
}

impl AnnotationKind {
    pub fn from_str(kind: &str) -> Self {
        match kind {
            "highlight" => AnnotationKind::Highlight,
            "underline" => AnnotationKind::Underline,
            "note" => AnnotationKind::Note,
            "image" => AnnotationKind::Image,
            "ink" => AnnotationKind::Ink,
            _ => AnnotationKind::Other,
        }
    }

    /// Human-readable name used in placeholder blocks
    pub fn display_name(&self) -> &'static str {
        match self {
            AnnotationKind::Highlight => "Highlight",
            AnnotationKind::Underline => "Underline",
            AnnotationKind::Note => "Note",
            AnnotationKind::Image => "Image",
            AnnotationKind::Ink => "Ink",
            AnnotationKind::Other => "Annotation",
        }
    }
}

/// A single annotation record
///
/// All fields except `kind` default to empty when the source omits
/// them; the renderer resolves emptiness via documented fallbacks
/// rather than errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Opaque stable identifier, unique within an attachment
    pub key: String,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    /// Highlighted/underlined source text
    #[serde(default)]
    pub text: String,
    /// Free-text comment attached by the reader
    #[serde(default)]
    pub comment: String,
    /// Highlight color as a hex string
    #[serde(default)]
    pub color: String,
    /// Display page label; may be numeric, a chapter label, or an
    /// EPUB spine index
    #[serde(default)]
    pub page_label: String,
    /// Composite positional string used for fine-grained ordering
    #[serde(default)]
    pub sort_index: String,
    /// 0-indexed physical page from the raw annotation position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_index: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<DateTime<Utc>>,
}

impl Annotation {
    pub fn new(key: &str, kind: AnnotationKind) -> Self {
        Self {
            key: key.to_string(),
            kind,
            text: String::new(),
            comment: String::new(),
            color: String::new(),
            page_label: String::new(),
            sort_index: String::new(),
            page_index: None,
            tags: Vec::new(),
            date_added: None,
            date_modified: None,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }

    pub fn with_page_label(mut self, label: &str) -> Self {
        self.page_label = label.to_string();
        self
    }

    pub fn with_sort_index(mut self, index: &str) -> Self {
        self.sort_index = index.to_string();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// A file attachment and its annotations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub filename: String,
    /// Absolute path on disk when the source reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Attachment {
    /// Effective content type, falling back to a guess from the
    /// filename when the source left it blank
    pub fn effective_content_type(&self) -> String {
        if !self.content_type.is_empty() {
            return self.content_type.clone();
        }
        mime_guess::from_path(&self.filename)
            .first_raw()
            .unwrap_or("")
            .to_string()
    }

    pub fn is_epub(&self) -> bool {
        self.effective_content_type() == EPUB_CONTENT_TYPE
    }
}

/// Everything fetched for one item, ready to render
///
/// Upstream fetch failures are carried as an `error` marker rather
/// than an `Err`, so a failed item still renders (as a one-line error
/// comment).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAnnotations {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_key: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemAnnotations {
    /// An aggregate carrying only an error marker
    pub fn error(key: &str, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn annotation_count(&self) -> usize {
        self.attachments.iter().map(|a| a.annotations.len()).sum()
    }
}

/// Everything fetched for one collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionAnnotations {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub library_id: i64,
    /// Total items in the collection, including those without annotations
    #[serde(default)]
    pub total_items: usize,
    /// Items that carried at least one annotation
    #[serde(default)]
    pub items: Vec<ItemAnnotations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectionAnnotations {
    pub fn error(key: &str, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            error: Some(message.into()),
            ..Default::default()
        }
    }
}
