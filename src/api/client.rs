//! HTTP client for the Zotero local API

use futures::future::join_all;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::annotations::{
    Annotation, Attachment, CollectionAnnotations, ItemAnnotations, Library, EPUB_CONTENT_TYPE,
    PDF_CONTENT_TYPE,
};
use crate::config::ApiConfig;
use crate::error::{AppError, Result};

use super::types::{ApiRecord, GroupRecord};

/// Page size when listing library or collection items
const LIST_LIMIT: usize = 1000;

/// Client for a running Zotero's local web API
#[derive(Debug, Clone)]
pub struct ZoteroClient {
    http: reqwest::Client,
    base_url: String,
}

impl ZoteroClient {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(path.to_string()));
        }
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(path.to_string()));
        }
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Get a single item by key.
    pub async fn get_item(&self, item_key: &str, library: &Library) -> Result<ApiRecord> {
        let path = format!(
            "{}/items/{}",
            library.api_prefix(),
            urlencoding::encode(item_key)
        );
        self.get_json(&path).await
    }

    /// Get all children of an item (attachments, notes, annotations).
    pub async fn get_item_children(
        &self,
        item_key: &str,
        library: &Library,
    ) -> Result<Vec<ApiRecord>> {
        let path = format!(
            "{}/items/{}/children",
            library.api_prefix(),
            urlencoding::encode(item_key)
        );
        self.get_json(&path).await
    }

    /// List items, optionally filtered by item type.
    pub async fn get_items(
        &self,
        library: &Library,
        limit: usize,
        item_type: Option<&str>,
    ) -> Result<Vec<ApiRecord>> {
        let mut path = format!("{}/items?limit={}", library.api_prefix(), limit);
        if let Some(item_type) = item_type {
            path.push_str(&format!("&itemType={}", urlencoding::encode(item_type)));
        }
        self.get_json(&path).await
    }

    /// File attachments (PDF/EPUB) of an item.
    pub async fn file_attachments(
        &self,
        item_key: &str,
        library: &Library,
    ) -> Result<Vec<ApiRecord>> {
        let children = self.get_item_children(item_key, library).await?;
        Ok(children
            .into_iter()
            .filter(|child| child.is_attachment() && is_renderable_attachment(child))
            .collect())
    }

    /// Annotations attached to one attachment.
    ///
    /// The standard path is the attachment's children. Some libraries
    /// return annotations only as top-level records, so an empty
    /// result falls back to listing annotation items and matching on
    /// `parentItem`.
    pub async fn attachment_annotations(
        &self,
        attachment_key: &str,
        library: &Library,
    ) -> Result<Vec<ApiRecord>> {
        let children = self.get_item_children(attachment_key, library).await?;
        let mut annotations: Vec<ApiRecord> =
            children.into_iter().filter(ApiRecord::is_annotation).collect();

        if annotations.is_empty() {
            let all = self
                .get_items(library, LIST_LIMIT, Some("annotation"))
                .await?;
            annotations = all
                .into_iter()
                .filter(|record| record.data.parent_item == attachment_key)
                .collect();
        }

        Ok(annotations)
    }

    /// Fetch everything needed to render one item.
    ///
    /// Failures are folded into the aggregate error marker so the
    /// caller can always hand the result to the assembler.
    pub async fn item_annotations(&self, item_key: &str, library: &Library) -> ItemAnnotations {
        let item = match self.get_item(item_key, library).await {
            Ok(item) => item,
            Err(AppError::NotFound(_)) => {
                return ItemAnnotations::error(item_key, format!("Item {} not found", item_key));
            }
            Err(e) => {
                warn!(item_key, error = %e, "item fetch failed");
                return ItemAnnotations::error(item_key, e.to_string());
            }
        };

        let attachment_records = match self.file_attachments(item_key, library).await {
            Ok(records) => records,
            Err(e) => {
                warn!(item_key, error = %e, "attachment listing failed");
                return ItemAnnotations::error(item_key, e.to_string());
            }
        };

        let fetches = attachment_records
            .iter()
            .map(|att| self.attachment_annotations(att.record_key(), library));
        let fetched = join_all(fetches).await;

        let attachments = attachment_records
            .iter()
            .zip(fetched)
            .map(|(record, result)| {
                let mut attachment = record.to_attachment();
                attachment.annotations = match result {
                    Ok(records) => records.iter().map(ApiRecord::to_annotation).collect(),
                    Err(e) => {
                        warn!(attachment = record.record_key(), error = %e,
                              "annotation fetch failed, treating as empty");
                        Vec::<Annotation>::new()
                    }
                };
                attachment
            })
            .collect::<Vec<Attachment>>();

        ItemAnnotations {
            key: item_key.to_string(),
            title: item.data.title.clone(),
            item_type: item.data.item_type.clone(),
            citation_key: None,
            attachments,
            error: None,
        }
    }

    /// Collection metadata.
    pub async fn collection_info(
        &self,
        collection_key: &str,
        library: &Library,
    ) -> Result<serde_json::Value> {
        let path = format!(
            "{}/collections/{}",
            library.api_prefix(),
            urlencoding::encode(collection_key)
        );
        self.get_json(&path).await
    }

    /// Items belonging to a collection.
    pub async fn collection_items(
        &self,
        collection_key: &str,
        library: &Library,
    ) -> Result<Vec<ApiRecord>> {
        let path = format!(
            "{}/collections/{}/items?limit={}",
            library.api_prefix(),
            urlencoding::encode(collection_key),
            LIST_LIMIT
        );
        self.get_json(&path).await
    }

    /// Fetch everything needed to render one collection.
    ///
    /// Only top-level items carrying at least one annotation are kept.
    pub async fn collection_annotations(
        &self,
        collection_key: &str,
        library: &Library,
    ) -> CollectionAnnotations {
        let info = match self.collection_info(collection_key, library).await {
            Ok(info) => info,
            Err(_) => {
                return CollectionAnnotations::error(
                    collection_key,
                    format!("Collection {} not found", collection_key),
                );
            }
        };

        let records = match self.collection_items(collection_key, library).await {
            Ok(records) => records,
            Err(e) => return CollectionAnnotations::error(collection_key, e.to_string()),
        };

        let top_level: Vec<&ApiRecord> = records
            .iter()
            .filter(|r| !matches!(r.data.item_type.as_str(), "attachment" | "note" | "annotation"))
            .collect();

        let fetches = top_level
            .iter()
            .map(|record| self.item_annotations(record.record_key(), library));
        let items: Vec<ItemAnnotations> = join_all(fetches)
            .await
            .into_iter()
            .filter(|item| item.error.is_none() && item.annotation_count() > 0)
            .collect();

        CollectionAnnotations {
            key: collection_key.to_string(),
            name: info
                .pointer("/data/name")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown")
                .to_string(),
            parent: info
                .pointer("/data/parentCollection")
                .and_then(|v| v.as_str())
                .map(String::from),
            library_id: library.id(),
            total_items: top_level.len(),
            items,
            error: None,
        }
    }

    /// All group libraries visible to the running Zotero.
    pub async fn libraries(&self) -> Result<Vec<GroupRecord>> {
        self.get_json("/api/users/0/groups").await
    }

    /// Export one item as BibTeX.
    pub async fn export_bibtex(&self, item_key: &str, library: &Library) -> Result<String> {
        let path = format!(
            "{}/items/{}?format=bibtex",
            library.api_prefix(),
            urlencoding::encode(item_key)
        );
        Ok(self.get_text(&path).await?.trim().to_string())
    }
}

/// Attachments worth rendering: PDF or EPUB, by declared content type
/// or by filename when the record left the type blank.
fn is_renderable_attachment(record: &ApiRecord) -> bool {
    let declared = &record.data.content_type;
    if !declared.is_empty() {
        return declared == PDF_CONTENT_TYPE || declared == EPUB_CONTENT_TYPE;
    }
    matches!(
        mime_guess::from_path(&record.data.filename).first_raw(),
        Some(PDF_CONTENT_TYPE) | Some(EPUB_CONTENT_TYPE)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(item_type: &str, content_type: &str, filename: &str) -> ApiRecord {
        serde_json::from_str(&format!(
            r#"{{"key": "K", "data": {{"itemType": "{}", "contentType": "{}", "filename": "{}"}}}}"#,
            item_type, content_type, filename
        ))
        .unwrap()
    }

    #[test]
    fn test_renderable_attachment_by_content_type() {
        assert!(is_renderable_attachment(&record(
            "attachment",
            "application/pdf",
            "a.pdf"
        )));
        assert!(is_renderable_attachment(&record(
            "attachment",
            "application/epub+zip",
            "b.epub"
        )));
        assert!(!is_renderable_attachment(&record(
            "attachment",
            "text/html",
            "snapshot.html"
        )));
    }

    #[test]
    fn test_renderable_attachment_filename_fallback() {
        assert!(is_renderable_attachment(&record("attachment", "", "a.pdf")));
        assert!(is_renderable_attachment(&record("attachment", "", "b.epub")));
        assert!(!is_renderable_attachment(&record("attachment", "", "notes.txt")));
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ZoteroClient::new(&ApiConfig {
            base_url: "http://localhost:23119/".to_string(),
        });
        assert_eq!(client.base_url, "http://localhost:23119");
    }
}
