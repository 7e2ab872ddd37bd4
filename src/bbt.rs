//! Better BibTeX JSON-RPC client
//!
//! The Better BibTeX plugin exposes a JSON-RPC API with richer
//! annotation data than the native local API (notably on-disk
//! attachment paths, needed for chapter-map extraction). When the
//! plugin is reachable it is preferred; otherwise callers fall back
//! to [`crate::api::ZoteroClient`].

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::annotations::{Attachment, ItemAnnotations, Library};
use crate::api::ApiRecord;
use crate::config::BbtConfig;
use crate::error::{AppError, Result};

/// Zotero's default annotation palette, hex color to category name
pub fn color_category(hex_color: &str) -> Option<&'static str> {
    match hex_color.to_ascii_lowercase().as_str() {
        "#ffd400" => Some("Yellow"),
        "#ff6666" => Some("Red"),
        "#5fb236" => Some("Green"),
        "#2ea8e5" => Some("Blue"),
        "#a28ae5" => Some("Purple"),
        "#e56eee" => Some("Magenta"),
        "#f19837" => Some("Orange"),
        "#aaaaaa" => Some("Gray"),
        _ => None,
    }
}

/// One attachment row from `item.attachments`, annotations embedded
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct BbtAttachment {
    path: String,
    open: String,
    title: String,
    annotations: Vec<Value>,
}

/// A search hit from `item.search`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct BbtItem {
    citekey: String,
    title: String,
    #[serde(rename = "itemType")]
    item_type: String,
}

/// Client for the Better BibTeX JSON-RPC endpoint
#[derive(Debug, Clone)]
pub struct BetterBibTexClient {
    http: reqwest::Client,
    base_url: String,
}

impl BetterBibTexClient {
    pub fn new(config: &BbtConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });
        let url = format!("{}/better-bibtex/json-rpc", self.base_url);
        debug!(%url, method, "JSON-RPC");

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        let body: Value = response.json().await?;

        if let Some(error) = body.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error");
            let detail = error.get("data").and_then(|d| d.as_str()).unwrap_or("");
            let full = if detail.is_empty() {
                message.to_string()
            } else {
                format!("{}: {}", message, detail)
            };
            return Err(AppError::BetterBibTex(full));
        }

        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Probe whether the plugin is running and accepting requests.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/better-bibtex/cayw?probe=true", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => matches!(response.text().await.as_deref(), Ok("ready")),
            Err(_) => false,
        }
    }

    /// Resolve an item key to its citation key.
    pub async fn citation_key(&self, item_key: &str, library: &Library) -> Result<Option<String>> {
        let full_key = format!("{}:{}", library.id(), item_key);
        let mapping = self
            .request("item.citationkey", json!([[full_key]]))
            .await?;
        Ok(mapping
            .get(full_key.as_str())
            .and_then(|v| v.as_str())
            .map(String::from))
    }

    /// Look up basic item data by citation key.
    async fn search_item(&self, citekey: &str) -> Result<Option<BbtItem>> {
        let results = self.request("item.search", json!([citekey])).await?;
        let hits: Vec<BbtItem> = serde_json::from_value(results).unwrap_or_default();
        Ok(hits.into_iter().find(|hit| hit.citekey == citekey))
    }

    /// Fetch everything needed to render one item, BBT flavor.
    ///
    /// The result matches [`crate::api::ZoteroClient::item_annotations`]
    /// in shape, with the citation key and on-disk attachment paths
    /// filled in.
    pub async fn item_annotations(&self, item_key: &str, library: &Library) -> Result<ItemAnnotations> {
        let citekey = self
            .citation_key(item_key, library)
            .await?
            .ok_or_else(|| {
                AppError::BetterBibTex(format!("No citation key found for item {}", item_key))
            })?;

        let item = self.search_item(&citekey).await?.ok_or_else(|| {
            AppError::BetterBibTex(format!("Item not found for citekey {}", citekey))
        })?;

        let raw = self
            .request("item.attachments", json!([citekey, library.id()]))
            .await?;
        let rows: Vec<BbtAttachment> = serde_json::from_value(raw).unwrap_or_default();

        let attachments = rows
            .into_iter()
            .filter_map(|row| normalize_attachment(row))
            .collect();

        Ok(ItemAnnotations {
            key: item_key.to_string(),
            title: item.title,
            item_type: item.item_type,
            citation_key: Some(citekey),
            attachments,
            error: None,
        })
    }
}

/// Normalize one BBT attachment row into the engine model.
///
/// BBT returns annotation fields at the top level where the native API
/// wraps them in a `data` object; re-wrapping lets one `ApiRecord`
/// normalizer serve both sources.
fn normalize_attachment(row: BbtAttachment) -> Option<Attachment> {
    let filename = row
        .path
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or("")
        .to_string();

    // Attachment key: the `open` URL, or the first annotation's parent
    let mut key = row
        .open
        .rsplit_once("/items/")
        .map(|(_, tail)| tail.split('?').next().unwrap_or("").to_string())
        .unwrap_or_default();
    if key.is_empty() {
        key = row
            .annotations
            .first()
            .and_then(|a| a.get("parentItem"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
    }
    if key.is_empty() && filename.is_empty() {
        return None;
    }

    let annotations = row
        .annotations
        .iter()
        .filter_map(|raw| {
            let wrapped = json!({
                "key": raw.get("key").cloned().unwrap_or(Value::String(String::new())),
                "data": raw,
            });
            serde_json::from_value::<ApiRecord>(wrapped).ok()
        })
        .map(|record| record.to_annotation())
        .collect();

    let title = if !row.title.is_empty() {
        row.title
    } else if !filename.is_empty() {
        filename.clone()
    } else {
        "Unknown".to_string()
    };

    let content_type = mime_guess::from_path(&filename)
        .first_raw()
        .unwrap_or("")
        .to_string();

    Some(Attachment {
        key,
        title,
        filename,
        path: if row.path.is_empty() { None } else { Some(row.path) },
        content_type,
        annotations,
    })
}
