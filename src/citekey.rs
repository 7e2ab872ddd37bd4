//! Citation key resolution
//!
//! Defines the source trait and implementations for the two ways a
//! citation key can be obtained: the Better BibTeX JSON-RPC API
//! (fast, authoritative) and a BibTeX export from the native API with
//! the key parsed out (slow, always available). A resolver tries
//! sources in order and takes the first hit.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::annotations::Library;
use crate::api::ZoteroClient;
use crate::bbt::BetterBibTexClient;
use crate::error::Result;

/// The entry key of a BibTeX record: `@book{key,` and friends
static BIBTEX_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\w+\s*\{\s*([^,\s]+)\s*,").unwrap());

/// A way to obtain citation keys
#[async_trait]
pub trait CitekeySource: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Whether the source is worth asking at all
    async fn is_available(&self) -> bool;

    /// Resolve an item key to a citation key, `None` when the source
    /// has no answer
    async fn citation_key(&self, item_key: &str, library: &Library) -> Result<Option<String>>;
}

#[async_trait]
impl CitekeySource for BetterBibTexClient {
    fn name(&self) -> &'static str {
        "better-bibtex"
    }

    async fn is_available(&self) -> bool {
        BetterBibTexClient::is_available(self).await
    }

    async fn citation_key(&self, item_key: &str, library: &Library) -> Result<Option<String>> {
        BetterBibTexClient::citation_key(self, item_key, library).await
    }
}

/// Fallback source: export the item as BibTeX and parse the entry key
pub struct BibtexExportSource {
    client: ZoteroClient,
}

impl BibtexExportSource {
    pub fn new(client: ZoteroClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CitekeySource for BibtexExportSource {
    fn name(&self) -> &'static str {
        "bibtex-export"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn citation_key(&self, item_key: &str, library: &Library) -> Result<Option<String>> {
        let bibtex = self.client.export_bibtex(item_key, library).await?;
        Ok(extract_bibtex_key(&bibtex))
    }
}

/// Pull the entry key out of a BibTeX export.
pub fn extract_bibtex_key(bibtex: &str) -> Option<String> {
    BIBTEX_KEY
        .captures(bibtex)
        .map(|captures| captures[1].to_string())
}

/// Tries its sources in order; availability is checked once per call
/// site, not cached in hidden module state.
pub struct CitekeyResolver {
    sources: Vec<Box<dyn CitekeySource>>,
}

impl CitekeyResolver {
    pub fn new(sources: Vec<Box<dyn CitekeySource>>) -> Self {
        Self { sources }
    }

    /// Standard source order: Better BibTeX first, export fallback.
    pub fn standard(bbt: BetterBibTexClient, api: ZoteroClient) -> Self {
        Self::new(vec![
            Box::new(bbt),
            Box::new(BibtexExportSource::new(api)),
        ])
    }

    pub async fn resolve(&self, item_key: &str, library: &Library) -> Option<String> {
        for source in &self.sources {
            if !source.is_available().await {
                debug!(source = source.name(), "citekey source unavailable");
                continue;
            }
            match source.citation_key(item_key, library).await {
                Ok(Some(key)) => {
                    debug!(source = source.name(), %key, "citation key resolved");
                    return Some(key);
                }
                Ok(None) => continue,
                Err(e) => {
                    debug!(source = source.name(), error = %e, "citekey lookup failed");
                    continue;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Canned source for resolver tests
    struct MockSource {
        available: bool,
        answer: Option<String>,
    }

    #[async_trait]
    impl CitekeySource for MockSource {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        async fn citation_key(&self, _item_key: &str, _library: &Library) -> Result<Option<String>> {
            Ok(self.answer.clone())
        }
    }

    #[test]
    fn test_extract_bibtex_key() {
        let bibtex = "@book{smith2023title,\n  author = {Smith, Jane},\n}";
        assert_eq!(extract_bibtex_key(bibtex), Some("smith2023title".to_string()));
    }

    #[test]
    fn test_extract_bibtex_key_with_whitespace() {
        let bibtex = "@article { doe_2020 ,\n title = {X}}";
        assert_eq!(extract_bibtex_key(bibtex), Some("doe_2020".to_string()));
    }

    #[test]
    fn test_extract_bibtex_key_absent() {
        assert_eq!(extract_bibtex_key("not bibtex at all"), None);
        assert_eq!(extract_bibtex_key(""), None);
    }

    #[tokio::test]
    async fn test_resolver_takes_first_available_hit() {
        let resolver = CitekeyResolver::new(vec![
            Box::new(MockSource {
                available: false,
                answer: Some("unavailable2000".to_string()),
            }),
            Box::new(MockSource {
                available: true,
                answer: None,
            }),
            Box::new(MockSource {
                available: true,
                answer: Some("smith2023".to_string()),
            }),
        ]);
        let key = resolver.resolve("ABC123", &Library::Personal).await;
        assert_eq!(key, Some("smith2023".to_string()));
    }

    #[tokio::test]
    async fn test_resolver_empty_when_no_source_answers() {
        let resolver = CitekeyResolver::new(vec![Box::new(MockSource {
            available: true,
            answer: None,
        })]);
        assert!(resolver.resolve("ABC123", &Library::Personal).await.is_none());
    }
}
