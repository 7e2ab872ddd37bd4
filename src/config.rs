//! Configuration management for Marginalia
//!
//! Every knob has a default; `from_env()` never fails. Values come from
//! the process environment (optionally seeded from `.env` via dotenvy
//! in `main`).

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub bbt: BbtConfig,
    pub storage: StorageConfig,
    pub toc: TocConfig,
}

/// Zotero local API endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

/// Better BibTeX plugin endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct BbtConfig {
    pub base_url: String,
}

/// Where Zotero keeps attachment files on disk
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub zotero_dir: PathBuf,
}

/// Chapter map extraction settings
#[derive(Debug, Clone, Deserialize)]
pub struct TocConfig {
    /// Maximum outline depth included in chapter maps
    pub max_depth: u32,
    /// External command that prints a JSON chapter map for a PDF path.
    /// Unset means PDF chapter maps are unavailable.
    pub pdf_command: Option<String>,
    /// Bounded size of the per-attachment chapter map cache
    pub cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig {
                base_url: "http://localhost:23119".to_string(),
            },
            bbt: BbtConfig {
                base_url: "http://127.0.0.1:23119".to_string(),
            },
            storage: StorageConfig {
                zotero_dir: default_zotero_dir(),
            },
            toc: TocConfig {
                max_depth: 2,
                pdf_command: None,
                cache_size: 64,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            api: ApiConfig {
                base_url: env::var("ZOTERO_BASE_URL")
                    .map(|u| u.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.api.base_url),
            },
            bbt: BbtConfig {
                base_url: env::var("BBT_BASE_URL")
                    .map(|u| u.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.bbt.base_url),
            },
            storage: StorageConfig {
                zotero_dir: env::var("ZOTERO_STORAGE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.zotero_dir),
            },
            toc: TocConfig {
                max_depth: env::var("CHAPTER_MAP_DEPTH")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.toc.max_depth),
                pdf_command: env::var("CHAPTER_MAP_COMMAND")
                    .ok()
                    .filter(|c| !c.is_empty()),
                cache_size: env::var("CHAPTER_MAP_CACHE_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.toc.cache_size),
            },
        }
    }
}

fn default_zotero_dir() -> PathBuf {
    match env::var("HOME") {
        Ok(home) => PathBuf::from(home).join("Zotero").join("storage"),
        Err(_) => PathBuf::from("Zotero").join("storage"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:23119");
        assert_eq!(config.toc.max_depth, 2);
        assert!(config.toc.pdf_command.is_none());
    }

    #[test]
    fn test_storage_dir_ends_with_storage() {
        let config = Config::default();
        assert!(config.storage.zotero_dir.ends_with("storage"));
    }
}
