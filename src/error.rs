//! Error types for the Marginalia CLI

use thiserror::Error;

use crate::toc::TocError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Better BibTeX error: {0}")]
    BetterBibTex(String),

    #[error("Chapter map error: {0}")]
    Toc(#[from] TocError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
