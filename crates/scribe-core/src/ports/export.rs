//! Markdown export sink.

use std::path::PathBuf;

use async_trait::async_trait;

#[async_trait]
pub trait PostExporter: Send + Sync {
    /// Write a rendered document to `{folder}/{file_stem}.md`, returning where it landed.
    async fn write(
        &self,
        folder: &str,
        file_stem: &str,
        contents: &str,
    ) -> Result<PathBuf, ExportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Invalid export path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
