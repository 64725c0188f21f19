//! Writes rendered posts under a content root, one folder per blog.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use scribe_core::ports::{ExportError, PostExporter};

pub struct FileSystemExporter {
    root: PathBuf,
}

impl FileSystemExporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Content root from `CONTENT_DIR`, defaulting to `./content`.
    pub fn from_env() -> Self {
        Self::new(std::env::var("CONTENT_DIR").unwrap_or_else(|_| "./content".to_string()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// A single plain path segment: no separators, no `..`, not empty.
fn check_segment(segment: &str) -> Result<(), ExportError> {
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !segment.contains(['/', '\\']) => Ok(()),
        _ => Err(ExportError::InvalidPath(segment.to_string())),
    }
}

#[async_trait]
impl PostExporter for FileSystemExporter {
    async fn write(
        &self,
        folder: &str,
        file_stem: &str,
        contents: &str,
    ) -> Result<PathBuf, ExportError> {
        check_segment(folder)?;
        check_segment(file_stem)?;

        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{file_stem}.md"));
        tokio::fs::write(&path, contents).await?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "Markdown written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_blog_folder() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FileSystemExporter::new(dir.path());

        let path = exporter
            .write("FieldNotes", "hello-world", "---\ntitle: 'Hello'\n---\n")
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("FieldNotes").join("hello-world.md"));
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.starts_with("---\ntitle: 'Hello'"));
    }

    #[tokio::test]
    async fn test_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FileSystemExporter::new(dir.path());

        exporter.write("Blog", "post", "first").await.unwrap();
        let path = exporter.write("Blog", "post", "second").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(path).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_path_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FileSystemExporter::new(dir.path());

        for (folder, stem) in [("..", "post"), ("Blog", "../escape"), ("", "post"), ("a/b", "post")] {
            let result = exporter.write(folder, stem, "x").await;
            assert!(
                matches!(result, Err(ExportError::InvalidPath(_))),
                "{folder}/{stem} should be rejected"
            );
        }
    }
}
