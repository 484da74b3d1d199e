//! Uploaded image files.
//!
//! Files live under `media_root/<folder>/<uuid>.<ext>`. The database stores
//! the path relative to the media root (`recipes/<uuid>.png`); clients get it
//! prefixed with the public media URL.

use std::io;
use std::path::{Component, Path, PathBuf};

use foodgram_core::DecodedImage;
use uuid::Uuid;

pub const RECIPES_FOLDER: &str = "recipes";
pub const AVATARS_FOLDER: &str = "avatars";

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `image` under `folder` with a generated name and return the
    /// stored relative path.
    pub async fn save(&self, folder: &str, image: &DecodedImage) -> io::Result<String> {
        let name = format!("{folder}/{}.{}", Uuid::new_v4(), image.extension());
        let path = self.root.join(&name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &image.data).await?;
        tracing::debug!(file = %name, bytes = image.data.len(), "Stored media file");
        Ok(name)
    }

    /// Delete a stored file. Failures are logged, not returned: the row that
    /// referenced the file is already gone or updated by the time this runs.
    pub async fn remove(&self, name: &str) {
        let Some(path) = self.resolve(name) else {
            tracing::warn!(file = %name, "Refusing to remove media path outside the media root");
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file = %name, error = %e, "Failed to remove media file"),
        }
    }

    /// Public URL for a stored relative path.
    pub fn url(&self, name: &str) -> String {
        format!("{}{}", self.base_url, name.trim_start_matches('/'))
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
            .then(|| self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    fn image() -> DecodedImage {
        DecodedImage {
            data: b"not checked here".to_vec(),
            format: ImageFormat::Png,
        }
    }

    #[test]
    fn test_url_joins_base_and_name() {
        let store = MediaStore::new("media", "/media/");
        assert_eq!(
            store.url("recipes/a.png"),
            "/media/recipes/a.png"
        );
    }

    #[tokio::test]
    async fn test_save_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "/media/");

        let name = store.save(RECIPES_FOLDER, &image()).await.unwrap();
        assert!(name.starts_with("recipes/"));
        assert!(name.ends_with(".png"));
        let path = dir.path().join(&name);
        assert_eq!(std::fs::read(&path).unwrap(), image().data);

        store.remove(&name).await;
        assert!(!path.exists());

        // Removing twice is not an error
        store.remove(&name).await;
    }

    #[tokio::test]
    async fn test_remove_ignores_paths_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("keep.txt");
        std::fs::write(&outside, b"x").unwrap();

        let store = MediaStore::new(dir.path().join("media"), "/media/");
        store.remove("../keep.txt").await;
        assert!(outside.exists());
    }
}
