//! Product image storage.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("only image uploads are accepted, got {0}")]
    NotAnImage(String),

    #[error("upload is empty")]
    Empty,

    #[error("media io error: {0}")]
    Io(#[from] std::io::Error),
}

/// An uploaded file as received from the admin form.
#[derive(Clone, Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// `{unix millis}_{file name}` with anything outside `[A-Za-z0-9._-]` replaced.
    pub fn object_name(&self) -> String {
        let clean: String = self
            .file_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
            .collect();
        let clean = clean.trim_start_matches('.');
        let clean = if clean.is_empty() { "image" } else { clean };
        format!("{}_{}", Utc::now().timestamp_millis(), clean)
    }

    fn check(&self) -> Result<(), MediaError> {
        if !self.content_type.starts_with("image/") { return Err(MediaError::NotAnImage(self.content_type.clone())); }
        if self.bytes.is_empty() { return Err(MediaError::Empty); }
        Ok(())
    }
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores the image and returns its public URL.
    async fn upload(&self, upload: &ImageUpload) -> Result<String, MediaError>;
}

/// Writes images under a directory served at `public_base_url`.
pub struct LocalMediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub async fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Result<Self, MediaError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root, public_base_url: public_base_url.into().trim_end_matches('/').to_string() })
    }

    pub fn root(&self) -> &PathBuf { &self.root }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, upload: &ImageUpload) -> Result<String, MediaError> {
        upload.check()?;
        let name = upload.object_name();
        tokio::fs::write(self.root.join(&name), &upload.bytes).await?;
        info!(%name, bytes = upload.bytes.len(), "Stored product image");
        Ok(format!("{}/{}", self.public_base_url, name))
    }
}

/// Keeps uploads in memory.
#[derive(Default)]
pub struct MemoryMediaStore {
    objects: RwLock<HashMap<String, ImageUpload>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self) -> usize { self.objects.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.objects.read().await.is_empty() }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn upload(&self, upload: &ImageUpload) -> Result<String, MediaError> {
        upload.check()?;
        let name = upload.object_name();
        self.objects.write().await.insert(name.clone(), upload.clone());
        Ok(format!("memory://product-images/{name}"))
    }
}
