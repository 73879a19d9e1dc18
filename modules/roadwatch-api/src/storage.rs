use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

/// Blob storage for report photos. Returns a publicly retrievable URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, mime: &str, folder: &str) -> anyhow::Result<String>;
}

/// Object store that accepts a plain HTTP `PUT` of the object body and serves
/// it back from the same URL (S3-compatible presigned buckets, MinIO, etc).
pub struct HttpObjectStore {
    base_url: String,
    http: reqwest::Client,
}

impl HttpObjectStore {
    pub fn new(base_url: String, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn object_url(&self, folder: &str, mime: &str) -> String {
        format!(
            "{}/{}/{}.{}",
            self.base_url,
            folder.trim_matches('/'),
            Uuid::new_v4(),
            extension_for(mime)
        )
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(&self, bytes: Vec<u8>, mime: &str, folder: &str) -> anyhow::Result<String> {
        let url = self.object_url(folder, mime);
        let size = bytes.len();

        let resp = self
            .http
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            warn!(status = %status, "Object store rejected upload");
            anyhow::bail!("Object store returned {status}");
        }

        info!(size, folder, "Photo uploaded");
        Ok(url)
    }
}

/// Used when no object store is configured; every upload fails so reports
/// proceed without a photo.
pub struct DisabledObjectStore;

#[async_trait]
impl ObjectStore for DisabledObjectStore {
    async fn upload(&self, _bytes: Vec<u8>, _mime: &str, _folder: &str) -> anyhow::Result<String> {
        anyhow::bail!("object storage is not configured")
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime.split(';').next().unwrap_or("").trim() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "image/gif" => "gif",
        _ => "bin",
    }
}
