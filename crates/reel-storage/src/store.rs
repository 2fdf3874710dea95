//! The asset store abstraction and helpers shared by both backends.

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::error;
use url::Url;

use crate::error::{StorageError, StorageResult};

/// Where a persisted asset ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Backend-specific reference (file path or object key)
    pub local_ref: String,
    /// Stable public URL
    pub public_url: String,
}

/// Durable storage for provider-generated media.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Download `source_url` and store it as `filename`.
    async fn persist(&self, source_url: &str, filename: &str) -> StorageResult<StoredAsset>;
}

/// Public URL of a file in the local assets directory.
pub fn asset_url(base_url: &str, filename: &str) -> String {
    format!("{}/assets/{}", base_url.trim_end_matches('/'), filename)
}

/// MIME type inferred from the file extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" => "video/mp4",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}

/// Asset filenames are flat: no separators, no parent references.
pub(crate) fn check_filename(filename: &str) -> StorageResult<()> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(StorageError::InvalidKey(filename.to_string()));
    }
    Ok(())
}

/// Start downloading a source URL, failing on non-2xx responses.
pub(crate) async fn fetch(http: &Client, source_url: &str) -> StorageResult<Response> {
    let url = Url::parse(source_url).map_err(|e| StorageError::InvalidUrl {
        url: source_url.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(StorageError::InvalidUrl {
            url: source_url.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }

    let response = http.get(url).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        error!(url = %source_url, status = %status, "Asset download failed");
        return Err(StorageError::download_failed(format!(
            "Failed to download asset from {}: {}",
            source_url, status
        )));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_url_trims_trailing_slash() {
        assert_eq!(
            asset_url("https://render.example.com/", "j-scene1-video.mp4"),
            "https://render.example.com/assets/j-scene1-video.mp4"
        );
        assert_eq!(
            asset_url("http://localhost:3000", "a.mp3"),
            "http://localhost:3000/assets/a.mp3"
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("x-scene1-video.mp4"), "video/mp4");
        assert_eq!(content_type_for("x-scene2-photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("x-scene3-voiceover.mp3"), "audio/mpeg");
        assert_eq!(content_type_for("README"), "application/octet-stream");
    }

    #[test]
    fn test_check_filename() {
        assert!(check_filename("job-scene1-photo.jpg").is_ok());
        assert!(check_filename("../etc/passwd").is_err());
        assert!(check_filename("a/b.mp4").is_err());
        assert!(check_filename("").is_err());
    }
}
