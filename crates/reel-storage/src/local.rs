//! Local-disk asset store.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::store::{asset_url, check_filename, fetch, AssetStore, StoredAsset};

/// Stores assets in a directory that the API serves under `/assets`.
#[derive(Clone)]
pub struct LocalAssetStore {
    http: Client,
    dir: PathBuf,
    base_url: String,
}

impl LocalAssetStore {
    /// Create a store writing into `dir`, publishing under `base_url`.
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> StorageResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            http,
            dir: dir.into(),
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn persist(&self, source_url: &str, filename: &str) -> StorageResult<StoredAsset> {
        check_filename(filename)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        info!(url = %source_url, filename, "Downloading asset");

        let mut response = fetch(&self.http, source_url).await?;

        let path = self.dir.join(filename);
        let partial = self.dir.join(format!("{}.part", filename));
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut size = 0usize;

        let written = async {
            while let Some(chunk) = response.chunk().await? {
                size += chunk.len();
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok::<(), StorageError>(())
        }
        .await;

        if let Err(e) = written {
            drop(file);
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(match e {
                StorageError::Http(err) => StorageError::download_failed(format!(
                    "Failed to download asset from {}: {}",
                    source_url, err
                )),
                other => other,
            });
        }

        drop(file);
        tokio::fs::rename(&partial, &path).await?;
        debug!(path = %path.display(), "Renamed partial download");

        let public_url = asset_url(&self.base_url, filename);
        info!(filename, size, path = %path.display(), "Asset downloaded");

        Ok(StoredAsset {
            local_ref: path.to_string_lossy().into_owned(),
            public_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_persist_writes_file_and_builds_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tmp/video.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake-mp4-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path().join("assets"), "https://render.example.com/")
            .unwrap();

        let stored = store
            .persist(&format!("{}/tmp/video.mp4", server.uri()), "job-scene1-video.mp4")
            .await
            .unwrap();

        assert_eq!(
            stored.public_url,
            "https://render.example.com/assets/job-scene1-video.mp4"
        );
        let bytes = tokio::fs::read(&stored.local_ref).await.unwrap();
        assert_eq!(bytes, b"fake-mp4-bytes");
        assert!(!dir.path().join("assets/job-scene1-video.mp4.part").exists());
    }

    #[tokio::test]
    async fn test_persist_fails_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path(), "http://localhost:3000").unwrap();

        let err = store
            .persist(&format!("{}/expired.mp3", server.uri()), "j-scene2-voiceover.mp3")
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::DownloadFailed(_)));
        assert!(!dir.path().join("j-scene2-voiceover.mp3").exists());
    }

    #[tokio::test]
    async fn test_persist_rejects_bad_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path(), "http://localhost:3000").unwrap();

        let err = store.persist("not a url", "a.mp4").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidUrl { .. }));

        let err = store
            .persist("https://example.com/a.mp4", "../a.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
