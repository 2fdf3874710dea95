//! Cloudflare R2 (S3-compatible) asset store.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::store::{check_filename, content_type_for, fetch, AssetStore, StoredAsset};

/// Configuration for the R2 store.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// R2 endpoint URL (S3 API endpoint)
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
    /// Region (usually "auto" for R2)
    pub region: String,
    /// Public bucket URL (custom domain or r2.dev)
    pub public_base_url: String,
    /// Key prefix for stored assets
    pub key_prefix: String,
}

impl R2Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("R2_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("R2_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("R2_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("R2_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("R2_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("R2_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("R2_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("R2_BUCKET_NAME not set"))?,
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("R2_PUBLIC_BASE_URL")
                .map_err(|_| StorageError::config_error("R2_PUBLIC_BASE_URL not set"))?,
            key_prefix: std::env::var("R2_KEY_PREFIX").unwrap_or_else(|_| "assets".to_string()),
        })
    }
}

/// Stores assets in an R2 bucket and publishes them through its public URL.
#[derive(Clone)]
pub struct R2AssetStore {
    client: Client,
    http: reqwest::Client,
    bucket: String,
    public_base_url: String,
    key_prefix: String,
}

impl R2AssetStore {
    pub fn new(config: R2Config) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            client: Client::from_conf(sdk_config),
            http,
            bucket: config.bucket_name,
            public_base_url: config.public_base_url,
            key_prefix: config.key_prefix,
        })
    }

    pub fn from_env() -> StorageResult<Self> {
        Self::new(R2Config::from_env()?)
    }

    fn key_for(&self, filename: &str) -> String {
        let prefix = self.key_prefix.trim_matches('/');
        if prefix.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", prefix, filename)
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl AssetStore for R2AssetStore {
    async fn persist(&self, source_url: &str, filename: &str) -> StorageResult<StoredAsset> {
        check_filename(filename)?;
        let key = self.key_for(filename);

        info!(url = %source_url, key = %key, "Downloading asset");
        let response = fetch(&self.http, source_url).await?;
        let bytes = response.bytes().await.map_err(|e| {
            StorageError::download_failed(format!(
                "Failed to download asset from {}: {}",
                source_url, e
            ))
        })?;
        let size = bytes.len();

        debug!(key = %key, size, "Uploading asset to R2");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(content_type_for(filename))
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!(key = %key, size, "Asset stored in R2");

        Ok(StoredAsset {
            public_url: self.public_url(&key),
            local_ref: key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(prefix: &str) -> R2AssetStore {
        R2AssetStore::new(R2Config {
            endpoint_url: "https://account.r2.cloudflarestorage.com".to_string(),
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            bucket_name: "reels".to_string(),
            region: "auto".to_string(),
            public_base_url: "https://media.example.com/".to_string(),
            key_prefix: prefix.to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_keys_and_public_urls() {
        let s = store("assets");
        let key = s.key_for("j-scene1-photo.jpg");
        assert_eq!(key, "assets/j-scene1-photo.jpg");
        assert_eq!(
            s.public_url(&key),
            "https://media.example.com/assets/j-scene1-photo.jpg"
        );

        assert_eq!(store("").key_for("a.mp3"), "a.mp3");
    }
}
