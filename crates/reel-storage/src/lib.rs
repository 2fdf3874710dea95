//! Durable storage for generated media.
//!
//! Provider result URLs expire, so every asset is downloaded as soon as it
//! is produced and re-published under a stable URL. Two backends exist:
//! the local assets directory (served by the API under `/assets`) and an
//! S3-compatible bucket such as Cloudflare R2.

pub mod error;
pub mod local;
pub mod r2;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use local::LocalAssetStore;
pub use r2::{R2AssetStore, R2Config};
pub use store::{asset_url, content_type_for, AssetStore, StoredAsset};
