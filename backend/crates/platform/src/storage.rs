//! Object storage
//!
//! Upload and delete product files and thumbnails on Cloudinary using signed
//! API requests. Without credentials every call fails with 503 so the rest
//! of the API keeps working.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use kernel::AppError;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use thiserror::Error;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Folder prefix for every upload.
    pub folder: String,
}

/// Cloudinary resource class. Product files go up as `raw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Video,
    Raw,
}

impl ResourceKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Video => "video",
            ResourceKind::Raw => "raw",
        }
    }

    /// Pick the class from a file extension.
    pub fn for_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" => ResourceKind::Image,
            "mp4" | "mov" | "webm" | "mp3" | "wav" => ResourceKind::Video,
            _ => ResourceKind::Raw,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object storage is not configured")]
    NotConfigured,

    #[error("Storage request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Storage API returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotConfigured => {
                AppError::service_unavailable("File storage is not available").with_source(err)
            }
            _ => AppError::bad_gateway("File storage request failed").with_source(err),
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredObject {
    pub public_id: String,
    pub secure_url: String,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub resource_type: String,
}

#[derive(Clone)]
pub struct ObjectStorage {
    client: reqwest::Client,
    config: Option<StorageConfig>,
}

impl ObjectStorage {
    pub fn new(config: Option<StorageConfig>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    fn config(&self) -> Result<&StorageConfig, StorageError> {
        self.config.as_ref().ok_or(StorageError::NotConfigured)
    }

    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        kind: ResourceKind,
        subfolder: &str,
    ) -> Result<StoredObject, StorageError> {
        let config = self.config()?;
        let folder = format!("{}/{}", config.folder, subfolder);
        let timestamp = unix_timestamp().to_string();
        let signature = sign(
            &[("folder", folder.as_str()), ("timestamp", timestamp.as_str())],
            &config.api_secret,
        );

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder)
            .text("signature", signature);

        let url = format!("{}/{}/{}/upload", API_BASE, config.cloud_name, kind.as_str());
        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let stored: StoredObject = response.json().await?;
        tracing::info!(
            public_id = %stored.public_id,
            bytes = stored.bytes,
            "Uploaded object"
        );
        Ok(stored)
    }

    pub async fn delete(&self, public_id: &str, kind: ResourceKind) -> Result<(), StorageError> {
        let config = self.config()?;
        let timestamp = unix_timestamp().to_string();
        let signature = sign(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            &config.api_secret,
        );

        let url = format!("{}/{}/{}/destroy", API_BASE, config.cloud_name, kind.as_str());
        let response = self
            .client
            .post(url)
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", config.api_key.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(public_id, "Deleted object");
        Ok(())
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Cloudinary request signature: SHA-1 hex of the sorted `k=v&k=v` string
/// with the API secret appended.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_matches_documented_example() {
        // Example from Cloudinary's "Generating authentication signatures" guide.
        let signature = sign(
            &[
                ("timestamp", "1315060510"),
                ("public_id", "sample_image"),
                ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop"),
            ],
            "abcd",
        );
        assert_eq!(signature, "bfd09f95f331f558cbd1320e67aa8d488770583e");
    }

    #[test]
    fn test_resource_kind_for_extension() {
        assert_eq!(ResourceKind::for_extension("PNG"), ResourceKind::Image);
        assert_eq!(ResourceKind::for_extension("mp3"), ResourceKind::Video);
        assert_eq!(ResourceKind::for_extension("pdf"), ResourceKind::Raw);
        assert_eq!(ResourceKind::for_extension("zip"), ResourceKind::Raw);
    }

    #[tokio::test]
    async fn test_disabled_storage_is_unavailable() {
        let storage = ObjectStorage::disabled();
        let err = storage
            .upload(vec![1, 2, 3], "a.pdf", ResourceKind::Raw, "products")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotConfigured));
        assert_eq!(AppError::from(err).status_code(), 503);
    }
}
