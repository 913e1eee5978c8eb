//! Client for the external media host that stores uploaded images.
//!
//! Speaks the Cloudinary-style upload API: a signed multipart POST that
//! returns a durable URL for the stored asset. The caller decides what to do
//! with upload failures; nothing is retried here.

use crate::config::MediaConfig;
use crate::errors::{ServiceError, ServiceResult};
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// An image file as received from a multipart request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Durable result of a successful upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedMedia {
    #[serde(rename = "secure_url")]
    pub url: String,
    pub public_id: String,
}

pub struct MediaService {
    client: reqwest::Client,
    config: MediaConfig,
}

impl MediaService {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(config: MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Uploads an image and returns its durable URL.
    pub async fn upload_image(&self, image: ImageUpload) -> ServiceResult<UploadedMedia> {
        let timestamp = Utc::now().timestamp();
        let signature = Self::sign_request(timestamp, &self.config.api_secret);

        let mut part = reqwest::multipart::Part::bytes(image.data.to_vec())
            .file_name(image.file_name.clone());
        if let Some(content_type) = &image.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| ServiceError::validation(format!("Invalid content type: {e}")))?;
        }

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature);

        let url = format!(
            "{}/{}/auto/upload",
            self.config.api_base_url, self.config.cloud_name
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(Self::REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ServiceError::external_service(format!("Media upload failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ServiceError::external_service(format!(
                "Media host returned {status}"
            )));
        }

        let uploaded: UploadedMedia = response.json().await.map_err(|e| {
            ServiceError::external_service(format!("Invalid media host response: {e}"))
        })?;

        Ok(uploaded)
    }

    /// Request signature: SHA-256 over the sorted parameter string with the
    /// API secret appended, hex encoded.
    fn sign_request(timestamp: i64, api_secret: &str) -> String {
        let to_sign = format!("timestamp={timestamp}{api_secret}");
        let digest = Sha256::digest(to_sign.as_bytes());
        hex::encode(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic() {
        let signature = MediaService::sign_request(1_700_000_000, "top-secret");
        assert_eq!(
            signature,
            "64ca419231a8a3a1be659201afcaad59b5d34b31b6964079b3f1a2eac6733e33"
        );
        assert_eq!(signature, MediaService::sign_request(1_700_000_000, "top-secret"));
    }

    #[test]
    fn signature_depends_on_secret_and_timestamp() {
        let base = MediaService::sign_request(1_700_000_000, "top-secret");
        assert_ne!(base, MediaService::sign_request(1_700_000_001, "top-secret"));
        assert_ne!(base, MediaService::sign_request(1_700_000_000, "other-secret"));
    }
}
