// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Provider hero-image upload: presign, PUT to storage, confirm.

use crate::error::{AppError, Result};
use crate::models::Provider;
use crate::services::backend::{BackendClient, UploadRequest};

/// Largest accepted hero image.
pub const MAX_HERO_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

#[derive(Debug, Clone)]
pub struct HeroImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl HeroImage {
    /// Reject anything the backend would refuse before touching the network.
    pub fn validate(&self) -> Result<()> {
        let content_type = self.content_type.to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Unsupported image type: {}",
                self.content_type
            )));
        }
        if self.bytes.is_empty() {
            return Err(AppError::BadRequest("Image is empty".to_string()));
        }
        if self.bytes.len() > MAX_HERO_IMAGE_BYTES {
            return Err(AppError::BadRequest(format!(
                "Image is {} bytes; the limit is {} bytes",
                self.bytes.len(),
                MAX_HERO_IMAGE_BYTES
            )));
        }
        if self.file_name.trim().is_empty() {
            return Err(AppError::BadRequest("File name is required".to_string()));
        }
        Ok(())
    }
}

/// Uploads are never retried; a failed step surfaces to the caller.
#[derive(Clone)]
pub struct HeroImageUploader {
    client: BackendClient,
}

impl HeroImageUploader {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub async fn upload(&self, token: &str, provider_id: u64, image: HeroImage) -> Result<Provider> {
        image.validate()?;

        let ticket = self
            .client
            .request_hero_upload(
                token,
                provider_id,
                &UploadRequest {
                    file_name: image.file_name.clone(),
                    content_type: image.content_type.clone(),
                },
            )
            .await?;
        tracing::debug!(provider_id, key = %ticket.key, "Got hero image upload URL");

        let size = image.bytes.len();
        self.client
            .put_object(&ticket.upload_url, &image.content_type, image.bytes)
            .await?;

        let provider = self
            .client
            .confirm_hero_upload(token, provider_id, &ticket.key)
            .await?;
        tracing::info!(provider_id, size, "Hero image uploaded");
        Ok(provider)
    }
}
