// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Marketplace backend API client.
//!
//! Handles:
//! - Current-user profile fetch and partial update
//! - Bookmark list, add and remove
//! - Provider browsing, reviews and categories
//! - Hero-image upload tickets and confirmation
//!
//! [`BackendClient`] takes the caller's session token per request (the proxy
//! routes forward the browser's token). [`BackendService`] pulls the token
//! from the signed-in session and implements the port traits the sync layer
//! depends on.

use crate::error::{AppError, Result};
use crate::models::{Category, NewReview, Provider, ProviderQuery, Review, UserProfile, UserUpdate};
use crate::services::auth_provider::AuthProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Backend API client.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the profile of the user owning `token`.
    pub async fn current_user(&self, token: &str) -> Result<UserProfile> {
        let url = format!("{}/users/me", self.base_url);
        let request = self.http.get(&url).bearer_auth(token);
        self.send_json(request, "User profile").await
    }

    /// Apply a partial update and return the full updated profile.
    pub async fn update_user(&self, token: &str, changes: &UserUpdate) -> Result<UserProfile> {
        let url = format!("{}/users/me", self.base_url);
        let request = self.http.patch(&url).bearer_auth(token).json(changes);
        self.send_json(request, "User profile").await
    }

    pub async fn bookmark_ids(&self, token: &str) -> Result<Vec<u64>> {
        let url = format!("{}/bookmarks", self.base_url);
        let request = self.http.get(&url).bearer_auth(token);
        self.send_json(request, "Bookmarks").await
    }

    pub async fn add_bookmark(&self, token: &str, provider_id: u64) -> Result<()> {
        let url = format!("{}/bookmarks/{}", self.base_url, provider_id);
        let request = self.http.post(&url).bearer_auth(token);
        self.send(request, "Provider").await
    }

    pub async fn remove_bookmark(&self, token: &str, provider_id: u64) -> Result<()> {
        let url = format!("{}/bookmarks/{}", self.base_url, provider_id);
        let request = self.http.delete(&url).bearer_auth(token);
        self.send(request, "Bookmark").await
    }

    pub async fn provider(&self, provider_id: u64) -> Result<Provider> {
        let url = format!("{}/providers/{}", self.base_url, provider_id);
        self.send_json(self.http.get(&url), "Provider").await
    }

    /// Browse providers by category, location and free text.
    pub async fn search_providers(&self, query: &ProviderQuery) -> Result<Vec<Provider>> {
        let url = format!("{}/providers", self.base_url);
        let request = self.http.get(&url).query(&query.to_pairs());
        self.send_json(request, "Providers").await
    }

    pub async fn reviews(&self, provider_id: u64) -> Result<Vec<Review>> {
        let url = format!("{}/providers/{}/reviews", self.base_url, provider_id);
        self.send_json(self.http.get(&url), "Provider").await
    }

    pub async fn create_review(
        &self,
        token: &str,
        provider_id: u64,
        review: &NewReview,
    ) -> Result<Review> {
        let url = format!("{}/providers/{}/reviews", self.base_url, provider_id);
        let request = self.http.post(&url).bearer_auth(token).json(review);
        self.send_json(request, "Provider").await
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        let url = format!("{}/categories", self.base_url);
        self.send_json(self.http.get(&url), "Categories").await
    }

    /// Ask the backend for a pre-signed upload URL.
    pub async fn request_hero_upload(
        &self,
        token: &str,
        provider_id: u64,
        request: &UploadRequest,
    ) -> Result<UploadTicket> {
        let url = format!(
            "{}/providers/{}/hero-image/upload-url",
            self.base_url, provider_id
        );
        let request = self.http.post(&url).bearer_auth(token).json(request);
        self.send_json(request, "Provider").await
    }

    /// PUT the bytes straight to object storage.
    pub async fn put_object(&self, upload_url: &str, content_type: &str, bytes: Vec<u8>) -> Result<()> {
        let request = self
            .http
            .put(upload_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        self.send(request, "Upload target").await
    }

    /// Tell the backend the upload finished; returns the updated provider.
    pub async fn confirm_hero_upload(
        &self,
        token: &str,
        provider_id: u64,
        key: &str,
    ) -> Result<Provider> {
        let url = format!(
            "{}/providers/{}/hero-image/confirm",
            self.base_url, provider_id
        );
        let request = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "key": key }));
        self.send_json(request, "Provider").await
    }

    /// Send and check status only.
    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<()> {
        let response = request.send().await.map_err(AppError::from_transport)?;
        self.check_response(response, what).await?;
        Ok(())
    }

    /// Send, check status and parse the JSON body.
    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = request.send().await.map_err(AppError::from_transport)?;
        let response = self.check_response(response, what).await?;
        response.json().await.map_err(|e| {
            AppError::BadRequest(format!("Unexpected {} response shape: {}", what, e))
        })
    }

    /// Check response status and return error if not successful.
    async fn check_response(
        &self,
        response: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if status == 429 {
            tracing::warn!("Backend rate limit hit (429)");
        }

        Err(AppError::from_status(status, body, what))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
}

/// Pre-signed upload target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTicket {
    pub upload_url: String,
    /// Storage key to confirm once the PUT succeeds
    pub key: String,
}

// ─── Ports used by the sync layer ──────────────────────────────────────────

#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn current_user(&self) -> Result<UserProfile>;
    async fn update_user(&self, changes: &UserUpdate) -> Result<UserProfile>;
}

#[async_trait]
pub trait BookmarkApi: Send + Sync {
    async fn bookmark_ids(&self) -> Result<Vec<u64>>;
    /// Idempotent: afterwards the ID is bookmarked.
    async fn add_bookmark(&self, provider_id: u64) -> Result<()>;
    /// Idempotent: afterwards the ID is not bookmarked.
    async fn remove_bookmark(&self, provider_id: u64) -> Result<()>;
}

#[async_trait]
pub trait ProviderApi: Send + Sync {
    async fn provider(&self, provider_id: u64) -> Result<Provider>;
}

/// Backend access on behalf of the signed-in session.
#[derive(Clone)]
pub struct BackendService {
    client: BackendClient,
    auth: Arc<dyn AuthProvider>,
}

impl BackendService {
    pub fn new(client: BackendClient, auth: Arc<dyn AuthProvider>) -> Self {
        Self { client, auth }
    }

    fn token(&self) -> Result<String> {
        self.auth.session_token().ok_or(AppError::Unauthorized)
    }
}

#[async_trait]
impl ProfileApi for BackendService {
    async fn current_user(&self) -> Result<UserProfile> {
        let token = self.token()?;
        self.client.current_user(&token).await
    }

    async fn update_user(&self, changes: &UserUpdate) -> Result<UserProfile> {
        let token = self.token()?;
        self.client.update_user(&token, changes).await
    }
}

#[async_trait]
impl BookmarkApi for BackendService {
    async fn bookmark_ids(&self) -> Result<Vec<u64>> {
        let token = self.token()?;
        self.client.bookmark_ids(&token).await
    }

    async fn add_bookmark(&self, provider_id: u64) -> Result<()> {
        let token = self.token()?;
        self.client.add_bookmark(&token, provider_id).await
    }

    async fn remove_bookmark(&self, provider_id: u64) -> Result<()> {
        let token = self.token()?;
        self.client.remove_bookmark(&token, provider_id).await
    }
}

#[async_trait]
impl ProviderApi for BackendService {
    async fn provider(&self, provider_id: u64) -> Result<Provider> {
        self.client.provider(provider_id).await
    }
}
