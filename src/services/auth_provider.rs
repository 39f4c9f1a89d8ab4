// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! External auth provider (Clerk) session and user API.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{AuthIdentity, NameUpdate};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::RwLock;

/// What the sync layer needs from the auth provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Whether session state has been determined (signed in or out).
    fn is_loaded(&self) -> bool;

    /// Identity of the signed-in user; `None` when signed out.
    fn identity(&self) -> Option<AuthIdentity>;

    /// Bearer token for backend calls.
    fn session_token(&self) -> Option<String>;

    fn is_signed_in(&self) -> bool {
        self.identity().is_some()
    }

    /// Push name changes to the provider and return the updated identity.
    async fn update_name(&self, update: &NameUpdate) -> Result<AuthIdentity>;
}

#[derive(Debug, Clone)]
struct Session {
    identity: AuthIdentity,
    token: String,
}

#[derive(Debug, Default)]
struct SessionState {
    loaded: bool,
    session: Option<Session>,
}

/// Clerk backend API client holding the current session.
pub struct ClerkAuthProvider {
    http: reqwest::Client,
    api_url: String,
    secret_key: String,
    state: RwLock<SessionState>,
}

impl ClerkAuthProvider {
    pub fn new(api_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.auth_api_url, &config.auth_secret_key)
    }

    /// Install an already verified session.
    pub fn sign_in(&self, identity: AuthIdentity, token: impl Into<String>) {
        tracing::info!(user_id = %identity.id, "Session started");
        let mut state = self.write_state();
        state.loaded = true;
        state.session = Some(Session {
            identity,
            token: token.into(),
        });
    }

    pub fn sign_out(&self) {
        let mut state = self.write_state();
        state.loaded = true;
        if let Some(session) = state.session.take() {
            tracing::info!(user_id = %session.identity.id, "Session ended");
        }
    }

    /// Fetch the user record for `user_id` and start a session with `token`.
    pub async fn load_session(&self, user_id: &str, token: &str) -> Result<AuthIdentity> {
        let url = format!("{}/users/{}", self.api_url, urlencoding::encode(user_id));
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(AppError::from_transport)?;

        let user: ClerkUser = check_response_json(response).await?;
        let identity = AuthIdentity::from(user);
        self.sign_in(identity.clone(), token);
        Ok(identity)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl AuthProvider for ClerkAuthProvider {
    fn is_loaded(&self) -> bool {
        self.read_state().loaded
    }

    fn identity(&self) -> Option<AuthIdentity> {
        self.read_state()
            .session
            .as_ref()
            .map(|s| s.identity.clone())
    }

    fn session_token(&self) -> Option<String> {
        self.read_state().session.as_ref().map(|s| s.token.clone())
    }

    async fn update_name(&self, update: &NameUpdate) -> Result<AuthIdentity> {
        let user_id = self.identity().ok_or(AppError::Unauthorized)?.id;
        let url = format!("{}/users/{}", self.api_url, urlencoding::encode(&user_id));

        let response = self
            .http
            .patch(&url)
            .bearer_auth(&self.secret_key)
            .json(update)
            .send()
            .await
            .map_err(AppError::from_transport)?;

        let user: ClerkUser = check_response_json(response).await?;
        let identity = AuthIdentity::from(user);

        let mut state = self.write_state();
        if let Some(session) = state.session.as_mut() {
            if session.identity.id == identity.id {
                session.identity = identity.clone();
            }
        }
        Ok(identity)
    }
}

async fn check_response_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            return Err(AppError::Network(format!("HTTP {}: {}", status, body)));
        }
        return Err(AppError::AuthProvider(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::AuthProvider(format!("JSON parse error: {}", e)))
}

/// User object as returned by the Clerk backend API.
#[derive(Debug, Clone, Deserialize)]
struct ClerkUser {
    id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    image_url: Option<String>,
    primary_email_address_id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<ClerkEmailAddress>,
    created_at: i64,
    updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct ClerkEmailAddress {
    id: String,
    email_address: String,
}

impl From<ClerkUser> for AuthIdentity {
    fn from(user: ClerkUser) -> Self {
        let primary_email = user
            .primary_email_address_id
            .as_deref()
            .and_then(|primary| user.email_addresses.iter().find(|e| e.id == primary))
            .or_else(|| user.email_addresses.first())
            .map(|e| e.email_address.clone());

        AuthIdentity {
            id: user.id,
            primary_email,
            first_name: user.first_name,
            last_name: user.last_name,
            image_url: user.image_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
