// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile data sources.
//!
//! The resolver picks one [`ProfileSource`] per call based on the configured
//! [`DataSource`]; neither source knows about the other's branch.

use crate::config::DataSource;
use crate::error::Result;
use crate::models::{AuthIdentity, UserProfile, UserUpdate};
use crate::services::auth_provider::AuthProvider;
use crate::services::backend::ProfileApi;
use crate::services::notify::{Notifier, NotifyLevel};
use crate::services::offline::{with_offline_handling, Connectivity, OfflineOptions};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const UPDATE_RETRIES: u32 = 2;

#[async_trait]
pub trait ProfileSource: Send + Sync {
    fn kind(&self) -> DataSource;

    /// Resolve the signed-in user's profile.
    async fn fetch(&self, identity: Option<&AuthIdentity>) -> Result<Option<UserProfile>>;

    /// Apply `changes`. `Ok(Some)` is the authoritative new profile;
    /// `Ok(None)` means the caller should re-resolve with [`Self::fetch`].
    async fn update(
        &self,
        changes: &UserUpdate,
        sync_on_update: bool,
    ) -> Result<Option<UserProfile>>;
}

/// The marketplace backend is authoritative; the auth provider is secondary.
pub struct BackendProfileSource {
    api: Arc<dyn ProfileApi>,
    auth: Arc<dyn AuthProvider>,
    connectivity: Arc<dyn Connectivity>,
    notifier: Arc<dyn Notifier>,
    retry_delay: Duration,
}

impl BackendProfileSource {
    pub fn new(
        api: Arc<dyn ProfileApi>,
        auth: Arc<dyn AuthProvider>,
        connectivity: Arc<dyn Connectivity>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            auth,
            connectivity,
            notifier,
            retry_delay: Duration::from_millis(1000),
        }
    }

    /// Base delay between retries of network-class failures.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

#[async_trait]
impl ProfileSource for BackendProfileSource {
    fn kind(&self) -> DataSource {
        DataSource::Backend
    }

    async fn fetch(&self, identity: Option<&AuthIdentity>) -> Result<Option<UserProfile>> {
        let notifier = self.notifier.clone();
        let options = OfflineOptions::default()
            .with_retry_delay(self.retry_delay)
            .with_fallback(identity.map(UserProfile::from_identity))
            .on_offline(move || {
                notifier.notify(
                    "You're offline. Showing your saved profile.",
                    NotifyLevel::Warning,
                )
            });

        let profile =
            with_offline_handling(self.connectivity.as_ref(), options, || self.api.current_user())
                .await?;
        Ok(Some(profile))
    }

    async fn update(
        &self,
        changes: &UserUpdate,
        sync_on_update: bool,
    ) -> Result<Option<UserProfile>> {
        let options = OfflineOptions::default()
            .with_retries(UPDATE_RETRIES)
            .with_retry_delay(self.retry_delay);

        let profile = with_offline_handling(self.connectivity.as_ref(), options, || {
            self.api.update_user(changes)
        })
        .await?;

        if sync_on_update {
            if let Some(names) = changes.name_update() {
                if let Err(e) = self.auth.update_name(&names).await {
                    tracing::warn!(error = %e, "Failed to sync name to auth provider, continuing anyway");
                }
            }
        }

        Ok(Some(profile))
    }
}

/// The auth provider's identity is authoritative; the backend is secondary.
pub struct AuthProviderProfileSource {
    auth: Arc<dyn AuthProvider>,
    api: Arc<dyn ProfileApi>,
}

impl AuthProviderProfileSource {
    pub fn new(auth: Arc<dyn AuthProvider>, api: Arc<dyn ProfileApi>) -> Self {
        Self { auth, api }
    }
}

#[async_trait]
impl ProfileSource for AuthProviderProfileSource {
    fn kind(&self) -> DataSource {
        DataSource::Clerk
    }

    async fn fetch(&self, identity: Option<&AuthIdentity>) -> Result<Option<UserProfile>> {
        Ok(identity.map(UserProfile::from_identity))
    }

    async fn update(
        &self,
        changes: &UserUpdate,
        sync_on_update: bool,
    ) -> Result<Option<UserProfile>> {
        if let Some(names) = changes.name_update() {
            self.auth.update_name(&names).await?;
        }

        if sync_on_update {
            if let Err(e) = self.api.update_user(changes).await {
                tracing::warn!(error = %e, "Failed to sync profile to backend, continuing anyway");
            }
        }

        Ok(None)
    }
}
