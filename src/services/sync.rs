// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wiring for the client sync layer.
//!
//! One [`SyncLayer`] owns the session, network state and query cache, and
//! hands them to the identity resolver and the bookmark service so both
//! read and invalidate the same entries.

use crate::config::{Config, SharedUserConfig};
use crate::query::QueryCache;
use crate::services::auth_provider::ClerkAuthProvider;
use crate::services::backend::{BackendClient, BackendService};
use crate::services::bookmarks::BookmarkService;
use crate::services::identity::{ProfileSources, UserResolver, Visibility};
use crate::services::network::NetworkObserver;
use crate::services::notify::{Notifier, TracingNotifier};
use crate::services::profile_source::{AuthProviderProfileSource, BackendProfileSource};
use std::sync::Arc;
use tokio::sync::watch;

pub struct SyncLayer {
    pub auth: Arc<ClerkAuthProvider>,
    pub network: Arc<NetworkObserver>,
    pub cache: QueryCache,
    pub resolver: Arc<UserResolver>,
    pub bookmarks: BookmarkService,
    visibility: watch::Sender<Visibility>,
}

impl SyncLayer {
    /// Build the layer from startup configuration, logging notices.
    pub fn from_config(config: &Config) -> Self {
        Self::with_notifier(config, Arc::new(TracingNotifier))
    }

    pub fn with_notifier(config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        let auth = Arc::new(ClerkAuthProvider::from_config(config));
        let backend = Arc::new(BackendService::new(
            BackendClient::new(&config.backend_api_url),
            auth.clone(),
        ));
        let network = Arc::new(NetworkObserver::new(true));
        let cache = QueryCache::new();
        let (visibility, visibility_rx) = watch::channel(Visibility::Visible);

        let sources = ProfileSources {
            backend: Arc::new(BackendProfileSource::new(
                backend.clone(),
                auth.clone(),
                network.clone(),
                notifier.clone(),
            )),
            auth_provider: Arc::new(AuthProviderProfileSource::new(
                auth.clone(),
                backend.clone(),
            )),
        };

        let resolver = UserResolver::new(
            auth.clone(),
            sources,
            cache.clone(),
            notifier.clone(),
            SharedUserConfig::new(config.user_context.clone()),
            visibility_rx,
        );

        let bookmarks = BookmarkService::new(
            backend.clone(),
            backend,
            auth.clone(),
            cache.clone(),
            notifier,
        );

        tracing::debug!(
            data_source = ?config.user_context.data_source,
            sync_on_update = config.user_context.sync_on_update,
            "Sync layer ready"
        );

        Self {
            auth,
            network,
            cache,
            resolver,
            bookmarks,
            visibility,
        }
    }

    /// Forward a host document visibility change to the refresh loop.
    pub fn set_visibility(&self, visibility: Visibility) {
        self.visibility.send_replace(visibility);
    }
}
