// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory fakes for the auth provider and backend ports.

use async_trait::async_trait;
use provider_hub::config::{Config, SharedUserConfig, UserContextConfig};
use provider_hub::error::{AppError, Result};
use provider_hub::models::{AuthIdentity, NameUpdate, Provider, UserProfile, UserUpdate};
use provider_hub::query::QueryCache;
use provider_hub::routes::create_router;
use provider_hub::services::{
    AuthProvider, AuthProviderProfileSource, BackendProfileSource, BookmarkApi, BookmarkService,
    NetworkObserver, NoticeQueue, ProfileApi, ProfileSources, ProviderApi, UserResolver,
    Visibility,
};
use provider_hub::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

#[allow(dead_code)]
pub fn identity(id: &str, first_name: &str) -> AuthIdentity {
    AuthIdentity {
        id: id.to_string(),
        primary_email: Some(format!("{}@example.com", id)),
        first_name: Some(first_name.to_string()),
        last_name: None,
        image_url: None,
        created_at: 1_700_000_000_000,
        updated_at: 1_700_000_000_000,
    }
}

#[allow(dead_code)]
pub fn profile(id: &str, email: &str, first_name: &str) -> UserProfile {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "email": email,
        "first_name": first_name,
    }))
    .unwrap()
}

/// Auth provider whose session is driven by the test.
#[derive(Default)]
pub struct FakeAuth {
    loaded: AtomicBool,
    identity: Mutex<Option<AuthIdentity>>,
    pub name_updates: AtomicU32,
    pub fail_name_update: AtomicBool,
}

#[allow(dead_code)]
impl FakeAuth {
    pub fn signed_in(identity: AuthIdentity) -> Arc<Self> {
        let auth = Self::default();
        auth.loaded.store(true, Ordering::SeqCst);
        *auth.identity.lock().unwrap() = Some(identity);
        Arc::new(auth)
    }

    pub fn signed_out() -> Arc<Self> {
        let auth = Self::default();
        auth.loaded.store(true, Ordering::SeqCst);
        Arc::new(auth)
    }

    pub fn sign_out(&self) {
        *self.identity.lock().unwrap() = None;
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn identity(&self) -> Option<AuthIdentity> {
        self.identity.lock().unwrap().clone()
    }

    fn session_token(&self) -> Option<String> {
        self.identity().map(|i| format!("token-{}", i.id))
    }

    async fn update_name(&self, update: &NameUpdate) -> Result<AuthIdentity> {
        self.name_updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_name_update.load(Ordering::SeqCst) {
            return Err(AppError::AuthProvider("HTTP 500".to_string()));
        }
        let mut slot = self.identity.lock().unwrap();
        let identity = slot.as_mut().ok_or(AppError::Unauthorized)?;
        if let Some(first) = &update.first_name {
            identity.first_name = Some(first.clone());
        }
        if let Some(last) = &update.last_name {
            identity.last_name = Some(last.clone());
        }
        Ok(identity.clone())
    }
}

/// Backend with switchable failures and call counters.
#[derive(Default)]
pub struct FakeBackend {
    pub profile: Mutex<Option<UserProfile>>,
    pub bookmarks: Mutex<Vec<u64>>,
    pub providers: Mutex<HashMap<u64, Provider>>,

    pub profile_calls: AtomicU32,
    pub update_calls: AtomicU32,
    pub list_calls: AtomicU32,
    pub mutation_calls: AtomicU32,

    pub fail_profile_network: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_list: AtomicBool,
    pub fail_mutations: AtomicBool,
}

#[allow(dead_code)]
impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_profile(profile: UserProfile) -> Arc<Self> {
        let backend = Self::default();
        *backend.profile.lock().unwrap() = Some(profile);
        Arc::new(backend)
    }

    pub fn set_bookmarks(&self, ids: Vec<u64>) {
        *self.bookmarks.lock().unwrap() = ids;
    }

    pub fn add_provider(&self, id: u64, name: &str) {
        let provider: Provider =
            serde_json::from_value(serde_json::json!({ "id": id, "name": name })).unwrap();
        self.providers.lock().unwrap().insert(id, provider);
    }
}

#[async_trait]
impl ProfileApi for FakeBackend {
    async fn current_user(&self) -> Result<UserProfile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_profile_network.load(Ordering::SeqCst) {
            return Err(AppError::Network("connection reset".to_string()));
        }
        self.profile
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::NotFound("User profile".to_string()))
    }

    async fn update_user(&self, changes: &UserUpdate) -> Result<UserProfile> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(AppError::Backend {
                status: 500,
                message: "boom".to_string(),
            });
        }
        let mut slot = self.profile.lock().unwrap();
        let current = slot
            .clone()
            .ok_or_else(|| AppError::NotFound("User profile".to_string()))?;
        let updated = current.merged(changes);
        *slot = Some(updated.clone());
        Ok(updated)
    }
}

#[async_trait]
impl BookmarkApi for FakeBackend {
    async fn bookmark_ids(&self) -> Result<Vec<u64>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(AppError::Network("connection reset".to_string()));
        }
        Ok(self.bookmarks.lock().unwrap().clone())
    }

    async fn add_bookmark(&self, provider_id: u64) -> Result<()> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(AppError::Network("connection reset".to_string()));
        }
        let mut ids = self.bookmarks.lock().unwrap();
        if !ids.contains(&provider_id) {
            ids.push(provider_id);
        }
        Ok(())
    }

    async fn remove_bookmark(&self, provider_id: u64) -> Result<()> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(AppError::Network("connection reset".to_string()));
        }
        self.bookmarks.lock().unwrap().retain(|&id| id != provider_id);
        Ok(())
    }
}

#[async_trait]
impl ProviderApi for FakeBackend {
    async fn provider(&self, provider_id: u64) -> Result<Provider> {
        self.providers
            .lock()
            .unwrap()
            .get(&provider_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Provider".to_string()))
    }
}

/// Everything a resolver test needs to poke at.
#[allow(dead_code)]
pub struct ResolverHarness {
    pub resolver: Arc<UserResolver>,
    pub auth: Arc<FakeAuth>,
    pub backend: Arc<FakeBackend>,
    pub network: Arc<NetworkObserver>,
    pub notices: Arc<NoticeQueue>,
    pub cache: QueryCache,
    pub visibility: watch::Sender<Visibility>,
}

#[allow(dead_code)]
pub fn resolver(
    auth: Arc<FakeAuth>,
    backend: Arc<FakeBackend>,
    config: UserContextConfig,
) -> ResolverHarness {
    let network = Arc::new(NetworkObserver::new(true));
    let notices = Arc::new(NoticeQueue::new());
    let cache = QueryCache::new();
    let (visibility, visibility_rx) = watch::channel(Visibility::Visible);

    let sources = ProfileSources {
        backend: Arc::new(
            BackendProfileSource::new(
                backend.clone(),
                auth.clone(),
                network.clone(),
                notices.clone(),
            )
            .with_retry_delay(Duration::from_millis(10)),
        ),
        auth_provider: Arc::new(AuthProviderProfileSource::new(auth.clone(), backend.clone())),
    };

    let resolver = UserResolver::new(
        auth.clone(),
        sources,
        cache.clone(),
        notices.clone(),
        SharedUserConfig::new(config),
        visibility_rx,
    );

    ResolverHarness {
        resolver,
        auth,
        backend,
        network,
        notices,
        cache,
        visibility,
    }
}

#[allow(dead_code)]
pub fn bookmark_service(
    auth: Arc<FakeAuth>,
    backend: Arc<FakeBackend>,
) -> (BookmarkService, Arc<NoticeQueue>, QueryCache) {
    let notices = Arc::new(NoticeQueue::new());
    let cache = QueryCache::new();
    let service = BookmarkService::new(
        backend.clone(),
        backend,
        auth,
        cache.clone(),
        notices.clone(),
    );
    (service, notices, cache)
}

/// Router with a backend URL nothing listens on.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default()));
    (create_router(state.clone()), state)
}
