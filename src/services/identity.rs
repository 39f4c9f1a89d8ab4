// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User identity resolver.
//!
//! Reconciles the backend profile store with the auth provider's identity:
//! - Debounced, cache-first profile fetch with fallback to the auth identity
//! - Optimistic profile update with rollback
//! - Switchable data source
//! - Auto-refresh while signed in and the document is visible
//!
//! Phases: `Uninitialized → Loading → Ready | Error`, with `SignedOut`
//! reachable from any phase.

use crate::config::{DataSource, SharedUserConfig, UserContextConfig, UserContextConfigPatch};
use crate::error::AppError;
use crate::models::{UserProfile, UserUpdate};
use crate::query::keys;
use crate::query::{OptimisticUpdate, QueryCache, QueryKey};
use crate::services::auth_provider::AuthProvider;
use crate::services::notify::{Notifier, NotifyLevel};
use crate::services::profile_source::ProfileSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use validator::Validate;

/// Minimum spacing between non-forced network fetches.
pub const FETCH_DEBOUNCE: Duration = Duration::from_millis(2000);

/// Auto-refresh intervals below this are clamped up.
pub const MIN_AUTO_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverPhase {
    Uninitialized,
    Loading,
    Ready { has_profile: bool },
    Error,
    SignedOut,
}

/// Host document visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Suppresses fetches that follow a successful one too closely.
#[derive(Debug, Clone)]
pub struct DebounceGuard {
    min_interval: Duration,
    last_success: Option<Instant>,
}

impl DebounceGuard {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_success: None,
        }
    }

    /// Whether a fetch at `now` falls inside the window of the last success.
    pub fn is_within_window(&self, now: Instant) -> bool {
        self.last_success
            .map(|last| now.saturating_duration_since(last) < self.min_interval)
            .unwrap_or(false)
    }

    pub fn record_success(&mut self, now: Instant) {
        self.last_success = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_success = None;
    }
}

/// Read-only view for UI consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct UserContextSnapshot {
    pub user: Option<UserProfile>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub data_source: DataSource,
}

/// The two interchangeable profile strategies.
pub struct ProfileSources {
    pub backend: Arc<dyn ProfileSource>,
    pub auth_provider: Arc<dyn ProfileSource>,
}

struct ResolverState {
    phase: ResolverPhase,
    error: Option<String>,
    debounce: DebounceGuard,
}

pub struct UserResolver {
    auth: Arc<dyn AuthProvider>,
    sources: ProfileSources,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
    config: SharedUserConfig,
    visibility: watch::Receiver<Visibility>,
    state: Mutex<ResolverState>,
    initial_fetch_done: AtomicBool,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl UserResolver {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        sources: ProfileSources,
        cache: QueryCache,
        notifier: Arc<dyn Notifier>,
        config: SharedUserConfig,
        visibility: watch::Receiver<Visibility>,
    ) -> Arc<Self> {
        Arc::new(Self {
            auth,
            sources,
            cache,
            notifier,
            config,
            visibility,
            state: Mutex::new(ResolverState {
                phase: ResolverPhase::Uninitialized,
                error: None,
                debounce: DebounceGuard::new(FETCH_DEBOUNCE),
            }),
            initial_fetch_done: AtomicBool::new(false),
            refresh_task: Mutex::new(None),
        })
    }

    // ─── Accessors ───────────────────────────────────────────────

    /// Resolved profile of the signed-in user.
    pub fn user(&self) -> Option<UserProfile> {
        self.cache.get(&self.profile_key()?)
    }

    pub fn phase(&self) -> ResolverPhase {
        self.lock_state().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == ResolverPhase::Loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock_state().error.clone()
    }

    pub fn current_data_source(&self) -> DataSource {
        self.config.snapshot().data_source
    }

    /// Copy of the active configuration.
    pub fn config(&self) -> UserContextConfig {
        self.config.snapshot()
    }

    pub fn snapshot(&self) -> UserContextSnapshot {
        let (is_loading, error) = {
            let state = self.lock_state();
            (state.phase == ResolverPhase::Loading, state.error.clone())
        };
        UserContextSnapshot {
            user: self.user(),
            is_loading,
            error,
            data_source: self.current_data_source(),
        }
    }

    fn source(&self) -> &dyn ProfileSource {
        match self.current_data_source() {
            DataSource::Backend => self.sources.backend.as_ref(),
            DataSource::Clerk => self.sources.auth_provider.as_ref(),
        }
    }

    /// Profiles are cached per auth identity, so a cached entry never
    /// outlives a switch to another account.
    fn profile_key(&self) -> Option<QueryKey> {
        self.auth.identity().map(|i| keys::user::profile(&i.id))
    }

    fn lock_state(&self) -> MutexGuard<'_, ResolverState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Call whenever the auth provider's session state may have changed.
    ///
    /// The first call after the session is loaded and signed in performs one
    /// forced fetch; later calls do not fetch again until after a sign-out.
    pub async fn on_auth_ready(self: &Arc<Self>) {
        if !self.auth.is_loaded() {
            return;
        }
        if !self.auth.is_signed_in() {
            self.sign_out();
            return;
        }
        if !self.initial_fetch_done.swap(true, Ordering::SeqCst) {
            self.fetch_user(true).await;
        }
        if !self.auto_refresh_running() {
            self.sync_auto_refresh();
        }
    }

    /// Drop all user state, stop auto-refresh and re-arm the initial fetch.
    pub fn sign_out(&self) {
        self.stop_auto_refresh();
        self.clear_user();
        self.initial_fetch_done.store(false, Ordering::SeqCst);
    }

    fn clear_user(&self) {
        self.cache.remove_prefix(&keys::user::all());
        let mut state = self.lock_state();
        state.phase = ResolverPhase::SignedOut;
        state.error = None;
        state.debounce.reset();
    }

    // ─── Fetch ───────────────────────────────────────────────────

    /// Resolve the signed-in user's profile.
    ///
    /// Without `force`, a fetch inside the debounce window or with a cached
    /// profile returns the cached value and makes no network call. Failures
    /// fall back to the auth identity.
    pub async fn fetch_user(&self, force: bool) -> Option<UserProfile> {
        let Some(identity) = self.auth.identity() else {
            self.clear_user();
            return None;
        };
        let key = keys::user::profile(&identity.id);
        let cached: Option<UserProfile> = self.cache.get(&key);

        if !force {
            if self.lock_state().debounce.is_within_window(Instant::now()) {
                tracing::debug!("Profile fetch debounced");
                return cached;
            }
            if let Some(profile) = cached {
                tracing::debug!(user_id = %profile.id, "Profile served from cache");
                return Some(profile);
            }
        }

        self.lock_state().phase = ResolverPhase::Loading;
        let source = self.source();
        let resolved = match source.fetch(Some(&identity)).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    source = ?source.kind(),
                    "Profile fetch failed, using auth provider identity"
                );
                Some(UserProfile::from_identity(&identity))
            }
        };

        match resolved {
            Some(profile) => match self.cache.set(key, &profile) {
                Ok(_) => {
                    self.finish_fetch(true);
                    Some(profile)
                }
                Err(e) => {
                    self.fail_fetch(&e);
                    None
                }
            },
            None => {
                self.cache.remove(&key);
                self.finish_fetch(false);
                None
            }
        }
    }

    /// Forced refetch.
    pub async fn refresh_user(&self) -> Option<UserProfile> {
        self.fetch_user(true).await
    }

    fn finish_fetch(&self, has_profile: bool) {
        let mut state = self.lock_state();
        state.phase = ResolverPhase::Ready { has_profile };
        state.error = None;
        state.debounce.record_success(Instant::now());
    }

    fn fail_fetch(&self, error: &AppError) {
        tracing::warn!(error = %error, "Failed to resolve user profile");
        let mut state = self.lock_state();
        state.phase = ResolverPhase::Error;
        state.error = Some(error.to_string());
    }

    // ─── Update ──────────────────────────────────────────────────

    /// Optimistically apply `changes`, then confirm with the active source.
    ///
    /// Always ends with exactly one success or failure notice. On failure
    /// the optimistic change is rolled back.
    pub async fn update_user(&self, changes: &UserUpdate) -> Option<UserProfile> {
        let Some(identity) = self.auth.identity() else {
            self.notifier
                .notify("Please sign in to update your profile", NotifyLevel::Info);
            return None;
        };
        if let Err(e) = changes.validate() {
            self.lock_state().error = Some(e.to_string());
            self.notifier
                .notify("Some profile details are invalid", NotifyLevel::Error);
            return None;
        }

        let key = keys::user::profile(&identity.id);
        let base = UserProfile::from_identity(&identity);
        let pending = match OptimisticUpdate::apply(
            &self.cache,
            key.clone(),
            |current: Option<UserProfile>| current.unwrap_or(base).merged(changes),
        ) {
            Ok(pending) => Some(pending),
            Err(e) => {
                tracing::warn!(error = %e, "Could not apply optimistic profile update");
                None
            }
        };

        let sync_on_update = self.config.snapshot().sync_on_update;
        let source = self.source();

        match source.update(changes, sync_on_update).await {
            Ok(Some(profile)) => {
                let stored = match pending {
                    Some(pending) => pending.commit(Some(&profile)),
                    None => self.cache.set(key, &profile).map(|_| ()),
                };
                if let Err(e) = stored {
                    tracing::warn!(error = %e, "Failed to cache updated profile");
                }
                self.lock_state().error = None;
                tracing::info!(user_id = %profile.id, source = ?source.kind(), "Profile updated");
                self.notifier
                    .notify("Profile updated successfully", NotifyLevel::Success);
                Some(profile)
            }
            Ok(None) => {
                // The auth identity has no display name, avatar or
                // preferences, so the merged value stays cached and the
                // re-resolve below serves it rather than rebuilding.
                if let Some(pending) = pending {
                    if let Err(e) = pending.commit(None) {
                        tracing::warn!(error = %e, "Failed to cache updated profile");
                    }
                }
                self.lock_state().error = None;
                tracing::info!(source = ?source.kind(), "Profile updated, re-resolving");
                self.notifier
                    .notify("Profile updated successfully", NotifyLevel::Success);
                self.fetch_user(false).await
            }
            Err(e) => {
                if let Some(pending) = pending {
                    if let Err(revert_err) = pending.revert() {
                        tracing::warn!(error = %revert_err, "Failed to roll back profile update");
                    }
                }
                tracing::warn!(error = %e, source = ?source.kind(), "Profile update failed");
                let message = match e {
                    AppError::Offline => "You're offline. Your profile changes were not saved.",
                    _ => "Failed to update profile. Please try again.",
                };
                self.lock_state().error = Some(e.to_string());
                self.notifier.notify(message, NotifyLevel::Error);
                None
            }
        }
    }

    // ─── Configuration ───────────────────────────────────────────

    /// Switch the authoritative store and refetch from it.
    pub async fn set_data_source(&self, source: DataSource) -> Option<UserProfile> {
        self.config.merge(UserContextConfigPatch {
            data_source: Some(source),
            ..Default::default()
        });
        tracing::info!(source = ?source, "User data source switched");
        self.fetch_user(true).await
    }

    /// Shallow-merge `patch` into the configuration and restart auto-refresh.
    pub fn configure(self: &Arc<Self>, patch: UserContextConfigPatch) -> UserContextConfig {
        let merged = self.config.merge(patch);
        self.sync_auto_refresh();
        merged
    }

    // ─── Auto-refresh ────────────────────────────────────────────

    /// (Re)start the refresh loop to match the current configuration.
    ///
    /// No loop runs while signed out or when no interval is configured.
    pub fn sync_auto_refresh(self: &Arc<Self>) {
        self.stop_auto_refresh();

        let Some(interval) = self.config.snapshot().auto_refresh_interval else {
            return;
        };
        if !self.auth.is_signed_in() {
            return;
        }

        let period = interval.max(MIN_AUTO_REFRESH_INTERVAL);
        let resolver = Arc::downgrade(self);
        let visibility = self.visibility.clone();
        let handle = tokio::spawn(refresh_loop(resolver, visibility, period));

        tracing::debug!(period_ms = period.as_millis() as u64, "Auto-refresh started");
        *self.lock_task() = Some(handle);
    }

    pub fn stop_auto_refresh(&self) {
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
        }
    }

    pub fn auto_refresh_running(&self) -> bool {
        self.lock_task()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.refresh_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for UserResolver {
    fn drop(&mut self) {
        let slot = self
            .refresh_task
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

async fn refresh_loop(
    resolver: Weak<UserResolver>,
    visibility: watch::Receiver<Visibility>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    loop {
        ticker.tick().await;
        let Some(resolver) = resolver.upgrade() else {
            break;
        };
        if !resolver.auth.is_signed_in() {
            break;
        }
        let visible = *visibility.borrow() == Visibility::Visible;
        if visible {
            resolver.refresh_user().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_window() {
        let start = Instant::now();
        let mut guard = DebounceGuard::new(FETCH_DEBOUNCE);
        assert!(!guard.is_within_window(start));

        guard.record_success(start);
        assert!(guard.is_within_window(start + Duration::from_millis(1999)));
        assert!(!guard.is_within_window(start + Duration::from_millis(2000)));

        guard.reset();
        assert!(!guard.is_within_window(start));
    }
}
