// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bookmark list query and optimistic toggle.

use crate::error::{AppError, Result};
use crate::models::Provider;
use crate::query::keys;
use crate::query::{OptimisticUpdate, QueryCache, QueryResult, QueryStatus};
use crate::services::auth_provider::AuthProvider;
use crate::services::backend::{BookmarkApi, ProviderApi};
use crate::services::notify::{Notifier, NotifyLevel};
use futures_util::{stream, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard};

const MAX_CONCURRENT_DETAIL_FETCHES: usize = 8;

/// Result of a settled toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// `true` if the provider is now bookmarked.
    pub added: bool,
    pub provider_id: u64,
}

#[derive(Debug, Default)]
struct ListStatus {
    in_flight: usize,
    error: Option<String>,
}

/// Signed-in user's bookmarks, backed by the shared query cache.
pub struct BookmarkService {
    api: Arc<dyn BookmarkApi>,
    providers: Arc<dyn ProviderApi>,
    auth: Arc<dyn AuthProvider>,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
    status: Mutex<ListStatus>,
}

impl BookmarkService {
    pub fn new(
        api: Arc<dyn BookmarkApi>,
        providers: Arc<dyn ProviderApi>,
        auth: Arc<dyn AuthProvider>,
        cache: QueryCache,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            providers,
            auth,
            cache,
            notifier,
            status: Mutex::new(ListStatus::default()),
        }
    }

    fn lock_status(&self) -> MutexGuard<'_, ListStatus> {
        self.status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ─── List query ──────────────────────────────────────────────

    /// Current state of the list query, without fetching.
    pub fn list(&self) -> QueryResult<Vec<u64>> {
        if !self.auth.is_signed_in() {
            return QueryResult::idle();
        }
        let data: Option<Vec<u64>> = self.cache.get(&keys::bookmarks::list());
        let status = self.lock_status();
        let state = if status.in_flight > 0 {
            QueryStatus::Loading
        } else if status.error.is_some() {
            QueryStatus::Error
        } else if data.is_some() {
            QueryStatus::Success
        } else {
            QueryStatus::Idle
        };
        QueryResult {
            data,
            status: state,
            error: status.error.clone(),
        }
    }

    /// Fetch the list if it is missing or invalidated; otherwise serve the cache.
    pub async fn fetch_list(&self) -> QueryResult<Vec<u64>> {
        if self.auth.is_signed_in() && !self.cache.is_stale(&keys::bookmarks::list()) {
            return self.list();
        }
        self.refetch().await
    }

    /// Always hit the network (when signed in).
    pub async fn refetch(&self) -> QueryResult<Vec<u64>> {
        if !self.auth.is_signed_in() {
            return QueryResult::idle();
        }

        self.lock_status().in_flight += 1;
        let result = self.api.bookmark_ids().await;
        let stored = result.and_then(|ids| {
            let ids = dedup_ids(ids);
            self.cache.set(keys::bookmarks::list(), &ids).map(|_| ids)
        });

        {
            let mut status = self.lock_status();
            status.in_flight = status.in_flight.saturating_sub(1);
            match &stored {
                Ok(_) => status.error = None,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to fetch bookmarks");
                    status.error = Some(e.to_string());
                }
            }
        }

        self.list()
    }

    pub fn is_bookmarked(&self, provider_id: u64) -> bool {
        self.cache
            .get::<Vec<u64>>(&keys::bookmarks::list())
            .map(|ids| ids.contains(&provider_id))
            .unwrap_or(false)
    }

    // ─── Toggle ──────────────────────────────────────────────────

    /// Add `provider_id` if absent, remove it if present.
    ///
    /// The cached list changes immediately; a failed request rolls it back.
    /// Either way the list is refetched afterwards and exactly one success
    /// or failure notice is emitted.
    pub async fn toggle(&self, provider_id: u64) -> Result<ToggleOutcome> {
        if !self.auth.is_signed_in() {
            self.notifier
                .notify("Please sign in to bookmark providers", NotifyLevel::Info);
            return Err(AppError::Unauthorized);
        }

        if !self.cache.contains(&keys::bookmarks::list()) {
            self.refetch().await;
        }

        let pending = OptimisticUpdate::apply(
            &self.cache,
            keys::bookmarks::list(),
            |ids: Option<Vec<u64>>| toggled(ids.unwrap_or_default(), provider_id),
        )?;
        let was_bookmarked = pending
            .previous()
            .map(|ids| ids.contains(&provider_id))
            .unwrap_or(false);

        let result = if was_bookmarked {
            self.api.remove_bookmark(provider_id).await
        } else {
            self.api.add_bookmark(provider_id).await
        };

        let outcome = match result {
            Ok(()) => {
                if let Err(e) = pending.commit(None) {
                    tracing::warn!(error = %e, "Failed to confirm bookmark update");
                }
                let added = !was_bookmarked;
                tracing::info!(provider_id, added, "Bookmark toggled");
                self.notifier.notify(
                    if added {
                        "Provider added to your bookmarks"
                    } else {
                        "Provider removed from your bookmarks"
                    },
                    NotifyLevel::Success,
                );
                self.cache.invalidate(&keys::bookmarks::details());
                Ok(ToggleOutcome { added, provider_id })
            }
            Err(e) => {
                match pending.revert() {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(provider_id, "Newer bookmark write landed; refetch will reconcile")
                    }
                    Err(revert_err) => {
                        tracing::warn!(error = %revert_err, "Failed to roll back bookmark update")
                    }
                }
                tracing::warn!(provider_id, error = %e, "Bookmark update failed");
                self.notifier.notify(
                    "Failed to update bookmark. Please try again.",
                    NotifyLevel::Error,
                );
                Err(e)
            }
        };

        self.cache.invalidate(&keys::bookmarks::list());
        self.refetch().await;

        outcome
    }

    // ─── Bookmarked provider details ─────────────────────────────

    /// Details for every bookmarked provider, in bookmark order.
    ///
    /// Providers that no longer exist are skipped.
    pub async fn bookmarked_providers(&self) -> Result<Vec<Provider>> {
        if !self.auth.is_signed_in() {
            return Ok(Vec::new());
        }
        if !self.cache.is_stale(&keys::bookmarks::details()) {
            if let Some(providers) = self.cache.get(&keys::bookmarks::details()) {
                return Ok(providers);
            }
        }

        let list = self.fetch_list().await;
        let ids = match (list.data, list.error) {
            (Some(ids), _) => ids,
            (None, Some(error)) => return Err(AppError::Network(error)),
            (None, None) => Vec::new(),
        };

        let results: Vec<(u64, Result<Provider>)> = stream::iter(ids)
            .map(|id| async move { (id, self.providers.provider(id).await) })
            .buffered(MAX_CONCURRENT_DETAIL_FETCHES)
            .collect()
            .await;

        let mut providers = Vec::with_capacity(results.len());
        for (id, result) in results {
            match result {
                Ok(provider) => providers.push(provider),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(provider_id = id, "Bookmarked provider no longer exists");
                }
                Err(e) => return Err(e),
            }
        }

        self.cache.set(keys::bookmarks::details(), &providers)?;
        Ok(providers)
    }
}

fn toggled(mut ids: Vec<u64>, provider_id: u64) -> Vec<u64> {
    if let Some(pos) = ids.iter().position(|&id| id == provider_id) {
        ids.remove(pos);
    } else {
        ids.push(provider_id);
    }
    ids
}

/// Keep the first occurrence of each ID.
fn dedup_ids(ids: Vec<u64>) -> Vec<u64> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggled_adds_and_removes() {
        assert_eq!(toggled(vec![1, 2], 42), vec![1, 2, 42]);
        assert_eq!(toggled(vec![1, 42, 2], 42), vec![1, 2]);
        assert_eq!(toggled(toggled(vec![1, 2], 3), 3), vec![1, 2]);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        assert_eq!(dedup_ids(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
