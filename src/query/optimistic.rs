// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Snapshot → apply → commit-or-revert for cached values.
//!
//! ```ignore
//! let pending = OptimisticUpdate::apply(&cache, keys::bookmarks::list(), |ids| toggle(ids))?;
//! match api.call().await {
//!     Ok(_) => pending.commit(None)?,
//!     Err(_) => { pending.revert()?; }
//! }
//! ```
//!
//! Every apply records the version it wrote. A revert only restores the
//! snapshot if nothing else has written the entry since, so a late failure
//! cannot clobber a newer mutation's state.

use crate::error::Result;
use crate::query::cache::QueryCache;
use crate::query::keys::QueryKey;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// An optimistic write awaiting confirmation.
#[must_use = "an optimistic update must be committed or reverted"]
pub struct OptimisticUpdate<T> {
    cache: QueryCache,
    key: QueryKey,
    previous: Option<T>,
    current: T,
    version: u64,
}

impl<T> OptimisticUpdate<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Snapshot the entry under `key` and write `f(snapshot)` in one step.
    pub fn apply<F>(cache: &QueryCache, key: QueryKey, f: F) -> Result<Self>
    where
        F: FnOnce(Option<T>) -> T,
    {
        let replaced = cache.update(key.clone(), f)?;
        Ok(Self {
            cache: cache.clone(),
            key,
            previous: replaced.previous,
            current: replaced.current,
            version: replaced.version,
        })
    }

    /// Value before the optimistic write.
    pub fn previous(&self) -> Option<&T> {
        self.previous.as_ref()
    }

    /// Value the optimistic write installed.
    pub fn current(&self) -> &T {
        &self.current
    }

    /// Confirm the write, optionally replacing it with the server's value.
    pub fn commit(self, confirmed: Option<&T>) -> Result<()> {
        if let Some(value) = confirmed {
            self.cache.set(self.key, value)?;
        }
        Ok(())
    }

    /// Roll back to the snapshot. Returns `false` when a newer write has
    /// landed and the rollback was skipped.
    pub fn revert(self) -> Result<bool> {
        let restored = self
            .cache
            .restore(&self.key, self.version, self.previous.as_ref())?;
        if !restored {
            tracing::debug!(
                key = %self.key,
                version = self.version,
                "Skipping stale rollback; entry was written since"
            );
        }
        Ok(restored)
    }
}
