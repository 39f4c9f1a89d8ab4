// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared query cache.
//!
//! Values are stored as JSON so one cache can hold every query's data.
//! Each write stamps the entry with a fresh version from a cache-wide
//! monotonic counter; optimistic reverts use it to detect newer writes.

use crate::error::{AppError, Result};
use crate::query::keys::QueryKey;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct CacheEntry {
    data: serde_json::Value,
    version: u64,
    invalidated: bool,
}

/// Result of an atomic read-modify-write.
#[derive(Debug, Clone)]
pub struct Replaced<T> {
    pub previous: Option<T>,
    pub current: T,
    /// Version stamped on the new value
    pub version: u64,
}

/// Clonable handle to one shared cache.
#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<DashMap<QueryKey, CacheEntry>>,
    clock: Arc<AtomicU64>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Read and decode the value stored under `key`.
    ///
    /// Entries that no longer decode as `T` are treated as missing.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        match serde_json::from_value(entry.data.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set<T: Serialize>(&self, key: QueryKey, value: &T) -> Result<u64> {
        let data = encode(value)?;
        let version = self.next_version();
        self.entries.insert(
            key,
            CacheEntry {
                data,
                version,
                invalidated: false,
            },
        );
        Ok(version)
    }

    /// Atomically replace the value under `key` with `f(previous)`.
    pub fn update<T, F>(&self, key: QueryKey, f: F) -> Result<Replaced<T>>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: FnOnce(Option<T>) -> T,
    {
        let version = self.next_version();
        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                let previous: T = serde_json::from_value(slot.get().data.clone())
                    .map_err(|e| AppError::Internal(anyhow::anyhow!("Cache decode: {}", e)))?;
                let current = f(Some(previous.clone()));
                let entry = slot.get_mut();
                entry.data = encode(&current)?;
                entry.version = version;
                Ok(Replaced {
                    previous: Some(previous),
                    current,
                    version,
                })
            }
            Entry::Vacant(slot) => {
                let current = f(None);
                slot.insert(CacheEntry {
                    data: encode(&current)?,
                    version,
                        invalidated: false,
                });
                Ok(Replaced {
                    previous: None,
                    current,
                    version,
                })
            }
        }
    }

    /// Put `previous` back, but only if the entry still carries
    /// `expected_version`. Returns whether anything was restored.
    pub fn restore<T: Serialize>(
        &self,
        key: &QueryKey,
        expected_version: u64,
        previous: Option<&T>,
    ) -> Result<bool> {
        match previous {
            Some(value) => {
                let data = encode(value)?;
                let Some(mut entry) = self.entries.get_mut(key) else {
                    return Ok(false);
                };
                if entry.version != expected_version {
                    return Ok(false);
                }
                entry.data = data;
                entry.version = self.next_version();
                Ok(true)
            }
            None => Ok(self
                .entries
                .remove_if(key, |_, entry| entry.version == expected_version)
                .is_some()),
        }
    }

    pub fn remove(&self, key: &QueryKey) {
        self.entries.remove(key);
    }

    /// Mark every entry under `prefix` as stale. Returns how many matched.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut count = 0;
        for mut entry in self.entries.iter_mut() {
            if entry.key().starts_with(prefix) {
                entry.value_mut().invalidated = true;
                count += 1;
            }
        }
        tracing::debug!(prefix = %prefix, count, "Invalidated cache entries");
        count
    }

    /// Missing or invalidated entries need a refetch.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.invalidated)
            .unwrap_or(true)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn version(&self, key: &QueryKey) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.version)
    }

    /// Drop every entry under `prefix`.
    pub fn remove_prefix(&self, prefix: &QueryKey) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
    }
}

fn encode<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Cache encode: {}", e)))
}
