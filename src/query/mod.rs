// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side query cache: key registry, shared store, optimistic writes.

pub mod cache;
pub mod keys;
pub mod optimistic;

pub use cache::QueryCache;
pub use keys::QueryKey;
pub use optimistic::OptimisticUpdate;

/// Lifecycle of a cached query as seen by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Disabled (e.g. signed out); no request issued.
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of a query: data, status and last error.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    pub data: Option<T>,
    pub status: QueryStatus,
    pub error: Option<String>,
}

impl<T> QueryResult<T> {
    pub fn idle() -> Self {
        Self {
            data: None,
            status: QueryStatus::Idle,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }
}
