// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Network state observer.
//!
//! Event-driven: the host feeds [`NetworkEvent`]s (browser online/offline
//! events, connection-quality changes) and subscribers are woken only when
//! the resulting [`NetworkState`] actually changes.

use crate::services::offline::Connectivity;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
    Online,
    Offline,
    Slow,
    Fast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Performance {
    Good,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkState {
    pub status: NetworkStatus,
    pub performance: Performance,
    pub last_online: Option<DateTime<Utc>>,
}

impl NetworkState {
    pub fn is_online(&self) -> bool {
        self.status != NetworkStatus::Offline
    }
}

/// Signals reported by the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    Online,
    Offline,
    /// Effective connection type changed, e.g. `"4g"` or `"slow-2g"`.
    ConnectionChange { effective_type: String },
}

const SLOW_CONNECTION_TYPES: [&str; 3] = ["slow-2g", "2g", "3g"];

/// Process-wide network state, shared behind an `Arc`.
pub struct NetworkObserver {
    state: watch::Sender<NetworkState>,
}

impl NetworkObserver {
    /// Start from the environment's current online flag.
    pub fn new(initially_online: bool) -> Self {
        let state = if initially_online {
            NetworkState {
                status: NetworkStatus::Online,
                performance: Performance::Good,
                last_online: Some(Utc::now()),
            }
        } else {
            NetworkState {
                status: NetworkStatus::Offline,
                performance: Performance::Poor,
                last_online: None,
            }
        };
        let (state, _) = watch::channel(state);
        Self { state }
    }

    pub fn state(&self) -> NetworkState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkState> {
        self.state.subscribe()
    }

    /// Apply one host event.
    pub fn handle(&self, event: NetworkEvent) {
        let changed = self.state.send_if_modified(|state| {
            let before = state.clone();
            match &event {
                NetworkEvent::Offline => {
                    state.status = NetworkStatus::Offline;
                    state.performance = Performance::Poor;
                }
                NetworkEvent::Online => {
                    state.status = NetworkStatus::Online;
                    state.last_online = Some(Utc::now());
                }
                NetworkEvent::ConnectionChange { effective_type } => {
                    if state.status == NetworkStatus::Offline {
                        state.performance = Performance::Poor;
                    } else if SLOW_CONNECTION_TYPES.contains(&effective_type.as_str()) {
                        state.status = NetworkStatus::Slow;
                        state.performance = Performance::Poor;
                    } else {
                        state.status = NetworkStatus::Fast;
                        state.performance = Performance::Good;
                    }
                }
            }
            *state != before
        });

        if changed {
            let state = self.state.borrow();
            tracing::debug!(status = ?state.status, performance = ?state.performance, "Network state changed");
        }
    }
}

impl Connectivity for NetworkObserver {
    fn is_online(&self) -> bool {
        self.state.borrow().is_online()
    }
}
