// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - client sync layer and backend access.

pub mod auth_provider;
pub mod backend;
pub mod bookmarks;
pub mod catalog;
pub mod identity;
pub mod network;
pub mod notify;
pub mod offline;
pub mod profile_source;
pub mod sync;
pub mod upload;

pub use auth_provider::{AuthProvider, ClerkAuthProvider};
pub use backend::{BackendClient, BackendService, BookmarkApi, ProfileApi, ProviderApi};
pub use bookmarks::{BookmarkService, ToggleOutcome};
pub use catalog::ProviderCatalog;
pub use identity::{ProfileSources, ResolverPhase, UserResolver, Visibility};
pub use network::{NetworkEvent, NetworkObserver, NetworkState, NetworkStatus};
pub use notify::{NoticeQueue, Notifier, NotifyLevel, TracingNotifier};
pub use offline::{with_offline_handling, Connectivity, OfflineOptions};
pub use profile_source::{AuthProviderProfileSource, BackendProfileSource, ProfileSource};
pub use sync::SyncLayer;
pub use upload::{HeroImage, HeroImageUploader};
