// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Provider Hub: client identity and preference sync for a service marketplace.
//!
//! The `services` and `query` modules hold the sync layer (offline-aware
//! requests, network observation, cached bookmark and profile state). The
//! `routes` module exposes the same backend through a small proxy server.

pub mod config;
pub mod contrast;
pub mod error;
pub mod middleware;
pub mod models;
pub mod query;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use query::QueryCache;
use services::{BackendClient, HeroImageUploader, ProviderCatalog};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
    /// Public catalog data, cached across requests
    pub catalog: ProviderCatalog,
    pub uploader: HeroImageUploader,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let backend = BackendClient::new(&config.backend_api_url);
        let catalog = ProviderCatalog::new(backend.clone(), QueryCache::new());
        let uploader = HeroImageUploader::new(backend.clone());
        Self {
            config,
            backend,
            catalog,
            uploader,
        }
    }
}
