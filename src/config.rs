// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The user-context settings are plain values handed to whoever needs them;
//! there is no process-wide singleton.

use serde::{Deserialize, Serialize};
use std::env;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Which store is authoritative for the signed-in user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// The marketplace backend's profile store.
    #[default]
    Backend,
    /// The external auth provider's identity record.
    Clerk,
}

impl std::str::FromStr for DataSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backend" => Ok(DataSource::Backend),
            "clerk" => Ok(DataSource::Clerk),
            _ => Err(ConfigError::Invalid("USER_DATA_SOURCE", s.to_string())),
        }
    }
}

/// Settings for the user identity resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContextConfig {
    pub data_source: DataSource,
    /// Push profile name changes to the secondary store after a primary success.
    pub sync_on_update: bool,
    /// Periodic refresh interval; `None` disables auto-refresh.
    pub auto_refresh_interval: Option<Duration>,
}

impl Default for UserContextConfig {
    fn default() -> Self {
        Self {
            data_source: DataSource::Backend,
            sync_on_update: true,
            auto_refresh_interval: None,
        }
    }
}

/// Partial update for [`UserContextConfig`]; `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct UserContextConfigPatch {
    pub data_source: Option<DataSource>,
    pub sync_on_update: Option<bool>,
    /// `Some(None)` disables auto-refresh.
    pub auto_refresh_interval: Option<Option<Duration>>,
}

/// Shared handle to a [`UserContextConfig`].
///
/// Readers get copies, so nothing outside can mutate the stored value
/// through a reference.
#[derive(Debug, Clone, Default)]
pub struct SharedUserConfig {
    inner: Arc<RwLock<UserContextConfig>>,
}

impl SharedUserConfig {
    pub fn new(config: UserContextConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn snapshot(&self) -> UserContextConfig {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Shallow-merge `patch` and return the resulting configuration.
    pub fn merge(&self, patch: UserContextConfigPatch) -> UserContextConfig {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(source) = patch.data_source {
            guard.data_source = source;
        }
        if let Some(sync) = patch.sync_on_update {
            guard.sync_on_update = sync;
        }
        if let Some(interval) = patch.auto_refresh_interval {
            guard.auto_refresh_interval = interval;
        }
        guard.clone()
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the marketplace backend API
    pub backend_api_url: String,
    /// Base URL of the auth provider's REST API
    pub auth_api_url: String,
    /// Auth provider secret key (server-side only)
    pub auth_secret_key: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Resolver defaults
    pub user_context: UserContextConfig,
}

impl Config {
    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            backend_api_url: "http://127.0.0.1:9".to_string(),
            auth_api_url: "http://127.0.0.1:9/v1".to_string(),
            auth_secret_key: "sk_test_secret".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            user_context: UserContextConfig::default(),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let data_source = match env::var("USER_DATA_SOURCE") {
            Ok(raw) => raw.parse()?,
            Err(_) => DataSource::Backend,
        };

        let sync_on_update = match env::var("USER_SYNC_ON_UPDATE") {
            Ok(raw) => raw
                .trim()
                .parse::<bool>()
                .map_err(|_| ConfigError::Invalid("USER_SYNC_ON_UPDATE", raw.clone()))?,
            Err(_) => true,
        };

        let auto_refresh_interval = match env::var("USER_AUTO_REFRESH_MS") {
            Ok(raw) => Some(Duration::from_millis(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::Invalid("USER_AUTO_REFRESH_MS", raw.clone()))?,
            )),
            Err(_) => None,
        };

        Ok(Self {
            backend_api_url: env::var("BACKEND_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("BACKEND_API_URL"))?,
            auth_api_url: env::var("AUTH_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api.clerk.com/v1".to_string()),
            auth_secret_key: env::var("AUTH_SECRET_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AUTH_SECRET_KEY"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            user_context: UserContextConfig {
                data_source,
                sync_on_update,
                auto_refresh_interval,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
