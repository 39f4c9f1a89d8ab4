// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Offline-aware request wrapper.
//!
//! Checks connectivity before each attempt, retries network-class failures
//! with linear backoff, and short-circuits to a fallback value when offline.

use crate::error::{AppError, Result};
use std::future::Future;
use std::time::Duration;

const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Source of the "are we online" signal.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Options for [`with_offline_handling`].
pub struct OfflineOptions<T> {
    /// Extra attempts after the first one.
    pub retries: u32,
    /// Base delay; attempt `n` waits `retry_delay * n` before retrying.
    pub retry_delay: Duration,
    /// Returned instead of calling the operation while offline.
    pub fallback: Option<T>,
    /// Invoked whenever an attempt is skipped because we are offline.
    pub on_offline: Option<Box<dyn Fn() + Send + Sync>>,
}

impl<T> Default for OfflineOptions<T> {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            fallback: None,
            on_offline: None,
        }
    }
}

impl<T> OfflineOptions<T> {
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_fallback(mut self, fallback: Option<T>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn on_offline(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_offline = Some(Box::new(callback));
        self
    }
}

/// Run `operation` with offline detection and bounded retries.
///
/// - Offline before an attempt: call `on_offline`, then return the fallback
///   if one was given, else fail with [`AppError::Offline`].
/// - Network-class error ([`AppError::is_network_error`]): wait and retry,
///   at most `retries + 1` attempts in total, then fail with
///   [`AppError::RetriesExhausted`].
/// - Any other error is returned immediately.
pub async fn with_offline_handling<T, F, Fut>(
    connectivity: &dyn Connectivity,
    mut options: OfflineOptions<T>,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = options.retries.saturating_add(1);

    for attempt in 1..=attempts {
        if !connectivity.is_online() {
            if let Some(callback) = &options.on_offline {
                callback();
            }
            return match options.fallback.take() {
                Some(fallback) => Ok(fallback),
                None => Err(AppError::Offline),
            };
        }

        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_network_error() => {
                if attempt == attempts {
                    tracing::warn!(attempt, error = %e, "Network request failed, giving up");
                    break;
                }
                let delay = options.retry_delay * attempt;
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Network request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }

    Err(AppError::RetriesExhausted { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;

    struct Flag(AtomicBool);

    impl Connectivity for Flag {
        fn is_online(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn online() -> Flag {
        Flag(AtomicBool::new(true))
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bound() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = with_offline_handling(
            &online(),
            OfflineOptions::default().with_retries(2),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::Network("connection reset".to_string())) }
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::RetriesExhausted { attempts: 3 })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_linear_backoff() {
        let start = tokio::time::Instant::now();
        let _: Result<()> = with_offline_handling(
            &online(),
            OfflineOptions::default()
                .with_retries(3)
                .with_retry_delay(Duration::from_millis(100)),
            || async { Err(AppError::Network("timeout".to_string())) },
        )
        .await;

        // 100 + 200 + 300
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(600));
        assert!(elapsed < Duration::from_millis(700));
    }

    #[tokio::test]
    async fn test_non_network_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> =
            with_offline_handling(&online(), OfflineOptions::default(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::NotFound("profile".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = with_offline_handling(&online(), OfflineOptions::default(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(AppError::Network("dns".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_offline_fallback_short_circuits() {
        let calls = AtomicU32::new(0);
        let notified = Arc::new(AtomicU32::new(0));
        let seen = notified.clone();

        let result = with_offline_handling(
            &Flag(AtomicBool::new(false)),
            OfflineOptions::default()
                .with_fallback(Some(7u32))
                .on_offline(move || {
                    seen.fetch_add(1, Ordering::SeqCst);
                }),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(1u32) }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_offline_without_fallback_errors() {
        let result: Result<u32> = with_offline_handling(
            &Flag(AtomicBool::new(false)),
            OfflineOptions::default(),
            || async { Ok(1u32) },
        )
        .await;

        assert!(matches!(result, Err(AppError::Offline)));
    }
}
