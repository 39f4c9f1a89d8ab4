// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Network observer and offline wrapper tests.

use provider_hub::error::AppError;
use provider_hub::services::network::Performance;
use provider_hub::services::{
    with_offline_handling, NetworkEvent, NetworkObserver, NetworkStatus, OfflineOptions,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn slow_then(event: NetworkEvent) -> NetworkObserver {
    let observer = NetworkObserver::new(true);
    observer.handle(NetworkEvent::ConnectionChange {
        effective_type: "4g".to_string(),
    });
    observer.handle(event);
    observer
}

#[test]
fn test_offline_event_overrides_connection_quality() {
    let observer = slow_then(NetworkEvent::Offline);
    let state = observer.state();
    assert_eq!(state.status, NetworkStatus::Offline);
    assert_eq!(state.performance, Performance::Poor);

    // Quality readings while offline do not bring it back
    observer.handle(NetworkEvent::ConnectionChange {
        effective_type: "4g".to_string(),
    });
    assert_eq!(observer.state().status, NetworkStatus::Offline);
    assert_eq!(observer.state().performance, Performance::Poor);
}

#[test]
fn test_slow_connection_types() {
    for slow in ["slow-2g", "2g", "3g"] {
        let observer = slow_then(NetworkEvent::ConnectionChange {
            effective_type: slow.to_string(),
        });
        assert_eq!(observer.state().status, NetworkStatus::Slow, "{slow}");
        assert_eq!(observer.state().performance, Performance::Poor);
    }
}

#[test]
fn test_online_records_timestamp() {
    let observer = NetworkObserver::new(false);
    assert!(observer.state().last_online.is_none());

    observer.handle(NetworkEvent::Online);
    let state = observer.state();
    assert_eq!(state.status, NetworkStatus::Online);
    assert!(state.last_online.is_some());
}

#[tokio::test]
async fn test_subscribers_see_changes() {
    let observer = NetworkObserver::new(true);
    let mut rx = observer.subscribe();

    observer.handle(NetworkEvent::Offline);
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().status, NetworkStatus::Offline);
}

#[tokio::test]
async fn test_observer_drives_offline_wrapper() {
    let observer = NetworkObserver::new(true);
    observer.handle(NetworkEvent::Offline);

    let calls = AtomicU32::new(0);
    let result = with_offline_handling(
        &observer,
        OfflineOptions::default().with_fallback(Some(vec![1u64, 2])),
        || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![9u64])
        },
    )
    .await;

    assert_eq!(result.unwrap(), vec![1, 2]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_surface_terminal_error() {
    let observer = NetworkObserver::new(true);
    let calls = AtomicU32::new(0);

    let result: Result<(), AppError> = with_offline_handling(
        &observer,
        OfflineOptions::default()
            .with_retries(2)
            .with_retry_delay(Duration::from_millis(100)),
        || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Network("timed out".to_string()))
        },
    )
    .await;

    assert!(matches!(result, Err(AppError::RetriesExhausted { attempts: 3 })));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
