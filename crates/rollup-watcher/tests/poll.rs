use std::time::Duration;

use rollup_watcher::{
    RollupWatcher,
    WatcherConfig,
    WatcherState,
};
use serde_json::json;
use tokio::time::timeout;
use wiremock::{
    Mock,
    MockServer,
    ResponseTemplate,
    matchers::{
        method,
        path,
    },
};

const WAIT: Duration = Duration::from_secs(5);

fn ok_body() -> serde_json::Value {
    json!({
        "ok": true,
        "info": {
            "mode": "sequencer",
            "syncing": false,
            "ethContext": {"blockNumber": 100, "timestamp": 1000},
            "rollupContext": {"queueIndex": 5, "index": 5, "verifiedIndex": 4},
        },
    })
}

fn fast_config(gateway: &MockServer) -> WatcherConfig {
    WatcherConfig::new(format!("{}/api/mantle/rollup-info", gateway.uri()))
        .with_poll_interval(Duration::from_millis(25))
        .with_retry_delay(Duration::from_millis(5))
}

/// Wait until the receiver observes a state matching `predicate`.
async fn wait_for_state(
    rx: &mut tokio::sync::watch::Receiver<WatcherState>,
    predicate: impl Fn(&WatcherState) -> bool,
) -> WatcherState {
    timeout(WAIT, async {
        loop {
            {
                let state = rx.borrow_and_update().clone();
                if predicate(&state) {
                    return state;
                }
            }
            rx.changed().await.expect("watcher dropped its sender");
        }
    })
    .await
    .expect("timed out waiting for watcher state")
}

/// A healthy gateway takes the watcher from loading to ready.
#[tokio::test]
async fn transitions_to_ready_on_success() {
    let gateway = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mantle/rollup-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .mount(&gateway)
        .await;

    let watcher = RollupWatcher::spawn(fast_config(&gateway)).unwrap();
    let mut rx = watcher.subscribe();

    let state = wait_for_state(&mut rx, WatcherState::is_ready).await;
    match state {
        WatcherState::Ready { info, .. } => {
            assert_eq!(info.mode, "sequencer");
            assert_eq!(info.rollup_context.verified_index.value(), 4);
        }
        other => panic!("expected Ready, got {other:?}"),
    }

    watcher.shutdown().await;
}

/// A persistently failing gateway surfaces Failed without panicking, and the
/// loop keeps polling afterwards.
#[tokio::test]
async fn transitions_to_failed_after_retry_budget() {
    let gateway = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mantle/rollup-info"))
        .respond_with(
            ResponseTemplate::new(502)
                .set_body_json(json!({"ok": false, "error": "Mantle RPC HTTP 500"})),
        )
        .mount(&gateway)
        .await;

    let config = fast_config(&gateway).with_error_retries(1);
    let watcher = RollupWatcher::spawn(config).unwrap();
    let mut rx = watcher.subscribe();

    let state = wait_for_state(&mut rx, |state| {
        matches!(state, WatcherState::Failed { .. })
    })
    .await;
    match state {
        WatcherState::Failed { error } => {
            assert!(error.contains("Mantle RPC HTTP 500"), "got {error}");
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    // Loop is still alive: further polls keep landing on the gateway.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(gateway.received_requests().await.unwrap().len() >= 2);

    watcher.shutdown().await;
}

/// Transient failures inside the retry budget never surface to observers.
#[tokio::test]
async fn recovers_within_the_retry_budget() {
    let gateway = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mantle/rollup-info"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&gateway)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/mantle/rollup-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .mount(&gateway)
        .await;

    let config = fast_config(&gateway).with_error_retries(3);
    let watcher = RollupWatcher::spawn(config).unwrap();
    let mut rx = watcher.subscribe();

    let state = wait_for_state(&mut rx, |state| *state != WatcherState::Loading).await;
    assert!(state.is_ready(), "expected Ready, got {state:?}");

    watcher.shutdown().await;
}

/// After shutdown no further state update is observed, even though the
/// gateway keeps answering.
#[tokio::test]
async fn no_state_updates_after_shutdown() {
    let gateway = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mantle/rollup-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .mount(&gateway)
        .await;

    let watcher = RollupWatcher::spawn(fast_config(&gateway)).unwrap();
    let mut rx = watcher.subscribe();
    wait_for_state(&mut rx, WatcherState::is_ready).await;

    watcher.shutdown().await;
    let mut rx_after = rx.clone();
    rx_after.borrow_and_update();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(
        !rx_after.has_changed().unwrap_or(false),
        "state changed after shutdown"
    );
}

/// A body that is not the gateway envelope surfaces as Failed, not a panic.
#[tokio::test]
async fn malformed_envelope_is_a_failure() {
    let gateway = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mantle/rollup-info"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&gateway)
        .await;

    let config = fast_config(&gateway).with_error_retries(0);
    let watcher = RollupWatcher::spawn(config).unwrap();
    let mut rx = watcher.subscribe();

    let state = wait_for_state(&mut rx, |state| {
        matches!(state, WatcherState::Failed { .. })
    })
    .await;
    assert!(matches!(state, WatcherState::Failed { .. }));

    watcher.shutdown().await;
}

/// Shutdown does not wait out a slow gateway response.
#[tokio::test]
async fn shutdown_abandons_an_in_flight_request() {
    let gateway = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mantle/rollup-info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_body())
                .set_delay(Duration::from_secs(8)),
        )
        .mount(&gateway)
        .await;

    let watcher = RollupWatcher::spawn(fast_config(&gateway)).unwrap();
    // Let the first request get in flight before asking for shutdown.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = std::time::Instant::now();
    watcher.shutdown().await;
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "shutdown blocked for {:?} on the in-flight request",
        started.elapsed()
    );
}

/// A gateway that accepts the request but never answers within the request
/// timeout counts as a failed cycle instead of stalling the loop.
#[tokio::test]
async fn hung_response_surfaces_failed_via_the_request_timeout() {
    let gateway = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mantle/rollup-info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_body())
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&gateway)
        .await;

    let config = fast_config(&gateway)
        .with_error_retries(0)
        .with_request_timeout(Duration::from_millis(100));
    let watcher = RollupWatcher::spawn(config).unwrap();
    let mut rx = watcher.subscribe();

    let state = wait_for_state(&mut rx, |state| {
        matches!(state, WatcherState::Failed { .. })
    })
    .await;
    assert!(matches!(state, WatcherState::Failed { .. }));

    watcher.shutdown().await;
}

/// Spawning with a broken configuration fails fast instead of polling.
#[tokio::test]
async fn spawn_rejects_invalid_config() {
    assert!(RollupWatcher::spawn(WatcherConfig::new("")).is_err());
    assert!(RollupWatcher::spawn(WatcherConfig::new("ftp://x")).is_err());
}
