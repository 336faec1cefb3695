//! Retry and failure classification of the client request layer.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use rstest::rstest;
use serde_json::{Map, Value, json};

use conduit_config::Config;
use conduit_protocol::ErrorKind;

use crate::client::Client;
use crate::errors::ClientError;
use crate::retry::{MAX_BACKOFF, RetryPolicy};

use super::support::{FakeBridge, FlakyConnector, Scripted, SlowFirstConnector, quiet_config};

const CALL_TIMEOUT: Duration = Duration::from_secs(5);

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[rstest]
fn host_failures_are_not_retried() {
    let bridge = FakeBridge::spawn(vec![Scripted::Respond(json!({
        "error": "HostExecutionFailure",
        "detail": "handler failed after a long run",
    }))])
    .expect("spawn bridge");
    let (connector, attempts) = FlakyConnector::new(0);
    let client = Client::with_connector(&bridge.config(), connector);

    let error = client
        .call("create_node", args(json!({"definition_id": "x"})), CALL_TIMEOUT)
        .expect_err("host failure");

    let ClientError::Host(reply) = &error else {
        panic!("expected host failure, got {error:?}");
    };
    assert_eq!(reply.kind(), Some(ErrorKind::HostExecutionFailure));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(bridge.finish().expect("bridge finished").len(), 1);
}

#[rstest]
fn refused_connections_use_the_whole_attempt_budget() {
    let (connector, attempts) = FlakyConnector::new(u32::MAX);
    let client = Client::with_connector(&quiet_config(9881), connector);

    let error = client
        .call("ping", Map::new(), CALL_TIMEOUT)
        .expect_err("every attempt refused");

    assert!(
        matches!(error, ClientError::Transport { attempts: 3, .. }),
        "{error:?}"
    );
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[rstest]
fn transient_refusals_recover() {
    let bridge =
        FakeBridge::spawn(vec![Scripted::Respond(json!({"pong": true}))]).expect("spawn bridge");
    let (connector, attempts) = FlakyConnector::new(2);
    let client = Client::with_connector(&bridge.config(), connector);

    let result = client
        .call("ping", Map::new(), CALL_TIMEOUT)
        .expect("third attempt succeeds");

    assert_eq!(result, json!({"pong": true}));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(
        bridge.finish().expect("bridge finished"),
        vec![json!({"command": "ping", "args": {}})]
    );
}

#[rstest]
#[case::command_timeout(5, Duration::ZERO, "command timeout")]
#[case::connect_timeout(0, CALL_TIMEOUT, "connect timeout")]
fn zero_timeouts_are_rejected_before_dialling(
    #[case] connect_timeout_secs: u64,
    #[case] timeout: Duration,
    #[case] expected: &str,
) {
    let config = Config {
        connect_timeout_secs,
        ..quiet_config(9881)
    };
    let (connector, attempts) = FlakyConnector::new(0);
    let client = Client::with_connector(&config, connector);

    let error = client
        .call("ping", Map::new(), timeout)
        .expect_err("zero timeout rejected");

    assert!(
        matches!(error, ClientError::ZeroTimeout { name } if name == expected),
        "{error:?}"
    );
    assert_eq!(attempts.load(Ordering::SeqCst), 0, "nothing was dialled");
}

#[rstest]
#[case::slow_host(Scripted::Stall(Duration::from_millis(600)))]
#[case::dropped_response(Scripted::Hangup)]
fn failures_after_sending_are_not_retried(#[case] step: Scripted) {
    let stalled = matches!(step, Scripted::Stall(_));
    let bridge = FakeBridge::spawn(vec![step]).expect("spawn bridge");
    let (connector, attempts) = FlakyConnector::new(0);
    let client = Client::with_connector(&bridge.config(), connector);

    let error = client
        .call("set_parameter", Map::new(), Duration::from_millis(150))
        .expect_err("no response");

    if stalled {
        assert!(matches!(error, ClientError::Timeout { .. }), "{error:?}");
    } else {
        assert!(matches!(error, ClientError::ResponseLost { .. }), "{error:?}");
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    bridge.finish().expect("bridge finished");
}

#[rstest]
fn backoff_does_not_hold_the_in_flight_lock() {
    let bridge = FakeBridge::spawn(vec![
        Scripted::Respond(json!({"pong": true})),
        Scripted::Respond(json!({"pong": true})),
    ])
    .expect("spawn bridge");
    let (connector, attempts) = FlakyConnector::new(1);
    let client = Arc::new(
        Client::with_connector(&bridge.config(), connector)
            .with_policy(RetryPolicy::new(2, Duration::from_secs(2), MAX_BACKOFF)),
    );

    let retrying = {
        let client = Arc::clone(&client);
        thread::spawn(move || {
            let result = client.call("ping", Map::new(), CALL_TIMEOUT);
            (result, Instant::now())
        })
    };

    let deadline = Instant::now() + Duration::from_secs(5);
    while attempts.load(Ordering::SeqCst) == 0 {
        assert!(Instant::now() < deadline, "first attempt never started");
        thread::sleep(Duration::from_millis(5));
    }

    let quick = client
        .call("ping", Map::new(), CALL_TIMEOUT)
        .expect("call during backoff");
    let quick_done = Instant::now();

    let (slow, slow_done) = retrying.join().expect("retrying thread panicked");
    assert_eq!(quick, json!({"pong": true}));
    assert_eq!(slow.expect("retry succeeds"), json!({"pong": true}));
    assert!(quick_done < slow_done, "call waited for another caller's backoff");
    assert_eq!(bridge.finish().expect("bridge finished").len(), 2);
}

#[rstest]
fn slow_connects_do_not_hold_the_in_flight_lock() {
    let bridge = FakeBridge::spawn(vec![
        Scripted::Respond(json!({"pong": true})),
        Scripted::Respond(json!({"pong": true})),
    ])
    .expect("spawn bridge");
    let (connector, attempts) = SlowFirstConnector::new(Duration::from_millis(800));
    let client = Arc::new(Client::with_connector(&bridge.config(), connector));

    let connecting = {
        let client = Arc::clone(&client);
        thread::spawn(move || {
            let result = client.call("ping", Map::new(), CALL_TIMEOUT);
            (result, Instant::now())
        })
    };

    let deadline = Instant::now() + Duration::from_secs(5);
    while attempts.load(Ordering::SeqCst) == 0 {
        assert!(Instant::now() < deadline, "first connect never started");
        thread::sleep(Duration::from_millis(5));
    }

    let quick = client
        .call("ping", Map::new(), CALL_TIMEOUT)
        .expect("call during slow connect");
    let quick_done = Instant::now();

    let (slow, slow_done) = connecting.join().expect("connecting thread panicked");
    assert_eq!(quick, json!({"pong": true}));
    assert_eq!(slow.expect("slow connect succeeds"), json!({"pong": true}));
    assert!(quick_done < slow_done, "call waited for another caller's connect");
    assert_eq!(bridge.finish().expect("bridge finished").len(), 2);
}
