// Integration tests for connection pool teardown
mod support;

use std::sync::Arc;
use support::{backend, pool_of, tool, FakeChannel};
use switchboard_core::ProxyError;

/// Every close is attempted even when one in the middle fails, and
/// teardown still reports success.
#[tokio::test]
async fn test_teardown_attempts_every_close() {
    let first = Arc::new(FakeChannel::new());
    let failing = Arc::new(FakeChannel::new().failing_close());
    let last = Arc::new(FakeChannel::new());

    let pool = pool_of(vec![
        backend("first", &first),
        backend("failing", &failing),
        backend("last", &last),
    ]);

    pool.shutdown().await.unwrap();

    assert!(first.is_closed());
    assert!(failing.is_closed());
    assert!(last.is_closed());
}

#[tokio::test]
async fn test_teardown_fails_only_when_every_close_fails() {
    let a = Arc::new(FakeChannel::new().failing_close());
    let b = Arc::new(FakeChannel::new().failing_close());

    let pool = pool_of(vec![backend("a", &a), backend("b", &b)]);

    let err = pool.shutdown().await.unwrap_err();
    assert!(matches!(err, ProxyError::Teardown(_)));
    assert!(a.is_closed());
    assert!(b.is_closed());
}

/// Shutdown is an exactly-once entry point: the second call is a no-op and
/// no connection sees a second close.
#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let a = Arc::new(FakeChannel::new().with_tools(vec![tool("t", "tool")]));
    let pool = pool_of(vec![backend("a", &a)]);

    pool.shutdown().await.unwrap();
    pool.shutdown().await.unwrap();

    assert_eq!(a.recorded_calls(), vec!["close"]);
    assert!(pool.is_closed());
}
