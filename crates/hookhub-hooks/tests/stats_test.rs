//! Integration tests for execution statistics.

mod helpers;

use std::time::Duration;

use hookhub_hooks::{EventPayload, HookRegistration};

#[tokio::test]
async fn test_totals_match_outcomes() {
    let system = helpers::system(helpers::options().with_default_timeout(Duration::from_millis(50)));
    system
        .register(HookRegistration::new("app_start", helpers::noop("ok")))
        .await
        .expect("register");
    system
        .register(HookRegistration::new("app_start", helpers::failing("bad", "nope")))
        .await
        .expect("register");
    system
        .register(HookRegistration::new("session_end", helpers::sleeping("slow", 1000)))
        .await
        .expect("register");

    let mut succeeded = 0;
    let mut failed = 0;
    for event in ["app_start", "app_start", "session_end"] {
        let report = system.emit(event, EventPayload::new()).await;
        succeeded += report.succeeded();
        failed += report.failed();
    }

    let stats = system.get_stats().await;
    assert_eq!(succeeded, 2);
    assert_eq!(failed, 3);
    assert_eq!(stats.total_executions, (succeeded + failed) as u64);
    assert_eq!(stats.total_errors, failed as u64);
    assert_eq!(stats.total_timeouts, 1);
    assert_eq!(stats.executions_by_event.get("app_start"), Some(&4));
    assert_eq!(stats.executions_by_event.get("session_end"), Some(&1));
    assert_eq!(
        stats.executions_by_event.values().sum::<u64>(),
        stats.total_executions
    );
}

#[tokio::test]
async fn test_empty_emit_does_not_count() {
    let system = helpers::system(helpers::options());
    system.emit("app_start", EventPayload::new()).await;

    let stats = system.get_stats().await;
    assert_eq!(stats.total_executions, 0);
    assert!(stats.executions_by_event.is_empty());
}

#[tokio::test]
async fn test_reset_keeps_registry_counts() {
    let system = helpers::system(helpers::options());
    system
        .register(HookRegistration::new("app_start", helpers::noop("ok")))
        .await
        .expect("register");
    system.emit("app_start", EventPayload::new()).await;

    system.reset_stats();

    let stats = system.get_stats().await;
    assert_eq!(stats.total_executions, 0);
    assert_eq!(stats.total_registered, 0);
    assert_eq!(stats.hook_count, 1);
    assert_eq!(stats.enabled_count, 1);
}
