//! Integration tests for the JSON control surface and manifest loading.

mod helpers;

use std::sync::Arc;

use hookhub_core::config::{HookManifest, HookSpec};
use hookhub_hooks::{
    EventPayload, FnHandler, HandlerCatalog, HandlerError, HookControl, HookError, HookEvent,
};

fn catalog() -> HandlerCatalog {
    let mut catalog = HandlerCatalog::new();
    catalog
        .register_handler("noop", helpers::noop("noop"))
        .register("tag", |params| {
            let tag = params
                .get("tag")
                .and_then(|v| v.as_str())
                .ok_or_else(|| HookError::invalid_spec("'tag' must be a string"))?
                .to_string();
            Ok(FnHandler::arc("tag", move |_ctx| {
                let tag = tag.clone();
                async move { Ok(Some(serde_json::json!(tag))) }
            }))
        })
        .register("reject", |_params| {
            Ok(FnHandler::arc("reject", |_ctx| async {
                Err(HandlerError::new("rejected"))
            }))
        });
    catalog
}

fn control() -> HookControl {
    HookControl::new(helpers::system(helpers::options()), Arc::new(catalog()))
}

#[tokio::test]
async fn test_full_request_cycle() {
    let control = control();

    let registered = control
        .handle_json(r#"{"op":"register","spec":{"event":"app_start","handler":"tag","params":{"tag":"hello"}}}"#)
        .await;
    assert!(registered.success, "{registered:?}");
    let id = registered.data.expect("data")["id"]
        .as_str()
        .expect("id string")
        .to_string();

    let emitted = control
        .handle_json(r#"{"op":"emit","event":"app_start"}"#)
        .await;
    let report = emitted.data.expect("report");
    assert_eq!(report["outcomes"][0]["status"], "succeeded");
    assert_eq!(report["outcomes"][0]["output"], "hello");

    let disabled = control
        .handle_json(&format!(r#"{{"op":"set_enabled","id":"{id}","enabled":false}}"#))
        .await;
    assert!(disabled.success);

    let stats = control.handle_json(r#"{"op":"get_stats"}"#).await;
    let stats = stats.data.expect("stats");
    assert_eq!(stats["hook_count"], 1);
    assert_eq!(stats["enabled_count"], 0);
    assert_eq!(stats["total_executions"], 1);

    let reset = control.handle_json(r#"{"op":"reset_stats"}"#).await;
    assert!(reset.success);

    let removed = control
        .handle_json(&format!(r#"{{"op":"unregister","id":"{id}"}}"#))
        .await;
    assert!(removed.success);

    let again = control
        .handle_json(&format!(r#"{{"op":"unregister","id":"{id}"}}"#))
        .await;
    assert!(!again.success);
    assert_eq!(again.error.as_deref(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn test_error_codes() {
    let control = control();

    let bad_params = control
        .handle_json(r#"{"op":"register","spec":{"event":"app_start","handler":"tag"}}"#)
        .await;
    assert_eq!(bad_params.error.as_deref(), Some("INVALID_SPEC"));

    let unknown = control
        .handle_json(r#"{"op":"register","spec":{"event":"app_start","handler":"ghost"}}"#)
        .await;
    assert_eq!(unknown.error.as_deref(), Some("UNKNOWN_HANDLER"));

    let duplicate_id = "0190a5c4-1111-7000-8000-000000000000";
    let first = control
        .handle_json(&format!(
            r#"{{"op":"register","spec":{{"id":"{duplicate_id}","event":"app_start","handler":"noop"}}}}"#
        ))
        .await;
    assert!(first.success);
    let second = control
        .handle_json(&format!(
            r#"{{"op":"register","spec":{{"id":"{duplicate_id}","event":"app_start","handler":"noop"}}}}"#
        ))
        .await;
    assert_eq!(second.error.as_deref(), Some("DUPLICATE_HANDLER"));

    let options = control
        .handle_json(r#"{"op":"configure","options":{"default_timeout_ms":0}}"#)
        .await;
    assert_eq!(options.error.as_deref(), Some("INVALID_OPTIONS"));
}

#[tokio::test]
async fn test_handler_failure_is_not_a_request_failure() {
    let control = control();
    control
        .handle_json(r#"{"op":"register","spec":{"event":"after_message","handler":"reject"}}"#)
        .await;

    let response = control
        .handle_json(r#"{"op":"emit","event":"after_message","payload":{"text":"hi"}}"#)
        .await;

    assert!(response.success);
    let report = response.data.expect("report");
    assert_eq!(report["outcomes"][0]["status"], "failed");
    assert_eq!(report["outcomes"][0]["error"], "rejected");
}

#[tokio::test]
async fn test_manifest_specs_load_through_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("hooks.toml");
    std::fs::write(
        &path,
        r#"
[[hooks]]
event = "session_start"
handler = "tag"
priority = 5
label = "greeter"
params = { tag = "welcome" }

[[hooks]]
event = "session_start"
handler = "noop"
priority = 1
enabled = false
timeout_ms = 250
"#,
    )
    .expect("write manifest");

    let specs: Vec<HookSpec> = HookManifest::load(&path).expect("manifest").hooks;
    let system = helpers::system(helpers::options());
    let ids = system
        .load_specs(&catalog(), &specs)
        .await
        .expect("load specs");
    assert_eq!(ids.len(), 2);

    let listed = system.list(Some(&HookEvent::SessionStart)).await;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].priority, 1);
    assert!(!listed[0].enabled);
    assert_eq!(listed[0].timeout_override.map(|t| t.as_millis()), Some(250));
    assert_eq!(listed[1].label, "greeter");

    let report = system.emit("session_start", EventPayload::new()).await;
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].output, Some(serde_json::json!("welcome")));
}

#[tokio::test]
async fn test_load_specs_stops_at_first_bad_spec() {
    let system = helpers::system(helpers::options());
    let specs = vec![
        HookSpec::new("app_start", "noop"),
        HookSpec::new("app_start", "ghost"),
        HookSpec::new("app_start", "noop"),
    ];

    let err = system
        .load_specs(&catalog(), &specs)
        .await
        .expect_err("unknown handler");

    assert_eq!(
        err,
        HookError::UnknownHandler {
            name: "ghost".to_string()
        }
    );
    assert_eq!(system.get_stats().await.hook_count, 1);
}
