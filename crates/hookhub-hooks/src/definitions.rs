//! Event names, payloads, and invocation outcome records.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hookhub_core::types::id::HookId;

/// Lifecycle events hooks can subscribe to.
///
/// The well-known events have dedicated variants; anything else is carried
/// as [`HookEvent::Custom`]. Equality and hashing go through
/// [`HookEvent::as_str`], so `Custom("app_start")` and `AppStart` are the
/// same event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HookEvent {
    // ── Application ──
    /// The application finished starting.
    AppStart,
    /// The application is about to exit.
    AppShutdown,
    /// Configuration was reloaded or changed.
    ConfigChange,

    // ── Windows ──
    /// A window was created.
    WindowCreated,
    /// A window was closed.
    WindowClosed,

    // ── Sessions ──
    /// A user session started.
    SessionStart,
    /// A user session ended.
    SessionEnd,

    // ── Conversation ──
    /// Fired before a message is sent.
    BeforeMessage,
    /// Fired after a message was sent.
    AfterMessage,
    /// Fired before a tool call is executed.
    BeforeToolCall,
    /// Fired after a tool call finished.
    AfterToolCall,

    /// Any other event name.
    Custom(String),
}

impl HookEvent {
    /// Returns the string name of this event.
    pub fn as_str(&self) -> &str {
        match self {
            Self::AppStart => "app_start",
            Self::AppShutdown => "app_shutdown",
            Self::ConfigChange => "config_change",
            Self::WindowCreated => "window_created",
            Self::WindowClosed => "window_closed",
            Self::SessionStart => "session_start",
            Self::SessionEnd => "session_end",
            Self::BeforeMessage => "before_message",
            Self::AfterMessage => "after_message",
            Self::BeforeToolCall => "before_tool_call",
            Self::AfterToolCall => "after_tool_call",
            Self::Custom(name) => name,
        }
    }

    /// Parses an event name, mapping well-known names to their variants.
    pub fn parse(name: &str) -> Self {
        match name {
            "app_start" => Self::AppStart,
            "app_shutdown" => Self::AppShutdown,
            "config_change" => Self::ConfigChange,
            "window_created" => Self::WindowCreated,
            "window_closed" => Self::WindowClosed,
            "session_start" => Self::SessionStart,
            "session_end" => Self::SessionEnd,
            "before_message" => Self::BeforeMessage,
            "after_message" => Self::AfterMessage,
            "before_tool_call" => Self::BeforeToolCall,
            "after_tool_call" => Self::AfterToolCall,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl PartialEq for HookEvent {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for HookEvent {}

impl Hash for HookEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for HookEvent {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for HookEvent {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<HookEvent> for String {
    fn from(event: HookEvent) -> Self {
        match event {
            HookEvent::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

/// Data handed unchanged to every hook of one emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    /// Arbitrary data keyed by string.
    pub data: HashMap<String, serde_json::Value>,
    /// Component that emitted the event, if known.
    pub source: Option<String>,
    /// When the payload was created.
    pub emitted_at: DateTime<Utc>,
}

impl EventPayload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            source: None,
            emitted_at: Utc::now(),
        }
    }

    /// Builds a payload from a JSON value. Objects become the data map;
    /// any other non-null value is stored under `"value"`.
    pub fn from_json(value: serde_json::Value) -> Self {
        let mut payload = Self::new();
        match value {
            serde_json::Value::Object(map) => payload.data.extend(map),
            serde_json::Value::Null => {}
            other => {
                payload.data.insert("value".to_string(), other);
            }
        }
        payload
    }

    /// Returns the data map as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Sets the emitting component.
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// Inserts a data value.
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    /// Inserts a string value.
    pub fn with_string(self, key: &str, value: &str) -> Self {
        self.with_data(key, serde_json::json!(value))
    }

    /// Inserts an integer value.
    pub fn with_int(self, key: &str, value: i64) -> Self {
        self.with_data(key, serde_json::json!(value))
    }

    /// Inserts a boolean value.
    pub fn with_bool(self, key: &str, value: bool) -> Self {
        self.with_data(key, serde_json::json!(value))
    }

    /// Gets a data value by key.
    pub fn get_data(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Gets a string data value.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    /// Gets an i64 data value.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(|v| v.as_i64())
    }

    /// Gets a bool data value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(|v| v.as_bool())
    }
}

impl Default for EventPayload {
    fn default() -> Self {
        Self::new()
    }
}

/// Classification of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The handler returned successfully within its deadline.
    Succeeded,
    /// The handler returned an error or panicked.
    Failed,
    /// The deadline elapsed first.
    TimedOut,
}

impl OutcomeStatus {
    /// Whether this status counts as an error.
    pub fn is_failure(self) -> bool {
        !matches!(self, Self::Succeeded)
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

/// Result record for one hook invocation.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationOutcome {
    /// The hook that ran.
    pub hook_id: HookId,
    /// The hook's display label.
    pub label: String,
    /// The event it ran for.
    pub event: HookEvent,
    /// How it ended.
    pub status: OutcomeStatus,
    /// Wall time from start until the outcome was settled.
    #[serde(rename = "duration_ms", serialize_with = "serialize_duration_ms")]
    pub duration: Duration,
    /// When the handler was started.
    pub started_at: DateTime<Utc>,
    /// Handler output on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// Failure detail for failed or timed-out invocations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate result of one emit.
#[derive(Debug, Clone, Serialize)]
pub struct EmitReport {
    /// The emitted event.
    pub event: HookEvent,
    /// One outcome per admitted hook, in admission order.
    pub outcomes: Vec<InvocationOutcome>,
    /// Hooks never admitted because admission halted.
    pub skipped: Vec<HookId>,
    /// Whether a failure halted admission (continue-on-error disabled).
    pub halted: bool,
    /// Time from scheduling until every admitted invocation settled.
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_duration_ms")]
    pub elapsed: Duration,
}

impl EmitReport {
    /// A report for an emit that had nothing to run.
    pub fn empty(event: HookEvent) -> Self {
        Self {
            event,
            outcomes: Vec::new(),
            skipped: Vec::new(),
            halted: false,
            elapsed: Duration::ZERO,
        }
    }

    /// Number of succeeded invocations.
    pub fn succeeded(&self) -> usize {
        self.count(OutcomeStatus::Succeeded)
    }

    /// Number of failed invocations (timeouts included).
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status.is_failure())
            .count()
    }

    /// Number of timed-out invocations.
    pub fn timed_out(&self) -> usize {
        self.count(OutcomeStatus::TimedOut)
    }

    /// True when every admitted hook succeeded and none were skipped.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.skipped.is_empty()
    }

    /// Outcome for a given hook, if it was admitted.
    pub fn outcome_for(&self, hook_id: HookId) -> Option<&InvocationOutcome> {
        self.outcomes.iter().find(|o| o.hook_id == hook_id)
    }

    fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// Serialize a Duration as whole milliseconds.
fn serialize_duration_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_parse_to_variants() {
        assert!(matches!(HookEvent::parse("app_start"), HookEvent::AppStart));
        assert!(matches!(
            HookEvent::parse("memory_saved"),
            HookEvent::Custom(ref n) if n == "memory_saved"
        ));
    }

    #[test]
    fn test_custom_alias_equals_variant() {
        let custom = HookEvent::Custom("session_end".to_string());
        assert_eq!(custom, HookEvent::SessionEnd);

        let mut map = HashMap::new();
        map.insert(HookEvent::SessionEnd, 1);
        assert_eq!(map.get(&custom), Some(&1));
    }

    #[test]
    fn test_event_serializes_as_string() {
        let json = serde_json::to_string(&HookEvent::BeforeToolCall).expect("serialize");
        assert_eq!(json, "\"before_tool_call\"");
        let back: HookEvent = serde_json::from_str("\"browser_navigate\"").expect("deserialize");
        assert_eq!(back.as_str(), "browser_navigate");
    }

    #[test]
    fn test_payload_from_json() {
        let payload = EventPayload::from_json(serde_json::json!({"user": "ana", "count": 3}));
        assert_eq!(payload.get_string("user"), Some("ana"));
        assert_eq!(payload.get_i64("count"), Some(3));

        let scalar = EventPayload::from_json(serde_json::json!(true));
        assert_eq!(scalar.get_bool("value"), Some(true));

        assert!(EventPayload::from_json(serde_json::Value::Null).data.is_empty());
    }

    #[test]
    fn test_status_failure_classification() {
        assert!(!OutcomeStatus::Succeeded.is_failure());
        assert!(OutcomeStatus::Failed.is_failure());
        assert!(OutcomeStatus::TimedOut.is_failure());
    }
}
