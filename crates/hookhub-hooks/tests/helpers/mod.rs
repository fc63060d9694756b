//! Shared builders for hook-system integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hookhub_core::config::HookSystemOptions;
use hookhub_hooks::{FnHandler, HandlerError, HookHandler, HookSystem};

/// Options with manifest loading off and a short default timeout.
pub fn options() -> HookSystemOptions {
    HookSystemOptions {
        auto_load_config: false,
        ..HookSystemOptions::default()
    }
    .with_default_timeout(Duration::from_secs(2))
}

/// A fresh hook system built from `options`.
pub fn system(options: HookSystemOptions) -> Arc<HookSystem> {
    Arc::new(HookSystem::new(options).expect("valid options"))
}

/// Handler that succeeds without output.
pub fn noop(name: &str) -> Arc<dyn HookHandler> {
    FnHandler::arc(name, |_ctx| async { Ok(None) })
}

/// Handler that always fails with `message`.
pub fn failing(name: &str, message: &'static str) -> Arc<dyn HookHandler> {
    FnHandler::arc(name, move |_ctx| async move { Err(HandlerError::new(message)) })
}

/// Handler that sleeps for `ms` before succeeding.
pub fn sleeping(name: &str, ms: u64) -> Arc<dyn HookHandler> {
    FnHandler::arc(name, move |_ctx| async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(None)
    })
}

/// Records the order in which handlers start.
#[derive(Debug, Clone, Default)]
pub struct StartLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl StartLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler that appends `label` on start, then succeeds.
    pub fn handler(&self, label: &str) -> Arc<dyn HookHandler> {
        let entries = Arc::clone(&self.entries);
        let owned = label.to_string();
        FnHandler::arc(label, move |_ctx| {
            let entries = Arc::clone(&entries);
            let label = owned.clone();
            async move {
                entries.lock().expect("start log").push(label);
                Ok(None)
            }
        })
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().expect("start log").clone()
    }
}

/// Tracks how many of its invocations run at once.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyTracker {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl ConcurrencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler that holds its slot for `ms` milliseconds.
    pub fn handler(&self, ms: u64) -> Arc<dyn HookHandler> {
        let tracker = self.clone();
        FnHandler::arc("tracked", move |_ctx| {
            let tracker = tracker.clone();
            async move {
                let now = tracker.active.fetch_add(1, Ordering::SeqCst) + 1;
                tracker.peak.fetch_max(now, Ordering::SeqCst);
                tracker.calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                tracker.active.fetch_sub(1, Ordering::SeqCst);
                Ok(None)
            }
        })
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}
