//! Stats aggregator: process-wide counters fed by invocation outcomes.
//!
//! Counters share one mutex so a snapshot never observes half of an
//! outcome's increments.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::definitions::{InvocationOutcome, OutcomeStatus};

#[derive(Debug, Default)]
struct Counters {
    total_registered: u64,
    total_executions: u64,
    total_errors: u64,
    total_timeouts: u64,
    executions_by_event: BTreeMap<String, u64>,
}

/// Accumulates hook statistics.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    counters: Mutex<Counters>,
}

impl StatsAggregator {
    /// Create a zeroed aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a successful registration.
    pub fn record_registration(&self) {
        self.lock().total_registered += 1;
    }

    /// Record one invocation outcome. Call exactly once per outcome.
    pub fn record(&self, outcome: &InvocationOutcome) {
        let mut counters = self.lock();
        counters.total_executions += 1;
        *counters
            .executions_by_event
            .entry(outcome.event.to_string())
            .or_insert(0) += 1;

        if outcome.status.is_failure() {
            counters.total_errors += 1;
        }
        if outcome.status == OutcomeStatus::TimedOut {
            counters.total_timeouts += 1;
        }
    }

    /// Snapshot the counters, combined with live registry counts.
    pub fn snapshot(&self, hook_count: usize, enabled_count: usize) -> HookStats {
        let counters = self.lock();
        HookStats {
            total_registered: counters.total_registered,
            total_executions: counters.total_executions,
            total_errors: counters.total_errors,
            total_timeouts: counters.total_timeouts,
            executions_by_event: counters.executions_by_event.clone(),
            hook_count,
            enabled_count,
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        *self.lock() = Counters::default();
    }
}

/// Point-in-time hook statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookStats {
    /// Successful registrations since construction or last reset.
    pub total_registered: u64,
    /// Invocations that settled.
    pub total_executions: u64,
    /// Invocations that failed or timed out.
    pub total_errors: u64,
    /// Invocations that timed out (included in `total_errors`).
    pub total_timeouts: u64,
    /// Invocations per event name.
    pub executions_by_event: BTreeMap<String, u64>,
    /// Hooks currently registered.
    pub hook_count: usize,
    /// Hooks currently registered and enabled.
    pub enabled_count: usize,
}
