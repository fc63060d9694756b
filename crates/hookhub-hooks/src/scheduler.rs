//! Execution scheduler: admits the hooks of one emit against the global
//! concurrency limit and gathers their outcomes.
//!
//! - Hooks start in priority order, then registration order.
//! - Every invocation holds one limiter permit until its outcome settles.
//! - With `continue_on_error` set, failures never stop admission.
//! - Without it, admission is staged per priority tier: the next tier is
//!   admitted only once the current one settled without failures, and the
//!   first observed failure stops admission. In-flight hooks still settle.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, error, warn};

use hookhub_core::config::HookSystemOptions;
use hookhub_core::types::id::HookId;

use crate::definitions::{EmitReport, EventPayload, HookEvent, InvocationOutcome, OutcomeStatus};
use crate::registry::HookDefinition;
use crate::runner::InvocationRunner;
use crate::stats::StatsAggregator;

/// Process-wide invocation limiter that can be resized in place.
///
/// Permits handed out before a resize stay valid, so the number of running
/// invocations never exceeds the most recent capacity once the permits held
/// above it are returned.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: Mutex<usize>,
}

impl ConcurrencyLimiter {
    /// Creates a limiter with `capacity` permits.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity: Mutex::new(capacity),
        }
    }

    /// The configured number of permits.
    pub fn capacity(&self) -> usize {
        *self.capacity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for one permit.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        Arc::clone(&self.semaphore).acquire_owned().await
    }

    /// Changes the capacity.
    ///
    /// Growing takes effect immediately. Shrinking retires idle permits at
    /// once; permits still held are retired by a background waiter as they
    /// come back. The semaphore is fair, so that waiter is served before
    /// later admissions. Must be called within a Tokio runtime.
    pub fn resize(&self, capacity: usize) {
        let capacity = capacity.min(Semaphore::MAX_PERMITS);
        let mut current = self.capacity.lock().unwrap_or_else(PoisonError::into_inner);
        if capacity == *current {
            return;
        }

        if capacity > *current {
            self.semaphore.add_permits(capacity - *current);
        } else {
            let excess = *current - capacity;
            let outstanding = excess - self.semaphore.forget_permits(excess);
            if outstanding > 0 {
                let semaphore = Arc::clone(&self.semaphore);
                tokio::spawn(retire_permits(semaphore, outstanding));
            }
        }

        debug!(from = *current, to = capacity, "Invocation limiter resized");
        *current = capacity;
    }
}

/// Acquires and forgets `count` permits as they are released.
async fn retire_permits(semaphore: Arc<Semaphore>, mut count: usize) {
    while count > 0 {
        let chunk = u32::try_from(count).unwrap_or(u32::MAX);
        match Arc::clone(&semaphore).acquire_many_owned(chunk).await {
            Ok(permits) => permits.forget(),
            Err(_) => return,
        }
        count -= chunk as usize;
    }
}

/// Immutable dispatch settings plus the limiter they apply to.
///
/// An emit holds its snapshot for its whole lifetime, so replacing the
/// system's policy only affects emits that start afterwards. The limiter
/// itself is shared across policies.
#[derive(Debug)]
pub struct DispatchPolicy {
    /// The options this policy was built from.
    pub options: HookSystemOptions,
    /// Global invocation limiter shared by every emit.
    pub limiter: Arc<ConcurrencyLimiter>,
}

impl DispatchPolicy {
    /// Builds a policy with a fresh limiter sized by `max_concurrent`.
    pub fn new(options: HookSystemOptions) -> Self {
        let limiter = Arc::new(ConcurrencyLimiter::new(options.max_concurrent));
        Self { options, limiter }
    }

    /// Builds a policy on an existing limiter, resizing it to
    /// `max_concurrent`.
    pub fn with_limiter(options: HookSystemOptions, limiter: Arc<ConcurrencyLimiter>) -> Self {
        limiter.resize(options.max_concurrent);
        Self { options, limiter }
    }
}

/// Bookkeeping for an admitted invocation, kept outside its task.
struct Admitted {
    index: usize,
    hook_id: HookId,
    label: String,
    started_at: DateTime<Utc>,
    start: Instant,
}

/// What unblocked the admission loop.
enum Admission {
    /// A permit for the next hook.
    Permit(Result<OwnedSemaphorePermit, AcquireError>),
    /// A running invocation finished first.
    Settled(Result<(task::Id, InvocationOutcome), JoinError>),
}

/// Outcomes of one emit, collected as invocations settle.
struct Settlement<'a> {
    event: &'a HookEvent,
    stats: &'a StatsAggregator,
    admitted: HashMap<task::Id, Admitted>,
    outcomes: Vec<(usize, InvocationOutcome)>,
}

impl Settlement<'_> {
    /// Records a finished invocation exactly once. Returns `true` when it
    /// failed.
    fn settle(&mut self, joined: Result<(task::Id, InvocationOutcome), JoinError>) -> bool {
        let (id, outcome) = match joined {
            Ok((id, outcome)) => (id, Some(outcome)),
            Err(err) => {
                error!(event = %self.event, error = %err, "Invocation task did not complete");
                (err.id(), None)
            }
        };
        let Some(admitted) = self.admitted.remove(&id) else {
            error!(event = %self.event, task = %id, "Settled task was never admitted");
            return true;
        };

        let outcome = outcome.unwrap_or_else(|| InvocationOutcome {
            hook_id: admitted.hook_id,
            label: admitted.label,
            event: self.event.clone(),
            status: OutcomeStatus::Failed,
            duration: admitted.start.elapsed(),
            started_at: admitted.started_at,
            output: None,
            error: Some("invocation task did not complete".to_string()),
        });

        self.stats.record(&outcome);
        let failed = outcome.status.is_failure();
        self.outcomes.push((admitted.index, outcome));
        failed
    }
}

/// Schedules the invocations of single emits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionScheduler {
    runner: InvocationRunner,
}

impl ExecutionScheduler {
    /// Creates a scheduler.
    pub fn new(runner: InvocationRunner) -> Self {
        Self { runner }
    }

    /// Runs `hooks` (already in start order) for one emit and returns once
    /// every admitted invocation settled. Each outcome is recorded in
    /// `stats` exactly once.
    pub async fn dispatch(
        &self,
        event: &HookEvent,
        hooks: Vec<HookDefinition>,
        payload: Arc<EventPayload>,
        policy: Arc<DispatchPolicy>,
        stats: &StatsAggregator,
    ) -> EmitReport {
        let started = Instant::now();
        let stop_on_error = !policy.options.continue_on_error;
        let default_timeout = policy.options.default_timeout();

        debug!(
            event = %event,
            hook_count = hooks.len(),
            stop_on_error,
            "Dispatching event"
        );

        let mut queue: VecDeque<(usize, HookDefinition)> = hooks.into_iter().enumerate().collect();
        let mut running: JoinSet<InvocationOutcome> = JoinSet::new();
        let mut settlement = Settlement {
            event,
            stats,
            admitted: HashMap::with_capacity(queue.len()),
            outcomes: Vec::with_capacity(queue.len()),
        };
        let mut tier: Option<i32> = None;
        let mut halted = false;

        'admission: while let Some(priority) = queue.front().map(|(_, hook)| hook.priority) {
            if stop_on_error && tier.is_some_and(|current| current != priority) {
                // Tier barrier.
                while let Some(joined) = running.join_next_with_id().await {
                    halted |= settlement.settle(joined);
                }
                if halted {
                    break 'admission;
                }
            }
            tier = Some(priority);

            let admission = if stop_on_error {
                tokio::select! {
                    biased;
                    Some(joined) = running.join_next_with_id(), if !running.is_empty() => {
                        Admission::Settled(joined)
                    }
                    permit = policy.limiter.acquire() => Admission::Permit(permit),
                }
            } else {
                Admission::Permit(policy.limiter.acquire().await)
            };

            let permit = match admission {
                Admission::Settled(joined) => {
                    if settlement.settle(joined) {
                        halted = true;
                        break 'admission;
                    }
                    continue 'admission;
                }
                Admission::Permit(Ok(permit)) => permit,
                Admission::Permit(Err(_)) => {
                    error!(event = %event, "Invocation limiter closed, admission stopped");
                    break 'admission;
                }
            };

            let Some((index, hook)) = queue.pop_front() else {
                break 'admission;
            };

            debug!(
                event = %event,
                hook_id = %hook.id,
                label = %hook.label,
                priority = hook.priority,
                "Admitting hook"
            );

            let admitted = Admitted {
                index,
                hook_id: hook.id,
                label: hook.label.clone(),
                started_at: Utc::now(),
                start: Instant::now(),
            };
            let runner = self.runner;
            let task_event = event.clone();
            let payload = Arc::clone(&payload);
            let handle = running.spawn(async move {
                let outcome = runner.run(&hook, &task_event, payload, default_timeout).await;
                drop(permit);
                outcome
            });
            settlement.admitted.insert(handle.id(), admitted);
        }

        let skipped: Vec<_> = queue.into_iter().map(|(_, hook)| hook.id).collect();
        if !skipped.is_empty() {
            warn!(
                event = %event,
                skipped = skipped.len(),
                "Hook failure halted admission"
            );
        }

        while let Some(joined) = running.join_next_with_id().await {
            settlement.settle(joined);
        }

        let mut outcomes = settlement.outcomes;
        outcomes.sort_by_key(|(index, _)| *index);
        let report = EmitReport {
            event: event.clone(),
            outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
            skipped,
            halted,
            elapsed: started.elapsed(),
        };

        debug!(
            event = %event,
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped.len(),
            elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "Event dispatch settled"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::handler::{FnHandler, HandlerError, HookHandler};

    fn hook(label: &str, priority: i32, handler: Arc<dyn HookHandler>) -> HookDefinition {
        HookDefinition {
            id: HookId::new(),
            event: HookEvent::AppStart,
            handler,
            priority,
            enabled: true,
            timeout_override: None,
            label: label.to_string(),
        }
    }

    fn ok() -> Arc<dyn HookHandler> {
        FnHandler::arc("ok", |_ctx| async { Ok(None) })
    }

    fn failing() -> Arc<dyn HookHandler> {
        FnHandler::arc("fail", |_ctx| async { Err(HandlerError::new("nope")) })
    }

    fn policy(continue_on_error: bool, max_concurrent: usize) -> Arc<DispatchPolicy> {
        Arc::new(DispatchPolicy::new(
            HookSystemOptions::default()
                .with_continue_on_error(continue_on_error)
                .with_max_concurrent(max_concurrent)
                .with_default_timeout(Duration::from_secs(1)),
        ))
    }

    async fn dispatch(
        hooks: Vec<HookDefinition>,
        policy: Arc<DispatchPolicy>,
        stats: &StatsAggregator,
    ) -> EmitReport {
        ExecutionScheduler::default()
            .dispatch(
                &HookEvent::AppStart,
                hooks,
                Arc::new(EventPayload::new()),
                policy,
                stats,
            )
            .await
    }

    #[tokio::test]
    async fn test_continue_on_error_runs_everything() {
        let stats = StatsAggregator::new();
        let hooks = vec![hook("a", 1, ok()), hook("b", 2, failing()), hook("c", 3, ok())];

        let report = dispatch(hooks, policy(true, 2), &stats).await;

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.halted);
        assert!(report.skipped.is_empty());
        assert_eq!(stats.snapshot(0, 0).total_executions, 3);
    }

    #[tokio::test]
    async fn test_stop_on_error_skips_later_tiers() {
        let stats = StatsAggregator::new();
        let later = hook("later", 10, ok());
        let later_id = later.id;
        let hooks = vec![hook("first", 0, failing()), hook("peer", 0, ok()), later];

        let report = dispatch(hooks, policy(false, 4), &stats).await;

        assert!(report.halted);
        assert_eq!(report.skipped, vec![later_id]);
        assert!(report.outcome_for(later_id).is_none());
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(stats.snapshot(0, 0).total_errors, 1);
    }

    #[tokio::test]
    async fn test_stop_on_error_without_failures_runs_all_tiers() {
        let stats = StatsAggregator::new();
        let hooks = vec![hook("a", 0, ok()), hook("b", 5, ok()), hook("c", 9, ok())];

        let report = dispatch(hooks, policy(false, 1), &stats).await;

        assert!(report.is_success());
        let labels: Vec<_> = report.outcomes.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_outcomes_follow_admission_order() {
        let stats = StatsAggregator::new();
        let slow = FnHandler::arc("slow", |_ctx| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(None)
        });
        let hooks = vec![hook("slow", 1, slow), hook("fast", 2, ok())];

        let report = dispatch(hooks, policy(true, 2), &stats).await;

        let labels: Vec<_> = report.outcomes.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["slow", "fast"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_limit_bounds_in_flight_invocations() {
        let stats = StatsAggregator::new();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tracked = {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            FnHandler::arc("tracked", move |_ctx| {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(None)
                }
            })
        };
        let hooks = (0..8)
            .map(|i| hook(&format!("h{i}"), 0, Arc::clone(&tracked)))
            .collect();

        let report = dispatch(hooks, policy(true, 2), &stats).await;

        assert_eq!(report.succeeded(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_permits_return_after_timeouts() {
        let stats = StatsAggregator::new();
        let policy = policy(true, 1);
        let stuck = FnHandler::arc("stuck", |_ctx| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        });
        let mut slow = hook("stuck", 0, stuck);
        slow.timeout_override = Some(Duration::from_millis(10));

        let report = dispatch(vec![slow, hook("after", 1, ok())], Arc::clone(&policy), &stats).await;

        assert_eq!(report.outcomes[0].status, OutcomeStatus::TimedOut);
        assert_eq!(report.outcomes[1].status, OutcomeStatus::Succeeded);
        assert_eq!(policy.limiter.available(), 1);
    }

    #[tokio::test]
    async fn test_limiter_resizes_idle_permits() {
        let limiter = ConcurrencyLimiter::new(2);
        limiter.resize(5);
        assert_eq!(limiter.available(), 5);
        limiter.resize(1);
        assert_eq!(limiter.available(), 1);
        assert_eq!(limiter.capacity(), 1);
    }

    #[tokio::test]
    async fn test_limiter_shrink_retires_held_permits_on_release() {
        let limiter = ConcurrencyLimiter::new(3);
        let mut held = Vec::new();
        for _ in 0..3 {
            held.push(limiter.acquire().await.expect("permit"));
        }

        limiter.resize(1);
        assert_eq!(limiter.available(), 0);

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), async {
            while limiter.available() != 1 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("retired in time");

        let only = limiter.acquire().await.expect("permit");
        assert_eq!(limiter.available(), 0);
        drop(only);
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn test_policies_share_one_limiter() {
        let first = policy(true, 2);
        let second = DispatchPolicy::with_limiter(
            first.options.clone().with_default_timeout(Duration::from_secs(5)),
            Arc::clone(&first.limiter),
        );

        let _permit = first.limiter.acquire().await.expect("permit");
        assert_eq!(second.limiter.available(), 1);
    }

    #[tokio::test]
    async fn test_failed_task_is_recorded_as_failure() {
        let stats = StatsAggregator::new();
        let event = HookEvent::AppStart;
        let hook_id = HookId::new();
        let mut running: JoinSet<InvocationOutcome> = JoinSet::new();
        let handle = running.spawn(async { panic!("task died") });

        let mut settlement = Settlement {
            event: &event,
            stats: &stats,
            admitted: HashMap::new(),
            outcomes: Vec::new(),
        };
        settlement.admitted.insert(
            handle.id(),
            Admitted {
                index: 0,
                hook_id,
                label: "doomed".to_string(),
                started_at: Utc::now(),
                start: Instant::now(),
            },
        );

        let joined = running.join_next_with_id().await.expect("one task");
        assert!(settlement.settle(joined));

        assert_eq!(settlement.outcomes.len(), 1);
        let (index, outcome) = &settlement.outcomes[0];
        assert_eq!(*index, 0);
        assert_eq!(outcome.hook_id, hook_id);
        assert_eq!(outcome.status, OutcomeStatus::Failed);
        let snapshot = stats.snapshot(0, 0);
        assert_eq!(snapshot.total_executions, 1);
        assert_eq!(snapshot.total_errors, 1);
    }
}
