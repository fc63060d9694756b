//! # hookhub-hooks
//!
//! In-process hook system for HookHub. Provides:
//!
//! - Hook registry with priority-ordered registration
//! - Execution scheduler with a global concurrency limit and
//!   continue-on-error / stop-on-error admission
//! - Invocation runner with per-hook timeouts and panic containment
//! - Execution statistics
//! - Handler catalog for declarative hook specs
//! - JSON control surface answering with response envelopes

pub mod catalog;
pub mod control;
pub mod definitions;
pub mod error;
pub mod handler;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod stats;
pub mod system;

pub use catalog::HandlerCatalog;
pub use control::{ControlRequest, HookControl};
pub use definitions::{EmitReport, EventPayload, HookEvent, InvocationOutcome, OutcomeStatus};
pub use error::HookError;
pub use handler::{FnHandler, HandlerError, HandlerResult, HookContext, HookHandler};
pub use registry::{HookDefinition, HookRegistration, HookRegistry, HookSummary};
pub use runner::InvocationRunner;
pub use scheduler::{ConcurrencyLimiter, DispatchPolicy, ExecutionScheduler};
pub use stats::{HookStats, StatsAggregator};
pub use system::HookSystem;
