//! Metrics sink boundary.
//!
//! Runtime logic MUST NOT depend on `obs::metrics` directly.
//! All instrumentation flows through `LinkMetricsEvent` and `MetricsSink`.
//!
//! This module is the only allowed bridge between use-case execution and
//! the global metrics state.

use crate::obs::metrics;
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = const { RefCell::new(None) };
}

///
/// OperationKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperationKind {
    Pull,
    Delete,
    Process,
    ListIdle,
}

///
/// LinkMetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum LinkMetricsEvent {
    OperationStarted {
        kind: OperationKind,
        requested: u64,
    },
    OperationFinished {
        kind: OperationKind,
        rounds: u64,
        commands: u64,
        errors: u64,
    },
    BatchApplied {
        commands: u64,
    },
    ReconcileApplied {
        removed_flags: u64,
        removed_rows: u64,
        added_flags: u64,
    },
    RolledBack,
    PartialCommit,
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: LinkMetricsEvent);
}

///
/// NoopMetricsSink
///

pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _: LinkMetricsEvent) {}
}

///
/// GlobalMetricsSink
///

pub struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: LinkMetricsEvent) {
        match event {
            LinkMetricsEvent::OperationStarted { kind, .. } => {
                metrics::with_state_mut(|m| match kind {
                    OperationKind::Pull => m.ops.pull_calls = m.ops.pull_calls.saturating_add(1),
                    OperationKind::Delete => {
                        m.ops.delete_calls = m.ops.delete_calls.saturating_add(1);
                    }
                    OperationKind::Process => {
                        m.ops.process_calls = m.ops.process_calls.saturating_add(1);
                    }
                    OperationKind::ListIdle => {
                        m.ops.list_idle_calls = m.ops.list_idle_calls.saturating_add(1);
                    }
                });
            }

            LinkMetricsEvent::OperationFinished { rounds, commands, errors, .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.rounds_total = m.ops.rounds_total.saturating_add(rounds);
                    m.ops.commands_applied = m.ops.commands_applied.saturating_add(commands);
                    m.ops.operation_errors = m.ops.operation_errors.saturating_add(errors);
                });
            }

            LinkMetricsEvent::BatchApplied { .. } => {
                // Per-batch command counts are aggregated at OperationFinished.
            }

            LinkMetricsEvent::ReconcileApplied {
                removed_flags,
                removed_rows,
                added_flags,
            } => {
                metrics::with_state_mut(|m| {
                    m.repair.passes = m.repair.passes.saturating_add(1);
                    m.repair.removed_flags = m.repair.removed_flags.saturating_add(removed_flags);
                    m.repair.removed_rows = m.repair.removed_rows.saturating_add(removed_rows);
                    m.repair.added_flags = m.repair.added_flags.saturating_add(added_flags);
                });
            }

            LinkMetricsEvent::RolledBack => {
                metrics::with_state_mut(|m| {
                    m.ops.rollbacks = m.ops.rollbacks.saturating_add(1);
                });
            }

            LinkMetricsEvent::PartialCommit => {
                metrics::with_state_mut(|m| {
                    m.ops.partial_commits = m.ops.partial_commits.saturating_add(1);
                });
            }
        }
    }
}

pub const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub fn record(event: LinkMetricsEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY: override is scoped by with_metrics_sink and only used synchronously.
        unsafe { (*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current metrics state for endpoint/test plumbing.
#[must_use]
pub fn metrics_report() -> metrics::OperationReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY: we erase the reference lifetime for scoped storage in TLS and
    // restore the previous value on scope exit via Guard.
    let sink_ptr =
        unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| {
        let mut slot = cell.borrow_mut();
        slot.replace(sink_ptr)
    });
    let _guard = Guard(prev);

    f()
}
