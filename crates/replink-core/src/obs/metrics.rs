//! Runtime metrics are update-only by contract.
//!
//! Counters accumulate per thread; the session's sink override is the only
//! other route instrumentation can take. Reports are snapshots, never live
//! references.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

thread_local! {
    static STATE: RefCell<OperationReport> = RefCell::new(OperationReport::default());
}

///
/// OperationReport
/// Snapshot of the accumulated runtime counters.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OperationReport {
    pub ops: OperationCounters,
    pub repair: RepairCounters,
}

///
/// OperationCounters
///

/// Call counters are invocation attempts; failed invocations still count.
/// Round and command counters reflect applied batches only.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OperationCounters {
    // Use-case entrypoints
    pub pull_calls: u64,
    pub delete_calls: u64,
    pub process_calls: u64,
    pub list_idle_calls: u64,

    // Drain loop
    pub rounds_total: u64,
    pub commands_applied: u64,

    // Outcomes
    pub operation_errors: u64,
    pub rollbacks: u64,
    pub partial_commits: u64,
}

///
/// RepairCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RepairCounters {
    pub passes: u64,
    pub removed_flags: u64,
    pub removed_rows: u64,
    pub added_flags: u64,
}

pub(crate) fn with_state_mut<T>(f: impl FnOnce(&mut OperationReport) -> T) -> T {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

#[must_use]
pub(crate) fn report() -> OperationReport {
    STATE.with(|state| state.borrow().clone())
}

pub(crate) fn reset_all() {
    STATE.with(|state| *state.borrow_mut() = OperationReport::default());
}
