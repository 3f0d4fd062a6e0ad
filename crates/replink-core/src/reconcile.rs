//! Persisted-flag reconciliation.
//!
//! The link tolerates rows vanishing underneath it: users can delete local
//! rows through their own tooling, and a partial commit can leave one host
//! ahead of the other. Reconciliation repairs both before the state
//! machine runs, in three idempotent steps:
//!
//! 1. drop flags whose local target vanished (outbound and local mirrors),
//! 2. drop hand-out rows the state machine no longer accounts for,
//! 3. copy outbound flags into the local flag set where missing.
//!
//! "Vanished" is witnessed by the local inbound mirror: only the state
//! machine removes inbound rows, so an inbound row without its local row
//! marks an out-of-band deletion. Deprecated entities keep their outbound
//! row and flag and are never touched here.
//!
//! Step 2 also covers the partial-commit asymmetry: local rows the source
//! side never acknowledged are dropped so both hosts agree again.

use crate::{
    error::LinkError,
    gateway::{LinkGateway, UnitOfWork},
    model::{Component, LinkSnapshot},
    obs::sink::{self, LinkMetricsEvent},
    types::Identifier,
};
use std::collections::BTreeSet;

///
/// ReconcilePlan
/// Pure diff of one snapshot into the repair steps the gateway applies.
///
/// Field order is the apply order: flag rows reference their hand-out
/// rows, so flags drop first; local flag inserts run last.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReconcilePlan {
    pub remove_local_flags: BTreeSet<Identifier>,
    pub remove_outbound_flags: BTreeSet<Identifier>,
    pub remove_local_rows: BTreeSet<Identifier>,
    pub remove_local_inbound: BTreeSet<Identifier>,
    pub remove_outbound_rows: BTreeSet<Identifier>,
    pub add_local_flags: BTreeSet<Identifier>,
}

impl ReconcilePlan {
    #[must_use]
    pub fn for_snapshot(snapshot: &LinkSnapshot) -> Self {
        let assignments = snapshot.assignments();
        let local = assignments.component(Component::Local);
        let outbound = assignments.component(Component::Outbound);
        let processes = snapshot.active_processes();

        // Out-of-band deletions: inbound rows whose local row is gone and
        // that no in-flight process will account for.
        let stale: BTreeSet<Identifier> = snapshot
            .local_inbound()
            .difference(local)
            .filter(|identifier| !processes.contains_key(*identifier))
            .cloned()
            .collect();

        // Partial-commit asymmetry: the local side committed rows the
        // source side never acknowledged. The source never handed them
        // out, so they go.
        let local_ahead: BTreeSet<Identifier> =
            local.difference(outbound).cloned().collect();

        // Step 1: flags with nothing to act on. Orphaned outbound flag
        // rows (master row gone) are collected here as well.
        let remove_local_flags: BTreeSet<Identifier> = snapshot
            .local_flagged()
            .iter()
            .filter(|identifier| {
                !local.contains(*identifier) || local_ahead.contains(*identifier)
            })
            .cloned()
            .collect();
        let remove_outbound_flags: BTreeSet<Identifier> = snapshot
            .outbound_flagged()
            .iter()
            .filter(|identifier| {
                stale.contains(*identifier) || !outbound.contains(*identifier)
            })
            .cloned()
            .collect();

        // Step 2: rows the state machine no longer accounts for. Unflagged
        // hand-outs with no local copy and no process are unaccounted for
        // outright; flagged stale rows lose flag and row in the same pass.
        // Deprecated rows (flagged, no inbound witness) stay.
        let mut remove_outbound_rows: BTreeSet<Identifier> = outbound
            .iter()
            .filter(|identifier| {
                !local.contains(*identifier)
                    && !processes.contains_key(*identifier)
                    && !snapshot.outbound_flagged().contains(*identifier)
            })
            .cloned()
            .collect();
        remove_outbound_rows.extend(stale.intersection(outbound).cloned());
        let remove_local_rows = local_ahead.clone();
        let mut remove_local_inbound = stale;
        remove_local_inbound.extend(
            snapshot
                .local_inbound()
                .intersection(&local_ahead)
                .cloned(),
        );

        // Step 3: propagate operator flags to locals that hold the entity.
        let add_local_flags: BTreeSet<Identifier> = snapshot
            .outbound_flagged()
            .intersection(local)
            .filter(|identifier| !snapshot.local_flagged().contains(*identifier))
            .cloned()
            .collect();

        Self {
            remove_local_flags,
            remove_outbound_flags,
            remove_local_rows,
            remove_local_inbound,
            remove_outbound_rows,
            add_local_flags,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remove_local_flags.is_empty()
            && self.remove_outbound_flags.is_empty()
            && self.remove_local_rows.is_empty()
            && self.remove_local_inbound.is_empty()
            && self.remove_outbound_rows.is_empty()
            && self.add_local_flags.is_empty()
    }

    #[must_use]
    pub fn removed_flag_count(&self) -> usize {
        self.remove_local_flags.len() + self.remove_outbound_flags.len()
    }

    #[must_use]
    pub fn removed_row_count(&self) -> usize {
        self.remove_local_rows.len() + self.remove_local_inbound.len() + self.remove_outbound_rows.len()
    }

    #[must_use]
    pub fn added_flag_count(&self) -> usize {
        self.add_local_flags.len()
    }
}

/// Plan against the current snapshot and apply inside the unit of work.
pub(crate) fn run<G: LinkGateway>(
    uow: &mut UnitOfWork<'_, G>,
) -> Result<ReconcilePlan, LinkError> {
    let snapshot = uow.snapshot()?;
    let plan = ReconcilePlan::for_snapshot(&snapshot);
    if !plan.is_empty() {
        tracing::debug!(
            removed_flags = plan.removed_flag_count(),
            removed_rows = plan.removed_row_count(),
            added_flags = plan.added_flag_count(),
            "applying reconciliation plan"
        );
        uow.reconcile(&plan)?;
        sink::record(LinkMetricsEvent::ReconcileApplied {
            removed_flags: plan.removed_flag_count() as u64,
            removed_rows: plan.removed_row_count() as u64,
            added_flags: plan.added_flag_count() as u64,
        });
    }
    Ok(plan)
}
