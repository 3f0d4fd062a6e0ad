//! Use-case drivers: transactional fixed-point loops over one gateway.
//!
//! Every driver opens a unit of work, recomputes the link from a fresh
//! snapshot after each applied batch, and stops at quiescence. Refusals
//! are collected into the response event; only gateway and transaction
//! failures abort (and roll back) the invocation.

use crate::{
    error::{ErrorClass, ErrorOrigin, LinkError},
    event::{
        EntitiesDeleted, EntitiesProcessed, EntitiesPulled, IdleEntitiesListed, LinkEvent,
        OperationError,
    },
    gateway::{LinkGateway, UnitOfWork},
    model::{Entity, Operation, State, UpdateBatch},
    obs::sink::{self, LinkMetricsEvent, OperationKind},
    reconcile::{self, ReconcilePlan},
    service::ops,
    types::Identifier,
};
use std::collections::BTreeSet;

///
/// DrainStats
/// Applied-work counters for one drain loop.
///

#[derive(Clone, Copy, Debug, Default)]
struct DrainStats {
    rounds: u64,
    commands: u64,
}

pub(crate) fn pull<G: LinkGateway>(
    gateway: &mut G,
    requested: BTreeSet<Identifier>,
) -> Result<(EntitiesPulled, Vec<LinkEvent>), LinkError> {
    started(OperationKind::Pull, requested.len());
    observed(OperationKind::Pull, pull_inner(gateway, requested))
}

fn pull_inner<G: LinkGateway>(
    gateway: &mut G,
    requested: BTreeSet<Identifier>,
) -> Result<(EntitiesPulled, Vec<LinkEvent>), LinkError> {
    let mut uow = UnitOfWork::begin(gateway)?;
    reconcile::run(&mut uow)?;
    let (errors, stats) = operation_drain(&mut uow, Operation::StartPull, &requested)?;
    let response = EntitiesPulled { requested, errors };
    uow.record(LinkEvent::EntitiesPulled(response.clone()));
    let events = uow.commit()?;
    finish(OperationKind::Pull, stats, response.errors.len());
    Ok((response, events))
}

pub(crate) fn delete<G: LinkGateway>(
    gateway: &mut G,
    requested: BTreeSet<Identifier>,
) -> Result<(EntitiesDeleted, Vec<LinkEvent>), LinkError> {
    started(OperationKind::Delete, requested.len());
    observed(OperationKind::Delete, delete_inner(gateway, requested))
}

fn delete_inner<G: LinkGateway>(
    gateway: &mut G,
    requested: BTreeSet<Identifier>,
) -> Result<(EntitiesDeleted, Vec<LinkEvent>), LinkError> {
    let mut uow = UnitOfWork::begin(gateway)?;
    reconcile::run(&mut uow)?;
    let (errors, stats) = operation_drain(&mut uow, Operation::StartDelete, &requested)?;
    let response = EntitiesDeleted { requested, errors };
    uow.record(LinkEvent::EntitiesDeleted(response.clone()));
    let events = uow.commit()?;
    finish(OperationKind::Delete, stats, response.errors.len());
    Ok((response, events))
}

/// Pure drain: advance in-flight processes without originating new ones.
///
/// An empty request set drains every identifier that currently carries a
/// process; the response reports the set that was actually driven.
pub(crate) fn process<G: LinkGateway>(
    gateway: &mut G,
    requested: BTreeSet<Identifier>,
) -> Result<(EntitiesProcessed, Vec<LinkEvent>), LinkError> {
    started(OperationKind::Process, requested.len());
    observed(OperationKind::Process, process_inner(gateway, requested))
}

fn process_inner<G: LinkGateway>(
    gateway: &mut G,
    requested: BTreeSet<Identifier>,
) -> Result<(EntitiesProcessed, Vec<LinkEvent>), LinkError> {
    let mut uow = UnitOfWork::begin(gateway)?;
    let requested: BTreeSet<Identifier> = if requested.is_empty() {
        uow.snapshot()?.active_processes().keys().cloned().collect()
    } else {
        requested
    };
    let mut stats = DrainStats::default();
    loop {
        let link = uow.link()?;
        let batch = ops::process_requested(&link, &requested);
        if batch.is_quiescent() {
            break;
        }
        apply_round(&mut uow, &batch, &mut stats, requested.len())?;
    }
    let response = EntitiesProcessed { requested };
    uow.record(LinkEvent::EntitiesProcessed(response.clone()));
    let events = uow.commit()?;
    finish(OperationKind::Process, stats, 0);
    Ok((response, events))
}

pub(crate) fn list_idle<G: LinkGateway>(
    gateway: &mut G,
) -> Result<(IdleEntitiesListed, Vec<LinkEvent>), LinkError> {
    started(OperationKind::ListIdle, 0);
    observed(OperationKind::ListIdle, list_idle_inner(gateway))
}

fn list_idle_inner<G: LinkGateway>(
    gateway: &mut G,
) -> Result<(IdleEntitiesListed, Vec<LinkEvent>), LinkError> {
    let mut uow = UnitOfWork::begin(gateway)?;
    let link = uow.link()?;
    let response = IdleEntitiesListed {
        identifiers: link.idle_identifiers(),
    };
    uow.record(LinkEvent::IdleEntitiesListed(response.clone()));
    let events = uow.commit()?;
    finish(OperationKind::ListIdle, DrainStats::default(), 0);
    Ok((response, events))
}

/// Reconcile on demand, outside any pull or delete.
pub(crate) fn reconcile_now<G: LinkGateway>(gateway: &mut G) -> Result<ReconcilePlan, LinkError> {
    let mut uow = UnitOfWork::begin(gateway)?;
    let plan = reconcile::run(&mut uow)?;
    uow.commit()?;
    Ok(plan)
}

/// Drive one originating operation to its fixed point.
///
/// Each round folds the operation over the requested set (in-flight
/// requested entities contribute their next process step instead), applies
/// the state-changing updates, and re-projects. At quiescence, requested
/// identifiers stranded in the terminal state are reported as refusals,
/// as are identifiers the first snapshot did not know at all.
fn operation_drain<G: LinkGateway>(
    uow: &mut UnitOfWork<'_, G>,
    operation: Operation,
    requested: &BTreeSet<Identifier>,
) -> Result<(BTreeSet<OperationError>, DrainStats), LinkError> {
    let mut errors = BTreeSet::new();

    let mut link = uow.link()?;
    let known: BTreeSet<Identifier> = requested
        .iter()
        .filter(|identifier| link.contains(identifier))
        .cloned()
        .collect();
    for identifier in requested.difference(&known) {
        errors.insert(OperationError::UnknownIdentifier {
            operation,
            identifier: identifier.clone(),
        });
    }

    // A delete aimed at an idle entity has nothing to undo; the pull
    // counterpart is silent because "already pulled" is that operation's
    // success state.
    if operation == Operation::StartDelete {
        for identifier in &known {
            if link.entity(identifier).map(Entity::state) == Some(State::Idle) {
                errors.insert(OperationError::InvalidOperationRequested {
                    operation,
                    identifier: identifier.clone(),
                    state: State::Idle,
                });
            }
        }
    }

    let mut stats = DrainStats::default();
    loop {
        let batch = ops::operation_fold(&link, operation, &known);
        if batch.is_quiescent() {
            break;
        }
        apply_round(uow, &batch, &mut stats, known.len())?;
        link = uow.link()?;
    }

    for identifier in &known {
        let Some(entity) = link.entity(identifier) else {
            continue;
        };
        if entity.state() == State::Deprecated {
            errors.insert(OperationError::InvalidOperationRequested {
                operation,
                identifier: identifier.clone(),
                state: State::Deprecated,
            });
        }
    }

    Ok((errors, stats))
}

fn apply_round<G: LinkGateway>(
    uow: &mut UnitOfWork<'_, G>,
    batch: &UpdateBatch,
    stats: &mut DrainStats,
    requested: usize,
) -> Result<(), LinkError> {
    // Each applied round moves every non-quiescent entity at least one
    // step, and no entity needs more steps than a full pull-then-delete
    // walk of the lifecycle. A loop past this bound means the gateway is
    // not actually persisting what it acknowledges.
    let round_cap = 8 * (requested as u64).max(1) + 8;
    if stats.rounds >= round_cap {
        return Err(LinkError::new(
            ErrorClass::Internal,
            ErrorOrigin::Service,
            format!("drain loop exceeded {round_cap} rounds without quiescing"),
        ));
    }
    uow.apply(batch)?;
    stats.rounds += 1;
    stats.commands += batch.command_count() as u64;
    sink::record(LinkMetricsEvent::BatchApplied {
        commands: batch.command_count() as u64,
    });
    tracing::trace!(
        rounds = stats.rounds,
        commands = batch.command_count(),
        "applied drain round"
    );
    Ok(())
}

fn started(kind: OperationKind, requested: usize) {
    sink::record(LinkMetricsEvent::OperationStarted {
        kind,
        requested: requested as u64,
    });
}

fn finish(kind: OperationKind, stats: DrainStats, errors: usize) {
    sink::record(LinkMetricsEvent::OperationFinished {
        kind,
        rounds: stats.rounds,
        commands: stats.commands,
        errors: errors as u64,
    });
}

/// Record a failed invocation's outcome before propagating it.
fn observed<T>(kind: OperationKind, result: Result<T, LinkError>) -> Result<T, LinkError> {
    if let Err(err) = &result {
        sink::record(if err.is_partial_commit() {
            LinkMetricsEvent::PartialCommit
        } else {
            LinkMetricsEvent::RolledBack
        });
        tracing::warn!(kind = ?kind, error = %err.display_with_class(), "link operation failed");
    }
    result
}
