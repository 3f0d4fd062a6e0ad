use crate::{
    model::{Entity, Link, Operation, UpdateBatch},
    types::Identifier,
};
use std::collections::BTreeSet;

/// Fold a pull request over the link.
///
/// Requested entities that can start a pull produce the start update;
/// requested entities already carrying a process produce their next
/// process step instead, so a drain loop re-invoking this fold converges
/// on the pull terminal states. Identifiers unknown to the link are
/// skipped; the use case reports them.
#[must_use]
pub fn pull(link: &Link, requested: &BTreeSet<Identifier>) -> UpdateBatch {
    operation_fold(link, Operation::StartPull, requested)
}

/// Fold a delete request over the link; symmetric to [`pull`].
#[must_use]
pub fn delete(link: &Link, requested: &BTreeSet<Identifier>) -> UpdateBatch {
    operation_fold(link, Operation::StartDelete, requested)
}

/// Advance every in-flight process one step.
#[must_use]
pub fn process(link: &Link) -> UpdateBatch {
    UpdateBatch::new(
        link.entities()
            .filter(|entity| entity.active_process().is_some())
            .map(Entity::process)
            .collect(),
    )
}

/// Advance in-flight processes for the requested identifiers only.
#[must_use]
pub fn process_requested(link: &Link, requested: &BTreeSet<Identifier>) -> UpdateBatch {
    UpdateBatch::new(
        requested
            .iter()
            .filter_map(|identifier| link.entity(identifier))
            .filter(|entity| entity.active_process().is_some())
            .map(Entity::process)
            .collect(),
    )
}

pub(crate) fn operation_fold(
    link: &Link,
    operation: Operation,
    requested: &BTreeSet<Identifier>,
) -> UpdateBatch {
    let mut updates = Vec::new();
    for identifier in requested {
        let Some(entity) = link.entity(identifier) else {
            continue;
        };
        let mut update = entity.apply(operation);
        if !update.is_state_changing() {
            update = entity.process();
        }
        updates.push(update);
    }
    UpdateBatch::new(updates)
}
