use crate::{
    error::{ErrorOrigin, LinkError},
    model::{
        component::{Assignments, Component},
        entity::Entity,
        state::{ActiveProcess, State},
    },
    types::Identifier,
};
use std::collections::{BTreeMap, BTreeSet};

///
/// LinkSnapshot
/// Consistent point-in-time read of the persisted link state.
///
/// Raw sets as the gateway fetched them, including drift a crashed or
/// out-of-band operation may have left behind. Projection into a [`Link`]
/// validates; reconciliation planning deliberately does not.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LinkSnapshot {
    assignments: Assignments,
    outbound_flagged: BTreeSet<Identifier>,
    local_inbound: BTreeSet<Identifier>,
    local_flagged: BTreeSet<Identifier>,
    active_processes: BTreeMap<Identifier, ActiveProcess>,
}

impl LinkSnapshot {
    #[must_use]
    pub const fn new(
        assignments: Assignments,
        outbound_flagged: BTreeSet<Identifier>,
        local_inbound: BTreeSet<Identifier>,
        local_flagged: BTreeSet<Identifier>,
        active_processes: BTreeMap<Identifier, ActiveProcess>,
    ) -> Self {
        Self {
            assignments,
            outbound_flagged,
            local_inbound,
            local_flagged,
            active_processes,
        }
    }

    #[must_use]
    pub const fn assignments(&self) -> &Assignments {
        &self.assignments
    }

    /// Taint set: the operator-owned flags in the outbound ledger.
    #[must_use]
    pub const fn outbound_flagged(&self) -> &BTreeSet<Identifier> {
        &self.outbound_flagged
    }

    #[must_use]
    pub const fn local_inbound(&self) -> &BTreeSet<Identifier> {
        &self.local_inbound
    }

    #[must_use]
    pub const fn local_flagged(&self) -> &BTreeSet<Identifier> {
        &self.local_flagged
    }

    #[must_use]
    pub const fn active_processes(&self) -> &BTreeMap<Identifier, ActiveProcess> {
        &self.active_processes
    }

    #[must_use]
    pub fn is_tainted(&self, identifier: &Identifier) -> bool {
        self.outbound_flagged.contains(identifier)
    }

    #[must_use]
    pub fn active_process_of(&self, identifier: &Identifier) -> Option<ActiveProcess> {
        self.active_processes.get(identifier).copied()
    }
}

///
/// Link
/// Immutable aggregate of all linked entities, indexable by component.
///
/// Projected from a validated snapshot; never mutated. After a batch is
/// applied the caller re-projects from a fresh snapshot instead.
///

#[derive(Clone, Debug)]
pub struct Link {
    entities: BTreeMap<Identifier, Entity>,
    assignments: Assignments,
}

impl Link {
    /// Validate a snapshot and project it into entities.
    ///
    /// Rejects configurations no state accounts for: nesting violations,
    /// flags or processes without an outbound row, and stale hand-outs.
    pub fn from_snapshot(snapshot: &LinkSnapshot) -> Result<Self, LinkError> {
        let assignments = snapshot.assignments();
        if let Some(identifier) = assignments.first_nesting_violation() {
            return Err(LinkError::invariant(
                ErrorOrigin::Snapshot,
                format!("entity {identifier} violates component nesting"),
            ));
        }
        for identifier in snapshot.outbound_flagged() {
            if !assignments.contains(Component::Outbound, identifier) {
                return Err(LinkError::invariant(
                    ErrorOrigin::Snapshot,
                    format!("entity {identifier} is flagged but has no outbound row"),
                ));
            }
        }
        for identifier in snapshot.active_processes().keys() {
            if !assignments.contains(Component::Outbound, identifier) {
                return Err(LinkError::invariant(
                    ErrorOrigin::Snapshot,
                    format!("entity {identifier} has an active process but no outbound row"),
                ));
            }
        }

        let mut entities = BTreeMap::new();
        for identifier in assignments.union() {
            let state = State::derive(
                &identifier,
                assignments.contains(Component::Outbound, &identifier),
                assignments.contains(Component::Local, &identifier),
                snapshot.is_tainted(&identifier),
                snapshot.active_process_of(&identifier),
            )?;
            let entity = Entity::new(
                identifier.clone(),
                state,
                snapshot.is_tainted(&identifier),
                snapshot.active_process_of(&identifier),
            );
            entities.insert(identifier, entity);
        }

        Ok(Self {
            entities,
            assignments: assignments.clone(),
        })
    }

    #[must_use]
    pub fn entity(&self, identifier: &Identifier) -> Option<&Entity> {
        self.entities.get(identifier)
    }

    #[must_use]
    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.entities.contains_key(identifier)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Entities whose identifier lies in the component's assignment.
    pub fn in_component(&self, component: Component) -> impl Iterator<Item = &Entity> {
        self.entities
            .values()
            .filter(move |entity| self.assignments.contains(component, entity.identifier()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Identifiers currently in `Idle`.
    #[must_use]
    pub fn idle_identifiers(&self) -> BTreeSet<Identifier> {
        self.entities
            .values()
            .filter(|entity| entity.state() == State::Idle)
            .map(|entity| entity.identifier().clone())
            .collect()
    }
}

impl<'a> IntoIterator for &'a Link {
    type Item = &'a Entity;
    type IntoIter = std::collections::btree_map::Values<'a, Identifier, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.values()
    }
}
