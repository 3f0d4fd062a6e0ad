use crate::{model::state::State, types::Identifier};
use std::{collections::BTreeSet, fmt};

///
/// Command
/// Persistence alphabet executed by the gateway.
///
/// Variant order is the transactional apply order: processes start before
/// local rows change, local rows change before outbound rows disappear,
/// and deprecation is recorded last. The derived `Ord` is load-bearing.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Command {
    StartPullProcess,
    StartDeleteProcess,
    AddToLocal,
    RemoveFromLocal,
    FinishPullProcess,
    FinishDeleteProcess,
    Deprecate,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::StartPullProcess => "start_pull_process",
            Self::StartDeleteProcess => "start_delete_process",
            Self::AddToLocal => "add_to_local",
            Self::RemoveFromLocal => "remove_from_local",
            Self::FinishPullProcess => "finish_pull_process",
            Self::FinishDeleteProcess => "finish_delete_process",
            Self::Deprecate => "deprecate",
        };
        write!(f, "{label}")
    }
}

///
/// Transition
/// One state change, possibly degenerate.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Transition {
    pub from: State,
    pub to: State,
}

impl Transition {
    #[must_use]
    pub const fn new(from: State, to: State) -> Self {
        Self { from, to }
    }

    #[must_use]
    pub const fn is_state_changing(self) -> bool {
        (self.from as u8) != (self.to as u8)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

///
/// Update
/// Result of one transition: the identifier, its state change, and the
/// commands required to persist it. No commands means the requested
/// operation was a no-op for the entity's state.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Update {
    identifier: Identifier,
    transition: Transition,
    commands: BTreeSet<Command>,
}

impl Update {
    pub(crate) fn new(
        identifier: Identifier,
        transition: Transition,
        commands: impl IntoIterator<Item = Command>,
    ) -> Self {
        Self {
            identifier,
            transition,
            commands: commands.into_iter().collect(),
        }
    }

    pub(crate) const fn noop(identifier: Identifier, state: State) -> Self {
        Self {
            identifier,
            transition: Transition::new(state, state),
            commands: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    #[must_use]
    pub const fn transition(&self) -> Transition {
        self.transition
    }

    pub fn commands(&self) -> impl Iterator<Item = Command> + '_ {
        self.commands.iter().copied()
    }

    /// True if applying this update changes persisted state.
    #[must_use]
    pub fn is_state_changing(&self) -> bool {
        !self.commands.is_empty()
    }
}

///
/// UpdateBatch
/// Ordered collection of updates for one gateway apply.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, derive_more::IntoIterator)]
pub struct UpdateBatch {
    #[into_iterator(owned, ref)]
    updates: Vec<Update>,
}

impl UpdateBatch {
    #[must_use]
    pub fn new(updates: Vec<Update>) -> Self {
        Self { updates }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Update> {
        self.updates.iter()
    }

    /// True if no update in the batch changes persisted state.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        !self.updates.iter().any(Update::is_state_changing)
    }

    /// Number of commands across all updates.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.updates.iter().map(|update| update.commands.len()).sum()
    }

    /// Flatten into `(command, identifier)` pairs in transactional apply
    /// order: command rank first, then identifier key hash, then the
    /// identifier itself so hash collisions stay deterministic.
    #[must_use]
    pub fn commands_in_apply_order(&self) -> Vec<(Command, &Identifier)> {
        let mut ops: Vec<(Command, &Identifier)> = self
            .updates
            .iter()
            .flat_map(|update| update.commands().map(|command| (command, update.identifier())))
            .collect();
        ops.sort_by(|(lhs_cmd, lhs_id), (rhs_cmd, rhs_id)| {
            lhs_cmd
                .cmp(rhs_cmd)
                .then_with(|| lhs_id.key_hash().cmp(&rhs_id.key_hash()))
                .then_with(|| lhs_id.cmp(rhs_id))
        });
        ops
    }
}
