use crate::{
    model::state::{ActiveProcess, Operation, State, transition},
    model::update::Update,
    types::Identifier,
};

///
/// Entity
/// Snapshot value of one linked entity.
///
/// Derived from (identifier, assignments, taint flag, active process) when
/// a link is projected. The three operation methods are pure; they return
/// the update that would persist the step and never mutate the entity.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entity {
    identifier: Identifier,
    state: State,
    is_tainted: bool,
    active_process: Option<ActiveProcess>,
}

impl Entity {
    pub(crate) const fn new(
        identifier: Identifier,
        state: State,
        is_tainted: bool,
        active_process: Option<ActiveProcess>,
    ) -> Self {
        Self {
            identifier,
            state,
            is_tainted,
            active_process,
        }
    }

    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub const fn is_tainted(&self) -> bool {
        self.is_tainted
    }

    #[must_use]
    pub const fn active_process(&self) -> Option<ActiveProcess> {
        self.active_process
    }

    /// Request to start or advance a pull.
    #[must_use]
    pub fn pull(&self) -> Update {
        self.apply(Operation::StartPull)
    }

    /// Request to start or advance a delete.
    #[must_use]
    pub fn delete(&self) -> Update {
        self.apply(Operation::StartDelete)
    }

    /// Advance the running process one step.
    #[must_use]
    pub fn process(&self) -> Update {
        self.apply(Operation::Process)
    }

    #[must_use]
    pub fn apply(&self, operation: Operation) -> Update {
        transition(
            &self.identifier,
            self.state,
            operation,
            self.active_process,
            self.is_tainted,
        )
    }
}
