use crate::{
    error::{ErrorClass, ErrorOrigin, LinkError},
    model::update::{Command, Transition, Update},
    types::Identifier,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// State
/// Derived lifecycle state of one linked entity.
///
/// Uniquely determined by (assignments, taint flag, active process); see
/// [`State::derive`]. `Deprecated` is terminal: every operation on it
/// produces an empty update.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum State {
    Idle,
    Activated,
    Received,
    Pulled,
    Tainted,
    Deprecated,
}

impl State {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Deprecated)
    }

    /// Derive the state implied by one persisted configuration.
    ///
    /// Presence in the source component is implied; the caller projects
    /// only identifiers that exist somewhere in the link.
    pub fn derive(
        identifier: &Identifier,
        in_outbound: bool,
        in_local: bool,
        is_tainted: bool,
        active_process: Option<ActiveProcess>,
    ) -> Result<Self, StateError> {
        if active_process.is_some() {
            if !in_outbound {
                return Err(StateError::ProcessWithoutHandOut {
                    identifier: identifier.clone(),
                });
            }
            return Ok(if in_local { Self::Received } else { Self::Activated });
        }
        match (in_outbound, in_local, is_tainted) {
            (false, true, _) => Err(StateError::LocalWithoutHandOut {
                identifier: identifier.clone(),
            }),
            (false, false, true) => Err(StateError::FlagWithoutHandOut {
                identifier: identifier.clone(),
            }),
            (false, false, false) => Ok(Self::Idle),
            (true, true, false) => Ok(Self::Pulled),
            (true, true, true) => Ok(Self::Tainted),
            (true, false, true) => Ok(Self::Deprecated),
            (true, false, false) => Err(StateError::StaleHandOut {
                identifier: identifier.clone(),
            }),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Activated => "activated",
            Self::Received => "received",
            Self::Pulled => "pulled",
            Self::Tainted => "tainted",
            Self::Deprecated => "deprecated",
        };
        write!(f, "{label}")
    }
}

///
/// StateError
/// Persisted configurations that no state accounts for.
///
/// These only arise from drifted reads (rows deleted out-of-band); the
/// reconciliation pass repairs them before links are projected.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StateError {
    #[error("entity {identifier} has an active process but no outbound row")]
    ProcessWithoutHandOut { identifier: Identifier },

    #[error("entity {identifier} is local but has no outbound row")]
    LocalWithoutHandOut { identifier: Identifier },

    #[error("entity {identifier} is flagged but has no outbound row")]
    FlagWithoutHandOut { identifier: Identifier },

    #[error("entity {identifier} has an outbound row but no local row, flag, or process")]
    StaleHandOut { identifier: Identifier },
}

impl From<StateError> for LinkError {
    fn from(err: StateError) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Snapshot,
            err.to_string(),
        )
    }
}

///
/// ActiveProcess
/// In-flight multi-step operation attached to one identifier.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ActiveProcess {
    Pull,
    Delete,
}

impl fmt::Display for ActiveProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pull => "pull",
            Self::Delete => "delete",
        };
        write!(f, "{label}")
    }
}

///
/// Operation
/// The operations a caller can request on an entity.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Operation {
    StartPull,
    StartDelete,
    Process,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::StartPull => "start_pull",
            Self::StartDelete => "start_delete",
            Self::Process => "process",
        };
        write!(f, "{label}")
    }
}

/// Total transition function of the replication state machine.
///
/// Applies `operation` to an entity in `state` with the given taint flag
/// and active process, producing the update that persists the step.
/// Combinations the state machine does not support yield a no-op update
/// with no commands.
#[must_use]
pub fn transition(
    identifier: &Identifier,
    state: State,
    operation: Operation,
    active_process: Option<ActiveProcess>,
    is_tainted: bool,
) -> Update {
    match operation {
        Operation::StartPull => start_pull(identifier, state),
        Operation::StartDelete => start_delete(identifier, state),
        Operation::Process => advance(identifier, state, active_process, is_tainted),
    }
}

fn start_pull(identifier: &Identifier, state: State) -> Update {
    match state {
        State::Idle => step(identifier, state, State::Activated, Command::StartPullProcess),
        _ => Update::noop(identifier.clone(), state),
    }
}

fn start_delete(identifier: &Identifier, state: State) -> Update {
    match state {
        State::Pulled | State::Tainted => {
            step(identifier, state, State::Received, Command::StartDeleteProcess)
        }
        _ => Update::noop(identifier.clone(), state),
    }
}

fn advance(
    identifier: &Identifier,
    state: State,
    active_process: Option<ActiveProcess>,
    is_tainted: bool,
) -> Update {
    let Some(process) = active_process else {
        return Update::noop(identifier.clone(), state);
    };
    match (state, process, is_tainted) {
        (State::Activated, ActiveProcess::Pull, false) => {
            step(identifier, state, State::Received, Command::AddToLocal)
        }
        (State::Activated, ActiveProcess::Delete, false) => {
            step(identifier, state, State::Idle, Command::FinishDeleteProcess)
        }
        (State::Activated, _, true) => step(identifier, state, State::Deprecated, Command::Deprecate),
        (State::Received, ActiveProcess::Pull, false) => {
            step(identifier, state, State::Pulled, Command::FinishPullProcess)
        }
        (State::Received, ActiveProcess::Pull, true) => {
            step(identifier, state, State::Tainted, Command::FinishPullProcess)
        }
        (State::Received, ActiveProcess::Delete, _) => {
            step(identifier, state, State::Activated, Command::RemoveFromLocal)
        }
        _ => Update::noop(identifier.clone(), state),
    }
}

fn step(identifier: &Identifier, from: State, to: State, command: Command) -> Update {
    Update::new(identifier.clone(), Transition::new(from, to), [command])
}
