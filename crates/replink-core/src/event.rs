//! Link events and the output port they are published through.
//!
//! Events are response data, not errors: a refused operation rides along in
//! the response set of the use case that refused it, and the use case
//! itself still succeeds. Events buffered during a unit of work reach
//! subscribers only after both connections committed.

use crate::{
    model::{Operation, State},
    types::Identifier,
};
use std::{collections::BTreeSet, fmt};

///
/// OperationError
/// Non-fatal refusal attached to a pull or delete response.
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum OperationError {
    /// The operation was requested against an identifier whose state
    /// forbids it (notably the terminal `Deprecated`).
    InvalidOperationRequested {
        operation: Operation,
        identifier: Identifier,
        state: State,
    },
    /// The identifier is not present in any component of the snapshot.
    UnknownIdentifier {
        operation: Operation,
        identifier: Identifier,
    },
}

impl OperationError {
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        match self {
            Self::InvalidOperationRequested { identifier, .. }
            | Self::UnknownIdentifier { identifier, .. } => identifier,
        }
    }

    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::InvalidOperationRequested { operation, .. }
            | Self::UnknownIdentifier { operation, .. } => *operation,
        }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOperationRequested {
                operation,
                identifier,
                state,
            } => write!(f, "{operation} refused for {identifier} (state {state})"),
            Self::UnknownIdentifier {
                operation,
                identifier,
            } => write!(f, "{operation} refused for {identifier} (unknown identifier)"),
        }
    }
}

///
/// EntitiesPulled
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntitiesPulled {
    pub requested: BTreeSet<Identifier>,
    pub errors: BTreeSet<OperationError>,
}

///
/// EntitiesDeleted
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntitiesDeleted {
    pub requested: BTreeSet<Identifier>,
    pub errors: BTreeSet<OperationError>,
}

///
/// EntitiesProcessed
/// Response of the pure process drain; never carries refusals because the
/// drain originates nothing.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntitiesProcessed {
    pub requested: BTreeSet<Identifier>,
}

///
/// IdleEntitiesListed
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IdleEntitiesListed {
    pub identifiers: BTreeSet<Identifier>,
}

///
/// LinkEvent
/// Everything the runtime publishes through the output port.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LinkEvent {
    EntitiesPulled(EntitiesPulled),
    EntitiesDeleted(EntitiesDeleted),
    EntitiesProcessed(EntitiesProcessed),
    IdleEntitiesListed(IdleEntitiesListed),
}

impl LinkEvent {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EntitiesPulled(_) => "entities_pulled",
            Self::EntitiesDeleted(_) => "entities_deleted",
            Self::EntitiesProcessed(_) => "entities_processed",
            Self::IdleEntitiesListed(_) => "idle_entities_listed",
        }
    }
}

///
/// EventSink
/// Output port for link events.
///
/// Delivery happens after commit, on the thread that ran the use case.
/// Implementations use interior mutability if they accumulate.
///

pub trait EventSink {
    fn publish(&self, event: &LinkEvent);
}
