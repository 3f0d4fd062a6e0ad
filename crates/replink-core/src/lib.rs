//! Core runtime for RepLink: identifiers, the entity state machine, link
//! aggregates, domain services, the transactional gateway port, and the
//! reconciliation pass.
//!
//! The runtime is synchronous: one use-case invocation drives one gateway
//! through one unit of work, and only gateway calls touch I/O. Concurrency
//! across invocations is the databases' problem, which is why every
//! applied batch is followed by a fresh snapshot.

pub mod error;
pub mod event;
pub mod gateway;
pub mod model;
pub mod obs;
pub mod reconcile;
pub mod service;
pub mod session;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No sinks, reports, plans, or transaction plumbing are re-exported here.
///

pub mod prelude {
    pub use crate::{
        error::LinkError,
        event::{
            EntitiesDeleted, EntitiesProcessed, EntitiesPulled, EventSink, IdleEntitiesListed,
            LinkEvent, OperationError,
        },
        gateway::LinkGateway,
        model::{ActiveProcess, Component, Entity, Link, LinkSnapshot, State},
        session::LinkSession,
        types::{Identifier, KeyValue, PrimaryKey},
    };
}
