//! # replink
//!
//! `replink` is the **public facade crate** for the RepLink runtime.
//! It is the recommended dependency for downstream projects.
//!
//! RepLink keeps a *local* relational schema consistent with a *source*
//! schema on another host: users pull entities across the link and later
//! delete them locally, while the source operator can flag handed-out
//! entities for removal. A twelve-configuration state machine governs
//! every linked entity; a transactional gateway applies its commands
//! atomically across both database connections.
//!
//! ## Crate layout
//!
//! - `model`
//!   The state machine: components, states, entities, links, updates.
//!
//! - `gateway`
//!   The port implementations plug into: snapshot/apply/reconcile plus
//!   the unit of work and the two-connection coordinator.
//!
//! - `session`
//!   The runtime surface: [`session::LinkSession`] drives pull, delete,
//!   process, list-idle, and reconciliation against one gateway.
//!
//! - `event` / `obs`
//!   Response events with their output port, and the metrics/report side.
//!
//! - `config`
//!   Host/schema pairing for one link, consumed by gateway adapters.
//!
//! - `error`
//!   Public error type with a stable class + origin taxonomy.
//!
//! ## Prelude
//!
//! `prelude` re-exports the domain vocabulary and is intended to be
//! glob-imported by application code.

// core modules
pub use replink_core::{event, gateway, model, obs, reconcile, service, session, types};

pub mod config;
pub mod error;
pub use error::Error;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Error,
        config::{EndpointConfig, LinkConfig},
    };
    pub use replink_core::prelude::*;
}
