//! Transactional boundary between the runtime and the two hosts.
//!
//! Contract:
//! - `snapshot` reads all six persisted sets consistently, inside the open
//!   transaction.
//! - `apply` executes every command of a batch in the canonical apply
//!   order, writing outbound rows through the source-host connection and
//!   local rows through the local-host connection, and either all commands
//!   take effect or none do.
//! - `begin`/`commit`/`rollback` span both connections; `commit` closes
//!   local first, then source (see [`DualTransaction`]). A source-side
//!   commit failure after the local commit is the non-recoverable
//!   partial-commit case and must surface as such.
//!
//! On any other failure the gateway leaves both connections rolled back.

pub(crate) mod coordinator;
pub(crate) mod unit_of_work;


// re-exports
pub use coordinator::{DualTransaction, TransactionHandle};
pub use unit_of_work::UnitOfWork;

use crate::{
    error::LinkError,
    model::{LinkSnapshot, UpdateBatch},
    reconcile::ReconcilePlan,
};

///
/// LinkGateway
/// Port through which the runtime reaches the persisted link.
///
/// Implementations own the two database connections and the table
/// façades; the runtime only ever hands them value batches and plans.
///

pub trait LinkGateway {
    /// Read a consistent snapshot of the persisted link state.
    fn snapshot(&self) -> Result<LinkSnapshot, LinkError>;

    /// Execute every command in the batch atomically across both hosts.
    fn apply(&mut self, batch: &UpdateBatch) -> Result<(), LinkError>;

    /// Apply one reconciliation plan atomically across both hosts.
    fn reconcile(&mut self, plan: &ReconcilePlan) -> Result<(), LinkError>;

    /// Open the cross-connection transaction.
    fn begin(&mut self) -> Result<(), LinkError>;

    /// Close the cross-connection transaction, local side first.
    fn commit(&mut self) -> Result<(), LinkError>;

    /// Discard all writes on both connections.
    fn rollback(&mut self) -> Result<(), LinkError>;
}
