//! Domain services and use-case drivers.
//!
//! `ops` holds the pure folds of the state machine over a projected link;
//! `drive` turns them into transactional fixed-point loops against a
//! gateway. Only the session calls into `drive`; `ops` is public because
//! the folds are the domain contract.

pub(crate) mod drive;
pub(crate) mod ops;

#[cfg(test)]
mod tests;

// re-exports
pub use ops::{delete, process, process_requested, pull};
