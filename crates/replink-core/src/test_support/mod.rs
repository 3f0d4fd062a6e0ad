//! In-memory gateway and snapshot builders for tests.
//!
//! Exposed to downstream crates behind the `test-support` feature so
//! integration tests can drive the public session API without a database.

pub mod builders;
pub mod memory;

// re-exports
pub use builders::{RecordedEvents, SnapshotBuilder, identifier, identifiers, snapshot};
pub use memory::{LocalTables, MemoryHost, MemoryLinkGateway, SourceTables};
