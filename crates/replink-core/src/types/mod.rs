//! Identifier and key primitives.
//!
//! Everything the rest of the runtime knows about a linked entity's identity
//! lives here: the opaque [`Identifier`] handle and the typed
//! [`PrimaryKey`] tuple it is canonically derived from. The runtime never
//! looks inside an identifier; adapters translate at the boundary.

pub(crate) mod identifier;
pub(crate) mod key;

// re-exports
pub use identifier::Identifier;
pub use key::{KeyValue, PrimaryKey};
