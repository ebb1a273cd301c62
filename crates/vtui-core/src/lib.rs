//! # vtui-core - Core Domain Types
//!
//! Foundation crate for vault-tui. Provides domain types, error handling,
//! logging setup, and the discovered secret tree.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`Mount`] - A secrets engine mounted at a path
//! - [`EntryKind`] - Folder vs leaf classification of a listing entry
//! - [`Capability`], [`CapabilitySet`] - Access capabilities on a path
//!
//! ### Secret Tree (`tree`)
//! - [`SecretTree`] - Arena of discovered nodes, one root per mount
//! - [`SecretTreeRef`] - A node with a non-owning parent back-reference
//! - [`DetachedNode`] - Owned subtree produced by a discovery branch
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context

pub mod error;
pub mod logging;
pub mod tree;
pub mod types;

/// Prelude for common imports used throughout all vault-tui crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use error::{Error, Result, ResultExt};
pub use tree::{DetachedNode, NodeId, SecretTree, SecretTreeRef};
pub use types::{Capability, CapabilitySet, EntryKind, Mount, KV_MOUNT_TYPE};
