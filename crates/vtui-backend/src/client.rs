//! Backend collaborator contract
//!
//! The orchestration engine only ever talks to the secrets backend through
//! this trait. Implementations own transport details, including the fixed
//! per-call timeout; the engine treats a timeout as just another error.

use std::collections::HashMap;

use vtui_core::{CapabilitySet, Mount, Result};

/// Secrets backend access
#[trait_variant::make(Backend: Send)]
pub trait LocalBackend {
    /// List every mounted secrets engine
    async fn list_mounts(&self) -> Result<Vec<Mount>>;

    /// List one folder of a mount.
    ///
    /// `path` is mount-relative and either empty (the mount root) or ends in
    /// `/`. Entries are names relative to the folder; folder entries end in
    /// `/`.
    async fn list_folder(&self, mount: &Mount, path: &str) -> Result<Vec<String>>;

    /// Resolve capabilities for many full paths in a single request
    async fn batch_capabilities(&self, paths: &[String])
        -> Result<HashMap<String, CapabilitySet>>;
}
