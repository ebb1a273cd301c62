//! In-memory backend loaded from a JSON fixture
//!
//! Used by the headless runner and by tests. Behaves like a remote backend:
//! every call can be delayed by a simulated latency and is bounded by the same
//! fixed per-call timeout a network client would apply.
//!
//! Fixture format:
//! ```json
//! {
//!   "mounts": [{ "path": "secret/", "type": "kv", "version": 2 }],
//!   "secrets": ["secret/app/db", "secret/app/api-key"],
//!   "capabilities": { "secret/app/db": ["read", "list"] }
//! }
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use vtui_core::prelude::*;
use vtui_core::{Capability, CapabilitySet, Mount};

use crate::client::Backend;

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// On-disk fixture description
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub mounts: Vec<Mount>,
    /// Full leaf paths, including the mount prefix
    #[serde(default)]
    pub secrets: Vec<String>,
    #[serde(default)]
    pub capabilities: HashMap<String, Vec<Capability>>,
}

impl Fixture {
    /// Load a fixture from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FixtureNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&content)?;
        debug!(
            "Loaded fixture {:?}: {} mounts, {} secrets",
            path,
            fixture.mounts.len(),
            fixture.secrets.len()
        );
        Ok(fixture)
    }
}

/// Backend answering from an in-memory folder index
#[derive(Debug)]
pub struct FixtureBackend {
    mounts: Vec<Mount>,
    /// Full folder path -> entry names relative to that folder
    folders: HashMap<String, BTreeSet<String>>,
    capabilities: HashMap<String, CapabilitySet>,
    failing: HashSet<String>,
    latency: Duration,
    timeout: Duration,
    list_calls: AtomicUsize,
    capability_calls: AtomicUsize,
}

impl FixtureBackend {
    pub fn new(fixture: Fixture) -> Self {
        let mounts: Vec<Mount> = fixture.mounts.into_iter().map(Mount::normalized).collect();
        let mut folders: HashMap<String, BTreeSet<String>> = HashMap::new();

        for mount in &mounts {
            folders.entry(mount.path.clone()).or_default();
        }

        for secret in &fixture.secrets {
            let Some(mount) = mounts
                .iter()
                .filter(|m| secret.starts_with(&m.path))
                .max_by_key(|m| m.path.len())
            else {
                warn!("Fixture secret {} is not under any mount, skipping", secret);
                continue;
            };

            let relative = &secret[mount.path.len()..];
            let mut folder = mount.path.clone();
            let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
            for (i, segment) in segments.iter().enumerate() {
                let is_last = i + 1 == segments.len();
                let entry = if is_last {
                    segment.to_string()
                } else {
                    format!("{}/", segment)
                };
                folders.entry(folder.clone()).or_default().insert(entry.clone());
                if !is_last {
                    folder.push_str(&entry);
                    folders.entry(folder.clone()).or_default();
                }
            }
        }

        let capabilities = fixture
            .capabilities
            .into_iter()
            .map(|(path, caps)| (path, caps.into_iter().collect()))
            .collect();

        Self {
            mounts,
            folders,
            capabilities,
            failing: HashSet::new(),
            latency: Duration::ZERO,
            timeout: DEFAULT_TIMEOUT,
            list_calls: AtomicUsize::new(0),
            capability_calls: AtomicUsize::new(0),
        }
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Make listings of `full_path` fail with a backend error
    pub fn with_failure(mut self, full_path: impl Into<String>) -> Self {
        self.failing.insert(full_path.into());
        self
    }

    /// Number of folder listings served (including failed ones)
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn capability_calls(&self) -> usize {
        self.capability_calls.load(Ordering::SeqCst)
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        lookup: impl FnOnce() -> Result<T> + Send,
    ) -> Result<T> {
        let latency = self.latency;
        let call = async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            lookup()
        };
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(operation, self.timeout.as_millis() as u64)),
        }
    }
}

impl Backend for FixtureBackend {
    async fn list_mounts(&self) -> Result<Vec<Mount>> {
        let mounts = self.mounts.clone();
        self.bounded("list mounts", move || Ok(mounts)).await
    }

    async fn list_folder(&self, mount: &Mount, path: &str) -> Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let full = mount.full_path(path);
        debug!("LIST {}", full);

        let operation = format!("list {}", full);
        self.bounded(&operation, || {
            if self.failing.contains(&full) {
                return Err(Error::backend(format!("listing {} failed", full)));
            }
            self.folders
                .get(&full)
                .map(|entries| entries.iter().cloned().collect())
                .ok_or_else(|| Error::not_found(full.clone()))
        })
        .await
    }

    async fn batch_capabilities(
        &self,
        paths: &[String],
    ) -> Result<HashMap<String, CapabilitySet>> {
        self.capability_calls.fetch_add(1, Ordering::SeqCst);
        debug!("capabilities lookup for {} paths", paths.len());

        self.bounded("capabilities", || {
            Ok(paths
                .iter()
                .map(|p| {
                    let caps = self
                        .capabilities
                        .get(p)
                        .cloned()
                        .unwrap_or_else(|| [Capability::Deny].into_iter().collect());
                    (p.clone(), caps)
                })
                .collect())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn fixture() -> Fixture {
        Fixture {
            mounts: vec![Mount::kv("secret", 2), Mount::new("pki", "pki")],
            secrets: vec![
                "secret/app/db".to_string(),
                "secret/app/api/key".to_string(),
                "secret/root-token".to_string(),
            ],
            capabilities: HashMap::from([(
                "secret/app/db".to_string(),
                vec![Capability::Read, Capability::List],
            )]),
        }
    }

    #[tokio::test]
    async fn test_list_mount_root() {
        let backend = FixtureBackend::new(fixture());
        let mount = Mount::kv("secret", 2);
        let entries = assert_ok!(backend.list_folder(&mount, "").await);
        assert_eq!(entries, vec!["app/", "root-token"]);
        assert_eq!(backend.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_list_nested_folder() {
        let backend = FixtureBackend::new(fixture());
        let mount = Mount::kv("secret", 2);
        let entries = assert_ok!(backend.list_folder(&mount, "app/").await);
        assert_eq!(entries, vec!["api/", "db"]);
        let entries = assert_ok!(backend.list_folder(&mount, "app/api/").await);
        assert_eq!(entries, vec!["key"]);
    }

    #[tokio::test]
    async fn test_unknown_folder_is_not_found() {
        let backend = FixtureBackend::new(fixture());
        let mount = Mount::kv("secret", 2);
        let err = assert_err!(backend.list_folder(&mount, "nope/").await);
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_mount_lists_nothing() {
        let backend = FixtureBackend::new(fixture());
        let pki = Mount::new("pki", "pki");
        let entries = assert_ok!(backend.list_folder(&pki, "").await);
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let backend = FixtureBackend::new(fixture()).with_failure("secret/app/");
        let mount = Mount::kv("secret", 2);
        let err = assert_err!(backend.list_folder(&mount, "app/").await);
        assert!(matches!(err, Error::Backend { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_beyond_timeout_is_timeout_error() {
        let backend = FixtureBackend::new(fixture())
            .with_latency(Duration::from_secs(5))
            .with_timeout(Duration::from_secs(1));
        let mount = Mount::kv("secret", 2);
        let err = assert_err!(backend.list_folder(&mount, "").await);
        assert!(matches!(err, Error::Timeout { millis: 1000, .. }));
    }

    #[tokio::test]
    async fn test_batch_capabilities_defaults_to_deny() {
        let backend = FixtureBackend::new(fixture());
        let paths = vec!["secret/app/db".to_string(), "secret/other".to_string()];
        let caps = assert_ok!(backend.batch_capabilities(&paths).await);

        assert!(caps["secret/app/db"].contains(Capability::Read));
        assert!(caps["secret/other"].contains(Capability::Deny));
        assert_eq!(backend.capability_calls(), 1);
    }

    #[test]
    fn test_load_fixture_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        std::fs::write(
            &path,
            r#"{"mounts":[{"path":"kv","type":"kv"}],"secrets":["kv/a"]}"#,
        )
        .unwrap();

        let fixture = Fixture::load(&path).unwrap();
        assert_eq!(fixture.secrets, vec!["kv/a"]);

        let backend = FixtureBackend::new(fixture);
        assert_eq!(backend.mounts[0].path, "kv/");
    }

    #[test]
    fn test_missing_fixture_is_fatal() {
        let err = Fixture::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.is_fatal());
    }
}
