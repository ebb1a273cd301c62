//! Domain types for the secrets backend: mounts, folder entries, capabilities

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Mount type walked by discovery
pub const KV_MOUNT_TYPE: &str = "kv";

/// A secrets engine mounted at a path on the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mount {
    /// Mount path, always with a trailing `/` (e.g. `secret/`)
    pub path: String,

    /// Engine type (`kv`, `pki`, `transit`, ...)
    #[serde(rename = "type")]
    pub mount_type: String,

    /// Engine version for versioned engines (kv v1/v2)
    #[serde(default)]
    pub version: Option<u8>,

    #[serde(default)]
    pub description: String,
}

impl Mount {
    pub fn new(path: impl Into<String>, mount_type: impl Into<String>) -> Self {
        Self {
            path: normalize_folder(path.into()),
            mount_type: mount_type.into(),
            version: None,
            description: String::new(),
        }
    }

    /// Convenience constructor for a kv mount of the given version
    pub fn kv(path: impl Into<String>, version: u8) -> Self {
        Self {
            version: Some(version),
            ..Self::new(path, KV_MOUNT_TYPE)
        }
    }

    /// Whether discovery should walk this mount
    pub fn is_kv(&self) -> bool {
        self.mount_type == KV_MOUNT_TYPE
    }

    /// Join a mount-relative path onto the mount path
    pub fn full_path(&self, relative: &str) -> String {
        format!("{}{}", self.path, relative.trim_start_matches('/'))
    }

    /// Return the same mount with a normalized path
    pub fn normalized(mut self) -> Self {
        self.path = normalize_folder(self.path);
        self
    }
}

fn normalize_folder(mut path: String) -> String {
    while path.starts_with('/') {
        path.remove(0);
    }
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}

/// Kind of an entry returned by a folder listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Entry ending in `/`; can be listed further
    Folder,
    /// Terminal secret
    Leaf,
}

impl EntryKind {
    pub fn of(name: &str) -> Self {
        if name.ends_with('/') {
            EntryKind::Folder
        } else {
            EntryKind::Leaf
        }
    }
}

/// A single access capability on a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Create,
    Read,
    Update,
    Patch,
    Delete,
    List,
    Sudo,
    Root,
    Deny,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Create => "create",
            Capability::Read => "read",
            Capability::Update => "update",
            Capability::Patch => "patch",
            Capability::Delete => "delete",
            Capability::List => "list",
            Capability::Sudo => "sudo",
            Capability::Root => "root",
            Capability::Deny => "deny",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Capability::Create),
            "read" => Ok(Capability::Read),
            "update" => Ok(Capability::Update),
            "patch" => Ok(Capability::Patch),
            "delete" => Ok(Capability::Delete),
            "list" => Ok(Capability::List),
            "sudo" => Ok(Capability::Sudo),
            "root" => Ok(Capability::Root),
            "deny" => Ok(Capability::Deny),
            other => Err(Error::backend(format!("unknown capability: {}", other))),
        }
    }
}

/// Ordered set of capabilities held on one path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0.insert(capability);
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    /// `root` grants everything, `deny` overrides everything
    pub fn allows(&self, capability: Capability) -> bool {
        if self.contains(Capability::Deny) {
            return false;
        }
        self.contains(Capability::Root) || self.contains(capability)
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Capability::as_str).collect();
        f.write_str(&names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_path_is_normalized() {
        assert_eq!(Mount::kv("secret", 2).path, "secret/");
        assert_eq!(Mount::kv("/team/kv/", 1).path, "team/kv/");
    }

    #[test]
    fn test_mount_full_path() {
        let mount = Mount::kv("secret", 2);
        assert_eq!(mount.full_path("app/db"), "secret/app/db");
        assert_eq!(mount.full_path(""), "secret/");
    }

    #[test]
    fn test_is_kv() {
        assert!(Mount::kv("secret", 1).is_kv());
        assert!(!Mount::new("pki", "pki").is_kv());
    }

    #[test]
    fn test_entry_kind() {
        assert_eq!(EntryKind::of("app/"), EntryKind::Folder);
        assert_eq!(EntryKind::of("password"), EntryKind::Leaf);
    }

    #[test]
    fn test_capability_parse_and_display() {
        assert_eq!("READ".parse::<Capability>().unwrap(), Capability::Read);
        assert!("fly".parse::<Capability>().is_err());

        let set: CapabilitySet = [Capability::List, Capability::Read].into_iter().collect();
        assert_eq!(set.to_string(), "read,list");
    }

    #[test]
    fn test_capability_set_allows() {
        let root: CapabilitySet = [Capability::Root].into_iter().collect();
        assert!(root.allows(Capability::Delete));

        let denied: CapabilitySet = [Capability::Read, Capability::Deny].into_iter().collect();
        assert!(!denied.allows(Capability::Read));
    }

    #[test]
    fn test_mount_deserializes_type_field() {
        let mount: Mount =
            serde_json::from_str(r#"{"path":"secret/","type":"kv","version":2}"#).unwrap();
        assert!(mount.is_kv());
        assert_eq!(mount.version, Some(2));
    }
}
