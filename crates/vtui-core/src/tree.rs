//! Discovered secret hierarchy
//!
//! Discovery branches build [`DetachedNode`] values independently (owned,
//! parent-less, so they can be produced on any task). Once every branch has
//! reported, they are attached into a [`SecretTree`]: an arena of
//! [`SecretTreeRef`] nodes addressed by [`NodeId`], where each node carries a
//! non-owning back-reference to its parent.
//!
//! Invariants maintained by the tree:
//! - exactly one root per mount, roots ordered by mount path
//! - children sorted lexicographically by path at every level
//! - a node is `incomplete` if it, or any descendant, was not fully explored

use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::types::{CapabilitySet, Mount};

/// Index of a node inside a [`SecretTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A subtree produced by one discovery branch, not yet attached to a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedNode {
    /// Mount-relative path; folders end in `/`, the mount root is empty
    pub path: String,
    /// `None` for leaves
    pub children: Option<Vec<DetachedNode>>,
    pub incomplete: bool,
}

impl DetachedNode {
    pub fn leaf(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            children: None,
            incomplete: false,
        }
    }

    /// A folder whose listing completed. Children are sorted and
    /// incompleteness is inherited from them.
    pub fn folder(path: impl Into<String>, mut children: Vec<DetachedNode>) -> Self {
        children.sort_by(|a, b| a.path.cmp(&b.path));
        let incomplete = children.iter().any(|c| c.incomplete);
        Self {
            path: path.into(),
            children: Some(children),
            incomplete,
        }
    }

    /// A folder that was never listed because the request budget ran out
    pub fn unexplored(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            children: Some(Vec::new()),
            incomplete: true,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// A node in the discovered hierarchy
#[derive(Debug, Clone)]
pub struct SecretTreeRef {
    pub mount: Arc<Mount>,
    /// Mount-relative path; empty for the mount root
    pub path: String,
    /// Child node ids, sorted by path; `None` for leaves
    pub children: Option<Vec<NodeId>>,
    /// Set when this subtree was not fully explored
    pub incomplete: bool,
    /// Non-owning back-reference
    pub parent: Option<NodeId>,
    pub capabilities: Option<CapabilitySet>,
}

impl SecretTreeRef {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Backend path including the mount prefix
    pub fn full_path(&self) -> String {
        self.mount.full_path(&self.path)
    }

    /// Last path segment, keeping a trailing `/` on folders
    pub fn name(&self) -> &str {
        if self.path.is_empty() {
            return &self.mount.path;
        }
        let trimmed = self.path.trim_end_matches('/');
        let start = trimmed.rfind('/').map(|i| i + 1).unwrap_or(0);
        &self.path[start..]
    }
}

/// Arena holding every discovered node
#[derive(Debug, Clone, Default)]
pub struct SecretTree {
    nodes: Vec<SecretTreeRef>,
    roots: Vec<NodeId>,
}

impl SecretTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a mount's discovered root. An existing root for the same
    /// mount path is replaced in the root list.
    pub fn push_root(&mut self, mount: Arc<Mount>, root: DetachedNode) -> NodeId {
        let id = self.attach(&mount, root, None);
        let mount_path = mount.path.clone();

        self.roots
            .retain(|r| self.nodes[r.0].mount.path != mount_path);
        let pos = self
            .roots
            .partition_point(|r| self.nodes[r.0].mount.path < mount_path);
        self.roots.insert(pos, id);
        id
    }

    fn attach(&mut self, mount: &Arc<Mount>, node: DetachedNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SecretTreeRef {
            mount: Arc::clone(mount),
            path: node.path,
            children: None,
            incomplete: node.incomplete,
            parent,
            capabilities: None,
        });

        if let Some(children) = node.children {
            let ids: Vec<NodeId> = children
                .into_iter()
                .map(|child| self.attach(mount, child, Some(id)))
                .collect();
            self.nodes[id.0].children = Some(ids);
        }
        id
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> Option<&SecretTreeRef> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether any mount was only partially explored
    pub fn is_incomplete(&self) -> bool {
        self.roots.iter().any(|r| self.nodes[r.0].incomplete)
    }

    /// Children of a node; empty for leaves and unknown ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id)
            .and_then(|n| n.children.as_deref())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Ancestors from the direct parent up to the mount root
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(p) = cursor {
            out.push(p);
            cursor = self.parent(p);
        }
        out
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).len()
    }

    pub fn root_for_mount(&self, mount_path: &str) -> Option<NodeId> {
        self.roots
            .iter()
            .copied()
            .find(|r| self.nodes[r.0].mount.path == mount_path)
    }

    /// Pre-order walk over every mount in root order
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn find(&self, full_path: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|id| self.nodes[id.0].full_path() == full_path)
    }

    /// Full path of every node, in walk order
    pub fn full_paths(&self) -> Vec<String> {
        self.walk()
            .into_iter()
            .map(|id| self.nodes[id.0].full_path())
            .collect()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Apply a per-path capability lookup to matching nodes.
    ///
    /// Returns how many nodes were annotated.
    pub fn apply_capabilities(&mut self, capabilities: &HashMap<String, CapabilitySet>) -> usize {
        let mut applied = 0;
        for node in &mut self.nodes {
            if let Some(caps) = capabilities.get(&node.full_path()) {
                node.capabilities = Some(caps.clone());
                applied += 1;
            }
        }
        applied
    }
}

struct NodeView<'a> {
    tree: &'a SecretTree,
    id: NodeId,
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = &self.tree.nodes[self.id.0];
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("path", &node.full_path())?;
        if node.incomplete {
            map.serialize_entry("incomplete", &true)?;
        }
        if let Some(caps) = &node.capabilities {
            map.serialize_entry("capabilities", caps)?;
        }
        if let Some(children) = &node.children {
            let views: Vec<NodeView<'_>> = children
                .iter()
                .map(|&id| NodeView {
                    tree: self.tree,
                    id,
                })
                .collect();
            map.serialize_entry("children", &views)?;
        }
        map.end()
    }
}

impl Serialize for SecretTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.roots.len()))?;
        for &id in &self.roots {
            seq.serialize_element(&NodeView { tree: self, id })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Capability;

    fn sample() -> SecretTree {
        let mut tree = SecretTree::new();
        let root = DetachedNode::folder(
            "",
            vec![
                DetachedNode::leaf("zeta"),
                DetachedNode::folder("app/", vec![DetachedNode::leaf("app/db")]),
            ],
        );
        tree.push_root(Arc::new(Mount::kv("secret", 2)), root);
        tree
    }

    #[test]
    fn test_folder_sorts_children() {
        let node = DetachedNode::folder(
            "",
            vec![DetachedNode::leaf("b"), DetachedNode::leaf("a")],
        );
        let paths: Vec<_> = node
            .children
            .unwrap()
            .into_iter()
            .map(|c| c.path)
            .collect();
        assert_eq!(paths, vec!["a", "b"]);
    }

    #[test]
    fn test_folder_inherits_incomplete() {
        let node = DetachedNode::folder("", vec![DetachedNode::unexplored("x/")]);
        assert!(node.incomplete);
        let node = DetachedNode::folder("", vec![DetachedNode::leaf("x")]);
        assert!(!node.incomplete);
    }

    #[test]
    fn test_attach_sets_parent_links() {
        let tree = sample();
        let root = tree.roots()[0];
        assert!(tree.get(root).unwrap().is_root());

        let app = tree.find("secret/app/").unwrap();
        assert_eq!(tree.parent(app), Some(root));

        let db = tree.find("secret/app/db").unwrap();
        assert_eq!(tree.ancestors(db), vec![app, root]);
        assert_eq!(tree.depth(db), 2);
    }

    #[test]
    fn test_walk_is_preorder_and_sorted() {
        let tree = sample();
        assert_eq!(
            tree.full_paths(),
            vec!["secret/", "secret/app/", "secret/app/db", "secret/zeta"]
        );
    }

    #[test]
    fn test_one_root_per_mount() {
        let mut tree = sample();
        let mount = Arc::new(Mount::kv("secret", 2));
        tree.push_root(mount, DetachedNode::folder("", vec![]));
        tree.push_root(
            Arc::new(Mount::kv("alpha", 1)),
            DetachedNode::folder("", vec![]),
        );

        assert_eq!(tree.roots().len(), 2);
        let first = tree.get(tree.roots()[0]).unwrap();
        assert_eq!(first.mount.path, "alpha/");
    }

    #[test]
    fn test_name_keeps_folder_slash() {
        let tree = sample();
        let app = tree.find("secret/app/").unwrap();
        assert_eq!(tree.get(app).unwrap().name(), "app/");
        let db = tree.find("secret/app/db").unwrap();
        assert_eq!(tree.get(db).unwrap().name(), "db");
        assert_eq!(tree.get(tree.roots()[0]).unwrap().name(), "secret/");
    }

    #[test]
    fn test_apply_capabilities() {
        let mut tree = sample();
        let mut caps = HashMap::new();
        caps.insert(
            "secret/app/db".to_string(),
            [Capability::Read].into_iter().collect::<CapabilitySet>(),
        );
        caps.insert("secret/unknown".to_string(), CapabilitySet::new());

        assert_eq!(tree.apply_capabilities(&caps), 1);
        let db = tree.find("secret/app/db").unwrap();
        assert!(tree
            .get(db)
            .unwrap()
            .capabilities
            .as_ref()
            .unwrap()
            .contains(Capability::Read));
    }

    #[test]
    fn test_serialize_nested() {
        let tree = sample();
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(value[0]["path"], "secret/");
        assert_eq!(value[0]["children"][0]["path"], "secret/app/");
        assert_eq!(value[0]["children"][0]["children"][0]["path"], "secret/app/db");
        assert!(value[0]["children"][1].get("children").is_none());
    }
}
