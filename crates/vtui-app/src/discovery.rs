//! Bounded-concurrency recursive discovery of the secret hierarchy
//!
//! Every kv mount is walked by its own branch, all branches concurrently.
//! Inside a branch, sibling folders are also walked concurrently. One
//! [`RequestBudget`] is shared by all branches at every depth: each folder
//! takes a slot before listing, and a folder that finds the budget spent is
//! recorded as unexplored (`incomplete`) instead of being listed.
//!
//! Any listing error fails the whole run. Running out of budget is not an
//! error; it yields a partial tree whose incomplete markers reach the root.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::{try_join_all, BoxFuture};
use serde::Serialize;
use tracing::{debug, info};

use vtui_backend::Backend;
use vtui_core::prelude::*;
use vtui_core::{DetachedNode, EntryKind, Mount, SecretTree};

/// Knobs for one discovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Upper bound on listing requests across the whole run
    pub max_requests: usize,
    /// Resolve capabilities for every node with one extra batched request
    pub annotate_capabilities: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_requests: 100,
            annotate_capabilities: true,
        }
    }
}

/// Outcome of a discovery run
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub tree: SecretTree,
    /// Listing requests actually issued
    pub list_requests: usize,
    /// Whether the capability lookup ran
    pub annotated: bool,
}

impl DiscoveryReport {
    pub fn is_incomplete(&self) -> bool {
        self.tree.is_incomplete()
    }
}

/// Request counter shared by every branch of one run
#[derive(Debug)]
pub struct RequestBudget {
    taken: AtomicUsize,
    issued: AtomicUsize,
    max: usize,
}

impl RequestBudget {
    pub fn new(max: usize) -> Self {
        Self {
            taken: AtomicUsize::new(0),
            issued: AtomicUsize::new(0),
            max,
        }
    }

    /// Take a slot. Fails once the post-increment count reaches the maximum.
    pub fn try_acquire(&self) -> bool {
        let taken = self.taken.fetch_add(1, Ordering::SeqCst) + 1;
        if taken >= self.max {
            return false;
        }
        self.issued.fetch_add(1, Ordering::SeqCst);
        true
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

/// Walk every kv mount in `mounts` and assemble the discovered tree
pub async fn discover<B>(
    backend: &B,
    mounts: &[Mount],
    options: DiscoveryOptions,
) -> Result<DiscoveryReport>
where
    B: Backend + Sync,
{
    let mut seen = HashSet::new();
    let mounts: Vec<Arc<Mount>> = mounts
        .iter()
        .filter(|m| m.is_kv())
        .filter(|m| seen.insert(m.path.clone()))
        .map(|m| Arc::new(m.clone()))
        .collect();

    info!(
        "Discovering {} kv mount(s) with a budget of {} requests",
        mounts.len(),
        options.max_requests
    );

    let budget = RequestBudget::new(options.max_requests);
    let budget = &budget;

    let branches: Vec<BoxFuture<'_, Result<(Arc<Mount>, DetachedNode)>>> = mounts
        .iter()
        .map(|mount| {
            let mount = Arc::clone(mount);
            let branch: BoxFuture<'_, Result<(Arc<Mount>, DetachedNode)>> =
                Box::pin(async move {
                    let root = walk(backend, &mount, String::new(), budget).await?;
                    Ok((mount, root))
                });
            branch
        })
        .collect();

    let roots = try_join_all(branches).await?;

    let mut tree = SecretTree::new();
    for (mount, root) in roots {
        tree.push_root(mount, root);
    }

    let mut annotated = false;
    if options.annotate_capabilities && !tree.is_empty() {
        let paths = tree.full_paths();
        let capabilities = backend
            .batch_capabilities(&paths)
            .await
            .context("capability lookup")?;
        let applied = tree.apply_capabilities(&capabilities);
        debug!("Applied capabilities to {}/{} nodes", applied, tree.len());
        annotated = true;
    }

    let report = DiscoveryReport {
        list_requests: budget.issued(),
        annotated,
        tree,
    };
    info!(
        "Discovery finished: {} nodes, {} listings, incomplete={}",
        report.tree.len(),
        report.list_requests,
        report.is_incomplete()
    );
    Ok(report)
}

/// Discover one folder and everything below it
fn walk<'a, B>(
    backend: &'a B,
    mount: &'a Mount,
    path: String,
    budget: &'a RequestBudget,
) -> BoxFuture<'a, Result<DetachedNode>>
where
    B: Backend + Sync,
{
    Box::pin(async move {
        if !budget.try_acquire() {
            debug!("Budget spent, not listing {}", mount.full_path(&path));
            return Ok(DetachedNode::unexplored(path));
        }

        let entries = backend.list_folder(mount, &path).await?;

        let mut leaves = Vec::new();
        let mut folders = Vec::new();
        for entry in entries {
            let child = format!("{}{}", path, entry.trim_start_matches('/'));
            match EntryKind::of(&child) {
                EntryKind::Folder => folders.push(walk(backend, mount, child, budget)),
                EntryKind::Leaf => leaves.push(DetachedNode::leaf(child)),
            }
        }

        let mut children = try_join_all(folders).await?;
        children.extend(leaves);
        Ok(DetachedNode::folder(path, children))
    })
}
