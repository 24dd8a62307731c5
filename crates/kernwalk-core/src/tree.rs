//! The namespace tree and its owner-side mutators.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use compact_str::CompactString;

use crate::error::WalkError;
use crate::hold::{HoldJournal, RefCounted};
use crate::lock::TreeLock;
use crate::node::{Node, NodeId, NodeKind};

/// Owner of a hierarchical node tree.
///
/// The namespace holds one reference on every node it contains. Mutations
/// take the tree-wide lock, so a walker holding that lock observes a frozen
/// tree. Removed nodes stay readable for as long as someone holds them.
#[derive(Debug)]
pub struct Namespace {
    root: Node,
    lock: Arc<TreeLock>,
    next_id: AtomicU64,
    journal: Option<Arc<HoldJournal>>,
}

impl Namespace {
    /// Create an empty namespace with an unnamed container root.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create an empty namespace that records every node hold in `journal`.
    pub fn with_journal(journal: Arc<HoldJournal>) -> Self {
        Self::build(Some(journal))
    }

    fn build(journal: Option<Arc<HoldJournal>>) -> Self {
        let root = Node::new(NodeId::new(0), None, NodeKind::Container, None, journal.clone());
        Self {
            root,
            lock: Arc::new(TreeLock::new()),
            next_id: AtomicU64::new(1),
            journal,
        }
    }

    /// Root node of the tree.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The tree-wide lock.
    pub fn lock(&self) -> &Arc<TreeLock> {
        &self.lock
    }

    /// Hold journal, if this namespace records one.
    pub fn journal(&self) -> Option<&Arc<HoldJournal>> {
        self.journal.as_ref()
    }

    /// Insert a named node under `parent`.
    pub fn insert(
        &self,
        parent: &Node,
        name: impl Into<CompactString>,
        kind: NodeKind,
    ) -> Result<Node, WalkError> {
        self.insert_node(parent, Some(name.into()), kind)
    }

    /// Insert a synthetic, unnamed node under `parent`.
    pub fn insert_anonymous(&self, parent: &Node, kind: NodeKind) -> Result<Node, WalkError> {
        self.insert_node(parent, None, kind)
    }

    fn insert_node(
        &self,
        parent: &Node,
        name: Option<CompactString>,
        kind: NodeKind,
    ) -> Result<Node, WalkError> {
        let _guard = self.lock.lock();

        if !parent.is_container() {
            return Err(WalkError::NotAContainer { id: parent.id() });
        }
        if parent.is_removed() {
            return Err(WalkError::invalid_config(format!(
                "Parent node {} has been removed",
                parent.id()
            )));
        }

        let id = NodeId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let node = Node::new(id, name, kind, Some(parent), self.journal.clone());
        parent.attach(node.clone());
        Ok(node)
    }

    /// Detach `node` and its subtree, dropping the namespace's references.
    ///
    /// Every parent-child link in the subtree is cut, so a removed node that
    /// is still held elsewhere has no children left to enumerate. Held nodes
    /// remain valid until their last release.
    pub fn remove(&self, node: &Node) -> Result<(), WalkError> {
        if node.ptr_eq(&self.root) {
            return Err(WalkError::invalid_config("The root node cannot be removed"));
        }

        let _guard = self.lock.lock();
        if node.is_removed() {
            return Ok(());
        }
        if let Some(parent) = node.parent() {
            parent.detach(node.id());
        }

        let mut pending = vec![node.clone()];
        while let Some(current) = pending.pop() {
            pending.extend(current.detach_all());
            current.mark_removed();
            current.put_ref();
        }
        Ok(())
    }

    /// Resolve a `/`-separated path of names starting at the root.
    ///
    /// The empty path and `/` resolve to the root itself.
    pub fn find(&self, path: &str) -> Option<Node> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.root.clone(), |node, segment| node.child_named(segment))
    }

    /// Number of nodes in the tree, root included.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self.root.clone()];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children());
        }
        count
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hold::Hold;

    #[test]
    fn test_insert_and_find() {
        let ns = Namespace::new();
        let bus = ns.insert(ns.root(), "bus", NodeKind::Container).unwrap();
        let pci = ns.insert(&bus, "pci", NodeKind::Container).unwrap();
        ns.insert(&pci, "uevent", NodeKind::Leaf).unwrap();

        assert_eq!(ns.node_count(), 4);
        assert!(ns.find("/bus/pci").unwrap().ptr_eq(&pci));
        assert!(ns.find("bus/pci/uevent").is_some());
        assert!(ns.find("/").unwrap().ptr_eq(ns.root()));
        assert!(ns.find("/bus/usb").is_none());
        assert!(pci.parent().unwrap().ptr_eq(&bus));
    }

    #[test]
    fn test_insert_under_leaf_fails() {
        let ns = Namespace::new();
        let leaf = ns.insert(ns.root(), "file", NodeKind::Leaf).unwrap();
        let err = ns.insert(&leaf, "child", NodeKind::Leaf).unwrap_err();
        assert!(matches!(err, WalkError::NotAContainer { .. }));
    }

    #[test]
    fn test_removed_node_survives_while_held() {
        let ns = Namespace::new();
        let dir = ns.insert(ns.root(), "dir", NodeKind::Container).unwrap();
        let leaf = ns.insert(&dir, "leaf", NodeKind::Leaf).unwrap();

        let held = Hold::acquire(&leaf);
        ns.remove(&dir).unwrap();

        assert!(ns.find("/dir").is_none());
        assert!(!dir.is_alive());
        assert!(leaf.is_removed());
        assert!(leaf.is_alive());
        assert_eq!(held.name(), Some("leaf"));

        held.release();
        assert!(!leaf.is_alive());
    }

    #[test]
    fn test_remove_unlinks_whole_subtree() {
        let ns = Namespace::new();
        let dir = ns.insert(ns.root(), "dir", NodeKind::Container).unwrap();
        let sub = ns.insert(&dir, "sub", NodeKind::Container).unwrap();
        let leaf = ns.insert(&sub, "leaf", NodeKind::Leaf).unwrap();

        let held = Hold::acquire(&dir);
        ns.remove(&dir).unwrap();

        assert!(held.is_alive());
        assert_eq!(held.child_count(), 0);
        assert_eq!(sub.child_count(), 0);
        assert!(!sub.is_alive());
        assert!(!leaf.is_alive());
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let ns = Namespace::new();
        assert!(ns.remove(ns.root()).is_err());
    }

    #[test]
    fn test_insert_is_blocked_while_locked() {
        let ns = Namespace::new();
        let guard = ns.lock().lock();
        assert!(ns.lock().try_lock().is_none());
        drop(guard);
        assert!(ns.insert(ns.root(), "after", NodeKind::Leaf).is_ok());
    }
}
