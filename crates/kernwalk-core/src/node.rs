//! Namespace node types.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use compact_str::CompactString;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::hold::{HoldEvent, HoldJournal, RefCount, RefCounted};

/// Structural key of a node, assigned in insertion order.
///
/// Siblings are always enumerated in ascending id order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Create a new NodeId from a u64.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type of namespace node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NodeKind {
    /// Can have children.
    Container,
    /// Terminal entry.
    Leaf,
}

impl NodeKind {
    /// Check if this kind can have children.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Container)
    }
}

struct NodeInner {
    id: NodeId,
    name: Option<CompactString>,
    kind: NodeKind,
    parent: Weak<NodeInner>,
    children: RwLock<BTreeMap<NodeId, Node>>,
    refs: RefCount,
    removed: AtomicBool,
    journal: Option<Arc<HoldJournal>>,
}

impl Drop for NodeInner {
    // Unlink descendants iteratively so deep trees do not recurse on drop.
    fn drop(&mut self) {
        let mut pending: Vec<Node> = std::mem::take(self.children.get_mut())
            .into_values()
            .collect();
        while let Some(node) = pending.pop() {
            if let Ok(mut inner) = Arc::try_unwrap(node.0) {
                pending.extend(std::mem::take(inner.children.get_mut()).into_values());
            }
        }
    }
}

/// Handle to an entry in a [`Namespace`](crate::Namespace).
///
/// Cloning a handle does not take a reference. Only a [`Hold`](crate::Hold)
/// keeps the node logically alive; a node whose reference count dropped to
/// zero has been released by its owner and must not be inspected further.
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

impl Node {
    pub(crate) fn new(
        id: NodeId,
        name: Option<CompactString>,
        kind: NodeKind,
        parent: Option<&Node>,
        journal: Option<Arc<HoldJournal>>,
    ) -> Self {
        Self(Arc::new(NodeInner {
            id,
            name,
            kind,
            parent: parent.map(|p| Arc::downgrade(&p.0)).unwrap_or_default(),
            children: RwLock::new(BTreeMap::new()),
            refs: RefCount::default(),
            removed: AtomicBool::new(false),
            journal,
        }))
    }

    /// Structural key of this node.
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    /// Node name, absent for synthetic nodes.
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Node name, or `<anon>` for synthetic nodes.
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or("<anon>")
    }

    /// Node kind.
    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    /// Check if this node can have children.
    pub fn is_container(&self) -> bool {
        self.0.kind.is_container()
    }

    /// In-memory address of the node.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Parent node, if it still exists. Lookup only, confers no ownership.
    pub fn parent(&self) -> Option<Node> {
        self.0.parent.upgrade().map(Node)
    }

    /// Non-owning handle to this node.
    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Arc::downgrade(&self.0))
    }

    /// Children in structural-key order.
    pub fn children(&self) -> Vec<Node> {
        self.0.children.read().values().cloned().collect()
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.0.children.read().len()
    }

    /// First direct child with the given name.
    pub fn child_named(&self, name: &str) -> Option<Node> {
        self.0
            .children
            .read()
            .values()
            .find(|child| child.name() == Some(name))
            .cloned()
    }

    /// Whether the node still has references.
    pub fn is_alive(&self) -> bool {
        self.0.refs.count() > 0
    }

    /// Whether the owner has removed this node from the tree.
    pub fn is_removed(&self) -> bool {
        self.0.removed.load(Ordering::Acquire)
    }

    /// Whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn attach(&self, child: Node) {
        self.0.children.write().insert(child.id(), child);
    }

    pub(crate) fn detach(&self, id: NodeId) -> Option<Node> {
        self.0.children.write().remove(&id)
    }

    /// Unlink every child, returning them in structural-key order.
    pub(crate) fn detach_all(&self) -> Vec<Node> {
        std::mem::take(&mut *self.0.children.write())
            .into_values()
            .collect()
    }

    pub(crate) fn mark_removed(&self) {
        self.0.removed.store(true, Ordering::Release);
    }
}

impl RefCounted for Node {
    fn get_ref(&self) {
        self.0.refs.get();
        if let Some(journal) = &self.0.journal {
            journal.record(HoldEvent::Acquire(self.0.id));
        }
    }

    fn try_get_ref(&self) -> bool {
        if !self.0.refs.get_unless_zero() {
            return false;
        }
        if let Some(journal) = &self.0.journal {
            journal.record(HoldEvent::Acquire(self.0.id));
        }
        true
    }

    fn put_ref(&self) {
        if !self.0.refs.put() {
            tracing::error!(node = %self.0.id, "reference released on a dead node");
            return;
        }
        if let Some(journal) = &self.0.journal {
            journal.record(HoldEvent::Release(self.0.id));
        }
    }

    fn ref_count(&self) -> usize {
        self.0.refs.count()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("kind", &self.0.kind)
            .field("refs", &self.0.refs.count())
            .finish()
    }
}

/// Non-owning relation to a node, used for lookup only.
#[derive(Clone, Default)]
pub struct WeakNode(Weak<NodeInner>);

impl WeakNode {
    /// Resolve to a node if it still exists and has references.
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node).filter(Node::is_alive)
    }
}

impl std::fmt::Debug for WeakNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.upgrade() {
            Some(inner) => write!(f, "WeakNode({})", inner.id),
            None => f.write_str("WeakNode(<gone>)"),
        }
    }
}
