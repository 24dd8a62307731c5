//! Top-level member registries.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use compact_str::CompactString;
use parking_lot::{Mutex, MutexGuard};

use crate::hold::{RefCount, RefCounted};
use crate::node::{Node, WeakNode};

/// An object registered in a [`Collection`].
#[derive(Debug)]
pub struct Member {
    name: Option<CompactString>,
    initialized: AtomicBool,
    parent: Option<WeakNode>,
    refs: RefCount,
}

impl Member {
    /// Create an initialized member with no parent.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: Some(name.into()),
            initialized: AtomicBool::new(true),
            parent: None,
            refs: RefCount::default(),
        }
    }

    /// Create a member that has not finished initialization.
    pub fn uninitialized(name: impl Into<CompactString>) -> Self {
        Self::new(name).with_initialized(false)
    }

    /// Create an initialized member without a name.
    pub fn anonymous() -> Self {
        Self {
            name: None,
            ..Self::new("")
        }
    }

    /// Set the initialization state.
    pub fn with_initialized(self, initialized: bool) -> Self {
        self.initialized.store(initialized, Ordering::Release);
        self
    }

    /// Relate this member to a node in the tree.
    pub fn with_parent(mut self, parent: &Node) -> Self {
        self.parent = Some(parent.downgrade());
        self
    }

    /// Member name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the member finished initialization.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Mark the member as fully initialized.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    /// The live parent node, if any.
    ///
    /// Always `None` for uninitialized members: their relations are not
    /// meaningful yet.
    pub fn parent(&self) -> Option<Node> {
        if !self.is_initialized() {
            return None;
        }
        self.parent.as_ref().and_then(WeakNode::upgrade)
    }
}

impl RefCounted for Arc<Member> {
    fn get_ref(&self) {
        self.refs.get();
    }

    fn try_get_ref(&self) -> bool {
        self.refs.get_unless_zero()
    }

    fn put_ref(&self) {
        self.refs.put();
    }

    fn ref_count(&self) -> usize {
        self.refs.count()
    }
}

/// Owning registry of top-level members.
///
/// The member list is guarded by its own short-lived lock, independent of
/// the tree-wide lock.
#[derive(Debug)]
pub struct Collection {
    name: CompactString,
    members: Mutex<Vec<Arc<Member>>>,
    refs: RefCount,
}

impl Collection {
    /// Create an empty collection.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            members: Mutex::new(Vec::new()),
            refs: RefCount::default(),
        }
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a member at the end of the list.
    pub fn add(&self, member: Member) -> Arc<Member> {
        let member = Arc::new(member);
        self.members.lock().push(Arc::clone(&member));
        member
    }

    /// Unregister the first member with the given name.
    pub fn remove(&self, name: &str) -> Option<Arc<Member>> {
        let mut members = self.members.lock();
        let pos = members.iter().position(|m| m.name() == Some(name))?;
        let member = members.remove(pos);
        member.put_ref();
        Some(member)
    }

    /// Lock the member list for a scan.
    pub fn members(&self) -> MutexGuard<'_, Vec<Arc<Member>>> {
        self.members.lock()
    }

    /// Number of registered members.
    pub fn len(&self) -> usize {
        self.members.lock().len()
    }

    /// Check if no members are registered.
    pub fn is_empty(&self) -> bool {
        self.members.lock().is_empty()
    }
}

impl RefCounted for Arc<Collection> {
    fn get_ref(&self) {
        self.refs.get();
    }

    fn try_get_ref(&self) -> bool {
        self.refs.get_unless_zero()
    }

    fn put_ref(&self) {
        self.refs.put();
    }

    fn ref_count(&self) -> usize {
        self.refs.count()
    }
}
