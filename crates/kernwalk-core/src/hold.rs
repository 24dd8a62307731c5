//! Reference holds.
//!
//! Every object owned by the namespace carries a [`RefCount`]. A [`Hold`]
//! increments it on acquisition and decrements it when released or dropped,
//! so the object cannot be torn down by its owner while the hold exists.
//! Holds taken in a nested scope are released before the enclosing ones,
//! which gives the walker its child-before-parent release order for free.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::node::{Node, NodeId};

/// Atomic reference counter shared by nodes, members and collections.
#[derive(Debug)]
pub struct RefCount(AtomicUsize);

impl RefCount {
    /// Create a counter with an initial value.
    pub fn new(initial: usize) -> Self {
        Self(AtomicUsize::new(initial))
    }

    /// Increment the counter.
    pub fn get(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }

    /// Increment the counter unless it is zero. Returns whether it did.
    pub fn get_unless_zero(&self) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n > 0).then(|| n + 1)
            })
            .is_ok()
    }

    /// Decrement the counter. Returns `false` if it was already zero.
    pub fn put(&self) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Current value.
    pub fn count(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Objects whose lifetime is governed by an explicit reference count.
pub trait RefCounted {
    /// Take a reference.
    fn get_ref(&self);

    /// Take a reference only if the object is still alive.
    fn try_get_ref(&self) -> bool;

    /// Drop a reference.
    fn put_ref(&self);

    /// Current number of references.
    fn ref_count(&self) -> usize;
}

/// A scoped reference on `T`, released on drop.
///
/// [`Hold::acquire`] never blocks and never fails.
#[must_use = "dropping a hold releases it immediately"]
#[derive(Debug)]
pub struct Hold<T: RefCounted> {
    target: T,
}

/// A held namespace node.
pub type HeldNode = Hold<Node>;

impl<T: RefCounted + Clone> Hold<T> {
    /// Take a reference on `target`.
    pub fn acquire(target: &T) -> Self {
        target.get_ref();
        Self {
            target: target.clone(),
        }
    }

    /// Take a reference on `target` unless its count already reached zero.
    pub fn try_acquire(target: &T) -> Option<Self> {
        target.try_get_ref().then(|| Self {
            target: target.clone(),
        })
    }
}

impl<T: RefCounted> Hold<T> {
    /// Release the reference now.
    pub fn release(self) {
        drop(self);
    }

    /// The held object.
    pub fn get(&self) -> &T {
        &self.target
    }
}

impl<T: RefCounted> Deref for Hold<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.target
    }
}

impl<T: RefCounted> Drop for Hold<T> {
    fn drop(&mut self) {
        self.target.put_ref();
    }
}

/// Acquire or release of a node reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldEvent {
    Acquire(NodeId),
    Release(NodeId),
}

/// Append-only audit log of node hold events.
///
/// Attached to a [`Namespace`](crate::Namespace) at construction time; every
/// node created by that namespace records its acquires and releases here.
#[derive(Debug, Default)]
pub struct HoldJournal {
    events: Mutex<Vec<HoldEvent>>,
}

impl HoldJournal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record(&self, event: HoldEvent) {
        self.events.lock().push(event);
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<HoldEvent> {
        self.events.lock().clone()
    }

    /// Forget all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Check that the recorded events form a properly nested sequence:
    /// every release matches the most recent unreleased acquire.
    pub fn is_balanced(&self) -> bool {
        let events = self.events.lock();
        let mut stack = Vec::new();
        for event in events.iter() {
            match *event {
                HoldEvent::Acquire(id) => stack.push(id),
                HoldEvent::Release(id) => {
                    if stack.pop() != Some(id) {
                        return false;
                    }
                }
            }
        }
        stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, Default)]
    struct Counted(Arc<RefCount>);

    impl RefCounted for Counted {
        fn get_ref(&self) {
            self.0.get();
        }

        fn try_get_ref(&self) -> bool {
            self.0.get_unless_zero()
        }

        fn put_ref(&self) {
            self.0.put();
        }

        fn ref_count(&self) -> usize {
            self.0.count()
        }
    }

    #[test]
    fn test_hold_increments_and_releases() {
        let obj = Counted::default();
        assert_eq!(obj.ref_count(), 1);

        let hold = Hold::acquire(&obj);
        assert_eq!(obj.ref_count(), 2);
        assert_eq!(hold.ref_count(), 2);

        hold.release();
        assert_eq!(obj.ref_count(), 1);
    }

    #[test]
    fn test_try_acquire_refuses_dead_object() {
        let obj = Counted::default();
        obj.put_ref();
        assert!(Hold::try_acquire(&obj).is_none());
        assert_eq!(obj.ref_count(), 0);
    }

    #[test]
    fn test_put_saturates_at_zero() {
        let count = RefCount::new(1);
        assert!(count.put());
        assert!(!count.put());
        assert_eq!(count.count(), 0);
    }

    #[test]
    fn test_journal_balance() {
        let journal = HoldJournal::new();
        journal.record(HoldEvent::Acquire(NodeId::new(1)));
        journal.record(HoldEvent::Acquire(NodeId::new(2)));
        journal.record(HoldEvent::Release(NodeId::new(2)));
        journal.record(HoldEvent::Release(NodeId::new(1)));
        assert!(journal.is_balanced());

        journal.clear();
        journal.record(HoldEvent::Acquire(NodeId::new(1)));
        journal.record(HoldEvent::Acquire(NodeId::new(2)));
        journal.record(HoldEvent::Release(NodeId::new(1)));
        assert!(!journal.is_balanced());
    }
}
