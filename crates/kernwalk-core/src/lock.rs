//! The tree-wide lock.

use parking_lot::{Mutex, MutexGuard};

/// Single global lock serializing traversals and mutations of a namespace.
///
/// Not reentrant: code running under a [`TreeLockGuard`] (including visitors)
/// must not call namespace mutators, which take this lock themselves.
#[derive(Debug, Default)]
pub struct TreeLock {
    inner: Mutex<()>,
}

impl TreeLock {
    /// Create an unlocked tree lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock is acquired.
    pub fn lock(&self) -> TreeLockGuard<'_> {
        TreeLockGuard {
            _guard: self.inner.lock(),
            lock: self,
        }
    }

    /// Acquire the lock if it is free.
    pub fn try_lock(&self) -> Option<TreeLockGuard<'_>> {
        self.inner.try_lock().map(|guard| TreeLockGuard {
            _guard: guard,
            lock: self,
        })
    }

    /// Whether some thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

/// Proof that the tree-wide lock is held. Unlocks on drop.
#[must_use = "dropping the guard unlocks the tree immediately"]
pub struct TreeLockGuard<'a> {
    _guard: MutexGuard<'a, ()>,
    lock: &'a TreeLock,
}

impl std::fmt::Debug for TreeLockGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeLockGuard")
            .field("lock", &(self.lock as *const TreeLock))
            .finish()
    }
}
