//! Anchor discovery in a top-level collection.

use std::sync::Arc;

use tracing::{debug, warn};

use kernwalk_core::{Collection, HeldNode, Hold, WalkWarning};

/// Outcome of scanning a collection for an anchor.
#[derive(Debug, Default)]
pub struct AnchorScan {
    /// Held parent of the first qualifying member.
    pub anchor: Option<HeldNode>,
    /// Members skipped because they were not initialized.
    pub skipped: Vec<WalkWarning>,
}

/// Finds the node a walk should start from.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorLocator;

impl AnchorLocator {
    /// Return the parent of the first initialized, named member whose parent
    /// relation resolves to a live node.
    ///
    /// `None` means there is nothing to walk, not an error.
    pub fn locate(collection: &Arc<Collection>) -> Option<HeldNode> {
        Self::scan(collection).anchor
    }

    /// Like [`locate`](Self::locate), also reporting skipped members.
    ///
    /// The member list lock is held only for the linear scan. Each member is
    /// held while its relations are inspected, and the anchor is acquired
    /// before that member is released, so a concurrent removal can never hand
    /// back a node that was already torn down.
    pub fn scan(collection: &Arc<Collection>) -> AnchorScan {
        let _collection = Hold::acquire(collection);
        let mut scan = AnchorScan::default();
        let members = collection.members();

        for member in members.iter() {
            if !member.is_initialized() {
                let name = member.name().unwrap_or("<anon>");
                warn!(collection = collection.name(), member = name, "member was not initialized");
                scan.skipped.push(WalkWarning::uninitialized_member(name));
                continue;
            }

            let Some(held) = Hold::try_acquire(member) else {
                continue;
            };
            if held.name().is_some_and(|name| !name.is_empty()) {
                scan.anchor = held.parent().and_then(|parent| Hold::try_acquire(&parent));
            }
            held.release();

            if scan.anchor.is_some() {
                break;
            }
        }
        drop(members);

        match &scan.anchor {
            Some(anchor) => debug!(
                collection = collection.name(),
                anchor = %anchor.id(),
                name = anchor.display_name(),
                "anchor located"
            ),
            None => debug!(collection = collection.name(), "no anchor in collection"),
        }
        scan
    }
}
