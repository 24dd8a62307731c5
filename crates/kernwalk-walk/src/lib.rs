//! Traversal engine for kernwalk.
//!
//! This crate walks a live [`Namespace`] it does not own:
//!
//! - **Anchor discovery** - [`AnchorLocator`] scans a top-level collection
//!   under its list lock and returns the parent of the first usable member
//! - **Tree walking** - [`TreeWalker`] visits every descendant of the anchor
//!   depth-first while the tree-wide lock is held, each node under its own
//!   reference hold
//! - **Visitor protocol** - pluggable [`NodeFilter`] and [`NodeVisitor`]
//! - **Driver** - [`Driver`] resolves the global symbols and sequences the
//!   steps: resolve, validate, locate, lock, acquire, walk, release
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use kernwalk_walk::{
//!     AcceptAll, Collection, Driver, Member, Namespace, NodeKind, RecordingVisitor,
//!     SymbolTable, WalkConfig,
//! };
//!
//! let ns = Namespace::new();
//! let module = ns.insert(ns.root(), "module", NodeKind::Container).unwrap();
//! let ext4 = ns.insert(&module, "ext4", NodeKind::Container).unwrap();
//! ns.insert(&ext4, "refcnt", NodeKind::Leaf).unwrap();
//!
//! let collection = Arc::new(Collection::new("modules"));
//! collection.add(Member::new("ext4").with_parent(&module));
//!
//! let config = WalkConfig::default();
//! let driver = Driver::with_config(SymbolTable::for_namespace(&ns, &collection, &config), config);
//!
//! let recorder = RecordingVisitor::new();
//! let report = driver.run(&AcceptAll, &recorder).unwrap();
//!
//! assert_eq!(recorder.names(), vec!["ext4", "refcnt"]);
//! assert_eq!(report.summary.nodes_held, 2);
//! ```
//!
//! # Limitations
//!
//! A walk cannot be cancelled once started, and the visitor runs with the
//! tree-wide lock held.

mod anchor;
mod driver;
mod visitor;
mod walker;

pub use anchor::{AnchorLocator, AnchorScan};
pub use driver::{AnchorInfo, Driver, WalkReport};
pub use visitor::{AcceptAll, NodeFilter, NodeVisitor, PrintVisitor, RecordingVisitor, VisitRecord};
pub use walker::{TraversalContext, TreeWalker, WalkSummary};

// Re-export core types for convenience
pub use kernwalk_core::{
    Address, AddressResolver, Collection, HeldNode, Hold, HoldEvent, HoldJournal, Member,
    Namespace, Node, NodeId, NodeKind, RefCounted, SymbolTable, TreeLock, VisitError, WalkConfig, WalkError,
    WalkWarning, WarningKind,
};
