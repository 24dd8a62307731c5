//! Core types for kernwalk.
//!
//! This crate provides the namespace model walked by the engine: nodes and
//! their owning tree, top-level member collections, reference holds, the
//! tree-wide lock, symbol resolution and configuration.

mod collection;
mod config;
mod error;
mod hold;
mod lock;
mod node;
mod symbols;
mod tree;

pub use collection::{Collection, Member};
pub use config::{
    DEFAULT_COLLECTION_SYMBOL, DEFAULT_LOCK_SYMBOL, DEFAULT_ROOT_SYMBOL, WalkConfig,
    WalkConfigBuilder,
};
pub use error::{VisitError, WalkError, WalkWarning, WarningKind};
pub use hold::{HeldNode, Hold, HoldEvent, HoldJournal, RefCount, RefCounted};
pub use lock::{TreeLock, TreeLockGuard};
pub use node::{Node, NodeId, NodeKind, WeakNode};
pub use symbols::{Address, AddressResolver, SymbolTable};
pub use tree::Namespace;
