//! Namespace loading for kernwalk.
//!
//! Walks need a populated [`Namespace`] and a top-level [`Collection`].
//! This crate builds both from two sources:
//!
//! - **Snapshots** - [`NamespaceSnapshot`] reads a JSON description of a tree
//!   and its collection members
//! - **Directory trees** - [`DirectoryLoader`] mirrors a live directory via
//!   jwalk, registering the entries of one directory as collection members
//!
//! # Example
//!
//! ```rust,no_run
//! use kernwalk_scan::{DirectoryLoader, LoadConfig, WalkConfig};
//!
//! let loaded = DirectoryLoader::new().load(&LoadConfig::new("/sys")).unwrap();
//! let symbols = loaded.loaded.symbols(&WalkConfig::default());
//!
//! println!("Mirrored {} nodes", loaded.loaded.namespace.node_count());
//! println!("Resolvable symbols: {}", symbols.len());
//! ```

mod loader;
mod snapshot;

pub use loader::{DirectoryLoader, LoadConfig, LoadConfigBuilder, LoadedDirectory};
pub use snapshot::{LoadedNamespace, MemberSnapshot, NamespaceSnapshot, NodeSnapshot};

// Re-export core types for convenience
pub use kernwalk_core::{
    Collection, Namespace, NodeKind, SymbolTable, WalkConfig, WalkError, WalkWarning, WarningKind,
};
