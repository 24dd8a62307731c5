//! Resolution of named global objects.

use std::collections::HashMap;
use std::sync::Arc;

use compact_str::CompactString;

use crate::collection::Collection;
use crate::config::WalkConfig;
use crate::lock::TreeLock;
use crate::node::Node;
use crate::tree::Namespace;

/// Location of a named global object.
#[derive(Debug, Clone)]
pub enum Address {
    Node(Node),
    Lock(Arc<TreeLock>),
    Collection(Arc<Collection>),
}

/// Resolves symbolic names to global objects.
pub trait AddressResolver {
    /// Look up `name`. Returns `None` if the name is unknown.
    fn resolve(&self, name: &str) -> Option<Address>;

    /// Look up a node symbol. A name bound to another kind of object is
    /// treated as unknown.
    fn resolve_node(&self, name: &str) -> Option<Node> {
        match self.resolve(name)? {
            Address::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Look up a lock symbol.
    fn resolve_lock(&self, name: &str) -> Option<Arc<TreeLock>> {
        match self.resolve(name)? {
            Address::Lock(lock) => Some(lock),
            _ => None,
        }
    }

    /// Look up a collection symbol.
    fn resolve_collection(&self, name: &str) -> Option<Arc<Collection>> {
        match self.resolve(name)? {
            Address::Collection(collection) => Some(collection),
            _ => None,
        }
    }
}

/// Map-backed [`AddressResolver`].
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<CompactString, Address>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the root, lock and collection of a namespace under the
    /// names configured in `config`.
    pub fn for_namespace(
        namespace: &Namespace,
        collection: &Arc<Collection>,
        config: &WalkConfig,
    ) -> Self {
        let mut table = Self::new();
        table.insert(&config.root_symbol, Address::Node(namespace.root().clone()));
        table.insert(&config.lock_symbol, Address::Lock(Arc::clone(namespace.lock())));
        table.insert(
            &config.collection_symbol,
            Address::Collection(Arc::clone(collection)),
        );
        table
    }

    /// Bind `name` to `address`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<CompactString>, address: Address) {
        self.symbols.insert(name.into(), address);
    }

    /// Remove a binding.
    pub fn remove(&mut self, name: &str) -> Option<Address> {
        self.symbols.remove(name)
    }

    /// Number of bound symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if no symbols are bound.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl AddressResolver for SymbolTable {
    fn resolve(&self, name: &str) -> Option<Address> {
        self.symbols.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_namespace_registers_three_symbols() {
        let ns = Namespace::new();
        let collection = Arc::new(Collection::new("modules"));
        let config = WalkConfig::default();
        let table = SymbolTable::for_namespace(&ns, &collection, &config);

        assert_eq!(table.len(), 3);
        assert!(table.resolve_node(&config.root_symbol).unwrap().ptr_eq(ns.root()));
        assert!(table.resolve_lock(&config.lock_symbol).is_some());
        assert!(table.resolve_collection(&config.collection_symbol).is_some());
    }

    #[test]
    fn test_wrong_kind_is_unknown() {
        let ns = Namespace::new();
        let mut table = SymbolTable::new();
        table.insert("root", Address::Lock(Arc::clone(ns.lock())));

        assert!(table.resolve("root").is_some());
        assert!(table.resolve_node("root").is_none());
        assert!(table.resolve_node("missing").is_none());
    }
}
