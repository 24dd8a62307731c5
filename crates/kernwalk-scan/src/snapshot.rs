//! JSON namespace snapshots.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use kernwalk_core::{
    Collection, Member, Namespace, Node, NodeKind, SymbolTable, WalkConfig, WalkError,
};

/// A node and its subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Node name; omitted for synthetic nodes.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_kind")]
    pub kind: NodeKind,

    #[serde(default)]
    pub children: Vec<NodeSnapshot>,
}

fn default_kind() -> NodeKind {
    NodeKind::Container
}

/// A collection member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSnapshot {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_true")]
    pub initialized: bool,

    /// `/`-separated path of the member's parent node, from the root.
    #[serde(default)]
    pub parent: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Serialized namespace: the root's children plus the top-level collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceSnapshot {
    /// Name of the top-level collection.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Children of the (unnamed) root node.
    #[serde(default)]
    pub nodes: Vec<NodeSnapshot>,

    /// Collection members, in registration order.
    #[serde(default)]
    pub members: Vec<MemberSnapshot>,
}

fn default_collection() -> String {
    "modules".to_string()
}

/// A populated namespace and its top-level collection.
#[derive(Debug)]
pub struct LoadedNamespace {
    pub namespace: Namespace,
    pub collection: Arc<Collection>,
}

impl LoadedNamespace {
    /// Symbol table exposing this namespace under the configured names.
    pub fn symbols(&self, config: &WalkConfig) -> SymbolTable {
        SymbolTable::for_namespace(&self.namespace, &self.collection, config)
    }
}

impl NamespaceSnapshot {
    /// Parse a snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Self, WalkError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WalkError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| WalkError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Build a live namespace from this snapshot.
    ///
    /// Siblings receive structural keys in document order.
    pub fn build(&self) -> Result<LoadedNamespace, WalkError> {
        self.build_into(Namespace::new())
    }

    /// Build into a caller-supplied empty namespace (e.g. one with a journal).
    pub fn build_into(&self, namespace: Namespace) -> Result<LoadedNamespace, WalkError> {
        let mut pending: Vec<(Node, &[NodeSnapshot])> =
            vec![(namespace.root().clone(), self.nodes.as_slice())];

        while let Some((parent, nodes)) = pending.pop() {
            for snap in nodes {
                let node = match &snap.name {
                    Some(name) => namespace.insert(&parent, name.as_str(), snap.kind)?,
                    None => namespace.insert_anonymous(&parent, snap.kind)?,
                };
                if !snap.children.is_empty() {
                    pending.push((node, snap.children.as_slice()));
                }
            }
        }

        let collection = Arc::new(Collection::new(self.collection.as_str()));
        for snap in &self.members {
            let mut member = match &snap.name {
                Some(name) => Member::new(name.as_str()),
                None => Member::anonymous(),
            }
            .with_initialized(snap.initialized);

            if let Some(path) = &snap.parent {
                let parent = namespace.find(path).ok_or_else(|| {
                    WalkError::invalid_config(format!("Unknown member parent path: {path}"))
                })?;
                member = member.with_parent(&parent);
            }
            collection.add(member);
        }

        Ok(LoadedNamespace {
            namespace,
            collection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "collection": "modules",
        "nodes": [
            {"name": "module", "children": [
                {"name": "ext4", "children": [
                    {"name": "refcnt", "kind": "leaf"},
                    {"kind": "leaf"}
                ]},
                {"name": "loop"}
            ]},
            {"name": "kernel"}
        ],
        "members": [
            {"name": "early", "initialized": false},
            {"name": "ext4", "parent": "/module"}
        ]
    }"#;

    #[test]
    fn test_build_from_json() {
        let loaded = NamespaceSnapshot::from_json(SAMPLE).unwrap().build().unwrap();
        let ns = &loaded.namespace;

        assert_eq!(ns.node_count(), 7);
        assert_eq!(ns.find("/module/ext4").unwrap().child_count(), 2);
        assert!(!ns.find("/module/ext4/refcnt").unwrap().is_container());
        assert!(ns.find("/kernel").unwrap().is_container());

        assert_eq!(loaded.collection.name(), "modules");
        assert_eq!(loaded.collection.len(), 2);
    }

    #[test]
    fn test_sibling_keys_follow_document_order() {
        let loaded = NamespaceSnapshot::from_json(SAMPLE).unwrap().build().unwrap();
        let names: Vec<_> = loaded
            .namespace
            .root()
            .children()
            .iter()
            .map(|n| n.display_name().to_string())
            .collect();
        assert_eq!(names, vec!["module", "kernel"]);
    }

    #[test]
    fn test_unknown_parent_path() {
        let json = r#"{"members": [{"name": "x", "parent": "/nowhere"}]}"#;
        let err = NamespaceSnapshot::from_json(json).unwrap().build().unwrap_err();
        assert!(matches!(err, WalkError::InvalidConfig { .. }));
    }

    #[test]
    fn test_children_under_leaf_rejected() {
        let json = r#"{"nodes": [{"name": "f", "kind": "leaf", "children": [{"name": "x"}]}]}"#;
        let err = NamespaceSnapshot::from_json(json).unwrap().build().unwrap_err();
        assert!(matches!(err, WalkError::NotAContainer { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = NamespaceSnapshot::from_json("{").unwrap_err();
        assert!(matches!(err, WalkError::Snapshot { .. }));
    }
}
