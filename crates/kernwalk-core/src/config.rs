//! Walk configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default symbol under which the tree root is registered.
pub const DEFAULT_ROOT_SYMBOL: &str = "namespace_root";
/// Default symbol under which the tree-wide lock is registered.
pub const DEFAULT_LOCK_SYMBOL: &str = "namespace_mutex";
/// Default symbol under which the top-level collection is registered.
pub const DEFAULT_COLLECTION_SYMBOL: &str = "module_collection";

/// Configuration for a driver run.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct WalkConfig {
    /// Symbol resolving to the tree root.
    #[builder(default = "DEFAULT_ROOT_SYMBOL.to_string()")]
    #[serde(default = "default_root_symbol")]
    pub root_symbol: String,

    /// Symbol resolving to the tree-wide lock.
    #[builder(default = "DEFAULT_LOCK_SYMBOL.to_string()")]
    #[serde(default = "default_lock_symbol")]
    pub lock_symbol: String,

    /// Symbol resolving to the top-level collection.
    #[builder(default = "DEFAULT_COLLECTION_SYMBOL.to_string()")]
    #[serde(default = "default_collection_symbol")]
    pub collection_symbol: String,

    /// Depth reported for the anchor's direct children.
    #[builder(default = "1")]
    #[serde(default = "default_start_depth")]
    pub start_depth: u32,

    /// Deepest depth at which a node may be acquired and visited
    /// (None = unlimited). Reaching any node past it fails the walk.
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,
}

fn default_root_symbol() -> String {
    DEFAULT_ROOT_SYMBOL.to_string()
}

fn default_lock_symbol() -> String {
    DEFAULT_LOCK_SYMBOL.to_string()
}

fn default_collection_symbol() -> String {
    DEFAULT_COLLECTION_SYMBOL.to_string()
}

fn default_start_depth() -> u32 {
    1
}

impl WalkConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let symbols = [
            ("root_symbol", &self.root_symbol),
            ("lock_symbol", &self.lock_symbol),
            ("collection_symbol", &self.collection_symbol),
        ];
        for (field, value) in symbols {
            if value.as_ref().is_some_and(|s| s.is_empty()) {
                return Err(format!("{field} cannot be empty"));
            }
        }
        Ok(())
    }
}

impl WalkConfig {
    /// Create a new walk config builder.
    pub fn builder() -> WalkConfigBuilder {
        WalkConfigBuilder::default()
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            root_symbol: default_root_symbol(),
            lock_symbol: default_lock_symbol(),
            collection_symbol: default_collection_symbol(),
            start_depth: default_start_depth(),
            max_depth: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = WalkConfig::builder()
            .root_symbol("sysfs_root")
            .max_depth(Some(8))
            .build()
            .unwrap();

        assert_eq!(config.root_symbol, "sysfs_root");
        assert_eq!(config.lock_symbol, DEFAULT_LOCK_SYMBOL);
        assert_eq!(config.start_depth, 1);
        assert_eq!(config.max_depth, Some(8));
    }

    #[test]
    fn test_empty_symbol_rejected() {
        let result = WalkConfig::builder().lock_symbol("").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config: WalkConfig = serde_json::from_str(r#"{"max_depth": 3}"#).unwrap();
        assert_eq!(config.collection_symbol, DEFAULT_COLLECTION_SYMBOL);
        assert_eq!(config.max_depth, Some(3));
        assert_eq!(config, WalkConfig { max_depth: Some(3), ..WalkConfig::default() });
    }
}
