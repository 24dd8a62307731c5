//! Mirror a live directory tree into a namespace using jwalk.
//!
//! Directories become containers and every other entry becomes a leaf.
//! Entries directly under the collection directory are registered as
//! collection members whose parent is that directory's node, the way a
//! module registry relates to `/sys/module`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use derive_builder::Builder;
use jwalk::{Parallelism, WalkDir};
use tracing::{debug, warn};

use kernwalk_core::{Collection, Member, Namespace, Node, NodeKind, WalkError, WalkWarning};

use crate::snapshot::LoadedNamespace;

/// Configuration for loading a directory tree.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct LoadConfig {
    /// Directory mirrored as the namespace root.
    pub root: PathBuf,

    /// Directory, relative to `root`, whose entries become collection members.
    #[builder(default = "PathBuf::from(\"module\")")]
    pub collection_dir: PathBuf,

    /// Name given to the collection.
    #[builder(default = "\"modules\".to_string()")]
    pub collection_name: String,

    /// Maximum depth to mirror (None = unlimited).
    #[builder(default)]
    pub max_depth: Option<u32>,

    /// Number of reader threads (0 = auto-detect).
    #[builder(default = "0")]
    pub threads: usize,
}

impl LoadConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match &self.root {
            Some(root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl LoadConfig {
    /// Create a new load config builder.
    pub fn builder() -> LoadConfigBuilder {
        LoadConfigBuilder::default()
    }

    /// Mirror `root` with default settings.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            collection_dir: PathBuf::from("module"),
            collection_name: "modules".to_string(),
            max_depth: None,
            threads: 0,
        }
    }
}

/// A mirrored directory tree.
#[derive(Debug)]
pub struct LoadedDirectory {
    pub loaded: LoadedNamespace,
    /// Entries that could not be read.
    pub warnings: Vec<WalkWarning>,
}

/// Loads directory trees into namespaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryLoader;

impl DirectoryLoader {
    /// Create a new loader.
    pub fn new() -> Self {
        Self
    }

    /// Mirror the configured directory into a fresh namespace.
    pub fn load(&self, config: &LoadConfig) -> Result<LoadedDirectory, WalkError> {
        self.load_into(config, Namespace::new())
    }

    /// Mirror the configured directory into a caller-supplied empty namespace.
    pub fn load_into(
        &self,
        config: &LoadConfig,
        namespace: Namespace,
    ) -> Result<LoadedDirectory, WalkError> {
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| WalkError::io(&config.root, e))?;
        if !root_path.is_dir() {
            return Err(WalkError::invalid_config(format!(
                "Root path is not a directory: {}",
                root_path.display()
            )));
        }

        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: std::time::Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(&root_path)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .min_depth(1)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX));

        let mut nodes: HashMap<PathBuf, Node> = HashMap::new();
        nodes.insert(root_path.clone(), namespace.root().clone());
        let mut warnings = Vec::new();

        // Parents are yielded before their contents
        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!(path = %path.display(), error = %err, "unreadable entry");
                    warnings.push(WalkWarning::read_error(&path, &err));
                    continue;
                }
            };

            let path = entry.path();
            let Some(parent) = path.parent().and_then(|p| nodes.get(p)) else {
                continue;
            };

            let kind = if entry.file_type().is_dir() {
                NodeKind::Container
            } else {
                NodeKind::Leaf
            };
            let name = entry.file_name().to_string_lossy().to_string();
            let node = namespace.insert(parent, name, kind)?;
            if kind.is_container() {
                nodes.insert(path, node);
            }
        }

        let collection = Arc::new(Collection::new(config.collection_name.as_str()));
        match nodes.get(&root_path.join(&config.collection_dir)) {
            Some(dir) => {
                for child in dir.children() {
                    collection.add(Member::new(child.display_name()).with_parent(dir));
                }
            }
            None => warn!(
                dir = %config.collection_dir.display(),
                "collection directory not found, collection is empty"
            ),
        }

        debug!(
            root = %root_path.display(),
            nodes = namespace.node_count(),
            members = collection.len(),
            warnings = warnings.len(),
            "directory mirrored"
        );

        Ok(LoadedDirectory {
            loaded: LoadedNamespace {
                namespace,
                collection,
            },
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let module = dir.path().join("module");
        fs::create_dir_all(module.join("ext4/parameters")).unwrap();
        fs::create_dir_all(module.join("loop")).unwrap();
        fs::write(module.join("ext4/refcnt"), "0\n").unwrap();
        fs::write(module.join("ext4/parameters/debug"), "N\n").unwrap();
        fs::create_dir_all(dir.path().join("kernel")).unwrap();
        dir
    }

    #[test]
    fn test_load_mirrors_tree() {
        let dir = create_test_tree();
        let loaded = DirectoryLoader::new().load(&LoadConfig::new(dir.path())).unwrap();
        let ns = &loaded.loaded.namespace;

        // root + kernel + module + ext4 + parameters + debug + refcnt + loop
        assert_eq!(ns.node_count(), 8);
        assert!(ns.find("/module/ext4/parameters").unwrap().is_container());
        assert!(!ns.find("/module/ext4/refcnt").unwrap().is_container());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_collection_members_point_at_collection_dir() {
        let dir = create_test_tree();
        let loaded = DirectoryLoader::new().load(&LoadConfig::new(dir.path())).unwrap();
        let module = loaded.loaded.namespace.find("/module").unwrap();

        let members = loaded.loaded.collection.members();
        let names: Vec<_> = members.iter().filter_map(|m| m.name()).collect();
        assert_eq!(names, vec!["ext4", "loop"]);
        assert!(members.iter().all(|m| m.parent().is_some_and(|p| p.ptr_eq(&module))));
    }

    #[test]
    fn test_missing_collection_dir() {
        let dir = create_test_tree();
        let config = LoadConfig::builder()
            .root(dir.path())
            .collection_dir("bus")
            .build()
            .unwrap();
        let loaded = DirectoryLoader::new().load(&config).unwrap();
        assert!(loaded.loaded.collection.is_empty());
    }

    #[test]
    fn test_max_depth() {
        let dir = create_test_tree();
        let config = LoadConfig::builder()
            .root(dir.path())
            .max_depth(Some(2))
            .build()
            .unwrap();
        let loaded = DirectoryLoader::new().load(&config).unwrap();
        assert!(loaded.loaded.namespace.find("/module/ext4").is_some());
        assert!(loaded.loaded.namespace.find("/module/ext4/refcnt").is_none());
    }

    #[test]
    fn test_root_is_required() {
        assert!(LoadConfig::builder().build().is_err());
    }

    #[test]
    fn test_nonexistent_root() {
        let err = DirectoryLoader::new()
            .load(&LoadConfig::new("/nonexistent/kernwalk/root"))
            .unwrap_err();
        assert!(matches!(err, WalkError::Io { .. }));
    }
}
