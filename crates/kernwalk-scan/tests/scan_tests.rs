use std::fs;
use std::sync::Arc;

use kernwalk_scan::{DirectoryLoader, LoadConfig, NamespaceSnapshot, WalkConfig, WarningKind};
use kernwalk_walk::{
    AcceptAll, Driver, HoldJournal, Namespace, PrintVisitor, RecordingVisitor, RefCounted,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const SNAPSHOT: &str = r#"{
    "nodes": [
        {"name": "module", "children": [
            {"name": "ext4", "children": [
                {"name": "parameters", "children": [{"name": "debug", "kind": "leaf"}]},
                {"name": "refcnt", "kind": "leaf"}
            ]},
            {"name": "loop", "children": [{"kind": "leaf"}]}
        ]}
    ],
    "members": [
        {"name": "early", "initialized": false, "parent": "/module"},
        {"name": "ext4", "parent": "/module"},
        {"name": "loop", "parent": "/module"}
    ]
}"#;

#[test]
fn test_snapshot_walk_end_to_end() {
    let loaded = NamespaceSnapshot::from_json(SNAPSHOT).unwrap().build().unwrap();
    let config = WalkConfig::default();
    let driver = Driver::with_config(loaded.symbols(&config), config);

    let recorder = RecordingVisitor::new();
    let report = driver.run(&AcceptAll, &recorder).unwrap();

    assert_eq!(
        recorder.names(),
        vec!["ext4", "parameters", "debug", "refcnt", "loop", "<anon>"]
    );
    assert_eq!(recorder.depths(), vec![1, 2, 3, 2, 1, 2]);
    assert_eq!(report.anchor.unwrap().name.as_deref(), Some("module"));
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].kind, WarningKind::UninitializedMember);
}

#[test]
fn test_snapshot_walk_prints_lines() {
    let loaded = NamespaceSnapshot::from_json(SNAPSHOT).unwrap().build().unwrap();
    let config = WalkConfig::default();
    let driver = Driver::with_config(loaded.symbols(&config), config);

    let printer = PrintVisitor::new(Vec::new());
    driver.run(&AcceptAll, &printer).unwrap();
    let output = String::from_utf8(printer.into_inner()).unwrap();

    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("  node[0x"));
    assert!(lines[0].ends_with("name[ext4] depth[1]"));
    assert!(lines[2].starts_with("      node[0x"));
    assert!(lines[5].contains("name[<anon>] depth[2]"));
}

#[test]
fn test_snapshot_walk_releases_every_hold() {
    let journal = Arc::new(HoldJournal::new());
    let snapshot = NamespaceSnapshot::from_json(SNAPSHOT).unwrap();
    let loaded = snapshot
        .build_into(Namespace::with_journal(journal.clone()))
        .unwrap();
    let config = WalkConfig::default();
    let driver = Driver::with_config(loaded.symbols(&config), config);

    driver.run(&AcceptAll, &RecordingVisitor::new()).unwrap();
    assert!(journal.is_balanced());
    assert_eq!(loaded.namespace.root().children()[0].ref_count(), 1);
}

#[test]
fn test_directory_walk_end_to_end() {
    let dir = TempDir::new().unwrap();
    let module = dir.path().join("module");
    fs::create_dir_all(module.join("ext4/parameters")).unwrap();
    fs::write(module.join("ext4/refcnt"), "0\n").unwrap();
    fs::create_dir_all(module.join("loop")).unwrap();
    fs::create_dir_all(dir.path().join("kernel")).unwrap();

    let loaded = DirectoryLoader::new().load(&LoadConfig::new(dir.path())).unwrap();
    assert!(loaded.warnings.is_empty());

    let config = WalkConfig::default();
    let driver = Driver::with_config(loaded.loaded.symbols(&config), config);
    let recorder = RecordingVisitor::new();
    let report = driver.run(&AcceptAll, &recorder).unwrap();

    // jwalk sorts siblings by name
    assert_eq!(recorder.names(), vec!["ext4", "parameters", "refcnt", "loop"]);
    assert_eq!(report.anchor.unwrap().name.as_deref(), Some("module"));
    assert_eq!(report.summary.nodes_held, 4);
}

#[test]
fn test_directory_without_collection_walks_nothing() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("kernel")).unwrap();

    let loaded = DirectoryLoader::new().load(&LoadConfig::new(dir.path())).unwrap();
    let config = WalkConfig::default();
    let driver = Driver::with_config(loaded.loaded.symbols(&config), config);

    let report = driver.run(&AcceptAll, &RecordingVisitor::new()).unwrap();
    assert!(!report.walked());
}

#[test]
fn test_snapshot_file_roundtrip_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ns.json");
    fs::write(&path, SNAPSHOT).unwrap();

    let loaded = NamespaceSnapshot::load(&path).unwrap().build().unwrap();
    assert_eq!(loaded.namespace.node_count(), 8);
    assert_eq!(loaded.collection.len(), 3);
}
