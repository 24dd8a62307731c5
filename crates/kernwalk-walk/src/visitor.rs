//! Filter and visitor protocol.
//!
//! A walk hands every node it holds to a [`NodeFilter`]; nodes the filter
//! accepts are passed on to a [`NodeVisitor`]. Both run while the tree-wide
//! lock is held, so implementations must not block or do long-running work,
//! and must not call back into namespace mutators.

use std::io::{Stderr, Write};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use kernwalk_core::{Node, NodeId, NodeKind, VisitError};

/// Decides whether a node is passed to the visitor.
pub trait NodeFilter {
    fn accept(&self, node: &Node) -> bool;
}

impl<F> NodeFilter for F
where
    F: Fn(&Node) -> bool,
{
    fn accept(&self, node: &Node) -> bool {
        self(node)
    }
}

/// Callback invoked for every accepted node.
pub trait NodeVisitor {
    /// Visit `node`, found at `depth` below the walk's anchor.
    fn visit(&self, node: &Node, depth: u32) -> Result<(), VisitError>;
}

impl<F> NodeVisitor for F
where
    F: Fn(&Node, u32) -> Result<(), VisitError>,
{
    fn visit(&self, node: &Node, depth: u32) -> Result<(), VisitError> {
        self(node, depth)
    }
}

/// Filter that accepts every node.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl NodeFilter for AcceptAll {
    fn accept(&self, _node: &Node) -> bool {
        true
    }
}

/// Visitor that writes one diagnostic line per node.
#[derive(Debug)]
pub struct PrintVisitor<W: Write> {
    out: Mutex<W>,
}

impl<W: Write> PrintVisitor<W> {
    /// Write lines to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Consume the visitor and return its sink.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    /// Format the line written for `node` at `depth`.
    pub fn format_line(node: &Node, depth: u32) -> String {
        format!(
            "{:indent$}node[{:#x}] name[{}] depth[{}]",
            "",
            node.addr(),
            node.display_name(),
            depth,
            indent = depth as usize * 2
        )
    }
}

impl PrintVisitor<Stderr> {
    /// Write lines to standard error.
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> NodeVisitor for PrintVisitor<W> {
    fn visit(&self, node: &Node, depth: u32) -> Result<(), VisitError> {
        let line = Self::format_line(node, depth);
        writeln!(self.out.lock(), "{line}")?;
        Ok(())
    }
}

/// One visitor invocation captured by [`RecordingVisitor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub id: NodeId,
    pub name: Option<String>,
    pub kind: NodeKind,
    pub depth: u32,
}

/// Visitor that records every invocation in order.
#[derive(Debug, Default)]
pub struct RecordingVisitor {
    records: Mutex<Vec<VisitRecord>>,
}

impl RecordingVisitor {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded visits, in invocation order.
    pub fn records(&self) -> Vec<VisitRecord> {
        self.records.lock().clone()
    }

    /// Names of visited nodes, `<anon>` for unnamed ones.
    pub fn names(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|r| r.name.clone().unwrap_or_else(|| "<anon>".to_string()))
            .collect()
    }

    /// Depths of visited nodes.
    pub fn depths(&self) -> Vec<u32> {
        self.records.lock().iter().map(|r| r.depth).collect()
    }

    /// Number of recorded visits.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check if nothing was visited.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Consume the recorder and return its records.
    pub fn into_records(self) -> Vec<VisitRecord> {
        self.records.into_inner()
    }
}

impl NodeVisitor for RecordingVisitor {
    fn visit(&self, node: &Node, depth: u32) -> Result<(), VisitError> {
        self.records.lock().push(VisitRecord {
            id: node.id(),
            name: node.name().map(str::to_string),
            kind: node.kind(),
            depth,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernwalk_core::Namespace;

    #[test]
    fn test_format_line_indents_by_depth() {
        let ns = Namespace::new();
        let node = ns.insert(ns.root(), "parameters", NodeKind::Container).unwrap();

        let shallow = PrintVisitor::<Vec<u8>>::format_line(&node, 1);
        let deep = PrintVisitor::<Vec<u8>>::format_line(&node, 3);

        assert!(shallow.starts_with("  node["));
        assert!(deep.starts_with("      node["));
        assert!(shallow.ends_with("name[parameters] depth[1]"));
        assert!(shallow.contains(&format!("{:#x}", node.addr())));
    }

    #[test]
    fn test_print_visitor_writes_lines() {
        let ns = Namespace::new();
        let a = ns.insert(ns.root(), "a", NodeKind::Leaf).unwrap();
        let anon = ns.insert_anonymous(ns.root(), NodeKind::Leaf).unwrap();

        let visitor = PrintVisitor::new(Vec::new());
        visitor.visit(&a, 1).unwrap();
        visitor.visit(&anon, 2).unwrap();

        let output = String::from_utf8(visitor.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("name[a]"));
        assert!(lines[1].contains("name[<anon>]"));
    }

    #[test]
    fn test_closures_implement_protocol() {
        let ns = Namespace::new();
        let node = ns.insert(ns.root(), "x", NodeKind::Leaf).unwrap();

        let filter = |n: &Node| n.name() == Some("x");
        let visitor = |_: &Node, depth: u32| {
            if depth > 1 {
                Err(VisitError::new("too deep"))
            } else {
                Ok(())
            }
        };

        assert!(filter.accept(&node));
        assert!(AcceptAll.accept(&node));
        assert!(visitor.visit(&node, 1).is_ok());
        assert!(visitor.visit(&node, 2).is_err());
    }
}
