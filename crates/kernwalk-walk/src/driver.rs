//! Top-level orchestration of a walk.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use kernwalk_core::{AddressResolver, Hold, NodeId, WalkConfig, WalkError, WalkWarning};

use crate::anchor::AnchorLocator;
use crate::visitor::{AcceptAll, NodeFilter, NodeVisitor, PrintVisitor};
use crate::walker::{TraversalContext, TreeWalker, WalkSummary};

/// Identity of the node a walk started from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorInfo {
    pub id: NodeId,
    pub addr: usize,
    pub name: Option<String>,
}

/// Results of one driver run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalkReport {
    /// Anchor the walk started from, if one was found.
    pub anchor: Option<AnchorInfo>,
    /// Collection members skipped during anchor discovery.
    pub skipped: Vec<WalkWarning>,
    /// Traversal counters.
    pub summary: WalkSummary,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl WalkReport {
    /// Whether an anchor was found and walked.
    pub fn walked(&self) -> bool {
        self.anchor.is_some()
    }

    /// Check if anything was skipped or failed along the way.
    pub fn has_warnings(&self) -> bool {
        !self.skipped.is_empty() || !self.summary.warnings.is_empty()
    }
}

/// Resolves the global anchors and runs one walk over them.
///
/// Runs are stateless: calling [`run`](Self::run) again on an unchanged
/// namespace produces the same report.
#[derive(Debug)]
pub struct Driver<R> {
    resolver: R,
    config: WalkConfig,
    walker: TreeWalker,
}

impl<R: AddressResolver> Driver<R> {
    /// Create a driver with the default configuration.
    pub fn new(resolver: R) -> Self {
        Self::with_config(resolver, WalkConfig::default())
    }

    /// Create a driver with a custom configuration.
    pub fn with_config(resolver: R, config: WalkConfig) -> Self {
        let walker = TreeWalker::from_config(&config);
        Self {
            resolver,
            config,
            walker,
        }
    }

    /// The driver's configuration.
    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Walk with the accept-all filter, printing every node to stderr.
    pub fn run_default(&self) -> Result<WalkReport, WalkError> {
        self.run(&AcceptAll, &PrintVisitor::stderr())
    }

    /// Walk with the given filter and visitor.
    pub fn run(
        &self,
        filter: &dyn NodeFilter,
        visitor: &dyn NodeVisitor,
    ) -> Result<WalkReport, WalkError> {
        self.run_with(&TraversalContext::new(filter, visitor))
    }

    /// Walk with a prepared traversal context.
    ///
    /// Resolve, validate, locate, lock, acquire, walk, then release in
    /// reverse. Any failure to resolve a symbol aborts before the tree is
    /// touched.
    pub fn run_with(&self, ctx: &TraversalContext<'_>) -> Result<WalkReport, WalkError> {
        let start = Instant::now();
        let config = &self.config;

        let root = self
            .resolver
            .resolve_node(&config.root_symbol)
            .ok_or_else(|| WalkError::not_found(&config.root_symbol))?;
        let lock = self
            .resolver
            .resolve_lock(&config.lock_symbol)
            .ok_or_else(|| WalkError::not_found(&config.lock_symbol))?;
        let collection = self
            .resolver
            .resolve_collection(&config.collection_symbol)
            .ok_or_else(|| WalkError::not_found(&config.collection_symbol))?;
        debug!(
            root = %root.id(),
            collection = collection.name(),
            "resolved namespace symbols"
        );

        if !root.is_alive() {
            return Err(WalkError::invalid_config("namespace root has been released"));
        }
        if !root.is_container() {
            return Err(WalkError::NotAContainer { id: root.id() });
        }
        ctx.validate()?;

        let scan = AnchorLocator::scan(&collection);
        let mut report = WalkReport {
            skipped: scan.skipped,
            ..WalkReport::default()
        };

        let Some(anchor) = scan.anchor else {
            report.elapsed = start.elapsed();
            info!(collection = collection.name(), "no anchor found, nothing to walk");
            return Ok(report);
        };
        report.anchor = Some(AnchorInfo {
            id: anchor.id(),
            addr: anchor.addr(),
            name: anchor.name().map(str::to_string),
        });

        let guard = lock.lock();
        let held = Hold::acquire(anchor.get());
        let result = self.walker.walk(&guard, &held, config.start_depth, ctx);
        held.release();
        drop(guard);
        drop(anchor);

        report.summary = result?;
        report.elapsed = start.elapsed();
        info!(
            held = report.summary.nodes_held,
            visited = report.summary.nodes_visited,
            skipped = report.skipped.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "walk complete"
        );
        Ok(report)
    }

    /// Counterpart of the initial run. Holds no state, so it only logs.
    pub fn teardown(&self) {
        info!("teardown");
    }
}
