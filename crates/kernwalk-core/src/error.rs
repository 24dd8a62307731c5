//! Error and warning types for namespace walks.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::NodeId;

/// Errors that abort a walk or a namespace operation.
#[derive(Debug, Error)]
pub enum WalkError {
    /// A required symbol could not be resolved.
    #[error("Symbol not found: {symbol}")]
    NotFound { symbol: String },

    /// Invalid configuration or traversal context.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Attempted to use a leaf where a container is required.
    #[error("Node {id} is not a container")]
    NotAContainer { id: NodeId },

    /// The walk descended past the configured depth cap.
    #[error("Depth limit of {limit} exceeded")]
    DepthLimitExceeded { limit: u32 },

    /// I/O error while loading a namespace.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed namespace snapshot.
    #[error("Invalid snapshot: {source}")]
    Snapshot {
        #[from]
        source: serde_json::Error,
    },
}

impl WalkError {
    /// Create a not-found error for a symbol.
    pub fn not_found(symbol: impl Into<String>) -> Self {
        Self::NotFound {
            symbol: symbol.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure reported by a visitor callback for a single node.
///
/// Visitor failures never abort a walk; they are logged and counted.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct VisitError {
    message: String,
}

impl VisitError {
    /// Create a visitor failure with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for VisitError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Kind of per-entry warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A collection member was not initialized and was skipped.
    UninitializedMember,
    /// A visitor reported failure for a node.
    VisitorFailure,
    /// An entry could not be read while loading a namespace.
    ReadError,
}

/// Non-fatal warning encountered while locating, walking or loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkWarning {
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl WalkWarning {
    /// Create a new warning.
    pub fn new(message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Create an uninitialized member warning.
    pub fn uninitialized_member(name: &str) -> Self {
        Self::new(
            format!("Member {name} was not initialized"),
            WarningKind::UninitializedMember,
        )
    }

    /// Create a visitor failure warning.
    pub fn visitor_failure(node: NodeId, error: &VisitError) -> Self {
        Self::new(
            format!("Visitor failed on node {node}: {error}"),
            WarningKind::VisitorFailure,
        )
    }

    /// Create a read error warning.
    pub fn read_error(path: impl AsRef<std::path::Path>, error: impl std::fmt::Display) -> Self {
        Self::new(
            format!("Read error at {}: {error}", path.as_ref().display()),
            WarningKind::ReadError,
        )
    }
}
