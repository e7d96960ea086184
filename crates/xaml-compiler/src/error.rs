//! Compilation errors

use crate::ast::{LineInfo, XamlNode};
use std::fmt;
use thiserror::Error;
use xaml_types::TypeSystemError;

/// Result of a transformation step
pub type TransformResult<T> = Result<T, XamlParseError>;

/// Result of an emission step
pub type EmitResult<T> = Result<T, XamlLoadError>;

/// Kind and position of the node an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    /// Node variant name
    pub kind: &'static str,
    /// Source position
    pub line: LineInfo,
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.line)
    }
}

impl From<&XamlNode> for NodeInfo {
    fn from(node: &XamlNode) -> Self {
        node.info()
    }
}

/// Error raised while rewriting the tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({node})")]
pub struct XamlParseError {
    /// Human-readable description
    pub message: String,
    /// Offending node
    pub node: NodeInfo,
}

impl XamlParseError {
    /// Create an error pointing at `node`
    pub fn new(message: impl Into<String>, node: impl Into<NodeInfo>) -> Self {
        Self {
            message: message.into(),
            node: node.into(),
        }
    }
}

/// Error raised while emitting code for a resolved tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XamlLoadError {
    #[error("Emit of {node} resulted in {produced} while caller expected {expected}")]
    TypeMismatch {
        node: NodeInfo,
        produced: String,
        expected: String,
    },

    #[error("Unable to convert value of type {from} to {to} ({node})")]
    NoConversion {
        node: NodeInfo,
        from: String,
        to: String,
    },

    #[error("Unable to find emitter for node type: {node}")]
    NoEmitter { node: NodeInfo },

    #[error("Attempt to read uninitialized local variable ({node})")]
    UninitializedLocal { node: NodeInfo },

    #[error("Local node is assigned to a different procedure ({node})")]
    LocalProcedureMismatch { node: NodeInfo },

    #[error("Unresolved type reference {name} reached emission ({node})")]
    UnresolvedType { node: NodeInfo, name: String },

    #[error("Invalid root node: {message} ({node})")]
    InvalidRoot { node: NodeInfo, message: String },

    #[error("{message} ({node})")]
    Emit { node: NodeInfo, message: String },
}

impl XamlLoadError {
    /// Generic emission failure at `node`
    pub fn emit(message: impl Into<String>, node: impl Into<NodeInfo>) -> Self {
        XamlLoadError::Emit {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Node the error refers to
    pub fn node(&self) -> NodeInfo {
        match self {
            XamlLoadError::TypeMismatch { node, .. }
            | XamlLoadError::NoConversion { node, .. }
            | XamlLoadError::NoEmitter { node }
            | XamlLoadError::UninitializedLocal { node }
            | XamlLoadError::LocalProcedureMismatch { node }
            | XamlLoadError::UnresolvedType { node, .. }
            | XamlLoadError::InvalidRoot { node, .. }
            | XamlLoadError::Emit { node, .. } => *node,
        }
    }
}

/// Any failure of the compile pipeline
#[derive(Debug, Error)]
pub enum XamlError {
    #[error(transparent)]
    Parse(#[from] XamlParseError),

    #[error(transparent)]
    Load(#[from] XamlLoadError),

    #[error(transparent)]
    TypeSystem(#[from] TypeSystemError),
}
