//! Per-compile transformation state

use crate::ast::{LocalId, XamlNode, XmlTypeReference};
use crate::config::TransformerConfiguration;
use crate::error::{TransformResult, XamlParseError};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::warn;
use xaml_types::XType;

/// Failed rewrite: the error plus the node to keep when the compile is not
/// strict
#[derive(Debug)]
pub struct TransformFailure {
    pub error: XamlParseError,
    pub fallback: XamlNode,
}

/// State shared by all passes of one `transform` call
pub struct TransformContext {
    pub config: Arc<TransformerConfiguration>,
    pub namespace_aliases: FxHashMap<String, String>,
    pub strict: bool,
    /// Errors recovered from in non-strict mode
    pub diagnostics: Vec<XamlParseError>,
    /// Resolved XML type references
    pub type_cache: FxHashMap<XmlTypeReference, XType>,
    next_local_id: u32,
}

impl TransformContext {
    pub fn new(
        config: Arc<TransformerConfiguration>,
        namespace_aliases: FxHashMap<String, String>,
        strict: bool,
    ) -> Self {
        Self {
            config,
            namespace_aliases,
            strict,
            diagnostics: Vec::new(),
            type_cache: FxHashMap::default(),
            next_local_id: 0,
        }
    }

    /// Build a failure for `offender`, keeping `fallback` in non-strict mode
    pub fn parse_error(
        &self,
        message: impl Into<String>,
        offender: &XamlNode,
        fallback: XamlNode,
    ) -> TransformFailure {
        TransformFailure {
            error: XamlParseError::new(message, offender),
            fallback,
        }
    }

    /// Fresh compiler-local id
    pub fn new_local(&mut self) -> LocalId {
        let id = LocalId(self.next_local_id);
        self.next_local_id += 1;
        id
    }

    /// Strict mode propagates the error; otherwise it is recorded and the
    /// fallback node is kept
    pub fn recover(&mut self, failure: TransformFailure) -> TransformResult<XamlNode> {
        if self.strict {
            return Err(failure.error);
        }
        warn!(error = %failure.error, "recovered from transform error");
        self.diagnostics.push(failure.error);
        Ok(failure.fallback)
    }
}
