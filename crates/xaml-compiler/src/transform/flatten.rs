//! Manipulation group flattening

use super::{AstTransformer, TransformContext, TransformFailure};
use crate::ast::XamlNode;

/// Splices nested manipulation groups into their parent group
pub struct FlattenTransformer;

impl AstTransformer for FlattenTransformer {
    fn name(&self) -> &'static str {
        "flatten"
    }

    fn transform(&self, _ctx: &mut TransformContext, node: XamlNode) -> Result<XamlNode, TransformFailure> {
        match node {
            XamlNode::ManipulationGroup { line, children }
                if children.iter().any(|c| matches!(c, XamlNode::ManipulationGroup { .. })) =>
            {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    match child {
                        XamlNode::ManipulationGroup { children, .. } => flat.extend(children),
                        other => flat.push(other),
                    }
                }
                Ok(XamlNode::ManipulationGroup { line, children: flat })
            }
            other => Ok(other),
        }
    }
}
