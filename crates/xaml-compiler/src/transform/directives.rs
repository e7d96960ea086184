//! `x:Arguments` handling

use super::{AstTransformer, TransformContext, TransformFailure};
use crate::ast::{XamlNode, XAML2006};

/// Moves `x:Arguments` directive values into the owning object's constructor
/// arguments
pub struct KnownDirectivesTransformer;

impl AstTransformer for KnownDirectivesTransformer {
    fn name(&self) -> &'static str {
        "known-directives"
    }

    fn transform(&self, _ctx: &mut TransformContext, node: XamlNode) -> Result<XamlNode, TransformFailure> {
        let (line, ty, children, mut arguments) = match node {
            XamlNode::Object {
                line,
                ty,
                children,
                arguments,
            } => (line, ty, children, arguments),
            other => return Ok(other),
        };

        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            match child {
                XamlNode::Directive {
                    namespace, name, values, ..
                } if namespace == XAML2006 && name == "Arguments" => arguments.extend(values),
                other => kept.push(other),
            }
        }

        Ok(XamlNode::Object {
            line,
            ty,
            children: kept,
            arguments,
        })
    }
}
