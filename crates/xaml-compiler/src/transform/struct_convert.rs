//! Value-type elements written as text, e.g. `<x:Int32>5</x:Int32>`

use super::{AstTransformer, TransformContext, TransformFailure};
use crate::ast::{XamlNode, XamlTypeReference};

/// Replaces a value-type (or string) object element whose only child is text
/// with the converted text
pub struct StructConvertTransformer;

impl AstTransformer for StructConvertTransformer {
    fn name(&self) -> &'static str {
        "struct-convert"
    }

    fn transform(&self, ctx: &mut TransformContext, node: XamlNode) -> Result<XamlNode, TransformFailure> {
        let XamlNode::Object {
            ty: XamlTypeReference::Clr(ty),
            children,
            arguments,
            ..
        } = &node
        else {
            return Ok(node);
        };
        let text = match children.as_slice() {
            [text @ XamlNode::Text { .. }] if arguments.is_empty() => text,
            _ => return Ok(node),
        };
        if !ty.is_value_type() && ty != &ctx.config.well_known_types().string {
            return Ok(node);
        }

        match ctx.config.try_get_correctly_typed_value(text, ty) {
            Some(converted) => Ok(converted),
            None => {
                let message = format!("Unable to convert text to {}", ty.fqn());
                Err(ctx.parse_error(message, &node, node.clone()))
            }
        }
    }
}
