//! XML type reference resolution

use super::resolve::resolve_type;
use super::{AstTransformer, TransformContext, TransformFailure};
use crate::ast::{PropertyReference, XamlNode, XamlTypeReference, XmlTypeReference, XAML2006};

/// Names in the XAML namespace that are handled as intrinsics, not types
const INTRINSICS: [&str; 3] = ["Null", "Type", "Static"];

/// Replaces XML type references on objects, text and property owners with
/// resolved types
pub struct TypeReferenceResolver;

fn is_intrinsic(xml: &XmlTypeReference) -> bool {
    xml.namespace == XAML2006 && INTRINSICS.contains(&xml.name.as_str())
}

impl TypeReferenceResolver {
    fn target<'a>(node: &'a XamlNode) -> Option<&'a XmlTypeReference> {
        match node {
            XamlNode::Object {
                ty: XamlTypeReference::Xml(xml),
                ..
            } if !is_intrinsic(xml) => Some(xml),
            XamlNode::Text {
                ty: XamlTypeReference::Xml(xml),
                ..
            } => Some(xml),
            XamlNode::PropertyValue {
                property:
                    PropertyReference::Named {
                        declaring: XamlTypeReference::Xml(xml),
                        ..
                    },
                ..
            } if !is_intrinsic(xml) => Some(xml),
            _ => None,
        }
    }
}

impl AstTransformer for TypeReferenceResolver {
    fn name(&self) -> &'static str {
        "type-reference-resolver"
    }

    fn transform(&self, ctx: &mut TransformContext, node: XamlNode) -> Result<XamlNode, TransformFailure> {
        let Some(reference) = Self::target(&node) else {
            return Ok(node);
        };

        let resolved = match resolve_type(ctx, reference) {
            Ok(ty) => XamlTypeReference::Clr(ty),
            Err(message) => {
                let fallback = node.clone();
                return Err(ctx.parse_error(message, &node, fallback));
            }
        };

        Ok(match node {
            XamlNode::Object {
                line,
                children,
                arguments,
                ..
            } => XamlNode::Object {
                line,
                ty: resolved,
                children,
                arguments,
            },
            XamlNode::Text { line, text, .. } => XamlNode::Text {
                line,
                ty: resolved,
                text,
            },
            XamlNode::PropertyValue {
                line,
                property: PropertyReference::Named { name, .. },
                values,
            } => XamlNode::PropertyValue {
                line,
                property: PropertyReference::Named {
                    declaring: resolved,
                    name,
                },
                values,
            },
            other => other,
        })
    }
}
