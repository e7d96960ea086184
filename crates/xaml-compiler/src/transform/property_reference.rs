//! Property name resolution and content gathering

use super::{AstTransformer, TransformContext, TransformFailure};
use crate::ast::{PropertyReference, XamlNode, XamlTypeReference};

/// Resolves named property references, and gathers an object's value
/// children into an assignment to its content property
pub struct PropertyReferenceResolver;

impl AstTransformer for PropertyReferenceResolver {
    fn name(&self) -> &'static str {
        "property-reference-resolver"
    }

    fn transform(&self, ctx: &mut TransformContext, node: XamlNode) -> Result<XamlNode, TransformFailure> {
        match node {
            XamlNode::PropertyValue {
                line,
                property:
                    PropertyReference::Named {
                        declaring: XamlTypeReference::Clr(declaring),
                        name,
                    },
                values,
            } => match declaring.find_property(&name) {
                Some(property) => Ok(XamlNode::PropertyValue {
                    line,
                    property: PropertyReference::Resolved(property),
                    values,
                }),
                None => {
                    let message = format!("Unable to resolve property {} on type {}", name, declaring.fqn());
                    let node = XamlNode::PropertyValue {
                        line,
                        property: PropertyReference::Named {
                            declaring: XamlTypeReference::Clr(declaring),
                            name,
                        },
                        values,
                    };
                    Err(ctx.parse_error(message, &node, node.clone()))
                }
            },
            XamlNode::Object {
                line,
                ty: XamlTypeReference::Clr(ty),
                children,
                arguments,
            } if children.iter().any(XamlNode::is_value) => {
                let wk = ctx.config.well_known_types();
                let single_text = children.len() == 1 && matches!(children[0], XamlNode::Text { .. });
                let convertible = ty.is_value_type() || ty == wk.string;

                let Some(content) = ctx.config.content_property(&ty) else {
                    let node = XamlNode::Object {
                        line,
                        ty: XamlTypeReference::Clr(ty.clone()),
                        children,
                        arguments,
                    };
                    if single_text && convertible {
                        return Ok(node);
                    }
                    let message = format!("No content property found on type {}", ty.fqn());
                    return Err(ctx.parse_error(message, &node, node.clone()));
                };

                let mut kept = Vec::with_capacity(children.len());
                let mut values = Vec::new();
                let mut content_at = None;
                for child in children {
                    if child.is_value() {
                        content_at.get_or_insert(kept.len());
                        values.push(child);
                    } else {
                        kept.push(child);
                    }
                }

                let content_line = values.first().map(XamlNode::line).unwrap_or(line);
                kept.insert(
                    content_at.unwrap_or(kept.len()),
                    XamlNode::PropertyValue {
                        line: content_line,
                        property: PropertyReference::Resolved(content),
                        values,
                    },
                );

                Ok(XamlNode::Object {
                    line,
                    ty: XamlTypeReference::Clr(ty),
                    children: kept,
                    arguments,
                })
            }
            other => Ok(other),
        }
    }
}
