//! Property values to manipulations

use super::helpers::generate_property_assignments;
use super::{AstTransformer, TransformContext, TransformFailure};
use crate::ast::{PropertyReference, XamlNode};

/// Rewrites each resolved property value into a manipulation group
pub struct PropertyValueTransformer;

impl AstTransformer for PropertyValueTransformer {
    fn name(&self) -> &'static str {
        "property-value"
    }

    fn transform(&self, ctx: &mut TransformContext, node: XamlNode) -> Result<XamlNode, TransformFailure> {
        let XamlNode::PropertyValue {
            line,
            property: PropertyReference::Resolved(property),
            values,
        } = &node
        else {
            return Ok(node);
        };
        let line = *line;
        let property = property.clone();

        match generate_property_assignments(ctx, &property, values.clone(), line) {
            Ok(children) => Ok(XamlNode::ManipulationGroup { line, children }),
            Err(error) => Err(TransformFailure {
                error,
                fallback: node,
            }),
        }
    }
}
