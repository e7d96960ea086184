//! Assign-before-populate for types usable during initialization

use super::{AstTransformer, TransformContext, TransformFailure};
use crate::ast::XamlNode;
use xaml_types::XType;

/// Rewrites `Prop = new T { ... }` into "store new T in a local, assign it,
/// then populate the local" when `T` carries a usable-during-initialization
/// attribute
pub struct TopDownInitializationTransformer;

impl TopDownInitializationTransformer {
    /// Type of the constructed value when `node` qualifies
    fn candidate(ctx: &TransformContext, node: &XamlNode) -> Option<XType> {
        let XamlNode::PropertyAssignment { value, .. } = node else {
            return None;
        };
        let XamlNode::ValueWithManipulations { value: inner, .. } = value.as_ref() else {
            return None;
        };
        let ty = inner.value_type()?;
        ctx.config
            .type_mappings()
            .usable_during_initialization_attributes
            .iter()
            .any(|a| ty.has_attribute(a))
            .then_some(ty)
    }
}

impl AstTransformer for TopDownInitializationTransformer {
    fn name(&self) -> &'static str {
        "top-down-initialization"
    }

    fn transform(&self, ctx: &mut TransformContext, node: XamlNode) -> Result<XamlNode, TransformFailure> {
        let Some(ty) = Self::candidate(ctx, &node) else {
            return Ok(node);
        };

        let (line, property, value) = match node {
            XamlNode::PropertyAssignment {
                line,
                property,
                value,
            } => (line, property, value),
            other => return Ok(other),
        };
        let (value_line, value, manipulation) = match *value {
            XamlNode::ValueWithManipulations {
                line,
                value,
                manipulation,
            } => (line, value, manipulation),
            other => {
                return Ok(XamlNode::PropertyAssignment {
                    line,
                    property,
                    value: Box::new(other),
                })
            }
        };

        let local = ctx.new_local();
        Ok(XamlNode::ManipulationGroup {
            line,
            children: vec![
                XamlNode::PropertyAssignment {
                    line,
                    property,
                    value: Box::new(XamlNode::LocalInitialization {
                        line: value_line,
                        local,
                        value,
                    }),
                },
                XamlNode::ManipulateValue {
                    line: value_line,
                    value: Box::new(XamlNode::CompilerLocal {
                        line: value_line,
                        local,
                        ty,
                    }),
                    manipulation,
                },
            ],
        })
    }
}
