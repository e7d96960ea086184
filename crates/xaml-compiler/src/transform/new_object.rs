//! Object construction

use super::{AstTransformer, TransformContext, TransformFailure};
use crate::ast::{XamlNode, XamlTypeReference};
use crate::config::TransformerConfiguration;
use xaml_types::{XConstructor, XType};

/// Turns a resolved object element into construction followed by the
/// manipulations of its children
pub struct NewObjectTransformer;

impl NewObjectTransformer {
    /// First public instance constructor taking exactly `arguments`, with the
    /// arguments converted to the parameter types
    fn find_constructor(
        config: &TransformerConfiguration,
        ty: &XType,
        arguments: &[XamlNode],
    ) -> Option<(XConstructor, Vec<XamlNode>)> {
        ty.constructors()
            .into_iter()
            .filter(|c| c.is_public() && !c.is_static())
            .find_map(|ctor| {
                let params = ctor.parameters();
                if params.len() != arguments.len() {
                    return None;
                }
                let converted = arguments
                    .iter()
                    .zip(&params)
                    .map(|(arg, param)| config.try_get_correctly_typed_value(arg, param))
                    .collect::<Option<Vec<_>>>()?;
                Some((ctor, converted))
            })
    }
}

impl AstTransformer for NewObjectTransformer {
    fn name(&self) -> &'static str {
        "new-object"
    }

    fn transform(&self, ctx: &mut TransformContext, node: XamlNode) -> Result<XamlNode, TransformFailure> {
        let XamlNode::Object {
            line,
            ty: XamlTypeReference::Clr(ty),
            children,
            arguments,
        } = &node
        else {
            return Ok(node);
        };
        let line = *line;

        let Some((constructor, arguments)) = Self::find_constructor(&ctx.config, ty, arguments) else {
            let message = format!(
                "Unable to find public constructor for type {} taking {} arguments",
                ty.fqn(),
                arguments.len()
            );
            return Err(ctx.parse_error(message, &node, node.clone()));
        };

        let mut manipulation = XamlNode::ManipulationGroup {
            line,
            children: children.clone(),
        };

        if let Some(support) = &ctx.config.type_mappings().support_initialize {
            if support.is_assignable_from(ty) {
                let begin = support.find_method(|m| m.name() == "BeginInit" && m.parameters().is_empty());
                let end = support.find_method(|m| m.name() == "EndInit" && m.parameters().is_empty());
                if let (Some(begin), Some(end)) = (begin, end) {
                    manipulation = XamlNode::ObjectInitialization {
                        line,
                        manipulation: Box::new(manipulation),
                        begin,
                        end,
                    };
                }
            }
        }

        Ok(XamlNode::ValueWithManipulations {
            line,
            value: Box::new(XamlNode::NewObject {
                line,
                ty: ty.clone(),
                constructor,
                arguments,
            }),
            manipulation: Box::new(manipulation),
        })
    }
}
