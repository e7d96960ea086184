//! `x:Null`, `x:Type` and `x:Static`

use super::resolve::resolve_prefixed;
use super::{AstTransformer, TransformContext, TransformFailure};
use crate::ast::{LineInfo, PropertyReference, XamlNode, XamlTypeReference};
use xaml_types::ConstantValue;

/// Replaces XAML language intrinsics with value nodes
pub struct IntrinsicsTransformer;

/// Single text operand of an intrinsic: first constructor argument or the
/// named property (`TypeName`, `Member`)
fn operand<'a>(arguments: &'a [XamlNode], children: &'a [XamlNode], property: &str) -> Option<&'a str> {
    let text = |node: &'a XamlNode| match node {
        XamlNode::Text { text, .. } => Some(text.as_str()),
        _ => None,
    };
    if let Some(first) = arguments.first() {
        return text(first);
    }
    children.iter().find_map(|child| match child {
        XamlNode::PropertyValue {
            property: PropertyReference::Named { name, .. },
            values,
            ..
        } if name == property && values.len() == 1 => text(&values[0]),
        _ => None,
    })
}

impl IntrinsicsTransformer {
    fn static_member(ctx: &mut TransformContext, line: LineInfo, member: &str) -> Result<XamlNode, String> {
        let (type_name, member_name) = member
            .trim()
            .rsplit_once('.')
            .ok_or_else(|| format!("Invalid x:Static member reference '{}'", member))?;
        let ty = resolve_prefixed(ctx, type_name)?;

        if let Some(field) = ty.find_field(member_name).filter(|f| f.is_static() && f.is_public()) {
            if let Some(value) = field.literal_value() {
                return Ok(XamlNode::Constant {
                    line,
                    ty: field.field_type(),
                    value,
                });
            }
            if !field.is_literal() {
                return Ok(XamlNode::StaticField { line, field });
            }
        }

        if let Some(getter) = ty
            .find_property(member_name)
            .and_then(|p| p.getter())
            .filter(|g| g.is_static() && g.is_public())
        {
            return Ok(XamlNode::MethodCall {
                line,
                method: getter,
                instance: None,
                arguments: Vec::new(),
            });
        }

        Err(format!(
            "Unable to resolve static member {} on type {}",
            member_name,
            ty.fqn()
        ))
    }
}

impl AstTransformer for IntrinsicsTransformer {
    fn name(&self) -> &'static str {
        "intrinsics"
    }

    fn transform(&self, ctx: &mut TransformContext, node: XamlNode) -> Result<XamlNode, TransformFailure> {
        let XamlNode::Object {
            line,
            ty: XamlTypeReference::Xml(xml),
            children,
            arguments,
        } = &node
        else {
            return Ok(node);
        };
        let line = *line;

        let result = if xml.is_xaml("Null") {
            Ok(XamlNode::Constant {
                line,
                ty: ctx.config.well_known_types().object.clone(),
                value: ConstantValue::Null,
            })
        } else if xml.is_xaml("Type") {
            match operand(arguments, children, "TypeName") {
                Some(name) => {
                    let name = name.to_string();
                    resolve_prefixed(ctx, &name).map(|target| XamlNode::TypeOf {
                        line,
                        target,
                        ty: ctx.config.well_known_types().system_type.clone(),
                    })
                }
                None => Err("x:Type requires a type name".to_string()),
            }
        } else if xml.is_xaml("Static") {
            match operand(arguments, children, "Member") {
                Some(member) => {
                    let member = member.to_string();
                    Self::static_member(ctx, line, &member)
                }
                None => Err("x:Static requires a member name".to_string()),
            }
        } else {
            return Ok(node);
        };

        result.or_else(|message| {
            let fallback = node.clone();
            Err(ctx.parse_error(message, &node, fallback))
        })
    }
}
