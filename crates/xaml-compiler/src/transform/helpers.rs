//! Property content resolution
//!
//! Turns the values written for one property into manipulations: markup
//! extension calls, direct assignments, or collection `Add` calls.

use super::context::TransformContext;
use crate::ast::{LineInfo, XamlNode, XAML2006};
use crate::error::{TransformResult, XamlParseError};
use xaml_types::{XMethod, XProperty, XType};

/// `ProvideValue` overload to use if `node` is a markup extension
///
/// Preference: no parameter with a typed result, no parameter, service
/// provider parameter with a typed result, service provider parameter.
pub fn markup_extension_provider(ctx: &TransformContext, node: &XamlNode) -> Option<XMethod> {
    let ty = node.value_type()?;
    let object = &ctx.config.well_known_types().object;
    let sp = &ctx.config.type_mappings().service_provider;

    let candidates =
        ty.find_methods(|m| m.name() == "ProvideValue" && m.is_public() && !m.is_static());
    let typed = |m: &&XMethod| m.return_type().is_some_and(|r| &r != object);
    let takes_sp = |m: &&XMethod| m.parameters() == [sp.clone()];

    candidates
        .iter()
        .find(|m| m.parameters().is_empty() && typed(m))
        .or_else(|| candidates.iter().find(|m| m.parameters().is_empty()))
        .or_else(|| candidates.iter().find(|m| takes_sp(m) && typed(m)))
        .or_else(|| candidates.iter().find(|m| takes_sp(m)))
        .cloned()
}

/// Resolve the values written for `property` into manipulations of the
/// owning object
pub fn generate_property_assignments(
    ctx: &mut TransformContext,
    property: &XProperty,
    mut values: Vec<XamlNode>,
    line: LineInfo,
) -> TransformResult<Vec<XamlNode>> {
    let property_type = property.property_type();
    let setter_public = property.setter().is_some_and(|s| s.is_public());
    let getter_public = property.getter().is_some_and(|g| g.is_public());

    if setter_public && values.len() == 1 {
        if let Some(provide_value) = markup_extension_provider(ctx, &values[0]) {
            let value = values.remove(0);
            return Ok(vec![XamlNode::MarkupExtension {
                line: value.line(),
                value: Box::new(value),
                property: property.clone(),
                provide_value,
                adder: None,
            }]);
        }
        if let Some(converted) = ctx
            .config
            .try_get_correctly_typed_value(&values[0], &property_type)
        {
            return Ok(vec![XamlNode::PropertyAssignment {
                line: values[0].line(),
                property: property.clone(),
                value: Box::new(converted),
            }]);
        }
    }

    if getter_public {
        let mut manipulations = Vec::with_capacity(values.len());
        for value in values {
            let info = value.info();
            let value_name = value.type_name();
            match try_call_add(ctx, Some(property), &property_type, value)? {
                Some(add) => manipulations.push(add),
                None => {
                    let property_name = property_type.fqn();
                    return Err(XamlParseError::new(
                        format!(
                            "Unable to directly convert {value_name} to {property_name} or find a suitable Add({value_name}) on type {property_name}"
                        ),
                        info,
                    ));
                }
            }
        }
        return Ok(manipulations);
    }

    let (value_name, info) = match values.first() {
        Some(v) => (v.type_name(), v.info()),
        None => (
            "nothing".to_string(),
            crate::error::NodeInfo {
                kind: "PropertyValue",
                line,
            },
        ),
    };
    Err(XamlParseError::new(
        format!(
            "Unable to handle {} assignment to {} as either direct assignment or collection initialization, \
             check if value type matches property type or that property type has proper Add method",
            value_name,
            property.name()
        ),
        info,
    ))
}

/// Find an `Add` call on `collection_type` for `value`; `Ok(None)` when no
/// overload fits
pub fn try_call_add(
    ctx: &mut TransformContext,
    target_property: Option<&XProperty>,
    collection_type: &XType,
    value: XamlNode,
) -> TransformResult<Option<XamlNode>> {
    if let (Some(provide_value), Some(property)) =
        (markup_extension_provider(ctx, &value), target_property)
    {
        let Some(provided) = provide_value.return_type() else {
            return Ok(None);
        };
        return Ok(find_adder(ctx, collection_type, &provided, None).map(|adder| {
            XamlNode::MarkupExtension {
                line: value.line(),
                value: Box::new(value),
                property: property.clone(),
                provide_value,
                adder: Some(adder),
            }
        }));
    }

    let Some(value_type) = value.value_type() else {
        return Ok(None);
    };
    let (value, key) = extract_key(value)?;
    let key_type = match &key {
        Some(key) => match key.value_type() {
            Some(ty) => Some(ty),
            None => return Ok(None),
        },
        None => None,
    };

    let Some(adder) = find_adder(ctx, collection_type, &value_type, key_type.as_ref()) else {
        return Ok(None);
    };

    let line = value.line();
    let mut arguments = Vec::with_capacity(2);
    arguments.extend(key);
    arguments.push(value);

    let call = XamlNode::NoReturnMethodCall {
        line,
        method: adder,
        arguments,
    };
    Ok(Some(match target_property {
        Some(property) => XamlNode::PropertyValueManipulation {
            line,
            property: property.clone(),
            manipulation: Box::new(call),
        },
        None => call,
    }))
}

/// Strict round (typed parameter accepting the value) before the loose round
/// (`object` parameter), each over every candidate
fn find_adder(
    ctx: &TransformContext,
    collection_type: &XType,
    value_type: &XType,
    key_type: Option<&XType>,
) -> Option<XMethod> {
    let object = &ctx.config.well_known_types().object;
    let candidates = collection_type.find_methods(|m| {
        !m.is_static() && m.is_public() && (m.name() == "Add" || m.name().ends_with(".Add"))
    });

    let accepts = |param: &XType, loose: bool| {
        if loose {
            param == object
        } else {
            param != object && param.is_assignable_from(value_type)
        }
    };

    for loose in [false, true] {
        for method in &candidates {
            let params = method.parameters();
            let matched = match (key_type, params.as_slice()) {
                (None, [item]) => accepts(item, loose),
                (Some(key), [key_param, item]) => {
                    key_param.is_assignable_from(key) && accepts(item, loose)
                }
                _ => false,
            };
            if matched {
                return Some(method.clone());
            }
        }
    }
    None
}

fn is_key_directive(node: &XamlNode) -> bool {
    matches!(node, XamlNode::Directive { namespace, name, .. } if namespace == XAML2006 && name == "Key")
}

/// Detach the `x:Key` directive from `value`, looking into its children or
/// one level into its manipulation
fn extract_key(value: XamlNode) -> TransformResult<(XamlNode, Option<XamlNode>)> {
    match value {
        XamlNode::Object {
            line,
            ty,
            mut children,
            arguments,
        } => {
            let key = take_key(&mut children)?;
            Ok((
                XamlNode::Object {
                    line,
                    ty,
                    children,
                    arguments,
                },
                key,
            ))
        }
        XamlNode::ValueWithManipulations {
            line,
            value,
            manipulation,
        } => {
            let (manipulation, key) = extract_key_from_manipulation(*manipulation)?;
            Ok((
                XamlNode::ValueWithManipulations {
                    line,
                    value,
                    manipulation: Box::new(manipulation),
                },
                key,
            ))
        }
        other => Ok((other, None)),
    }
}

fn extract_key_from_manipulation(man: XamlNode) -> TransformResult<(XamlNode, Option<XamlNode>)> {
    if is_key_directive(&man) {
        let line = man.line();
        let key = directive_value(man)?;
        return Ok((
            XamlNode::ManipulationGroup {
                line,
                children: Vec::new(),
            },
            Some(key),
        ));
    }
    match man {
        XamlNode::ManipulationGroup { line, mut children } => {
            let key = take_key(&mut children)?;
            Ok((XamlNode::ManipulationGroup { line, children }, key))
        }
        XamlNode::ObjectInitialization {
            line,
            manipulation,
            begin,
            end,
        } => {
            let (manipulation, key) = extract_key_from_manipulation(*manipulation)?;
            Ok((
                XamlNode::ObjectInitialization {
                    line,
                    manipulation: Box::new(manipulation),
                    begin,
                    end,
                },
                key,
            ))
        }
        other => Ok((other, None)),
    }
}

fn take_key(children: &mut Vec<XamlNode>) -> TransformResult<Option<XamlNode>> {
    match children.iter().position(is_key_directive) {
        Some(index) => directive_value(children.remove(index)).map(Some),
        None => Ok(None),
    }
}

fn directive_value(directive: XamlNode) -> TransformResult<XamlNode> {
    let info = directive.info();
    match directive {
        XamlNode::Directive { mut values, .. } if values.len() == 1 => Ok(values.remove(0)),
        _ => Err(XamlParseError::new(
            "Invalid number of arguments for x:Key directive",
            info,
        )),
    }
}
