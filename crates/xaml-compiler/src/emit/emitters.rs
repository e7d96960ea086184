//! Default node emitters

use super::{CodeGen, EmitContext, NodeEmitResult, NodeEmitter, Op};
use crate::ast::XamlNode;
use crate::error::{EmitResult, XamlLoadError};
use xaml_types::{XMethod, XType};

/// Emitters in priority order
pub fn default_emitters() -> Vec<Box<dyn NodeEmitter>> {
    vec![
        Box::new(NewObjectEmitter),
        Box::new(TextNodeEmitter),
        Box::new(MethodCallEmitter),
        Box::new(PropertyAssignmentEmitter),
        Box::new(PropertyValueManipulationEmitter),
        Box::new(ManipulationGroupEmitter),
        Box::new(ValueWithManipulationsEmitter),
        Box::new(MarkupExtensionEmitter),
        Box::new(ObjectInitializationEmitter),
        Box::new(ManipulateValueEmitter),
    ]
}

fn call(method: &XMethod) -> Op {
    if method.is_static() {
        Op::Call(method.clone())
    } else {
        Op::Callvirt(method.clone())
    }
}

fn resolved_type(node: &XamlNode) -> EmitResult<XType> {
    node.value_type().ok_or_else(|| XamlLoadError::UnresolvedType {
        node: node.info(),
        name: node.type_name(),
    })
}

fn emit_arguments(
    ctx: &mut EmitContext<'_>,
    codegen: &mut dyn CodeGen,
    arguments: &[XamlNode],
    parameters: &[XType],
) -> EmitResult<()> {
    for (argument, param) in arguments.iter().zip(parameters) {
        ctx.emit(argument, codegen, Some(param))?;
    }
    Ok(())
}

/// Call an instance method on the stack top; a result is dropped
fn call_discarding(codegen: &mut dyn CodeGen, method: &XMethod) {
    codegen.emit(call(method));
    if method.return_type().is_some() {
        codegen.emit(Op::Pop);
    }
}

pub struct NewObjectEmitter;

impl NodeEmitter for NewObjectEmitter {
    fn emit(
        &self,
        node: &XamlNode,
        ctx: &mut EmitContext<'_>,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<Option<NodeEmitResult>> {
        let XamlNode::NewObject {
            ty,
            constructor,
            arguments,
            ..
        } = node
        else {
            return Ok(None);
        };
        emit_arguments(ctx, codegen, arguments, &constructor.parameters())?;
        codegen.emit(Op::Newobj(constructor.clone()));
        Ok(Some(NodeEmitResult::of(ty.clone())))
    }
}

pub struct TextNodeEmitter;

impl NodeEmitter for TextNodeEmitter {
    fn emit(
        &self,
        node: &XamlNode,
        ctx: &mut EmitContext<'_>,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<Option<NodeEmitResult>> {
        let XamlNode::Text { ty, text, .. } = node else {
            return Ok(None);
        };
        let string = &ctx.config().well_known_types().string;
        if ty.clr() != Some(string) {
            return Err(XamlLoadError::emit(
                "Text node type wasn't resolved to well-known System.String",
                node,
            ));
        }
        codegen.emit(Op::Ldstr(text.clone()));
        Ok(Some(NodeEmitResult::of(string.clone())))
    }
}

pub struct MethodCallEmitter;

impl NodeEmitter for MethodCallEmitter {
    fn emit(
        &self,
        node: &XamlNode,
        ctx: &mut EmitContext<'_>,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<Option<NodeEmitResult>> {
        let XamlNode::MethodCall {
            method,
            instance,
            arguments,
            ..
        } = node
        else {
            return Ok(None);
        };
        if let Some(instance) = instance {
            let ty = resolved_type(instance)?;
            ctx.emit(instance, codegen, Some(&ty))?;
        }
        emit_arguments(ctx, codegen, arguments, &method.parameters())?;
        codegen.emit(call(method));
        Ok(Some(NodeEmitResult {
            return_type: method.return_type(),
        }))
    }
}

pub struct PropertyAssignmentEmitter;

impl NodeEmitter for PropertyAssignmentEmitter {
    fn emit(
        &self,
        node: &XamlNode,
        ctx: &mut EmitContext<'_>,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<Option<NodeEmitResult>> {
        let XamlNode::PropertyAssignment { property, value, .. } = node else {
            return Ok(None);
        };
        let setter = property.setter().ok_or_else(|| {
            XamlLoadError::emit(format!("Property {} has no setter", property.name()), node)
        })?;
        let target = setter
            .parameters()
            .last()
            .cloned()
            .unwrap_or_else(|| property.property_type());
        ctx.emit(value, codegen, Some(&target))?;
        call_discarding(codegen, &setter);
        Ok(Some(NodeEmitResult::void()))
    }
}

pub struct PropertyValueManipulationEmitter;

impl NodeEmitter for PropertyValueManipulationEmitter {
    fn emit(
        &self,
        node: &XamlNode,
        ctx: &mut EmitContext<'_>,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<Option<NodeEmitResult>> {
        let XamlNode::PropertyValueManipulation {
            property,
            manipulation,
            ..
        } = node
        else {
            return Ok(None);
        };
        let getter = property.getter().ok_or_else(|| {
            XamlLoadError::emit(format!("Property {} has no getter", property.name()), node)
        })?;
        codegen.emit(call(&getter));
        ctx.emit(manipulation, codegen, None)?;
        Ok(Some(NodeEmitResult::void()))
    }
}

pub struct ManipulationGroupEmitter;

impl NodeEmitter for ManipulationGroupEmitter {
    fn emit(
        &self,
        node: &XamlNode,
        ctx: &mut EmitContext<'_>,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<Option<NodeEmitResult>> {
        let XamlNode::ManipulationGroup { children, .. } = node else {
            return Ok(None);
        };
        if children.is_empty() {
            codegen.emit(Op::Pop);
        }
        for (index, child) in children.iter().enumerate() {
            if index + 1 < children.len() {
                codegen.emit(Op::Dup);
            }
            ctx.emit(child, codegen, None)?;
        }
        Ok(Some(NodeEmitResult::void()))
    }
}

pub struct ValueWithManipulationsEmitter;

impl NodeEmitter for ValueWithManipulationsEmitter {
    fn emit(
        &self,
        node: &XamlNode,
        ctx: &mut EmitContext<'_>,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<Option<NodeEmitResult>> {
        let XamlNode::ValueWithManipulations {
            value, manipulation, ..
        } = node
        else {
            return Ok(None);
        };
        let ty = resolved_type(value)?;
        ctx.emit(value, codegen, Some(&ty))?;
        codegen.emit(Op::Dup);
        ctx.emit(manipulation, codegen, None)?;
        Ok(Some(NodeEmitResult::of(ty)))
    }
}

pub struct MarkupExtensionEmitter;

impl NodeEmitter for MarkupExtensionEmitter {
    fn emit(
        &self,
        node: &XamlNode,
        ctx: &mut EmitContext<'_>,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<Option<NodeEmitResult>> {
        let XamlNode::MarkupExtension {
            value,
            property,
            provide_value,
            adder,
            ..
        } = node
        else {
            return Ok(None);
        };

        // Current value: the owning object; an adder works on the collection
        let (target, parameter) = match adder {
            Some(add) => {
                let getter = property.getter().ok_or_else(|| {
                    XamlLoadError::emit(format!("Property {} has no getter", property.name()), node)
                })?;
                codegen.emit(call(&getter));
                (add.clone(), add.parameters().last().cloned())
            }
            None => {
                let setter = property.setter().ok_or_else(|| {
                    XamlLoadError::emit(format!("Property {} has no setter", property.name()), node)
                })?;
                let parameter = setter.parameters().last().cloned();
                (setter, parameter)
            }
        };
        let parameter = parameter.unwrap_or_else(|| property.property_type());

        let extension_type = resolved_type(value)?;
        ctx.emit(value, codegen, Some(&extension_type))?;

        if let Some(sp) = provide_value.parameters().first() {
            let context = ctx.context_local(codegen).ok_or_else(|| {
                XamlLoadError::emit("ProvideValue requires the runtime context local", node)
            })?;
            codegen.emit(Op::Ldloc(context));
            let context_type = ctx.runtime().context_type.clone();
            if &context_type != sp {
                ctx.emit_convert(node, &context_type, sp, codegen)?;
            }
        }
        codegen.emit(call(provide_value));

        let provided = provide_value.return_type().ok_or_else(|| {
            XamlLoadError::emit("ProvideValue must return a value", node)
        })?;
        if provided != parameter {
            ctx.emit_convert(node, &provided, &parameter, codegen)?;
        }
        call_discarding(codegen, &target);
        Ok(Some(NodeEmitResult::void()))
    }
}

pub struct ObjectInitializationEmitter;

impl NodeEmitter for ObjectInitializationEmitter {
    fn emit(
        &self,
        node: &XamlNode,
        ctx: &mut EmitContext<'_>,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<Option<NodeEmitResult>> {
        let XamlNode::ObjectInitialization {
            manipulation,
            begin,
            end,
            ..
        } = node
        else {
            return Ok(None);
        };
        codegen.emit(Op::Dup);
        call_discarding(codegen, begin);
        codegen.emit(Op::Dup);
        ctx.emit(manipulation, codegen, None)?;
        call_discarding(codegen, end);
        Ok(Some(NodeEmitResult::void()))
    }
}

pub struct ManipulateValueEmitter;

impl NodeEmitter for ManipulateValueEmitter {
    fn emit(
        &self,
        node: &XamlNode,
        ctx: &mut EmitContext<'_>,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<Option<NodeEmitResult>> {
        let XamlNode::ManipulateValue {
            value, manipulation, ..
        } = node
        else {
            return Ok(None);
        };
        codegen.emit(Op::Pop);
        let ty = resolved_type(value)?;
        ctx.emit(value, codegen, Some(&ty))?;
        ctx.emit(manipulation, codegen, None)?;
        Ok(Some(NodeEmitResult::void()))
    }
}
