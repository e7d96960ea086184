//! Self-emission of nodes without a dedicated emitter

use super::{CodeGen, EmitContext, NodeEmitResult, Op};
use crate::ast::{XamlNode, XamlTypeReference};
use crate::error::{EmitResult, XamlLoadError};
use xaml_types::ConstantValue;

impl XamlNode {
    /// Emit this node directly; `Ok(None)` when the node cannot emit itself
    pub fn emit_self(
        &self,
        ctx: &mut EmitContext<'_>,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<Option<NodeEmitResult>> {
        match self {
            XamlNode::CompilerLocal { local, ty, .. } => {
                ctx.load_local(self, *local, codegen)?;
                Ok(Some(NodeEmitResult::of(ty.clone())))
            }
            XamlNode::LocalInitialization { local, value, .. } => {
                let ty = value.value_type().ok_or_else(|| XamlLoadError::UnresolvedType {
                    node: value.info(),
                    name: value.type_name(),
                })?;
                ctx.emit(value, codegen, Some(&ty))?;
                codegen.emit(Op::Dup);
                ctx.store_local(self, *local, &ty, codegen)?;
                Ok(Some(NodeEmitResult::of(ty)))
            }
            XamlNode::Constant { ty, value, .. } => {
                codegen.emit(match value {
                    ConstantValue::Null => Op::Ldnull,
                    ConstantValue::Bool(b) => Op::LdcI4(i32::from(*b)),
                    ConstantValue::I32(v) => Op::LdcI4(*v),
                    ConstantValue::I64(v) => Op::LdcI8(*v),
                    ConstantValue::F64(v) => Op::LdcR8(*v),
                    ConstantValue::String(s) => Op::Ldstr(s.clone()),
                });
                Ok(Some(NodeEmitResult::of(ty.clone())))
            }
            XamlNode::TypeOf { target, ty, .. } => {
                codegen.emit(Op::LdType(target.clone()));
                Ok(Some(NodeEmitResult::of(ty.clone())))
            }
            XamlNode::StaticField { field, .. } => {
                codegen.emit(Op::Ldsfld(field.clone()));
                Ok(Some(NodeEmitResult::of(field.field_type())))
            }
            XamlNode::NoReturnMethodCall { method, arguments, .. } => {
                for (argument, param) in arguments.iter().zip(method.parameters()) {
                    ctx.emit(argument, codegen, Some(&param))?;
                }
                codegen.emit(if method.is_static() {
                    Op::Call(method.clone())
                } else {
                    Op::Callvirt(method.clone())
                });
                if method.return_type().is_some() {
                    codegen.emit(Op::Pop);
                }
                Ok(Some(NodeEmitResult::void()))
            }
            XamlNode::Object {
                ty: XamlTypeReference::Xml(xml),
                ..
            }
            | XamlNode::Text {
                ty: XamlTypeReference::Xml(xml),
                ..
            } => Err(XamlLoadError::UnresolvedType {
                node: self.info(),
                name: xml.to_string(),
            }),
            _ => Ok(None),
        }
    }
}
