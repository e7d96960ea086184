//! Code Emission
//!
//! Walks a resolved tree and writes stack-machine instructions into
//! procedures provided by a [`TypeBuilder`]. The instruction encoder itself
//! belongs to the host; this module only decides which [`Op`]s to emit.

mod context;
pub mod convert;
mod emitters;
mod node;
pub mod recording;

pub use context::{EmitContext, PooledLocal};
pub use emitters::{
    default_emitters, ManipulateValueEmitter, ManipulationGroupEmitter, MarkupExtensionEmitter,
    MethodCallEmitter, NewObjectEmitter, ObjectInitializationEmitter,
    PropertyAssignmentEmitter, PropertyValueManipulationEmitter, TextNodeEmitter,
    ValueWithManipulationsEmitter,
};

use crate::ast::XamlNode;
use crate::error::EmitResult;
use std::fmt;
use xaml_types::{XConstructor, XField, XMethod, XType};

/// Local variable slot of one procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalSlot(pub u32);

/// Identity of a generated procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcedureId(pub u32);

impl fmt::Display for ProcedureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcedureId({})", self.0)
    }
}

/// Stack-machine instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Ldarg(u16),
    Ldloc(LocalSlot),
    Stloc(LocalSlot),
    /// Load the address of a local
    Ldloca(LocalSlot),
    Ldnull,
    Ldstr(String),
    LdcI4(i32),
    LdcI8(i64),
    LdcR8(f64),
    /// Load a runtime type token
    LdType(XType),
    Newobj(XConstructor),
    Call(XMethod),
    Callvirt(XMethod),
    Stfld(XField),
    Ldsfld(XField),
    Box(XType),
    UnboxAny(XType),
    Dup,
    Pop,
    Ret,
}

/// Signature of a procedure to generate
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub name: String,
    /// `None` for void
    pub return_type: Option<XType>,
    pub parameters: Vec<XType>,
    pub is_public: bool,
    pub is_static: bool,
}

/// Instruction sink of one procedure
pub trait CodeGen {
    /// Procedure this generator writes into
    fn procedure(&self) -> ProcedureId;

    /// Allocate a new local of type `ty`
    fn define_local(&mut self, ty: &XType) -> LocalSlot;

    /// Append an instruction
    fn emit(&mut self, op: Op) -> &mut dyn CodeGen;
}

/// Host type that receives the generated procedures
pub trait TypeBuilder {
    /// Declare a procedure
    fn define_method(&mut self, signature: MethodSignature) -> ProcedureId;

    /// Callable handle of a declared procedure
    fn method(&self, id: ProcedureId) -> Option<XMethod>;

    /// Instruction sink of a declared procedure
    fn generator(&mut self, id: ProcedureId) -> Option<&mut dyn CodeGen>;
}

/// Runtime support object passed to generated code
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    pub context_type: XType,
    /// Takes no argument or the service provider
    pub constructor: XConstructor,
    /// Field receiving the root instance
    pub root_object_field: XField,
}

/// What an emitter left on the stack
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEmitResult {
    /// `None` when nothing was left
    pub return_type: Option<XType>,
}

impl NodeEmitResult {
    pub fn void() -> Self {
        Self { return_type: None }
    }

    pub fn of(ty: XType) -> Self {
        Self {
            return_type: Some(ty),
        }
    }
}

/// Emission strategy for some node kinds
pub trait NodeEmitter {
    /// Emit `node`, or `Ok(None)` if this emitter does not handle it
    fn emit(
        &self,
        node: &XamlNode,
        ctx: &mut EmitContext<'_>,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<Option<NodeEmitResult>>;
}
