//! Markup Compiler
//!
//! Turns a parsed markup document into stack-machine code:
//!
//! 1. [`transform`] rewrites the raw tree (XML type names, property names,
//!    text) into a tree of resolved type-system entities.
//! 2. [`emit`] walks the resolved tree and writes a *populate* and a *create*
//!    procedure into a host-provided [`emit::TypeBuilder`].
//!
//! [`XamlCompiler`] drives both stages.

pub mod ast;
pub mod compiler;
pub mod config;
pub mod emit;
pub mod error;
pub mod transform;

pub use ast::{
    LineInfo, LocalId, PropertyReference, XamlDocument, XamlNode, XamlTypeReference,
    XmlTypeReference, XAML2006,
};
pub use compiler::{TransformOutcome, XamlCompiler};
pub use config::{ClrNamespace, TransformerConfiguration, TypeMappings, TypeMappingsSpec, WellKnownTypes};
pub use emit::{
    CodeGen, EmitContext, LocalSlot, MethodSignature, NodeEmitResult, NodeEmitter, Op,
    ProcedureId, RuntimeContext, TypeBuilder,
};
pub use error::{EmitResult, NodeInfo, TransformResult, XamlError, XamlLoadError, XamlParseError};
pub use transform::{AstTransformer, TransformContext, TransformFailure};
