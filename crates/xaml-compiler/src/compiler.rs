//! Compiler Driver
//!
//! [`XamlCompiler`] owns the pass and emitter lists. `transform` rewrites a
//! raw document into a resolved tree; `compile` writes the create and
//! populate procedures for a resolved tree into a host type.

use crate::ast::{XamlDocument, XamlNode};
use crate::config::TransformerConfiguration;
use crate::emit::{
    default_emitters, CodeGen, EmitContext, MethodSignature, NodeEmitter, Op, ProcedureId,
    RuntimeContext, TypeBuilder,
};
use crate::error::{EmitResult, TransformResult, XamlLoadError, XamlParseError};
use crate::transform::{default_simplifiers, default_transformers, AstTransformer, TransformContext};
use std::sync::Arc;
use tracing::debug;
use xaml_types::{XMethod, XType};

/// Result of a successful `transform`
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    /// Rewritten document
    pub document: XamlDocument,
    /// Errors recovered from in non-strict mode
    pub diagnostics: Vec<XamlParseError>,
}

pub struct XamlCompiler {
    config: Arc<TransformerConfiguration>,
    pub transformers: Vec<Box<dyn AstTransformer>>,
    pub simplifiers: Vec<Box<dyn AstTransformer>>,
    pub emitters: Vec<Box<dyn NodeEmitter>>,
}

impl XamlCompiler {
    /// Create a compiler; `fill_with_defaults` registers the default passes
    /// and emitters, otherwise every list starts empty
    pub fn new(config: Arc<TransformerConfiguration>, fill_with_defaults: bool) -> Self {
        let mut compiler = Self {
            config,
            transformers: Vec::new(),
            simplifiers: Vec::new(),
            emitters: Vec::new(),
        };
        if fill_with_defaults {
            compiler.transformers = default_transformers();
            compiler.simplifiers = default_simplifiers();
            compiler.emitters = default_emitters();
        }
        compiler
    }

    pub fn configuration(&self) -> &Arc<TransformerConfiguration> {
        &self.config
    }

    /// Run every pass over the document
    pub fn transform(&self, document: XamlDocument, strict: bool) -> Result<TransformOutcome, XamlParseError> {
        let XamlDocument {
            root,
            namespace_aliases,
        } = document;
        let mut ctx = TransformContext::new(self.config.clone(), namespace_aliases.clone(), strict);

        let mut root = root;
        for pass in &self.transformers {
            debug!(pass = pass.name(), "running transformer");
            root = apply(pass.as_ref(), &mut ctx, root)?;
            root = self.simplify(&mut ctx, root)?;
        }

        Ok(TransformOutcome {
            document: XamlDocument {
                root,
                namespace_aliases,
            },
            diagnostics: ctx.diagnostics,
        })
    }

    /// Run the simplifiers until the tree stops changing
    fn simplify(&self, ctx: &mut TransformContext, mut root: XamlNode) -> TransformResult<XamlNode> {
        if self.simplifiers.is_empty() {
            return Ok(root);
        }
        loop {
            let before = root.clone();
            for pass in &self.simplifiers {
                root = apply(pass.as_ref(), ctx, root)?;
            }
            if root == before {
                return Ok(root);
            }
        }
    }

    /// Emit the populate and create procedures for a transformed root
    pub fn compile(
        &self,
        root: &XamlNode,
        type_builder: &mut dyn TypeBuilder,
        runtime: &RuntimeContext,
        populate_name: &str,
        create_name: &str,
    ) -> Result<(), XamlLoadError> {
        let XamlNode::ValueWithManipulations {
            value, manipulation, ..
        } = root
        else {
            return Err(XamlLoadError::InvalidRoot {
                node: root.info(),
                message: "root node must be ValueWithManipulations".to_string(),
            });
        };
        let root_type = value.value_type().ok_or_else(|| XamlLoadError::UnresolvedType {
            node: value.info(),
            name: value.type_name(),
        })?;
        let service_provider = self.config.type_mappings().service_provider.clone();

        let populate = type_builder.define_method(MethodSignature {
            name: populate_name.to_string(),
            return_type: None,
            parameters: vec![service_provider.clone(), root_type.clone()],
            is_public: true,
            is_static: true,
        });
        let create = type_builder.define_method(MethodSignature {
            name: create_name.to_string(),
            return_type: Some(root_type.clone()),
            parameters: vec![service_provider],
            is_public: true,
            is_static: true,
        });
        let populate_method = type_builder
            .method(populate)
            .ok_or_else(|| missing_procedure(root, populate))?;

        let mut ctx = EmitContext::new(&self.config, runtime, &self.emitters);

        let codegen = type_builder
            .generator(populate)
            .ok_or_else(|| missing_procedure(root, populate))?;
        emit_populate(&mut ctx, codegen, runtime, manipulation)?;
        debug!(procedure = populate_name, "emitted populate procedure");

        let codegen = type_builder
            .generator(create)
            .ok_or_else(|| missing_procedure(root, create))?;
        emit_create(&mut ctx, codegen, value, &root_type, &populate_method)?;
        debug!(procedure = create_name, "emitted create procedure");

        Ok(())
    }
}

fn apply(pass: &dyn AstTransformer, ctx: &mut TransformContext, root: XamlNode) -> TransformResult<XamlNode> {
    root.visit(&mut |node| match pass.transform(ctx, node) {
        Ok(node) => Ok(node),
        Err(failure) => ctx.recover(failure),
    })
}

fn missing_procedure(root: &XamlNode, id: ProcedureId) -> XamlLoadError {
    XamlLoadError::emit(format!("type builder lost procedure {}", id), root)
}

fn emit_populate(
    ctx: &mut EmitContext<'_>,
    codegen: &mut dyn CodeGen,
    runtime: &RuntimeContext,
    manipulation: &XamlNode,
) -> EmitResult<()> {
    let context = ctx.init_context_local(codegen);
    codegen
        .emit(Op::Ldloc(context))
        .emit(Op::Ldarg(1))
        .emit(Op::Stfld(runtime.root_object_field.clone()))
        .emit(Op::Ldarg(1));
    ctx.emit(manipulation, codegen, None)?;
    codegen.emit(Op::Ret);
    Ok(())
}

fn emit_create(
    ctx: &mut EmitContext<'_>,
    codegen: &mut dyn CodeGen,
    value: &XamlNode,
    root_type: &XType,
    populate: &XMethod,
) -> EmitResult<()> {
    let trivial = matches!(value, XamlNode::NewObject { arguments, .. } if arguments.is_empty());
    if !trivial {
        ctx.init_context_local(codegen);
    }
    let instance = codegen.define_local(root_type);
    ctx.emit(value, codegen, Some(root_type))?;
    codegen
        .emit(Op::Stloc(instance))
        .emit(Op::Ldarg(0))
        .emit(Op::Ldloc(instance))
        .emit(Op::Call(populate.clone()))
        .emit(Op::Ldloc(instance))
        .emit(Op::Ret);
    Ok(())
}
