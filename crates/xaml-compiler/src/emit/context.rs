//! Emission Context
//!
//! Holds the per-compile emission state: the emitter list, compiler-local
//! slots, the per-procedure runtime-context local and the pool of reusable
//! temporaries.

use super::convert::{plan_conversion, Conversion};
use super::{CodeGen, LocalSlot, NodeEmitResult, NodeEmitter, Op, ProcedureId, RuntimeContext};
use crate::ast::{LocalId, XamlNode};
use crate::config::TransformerConfiguration;
use crate::error::{EmitResult, XamlLoadError};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;
use xaml_types::XType;

type LocalPool = Rc<RefCell<Vec<(XType, ProcedureId, LocalSlot)>>>;

/// Temporary borrowed from the pool; returned when dropped
pub struct PooledLocal {
    slot: LocalSlot,
    ty: XType,
    procedure: ProcedureId,
    pool: LocalPool,
}

impl PooledLocal {
    pub fn slot(&self) -> LocalSlot {
        self.slot
    }
}

impl Drop for PooledLocal {
    fn drop(&mut self) {
        self.pool
            .borrow_mut()
            .push((self.ty.clone(), self.procedure, self.slot));
    }
}

/// State of one compile's emission
pub struct EmitContext<'a> {
    config: &'a TransformerConfiguration,
    runtime: &'a RuntimeContext,
    emitters: &'a [Box<dyn NodeEmitter>],
    context_locals: FxHashMap<ProcedureId, LocalSlot>,
    locals: FxHashMap<LocalId, (LocalSlot, ProcedureId)>,
    pool: LocalPool,
}

impl<'a> EmitContext<'a> {
    pub fn new(
        config: &'a TransformerConfiguration,
        runtime: &'a RuntimeContext,
        emitters: &'a [Box<dyn NodeEmitter>],
    ) -> Self {
        Self {
            config,
            runtime,
            emitters,
            context_locals: FxHashMap::default(),
            locals: FxHashMap::default(),
            pool: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn config(&self) -> &'a TransformerConfiguration {
        self.config
    }

    pub fn runtime(&self) -> &'a RuntimeContext {
        self.runtime
    }

    /// Construct the runtime context object into a new local of the
    /// procedure; the constructor receives argument 0 when it takes one
    pub fn init_context_local(&mut self, codegen: &mut dyn CodeGen) -> LocalSlot {
        let slot = codegen.define_local(&self.runtime.context_type);
        if self.runtime.constructor.parameters().len() == 1 {
            codegen.emit(Op::Ldarg(0));
        }
        codegen
            .emit(Op::Newobj(self.runtime.constructor.clone()))
            .emit(Op::Stloc(slot));
        self.context_locals.insert(codegen.procedure(), slot);
        slot
    }

    /// Runtime context local of the procedure, if one was initialized
    pub fn context_local(&self, codegen: &dyn CodeGen) -> Option<LocalSlot> {
        self.context_locals.get(&codegen.procedure()).copied()
    }

    /// Borrow a temporary of type `ty`, reusing a returned one of the same
    /// type and procedure when available
    pub fn get_local(&mut self, codegen: &mut dyn CodeGen, ty: &XType) -> PooledLocal {
        let procedure = codegen.procedure();
        let reused = {
            let mut pool = self.pool.borrow_mut();
            pool.iter()
                .position(|(t, p, _)| t == ty && *p == procedure)
                .map(|index| pool.remove(index).2)
        };
        let slot = match reused {
            Some(slot) => {
                trace!(ty = %ty, slot = slot.0, "reusing pooled local");
                slot
            }
            None => codegen.define_local(ty),
        };
        PooledLocal {
            slot,
            ty: ty.clone(),
            procedure,
            pool: self.pool.clone(),
        }
    }

    /// Store the stack top into a compiler local, allocating it on first use
    pub fn store_local(
        &mut self,
        node: &XamlNode,
        local: LocalId,
        ty: &XType,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<()> {
        let procedure = codegen.procedure();
        let slot = match self.locals.get(&local) {
            Some(&(slot, owner)) if owner == procedure => slot,
            Some(_) => return Err(XamlLoadError::LocalProcedureMismatch { node: node.info() }),
            None => {
                let slot = codegen.define_local(ty);
                self.locals.insert(local, (slot, procedure));
                slot
            }
        };
        codegen.emit(Op::Stloc(slot));
        Ok(())
    }

    /// Load a compiler local written earlier in the same procedure
    pub fn load_local(&mut self, node: &XamlNode, local: LocalId, codegen: &mut dyn CodeGen) -> EmitResult<()> {
        match self.locals.get(&local) {
            Some(&(slot, owner)) if owner == codegen.procedure() => {
                codegen.emit(Op::Ldloc(slot));
                Ok(())
            }
            Some(_) => Err(XamlLoadError::LocalProcedureMismatch { node: node.info() }),
            None => Err(XamlLoadError::UninitializedLocal { node: node.info() }),
        }
    }

    /// Emit `node` and convert its result to `expected` (`None` = void)
    pub fn emit(
        &mut self,
        node: &XamlNode,
        codegen: &mut dyn CodeGen,
        expected: Option<&XType>,
    ) -> EmitResult<NodeEmitResult> {
        let result = self.emit_core(node, codegen)?;

        match (&result.return_type, expected) {
            (None, None) => {}
            (Some(produced), None) => {
                return Err(XamlLoadError::TypeMismatch {
                    node: node.info(),
                    produced: produced.fqn(),
                    expected: "void".to_string(),
                })
            }
            (None, Some(expected)) => {
                return Err(XamlLoadError::TypeMismatch {
                    node: node.info(),
                    produced: "void".to_string(),
                    expected: expected.fqn(),
                })
            }
            (Some(produced), Some(expected)) => {
                if produced != expected {
                    self.emit_convert(node, produced, expected, codegen)?;
                }
            }
        }

        Ok(result)
    }

    /// Emit the conversion of the stack top from `from` to `to`
    pub fn emit_convert(
        &mut self,
        node: &XamlNode,
        from: &XType,
        to: &XType,
        codegen: &mut dyn CodeGen,
    ) -> EmitResult<()> {
        let conversion = plan_conversion(self.config.well_known_types(), from, to).ok_or_else(|| {
            XamlLoadError::NoConversion {
                node: node.info(),
                from: from.fqn(),
                to: to.fqn(),
            }
        })?;

        match conversion {
            Conversion::Upcast => {}
            Conversion::Box(ty) => {
                codegen.emit(Op::Box(ty));
            }
            Conversion::UnboxAny(ty) => {
                codegen.emit(Op::UnboxAny(ty));
            }
            Conversion::NullableWrap(ctor) => {
                codegen.emit(Op::Newobj(ctor));
            }
            Conversion::NullableUnwrap(getter) => {
                let local = self.get_local(codegen, from);
                codegen
                    .emit(Op::Stloc(local.slot()))
                    .emit(Op::Ldloca(local.slot()))
                    .emit(Op::Call(getter));
            }
            Conversion::Implicit(method) => {
                codegen.emit(Op::Call(method));
            }
        }
        Ok(())
    }

    fn emit_core(&mut self, node: &XamlNode, codegen: &mut dyn CodeGen) -> EmitResult<NodeEmitResult> {
        let emitters = self.emitters;
        for emitter in emitters {
            if let Some(result) = emitter.emit(node, self, codegen)? {
                trace!(kind = node.kind(), "emitted node");
                return Ok(result);
            }
        }

        match node.emit_self(self, codegen)? {
            Some(result) => Ok(result),
            None => Err(XamlLoadError::NoEmitter { node: node.info() }),
        }
    }
}
