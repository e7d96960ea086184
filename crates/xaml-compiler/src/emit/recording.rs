//! In-memory [`TypeBuilder`] that records instructions instead of encoding
//! them. Used by hosts that post-process the op stream and by the tests.

use super::{CodeGen, LocalSlot, MethodSignature, Op, ProcedureId, TypeBuilder};
use std::fmt;
use xaml_types::{MemberKey, MethodInfo, TypeKey, XMethod, XType};

/// Callable handle of a generated procedure
struct GeneratedMethod {
    key: MemberKey,
    signature: MethodSignature,
}

impl MethodInfo for GeneratedMethod {
    fn key(&self) -> &MemberKey {
        &self.key
    }

    fn is_public(&self) -> bool {
        self.signature.is_public
    }

    fn is_static(&self) -> bool {
        self.signature.is_static
    }

    fn return_type(&self) -> Option<XType> {
        self.signature.return_type.clone()
    }

    fn parameters(&self) -> Vec<XType> {
        self.signature.parameters.clone()
    }
}

/// One recorded procedure
#[derive(Debug, Clone)]
pub struct RecordedProcedure {
    pub id: ProcedureId,
    pub signature: MethodSignature,
    pub locals: Vec<XType>,
    pub ops: Vec<Op>,
}

impl CodeGen for RecordedProcedure {
    fn procedure(&self) -> ProcedureId {
        self.id
    }

    fn define_local(&mut self, ty: &XType) -> LocalSlot {
        self.locals.push(ty.clone());
        LocalSlot(self.locals.len() as u32 - 1)
    }

    fn emit(&mut self, op: Op) -> &mut dyn CodeGen {
        self.ops.push(op);
        self
    }
}

impl fmt::Display for RecordedProcedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} locals)", self.signature.name, self.locals.len())?;
        for (offset, op) in self.ops.iter().enumerate() {
            writeln!(f, "  {:04} {:?}", offset, op)?;
        }
        Ok(())
    }
}

/// Records every procedure declared on one generated type
pub struct RecordingTypeBuilder {
    key: TypeKey,
    procedures: Vec<RecordedProcedure>,
}

impl RecordingTypeBuilder {
    pub fn new(assembly: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            key: TypeKey::new(assembly, full_name),
            procedures: Vec::new(),
        }
    }

    /// Identity of the type being generated
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn procedures(&self) -> &[RecordedProcedure] {
        &self.procedures
    }

    /// First procedure declared under `name`
    pub fn procedure(&self, name: &str) -> Option<&RecordedProcedure> {
        self.procedures.iter().find(|p| p.signature.name == name)
    }
}

impl TypeBuilder for RecordingTypeBuilder {
    fn define_method(&mut self, signature: MethodSignature) -> ProcedureId {
        let id = ProcedureId(self.procedures.len() as u32);
        self.procedures.push(RecordedProcedure {
            id,
            signature,
            locals: Vec::new(),
            ops: Vec::new(),
        });
        id
    }

    fn method(&self, id: ProcedureId) -> Option<XMethod> {
        let procedure = self.procedures.get(id.0 as usize)?;
        Some(XMethod::new(GeneratedMethod {
            key: MemberKey::new(self.key.clone(), procedure.signature.name.clone(), id.0 as usize),
            signature: procedure.signature.clone(),
        }))
    }

    fn generator(&mut self, id: ProcedureId) -> Option<&mut dyn CodeGen> {
        self.procedures
            .get_mut(id.0 as usize)
            .map(|p| p as &mut dyn CodeGen)
    }
}
