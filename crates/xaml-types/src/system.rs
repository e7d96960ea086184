//! Type universe entry point shared by both backends

use crate::error::{TypeSystemError, TypeSystemResult};
use crate::handle::{XAssembly, XType};

/// A universe of assemblies and the types they define
pub trait TypeSystem: Send + Sync {
    /// All assemblies, in registration order
    fn assemblies(&self) -> Vec<XAssembly>;

    /// Assembly by name
    fn find_assembly(&self, name: &str) -> Option<XAssembly> {
        self.assemblies().into_iter().find(|a| a.name() == name)
    }

    /// First type with the given full name, in assembly order
    fn find_type(&self, full_name: &str) -> Option<XType> {
        self.assemblies()
            .iter()
            .find_map(|assembly| assembly.find_type(full_name))
    }

    /// Type with the given full name inside a specific assembly
    fn find_type_in(&self, full_name: &str, assembly: &str) -> Option<XType> {
        self.find_assembly(assembly)?.find_type(full_name)
    }

    /// Like [`TypeSystem::find_type`], but a missing type is an error
    fn get_type(&self, full_name: &str) -> TypeSystemResult<XType> {
        self.find_type(full_name)
            .ok_or_else(|| TypeSystemError::UndefinedType {
                name: full_name.to_string(),
            })
    }
}
