//! Markup Compiler Type System
//!
//! Backend-neutral view of a type universe. The same handles are produced by
//! [`LoadedTypeSystem`] (definitions registered in-process) and
//! [`MetadataTypeSystem`] (definitions read from serialized metadata), so the
//! transformation and emission stages never depend on where a type came from.

#![warn(missing_docs)]

pub mod constant;
pub mod error;
pub mod handle;
pub mod loaded;
pub mod metadata;
pub mod system;

pub use constant::ConstantValue;
pub use error::{TypeSystemError, TypeSystemResult};
pub use handle::{
    full_type_name, AssemblyInfo, ConstructorInfo, FieldInfo, MemberKey, MethodInfo,
    PropertyInfo, TypeInfo, TypeKey, TypeKind, XAssembly, XConstructor, XField, XMethod,
    XProperty, XType, OBJECT_TYPE_NAME,
};
pub use loaded::{LoadedSig, LoadedTypeSystem, LoadedTypeSystemBuilder, TypeDefBuilder, TypeDefId};
pub use metadata::{
    AssemblyMetadata, ConstructorDefinition, FieldDefinition, MetadataTypeSystem,
    MethodDefinition, PropertyDefinition, TypeDefinition, TypeSignature,
};
pub use system::TypeSystem;
