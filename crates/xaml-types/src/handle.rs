//! Backend-neutral handles over type-system definitions
//!
//! Transformation and emission code only ever sees these handles. Each backend
//! implements the `*Info` traits; the handles add structural equality, hashing
//! and the queries that are defined in terms of the capability traits
//! (assignability, member search through base types).

use crate::constant::ConstantValue;
use crate::error::TypeSystemResult;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Full name of the universal object type
pub const OBJECT_TYPE_NAME: &str = "System.Object";

/// Structural identity of a type: defining assembly, full name and the
/// identities of its concretized generic arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    /// Defining assembly name
    pub assembly: String,
    /// Namespace-qualified name (generic definitions keep their `` `N `` suffix)
    pub full_name: String,
    /// Keys of the generic arguments, empty for non-generic and open types
    pub generic_arguments: Vec<TypeKey>,
}

impl TypeKey {
    /// Create a key for a non-generic (or open generic) type
    pub fn new(assembly: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            assembly: assembly.into(),
            full_name: full_name.into(),
            generic_arguments: Vec::new(),
        }
    }

    /// Same definition instantiated with the given arguments
    pub fn instantiate(&self, arguments: Vec<TypeKey>) -> Self {
        Self {
            assembly: self.assembly.clone(),
            full_name: self.full_name.clone(),
            generic_arguments: arguments,
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)?;
        if !self.generic_arguments.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.generic_arguments.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

/// Structural identity of a member: the concrete declaring type, the member
/// name and its definition index inside the declaring type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberKey {
    /// Concrete declaring type
    pub declaring: TypeKey,
    /// Member name
    pub name: String,
    /// Index of the definition in its declaring type's member list
    pub index: usize,
}

impl MemberKey {
    /// Create a member key
    pub fn new(declaring: TypeKey, name: impl Into<String>, index: usize) -> Self {
        Self {
            declaring,
            name: name.into(),
            index,
        }
    }
}

/// Kind of a type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Reference type
    #[default]
    Class,
    /// Value type
    Struct,
    /// Interface
    Interface,
    /// Enumeration (a value type whose constants are literal fields)
    Enum,
}

/// Capabilities every backend type definition exposes
pub trait TypeInfo: Send + Sync {
    /// Structural identity
    fn key(&self) -> &TypeKey;
    /// Simple name (without namespace)
    fn name(&self) -> &str;
    /// Namespace, empty for the global namespace
    fn namespace(&self) -> &str;
    /// Definition kind
    fn kind(&self) -> TypeKind;
    /// Whether the type is visible outside its assembly
    fn is_public(&self) -> bool;
    /// Direct base type
    fn base_type(&self) -> Option<XType>;
    /// Directly implemented interfaces
    fn interfaces(&self) -> Vec<XType>;
    /// Concretized generic arguments
    fn generic_arguments(&self) -> Vec<XType>;
    /// Open definition of a constructed generic type
    fn generic_type_definition(&self) -> Option<XType>;
    /// Instantiate this open generic definition
    fn make_generic_type(&self, arguments: &[XType]) -> TypeSystemResult<XType>;
    /// Declared methods (accessors included)
    fn methods(&self) -> Vec<XMethod>;
    /// Declared constructors
    fn constructors(&self) -> Vec<XConstructor>;
    /// Declared properties
    fn properties(&self) -> Vec<XProperty>;
    /// Declared fields
    fn fields(&self) -> Vec<XField>;
    /// Types of the custom attributes applied to the type
    fn custom_attributes(&self) -> Vec<XType>;
}

/// Capabilities of a method definition
pub trait MethodInfo: Send + Sync {
    /// Structural identity
    fn key(&self) -> &MemberKey;
    /// Whether the method is visible
    fn is_public(&self) -> bool;
    /// Whether the method is static
    fn is_static(&self) -> bool;
    /// Return type, `None` for void
    fn return_type(&self) -> Option<XType>;
    /// Parameter types in declaration order
    fn parameters(&self) -> Vec<XType>;
}

/// Capabilities of a constructor definition
pub trait ConstructorInfo: Send + Sync {
    /// Structural identity
    fn key(&self) -> &MemberKey;
    /// Whether the constructor is visible
    fn is_public(&self) -> bool;
    /// Whether this is a type initializer
    fn is_static(&self) -> bool;
    /// Parameter types in declaration order
    fn parameters(&self) -> Vec<XType>;
}

/// Capabilities of a field definition
pub trait FieldInfo: Send + Sync {
    /// Structural identity
    fn key(&self) -> &MemberKey;
    /// Field type, with the declaring type's generic arguments substituted
    fn field_type(&self) -> XType;
    /// Whether the field is visible
    fn is_public(&self) -> bool;
    /// Whether the field is static
    fn is_static(&self) -> bool;
    /// Whether the field is a compile-time literal
    fn is_literal(&self) -> bool;
    /// Constant attached to the definition, if any
    fn constant(&self) -> Option<ConstantValue>;
}

/// Capabilities of a property definition
pub trait PropertyInfo: Send + Sync {
    /// Structural identity
    fn key(&self) -> &MemberKey;
    /// Property type
    fn property_type(&self) -> XType;
    /// Getter accessor
    fn getter(&self) -> Option<XMethod>;
    /// Setter accessor
    fn setter(&self) -> Option<XMethod>;
    /// Types of the custom attributes applied to the property
    fn custom_attributes(&self) -> Vec<XType>;
}

/// Capabilities of an assembly
pub trait AssemblyInfo: Send + Sync {
    /// Assembly name
    fn name(&self) -> &str;
    /// Types defined by the assembly
    fn types(&self) -> Vec<XType>;
    /// Look up a type by full name
    fn find_type(&self, full_name: &str) -> Option<XType>;
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $info:ident, $key:ty) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(Arc<dyn $info>);

        impl $name {
            /// Wrap a backend definition
            pub fn new(info: impl $info + 'static) -> Self {
                Self(Arc::new(info))
            }

            /// Structural identity
            pub fn key(&self) -> &$key {
                self.0.key()
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0.key() == other.0.key()
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.key().hash(state);
            }
        }
    };
}

handle!(
    /// Handle to a (possibly constructed generic) type
    XType,
    TypeInfo,
    TypeKey
);
handle!(
    /// Handle to a method of a concrete type
    XMethod,
    MethodInfo,
    MemberKey
);
handle!(
    /// Handle to a constructor of a concrete type
    XConstructor,
    ConstructorInfo,
    MemberKey
);
handle!(
    /// Handle to a field of a concrete type
    XField,
    FieldInfo,
    MemberKey
);
handle!(
    /// Handle to a property of a concrete type
    XProperty,
    PropertyInfo,
    MemberKey
);

impl XType {
    /// Simple name
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Namespace
    pub fn namespace(&self) -> &str {
        self.0.namespace()
    }

    /// Namespace-qualified name of the definition
    pub fn full_name(&self) -> &str {
        &self.key().full_name
    }

    /// Name including generic arguments, for diagnostics
    pub fn fqn(&self) -> String {
        self.key().to_string()
    }

    /// Defining assembly
    pub fn assembly_name(&self) -> &str {
        &self.key().assembly
    }

    /// Definition kind
    pub fn kind(&self) -> TypeKind {
        self.0.kind()
    }

    /// Whether the type is visible outside its assembly
    pub fn is_public(&self) -> bool {
        self.0.is_public()
    }

    /// Whether values of this type are stored inline
    pub fn is_value_type(&self) -> bool {
        matches!(self.kind(), TypeKind::Struct | TypeKind::Enum)
    }

    /// Whether this is an enumeration
    pub fn is_enum(&self) -> bool {
        self.kind() == TypeKind::Enum
    }

    /// Whether this is an interface
    pub fn is_interface(&self) -> bool {
        self.kind() == TypeKind::Interface
    }

    /// Whether this is the universal object type
    pub fn is_object(&self) -> bool {
        self.full_name() == OBJECT_TYPE_NAME && self.key().generic_arguments.is_empty()
    }

    /// Direct base type
    pub fn base_type(&self) -> Option<XType> {
        self.0.base_type()
    }

    /// Directly implemented interfaces
    pub fn interfaces(&self) -> Vec<XType> {
        self.0.interfaces()
    }

    /// Every interface implemented by this type, its bases, and the
    /// interfaces themselves
    pub fn all_interfaces(&self) -> Vec<XType> {
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        let mut pending: Vec<XType> = Vec::new();

        let mut current = Some(self.clone());
        while let Some(ty) = current {
            pending.extend(ty.interfaces());
            current = ty.base_type();
        }

        while let Some(iface) = pending.pop() {
            if seen.insert(iface.key().clone()) {
                pending.extend(iface.interfaces());
                result.push(iface);
            }
        }
        result
    }

    /// Concretized generic arguments
    pub fn generic_arguments(&self) -> Vec<XType> {
        self.0.generic_arguments()
    }

    /// Open generic definition of a constructed type
    pub fn generic_type_definition(&self) -> Option<XType> {
        self.0.generic_type_definition()
    }

    /// Instantiate an open generic definition
    pub fn make_generic_type(&self, arguments: &[XType]) -> TypeSystemResult<XType> {
        self.0.make_generic_type(arguments)
    }

    /// Declared methods
    pub fn methods(&self) -> Vec<XMethod> {
        self.0.methods()
    }

    /// Declared constructors
    pub fn constructors(&self) -> Vec<XConstructor> {
        self.0.constructors()
    }

    /// Declared properties
    pub fn properties(&self) -> Vec<XProperty> {
        self.0.properties()
    }

    /// Declared fields
    pub fn fields(&self) -> Vec<XField> {
        self.0.fields()
    }

    /// Custom attribute types applied to the type
    pub fn custom_attributes(&self) -> Vec<XType> {
        self.0.custom_attributes()
    }

    /// Methods of this type and its base types matching `predicate`,
    /// most derived first
    pub fn find_methods(&self, predicate: impl Fn(&XMethod) -> bool) -> Vec<XMethod> {
        let mut found = Vec::new();
        let mut current = Some(self.clone());
        while let Some(ty) = current {
            found.extend(ty.methods().into_iter().filter(|m| predicate(m)));
            current = ty.base_type();
        }
        // Interfaces declare members that are callable on the implementing type
        if self.is_interface() {
            for iface in self.all_interfaces() {
                found.extend(iface.methods().into_iter().filter(|m| predicate(m)));
            }
        }
        found
    }

    /// First method matching `predicate`
    pub fn find_method(&self, predicate: impl Fn(&XMethod) -> bool) -> Option<XMethod> {
        self.find_methods(predicate).into_iter().next()
    }

    /// Property by name, searching base types
    pub fn find_property(&self, name: &str) -> Option<XProperty> {
        let mut current = Some(self.clone());
        while let Some(ty) = current {
            if let Some(prop) = ty.properties().into_iter().find(|p| p.name() == name) {
                return Some(prop);
            }
            current = ty.base_type();
        }
        None
    }

    /// Field by name, searching base types
    pub fn find_field(&self, name: &str) -> Option<XField> {
        let mut current = Some(self.clone());
        while let Some(ty) = current {
            if let Some(field) = ty.fields().into_iter().find(|f| f.name() == name) {
                return Some(field);
            }
            current = ty.base_type();
        }
        None
    }

    /// Whether a custom attribute of type `attribute` is applied to the type
    /// or one of its base types
    pub fn has_attribute(&self, attribute: &XType) -> bool {
        let mut current = Some(self.clone());
        while let Some(ty) = current {
            if ty.custom_attributes().contains(attribute) {
                return true;
            }
            current = ty.base_type();
        }
        false
    }

    /// Check if a value of type `other` can be stored in a location of this type
    pub fn is_assignable_from(&self, other: &XType) -> bool {
        // Reflexivity
        if self == other {
            return true;
        }

        // Every type converts to object
        if self.is_object() {
            return true;
        }

        let mut current = other.base_type();
        while let Some(base) = current {
            if &base == self {
                return true;
            }
            current = base.base_type();
        }

        self.is_interface() && other.all_interfaces().contains(self)
    }
}

impl fmt::Debug for XType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XType({})", self.fqn())
    }
}

impl fmt::Display for XType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}

impl XMethod {
    /// Method name
    pub fn name(&self) -> &str {
        &self.key().name
    }

    /// Whether the method is visible
    pub fn is_public(&self) -> bool {
        self.0.is_public()
    }

    /// Whether the method is static
    pub fn is_static(&self) -> bool {
        self.0.is_static()
    }

    /// Return type, `None` for void
    pub fn return_type(&self) -> Option<XType> {
        self.0.return_type()
    }

    /// Parameter types
    pub fn parameters(&self) -> Vec<XType> {
        self.0.parameters()
    }
}

impl fmt::Debug for XMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameters().iter().map(XType::fqn).collect();
        write!(f, "{}::{}({})", self.key().declaring, self.name(), params.join(", "))
    }
}

impl XConstructor {
    /// Whether the constructor is visible
    pub fn is_public(&self) -> bool {
        self.0.is_public()
    }

    /// Whether this is a type initializer
    pub fn is_static(&self) -> bool {
        self.0.is_static()
    }

    /// Parameter types
    pub fn parameters(&self) -> Vec<XType> {
        self.0.parameters()
    }
}

impl fmt::Debug for XConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameters().iter().map(XType::fqn).collect();
        write!(f, "{}::.ctor({})", self.key().declaring, params.join(", "))
    }
}

impl XField {
    /// Field name
    pub fn name(&self) -> &str {
        &self.key().name
    }

    /// Field type resolved against the concrete declaring type
    pub fn field_type(&self) -> XType {
        self.0.field_type()
    }

    /// Whether the field is visible
    pub fn is_public(&self) -> bool {
        self.0.is_public()
    }

    /// Whether the field is static
    pub fn is_static(&self) -> bool {
        self.0.is_static()
    }

    /// Whether the field is a compile-time literal
    pub fn is_literal(&self) -> bool {
        self.0.is_literal()
    }

    /// The constant of a literal field; `None` for non-literal fields and
    /// literals without an attached constant
    pub fn literal_value(&self) -> Option<ConstantValue> {
        if self.is_literal() {
            self.0.constant()
        } else {
            None
        }
    }
}

impl fmt::Debug for XField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.key().declaring, self.name())
    }
}

impl XProperty {
    /// Property name
    pub fn name(&self) -> &str {
        &self.key().name
    }

    /// Property type
    pub fn property_type(&self) -> XType {
        self.0.property_type()
    }

    /// Getter accessor
    pub fn getter(&self) -> Option<XMethod> {
        self.0.getter()
    }

    /// Setter accessor
    pub fn setter(&self) -> Option<XMethod> {
        self.0.setter()
    }

    /// Custom attribute types applied to the property
    pub fn custom_attributes(&self) -> Vec<XType> {
        self.0.custom_attributes()
    }

    /// Name of the declaring type
    pub fn declaring_type_name(&self) -> String {
        self.key().declaring.to_string()
    }
}

impl fmt::Debug for XProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.key().declaring, self.name())
    }
}

/// Handle to an assembly
#[derive(Clone)]
pub struct XAssembly(Arc<dyn AssemblyInfo>);

impl XAssembly {
    /// Wrap a backend assembly
    pub fn new(info: impl AssemblyInfo + 'static) -> Self {
        Self(Arc::new(info))
    }

    /// Assembly name
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Types defined by the assembly
    pub fn types(&self) -> Vec<XType> {
        self.0.types()
    }

    /// Look up a type by full name
    pub fn find_type(&self, full_name: &str) -> Option<XType> {
        self.0.find_type(full_name)
    }
}

impl PartialEq for XAssembly {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for XAssembly {}

impl fmt::Debug for XAssembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XAssembly({})", self.name())
    }
}

/// Unbound generic parameter, exposed by members of open generic definitions
pub(crate) struct GenericParameterType {
    key: TypeKey,
    name: String,
}

impl GenericParameterType {
    pub(crate) fn handle(owner: &TypeKey, index: usize, name: &str) -> XType {
        XType::new(Self {
            key: TypeKey::new(owner.assembly.clone(), format!("{}!{}", owner.full_name, index)),
            name: name.to_string(),
        })
    }
}

impl TypeInfo for GenericParameterType {
    fn key(&self) -> &TypeKey {
        &self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        ""
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Class
    }

    fn is_public(&self) -> bool {
        true
    }

    fn base_type(&self) -> Option<XType> {
        None
    }

    fn interfaces(&self) -> Vec<XType> {
        Vec::new()
    }

    fn generic_arguments(&self) -> Vec<XType> {
        Vec::new()
    }

    fn generic_type_definition(&self) -> Option<XType> {
        None
    }

    fn make_generic_type(&self, arguments: &[XType]) -> TypeSystemResult<XType> {
        Err(crate::TypeSystemError::InvalidTypeArgCount {
            name: self.name.clone(),
            expected: 0,
            actual: arguments.len(),
        })
    }

    fn methods(&self) -> Vec<XMethod> {
        Vec::new()
    }

    fn constructors(&self) -> Vec<XConstructor> {
        Vec::new()
    }

    fn properties(&self) -> Vec<XProperty> {
        Vec::new()
    }

    fn fields(&self) -> Vec<XField> {
        Vec::new()
    }

    fn custom_attributes(&self) -> Vec<XType> {
        Vec::new()
    }
}

/// Join a namespace and a simple name into a full name
pub fn full_type_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}
