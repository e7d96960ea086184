//! In-process type universe
//!
//! Types are declared up-front through [`LoadedTypeSystemBuilder`], receive a
//! [`TypeDefId`], and are then linked to each other by id. Member signatures are
//! [`LoadedSig`]s, which refer to definitions directly instead of by name.

use crate::constant::ConstantValue;
use crate::error::{TypeSystemError, TypeSystemResult};
use crate::handle::{
    full_type_name, AssemblyInfo, ConstructorInfo, FieldInfo, GenericParameterType, MemberKey,
    MethodInfo, PropertyInfo, TypeInfo, TypeKey, TypeKind, XAssembly, XConstructor, XField,
    XMethod, XProperty, XType,
};
use crate::system::TypeSystem;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Identifier of a type definition inside a loaded universe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDefId(pub(crate) u32);

impl fmt::Display for TypeDefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDefId({})", self.0)
    }
}

/// Member signature in a loaded universe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedSig {
    /// A definition, open if it is generic
    Def(TypeDefId),
    /// A generic definition instantiated with arguments
    Inst(TypeDefId, Vec<LoadedSig>),
    /// Generic parameter of the declaring type, by index
    Param(usize),
}

impl From<TypeDefId> for LoadedSig {
    fn from(id: TypeDefId) -> Self {
        LoadedSig::Def(id)
    }
}

struct TypeDef {
    assembly: String,
    namespace: String,
    name: String,
    kind: TypeKind,
    public: bool,
    generic_parameters: Vec<String>,
    base: Option<LoadedSig>,
    interfaces: Vec<LoadedSig>,
    attributes: Vec<LoadedSig>,
    fields: Vec<FieldDef>,
    methods: Vec<MethodDef>,
    constructors: Vec<ConstructorDef>,
    properties: Vec<PropertyDef>,
}

impl TypeDef {
    fn full_name(&self) -> String {
        full_type_name(&self.namespace, &self.name)
    }
}

struct FieldDef {
    name: String,
    ty: LoadedSig,
    public: bool,
    is_static: bool,
    literal: bool,
    constant: Option<ConstantValue>,
}

struct MethodDef {
    name: String,
    public: bool,
    is_static: bool,
    parameters: Vec<LoadedSig>,
    return_type: Option<LoadedSig>,
}

struct ConstructorDef {
    public: bool,
    is_static: bool,
    parameters: Vec<LoadedSig>,
}

struct PropertyDef {
    name: String,
    ty: LoadedSig,
    getter: Option<usize>,
    setter: Option<usize>,
    attributes: Vec<LoadedSig>,
}

struct Universe {
    types: Vec<TypeDef>,
    assemblies: Vec<String>,
    by_name: FxHashMap<(String, String), TypeDefId>,
}

impl Universe {
    fn def(&self, id: TypeDefId) -> &TypeDef {
        &self.types[id.0 as usize]
    }
}

/// Builder for a [`LoadedTypeSystem`]
#[derive(Default)]
pub struct LoadedTypeSystemBuilder {
    types: Vec<TypeDef>,
    assemblies: Vec<String>,
}

impl LoadedTypeSystemBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a non-generic type
    pub fn declare(
        &mut self,
        assembly: &str,
        namespace: &str,
        name: &str,
        kind: TypeKind,
    ) -> TypeDefId {
        self.declare_generic(assembly, namespace, name, kind, &[])
    }

    /// Declare a generic type definition; `name` carries the `` `N `` suffix
    pub fn declare_generic(
        &mut self,
        assembly: &str,
        namespace: &str,
        name: &str,
        kind: TypeKind,
        generic_parameters: &[&str],
    ) -> TypeDefId {
        if !self.assemblies.iter().any(|a| a == assembly) {
            self.assemblies.push(assembly.to_string());
        }
        let id = TypeDefId(self.types.len() as u32);
        self.types.push(TypeDef {
            assembly: assembly.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            kind,
            public: true,
            generic_parameters: generic_parameters.iter().map(|p| p.to_string()).collect(),
            base: None,
            interfaces: Vec::new(),
            attributes: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            properties: Vec::new(),
        });
        id
    }

    /// Start attaching members to a declared type
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this builder.
    pub fn define(&mut self, id: TypeDefId) -> TypeDefBuilder<'_> {
        TypeDefBuilder {
            def: &mut self.types[id.0 as usize],
        }
    }

    /// Validate signatures and freeze the universe
    pub fn build(self) -> TypeSystemResult<LoadedTypeSystem> {
        let mut by_name = FxHashMap::default();
        for (index, def) in self.types.iter().enumerate() {
            let key = (def.assembly.clone(), def.full_name());
            if by_name.insert(key, TypeDefId(index as u32)).is_some() {
                return Err(TypeSystemError::DuplicateType {
                    name: def.full_name(),
                });
            }
        }

        for def in &self.types {
            let sigs = def
                .base
                .iter()
                .chain(&def.interfaces)
                .chain(&def.attributes)
                .chain(def.fields.iter().map(|f| &f.ty))
                .chain(def.methods.iter().flat_map(|m| m.parameters.iter().chain(&m.return_type)))
                .chain(def.constructors.iter().flat_map(|c| &c.parameters))
                .chain(def.properties.iter().flat_map(|p| std::iter::once(&p.ty).chain(&p.attributes)));
            for sig in sigs {
                validate_sig(&self.types, def, sig)?;
            }
        }

        Ok(LoadedTypeSystem {
            universe: Arc::new(Universe {
                types: self.types,
                assemblies: self.assemblies,
                by_name,
            }),
        })
    }
}

fn validate_sig(types: &[TypeDef], owner: &TypeDef, sig: &LoadedSig) -> TypeSystemResult<()> {
    let lookup = |id: TypeDefId| {
        types.get(id.0 as usize).ok_or_else(|| TypeSystemError::UndefinedType {
            name: id.to_string(),
        })
    };
    match sig {
        LoadedSig::Def(id) => lookup(*id).map(|_| ()),
        LoadedSig::Inst(id, args) => {
            let def = lookup(*id)?;
            if def.generic_parameters.len() != args.len() {
                return Err(TypeSystemError::InvalidTypeArgCount {
                    name: def.full_name(),
                    expected: def.generic_parameters.len(),
                    actual: args.len(),
                });
            }
            args.iter().try_for_each(|arg| validate_sig(types, owner, arg))
        }
        LoadedSig::Param(index) => {
            if *index < owner.generic_parameters.len() {
                Ok(())
            } else {
                Err(TypeSystemError::GenericParameterOutOfRange {
                    owner: owner.full_name(),
                    index: *index,
                })
            }
        }
    }
}

/// Fluent member registration for one type definition
pub struct TypeDefBuilder<'a> {
    def: &'a mut TypeDef,
}

impl TypeDefBuilder<'_> {
    /// Mark the type as not visible outside its assembly
    pub fn internal(&mut self) -> &mut Self {
        self.def.public = false;
        self
    }

    /// Set the base type
    pub fn base(&mut self, sig: impl Into<LoadedSig>) -> &mut Self {
        self.def.base = Some(sig.into());
        self
    }

    /// Add an implemented interface
    pub fn interface(&mut self, sig: impl Into<LoadedSig>) -> &mut Self {
        self.def.interfaces.push(sig.into());
        self
    }

    /// Apply a custom attribute to the type
    pub fn attribute(&mut self, sig: impl Into<LoadedSig>) -> &mut Self {
        self.def.attributes.push(sig.into());
        self
    }

    /// Add a public instance field
    pub fn field(&mut self, name: &str, ty: impl Into<LoadedSig>) -> &mut Self {
        self.push_field(name, ty.into(), false, false, None)
    }

    /// Add a public static field
    pub fn static_field(&mut self, name: &str, ty: impl Into<LoadedSig>) -> &mut Self {
        self.push_field(name, ty.into(), true, false, None)
    }

    /// Add a public static literal field, optionally carrying a constant
    pub fn literal(
        &mut self,
        name: &str,
        ty: impl Into<LoadedSig>,
        constant: Option<ConstantValue>,
    ) -> &mut Self {
        self.push_field(name, ty.into(), true, true, constant)
    }

    fn push_field(
        &mut self,
        name: &str,
        ty: LoadedSig,
        is_static: bool,
        literal: bool,
        constant: Option<ConstantValue>,
    ) -> &mut Self {
        self.def.fields.push(FieldDef {
            name: name.to_string(),
            ty,
            public: true,
            is_static,
            literal,
            constant,
        });
        self
    }

    /// Add a public instance method; `None` return is void
    pub fn method(
        &mut self,
        name: &str,
        parameters: Vec<LoadedSig>,
        return_type: Option<LoadedSig>,
    ) -> &mut Self {
        self.push_method(name, true, false, parameters, return_type);
        self
    }

    /// Add a non-public instance method
    pub fn private_method(
        &mut self,
        name: &str,
        parameters: Vec<LoadedSig>,
        return_type: Option<LoadedSig>,
    ) -> &mut Self {
        self.push_method(name, false, false, parameters, return_type);
        self
    }

    /// Add a public static method
    pub fn static_method(
        &mut self,
        name: &str,
        parameters: Vec<LoadedSig>,
        return_type: Option<LoadedSig>,
    ) -> &mut Self {
        self.push_method(name, true, true, parameters, return_type);
        self
    }

    fn push_method(
        &mut self,
        name: &str,
        public: bool,
        is_static: bool,
        parameters: Vec<LoadedSig>,
        return_type: Option<LoadedSig>,
    ) -> usize {
        self.def.methods.push(MethodDef {
            name: name.to_string(),
            public,
            is_static,
            parameters,
            return_type,
        });
        self.def.methods.len() - 1
    }

    /// Add a public instance constructor
    pub fn constructor(&mut self, parameters: Vec<LoadedSig>) -> &mut Self {
        self.def.constructors.push(ConstructorDef {
            public: true,
            is_static: false,
            parameters,
        });
        self
    }

    /// Add a non-public instance constructor
    pub fn private_constructor(&mut self, parameters: Vec<LoadedSig>) -> &mut Self {
        self.def.constructors.push(ConstructorDef {
            public: false,
            is_static: false,
            parameters,
        });
        self
    }

    /// Add a read/write property with `get_Name` / `set_Name` accessors
    pub fn property(&mut self, name: &str, ty: impl Into<LoadedSig>) -> &mut Self {
        let ty = ty.into();
        let getter = self.push_method(&format!("get_{}", name), true, false, vec![], Some(ty.clone()));
        let setter = self.push_method(&format!("set_{}", name), true, false, vec![ty.clone()], None);
        self.push_property(name, ty, Some(getter), Some(setter))
    }

    /// Add a property with only a `get_Name` accessor
    pub fn readonly_property(&mut self, name: &str, ty: impl Into<LoadedSig>) -> &mut Self {
        let ty = ty.into();
        let getter = self.push_method(&format!("get_{}", name), true, false, vec![], Some(ty.clone()));
        self.push_property(name, ty, Some(getter), None)
    }

    /// Add a static read-only property
    pub fn static_property(&mut self, name: &str, ty: impl Into<LoadedSig>) -> &mut Self {
        let ty = ty.into();
        let getter = self.push_method(&format!("get_{}", name), true, true, vec![], Some(ty.clone()));
        self.push_property(name, ty, Some(getter), None)
    }

    fn push_property(
        &mut self,
        name: &str,
        ty: LoadedSig,
        getter: Option<usize>,
        setter: Option<usize>,
    ) -> &mut Self {
        self.def.properties.push(PropertyDef {
            name: name.to_string(),
            ty,
            getter,
            setter,
            attributes: Vec::new(),
        });
        self
    }

    /// Apply a custom attribute to the most recently added property
    pub fn property_attribute(&mut self, sig: impl Into<LoadedSig>) -> &mut Self {
        if let Some(prop) = self.def.properties.last_mut() {
            prop.attributes.push(sig.into());
        }
        self
    }
}

/// Type system over an in-process universe
#[derive(Clone)]
pub struct LoadedTypeSystem {
    universe: Arc<Universe>,
}

impl LoadedTypeSystem {
    /// Handle to a declared type (open if generic)
    pub fn type_of(&self, id: TypeDefId) -> XType {
        LoadedType::handle(&self.universe, id, Vec::new())
    }

    /// Handle to a generic definition instantiated with `arguments`
    pub fn instantiate(&self, id: TypeDefId, arguments: &[XType]) -> TypeSystemResult<XType> {
        self.type_of(id).make_generic_type(arguments)
    }
}

impl TypeSystem for LoadedTypeSystem {
    fn assemblies(&self) -> Vec<XAssembly> {
        self.universe
            .assemblies
            .iter()
            .map(|name| {
                XAssembly::new(LoadedAssembly {
                    universe: self.universe.clone(),
                    name: name.clone(),
                })
            })
            .collect()
    }
}

struct LoadedAssembly {
    universe: Arc<Universe>,
    name: String,
}

impl AssemblyInfo for LoadedAssembly {
    fn name(&self) -> &str {
        &self.name
    }

    fn types(&self) -> Vec<XType> {
        self.universe
            .types
            .iter()
            .enumerate()
            .filter(|(_, def)| def.assembly == self.name)
            .map(|(index, _)| LoadedType::handle(&self.universe, TypeDefId(index as u32), Vec::new()))
            .collect()
    }

    fn find_type(&self, full_name: &str) -> Option<XType> {
        let id = self
            .universe
            .by_name
            .get(&(self.name.clone(), full_name.to_string()))?;
        Some(LoadedType::handle(&self.universe, *id, Vec::new()))
    }
}

#[derive(Clone)]
struct LoadedType {
    universe: Arc<Universe>,
    id: TypeDefId,
    arguments: Vec<XType>,
    key: TypeKey,
}

impl LoadedType {
    fn handle(universe: &Arc<Universe>, id: TypeDefId, arguments: Vec<XType>) -> XType {
        let def = universe.def(id);
        let key = TypeKey::new(def.assembly.clone(), def.full_name())
            .instantiate(arguments.iter().map(|a| a.key().clone()).collect());
        XType::new(LoadedType {
            universe: universe.clone(),
            id,
            arguments,
            key,
        })
    }

    fn def(&self) -> &TypeDef {
        self.universe.def(self.id)
    }

    fn resolve(&self, sig: &LoadedSig) -> XType {
        resolve_sig(&self.universe, self.id, &self.arguments, sig)
    }

    fn member_scope(&self) -> MemberScope {
        MemberScope {
            universe: self.universe.clone(),
            owner: self.id,
            arguments: self.arguments.clone(),
            declaring: self.key.clone(),
        }
    }
}

fn resolve_sig(universe: &Arc<Universe>, owner: TypeDefId, arguments: &[XType], sig: &LoadedSig) -> XType {
    match sig {
        LoadedSig::Def(id) => LoadedType::handle(universe, *id, Vec::new()),
        LoadedSig::Inst(id, args) => {
            let args = args
                .iter()
                .map(|arg| resolve_sig(universe, owner, arguments, arg))
                .collect();
            LoadedType::handle(universe, *id, args)
        }
        LoadedSig::Param(index) => match arguments.get(*index) {
            Some(arg) => arg.clone(),
            None => {
                let def = universe.def(owner);
                let key = TypeKey::new(def.assembly.clone(), def.full_name());
                let name = def.generic_parameters.get(*index).map(String::as_str).unwrap_or("T");
                GenericParameterType::handle(&key, *index, name)
            }
        },
    }
}

impl TypeInfo for LoadedType {
    fn key(&self) -> &TypeKey {
        &self.key
    }

    fn name(&self) -> &str {
        &self.def().name
    }

    fn namespace(&self) -> &str {
        &self.def().namespace
    }

    fn kind(&self) -> TypeKind {
        self.def().kind
    }

    fn is_public(&self) -> bool {
        self.def().public
    }

    fn base_type(&self) -> Option<XType> {
        self.def().base.as_ref().map(|sig| self.resolve(sig))
    }

    fn interfaces(&self) -> Vec<XType> {
        self.def().interfaces.iter().map(|sig| self.resolve(sig)).collect()
    }

    fn generic_arguments(&self) -> Vec<XType> {
        self.arguments.clone()
    }

    fn generic_type_definition(&self) -> Option<XType> {
        if self.arguments.is_empty() {
            None
        } else {
            Some(LoadedType::handle(&self.universe, self.id, Vec::new()))
        }
    }

    fn make_generic_type(&self, arguments: &[XType]) -> TypeSystemResult<XType> {
        let expected = self.def().generic_parameters.len();
        if !self.arguments.is_empty() || expected != arguments.len() {
            return Err(TypeSystemError::InvalidTypeArgCount {
                name: self.key.to_string(),
                expected: if self.arguments.is_empty() { expected } else { 0 },
                actual: arguments.len(),
            });
        }
        Ok(LoadedType::handle(&self.universe, self.id, arguments.to_vec()))
    }

    fn methods(&self) -> Vec<XMethod> {
        let scope = self.member_scope();
        (0..self.def().methods.len())
            .map(|index| XMethod::new(scope.method(index)))
            .collect()
    }

    fn constructors(&self) -> Vec<XConstructor> {
        let scope = self.member_scope();
        (0..self.def().constructors.len())
            .map(|index| {
                XConstructor::new(LoadedConstructor {
                    key: MemberKey::new(self.key.clone(), ".ctor", index),
                    scope: scope.clone(),
                    index,
                })
            })
            .collect()
    }

    fn properties(&self) -> Vec<XProperty> {
        let scope = self.member_scope();
        self.def()
            .properties
            .iter()
            .enumerate()
            .map(|(index, prop)| {
                XProperty::new(LoadedProperty {
                    key: MemberKey::new(self.key.clone(), prop.name.clone(), index),
                    scope: scope.clone(),
                    index,
                })
            })
            .collect()
    }

    fn fields(&self) -> Vec<XField> {
        let scope = self.member_scope();
        self.def()
            .fields
            .iter()
            .enumerate()
            .map(|(index, field)| {
                XField::new(LoadedField {
                    key: MemberKey::new(self.key.clone(), field.name.clone(), index),
                    scope: scope.clone(),
                    index,
                    field_type: OnceLock::new(),
                })
            })
            .collect()
    }

    fn custom_attributes(&self) -> Vec<XType> {
        self.def().attributes.iter().map(|sig| self.resolve(sig)).collect()
    }
}

/// Concrete declaring type shared by the member handles it hands out
#[derive(Clone)]
struct MemberScope {
    universe: Arc<Universe>,
    owner: TypeDefId,
    arguments: Vec<XType>,
    declaring: TypeKey,
}

impl MemberScope {
    fn def(&self) -> &TypeDef {
        self.universe.def(self.owner)
    }

    fn resolve(&self, sig: &LoadedSig) -> XType {
        resolve_sig(&self.universe, self.owner, &self.arguments, sig)
    }

    fn method(&self, index: usize) -> LoadedMethod {
        LoadedMethod {
            key: MemberKey::new(self.declaring.clone(), self.def().methods[index].name.clone(), index),
            scope: self.clone(),
            index,
        }
    }
}

struct LoadedMethod {
    key: MemberKey,
    scope: MemberScope,
    index: usize,
}

impl LoadedMethod {
    fn def(&self) -> &MethodDef {
        &self.scope.def().methods[self.index]
    }
}

impl MethodInfo for LoadedMethod {
    fn key(&self) -> &MemberKey {
        &self.key
    }

    fn is_public(&self) -> bool {
        self.def().public
    }

    fn is_static(&self) -> bool {
        self.def().is_static
    }

    fn return_type(&self) -> Option<XType> {
        self.def().return_type.as_ref().map(|sig| self.scope.resolve(sig))
    }

    fn parameters(&self) -> Vec<XType> {
        self.def().parameters.iter().map(|sig| self.scope.resolve(sig)).collect()
    }
}

struct LoadedConstructor {
    key: MemberKey,
    scope: MemberScope,
    index: usize,
}

impl ConstructorInfo for LoadedConstructor {
    fn key(&self) -> &MemberKey {
        &self.key
    }

    fn is_public(&self) -> bool {
        self.scope.def().constructors[self.index].public
    }

    fn is_static(&self) -> bool {
        self.scope.def().constructors[self.index].is_static
    }

    fn parameters(&self) -> Vec<XType> {
        self.scope.def().constructors[self.index]
            .parameters
            .iter()
            .map(|sig| self.scope.resolve(sig))
            .collect()
    }
}

struct LoadedField {
    key: MemberKey,
    scope: MemberScope,
    index: usize,
    field_type: OnceLock<XType>,
}

impl LoadedField {
    fn def(&self) -> &FieldDef {
        &self.scope.def().fields[self.index]
    }
}

impl FieldInfo for LoadedField {
    fn key(&self) -> &MemberKey {
        &self.key
    }

    fn field_type(&self) -> XType {
        self.field_type
            .get_or_init(|| self.scope.resolve(&self.def().ty))
            .clone()
    }

    fn is_public(&self) -> bool {
        self.def().public
    }

    fn is_static(&self) -> bool {
        self.def().is_static
    }

    fn is_literal(&self) -> bool {
        self.def().literal
    }

    fn constant(&self) -> Option<ConstantValue> {
        self.def().constant.clone()
    }
}

struct LoadedProperty {
    key: MemberKey,
    scope: MemberScope,
    index: usize,
}

impl LoadedProperty {
    fn def(&self) -> &PropertyDef {
        &self.scope.def().properties[self.index]
    }
}

impl PropertyInfo for LoadedProperty {
    fn key(&self) -> &MemberKey {
        &self.key
    }

    fn property_type(&self) -> XType {
        self.scope.resolve(&self.def().ty)
    }

    fn getter(&self) -> Option<XMethod> {
        self.def().getter.map(|index| XMethod::new(self.scope.method(index)))
    }

    fn setter(&self) -> Option<XMethod> {
        self.def().setter.map(|index| XMethod::new(self.scope.method(index)))
    }

    fn custom_attributes(&self) -> Vec<XType> {
        self.def().attributes.iter().map(|sig| self.scope.resolve(sig)).collect()
    }
}
