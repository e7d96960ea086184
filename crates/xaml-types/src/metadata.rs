//! Metadata-only type universe
//!
//! Describes assemblies that are not loaded into the compiling process. The
//! serialized model is read with `serde_json`; every type name it mentions is
//! resolved once when the universe is created, so later queries cannot fail.
//! Member types are built per handle on demand.

use crate::constant::ConstantValue;
use crate::error::{TypeSystemError, TypeSystemResult};
use crate::handle::{
    full_type_name, AssemblyInfo, ConstructorInfo, FieldInfo, GenericParameterType, MemberKey,
    MethodInfo, PropertyInfo, TypeInfo, TypeKey, TypeKind, XAssembly, XConstructor, XField,
    XMethod, XProperty, XType,
};
use crate::system::TypeSystem;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

fn default_true() -> bool {
    true
}

/// Serialized assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    /// Assembly name
    pub name: String,
    /// Types defined by the assembly
    #[serde(default)]
    pub types: Vec<TypeDefinition>,
}

/// Serialized type definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Namespace
    #[serde(default)]
    pub namespace: String,
    /// Simple name; generic definitions carry the `` `N `` suffix
    pub name: String,
    /// Definition kind
    #[serde(default)]
    pub kind: TypeKind,
    /// Visibility
    #[serde(default = "default_true")]
    pub public: bool,
    /// Generic parameter names
    #[serde(default)]
    pub generic_parameters: Vec<String>,
    /// Base type
    #[serde(default)]
    pub base: Option<TypeSignature>,
    /// Implemented interfaces
    #[serde(default)]
    pub interfaces: Vec<TypeSignature>,
    /// Custom attribute types
    #[serde(default)]
    pub attributes: Vec<TypeSignature>,
    /// Fields
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    /// Methods, accessors included
    #[serde(default)]
    pub methods: Vec<MethodDefinition>,
    /// Constructors
    #[serde(default)]
    pub constructors: Vec<ConstructorDefinition>,
    /// Properties
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

/// Serialized field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Field type
    #[serde(rename = "type")]
    pub field_type: TypeSignature,
    /// Visibility
    #[serde(default = "default_true")]
    pub public: bool,
    /// Static storage
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Compile-time literal
    #[serde(default)]
    pub literal: bool,
    /// Constant attached to a literal
    #[serde(default)]
    pub constant: Option<ConstantValue>,
}

/// Serialized method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDefinition {
    /// Method name
    pub name: String,
    /// Visibility
    #[serde(default = "default_true")]
    pub public: bool,
    /// Static method
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Parameter types
    #[serde(default)]
    pub parameters: Vec<TypeSignature>,
    /// Return type, absent for void
    #[serde(default)]
    pub returns: Option<TypeSignature>,
}

/// Serialized constructor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorDefinition {
    /// Visibility
    #[serde(default = "default_true")]
    pub public: bool,
    /// Type initializer
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Parameter types
    #[serde(default)]
    pub parameters: Vec<TypeSignature>,
}

/// Serialized property; accessors name methods of the same type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// Property name
    pub name: String,
    /// Property type
    #[serde(rename = "type")]
    pub property_type: TypeSignature,
    /// Getter method name
    #[serde(default)]
    pub getter: Option<String>,
    /// Setter method name
    #[serde(default)]
    pub setter: Option<String>,
    /// Custom attribute types
    #[serde(default)]
    pub attributes: Vec<TypeSignature>,
}

/// Serialized type reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSignature {
    /// Full name of a non-generic type or open definition
    Name(String),
    /// Generic parameter of the declaring type
    GenericParameter {
        /// Parameter index
        generic_parameter: usize,
    },
    /// Generic instantiation
    Named {
        /// Full name of the generic definition
        name: String,
        /// Type arguments
        arguments: Vec<TypeSignature>,
    },
}

/// Signature after name resolution
#[derive(Debug, Clone)]
enum Resolved {
    Type(usize),
    Generic(usize, Vec<Resolved>),
    Parameter(usize),
}

struct ResolvedType {
    assembly: String,
    definition: TypeDefinition,
    full_name: String,
    base: Option<Resolved>,
    interfaces: Vec<Resolved>,
    attributes: Vec<Resolved>,
    fields: Vec<Resolved>,
    methods: Vec<(Vec<Resolved>, Option<Resolved>)>,
    constructors: Vec<Vec<Resolved>>,
    properties: Vec<ResolvedProperty>,
}

struct ResolvedProperty {
    ty: Resolved,
    getter: Option<usize>,
    setter: Option<usize>,
    attributes: Vec<Resolved>,
}

struct MetadataUniverse {
    types: Vec<ResolvedType>,
    assemblies: Vec<String>,
    by_name: FxHashMap<(String, String), usize>,
}

/// Type system over serialized assembly metadata
#[derive(Clone)]
pub struct MetadataTypeSystem {
    universe: Arc<MetadataUniverse>,
}

impl MetadataTypeSystem {
    /// Build a universe from deserialized assemblies
    pub fn from_assemblies(assemblies: Vec<AssemblyMetadata>) -> TypeSystemResult<Self> {
        let mut by_name = FxHashMap::default();
        let mut global: FxHashMap<String, usize> = FxHashMap::default();
        let mut flat = Vec::new();

        for assembly in &assemblies {
            for definition in &assembly.types {
                let full_name = full_type_name(&definition.namespace, &definition.name);
                let index = flat.len();
                if by_name
                    .insert((assembly.name.clone(), full_name.clone()), index)
                    .is_some()
                {
                    return Err(TypeSystemError::DuplicateType { name: full_name });
                }
                global.entry(full_name.clone()).or_insert(index);
                flat.push((assembly.name.clone(), full_name, definition));
            }
        }

        let resolver = NameResolver {
            by_name: &by_name,
            global: &global,
            arities: flat.iter().map(|(_, _, d)| d.generic_parameters.len()).collect(),
        };

        let mut types = Vec::with_capacity(flat.len());
        for (assembly, full_name, definition) in &flat {
            types.push(resolver.resolve_type(assembly, full_name, definition)?);
        }

        Ok(Self {
            universe: Arc::new(MetadataUniverse {
                types,
                assemblies: assemblies.into_iter().map(|a| a.name).collect(),
                by_name,
            }),
        })
    }

    /// Build a universe from a JSON array of assemblies
    pub fn from_json(json: &str) -> TypeSystemResult<Self> {
        let assemblies: Vec<AssemblyMetadata> = serde_json::from_str(json)?;
        Self::from_assemblies(assemblies)
    }
}

impl TypeSystem for MetadataTypeSystem {
    fn assemblies(&self) -> Vec<XAssembly> {
        self.universe
            .assemblies
            .iter()
            .map(|name| {
                XAssembly::new(MetadataAssembly {
                    universe: self.universe.clone(),
                    name: name.clone(),
                })
            })
            .collect()
    }
}

struct NameResolver<'a> {
    by_name: &'a FxHashMap<(String, String), usize>,
    global: &'a FxHashMap<String, usize>,
    arities: Vec<usize>,
}

impl NameResolver<'_> {
    fn lookup(&self, assembly: &str, name: &str) -> TypeSystemResult<usize> {
        self.by_name
            .get(&(assembly.to_string(), name.to_string()))
            .or_else(|| self.global.get(name))
            .copied()
            .ok_or_else(|| TypeSystemError::UndefinedType {
                name: name.to_string(),
            })
    }

    fn resolve(
        &self,
        assembly: &str,
        owner: &str,
        params: usize,
        sig: &TypeSignature,
    ) -> TypeSystemResult<Resolved> {
        match sig {
            TypeSignature::Name(name) => Ok(Resolved::Type(self.lookup(assembly, name)?)),
            TypeSignature::GenericParameter { generic_parameter } => {
                if *generic_parameter < params {
                    Ok(Resolved::Parameter(*generic_parameter))
                } else {
                    Err(TypeSystemError::GenericParameterOutOfRange {
                        owner: owner.to_string(),
                        index: *generic_parameter,
                    })
                }
            }
            TypeSignature::Named { name, arguments } => {
                let index = self.lookup(assembly, name)?;
                if self.arities[index] != arguments.len() {
                    return Err(TypeSystemError::InvalidTypeArgCount {
                        name: name.clone(),
                        expected: self.arities[index],
                        actual: arguments.len(),
                    });
                }
                let arguments = arguments
                    .iter()
                    .map(|arg| self.resolve(assembly, owner, params, arg))
                    .collect::<TypeSystemResult<Vec<_>>>()?;
                Ok(Resolved::Generic(index, arguments))
            }
        }
    }

    fn resolve_all(
        &self,
        assembly: &str,
        owner: &str,
        params: usize,
        sigs: &[TypeSignature],
    ) -> TypeSystemResult<Vec<Resolved>> {
        sigs.iter()
            .map(|sig| self.resolve(assembly, owner, params, sig))
            .collect()
    }

    fn resolve_type(
        &self,
        assembly: &str,
        full_name: &str,
        definition: &TypeDefinition,
    ) -> TypeSystemResult<ResolvedType> {
        let params = definition.generic_parameters.len();
        let sig = |s: &TypeSignature| self.resolve(assembly, full_name, params, s);
        let all = |s: &[TypeSignature]| self.resolve_all(assembly, full_name, params, s);

        let accessor = |property: &str, name: &Option<String>| -> TypeSystemResult<Option<usize>> {
            match name {
                None => Ok(None),
                Some(name) => definition
                    .methods
                    .iter()
                    .position(|m| &m.name == name)
                    .map(Some)
                    .ok_or_else(|| TypeSystemError::MissingAccessor {
                        owner: full_name.to_string(),
                        property: property.to_string(),
                        accessor: name.clone(),
                    }),
            }
        };

        Ok(ResolvedType {
            assembly: assembly.to_string(),
            definition: definition.clone(),
            full_name: full_name.to_string(),
            base: definition.base.as_ref().map(sig).transpose()?,
            interfaces: all(&definition.interfaces)?,
            attributes: all(&definition.attributes)?,
            fields: definition
                .fields
                .iter()
                .map(|f| sig(&f.field_type))
                .collect::<TypeSystemResult<_>>()?,
            methods: definition
                .methods
                .iter()
                .map(|m| -> TypeSystemResult<_> {
                    Ok((all(&m.parameters)?, m.returns.as_ref().map(sig).transpose()?))
                })
                .collect::<TypeSystemResult<_>>()?,
            constructors: definition
                .constructors
                .iter()
                .map(|c| all(&c.parameters))
                .collect::<TypeSystemResult<_>>()?,
            properties: definition
                .properties
                .iter()
                .map(|p| -> TypeSystemResult<_> {
                    Ok(ResolvedProperty {
                        ty: sig(&p.property_type)?,
                        getter: accessor(&p.name, &p.getter)?,
                        setter: accessor(&p.name, &p.setter)?,
                        attributes: all(&p.attributes)?,
                    })
                })
                .collect::<TypeSystemResult<_>>()?,
        })
    }
}

struct MetadataAssembly {
    universe: Arc<MetadataUniverse>,
    name: String,
}

impl AssemblyInfo for MetadataAssembly {
    fn name(&self) -> &str {
        &self.name
    }

    fn types(&self) -> Vec<XType> {
        self.universe
            .types
            .iter()
            .enumerate()
            .filter(|(_, ty)| ty.assembly == self.name)
            .map(|(index, _)| MetadataType::handle(&self.universe, index, Vec::new()))
            .collect()
    }

    fn find_type(&self, full_name: &str) -> Option<XType> {
        self.universe
            .by_name
            .get(&(self.name.clone(), full_name.to_string()))
            .map(|index| MetadataType::handle(&self.universe, *index, Vec::new()))
    }
}

/// A definition viewed through a concrete set of generic arguments
#[derive(Clone)]
struct Instantiation {
    universe: Arc<MetadataUniverse>,
    index: usize,
    arguments: Vec<XType>,
    key: TypeKey,
}

impl Instantiation {
    fn ty(&self) -> &ResolvedType {
        &self.universe.types[self.index]
    }

    fn materialize(&self, resolved: &Resolved) -> XType {
        match resolved {
            Resolved::Type(index) => MetadataType::handle(&self.universe, *index, Vec::new()),
            Resolved::Generic(index, args) => {
                let args = args.iter().map(|arg| self.materialize(arg)).collect();
                MetadataType::handle(&self.universe, *index, args)
            }
            Resolved::Parameter(position) => match self.arguments.get(*position) {
                Some(arg) => arg.clone(),
                None => {
                    let name = self
                        .ty()
                        .definition
                        .generic_parameters
                        .get(*position)
                        .map(String::as_str)
                        .unwrap_or("T");
                    let open = TypeKey::new(self.key.assembly.clone(), self.key.full_name.clone());
                    GenericParameterType::handle(&open, *position, name)
                }
            },
        }
    }
}

struct MetadataType(Instantiation);

impl MetadataType {
    fn handle(universe: &Arc<MetadataUniverse>, index: usize, arguments: Vec<XType>) -> XType {
        let ty = &universe.types[index];
        let key = TypeKey::new(ty.assembly.clone(), ty.full_name.clone())
            .instantiate(arguments.iter().map(|a| a.key().clone()).collect());
        XType::new(MetadataType(Instantiation {
            universe: universe.clone(),
            index,
            arguments,
            key,
        }))
    }
}

impl TypeInfo for MetadataType {
    fn key(&self) -> &TypeKey {
        &self.0.key
    }

    fn name(&self) -> &str {
        &self.0.ty().definition.name
    }

    fn namespace(&self) -> &str {
        &self.0.ty().definition.namespace
    }

    fn kind(&self) -> TypeKind {
        self.0.ty().definition.kind
    }

    fn is_public(&self) -> bool {
        self.0.ty().definition.public
    }

    fn base_type(&self) -> Option<XType> {
        self.0.ty().base.as_ref().map(|r| self.0.materialize(r))
    }

    fn interfaces(&self) -> Vec<XType> {
        self.0.ty().interfaces.iter().map(|r| self.0.materialize(r)).collect()
    }

    fn generic_arguments(&self) -> Vec<XType> {
        self.0.arguments.clone()
    }

    fn generic_type_definition(&self) -> Option<XType> {
        (!self.0.arguments.is_empty())
            .then(|| MetadataType::handle(&self.0.universe, self.0.index, Vec::new()))
    }

    fn make_generic_type(&self, arguments: &[XType]) -> TypeSystemResult<XType> {
        let arity = self.0.ty().definition.generic_parameters.len();
        let open = self.0.arguments.is_empty();
        if !open || arity != arguments.len() {
            return Err(TypeSystemError::InvalidTypeArgCount {
                name: self.0.key.to_string(),
                expected: if open { arity } else { 0 },
                actual: arguments.len(),
            });
        }
        Ok(MetadataType::handle(&self.0.universe, self.0.index, arguments.to_vec()))
    }

    fn methods(&self) -> Vec<XMethod> {
        (0..self.0.ty().methods.len())
            .map(|index| XMethod::new(MetadataMethod::new(&self.0, index)))
            .collect()
    }

    fn constructors(&self) -> Vec<XConstructor> {
        (0..self.0.ty().constructors.len())
            .map(|index| {
                XConstructor::new(MetadataConstructor {
                    key: MemberKey::new(self.0.key.clone(), ".ctor", index),
                    owner: self.0.clone(),
                    index,
                })
            })
            .collect()
    }

    fn properties(&self) -> Vec<XProperty> {
        self.0
            .ty()
            .definition
            .properties
            .iter()
            .enumerate()
            .map(|(index, p)| {
                XProperty::new(MetadataProperty {
                    key: MemberKey::new(self.0.key.clone(), p.name.clone(), index),
                    owner: self.0.clone(),
                    index,
                })
            })
            .collect()
    }

    fn fields(&self) -> Vec<XField> {
        self.0
            .ty()
            .definition
            .fields
            .iter()
            .enumerate()
            .map(|(index, f)| {
                XField::new(MetadataField {
                    key: MemberKey::new(self.0.key.clone(), f.name.clone(), index),
                    owner: self.0.clone(),
                    index,
                    field_type: OnceLock::new(),
                })
            })
            .collect()
    }

    fn custom_attributes(&self) -> Vec<XType> {
        self.0.ty().attributes.iter().map(|r| self.0.materialize(r)).collect()
    }
}

struct MetadataMethod {
    key: MemberKey,
    owner: Instantiation,
    index: usize,
}

impl MetadataMethod {
    fn new(owner: &Instantiation, index: usize) -> Self {
        let name = owner.ty().definition.methods[index].name.clone();
        Self {
            key: MemberKey::new(owner.key.clone(), name, index),
            owner: owner.clone(),
            index,
        }
    }

    fn definition(&self) -> &MethodDefinition {
        &self.owner.ty().definition.methods[self.index]
    }
}

impl MethodInfo for MetadataMethod {
    fn key(&self) -> &MemberKey {
        &self.key
    }

    fn is_public(&self) -> bool {
        self.definition().public
    }

    fn is_static(&self) -> bool {
        self.definition().is_static
    }

    fn return_type(&self) -> Option<XType> {
        let (_, returns) = &self.owner.ty().methods[self.index];
        returns.as_ref().map(|r| self.owner.materialize(r))
    }

    fn parameters(&self) -> Vec<XType> {
        let (params, _) = &self.owner.ty().methods[self.index];
        params.iter().map(|r| self.owner.materialize(r)).collect()
    }
}

struct MetadataConstructor {
    key: MemberKey,
    owner: Instantiation,
    index: usize,
}

impl ConstructorInfo for MetadataConstructor {
    fn key(&self) -> &MemberKey {
        &self.key
    }

    fn is_public(&self) -> bool {
        self.owner.ty().definition.constructors[self.index].public
    }

    fn is_static(&self) -> bool {
        self.owner.ty().definition.constructors[self.index].is_static
    }

    fn parameters(&self) -> Vec<XType> {
        self.owner.ty().constructors[self.index]
            .iter()
            .map(|r| self.owner.materialize(r))
            .collect()
    }
}

struct MetadataField {
    key: MemberKey,
    owner: Instantiation,
    index: usize,
    field_type: OnceLock<XType>,
}

impl MetadataField {
    fn definition(&self) -> &FieldDefinition {
        &self.owner.ty().definition.fields[self.index]
    }
}

impl FieldInfo for MetadataField {
    fn key(&self) -> &MemberKey {
        &self.key
    }

    fn field_type(&self) -> XType {
        self.field_type
            .get_or_init(|| self.owner.materialize(&self.owner.ty().fields[self.index]))
            .clone()
    }

    fn is_public(&self) -> bool {
        self.definition().public
    }

    fn is_static(&self) -> bool {
        self.definition().is_static
    }

    fn is_literal(&self) -> bool {
        self.definition().literal
    }

    fn constant(&self) -> Option<ConstantValue> {
        self.definition().constant.clone()
    }
}

struct MetadataProperty {
    key: MemberKey,
    owner: Instantiation,
    index: usize,
}

impl MetadataProperty {
    fn resolved(&self) -> &ResolvedProperty {
        &self.owner.ty().properties[self.index]
    }
}

impl PropertyInfo for MetadataProperty {
    fn key(&self) -> &MemberKey {
        &self.key
    }

    fn property_type(&self) -> XType {
        self.owner.materialize(&self.resolved().ty)
    }

    fn getter(&self) -> Option<XMethod> {
        self.resolved()
            .getter
            .map(|index| XMethod::new(MetadataMethod::new(&self.owner, index)))
    }

    fn setter(&self) -> Option<XMethod> {
        self.resolved()
            .setter
            .map(|index| XMethod::new(MetadataMethod::new(&self.owner, index)))
    }

    fn custom_attributes(&self) -> Vec<XType> {
        self.resolved()
            .attributes
            .iter()
            .map(|r| self.owner.materialize(r))
            .collect()
    }
}
