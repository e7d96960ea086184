//! Transformer configuration
//!
//! Built once from a type system and a [`TypeMappingsSpec`], then shared
//! read-only by every compile.

use crate::ast::XamlNode;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use xaml_types::{ConstantValue, TypeSystem, TypeSystemResult, XType};

/// Serialized type mappings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeMappingsSpec {
    /// Full name of the service-provider interface passed to `ProvideValue`
    pub service_provider: String,
    /// Attributes marking a type's content property
    #[serde(default)]
    pub content_attributes: Vec<String>,
    /// Attributes marking types that are assigned before they are populated
    #[serde(default)]
    pub usable_during_initialization_attributes: Vec<String>,
    /// Interface with `BeginInit` / `EndInit`
    #[serde(default)]
    pub support_initialize: Option<String>,
    /// XML namespace URI to CLR namespaces
    #[serde(default)]
    pub xmlns_mappings: FxHashMap<String, Vec<ClrNamespace>>,
}

/// CLR namespace an XML namespace maps to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClrNamespace {
    /// Namespace
    pub namespace: String,
    /// Assembly to search; any assembly when absent
    #[serde(default)]
    pub assembly: Option<String>,
}

/// Type mappings with every name resolved
#[derive(Debug, Clone)]
pub struct TypeMappings {
    pub service_provider: XType,
    pub content_attributes: Vec<XType>,
    pub usable_during_initialization_attributes: Vec<XType>,
    pub support_initialize: Option<XType>,
    pub xmlns_mappings: FxHashMap<String, Vec<ClrNamespace>>,
}

/// Types the compiler relies on
#[derive(Debug, Clone)]
pub struct WellKnownTypes {
    pub object: XType,
    pub string: XType,
    pub boolean: XType,
    pub int32: XType,
    pub int64: XType,
    pub double: XType,
    pub nullable: XType,
    pub system_type: XType,
}

impl WellKnownTypes {
    fn resolve(ts: &dyn TypeSystem) -> TypeSystemResult<Self> {
        Ok(Self {
            object: ts.get_type("System.Object")?,
            string: ts.get_type("System.String")?,
            boolean: ts.get_type("System.Boolean")?,
            int32: ts.get_type("System.Int32")?,
            int64: ts.get_type("System.Int64")?,
            double: ts.get_type("System.Double")?,
            nullable: ts.get_type("System.Nullable`1")?,
            system_type: ts.get_type("System.Type")?,
        })
    }

    /// Underlying type of a constructed `Nullable<T>`
    pub fn nullable_underlying(&self, ty: &XType) -> Option<XType> {
        if ty.generic_type_definition().as_ref() != Some(&self.nullable) {
            return None;
        }
        ty.generic_arguments().into_iter().next()
    }
}

/// Shared, immutable compiler configuration
pub struct TransformerConfiguration {
    type_system: Arc<dyn TypeSystem>,
    well_known: WellKnownTypes,
    mappings: TypeMappings,
}

impl TransformerConfiguration {
    /// Resolve well-known types and mappings against `type_system`
    pub fn new(type_system: Arc<dyn TypeSystem>, raw: TypeMappingsSpec) -> TypeSystemResult<Self> {
        let well_known = WellKnownTypes::resolve(type_system.as_ref())?;

        let resolve_all = |names: &[String]| -> TypeSystemResult<Vec<XType>> {
            names.iter().map(|n| type_system.get_type(n)).collect()
        };

        let mappings = TypeMappings {
            service_provider: type_system.get_type(&raw.service_provider)?,
            content_attributes: resolve_all(&raw.content_attributes)?,
            usable_during_initialization_attributes: resolve_all(
                &raw.usable_during_initialization_attributes,
            )?,
            support_initialize: raw
                .support_initialize
                .as_deref()
                .map(|n| type_system.get_type(n))
                .transpose()?,
            xmlns_mappings: raw.xmlns_mappings,
        };

        Ok(Self {
            type_system,
            well_known,
            mappings,
        })
    }

    /// Like [`TransformerConfiguration::new`], reading the mappings from JSON
    pub fn from_json(type_system: Arc<dyn TypeSystem>, json: &str) -> TypeSystemResult<Self> {
        let raw: TypeMappingsSpec = serde_json::from_str(json)?;
        Self::new(type_system, raw)
    }

    pub fn type_system(&self) -> &dyn TypeSystem {
        self.type_system.as_ref()
    }

    pub fn well_known_types(&self) -> &WellKnownTypes {
        &self.well_known
    }

    pub fn type_mappings(&self) -> &TypeMappings {
        &self.mappings
    }

    /// Produce a node of type `target` from `value`, or `None` when no
    /// conversion rule applies
    pub fn try_get_correctly_typed_value(&self, value: &XamlNode, target: &XType) -> Option<XamlNode> {
        let value_type = value.value_type()?;
        if target.is_assignable_from(&value_type) {
            return Some(value.clone());
        }

        if let XamlNode::Constant {
            line,
            value: ConstantValue::Null,
            ..
        } = value
        {
            return (!target.is_value_type()).then(|| XamlNode::Constant {
                line: *line,
                ty: target.clone(),
                value: ConstantValue::Null,
            });
        }

        let XamlNode::Text { line, text, .. } = value else {
            return None;
        };
        if value_type != self.well_known.string {
            return None;
        }
        let wk = &self.well_known;
        let constant = |value: ConstantValue| XamlNode::Constant {
            line: *line,
            ty: target.clone(),
            value,
        };

        if target == &wk.boolean {
            return parse_bool(text).map(|b| constant(ConstantValue::Bool(b)));
        }
        if target == &wk.int32 {
            return text.trim().parse().ok().map(|v| constant(ConstantValue::I32(v)));
        }
        if target == &wk.int64 {
            return text.trim().parse().ok().map(|v| constant(ConstantValue::I64(v)));
        }
        if target == &wk.double {
            return text.trim().parse().ok().map(|v| constant(ConstantValue::F64(v)));
        }

        if target.is_enum() {
            let name = text.trim();
            let literals: Vec<_> = target
                .fields()
                .into_iter()
                .filter(|f| f.is_public() && f.is_static() && f.is_literal())
                .collect();
            let field = literals
                .iter()
                .find(|f| f.name() == name)
                .or_else(|| literals.iter().find(|f| f.name().eq_ignore_ascii_case(name)))?;
            return field.literal_value().map(constant);
        }

        if let Some(underlying) = wk.nullable_underlying(target) {
            return self.try_get_correctly_typed_value(value, &underlying);
        }

        let parse = target.find_method(|m| {
            m.is_public()
                && m.is_static()
                && m.name() == "Parse"
                && m.parameters() == [wk.string.clone()]
                && m.return_type().as_ref() == Some(target)
        })?;
        Some(XamlNode::MethodCall {
            line: *line,
            method: parse,
            instance: None,
            arguments: vec![value.clone()],
        })
    }

    /// Content property of `ty`: the first property, own or inherited,
    /// carrying a configured content attribute
    pub fn content_property(&self, ty: &XType) -> Option<xaml_types::XProperty> {
        let mut current = Some(ty.clone());
        while let Some(t) = current {
            let found = t.properties().into_iter().find(|p| {
                p.custom_attributes()
                    .iter()
                    .any(|a| self.mappings.content_attributes.contains(a))
            });
            if found.is_some() {
                return found;
            }
            current = t.base_type();
        }
        None
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
