//! Markup AST
//!
//! The tree starts out as raw markup (`Object`, `Text`, `PropertyValue`,
//! `Directive`) with XML type references, and is rewritten by the transformer
//! passes into value and manipulation nodes that carry resolved types.
//!
//! Value nodes leave one value on the evaluation stack when emitted.
//! Manipulation nodes consume the current value and leave nothing.

use crate::error::NodeInfo;
use rustc_hash::FxHashMap;
use std::fmt;
use xaml_types::{ConstantValue, XConstructor, XField, XMethod, XProperty, XType};

/// XAML language namespace (directives and intrinsics)
pub const XAML2006: &str = "http://schemas.microsoft.com/winfx/2006/xaml";

/// Source position of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LineInfo {
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub position: u32,
}

impl LineInfo {
    /// Create a position
    pub fn new(line: u32, position: u32) -> Self {
        Self { line, position }
    }
}

impl fmt::Display for LineInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.position)
    }
}

/// Type named in markup: XML namespace URI + local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XmlTypeReference {
    /// XML namespace URI
    pub namespace: String,
    /// Local name without generic arity
    pub name: String,
    /// Generic arguments (`x:TypeArguments`)
    pub generic_arguments: Vec<XamlTypeReference>,
}

impl XmlTypeReference {
    /// Non-generic reference
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            generic_arguments: Vec::new(),
        }
    }

    /// Generic reference
    pub fn generic(
        namespace: impl Into<String>,
        name: impl Into<String>,
        arguments: Vec<XamlTypeReference>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            generic_arguments: arguments,
        }
    }

    /// Whether this names something in the XAML language namespace
    pub fn is_xaml(&self, name: &str) -> bool {
        self.namespace == XAML2006 && self.name == name
    }
}

impl fmt::Display for XmlTypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.name)?;
        if !self.generic_arguments.is_empty() {
            let args: Vec<String> = self.generic_arguments.iter().map(|a| a.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

/// Type reference before or after resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum XamlTypeReference {
    /// Unresolved markup name
    Xml(XmlTypeReference),
    /// Resolved type
    Clr(XType),
}

impl XamlTypeReference {
    /// The resolved type, if resolution has happened
    pub fn clr(&self) -> Option<&XType> {
        match self {
            XamlTypeReference::Clr(ty) => Some(ty),
            XamlTypeReference::Xml(_) => None,
        }
    }

    /// The unresolved reference, if any
    pub fn xml(&self) -> Option<&XmlTypeReference> {
        match self {
            XamlTypeReference::Xml(xml) => Some(xml),
            XamlTypeReference::Clr(_) => None,
        }
    }
}

impl fmt::Display for XamlTypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XamlTypeReference::Xml(xml) => write!(f, "{}", xml),
            XamlTypeReference::Clr(ty) => write!(f, "{}", ty.fqn()),
        }
    }
}

/// Property named in markup, or the property it resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyReference {
    /// `Owner.Name` or an attribute on an element of type `Owner`
    Named {
        /// Declaring type reference
        declaring: XamlTypeReference,
        /// Property name
        name: String,
    },
    /// Resolved property
    Resolved(XProperty),
}

/// Identity of a compiler-introduced local
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(pub u32);

/// Markup tree node
#[derive(Debug, Clone, PartialEq)]
pub enum XamlNode {
    /// Object element
    Object {
        line: LineInfo,
        ty: XamlTypeReference,
        children: Vec<XamlNode>,
        arguments: Vec<XamlNode>,
    },
    /// Text literal
    Text {
        line: LineInfo,
        ty: XamlTypeReference,
        text: String,
    },
    /// Property element or attribute
    PropertyValue {
        line: LineInfo,
        property: PropertyReference,
        values: Vec<XamlNode>,
    },
    /// XML directive such as `x:Key`
    Directive {
        line: LineInfo,
        namespace: String,
        name: String,
        values: Vec<XamlNode>,
    },
    /// Typed compile-time constant
    Constant {
        line: LineInfo,
        ty: XType,
        value: ConstantValue,
    },
    /// Runtime type token of `target`, typed as `ty`
    TypeOf {
        line: LineInfo,
        target: XType,
        ty: XType,
    },
    /// Read of a static field
    StaticField { line: LineInfo, field: XField },
    /// Constructor invocation
    NewObject {
        line: LineInfo,
        ty: XType,
        constructor: XConstructor,
        arguments: Vec<XamlNode>,
    },
    /// Static or instance call returning a value
    MethodCall {
        line: LineInfo,
        method: XMethod,
        instance: Option<Box<XamlNode>>,
        arguments: Vec<XamlNode>,
    },
    /// Value followed by a manipulation applied to it
    ValueWithManipulations {
        line: LineInfo,
        value: Box<XamlNode>,
        manipulation: Box<XamlNode>,
    },
    /// Read of a compiler local
    CompilerLocal {
        line: LineInfo,
        local: LocalId,
        ty: XType,
    },
    /// Evaluate, store into a compiler local and yield the value
    LocalInitialization {
        line: LineInfo,
        local: LocalId,
        value: Box<XamlNode>,
    },
    /// Setter call on the current value
    PropertyAssignment {
        line: LineInfo,
        property: XProperty,
        value: Box<XamlNode>,
    },
    /// Instance call on the current value, result discarded
    NoReturnMethodCall {
        line: LineInfo,
        method: XMethod,
        arguments: Vec<XamlNode>,
    },
    /// Getter call on the current value, then a manipulation of the result
    PropertyValueManipulation {
        line: LineInfo,
        property: XProperty,
        manipulation: Box<XamlNode>,
    },
    /// Manipulations applied in order to the same current value
    ManipulationGroup { line: LineInfo, children: Vec<XamlNode> },
    /// `ProvideValue` result assigned to `property`, or passed to `adder` on
    /// the collection returned by `property`'s getter
    MarkupExtension {
        line: LineInfo,
        value: Box<XamlNode>,
        property: XProperty,
        provide_value: XMethod,
        adder: Option<XMethod>,
    },
    /// `begin` / manipulation / `end` on the current value
    ObjectInitialization {
        line: LineInfo,
        manipulation: Box<XamlNode>,
        begin: XMethod,
        end: XMethod,
    },
    /// Drop the current value and manipulate `value` instead
    ManipulateValue {
        line: LineInfo,
        value: Box<XamlNode>,
        manipulation: Box<XamlNode>,
    },
}

impl XamlNode {
    /// Source position
    pub fn line(&self) -> LineInfo {
        match self {
            XamlNode::Object { line, .. }
            | XamlNode::Text { line, .. }
            | XamlNode::PropertyValue { line, .. }
            | XamlNode::Directive { line, .. }
            | XamlNode::Constant { line, .. }
            | XamlNode::TypeOf { line, .. }
            | XamlNode::StaticField { line, .. }
            | XamlNode::NewObject { line, .. }
            | XamlNode::MethodCall { line, .. }
            | XamlNode::ValueWithManipulations { line, .. }
            | XamlNode::CompilerLocal { line, .. }
            | XamlNode::LocalInitialization { line, .. }
            | XamlNode::PropertyAssignment { line, .. }
            | XamlNode::NoReturnMethodCall { line, .. }
            | XamlNode::PropertyValueManipulation { line, .. }
            | XamlNode::ManipulationGroup { line, .. }
            | XamlNode::MarkupExtension { line, .. }
            | XamlNode::ObjectInitialization { line, .. }
            | XamlNode::ManipulateValue { line, .. } => *line,
        }
    }

    /// Variant name, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            XamlNode::Object { .. } => "Object",
            XamlNode::Text { .. } => "Text",
            XamlNode::PropertyValue { .. } => "PropertyValue",
            XamlNode::Directive { .. } => "Directive",
            XamlNode::Constant { .. } => "Constant",
            XamlNode::TypeOf { .. } => "TypeOf",
            XamlNode::StaticField { .. } => "StaticField",
            XamlNode::NewObject { .. } => "NewObject",
            XamlNode::MethodCall { .. } => "MethodCall",
            XamlNode::ValueWithManipulations { .. } => "ValueWithManipulations",
            XamlNode::CompilerLocal { .. } => "CompilerLocal",
            XamlNode::LocalInitialization { .. } => "LocalInitialization",
            XamlNode::PropertyAssignment { .. } => "PropertyAssignment",
            XamlNode::NoReturnMethodCall { .. } => "NoReturnMethodCall",
            XamlNode::PropertyValueManipulation { .. } => "PropertyValueManipulation",
            XamlNode::ManipulationGroup { .. } => "ManipulationGroup",
            XamlNode::MarkupExtension { .. } => "MarkupExtension",
            XamlNode::ObjectInitialization { .. } => "ObjectInitialization",
            XamlNode::ManipulateValue { .. } => "ManipulateValue",
        }
    }

    /// Kind and position, for error reports
    pub fn info(&self) -> NodeInfo {
        NodeInfo {
            kind: self.kind(),
            line: self.line(),
        }
    }

    /// Whether the node produces a value when emitted
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            XamlNode::Object { .. }
                | XamlNode::Text { .. }
                | XamlNode::Constant { .. }
                | XamlNode::TypeOf { .. }
                | XamlNode::StaticField { .. }
                | XamlNode::NewObject { .. }
                | XamlNode::MethodCall { .. }
                | XamlNode::ValueWithManipulations { .. }
                | XamlNode::CompilerLocal { .. }
                | XamlNode::LocalInitialization { .. }
        )
    }

    /// Type of the value this node produces; `None` for manipulations,
    /// unresolved references and void calls
    pub fn value_type(&self) -> Option<XType> {
        match self {
            XamlNode::Object { ty, .. } | XamlNode::Text { ty, .. } => ty.clr().cloned(),
            XamlNode::Constant { ty, .. }
            | XamlNode::TypeOf { ty, .. }
            | XamlNode::NewObject { ty, .. }
            | XamlNode::CompilerLocal { ty, .. } => Some(ty.clone()),
            XamlNode::StaticField { field, .. } => Some(field.field_type()),
            XamlNode::MethodCall { method, .. } => method.return_type(),
            XamlNode::ValueWithManipulations { value, .. }
            | XamlNode::LocalInitialization { value, .. } => value.value_type(),
            _ => None,
        }
    }

    /// Display name of the value type for messages
    pub fn type_name(&self) -> String {
        match self {
            XamlNode::Object { ty, .. } | XamlNode::Text { ty, .. } => ty.to_string(),
            _ => self
                .value_type()
                .map(|t| t.fqn())
                .unwrap_or_else(|| "void".to_string()),
        }
    }

    /// Rewrite the tree bottom-up: children first, then the node itself
    pub fn visit<E>(
        self,
        f: &mut dyn FnMut(XamlNode) -> Result<XamlNode, E>,
    ) -> Result<XamlNode, E> {
        let node = match self {
            XamlNode::Object {
                line,
                ty,
                children,
                arguments,
            } => XamlNode::Object {
                line,
                ty,
                children: visit_all(children, f)?,
                arguments: visit_all(arguments, f)?,
            },
            XamlNode::PropertyValue {
                line,
                property,
                values,
            } => XamlNode::PropertyValue {
                line,
                property,
                values: visit_all(values, f)?,
            },
            XamlNode::Directive {
                line,
                namespace,
                name,
                values,
            } => XamlNode::Directive {
                line,
                namespace,
                name,
                values: visit_all(values, f)?,
            },
            XamlNode::NewObject {
                line,
                ty,
                constructor,
                arguments,
            } => XamlNode::NewObject {
                line,
                ty,
                constructor,
                arguments: visit_all(arguments, f)?,
            },
            XamlNode::MethodCall {
                line,
                method,
                instance,
                arguments,
            } => XamlNode::MethodCall {
                line,
                method,
                instance: instance.map(|i| visit_boxed(i, f)).transpose()?,
                arguments: visit_all(arguments, f)?,
            },
            XamlNode::ValueWithManipulations {
                line,
                value,
                manipulation,
            } => XamlNode::ValueWithManipulations {
                line,
                value: visit_boxed(value, f)?,
                manipulation: visit_boxed(manipulation, f)?,
            },
            XamlNode::LocalInitialization { line, local, value } => XamlNode::LocalInitialization {
                line,
                local,
                value: visit_boxed(value, f)?,
            },
            XamlNode::PropertyAssignment {
                line,
                property,
                value,
            } => XamlNode::PropertyAssignment {
                line,
                property,
                value: visit_boxed(value, f)?,
            },
            XamlNode::NoReturnMethodCall {
                line,
                method,
                arguments,
            } => XamlNode::NoReturnMethodCall {
                line,
                method,
                arguments: visit_all(arguments, f)?,
            },
            XamlNode::PropertyValueManipulation {
                line,
                property,
                manipulation,
            } => XamlNode::PropertyValueManipulation {
                line,
                property,
                manipulation: visit_boxed(manipulation, f)?,
            },
            XamlNode::ManipulationGroup { line, children } => XamlNode::ManipulationGroup {
                line,
                children: visit_all(children, f)?,
            },
            XamlNode::MarkupExtension {
                line,
                value,
                property,
                provide_value,
                adder,
            } => XamlNode::MarkupExtension {
                line,
                value: visit_boxed(value, f)?,
                property,
                provide_value,
                adder,
            },
            XamlNode::ObjectInitialization {
                line,
                manipulation,
                begin,
                end,
            } => XamlNode::ObjectInitialization {
                line,
                manipulation: visit_boxed(manipulation, f)?,
                begin,
                end,
            },
            XamlNode::ManipulateValue {
                line,
                value,
                manipulation,
            } => XamlNode::ManipulateValue {
                line,
                value: visit_boxed(value, f)?,
                manipulation: visit_boxed(manipulation, f)?,
            },
            leaf @ (XamlNode::Text { .. }
            | XamlNode::Constant { .. }
            | XamlNode::TypeOf { .. }
            | XamlNode::StaticField { .. }
            | XamlNode::CompilerLocal { .. }) => leaf,
        };
        f(node)
    }
}

fn visit_all<E>(
    nodes: Vec<XamlNode>,
    f: &mut dyn FnMut(XamlNode) -> Result<XamlNode, E>,
) -> Result<Vec<XamlNode>, E> {
    nodes.into_iter().map(|n| n.visit(f)).collect()
}

fn visit_boxed<E>(
    node: Box<XamlNode>,
    f: &mut dyn FnMut(XamlNode) -> Result<XamlNode, E>,
) -> Result<Box<XamlNode>, E> {
    Ok(Box::new((*node).visit(f)?))
}

/// Raw document handed over by the markup parser
#[derive(Debug, Clone, PartialEq)]
pub struct XamlDocument {
    /// Root element
    pub root: XamlNode,
    /// Prefix to namespace URI, the default namespace under `""`
    pub namespace_aliases: FxHashMap<String, String>,
}

impl XamlDocument {
    /// Document without namespace aliases
    pub fn new(root: XamlNode) -> Self {
        Self {
            root,
            namespace_aliases: FxHashMap::default(),
        }
    }

    /// Register a namespace prefix
    pub fn with_alias(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespace_aliases.insert(prefix.into(), uri.into());
        self
    }
}
