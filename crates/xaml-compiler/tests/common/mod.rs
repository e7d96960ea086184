//! Shared fixtures: a small zoo universe on both type-system backends and
//! builders for raw markup trees

#![allow(dead_code)]

use std::sync::Arc;
use xaml_compiler::emit::recording::RecordingTypeBuilder;
use xaml_compiler::{
    LineInfo, PropertyReference, RuntimeContext, TransformerConfiguration, XamlCompiler,
    XamlDocument, XamlNode, XamlTypeReference, XmlTypeReference, XAML2006,
};
use xaml_types::{
    ConstantValue, LoadedSig, LoadedTypeSystemBuilder, MetadataTypeSystem, TypeKind, TypeSystem,
    XType,
};

pub const ZOO_NS: &str = "https://schemas.example.org/zoo";
pub const LOCAL_NS: &str = "clr-namespace:Demo;assembly=app";

pub const MAPPINGS: &str = r#"{
    "service_provider": "System.IServiceProvider",
    "content_attributes": ["Demo.ContentAttribute"],
    "usable_during_initialization_attributes": ["Demo.UsableDuringInitializationAttribute"],
    "support_initialize": "System.ComponentModel.ISupportInitialize",
    "xmlns_mappings": {
        "https://schemas.example.org/zoo": [{ "namespace": "Demo", "assembly": "app" }]
    }
}"#;

// ============================================================================
// Type universes
// ============================================================================

pub fn loaded_type_system() -> Arc<dyn TypeSystem> {
    let mut b = LoadedTypeSystemBuilder::new();

    let object = b.declare("corlib", "System", "Object", TypeKind::Class);
    let string = b.declare("corlib", "System", "String", TypeKind::Class);
    b.declare("corlib", "System", "Boolean", TypeKind::Struct);
    let int32 = b.declare("corlib", "System", "Int32", TypeKind::Struct);
    b.declare("corlib", "System", "Int64", TypeKind::Struct);
    b.declare("corlib", "System", "Double", TypeKind::Struct);
    let nullable = b.declare_generic("corlib", "System", "Nullable`1", TypeKind::Struct, &["T"]);
    let system_type = b.declare("corlib", "System", "Type", TypeKind::Class);
    let service_provider = b.declare("corlib", "System", "IServiceProvider", TypeKind::Interface);
    let support_init = b.declare(
        "corlib",
        "System.ComponentModel",
        "ISupportInitialize",
        TypeKind::Interface,
    );

    let content = b.declare("app", "Demo", "ContentAttribute", TypeKind::Class);
    let usable = b.declare("app", "Demo", "UsableDuringInitializationAttribute", TypeKind::Class);
    let context = b.declare("app", "Demo", "XamlContext", TypeKind::Class);
    let animal = b.declare("app", "Demo", "Animal", TypeKind::Class);
    let dog = b.declare("app", "Demo", "Dog", TypeKind::Class);
    let mood = b.declare("app", "Demo", "Mood", TypeKind::Enum);
    let animal_list = b.declare("app", "Demo", "AnimalList", TypeKind::Class);
    let resource_map = b.declare("app", "Demo", "ResourceMap", TypeKind::Class);
    let zoo = b.declare("app", "Demo", "Zoo", TypeKind::Class);
    let panel = b.declare("app", "Demo", "Panel", TypeKind::Class);
    let window = b.declare("app", "Demo", "Window", TypeKind::Class);
    let point = b.declare("app", "Demo", "Point", TypeKind::Struct);
    let tag = b.declare("app", "Demo", "Tag", TypeKind::Class);
    let defaults = b.declare("app", "Demo", "Defaults", TypeKind::Class);
    let greeting = b.declare("app", "Demo", "GreetingExtension", TypeKind::Class);
    let pet = b.declare("app", "Demo", "PetExtension", TypeKind::Class);
    let cage = b.declare_generic("app", "Demo", "Cage`1", TypeKind::Class, &["T"]);

    for id in [string, system_type, content, usable] {
        b.define(id).base(object);
    }
    b.define(nullable)
        .constructor(vec![LoadedSig::Param(0)])
        .readonly_property("Value", LoadedSig::Param(0));
    b.define(support_init)
        .method("BeginInit", vec![], None)
        .method("EndInit", vec![], None);

    b.define(context)
        .base(object)
        .interface(service_provider)
        .constructor(vec![service_provider.into()])
        .field("RootObject", object);
    b.define(animal)
        .base(object)
        .constructor(vec![])
        .constructor(vec![string.into()])
        .property("Name", string)
        .property("Age", int32)
        .property("Weight", LoadedSig::Inst(nullable, vec![int32.into()]))
        .property("Friend", animal)
        .property("Tag", tag);
    b.define(dog)
        .base(animal)
        .constructor(vec![])
        .property("Mood", mood);
    b.define(mood)
        .literal("Happy", mood, Some(ConstantValue::I32(0)))
        .literal("Sleepy", mood, Some(ConstantValue::I32(1)))
        .field("value__", int32);
    b.define(animal_list)
        .base(object)
        .constructor(vec![])
        .method("Add", vec![object.into()], None)
        .method("Add", vec![animal.into()], None);
    b.define(resource_map)
        .base(object)
        .constructor(vec![])
        .method("Add", vec![string.into(), object.into()], None);
    b.define(zoo)
        .base(object)
        .constructor(vec![])
        .readonly_property("Animals", animal_list)
        .property_attribute(content)
        .readonly_property("Resources", resource_map)
        .property("Title", string)
        .property("Keeper", animal)
        .property("Window", window)
        .property("Location", point)
        .property("Exhibit", system_type)
        .property("Mascot", object);
    b.define(panel)
        .base(object)
        .interface(support_init)
        .constructor(vec![])
        .property("Child", object)
        .property_attribute(content)
        .method("BeginInit", vec![], None)
        .method("EndInit", vec![], None);
    b.define(window)
        .base(object)
        .attribute(usable)
        .constructor(vec![])
        .property("Title", string);
    b.define(point)
        .static_method("Parse", vec![string.into()], Some(point.into()));
    b.define(tag)
        .base(object)
        .constructor(vec![])
        .static_method("op_Implicit", vec![string.into()], Some(tag.into()));
    b.define(defaults)
        .base(object)
        .literal("MaxAge", int32, Some(ConstantValue::I32(20)))
        .static_field("Default", animal)
        .static_property("Current", zoo);
    b.define(greeting)
        .base(object)
        .constructor(vec![])
        .property("Text", string)
        .method("ProvideValue", vec![service_provider.into()], Some(object.into()))
        .method("ProvideValue", vec![], Some(string.into()));
    b.define(pet)
        .base(object)
        .constructor(vec![])
        .method("ProvideValue", vec![service_provider.into()], Some(animal.into()));
    b.define(cage)
        .base(object)
        .constructor(vec![])
        .property("Occupant", LoadedSig::Param(0));

    Arc::new(b.build().expect("loaded fixture"))
}

pub const METADATA: &str = r#"[
    {
        "name": "corlib",
        "types": [
            { "namespace": "System", "name": "Object" },
            { "namespace": "System", "name": "String", "base": "System.Object" },
            { "namespace": "System", "name": "Boolean", "kind": "struct" },
            { "namespace": "System", "name": "Int32", "kind": "struct" },
            { "namespace": "System", "name": "Int64", "kind": "struct" },
            { "namespace": "System", "name": "Double", "kind": "struct" },
            {
                "namespace": "System", "name": "Nullable`1", "kind": "struct",
                "generic_parameters": ["T"],
                "constructors": [{ "parameters": [{ "generic_parameter": 0 }] }],
                "methods": [{ "name": "get_Value", "returns": { "generic_parameter": 0 } }],
                "properties": [{ "name": "Value", "type": { "generic_parameter": 0 }, "getter": "get_Value" }]
            },
            { "namespace": "System", "name": "Type", "base": "System.Object" },
            { "namespace": "System", "name": "IServiceProvider", "kind": "interface" },
            {
                "namespace": "System.ComponentModel", "name": "ISupportInitialize", "kind": "interface",
                "methods": [{ "name": "BeginInit" }, { "name": "EndInit" }]
            }
        ]
    },
    {
        "name": "app",
        "types": [
            { "namespace": "Demo", "name": "ContentAttribute", "base": "System.Object" },
            { "namespace": "Demo", "name": "UsableDuringInitializationAttribute", "base": "System.Object" },
            {
                "namespace": "Demo", "name": "XamlContext", "base": "System.Object",
                "interfaces": ["System.IServiceProvider"],
                "constructors": [{ "parameters": ["System.IServiceProvider"] }],
                "fields": [{ "name": "RootObject", "type": "System.Object" }]
            },
            {
                "namespace": "Demo", "name": "Animal", "base": "System.Object",
                "constructors": [{}, { "parameters": ["System.String"] }],
                "methods": [
                    { "name": "get_Name", "returns": "System.String" },
                    { "name": "set_Name", "parameters": ["System.String"] },
                    { "name": "get_Age", "returns": "System.Int32" },
                    { "name": "set_Age", "parameters": ["System.Int32"] },
                    { "name": "get_Weight", "returns": { "name": "System.Nullable`1", "arguments": ["System.Int32"] } },
                    { "name": "set_Weight", "parameters": [{ "name": "System.Nullable`1", "arguments": ["System.Int32"] }] },
                    { "name": "get_Friend", "returns": "Demo.Animal" },
                    { "name": "set_Friend", "parameters": ["Demo.Animal"] },
                    { "name": "get_Tag", "returns": "Demo.Tag" },
                    { "name": "set_Tag", "parameters": ["Demo.Tag"] }
                ],
                "properties": [
                    { "name": "Name", "type": "System.String", "getter": "get_Name", "setter": "set_Name" },
                    { "name": "Age", "type": "System.Int32", "getter": "get_Age", "setter": "set_Age" },
                    {
                        "name": "Weight",
                        "type": { "name": "System.Nullable`1", "arguments": ["System.Int32"] },
                        "getter": "get_Weight", "setter": "set_Weight"
                    },
                    { "name": "Friend", "type": "Demo.Animal", "getter": "get_Friend", "setter": "set_Friend" },
                    { "name": "Tag", "type": "Demo.Tag", "getter": "get_Tag", "setter": "set_Tag" }
                ]
            },
            {
                "namespace": "Demo", "name": "Dog", "base": "Demo.Animal",
                "constructors": [{}],
                "methods": [
                    { "name": "get_Mood", "returns": "Demo.Mood" },
                    { "name": "set_Mood", "parameters": ["Demo.Mood"] }
                ],
                "properties": [{ "name": "Mood", "type": "Demo.Mood", "getter": "get_Mood", "setter": "set_Mood" }]
            },
            {
                "namespace": "Demo", "name": "Mood", "kind": "enum",
                "fields": [
                    { "name": "Happy", "type": "Demo.Mood", "static": true, "literal": true, "constant": { "i32": 0 } },
                    { "name": "Sleepy", "type": "Demo.Mood", "static": true, "literal": true, "constant": { "i32": 1 } },
                    { "name": "value__", "type": "System.Int32" }
                ]
            },
            {
                "namespace": "Demo", "name": "AnimalList", "base": "System.Object",
                "constructors": [{}],
                "methods": [
                    { "name": "Add", "parameters": ["System.Object"] },
                    { "name": "Add", "parameters": ["Demo.Animal"] }
                ]
            },
            {
                "namespace": "Demo", "name": "ResourceMap", "base": "System.Object",
                "constructors": [{}],
                "methods": [{ "name": "Add", "parameters": ["System.String", "System.Object"] }]
            },
            {
                "namespace": "Demo", "name": "Zoo", "base": "System.Object",
                "constructors": [{}],
                "methods": [
                    { "name": "get_Animals", "returns": "Demo.AnimalList" },
                    { "name": "get_Resources", "returns": "Demo.ResourceMap" },
                    { "name": "get_Title", "returns": "System.String" },
                    { "name": "set_Title", "parameters": ["System.String"] },
                    { "name": "get_Keeper", "returns": "Demo.Animal" },
                    { "name": "set_Keeper", "parameters": ["Demo.Animal"] },
                    { "name": "get_Window", "returns": "Demo.Window" },
                    { "name": "set_Window", "parameters": ["Demo.Window"] },
                    { "name": "get_Location", "returns": "Demo.Point" },
                    { "name": "set_Location", "parameters": ["Demo.Point"] },
                    { "name": "get_Exhibit", "returns": "System.Type" },
                    { "name": "set_Exhibit", "parameters": ["System.Type"] },
                    { "name": "get_Mascot", "returns": "System.Object" },
                    { "name": "set_Mascot", "parameters": ["System.Object"] }
                ],
                "properties": [
                    { "name": "Animals", "type": "Demo.AnimalList", "getter": "get_Animals", "attributes": ["Demo.ContentAttribute"] },
                    { "name": "Resources", "type": "Demo.ResourceMap", "getter": "get_Resources" },
                    { "name": "Title", "type": "System.String", "getter": "get_Title", "setter": "set_Title" },
                    { "name": "Keeper", "type": "Demo.Animal", "getter": "get_Keeper", "setter": "set_Keeper" },
                    { "name": "Window", "type": "Demo.Window", "getter": "get_Window", "setter": "set_Window" },
                    { "name": "Location", "type": "Demo.Point", "getter": "get_Location", "setter": "set_Location" },
                    { "name": "Exhibit", "type": "System.Type", "getter": "get_Exhibit", "setter": "set_Exhibit" },
                    { "name": "Mascot", "type": "System.Object", "getter": "get_Mascot", "setter": "set_Mascot" }
                ]
            },
            {
                "namespace": "Demo", "name": "Panel", "base": "System.Object",
                "interfaces": ["System.ComponentModel.ISupportInitialize"],
                "constructors": [{}],
                "methods": [
                    { "name": "get_Child", "returns": "System.Object" },
                    { "name": "set_Child", "parameters": ["System.Object"] },
                    { "name": "BeginInit" },
                    { "name": "EndInit" }
                ],
                "properties": [
                    {
                        "name": "Child", "type": "System.Object", "getter": "get_Child", "setter": "set_Child",
                        "attributes": ["Demo.ContentAttribute"]
                    }
                ]
            },
            {
                "namespace": "Demo", "name": "Window", "base": "System.Object",
                "attributes": ["Demo.UsableDuringInitializationAttribute"],
                "constructors": [{}],
                "methods": [
                    { "name": "get_Title", "returns": "System.String" },
                    { "name": "set_Title", "parameters": ["System.String"] }
                ],
                "properties": [{ "name": "Title", "type": "System.String", "getter": "get_Title", "setter": "set_Title" }]
            },
            {
                "namespace": "Demo", "name": "Point", "kind": "struct",
                "methods": [{ "name": "Parse", "static": true, "parameters": ["System.String"], "returns": "Demo.Point" }]
            },
            {
                "namespace": "Demo", "name": "Tag", "base": "System.Object",
                "constructors": [{}],
                "methods": [{ "name": "op_Implicit", "static": true, "parameters": ["System.String"], "returns": "Demo.Tag" }]
            },
            {
                "namespace": "Demo", "name": "Defaults", "base": "System.Object",
                "fields": [
                    { "name": "MaxAge", "type": "System.Int32", "static": true, "literal": true, "constant": { "i32": 20 } },
                    { "name": "Default", "type": "Demo.Animal", "static": true }
                ],
                "methods": [{ "name": "get_Current", "static": true, "returns": "Demo.Zoo" }],
                "properties": [{ "name": "Current", "type": "Demo.Zoo", "getter": "get_Current" }]
            },
            {
                "namespace": "Demo", "name": "GreetingExtension", "base": "System.Object",
                "constructors": [{}],
                "methods": [
                    { "name": "get_Text", "returns": "System.String" },
                    { "name": "set_Text", "parameters": ["System.String"] },
                    { "name": "ProvideValue", "parameters": ["System.IServiceProvider"], "returns": "System.Object" },
                    { "name": "ProvideValue", "returns": "System.String" }
                ],
                "properties": [{ "name": "Text", "type": "System.String", "getter": "get_Text", "setter": "set_Text" }]
            },
            {
                "namespace": "Demo", "name": "PetExtension", "base": "System.Object",
                "constructors": [{}],
                "methods": [{ "name": "ProvideValue", "parameters": ["System.IServiceProvider"], "returns": "Demo.Animal" }]
            },
            {
                "namespace": "Demo", "name": "Cage`1", "base": "System.Object",
                "generic_parameters": ["T"],
                "constructors": [{}],
                "methods": [
                    { "name": "get_Occupant", "returns": { "generic_parameter": 0 } },
                    { "name": "set_Occupant", "parameters": [{ "generic_parameter": 0 }] }
                ],
                "properties": [
                    { "name": "Occupant", "type": { "generic_parameter": 0 }, "getter": "get_Occupant", "setter": "set_Occupant" }
                ]
            }
        ]
    }
]"#;

pub fn metadata_type_system() -> Arc<dyn TypeSystem> {
    Arc::new(MetadataTypeSystem::from_json(METADATA).expect("metadata fixture"))
}

pub fn configuration(ts: Arc<dyn TypeSystem>) -> Arc<TransformerConfiguration> {
    Arc::new(TransformerConfiguration::from_json(ts, MAPPINGS).expect("configuration"))
}

pub fn loaded_config() -> Arc<TransformerConfiguration> {
    configuration(loaded_type_system())
}

/// One configuration per backend, labelled for assertion messages
pub fn configs() -> Vec<(&'static str, Arc<TransformerConfiguration>)> {
    vec![
        ("loaded", configuration(loaded_type_system())),
        ("metadata", configuration(metadata_type_system())),
    ]
}

pub fn ty(config: &TransformerConfiguration, full_name: &str) -> XType {
    config
        .type_system()
        .get_type(full_name)
        .expect("fixture type")
}

pub fn compiler(config: &Arc<TransformerConfiguration>) -> XamlCompiler {
    XamlCompiler::new(config.clone(), true)
}

pub fn runtime(config: &TransformerConfiguration) -> RuntimeContext {
    let context_type = ty(config, "Demo.XamlContext");
    let constructor = context_type
        .constructors()
        .into_iter()
        .next()
        .expect("context constructor");
    let root_object_field = context_type
        .find_field("RootObject")
        .expect("root object field");
    RuntimeContext {
        context_type,
        constructor,
        root_object_field,
    }
}

/// Transform strictly and compile into a recording builder
pub fn build(config: &Arc<TransformerConfiguration>, root: XamlNode) -> RecordingTypeBuilder {
    let compiler = compiler(config);
    let outcome = compiler
        .transform(document(root), true)
        .expect("transform");
    let mut builder = RecordingTypeBuilder::new("Generated", "Generated.Builder");
    compiler
        .compile(
            &outcome.document.root,
            &mut builder,
            &runtime(config),
            "Populate",
            "Build",
        )
        .expect("compile");
    builder
}

// ============================================================================
// Raw tree builders
// ============================================================================

pub fn line(n: u32) -> LineInfo {
    LineInfo::new(n, 1)
}

pub fn document(root: XamlNode) -> XamlDocument {
    XamlDocument::new(root)
        .with_alias("", ZOO_NS)
        .with_alias("x", XAML2006)
        .with_alias("local", LOCAL_NS)
}

/// Element in the zoo namespace
pub fn obj(name: &str, children: Vec<XamlNode>) -> XamlNode {
    obj_at(1, name, children)
}

pub fn obj_at(n: u32, name: &str, children: Vec<XamlNode>) -> XamlNode {
    XamlNode::Object {
        line: line(n),
        ty: XamlTypeReference::Xml(XmlTypeReference::new(ZOO_NS, name)),
        children,
        arguments: Vec::new(),
    }
}

/// Element in the XAML language namespace (`x:Null`, `x:String`, ...)
pub fn xobj(name: &str, children: Vec<XamlNode>, arguments: Vec<XamlNode>) -> XamlNode {
    XamlNode::Object {
        line: line(1),
        ty: XamlTypeReference::Xml(XmlTypeReference::new(XAML2006, name)),
        children,
        arguments,
    }
}

pub fn text(value: &str) -> XamlNode {
    XamlNode::Text {
        line: line(1),
        ty: XamlTypeReference::Xml(XmlTypeReference::new(XAML2006, "String")),
        text: value.to_string(),
    }
}

/// Property element or attribute `Owner.Name`
pub fn prop(owner: &str, name: &str, values: Vec<XamlNode>) -> XamlNode {
    prop_at(1, owner, name, values)
}

pub fn prop_at(n: u32, owner: &str, name: &str, values: Vec<XamlNode>) -> XamlNode {
    XamlNode::PropertyValue {
        line: line(n),
        property: PropertyReference::Named {
            declaring: XamlTypeReference::Xml(XmlTypeReference::new(ZOO_NS, owner)),
            name: name.to_string(),
        },
        values,
    }
}

pub fn directive(name: &str, values: Vec<XamlNode>) -> XamlNode {
    XamlNode::Directive {
        line: line(1),
        namespace: XAML2006.to_string(),
        name: name.to_string(),
        values,
    }
}

/// Every node of the tree, children before parents
pub fn nodes(root: &XamlNode) -> Vec<XamlNode> {
    let mut all = Vec::new();
    root.clone()
        .visit::<()>(&mut |node| {
            all.push(node.clone());
            Ok(node)
        })
        .expect("infallible visit");
    all
}
