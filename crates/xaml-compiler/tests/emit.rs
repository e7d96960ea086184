//! Code emission tests

mod common;

use common::*;
use std::sync::Arc;
use xaml_compiler::emit::convert::{plan_conversion, Conversion};
use xaml_compiler::emit::default_emitters;
use xaml_compiler::emit::recording::{RecordedProcedure, RecordingTypeBuilder};
use xaml_compiler::{
    LocalId, LocalSlot, MethodSignature, Op, ProcedureId, PropertyReference, TransformerConfiguration,
    TypeBuilder, XamlLoadError, XamlNode, XamlTypeReference, XmlTypeReference,
};
use xaml_types::{ConstantValue, XConstructor, XMethod, XType};

// ============================================================================
// Helpers
// ============================================================================

fn method(config: &TransformerConfiguration, owner: &str, name: &str, arity: usize) -> XMethod {
    ty(config, owner)
        .find_method(|m| m.name() == name && m.parameters().len() == arity)
        .unwrap_or_else(|| panic!("{}::{}", owner, name))
}

fn setter(config: &TransformerConfiguration, owner: &str, property: &str) -> XMethod {
    ty(config, owner)
        .find_property(property)
        .and_then(|p| p.setter())
        .unwrap_or_else(|| panic!("{}.{} setter", owner, property))
}

fn getter(config: &TransformerConfiguration, owner: &str, property: &str) -> XMethod {
    ty(config, owner)
        .find_property(property)
        .and_then(|p| p.getter())
        .unwrap_or_else(|| panic!("{}.{} getter", owner, property))
}

fn ctor(config: &TransformerConfiguration, owner: &str, arity: usize) -> XConstructor {
    ty(config, owner)
        .constructors()
        .into_iter()
        .find(|c| c.parameters().len() == arity)
        .unwrap_or_else(|| panic!("{} constructor", owner))
}

/// Populate prologue: context construction and root registration
fn prologue(config: &TransformerConfiguration) -> Vec<Op> {
    let runtime = runtime(config);
    vec![
        Op::Ldarg(0),
        Op::Newobj(runtime.constructor),
        Op::Stloc(LocalSlot(0)),
        Op::Ldloc(LocalSlot(0)),
        Op::Ldarg(1),
        Op::Stfld(runtime.root_object_field),
        Op::Ldarg(1),
    ]
}

fn populate_ops(builder: &RecordingTypeBuilder) -> Vec<Op> {
    builder.procedure("Populate").expect("populate").ops.clone()
}

/// Populate body after the prologue
fn populate_body(config: &Arc<TransformerConfiguration>, root: XamlNode) -> Vec<Op> {
    let ops = populate_ops(&build(config, root));
    let prologue = prologue(config);
    assert_eq!(ops[..prologue.len()], prologue[..]);
    ops[prologue.len()..].to_vec()
}

fn procedure(id: u32) -> RecordedProcedure {
    RecordedProcedure {
        id: ProcedureId(id),
        signature: MethodSignature {
            name: format!("Proc{}", id),
            return_type: None,
            parameters: Vec::new(),
            is_public: true,
            is_static: true,
        },
        locals: Vec::new(),
        ops: Vec::new(),
    }
}

fn new_object(config: &TransformerConfiguration, owner: &str) -> XamlNode {
    XamlNode::NewObject {
        line: line(3),
        ty: ty(config, owner),
        constructor: ctor(config, owner, 0),
        arguments: Vec::new(),
    }
}

// ============================================================================
// Procedure layout
// ============================================================================

#[test]
fn test_compile_populate_and_create() {
    for (backend, config) in configs() {
        let builder = build(
            &config,
            obj(
                "Animal",
                vec![
                    prop("Animal", "Name", vec![text("Rex")]),
                    prop("Animal", "Age", vec![text("3")]),
                ],
            ),
        );

        let animal = ty(&config, "Demo.Animal");
        let populate = builder.procedure("Populate").expect("populate");
        assert_eq!(
            populate.signature.parameters,
            vec![ty(&config, "System.IServiceProvider"), animal.clone()]
        );
        assert_eq!(populate.signature.return_type, None);
        assert_eq!(populate.locals, vec![ty(&config, "Demo.XamlContext")]);

        let mut expected = prologue(&config);
        expected.extend([
            Op::Dup,
            Op::Ldstr("Rex".to_string()),
            Op::Callvirt(setter(&config, "Demo.Animal", "Name")),
            Op::LdcI4(3),
            Op::Callvirt(setter(&config, "Demo.Animal", "Age")),
            Op::Ret,
        ]);
        assert_eq!(populate.ops, expected, "{}", backend);

        let create = builder.procedure("Build").expect("create");
        assert_eq!(create.signature.return_type, Some(animal.clone()));
        // A parameterless root needs no context in create
        assert_eq!(create.locals, vec![animal]);
        let populate_method = builder.method(populate.id).expect("populate handle");
        assert_eq!(
            create.ops,
            vec![
                Op::Newobj(ctor(&config, "Demo.Animal", 0)),
                Op::Stloc(LocalSlot(0)),
                Op::Ldarg(0),
                Op::Ldloc(LocalSlot(0)),
                Op::Call(populate_method),
                Op::Ldloc(LocalSlot(0)),
                Op::Ret,
            ],
            "{}",
            backend
        );
    }
}

#[test]
fn test_create_initializes_context_for_arguments() {
    let config = loaded_config();
    let builder = build(&config, obj("Animal", vec![directive("Arguments", vec![text("Rex")])]));
    let runtime = runtime(&config);

    let create = builder.procedure("Build").expect("create");
    let populate_method = builder
        .method(builder.procedure("Populate").expect("populate").id)
        .expect("populate handle");
    assert_eq!(
        create.ops,
        vec![
            Op::Ldarg(0),
            Op::Newobj(runtime.constructor),
            Op::Stloc(LocalSlot(0)),
            Op::Ldstr("Rex".to_string()),
            Op::Newobj(ctor(&config, "Demo.Animal", 1)),
            Op::Stloc(LocalSlot(1)),
            Op::Ldarg(0),
            Op::Ldloc(LocalSlot(1)),
            Op::Call(populate_method),
            Op::Ldloc(LocalSlot(1)),
            Op::Ret,
        ]
    );

    // Nothing to populate: the root is popped
    assert_eq!(
        populate_body(&config, obj("Animal", vec![directive("Arguments", vec![text("Rex")])])),
        vec![Op::Pop, Op::Ret]
    );
}

#[test]
fn test_backends_emit_identical_code() {
    let root = obj(
        "Zoo",
        vec![
            prop("Zoo", "Title", vec![obj("GreetingExtension", vec![])]),
            prop("Zoo", "Keeper", vec![obj("PetExtension", vec![])]),
            prop("Zoo", "Location", vec![text("1,2")]),
            obj("Dog", vec![prop("Dog", "Mood", vec![text("Sleepy")])]),
            obj("Animal", vec![prop("Animal", "Weight", vec![text("9")])]),
        ],
    );
    let emitted: Vec<Vec<Op>> = configs()
        .into_iter()
        .map(|(_, config)| populate_ops(&build(&config, root.clone())))
        .collect();
    assert_eq!(emitted[0], emitted[1]);
}

// ============================================================================
// Values and conversions
// ============================================================================

#[test]
fn test_constants_and_intrinsics() {
    let config = loaded_config();
    let body = populate_body(
        &config,
        obj(
            "Zoo",
            vec![
                prop("Zoo", "Title", vec![xobj("Null", vec![], vec![])]),
                prop("Zoo", "Exhibit", vec![xobj("Type", vec![], vec![text("local:Dog")])]),
                prop(
                    "Zoo",
                    "Keeper",
                    vec![xobj("Static", vec![], vec![text("local:Defaults.Default")])],
                ),
                prop(
                    "Zoo",
                    "Mascot",
                    vec![xobj("Static", vec![], vec![text("local:Defaults.Current")])],
                ),
            ],
        ),
    );

    let default = ty(&config, "Demo.Defaults").find_field("Default").expect("Default");
    assert_eq!(
        body,
        vec![
            Op::Dup,
            Op::Ldnull,
            Op::Callvirt(setter(&config, "Demo.Zoo", "Title")),
            Op::Dup,
            Op::LdType(ty(&config, "Demo.Dog")),
            Op::Callvirt(setter(&config, "Demo.Zoo", "Exhibit")),
            Op::Dup,
            Op::Ldsfld(default),
            Op::Callvirt(setter(&config, "Demo.Zoo", "Keeper")),
            Op::Call(getter(&config, "Demo.Defaults", "Current")),
            Op::Callvirt(setter(&config, "Demo.Zoo", "Mascot")),
            Op::Ret,
        ]
    );
}

#[test]
fn test_value_type_boxed_into_object() {
    let config = loaded_config();
    let body = populate_body(
        &config,
        obj(
            "Zoo",
            vec![prop(
                "Zoo",
                "Mascot",
                vec![xobj("Static", vec![], vec![text("local:Defaults.MaxAge")])],
            )],
        ),
    );
    let int32 = ty(&config, "System.Int32");
    assert_eq!(
        body,
        vec![
            Op::LdcI4(20),
            Op::Box(int32),
            Op::Callvirt(setter(&config, "Demo.Zoo", "Mascot")),
            Op::Ret,
        ]
    );
}

#[test]
fn test_nullable_wrapped_at_assignment() {
    for (backend, config) in configs() {
        let body = populate_body(&config, obj("Animal", vec![prop("Animal", "Weight", vec![text("12")])]));

        let wk = config.well_known_types();
        let nullable = wk
            .nullable
            .make_generic_type(&[wk.int32.clone()])
            .expect("Nullable<Int32>");
        let wrap = nullable.constructors().into_iter().next().expect("Nullable ctor");
        assert_eq!(
            body,
            vec![
                Op::LdcI4(12),
                Op::Newobj(wrap),
                Op::Callvirt(setter(&config, "Demo.Animal", "Weight")),
                Op::Ret,
            ],
            "{}",
            backend
        );
    }
}

#[test]
fn test_parse_and_enum_values() {
    let config = loaded_config();
    let body = populate_body(
        &config,
        obj(
            "Dog",
            vec![
                prop("Dog", "Mood", vec![text("Happy")]),
                prop("Dog", "Name", vec![text("Rex")]),
            ],
        ),
    );
    assert_eq!(
        body,
        vec![
            Op::Dup,
            Op::LdcI4(0),
            Op::Callvirt(setter(&config, "Demo.Dog", "Mood")),
            Op::Ldstr("Rex".to_string()),
            Op::Callvirt(setter(&config, "Demo.Animal", "Name")),
            Op::Ret,
        ]
    );

    let body = populate_body(&config, obj("Zoo", vec![prop("Zoo", "Location", vec![text("3,4")])]));
    assert_eq!(
        body,
        vec![
            Op::Ldstr("3,4".to_string()),
            Op::Call(method(&config, "Demo.Point", "Parse", 1)),
            Op::Callvirt(setter(&config, "Demo.Zoo", "Location")),
            Op::Ret,
        ]
    );
}

#[test]
fn test_plan_conversion() {
    let config = loaded_config();
    let wk = config.well_known_types();
    let animal = ty(&config, "Demo.Animal");
    let dog = ty(&config, "Demo.Dog");
    let tag = ty(&config, "Demo.Tag");
    let sp = ty(&config, "System.IServiceProvider");
    let nullable = wk
        .nullable
        .make_generic_type(&[wk.int32.clone()])
        .expect("Nullable<Int32>");

    assert_eq!(plan_conversion(wk, &dog, &animal), Some(Conversion::Upcast));
    assert_eq!(
        plan_conversion(wk, &ty(&config, "Demo.XamlContext"), &sp),
        Some(Conversion::Upcast)
    );
    assert_eq!(
        plan_conversion(wk, &wk.int32, &wk.object),
        Some(Conversion::Box(wk.int32.clone()))
    );
    assert_eq!(
        plan_conversion(wk, &wk.object, &wk.int32),
        Some(Conversion::UnboxAny(wk.int32.clone()))
    );
    assert!(matches!(
        plan_conversion(wk, &wk.int32, &nullable),
        Some(Conversion::NullableWrap(c)) if c.parameters() == vec![wk.int32.clone()]
    ));
    assert!(matches!(
        plan_conversion(wk, &nullable, &wk.int32),
        Some(Conversion::NullableUnwrap(g)) if g.name() == "get_Value"
    ));
    assert_eq!(
        plan_conversion(wk, &wk.string, &tag),
        Some(Conversion::Implicit(method(&config, "Demo.Tag", "op_Implicit", 1)))
    );
    assert_eq!(plan_conversion(wk, &animal, &dog), None);
    assert_eq!(plan_conversion(wk, &dog, &sp), None);
}

// ============================================================================
// Manipulations
// ============================================================================

#[test]
fn test_collection_add() {
    let config = loaded_config();
    // The typed overload, not the first declared one
    let add = ty(&config, "Demo.AnimalList")
        .find_method(|m| m.name() == "Add" && m.parameters() == [ty(&config, "Demo.Animal")])
        .expect("Add(Animal)");
    let body = populate_body(&config, obj("Zoo", vec![obj("Dog", vec![])]));
    assert_eq!(
        body,
        vec![
            Op::Callvirt(getter(&config, "Demo.Zoo", "Animals")),
            Op::Newobj(ctor(&config, "Demo.Dog", 0)),
            Op::Dup,
            Op::Pop,
            Op::Callvirt(add),
            Op::Ret,
        ]
    );
}

#[test]
fn test_keyed_add() {
    let config = loaded_config();
    let body = populate_body(
        &config,
        obj(
            "Zoo",
            vec![prop(
                "Zoo",
                "Resources",
                vec![obj("Animal", vec![directive("Key", vec![text("rex")])])],
            )],
        ),
    );
    assert_eq!(
        body,
        vec![
            Op::Callvirt(getter(&config, "Demo.Zoo", "Resources")),
            Op::Ldstr("rex".to_string()),
            Op::Newobj(ctor(&config, "Demo.Animal", 0)),
            Op::Dup,
            Op::Pop,
            Op::Callvirt(method(&config, "Demo.ResourceMap", "Add", 2)),
            Op::Ret,
        ]
    );
}

#[test]
fn test_markup_extensions() {
    let config = loaded_config();
    let pet_provide = method(&config, "Demo.PetExtension", "ProvideValue", 1);

    let body = populate_body(
        &config,
        obj(
            "Zoo",
            vec![
                prop("Zoo", "Title", vec![obj("GreetingExtension", vec![])]),
                prop("Zoo", "Keeper", vec![obj("PetExtension", vec![])]),
                obj("PetExtension", vec![]),
            ],
        ),
    );
    assert_eq!(
        body,
        vec![
            // Title: parameterless ProvideValue
            Op::Dup,
            Op::Newobj(ctor(&config, "Demo.GreetingExtension", 0)),
            Op::Dup,
            Op::Pop,
            Op::Callvirt(method(&config, "Demo.GreetingExtension", "ProvideValue", 0)),
            Op::Callvirt(setter(&config, "Demo.Zoo", "Title")),
            // Keeper: the context is the service provider
            Op::Dup,
            Op::Newobj(ctor(&config, "Demo.PetExtension", 0)),
            Op::Dup,
            Op::Pop,
            Op::Ldloc(LocalSlot(0)),
            Op::Callvirt(pet_provide.clone()),
            Op::Callvirt(setter(&config, "Demo.Zoo", "Keeper")),
            // Content: provided value goes through Add
            Op::Callvirt(getter(&config, "Demo.Zoo", "Animals")),
            Op::Newobj(ctor(&config, "Demo.PetExtension", 0)),
            Op::Dup,
            Op::Pop,
            Op::Ldloc(LocalSlot(0)),
            Op::Callvirt(pet_provide),
            Op::Callvirt(
                ty(&config, "Demo.AnimalList")
                    .find_method(|m| m.name() == "Add" && m.parameters() == [ty(&config, "Demo.Animal")])
                    .expect("Add(Animal)")
            ),
            Op::Ret,
        ]
    );
}

#[test]
fn test_object_initialization() {
    for (backend, config) in configs() {
        let body = populate_body(&config, obj("Panel", vec![obj("Animal", vec![])]));
        let support = ty(&config, "System.ComponentModel.ISupportInitialize");
        let begin = support.find_method(|m| m.name() == "BeginInit").expect("BeginInit");
        let end = support.find_method(|m| m.name() == "EndInit").expect("EndInit");
        assert_eq!(
            body,
            vec![
                Op::Dup,
                Op::Callvirt(begin),
                Op::Dup,
                Op::Newobj(ctor(&config, "Demo.Animal", 0)),
                Op::Dup,
                Op::Pop,
                Op::Callvirt(setter(&config, "Demo.Panel", "Child")),
                Op::Callvirt(end),
                Op::Ret,
            ],
            "{}",
            backend
        );
    }
}

#[test]
fn test_top_down_initialization() {
    let config = loaded_config();
    let builder = build(
        &config,
        obj(
            "Zoo",
            vec![prop(
                "Zoo",
                "Window",
                vec![obj("Window", vec![prop("Window", "Title", vec![text("Main")])])],
            )],
        ),
    );

    let populate = builder.procedure("Populate").expect("populate");
    assert_eq!(
        populate.locals,
        vec![ty(&config, "Demo.XamlContext"), ty(&config, "Demo.Window")]
    );
    let body = populate.ops[prologue(&config).len()..].to_vec();
    assert_eq!(
        body,
        vec![
            Op::Dup,
            Op::Newobj(ctor(&config, "Demo.Window", 0)),
            Op::Dup,
            Op::Stloc(LocalSlot(1)),
            Op::Callvirt(setter(&config, "Demo.Zoo", "Window")),
            Op::Pop,
            Op::Ldloc(LocalSlot(1)),
            Op::Ldstr("Main".to_string()),
            Op::Callvirt(setter(&config, "Demo.Window", "Title")),
            Op::Ret,
        ]
    );
}

// ============================================================================
// Locals
// ============================================================================

#[test]
fn test_pooled_local_reuse() {
    let config = loaded_config();
    let runtime = runtime(&config);
    let emitters = default_emitters();
    let mut ctx = xaml_compiler::EmitContext::new(&config, &runtime, &emitters);
    let wk = config.well_known_types();
    let mut codegen = procedure(0);

    let first = ctx.get_local(&mut codegen, &wk.int32);
    let slot = first.slot();
    drop(first);

    let again = ctx.get_local(&mut codegen, &wk.int32);
    assert_eq!(again.slot(), slot);
    let busy = ctx.get_local(&mut codegen, &wk.int32);
    assert_ne!(busy.slot(), slot);
    let text = ctx.get_local(&mut codegen, &wk.string);
    assert_ne!(text.slot(), slot);
    assert_ne!(text.slot(), busy.slot());
    drop((again, busy, text));

    // Returned slots belong to procedure 0 only
    let mut other = procedure(1);
    let elsewhere = ctx.get_local(&mut other, &wk.int32);
    assert_eq!(elsewhere.slot(), LocalSlot(0));
    assert_eq!(other.locals, vec![wk.int32.clone()]);

    assert_eq!(
        codegen.locals,
        vec![wk.int32.clone(), wk.int32.clone(), wk.string.clone()]
    );
}

#[test]
fn test_nullable_unwrap_uses_pooled_local() {
    let config = loaded_config();
    let runtime = runtime(&config);
    let emitters = default_emitters();
    let mut ctx = xaml_compiler::EmitContext::new(&config, &runtime, &emitters);
    let wk = config.well_known_types();
    let mut codegen = procedure(0);

    let nullable = wk
        .nullable
        .make_generic_type(&[wk.int32.clone()])
        .expect("Nullable<Int32>");
    let value = nullable
        .find_property("Value")
        .and_then(|p| p.getter())
        .expect("Value getter");
    let node = XamlNode::CompilerLocal {
        line: line(1),
        local: LocalId(0),
        ty: nullable.clone(),
    };

    for _ in 0..2 {
        ctx.emit_convert(&node, &nullable, &wk.int32, &mut codegen)
            .expect("unwrap");
    }
    assert_eq!(
        codegen.ops,
        vec![
            Op::Stloc(LocalSlot(0)),
            Op::Ldloca(LocalSlot(0)),
            Op::Call(value.clone()),
            Op::Stloc(LocalSlot(0)),
            Op::Ldloca(LocalSlot(0)),
            Op::Call(value),
        ]
    );
    assert_eq!(codegen.locals, vec![nullable]);
}

#[test]
fn test_compiler_locals() {
    let config = loaded_config();
    let runtime = runtime(&config);
    let emitters = default_emitters();
    let mut ctx = xaml_compiler::EmitContext::new(&config, &runtime, &emitters);
    let animal = ty(&config, "Demo.Animal");
    let mut first = procedure(0);
    let mut second = procedure(1);

    let read = XamlNode::CompilerLocal {
        line: line(4),
        local: LocalId(1),
        ty: animal.clone(),
    };
    let error = ctx
        .emit(&read, &mut first, Some(&animal))
        .expect_err("read before write");
    assert!(matches!(error, XamlLoadError::UninitializedLocal { .. }));
    assert_eq!(error.node().line, line(4));

    let init = XamlNode::LocalInitialization {
        line: line(3),
        local: LocalId(1),
        value: Box::new(new_object(&config, "Demo.Animal")),
    };
    ctx.emit(&init, &mut first, Some(&animal)).expect("init");
    ctx.emit(&read, &mut first, Some(&animal)).expect("read");
    assert_eq!(
        first.ops,
        vec![
            Op::Newobj(ctor(&config, "Demo.Animal", 0)),
            Op::Dup,
            Op::Stloc(LocalSlot(0)),
            Op::Ldloc(LocalSlot(0)),
        ]
    );

    let error = ctx
        .emit(&read, &mut second, Some(&animal))
        .expect_err("local belongs to the first procedure");
    assert!(matches!(error, XamlLoadError::LocalProcedureMismatch { .. }));
}

// ============================================================================
// Emission errors
// ============================================================================

#[test]
fn test_downcast_is_error() {
    for (backend, config) in configs() {
        let runtime = runtime(&config);
        let emitters = default_emitters();
        let mut ctx = xaml_compiler::EmitContext::new(&config, &runtime, &emitters);
        let mut codegen = procedure(0);

        let error = ctx
            .emit(
                &new_object(&config, "Demo.Animal"),
                &mut codegen,
                Some(&ty(&config, "Demo.Dog")),
            )
            .expect_err("Animal is not a Dog");
        assert_eq!(
            error,
            XamlLoadError::NoConversion {
                node: new_object(&config, "Demo.Animal").info(),
                from: "Demo.Animal".to_string(),
                to: "Demo.Dog".to_string(),
            },
            "{}",
            backend
        );
        let message = error.to_string();
        assert!(message.contains("Demo.Animal") && message.contains("Demo.Dog"));
    }
}

#[test]
fn test_void_mismatch() {
    let config = loaded_config();
    let runtime = runtime(&config);
    let emitters = default_emitters();
    let mut ctx = xaml_compiler::EmitContext::new(&config, &runtime, &emitters);
    let mut codegen = procedure(0);
    let object = config.well_known_types().object.clone();

    let group = XamlNode::ManipulationGroup {
        line: line(2),
        children: Vec::new(),
    };
    let error = ctx
        .emit(&group, &mut codegen, Some(&object))
        .expect_err("group leaves nothing");
    assert_eq!(
        error.to_string(),
        "Emit of ManipulationGroup at 2:1 resulted in void while caller expected System.Object"
    );

    let constant = XamlNode::Constant {
        line: line(2),
        ty: config.well_known_types().int32.clone(),
        value: ConstantValue::I32(1),
    };
    let error = ctx
        .emit(&constant, &mut codegen, None)
        .expect_err("constant leaves a value");
    assert!(matches!(
        error,
        XamlLoadError::TypeMismatch { ref expected, .. } if expected == "void"
    ));
}

#[test]
fn test_unhandled_and_unresolved_nodes() {
    let config = loaded_config();
    let runtime = runtime(&config);
    let emitters = default_emitters();
    let mut ctx = xaml_compiler::EmitContext::new(&config, &runtime, &emitters);
    let mut codegen = procedure(0);
    let object = config.well_known_types().object.clone();

    let property = prop("Animal", "Name", vec![text("Rex")]);
    let error = ctx.emit(&property, &mut codegen, None).expect_err("raw property");
    assert!(matches!(error, XamlLoadError::NoEmitter { node } if node.kind == "PropertyValue"));

    let raw = obj("Giraffe", vec![]);
    let error = ctx.emit(&raw, &mut codegen, Some(&object)).expect_err("raw object");
    assert!(matches!(
        error,
        XamlLoadError::UnresolvedType { ref name, .. } if name == &format!("{{{}}}Giraffe", ZOO_NS)
    ));

    let raw_text = XamlNode::Text {
        line: line(1),
        ty: XamlTypeReference::Xml(XmlTypeReference::new(ZOO_NS, "Label")),
        text: "hi".to_string(),
    };
    let error = ctx.emit(&raw_text, &mut codegen, Some(&object)).expect_err("raw text");
    assert!(matches!(error, XamlLoadError::Emit { .. }));

    let named = XamlNode::PropertyValue {
        line: line(1),
        property: PropertyReference::Named {
            declaring: XamlTypeReference::Clr(ty(&config, "Demo.Animal")),
            name: "Color".to_string(),
        },
        values: Vec::new(),
    };
    assert!(matches!(
        ctx.emit(&named, &mut codegen, None),
        Err(XamlLoadError::NoEmitter { .. })
    ));
}

#[test]
fn test_provide_value_needs_context() {
    let config = loaded_config();
    let compiler = compiler(&config);
    let root = compiler
        .transform(
            document(obj("Zoo", vec![prop("Zoo", "Keeper", vec![obj("PetExtension", vec![])])])),
            true,
        )
        .expect("transform")
        .document
        .root;
    let XamlNode::ValueWithManipulations { manipulation, .. } = &root else {
        panic!("root not constructed");
    };

    let runtime = runtime(&config);
    let mut ctx = xaml_compiler::EmitContext::new(&config, &runtime, &compiler.emitters);
    let mut codegen = procedure(0);
    let error = ctx
        .emit(manipulation, &mut codegen, None)
        .expect_err("no context local");
    assert!(error.to_string().contains("runtime context"), "{}", error);
}

#[test]
fn test_invalid_root() {
    let config = loaded_config();
    let compiler = compiler(&config);
    let mut builder = RecordingTypeBuilder::new("Generated", "Generated.Builder");

    let error = compiler
        .compile(&text("loose"), &mut builder, &runtime(&config), "Populate", "Build")
        .expect_err("text root");
    assert!(matches!(error, XamlLoadError::InvalidRoot { .. }));

    // A non-strict transform that could not resolve the root
    let outcome = compiler
        .transform(document(obj("Giraffe", vec![])), false)
        .expect("non-strict");
    let error = compiler
        .compile(&outcome.document.root, &mut builder, &runtime(&config), "Populate", "Build")
        .expect_err("unresolved root");
    assert!(matches!(error, XamlLoadError::InvalidRoot { .. }));
    assert!(builder.procedures().is_empty());
}

#[test]
fn test_compiler_without_defaults() {
    let config = loaded_config();
    let compiler = xaml_compiler::XamlCompiler::new(config.clone(), false);
    assert!(compiler.transformers.is_empty());
    assert!(compiler.emitters.is_empty());

    let root = obj("Animal", vec![]);
    let outcome = compiler
        .transform(document(root.clone()), true)
        .expect("nothing to do");
    assert_eq!(outcome.document.root, root);
}

#[test]
fn test_generated_method_handle_matches_signature() {
    let config = loaded_config();
    let builder = build(&config, obj("Animal", vec![]));
    let populate = builder
        .method(builder.procedure("Populate").expect("populate").id)
        .expect("handle");
    assert_eq!(populate.name(), "Populate");
    assert!(populate.is_static());
    assert_eq!(populate.return_type(), None::<XType>);
    assert_eq!(populate.parameters().len(), 2);
}
