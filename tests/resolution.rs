//! End-to-end resolution tests over a registered object model.

use std::sync::Arc;

use xamlscope::host::{
    EnumWidth, HostTypeBuilder, HostTypeRc, HostUniverse, Value,
};
use xamlscope::schema::{
    CollectionKind, MetadataProvider, SchemaDiagnostic, SchemaOptions, XamlSchemaContext,
};
use xamlscope::Error;

fn provider_over(universe: &Arc<HostUniverse>) -> MetadataProvider {
    MetadataProvider::new(&XamlSchemaContext::new(universe))
}

#[test]
fn boolean_end_to_end() {
    let universe = HostUniverse::new();
    let provider = provider_over(&universe);

    let boolean = provider.resolve_name("Boolean").unwrap().unwrap();
    assert_eq!(boolean.full_name(), "Boolean");
    assert!(boolean.is_constructible());
    assert!(!boolean.is_collection());
    assert_eq!(
        boolean.create_from_string("true").unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn resolution_identity_per_handle() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let widget = HostTypeBuilder::new(&universe, &assembly, "App", "Widget").register();
    let provider = provider_over(&universe);

    let first = provider.resolve(widget.handle).unwrap();
    let second = provider.resolve(widget.handle).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let by_name = provider.resolve_name("App.Widget").unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &by_name));
}

#[test]
fn attachable_pair_discovery() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let target = HostTypeBuilder::new(&universe, &assembly, "App", "Target").register();
    let int32 = assembly_type(&universe, "System.Int32");
    let _owner = HostTypeBuilder::new(&universe, &assembly, "App", "Grid")
        .static_method("SetFoo", &[&target, &int32], None, None)
        .static_method("GetFoo", &[&target], Some(&int32), None)
        .register();

    let provider = provider_over(&universe);
    let grid = provider.resolve_name("App.Grid").unwrap().unwrap();
    let foo = grid.get_member("Foo").unwrap();

    assert!(foo.is_attachable());
    assert!(!foo.is_read_only());
    assert_eq!(foo.value_type().full_name(), "Int32");
    assert_eq!(foo.target_type().unwrap().full_name(), "App.Target");
}

#[test]
fn readonly_attachable_rejects_writes() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let target = HostTypeBuilder::new(&universe, &assembly, "App", "Target")
        .default_ctor()
        .register();
    let _owner = HostTypeBuilder::new(&universe, &assembly, "App", "Panel")
        .attached_readonly("Slot", &target, &universe.core().string)
        .register();

    let provider = provider_over(&universe);
    let panel = provider.resolve_name("App.Panel").unwrap().unwrap();
    let slot = panel.get_member("Slot").unwrap();
    assert!(slot.is_attachable());
    assert!(slot.is_read_only());

    let target_descriptor = provider.resolve(target.handle).unwrap();
    let instance = target_descriptor.activate().unwrap();
    assert_eq!(slot.get(&instance).unwrap(), Value::Null);
    assert!(matches!(
        slot.set(&instance, Value::String("x".into())),
        Err(Error::ReadOnlyMemberWrite { .. })
    ));
}

#[test]
fn attached_accessor_round_trip() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let target = HostTypeBuilder::new(&universe, &assembly, "App", "Child")
        .default_ctor()
        .register();
    let _owner = HostTypeBuilder::new(&universe, &assembly, "App", "Dock")
        .attached("Side", &target, &universe.core().string)
        .register();

    let provider = provider_over(&universe);
    let dock = provider.resolve_name("App.Dock").unwrap().unwrap();
    let side = dock.get_member("Side").unwrap();

    let child = provider.resolve(target.handle).unwrap().activate().unwrap();
    side.set(&child, Value::String("Left".into())).unwrap();
    assert_eq!(side.get(&child).unwrap(), Value::String("Left".into()));
}

#[test]
fn dependency_property_marker_is_orthogonal() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let _control = HostTypeBuilder::new(&universe, &assembly, "App", "Control")
        .property("Width", &assembly_type(&universe, "System.Double"))
        .dependency_property("Width")
        .property("Tag", &universe.core().string)
        .register();

    let provider = provider_over(&universe);
    let control = provider.resolve_name("App.Control").unwrap().unwrap();

    let width = control.get_member("Width").unwrap();
    assert!(width.is_dependency_property());
    assert!(!width.is_attachable());

    let tag = control.get_member("Tag").unwrap();
    assert!(!tag.is_dependency_property());
}

#[test]
fn plain_readonly_property() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let _row = HostTypeBuilder::new(&universe, &assembly, "App", "Row")
        .readonly_property("Count", &assembly_type(&universe, "System.Int32"))
        .default_ctor()
        .register();

    let provider = provider_over(&universe);
    let row = provider.resolve_name("App.Row").unwrap().unwrap();
    let count = row.get_member("Count").unwrap();
    assert!(count.is_read_only());
    assert!(!count.is_attachable());

    let instance = row.activate().unwrap();
    assert!(matches!(
        count.set(&instance, Value::I4(3)),
        Err(Error::ReadOnlyMemberWrite { .. })
    ));
}

#[test]
fn member_misses_are_silent_and_cached() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let _shape = HostTypeBuilder::new(&universe, &assembly, "App", "Shape").register();

    let provider = provider_over(&universe);
    let shape = provider.resolve_name("App.Shape").unwrap().unwrap();
    assert!(shape.get_member("NoSuch").is_none());
    assert!(shape.get_member("NoSuch").is_none());
    assert!(!shape.has_member("NoSuch"));
}

#[test]
fn enum_flag_parsing_signed() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let _flags = HostTypeBuilder::new(&universe, &assembly, "App", "Anchor")
        .enumeration(EnumWidth::I4, &[("A", 1), ("B", 2), ("C", 4)])
        .register();

    let provider = provider_over(&universe);
    let anchor = provider.resolve_name("App.Anchor").unwrap().unwrap();
    assert!(anchor.is_enum());
    assert_eq!(
        anchor.enum_names().unwrap(),
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    );
    assert_eq!(
        anchor.create_from_string("A, C").unwrap(),
        Value::I4(5)
    );
    assert_eq!(anchor.create_from_string("B").unwrap(), Value::I4(2));
    assert!(matches!(
        anchor.create_from_string("A, Nope"),
        Err(Error::NoStringConversion { .. })
    ));
}

#[test]
fn enum_flag_parsing_unsigned_and_unknown_width() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let _wide = HostTypeBuilder::new(&universe, &assembly, "App", "Wide")
        .enumeration(EnumWidth::U8, &[("All", -1)])
        .register();
    let _loose = HostTypeBuilder::new(&universe, &assembly, "App", "Loose")
        .enumeration_unknown_width(&[("On", 1)])
        .register();

    let provider = provider_over(&universe);
    let wide = provider.resolve_name("App.Wide").unwrap().unwrap();
    assert_eq!(
        wide.create_from_string("All").unwrap(),
        Value::U8(u64::MAX)
    );

    // Unknown underlying width falls back to 32-bit signed.
    let loose = provider.resolve_name("App.Loose").unwrap().unwrap();
    assert_eq!(loose.create_from_string("On").unwrap(), Value::I4(1));
}

#[test]
fn boxing_round_trip() {
    let universe = HostUniverse::new();
    let provider = provider_over(&universe);

    let wrapper = provider
        .resolve_name("System.Nullable<Boolean>")
        .unwrap()
        .unwrap();
    assert_eq!(wrapper.full_name(), "System.Nullable<Boolean>");

    let inner = wrapper.boxed_type().unwrap();
    assert_eq!(inner.full_name(), "Boolean");

    let boxed = wrapper.create_from_string("true").unwrap();
    let direct = inner.create_from_string("true").unwrap();
    assert_eq!(boxed, direct);

    // A non-wrapper type has no boxed type.
    assert!(inner.boxed_type().is_none());
}

#[test]
fn create_from_string_without_parse_path_fails() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let _blank = HostTypeBuilder::new(&universe, &assembly, "App", "Blank").register();

    let provider = provider_over(&universe);
    let blank = provider.resolve_name("App.Blank").unwrap().unwrap();
    assert!(matches!(
        blank.create_from_string("anything"),
        Err(Error::NoStringConversion { .. })
    ));
}

#[test]
fn create_from_string_through_named_method() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let core_string = universe.core().string.clone();

    let brush = HostTypeBuilder::new(&universe, &assembly, "App", "Brush")
        .create_from_string("FromText")
        .register();
    let brush_for_body = brush.clone();
    brush
        .methods
        .push(Arc::new(xamlscope::host::HostMethod {
            name: "FromText".to_string(),
            is_static: true,
            is_public: true,
            params: vec![core_string.clone()],
            return_type: Some(brush_for_body.clone()),
            body: Some(Arc::new(|args| {
                Ok(Value::String(format!(
                    "brush:{}",
                    args.first().and_then(Value::as_str).unwrap_or_default()
                )))
            })),
        }));

    let provider = provider_over(&universe);
    let descriptor = provider.resolve_name("App.Brush").unwrap().unwrap();
    assert_eq!(
        descriptor.create_from_string("red").unwrap(),
        Value::String("brush:red".to_string())
    );
}

#[test]
fn create_from_string_through_nested_class_method() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let core_string = universe.core().string.clone();

    let outer = HostTypeBuilder::new(&universe, &assembly, "App", "Colors").register();
    let inner = HostTypeBuilder::new(&universe, &assembly, "App", "Parser")
        .register_nested(&outer);
    inner.methods.push(Arc::new(xamlscope::host::HostMethod {
        name: "Parse".to_string(),
        is_static: true,
        is_public: true,
        params: vec![core_string],
        return_type: Some(outer.clone()),
        body: Some(Arc::new(|args| {
            Ok(Value::String(format!(
                "color:{}",
                args.first().and_then(Value::as_str).unwrap_or_default()
            )))
        })),
    }));

    let _swatch = HostTypeBuilder::new(&universe, &assembly, "App", "Swatch")
        .create_from_string("App.Colors+Parser.Parse")
        .register();

    let provider = provider_over(&universe);
    let swatch = provider.resolve_name("App.Swatch").unwrap().unwrap();
    assert_eq!(
        swatch.create_from_string("teal").unwrap(),
        Value::String("color:teal".to_string())
    );
}

#[test]
fn collection_classification_and_add() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let int32 = assembly_type(&universe, "System.Int32");
    let _numbers = HostTypeBuilder::new(&universe, &assembly, "App", "Numbers")
        .collection_of(&int32)
        .register();

    let provider = provider_over(&universe);
    let numbers = provider.resolve_name("App.Numbers").unwrap().unwrap();
    assert_eq!(numbers.collection_kind(), CollectionKind::Collection);
    assert_eq!(numbers.item_type().unwrap().full_name(), "Int32");
    assert_eq!(numbers.add_method_name(), Some("Add"));

    let instance = numbers.activate().unwrap();
    numbers.add_item(&instance, Value::I4(7)).unwrap();
    numbers.add_item(&instance, Value::I4(9)).unwrap();
    let stored = instance.as_instance().unwrap();
    assert_eq!(
        stored.items.lock().unwrap().as_slice(),
        &[Value::I4(7), Value::I4(9)]
    );

    assert!(matches!(
        numbers.add_entry(&instance, Value::I4(0), Value::I4(0)),
        Err(Error::NotADictionary(_))
    ));
}

#[test]
fn dictionary_classification_and_add() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let core = universe.core();
    let _table = HostTypeBuilder::new(&universe, &assembly, "App", "Table")
        .dictionary_of(&core.string, &assembly_type(&universe, "System.Int32"))
        .register();

    let provider = provider_over(&universe);
    let table = provider.resolve_name("App.Table").unwrap().unwrap();
    assert_eq!(table.collection_kind(), CollectionKind::Dictionary);
    assert_eq!(table.key_type().unwrap().full_name(), "String");
    assert_eq!(table.item_type().unwrap().full_name(), "Int32");

    let instance = table.activate().unwrap();
    table
        .add_entry(&instance, Value::String("a".into()), Value::I4(1))
        .unwrap();
    assert!(matches!(
        table.add_item(&instance, Value::I4(1)),
        Err(Error::NotACollection(_))
    ));
}

#[test]
fn dictionary_wins_over_collection_heuristic() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let core = universe.core();
    let object = core.object.clone();
    let ienumerable = core.ienumerable.clone();

    // Both a 1-arity and a 2-arity Add are discoverable; no well-known interface
    // names the shape, so classification goes through the heuristic.
    let bag = HostTypeBuilder::new(&universe, &assembly, "App", "Bag")
        .implements(&ienumerable)
        .default_ctor()
        .register();
    for params in [vec![object.clone()], vec![object.clone(), object.clone()]] {
        bag.methods.push(Arc::new(xamlscope::host::HostMethod {
            name: "Add".to_string(),
            is_static: false,
            is_public: true,
            params,
            return_type: None,
            body: None,
        }));
    }

    let provider = provider_over(&universe);
    let descriptor = provider.resolve_name("App.Bag").unwrap().unwrap();
    assert_eq!(descriptor.collection_kind(), CollectionKind::Dictionary);
}

#[test]
fn ambiguous_add_records_a_diagnostic() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let core = universe.core();
    let object = core.object.clone();
    let string = core.string.clone();

    let pile = HostTypeBuilder::new(&universe, &assembly, "App", "Pile")
        .implements(&core.ienumerable)
        .register();
    for param in [object, string] {
        pile.methods.push(Arc::new(xamlscope::host::HostMethod {
            name: "Add".to_string(),
            is_static: false,
            is_public: true,
            params: vec![param],
            return_type: None,
            body: None,
        }));
    }

    let context = XamlSchemaContext::new(&universe);
    let provider = MetadataProvider::new(&context);
    let _ = provider.resolve_name("App.Pile").unwrap().unwrap();
    assert!(context.diagnostics().iter().any(|diagnostic| matches!(
        diagnostic,
        SchemaDiagnostic::AmbiguousCollectionAdd { type_name, arity: 1, .. }
            if type_name == "App.Pile"
    )));
}

#[test]
fn array_classification() {
    let universe = HostUniverse::new();
    let array = universe.make_array(&universe.core().string);

    let provider = provider_over(&universe);
    let descriptor = provider.resolve(array.handle).unwrap();
    assert_eq!(descriptor.collection_kind(), CollectionKind::Array);
    assert_eq!(descriptor.full_name(), "String[]");
    assert_eq!(descriptor.item_type().unwrap().full_name(), "String");
}

#[test]
fn base_type_substitutes_interop_sentinels() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let sentinel = HostTypeBuilder::new(&universe, &assembly, "System", "__ComObject").register();
    let _proxy = HostTypeBuilder::new(&universe, &assembly, "App", "Proxy")
        .base(&sentinel)
        .register();

    let provider = provider_over(&universe);
    let proxy = provider.resolve_name("App.Proxy").unwrap().unwrap();
    assert_eq!(proxy.base_type().unwrap().full_name(), "Object");

    let object = provider.resolve_name("Object").unwrap().unwrap();
    assert!(object.base_type().is_none());
}

#[test]
fn markup_extension_and_bindable_classification() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let markup_extension = universe.core().markup_extension.clone();
    let _extension = HostTypeBuilder::new(&universe, &assembly, "App", "StaticResource")
        .base(&markup_extension)
        .register();
    let _model = HostTypeBuilder::new(&universe, &assembly, "App", "Model")
        .bindable()
        .register();

    let provider = provider_over(&universe);
    let extension = provider.resolve_name("App.StaticResource").unwrap().unwrap();
    assert!(extension.is_markup_extension());
    assert!(!extension.is_bindable());

    let model = provider.resolve_name("App.Model").unwrap().unwrap();
    assert!(model.is_bindable());
    assert!(!model.is_markup_extension());
}

#[test]
fn content_property_resolves_through_member_lookup() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let _panel = HostTypeBuilder::new(&universe, &assembly, "App", "StackPanel")
        .content_property("Children")
        .property("Children", &universe.core().object)
        .register();

    let provider = provider_over(&universe);
    let panel = provider.resolve_name("App.StackPanel").unwrap().unwrap();
    let content = panel.content_property().unwrap();
    assert_eq!(content.name(), "Children");
}

#[test]
fn activation_contract() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let _fixed = HostTypeBuilder::new(&universe, &assembly, "App", "Fixed").register();

    let provider = provider_over(&universe);
    let fixed = provider.resolve_name("App.Fixed").unwrap().unwrap();
    assert!(!fixed.is_constructible());
    assert!(matches!(
        fixed.activate(),
        Err(Error::NotConstructible(_))
    ));
}

#[test]
fn deprecation_and_experimental_markers() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let _old = HostTypeBuilder::new(&universe, &assembly, "App", "Old")
        .deprecated("Use New instead", true)
        .register();
    let _trial = HostTypeBuilder::new(&universe, &assembly, "App", "Trial")
        .experimental()
        .register();

    let provider = provider_over(&universe);
    let old = provider.resolve_name("App.Old").unwrap().unwrap();
    assert!(old.is_deprecated());
    assert!(old.is_hard_deprecated());
    assert_eq!(old.deprecation().unwrap().message, "Use New instead");

    let trial = provider.resolve_name("App.Trial").unwrap().unwrap();
    assert!(trial.is_experimental());
    assert!(!trial.is_deprecated());
}

#[test]
fn attachable_enumeration() {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    let target = HostTypeBuilder::new(&universe, &assembly, "App", "Element").register();
    let _canvas = HostTypeBuilder::new(&universe, &assembly, "App", "Canvas")
        .attached("Left", &target, &assembly_type(&universe, "System.Double"))
        .attached("Top", &target, &assembly_type(&universe, "System.Double"))
        .attached_readonly("Depth", &target, &assembly_type(&universe, "System.Int32"))
        .register();

    let provider = provider_over(&universe);
    let canvas = provider.resolve_name("App.Canvas").unwrap().unwrap();
    let names: Vec<String> = canvas
        .attachable_members()
        .iter()
        .map(|member| member.name().to_string())
        .collect();
    assert_eq!(names, vec!["Left", "Top", "Depth"]);
}

#[test]
fn search_set_from_module_store() {
    let universe = HostUniverse::new();
    let plugins = universe.register_assembly("Plugin");
    let _gadget = HostTypeBuilder::new(&universe, &plugins, "Plugin", "Gadget").register();
    let hidden = universe.register_assembly("Hidden");
    let _secret = HostTypeBuilder::new(&universe, &hidden, "Hidden", "Secret").register();

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Plugin.winmd"), b"").unwrap();
    std::fs::write(dir.path().join("Readme.md"), b"").unwrap();

    let context = XamlSchemaContext::with_options(
        &universe,
        SchemaOptions {
            module_root: Some(dir.path().to_path_buf()),
        },
    );
    let provider = MetadataProvider::new(&context);

    // Types from enumerated modules resolve; assemblies without a module file on
    // disk are not in the search set.
    assert!(provider.resolve_name("Plugin.Gadget").unwrap().is_some());
    assert!(provider.resolve_name("Hidden.Secret").unwrap().is_none());
    assert!(provider.resolve_name("Boolean").unwrap().is_some());
}

fn assembly_type(universe: &Arc<HostUniverse>, full_name: &str) -> HostTypeRc {
    universe
        .assembly(xamlscope::host::CORE_ASSEMBLY)
        .unwrap()
        .get_type(full_name)
        .unwrap()
}
