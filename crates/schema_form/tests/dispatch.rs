mod common;

use common::Script;
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use schema_form::{
    input, BuildContext, Dispatcher, EditorSpec, EnumType, FieldSchema, Form, FormDriver,
    FormError, MemoryToolkit, RecordType, Result, Scalar, SchemaDocument, Toolkit, TypeDescriptor,
    TypeExpr, TypeNamespace, TypeTag, Value,
};
use schema_form::Binding;
use serde_json::json;

fn ty(annotation: &str) -> TypeExpr {
    annotation.parse().unwrap()
}

#[test]
fn every_tag_round_trips_to_its_shape() {
    let mut ns = TypeNamespace::new();
    ns.define_enum(EnumType::from_names("Color", ["red", "green"]));
    ns.define_record(RecordType::new(
        "Point",
        vec![FieldSchema::new("x", ty("float"))],
    ));
    let dispatcher = Dispatcher::new(ns);

    let cases: Vec<(&str, TypeTag, Value)> = vec![
        ("int", TypeTag::Int, Value::Int(0)),
        ("float", TypeTag::Float, Value::Float(0.0)),
        ("Decimal", TypeTag::Decimal, Value::Float(0.0)),
        ("str", TypeTag::Str, Value::from("")),
        ("bool", TypeTag::Bool, Value::Bool(false)),
        ("date", TypeTag::Date, Value::Date(chrono::NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())),
        ("time", TypeTag::Time, Value::Time(chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap())),
        (
            "datetime",
            TypeTag::DateTime,
            Value::DateTime(
                chrono::NaiveDate::from_ymd_opt(2000, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            ),
        ),
        ("None", TypeTag::Null, Value::Null),
        ("Color", TypeTag::Enum, Value::from("red")),
        ("Literal['x', 2]", TypeTag::Literal, Value::from("x")),
        ("list[int]", TypeTag::List, Value::List(vec![])),
        ("dict[str, int]", TypeTag::Mapping, Value::Map(IndexMap::new())),
        ("int | str", TypeTag::Union, Value::Int(0)),
        (
            "Point",
            TypeTag::Record,
            Value::Record([("x".to_string(), Value::Float(0.0))].into_iter().collect()),
        ),
    ];

    for (annotation, tag, expected) in cases {
        let expr = ty(annotation);
        let (_, descriptor) = dispatcher.dispatch(&expr).unwrap();
        assert_eq!(descriptor.tag(), tag, "{annotation}");
        let mut tk = MemoryToolkit::new();
        let binding = dispatcher
            .build(&mut tk, &FieldSchema::new("f", expr))
            .unwrap();
        assert_eq!(binding.extract(&tk), expected, "{annotation}");
    }
}

#[test]
fn untouched_record_yields_zero_values() {
    let mut ns = TypeNamespace::new();
    ns.define_record(RecordType::new(
        "Person",
        vec![
            FieldSchema::new("name", ty("str")),
            FieldSchema::new("age", ty("int")),
        ],
    ));
    let outcome = FormDriver::new(Dispatcher::new(ns))
        .run(MemoryToolkit::new(), "Person", &mut Script::new().confirm())
        .unwrap();
    let expected: IndexMap<String, Value> = [
        ("name".to_string(), Value::from("")),
        ("age".to_string(), Value::Int(0)),
    ]
    .into_iter()
    .collect();
    assert_eq!(outcome.into_values(), expected);
}

#[test]
fn extraction_is_idempotent() {
    let mut ns = TypeNamespace::new();
    ns.define_record(RecordType::new(
        "Everything",
        vec![
            FieldSchema::new("tags", ty("list[str]"))
                .default_value(Value::List(vec!["a".into(), "b".into()])),
            FieldSchema::new("scores", ty("dict[str, float]")),
            FieldSchema::new("pick", ty("Optional[Literal['x', 'y']]")),
            FieldSchema::new("when", ty("datetime")).default_value("2024-05-01T12:30:00"),
        ],
    ));
    let form = Form::build(&Dispatcher::new(ns), MemoryToolkit::new(), "Everything").unwrap();
    let first = form.extract();
    let second = form.extract();
    assert_eq!(first, second);
    assert_eq!(
        first.field("when").map(ToString::to_string),
        Some("2024-05-01T12:30:00".to_string())
    );
}

#[test]
fn unsupported_type_deep_in_a_container_leaves_no_nodes() {
    let mut ns = TypeNamespace::new();
    ns.define_record(RecordType::new(
        "Inner",
        vec![
            FieldSchema::new("ok", ty("int")),
            FieldSchema::new("bad", ty("dict[str, set[int]]")),
        ],
    ));
    ns.define_record(RecordType::new(
        "Outer",
        vec![
            FieldSchema::new("before", ty("list[str]")),
            FieldSchema::new("inner", ty("Optional[Inner]")),
        ],
    ));
    let mut tk = MemoryToolkit::new();
    let err = Dispatcher::new(ns).build_root(&mut tk, "Outer").unwrap_err();
    match err {
        FormError::UnsupportedType { ty, path } => {
            assert_eq!(ty, "set[int]");
            assert_eq!(path, "Outer.inner.Inner.bad.value");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(tk.live_nodes(), 0);
}

#[test]
fn raw_container_without_item_type_is_unsupported() {
    let mut tk = MemoryToolkit::new();
    let err = Dispatcher::default()
        .build(&mut tk, &FieldSchema::new("xs", ty("list")))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "handler for type `list` at `xs` is not implemented"
    );
    assert_eq!(tk.live_nodes(), 0);
}

#[test]
fn mutually_recursive_records_are_rejected() {
    let mut ns = TypeNamespace::new();
    ns.define_record(RecordType::new("A", vec![FieldSchema::new("b", ty("list[B]"))]));
    ns.define_record(RecordType::new("B", vec![FieldSchema::new("a", ty("A"))]));
    let mut tk = MemoryToolkit::new();
    let err = Dispatcher::new(ns).build_root(&mut tk, "A").unwrap_err();
    assert!(matches!(err, FormError::RecursiveRecord { ref name, .. } if name == "A"));
    assert_eq!(tk.live_nodes(), 0);
}

fn shouting(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    _ty: TypeDescriptor,
) -> Result<Binding> {
    let value = field.default.as_ref().map(ToString::to_string).unwrap_or_default();
    let node = ctx.toolkit().create_editor(EditorSpec::Text { value });
    Ok(Binding::custom(node, move |tk: &dyn Toolkit| match tk.read(node) {
        Some(Scalar::Text(s)) => Value::Str(s.to_uppercase()),
        _ => Value::Null,
    }))
}

#[test]
fn custom_handlers_replace_builtin_ones() {
    let mut ns = TypeNamespace::new();
    ns.define_record(RecordType::new(
        "Greeting",
        vec![FieldSchema::new("text", ty("str")).default_value("hello")],
    ));
    let mut dispatcher = Dispatcher::new(ns);
    dispatcher.registry_mut().register(TypeTag::Str, shouting);
    let form = Form::build(&dispatcher, MemoryToolkit::new(), "Greeting").unwrap();
    assert_eq!(form.extract().field("text"), Some(&Value::from("HELLO")));
}

#[test]
fn document_to_json_end_to_end() {
    let doc = SchemaDocument::from_json(
        &json!({
            "root": "Order",
            "types": {
                "Order": { "kind": "record", "fields": [
                    { "name": "id", "type": "int", "default": 7, "min": 1 },
                    { "name": "size", "type": "Size", "default": "L" },
                    { "name": "notes", "type": "Optional[str]", "default": null },
                    { "name": "extras", "type": "dict[str, int]", "default": { "cheese": 2 } }
                ] },
                "Size": { "kind": "enum", "members": [
                    { "name": "S", "value": "small" },
                    { "name": "L", "value": "large" }
                ] }
            }
        })
        .to_string(),
    )
    .unwrap();
    let values = input(
        doc.namespace().clone(),
        doc.root(),
        MemoryToolkit::new(),
        &mut Script::new().confirm(),
    )
    .unwrap();
    let json = serde_json::to_value(&values).unwrap();
    assert_eq!(
        json,
        json!({ "id": 7, "size": "large", "notes": null, "extras": { "cheese": 2 } })
    );
}

#[test]
fn cancel_through_input_is_empty() {
    let mut ns = TypeNamespace::new();
    ns.define_record(RecordType::new("R", vec![FieldSchema::new("n", ty("int"))]));
    let values = input(ns, "R", MemoryToolkit::new(), &mut Script::new().cancel()).unwrap();
    assert!(values.is_empty());
}
