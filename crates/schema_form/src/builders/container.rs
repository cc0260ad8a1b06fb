//! Composite editors.
//!
//! Every container builds its children first and only then creates its own
//! shell and attaches them. If a child fails, the children that were already
//! built are disposed and the error is returned, so the toolkit never holds a
//! half-built container.
//!
//! - list: one reused staging editor for the item type + committed entries
//! - mapping: reused key and value staging editors + committed pairs
//! - union: one eagerly built branch per alternative + a selector
//! - record: one child per field, in declaration order

use indexmap::IndexMap;
use tracing::warn;

use super::primitive;
use crate::binding::{Binding, BindingKind};
use crate::classify::TypeDescriptor;
use crate::dispatch::BuildContext;
use crate::entries::{ListEntries, MapEntries};
use crate::error::{FormError, Result};
use crate::schema::{FieldSchema, TypeExpr};
use crate::toolkit::{EditorSpec, ShellKind, Slot};
use crate::value::Value;

fn rollback(ctx: &mut BuildContext<'_>, built: Vec<Binding>) {
    for binding in built {
        binding.dispose(ctx.toolkit());
    }
}

fn wrong_descriptor(ctx: &BuildContext<'_>, field: &FieldSchema) -> FormError {
    FormError::UnsupportedType {
        ty: field.ty.to_string(),
        path: ctx.path(),
    }
}

/// Synthetic field for a staging editor. Numeric bounds carry over so a
/// `list[int]` with `min = 0` only stages non-negative items.
fn staging_field(name: &str, ty: TypeExpr, parent: &FieldSchema) -> FieldSchema {
    FieldSchema {
        min: parent.min,
        max: parent.max,
        ..FieldSchema::new(name, ty)
    }
}

/// Converts a seeded entry to the shape an editor of type `ty` extracts:
/// ints widen to floats, string keys parse into int or date keys, and
/// containers convert item by item. `None` when the value cannot take that
/// shape at all.
fn conform(ctx: &BuildContext<'_>, ty: &TypeExpr, value: &Value) -> Option<Value> {
    match ctx.classify(ty)? {
        TypeDescriptor::Primitive(kind) => primitive::coerce(kind, value),
        TypeDescriptor::Enum(ty) => {
            let index = ty.position_of(value)?;
            Some(ty.members[index].value.clone())
        }
        TypeDescriptor::Literal(values) => values
            .iter()
            .find(|v| *v == value)
            .or_else(|| {
                let text = value.as_str()?;
                values.iter().find(|v| v.to_string() == text)
            })
            .cloned(),
        TypeDescriptor::List(item) => match value {
            Value::List(items) => Some(Value::List(conform_items(ctx, &item, items))),
            _ => None,
        },
        TypeDescriptor::Mapping(key_ty, value_ty) => {
            let pairs = conform_pairs(ctx, &key_ty, &value_ty, value)?;
            Some(Value::Map(pairs.into_iter().collect()))
        }
        // Exact shapes win over conversions, so "5" stays a string in `int | str`.
        TypeDescriptor::Union(alternatives) => alternatives
            .iter()
            .filter(|alt| ctx.classify(alt).is_some_and(|desc| desc.accepts(value)))
            .chain(alternatives.iter())
            .find_map(|alt| conform(ctx, alt, value)),
        TypeDescriptor::Record(record) => {
            let Value::Record(given) = value else {
                return None;
            };
            let mut fields = IndexMap::with_capacity(record.fields.len());
            for child in &record.fields {
                let seeded = given.get(&child.name).or(child.default.as_ref())?;
                fields.insert(child.name.clone(), conform(ctx, &child.ty, seeded)?);
            }
            Some(Value::Record(fields))
        }
    }
}

fn conform_items(ctx: &BuildContext<'_>, item: &TypeExpr, items: &[Value]) -> Vec<Value> {
    items
        .iter()
        .filter_map(|v| {
            let converted = conform(ctx, item, v);
            if converted.is_none() {
                warn!(path = %ctx.path(), "default entry {} is not a valid {item}, dropped", v.render());
            }
            converted
        })
        .collect()
}

/// Pairs of a mapping default, which may also arrive as a record (a JSON
/// object). `None` when `value` is neither.
fn conform_pairs(
    ctx: &BuildContext<'_>,
    key_ty: &TypeExpr,
    value_ty: &TypeExpr,
    value: &Value,
) -> Option<Vec<(Value, Value)>> {
    let raw: Vec<(Value, &Value)> = match value {
        Value::Map(pairs) => pairs.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Record(pairs) => pairs.iter().map(|(k, v)| (Value::Str(k.clone()), v)).collect(),
        _ => return None,
    };
    let pairs = raw
        .into_iter()
        .filter_map(|(k, v)| {
            match (conform(ctx, key_ty, &k), conform(ctx, value_ty, v)) {
                (Some(k), Some(v)) => Some((k, v)),
                _ => {
                    warn!(
                        path = %ctx.path(),
                        "default entry {}: {} is not a valid {key_ty}: {value_ty}, dropped",
                        k.render(),
                        v.render()
                    );
                    None
                }
            }
        })
        .collect();
    Some(pairs)
}

pub fn build_list(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    ty: TypeDescriptor,
) -> Result<Binding> {
    let TypeDescriptor::List(item) = ty else {
        return Err(wrong_descriptor(ctx, field));
    };
    let staging = ctx.build_child("item", &staging_field("item", item.clone(), field))?;

    let entries = match &field.default {
        Some(Value::List(items)) => ListEntries::with_committed(conform_items(ctx, &item, items)),
        _ => ListEntries::new(),
    };

    let tk = ctx.toolkit();
    let shell = tk.create_shell(ShellKind::List);
    tk.attach(shell, staging.node(), Slot::Staging);
    tk.show_entries(shell, &entries.display());
    Ok(Binding::new(
        shell,
        BindingKind::List {
            staging: Box::new(staging),
            entries,
        },
    ))
}

pub fn build_mapping(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    ty: TypeDescriptor,
) -> Result<Binding> {
    let TypeDescriptor::Mapping(key_ty, value_ty) = ty else {
        return Err(wrong_descriptor(ctx, field));
    };
    let key = ctx.build_child("key", &FieldSchema::new("key", key_ty.clone()))?;
    let value = match ctx.build_child("value", &staging_field("value", value_ty.clone(), field)) {
        Ok(value) => value,
        Err(err) => {
            rollback(ctx, vec![key]);
            return Err(err);
        }
    };

    let mut entries = MapEntries::new();
    let seed = match &field.default {
        Some(default) => conform_pairs(ctx, &key_ty, &value_ty, default).unwrap_or_default(),
        None => Vec::new(),
    };
    for (k, v) in seed {
        entries.stage(k, v);
        if let Err(warning) = entries.commit() {
            warn!(path = %ctx.path(), "default entry dropped: {warning}");
        }
    }

    let tk = ctx.toolkit();
    let shell = tk.create_shell(ShellKind::Mapping);
    tk.attach(shell, key.node(), Slot::Key);
    tk.attach(shell, value.node(), Slot::Value);
    tk.show_entries(shell, &entries.display());
    Ok(Binding::new(
        shell,
        BindingKind::Mapping {
            key: Box::new(key),
            value: Box::new(value),
            entries,
        },
    ))
}

/// All branches are built up front, so an unsupported alternative fails the
/// form at build time, not when the user happens to select it.
pub fn build_union(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    ty: TypeDescriptor,
) -> Result<Binding> {
    let TypeDescriptor::Union(alternatives) = ty else {
        return Err(wrong_descriptor(ctx, field));
    };
    // A default goes to the first branch whose shape accepts it.
    let selected = field
        .default
        .as_ref()
        .and_then(|default| {
            alternatives.iter().position(|alt| {
                ctx.classify(alt)
                    .is_some_and(|desc| desc.accepts(default))
            })
        })
        .unwrap_or(0);

    let labels: Vec<String> = alternatives.iter().map(TypeExpr::label).collect();
    let mut branches = Vec::with_capacity(alternatives.len());
    for (index, (alt, label)) in alternatives.into_iter().zip(&labels).enumerate() {
        let mut branch_field = staging_field(label, alt, field);
        if index == selected {
            branch_field.default = field.default.clone();
        }
        match ctx.build_child(label, &branch_field) {
            Ok(branch) => branches.push(branch),
            Err(err) => {
                rollback(ctx, branches);
                return Err(err);
            }
        }
    }

    let tk = ctx.toolkit();
    let selector = tk.create_editor(EditorSpec::Choice {
        options: labels.clone(),
        selected,
    });
    let shell = tk.create_shell(ShellKind::Union);
    tk.attach(shell, selector, Slot::Selector);
    for (branch, label) in branches.iter().zip(labels) {
        tk.attach(shell, branch.node(), Slot::Branch(label));
    }
    tk.show_branch(shell, selected);
    Ok(Binding::new(shell, BindingKind::Union { selector, branches }))
}

/// The recursion anchor. The record's name stays on the lineage while its
/// fields are built, so a record reached again inside itself is rejected.
pub fn build_record(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    ty: TypeDescriptor,
) -> Result<Binding> {
    let TypeDescriptor::Record(record) = ty else {
        return Err(wrong_descriptor(ctx, field));
    };
    ctx.enter_record(&record.name)?;
    let mut built: Vec<(String, Binding)> = Vec::with_capacity(record.fields.len());
    let mut failure = None;
    for child in &record.fields {
        // A record default overrides the field's own default, key by key.
        let default = field
            .default
            .as_ref()
            .and_then(|d| d.field(&child.name))
            .cloned()
            .or_else(|| child.default.clone());
        let child_field = FieldSchema {
            default,
            ..child.clone()
        };
        match ctx.build_child(&child.name, &child_field) {
            Ok(binding) => built.push((child.name.clone(), binding)),
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }
    ctx.leave_record();
    if let Some(err) = failure {
        rollback(ctx, built.into_iter().map(|(_, b)| b).collect());
        return Err(err);
    }

    let tk = ctx.toolkit();
    let shell = tk.create_shell(ShellKind::Record);
    for (child, (name, binding)) in record.fields.iter().zip(&built) {
        tk.attach(shell, binding.node(), Slot::Field(name.clone()));
        if let Some(help) = &child.help {
            tk.describe(binding.node(), help);
        }
    }
    Ok(Binding::new(shell, BindingKind::Record { fields: built }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::memory::MemoryToolkit;
    use crate::schema::{PrimitiveKind, RecordType, TypeNamespace};
    use crate::toolkit::{Action, Scalar, Toolkit};
    use pretty_assertions::assert_eq;

    fn int() -> TypeExpr {
        TypeExpr::primitive(PrimitiveKind::Int)
    }

    fn string() -> TypeExpr {
        TypeExpr::primitive(PrimitiveKind::Str)
    }

    #[test]
    fn list_shell_hosts_only_the_staging_editor() {
        let mut tk = MemoryToolkit::new();
        let b = Dispatcher::default()
            .build(&mut tk, &FieldSchema::new("xs", TypeExpr::list(int())))
            .unwrap();
        let staging = tk.find_child(b.node(), &Slot::Staging).unwrap();
        assert_eq!(tk.children(b.node()), &[staging]);
        assert_eq!(b.extract(&tk), Value::List(vec![]));
    }

    #[test]
    fn list_default_seeds_committed_entries() {
        let mut tk = MemoryToolkit::new();
        let field = FieldSchema::new("xs", TypeExpr::list(int()))
            .default_value(Value::List(vec![Value::Int(4), Value::Int(5)]));
        let b = Dispatcher::default().build(&mut tk, &field).unwrap();
        assert_eq!(tk.entries(b.node()), &["4".to_string(), "5".to_string()]);
        assert_eq!(b.extract(&tk), Value::List(vec![Value::Int(4), Value::Int(5)]));
    }

    #[test]
    fn mapping_default_from_json_object() {
        let mut tk = MemoryToolkit::new();
        let json = serde_json::json!({ "a": 1, "b": 2 });
        let field =
            FieldSchema::new("m", TypeExpr::dict(string(), int())).default_value(Value::from(&json));
        let b = Dispatcher::default().build(&mut tk, &field).unwrap();
        assert_eq!(
            tk.entries(b.node()),
            &["\"a\": 1".to_string(), "\"b\": 2".to_string()]
        );
    }

    #[test]
    fn list_default_widens_ints_to_floats() {
        let mut tk = MemoryToolkit::new();
        let json = serde_json::json!([1, 2.5]);
        let field = FieldSchema::new("xs", TypeExpr::list(TypeExpr::primitive(PrimitiveKind::Float)))
            .default_value(Value::from(&json));
        let b = Dispatcher::default().build(&mut tk, &field).unwrap();
        assert_eq!(
            b.extract(&tk),
            Value::List(vec![Value::Float(1.0), Value::Float(2.5)])
        );
    }

    #[test]
    fn list_default_drops_items_of_the_wrong_shape() {
        let mut tk = MemoryToolkit::new();
        let json = serde_json::json!(["oops", { "a": 1 }, 3]);
        let field = FieldSchema::new("xs", TypeExpr::list(int())).default_value(Value::from(&json));
        let b = Dispatcher::default().build(&mut tk, &field).unwrap();
        assert_eq!(tk.entries(b.node()), &["3".to_string()]);
        assert_eq!(b.extract(&tk), Value::List(vec![Value::Int(3)]));
    }

    #[test]
    fn list_of_union_keeps_exact_shapes_first() {
        let mut tk = MemoryToolkit::new();
        let json = serde_json::json!(["5", 5]);
        let field = FieldSchema::new("xs", TypeExpr::list(TypeExpr::union(vec![int(), string()])))
            .default_value(Value::from(&json));
        let b = Dispatcher::default().build(&mut tk, &field).unwrap();
        assert_eq!(
            b.extract(&tk),
            Value::List(vec![Value::from("5"), Value::Int(5)])
        );
    }

    #[test]
    fn list_of_records_fills_missing_fields_from_field_defaults() {
        let point = RecordType::new(
            "Point",
            vec![
                FieldSchema::new("x", int()),
                FieldSchema::new("y", int()).default_value(Value::Int(0)),
            ],
        );
        let mut tk = MemoryToolkit::new();
        let json = serde_json::json!([{ "x": 1, "y": 2 }, { "x": "3" }, { "y": 4 }]);
        let field = FieldSchema::new("ps", TypeExpr::list(TypeExpr::record(point)))
            .default_value(Value::from(&json));
        let b = Dispatcher::default().build(&mut tk, &field).unwrap();
        let Value::List(items) = b.extract(&tk) else {
            panic!("expected a list");
        };
        let pairs: Vec<(Option<&Value>, Option<&Value>)> =
            items.iter().map(|p| (p.field("x"), p.field("y"))).collect();
        assert_eq!(
            pairs,
            vec![
                (Some(&Value::Int(1)), Some(&Value::Int(2))),
                (Some(&Value::Int(3)), Some(&Value::Int(0))),
            ]
        );
    }

    #[test]
    fn mapping_default_converts_keys_and_values() {
        let mut tk = MemoryToolkit::new();
        let json = serde_json::json!({ "1": 2, "two": 3.0, "4": "x" });
        let field = FieldSchema::new(
            "m",
            TypeExpr::dict(int(), TypeExpr::primitive(PrimitiveKind::Float)),
        )
        .default_value(Value::from(&json));
        let b = Dispatcher::default().build(&mut tk, &field).unwrap();
        assert_eq!(
            b.extract(&tk),
            Value::Map([(Value::Int(1), Value::Float(2.0))].into_iter().collect())
        );
    }

    #[test]
    fn failing_value_type_disposes_the_key_editor() {
        let mut tk = MemoryToolkit::new();
        let field = FieldSchema::new("m", TypeExpr::dict(string(), TypeExpr::named("list")));
        assert!(Dispatcher::default().build(&mut tk, &field).is_err());
        assert_eq!(tk.live_nodes(), 0);
    }

    #[test]
    fn union_default_selects_the_accepting_branch() {
        let mut tk = MemoryToolkit::new();
        let field = FieldSchema::new("u", TypeExpr::union(vec![int(), string()]))
            .default_value("hi");
        let b = Dispatcher::default().build(&mut tk, &field).unwrap();
        assert_eq!(tk.active_branch(b.node()), Some(1));
        assert_eq!(b.extract(&tk), Value::from("hi"));
    }

    #[test]
    fn optional_none_default_selects_the_null_branch() {
        let mut tk = MemoryToolkit::new();
        let field = FieldSchema::new("o", TypeExpr::optional(int())).default_value(Value::Null);
        let b = Dispatcher::default().build(&mut tk, &field).unwrap();
        assert_eq!(tk.active_branch(b.node()), Some(1));
        assert_eq!(b.extract(&tk), Value::Null);
    }

    #[test]
    fn union_branches_are_labelled_and_eager() {
        let mut tk = MemoryToolkit::new();
        let field = FieldSchema::new(
            "u",
            TypeExpr::union(vec![int(), TypeExpr::list(string())]),
        );
        let mut b = Dispatcher::default().build(&mut tk, &field).unwrap();
        let shell = b.node();
        assert!(tk
            .find_child(shell, &Slot::Branch("list[str]".into()))
            .is_some());
        assert!(tk.find_child(shell, &Slot::Branch("int".into())).is_some());

        let bad = FieldSchema::new("u", TypeExpr::union(vec![int(), TypeExpr::named("set")]));
        let mut fresh = MemoryToolkit::new();
        assert!(Dispatcher::default().build(&mut fresh, &bad).is_err());
        assert_eq!(fresh.live_nodes(), 0);

        // Out of range selections are ignored and leave the selector alone.
        assert_eq!(
            b.trigger(Action::Select(7), &mut tk),
            crate::binding::TriggerOutcome::Ignored
        );
        assert_eq!(tk.active_branch(shell), Some(0));
    }

    #[test]
    fn record_default_overrides_field_defaults() {
        let mut ns = TypeNamespace::new();
        ns.define_record(RecordType::new(
            "Point",
            vec![
                FieldSchema::new("x", int()).default_value(Value::Int(1)),
                FieldSchema::new("y", int()).default_value(Value::Int(2)),
            ],
        ));
        let dispatcher = Dispatcher::new(ns);
        let mut tk = MemoryToolkit::new();
        let json = serde_json::json!({ "y": 20 });
        let field = FieldSchema::new("p", TypeExpr::named("Point")).default_value(Value::from(&json));
        let b = dispatcher.build(&mut tk, &field).unwrap();
        assert_eq!(b.extract(&tk).field("x"), Some(&Value::Int(1)));
        assert_eq!(b.extract(&tk).field("y"), Some(&Value::Int(20)));
    }

    #[test]
    fn record_fields_keep_declaration_order_and_help() {
        let record = RecordType::new(
            "Person",
            vec![
                FieldSchema::new("name", string()).help("Full name"),
                FieldSchema::new("age", int()),
            ],
        );
        let mut tk = MemoryToolkit::new();
        let b = Dispatcher::default()
            .build(&mut tk, &FieldSchema::new("p", TypeExpr::record(record)))
            .unwrap();
        let name = tk.field_path(b.node(), &["name"]).unwrap();
        assert_eq!(tk.help(name), Some("Full name"));
        assert!(tk.write(name, Scalar::Text("Ada".into())));
        let Value::Record(fields) = b.extract(&tk) else {
            panic!("expected a record");
        };
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["name", "age"]);
        assert_eq!(fields["name"], Value::from("Ada"));
    }

    #[test]
    fn sibling_records_of_the_same_type_are_not_recursion() {
        let mut ns = TypeNamespace::new();
        ns.define_record(RecordType::new(
            "Address",
            vec![FieldSchema::new("city", string())],
        ));
        ns.define_record(RecordType::new(
            "Trip",
            vec![
                FieldSchema::new("from", TypeExpr::named("Address")),
                FieldSchema::new("to", TypeExpr::named("Address")),
            ],
        ));
        let mut tk = MemoryToolkit::new();
        let b = Dispatcher::new(ns).build_root(&mut tk, "Trip").unwrap();
        assert!(tk.field_path(b.node(), &["to", "city"]).is_some());
    }
}
