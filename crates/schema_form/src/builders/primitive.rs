//! Leaf editors.
//!
//! Each builder creates exactly one editor node holding one scalar and pairs it
//! with a `ScalarReader` that coerces the editor state back to the declared type.
//!
//! Defaults are applied when the field carries one and it can be coerced to the
//! editor's kind; anything else silently falls back to the kind's zero value:
//!
//! | kind     | zero value            |
//! |----------|-----------------------|
//! | int      | 0 (clamped to bounds) |
//! | float    | 0.0 (clamped)         |
//! | str      | ""                    |
//! | bool     | false                 |
//! | date     | 2000-01-01            |
//! | time     | 00:00:00              |
//! | datetime | 2000-01-01T00:00:00   |
//! | enum     | first member          |
//! | literal  | first value           |

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;

use crate::binding::{Binding, BindingKind, ScalarReader};
use crate::classify::TypeDescriptor;
use crate::dispatch::BuildContext;
use crate::error::{FormError, Result};
use crate::schema::{FieldSchema, PrimitiveKind};
use crate::toolkit::EditorSpec;
use crate::value::{Value, DATETIME_FORMAT, DATE_FORMAT, TIME_FORMAT};

pub(crate) fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

pub(crate) fn midnight() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default()
}

fn leaf(ctx: &mut BuildContext<'_>, spec: EditorSpec, reader: ScalarReader) -> Binding {
    let node = ctx.toolkit().create_editor(spec);
    Binding::new(node, BindingKind::Scalar(reader))
}

/// Editor bounds: the configured range, narrowed by the field's own min/max.
/// An inverted pair collapses onto `min`.
fn int_bounds(ctx: &BuildContext<'_>, field: &FieldSchema) -> (i64, i64) {
    let (mut min, mut max) = ctx.settings().int_range;
    if let Some(m) = field.min {
        min = min.max(m.ceil() as i64);
    }
    if let Some(m) = field.max {
        max = max.min(m.floor() as i64);
    }
    (min, max.max(min))
}

fn float_bounds(ctx: &BuildContext<'_>, field: &FieldSchema) -> (f64, f64) {
    let (range_min, range_max) = ctx.settings().float_range;
    let mut min = if range_min.is_nan() { f64::MIN } else { range_min };
    let mut max = if range_max.is_nan() { f64::MAX } else { range_max };
    if let Some(m) = field.min.filter(|m| !m.is_nan()) {
        min = min.max(m);
    }
    if let Some(m) = field.max.filter(|m| !m.is_nan()) {
        max = max.min(m);
    }
    (min, max.max(min))
}

fn as_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::DateTime(dt) => Some(dt.date()),
        Value::Str(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok(),
        _ => None,
    }
}

fn as_time(value: &Value) -> Option<NaiveTime> {
    match value {
        Value::Time(t) => Some(*t),
        Value::DateTime(dt) => Some(dt.time()),
        Value::Str(s) => NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M"))
            .ok(),
        _ => None,
    }
}

fn as_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::DateTime(dt) => Some(*dt),
        Value::Date(d) => Some(d.and_time(midnight())),
        Value::Str(s) => NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S"))
            .ok(),
        _ => None,
    }
}

/// Strict conversion of a seeded value to what a `kind` editor extracts.
/// Unlike a field default, which falls back to the zero value, a value that
/// does not fit yields `None`. Used for list and mapping entries.
pub(crate) fn coerce(kind: PrimitiveKind, value: &Value) -> Option<Value> {
    match kind {
        PrimitiveKind::Int => match value {
            Value::Int(i) => Some(Value::Int(*i)),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(Value::Int(*f as i64)),
            Value::Bool(b) => Some(Value::Int(i64::from(*b))),
            Value::Str(s) => s.trim().parse().ok().map(Value::Int),
            _ => None,
        },
        PrimitiveKind::Float | PrimitiveKind::Decimal => match value {
            Value::Float(f) if !f.is_nan() => Some(Value::Float(*f)),
            Value::Int(i) => Some(Value::Float(*i as f64)),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| !f.is_nan())
                .map(Value::Float),
            _ => None,
        },
        PrimitiveKind::Str => match value {
            Value::Str(s) => Some(Value::Str(s.clone())),
            Value::Int(_) | Value::Float(_) | Value::Bool(_) => Some(Value::Str(value.to_string())),
            _ => None,
        },
        PrimitiveKind::Bool => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::Int(i) => Some(Value::Bool(*i != 0)),
            Value::Str(s) => match s.trim() {
                "true" | "True" => Some(Value::Bool(true)),
                "false" | "False" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        PrimitiveKind::Date => as_date(value).map(Value::Date),
        PrimitiveKind::Time => as_time(value).map(Value::Time),
        PrimitiveKind::DateTime => as_datetime(value).map(Value::DateTime),
        PrimitiveKind::Null => matches!(value, Value::Null).then_some(Value::Null),
    }
}

pub fn build_int(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    _ty: TypeDescriptor,
) -> Result<Binding> {
    let (min, max) = int_bounds(ctx, field);
    let value = match &field.default {
        Some(Value::Int(i)) => *i,
        Some(Value::Float(f)) if f.is_finite() => *f as i64,
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    };
    let spec = EditorSpec::Int {
        value: value.clamp(min, max),
        min,
        max,
    };
    Ok(leaf(ctx, spec, ScalarReader::Primitive(PrimitiveKind::Int)))
}

/// Shared by `float` and `decimal`; both extract a float.
pub fn build_float(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    ty: TypeDescriptor,
) -> Result<Binding> {
    let kind = match ty {
        TypeDescriptor::Primitive(kind @ PrimitiveKind::Decimal) => kind,
        _ => PrimitiveKind::Float,
    };
    let (min, max) = float_bounds(ctx, field);
    let value = match &field.default {
        Some(Value::Float(f)) if !f.is_nan() => *f,
        Some(Value::Int(i)) => *i as f64,
        _ => 0.0,
    };
    let spec = EditorSpec::Float {
        value: value.clamp(min, max),
        min,
        max,
    };
    Ok(leaf(ctx, spec, ScalarReader::Primitive(kind)))
}

pub fn build_str(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    _ty: TypeDescriptor,
) -> Result<Binding> {
    let value = match &field.default {
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    };
    Ok(leaf(
        ctx,
        EditorSpec::Text { value },
        ScalarReader::Primitive(PrimitiveKind::Str),
    ))
}

pub fn build_bool(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    _ty: TypeDescriptor,
) -> Result<Binding> {
    let checked = match &field.default {
        Some(Value::Bool(b)) => *b,
        Some(Value::Int(i)) => *i != 0,
        _ => false,
    };
    Ok(leaf(
        ctx,
        EditorSpec::Toggle { checked },
        ScalarReader::Primitive(PrimitiveKind::Bool),
    ))
}

pub fn build_date(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    _ty: TypeDescriptor,
) -> Result<Binding> {
    let value = field.default.as_ref().and_then(as_date);
    Ok(leaf(
        ctx,
        EditorSpec::Date {
            value: value.unwrap_or_else(epoch_date),
        },
        ScalarReader::Primitive(PrimitiveKind::Date),
    ))
}

pub fn build_time(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    _ty: TypeDescriptor,
) -> Result<Binding> {
    let value = field.default.as_ref().and_then(as_time);
    Ok(leaf(
        ctx,
        EditorSpec::Time {
            value: value.unwrap_or_else(midnight),
        },
        ScalarReader::Primitive(PrimitiveKind::Time),
    ))
}

pub fn build_datetime(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    _ty: TypeDescriptor,
) -> Result<Binding> {
    let value = field.default.as_ref().and_then(as_datetime);
    Ok(leaf(
        ctx,
        EditorSpec::DateTime {
            value: value.unwrap_or_else(|| epoch_date().and_time(midnight())),
        },
        ScalarReader::Primitive(PrimitiveKind::DateTime),
    ))
}

/// The `None` type: an editor with nothing to edit that always yields `None`.
pub fn build_null(
    ctx: &mut BuildContext<'_>,
    _field: &FieldSchema,
    _ty: TypeDescriptor,
) -> Result<Binding> {
    Ok(leaf(
        ctx,
        EditorSpec::Blank,
        ScalarReader::Primitive(PrimitiveKind::Null),
    ))
}

pub fn build_enum(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    ty: TypeDescriptor,
) -> Result<Binding> {
    let TypeDescriptor::Enum(ty) = ty else {
        return Err(unexpected(ctx, field));
    };
    let options = ty.members.iter().map(|m| m.name.clone()).collect();
    let selected = field
        .default
        .as_ref()
        .and_then(|d| ty.position_of(d))
        .unwrap_or(0);
    Ok(leaf(
        ctx,
        EditorSpec::Choice { options, selected },
        ScalarReader::Enum(Arc::clone(&ty)),
    ))
}

/// Literal values round-trip through their display strings, so two values
/// that display alike cannot both be offered.
pub fn build_literal(
    ctx: &mut BuildContext<'_>,
    field: &FieldSchema,
    ty: TypeDescriptor,
) -> Result<Binding> {
    let TypeDescriptor::Literal(values) = ty else {
        return Err(unexpected(ctx, field));
    };
    let by_display = literal_display_map(&values)?;
    let options = by_display.keys().cloned().collect();
    let selected = field
        .default
        .as_ref()
        .and_then(|d| by_display.values().position(|v| v == d))
        .unwrap_or(0);
    Ok(leaf(
        ctx,
        EditorSpec::Choice { options, selected },
        ScalarReader::Literal(by_display),
    ))
}

/// Display string -> original value, in declaration order.
pub fn literal_display_map(values: &[Value]) -> Result<IndexMap<String, Value>> {
    let mut by_display: IndexMap<String, Value> = IndexMap::with_capacity(values.len());
    for value in values {
        let display = value.to_string();
        if let Some(first) = by_display.get(&display) {
            if first == value {
                continue;
            }
            return Err(FormError::MalformedLiteralDisplay {
                display,
                first: first.render(),
                second: value.render(),
            });
        }
        by_display.insert(display, value.clone());
    }
    Ok(by_display)
}

/// A builder was handed a descriptor for a different tag, i.e. it was
/// registered under the wrong key.
fn unexpected(ctx: &BuildContext<'_>, field: &FieldSchema) -> FormError {
    FormError::UnsupportedType {
        ty: field.ty.to_string(),
        path: ctx.path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::memory::{EditorState, MemoryToolkit};
    use crate::schema::{EnumMember, EnumType, TypeExpr};
    use crate::settings::FormSettings;
    use crate::toolkit::{Scalar, Toolkit};
    use pretty_assertions::assert_eq;

    fn build(field: FieldSchema) -> (MemoryToolkit, Binding) {
        let mut tk = MemoryToolkit::new();
        let binding = Dispatcher::default().build(&mut tk, &field).unwrap();
        (tk, binding)
    }

    fn prim(kind: PrimitiveKind) -> TypeExpr {
        TypeExpr::primitive(kind)
    }

    #[test]
    fn untouched_primitives_yield_zero_values() {
        let cases = [
            (PrimitiveKind::Int, Value::Int(0)),
            (PrimitiveKind::Float, Value::Float(0.0)),
            (PrimitiveKind::Decimal, Value::Float(0.0)),
            (PrimitiveKind::Str, Value::Str(String::new())),
            (PrimitiveKind::Bool, Value::Bool(false)),
            (PrimitiveKind::Date, Value::Date(epoch_date())),
            (PrimitiveKind::Time, Value::Time(midnight())),
            (
                PrimitiveKind::DateTime,
                Value::DateTime(epoch_date().and_time(midnight())),
            ),
            (PrimitiveKind::Null, Value::Null),
        ];
        for (kind, expected) in cases {
            let (tk, binding) = build(FieldSchema::new("x", prim(kind)));
            assert_eq!(binding.extract(&tk), expected, "{kind}");
        }
    }

    #[test]
    fn int_bounds_narrow_the_default_range() {
        let (tk, binding) = build(
            FieldSchema::new("age", prim(PrimitiveKind::Int))
                .min(1.0)
                .max(120.0),
        );
        assert_eq!(
            tk.editor(binding.node()),
            Some(&EditorState::Int {
                value: 1,
                min: 1,
                max: 120
            })
        );
        assert_eq!(binding.extract(&tk), Value::Int(1));
    }

    #[test]
    fn configured_range_caps_wider_field_bounds() {
        let mut tk = MemoryToolkit::new();
        let settings = FormSettings {
            int_range: (-10, 10),
            ..FormSettings::default()
        };
        let binding = Dispatcher::default()
            .with_settings(settings)
            .build(
                &mut tk,
                &FieldSchema::new("n", prim(PrimitiveKind::Int)).max(1e12),
            )
            .unwrap();
        assert!(tk.write(binding.node(), Scalar::Int(1_000)));
        assert_eq!(binding.extract(&tk), Value::Int(10));
    }

    #[test]
    fn inverted_bounds_collapse_onto_min() {
        let (tk, binding) = build(
            FieldSchema::new("n", prim(PrimitiveKind::Float))
                .min(5.0)
                .max(1.0),
        );
        assert_eq!(binding.extract(&tk), Value::Float(5.0));
    }

    #[test]
    fn defaults_are_coerced_to_the_editor_kind() {
        let (tk, b) = build(
            FieldSchema::new("f", prim(PrimitiveKind::Float)).default_value(Value::Int(2)),
        );
        assert_eq!(b.extract(&tk), Value::Float(2.0));

        let (tk, b) =
            build(FieldSchema::new("d", prim(PrimitiveKind::Date)).default_value("2024-02-29"));
        assert_eq!(
            b.extract(&tk),
            Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );

        let (tk, b) =
            build(FieldSchema::new("d", prim(PrimitiveKind::Date)).default_value("not a date"));
        assert_eq!(b.extract(&tk), Value::Date(epoch_date()));

        let (tk, b) =
            build(FieldSchema::new("s", prim(PrimitiveKind::Str)).default_value(Value::Int(7)));
        assert_eq!(b.extract(&tk), Value::from("7"));
    }

    #[test]
    fn enum_displays_names_and_extracts_values() {
        let level = EnumType::new(
            "Level",
            vec![
                EnumMember {
                    name: "Low".into(),
                    value: Value::Int(1),
                },
                EnumMember {
                    name: "High".into(),
                    value: Value::Int(10),
                },
            ],
        );
        let (mut tk, b) = build(
            FieldSchema::new("level", TypeExpr::enumeration(level)).default_value("High"),
        );
        assert_eq!(
            tk.editor(b.node()),
            Some(&EditorState::Choice {
                options: vec!["Low".into(), "High".into()],
                selected: 1
            })
        );
        assert_eq!(b.extract(&tk), Value::Int(10));
        tk.write(b.node(), Scalar::Index(0));
        assert_eq!(b.extract(&tk), Value::Int(1));
    }

    #[test]
    fn literal_extracts_the_typed_value_not_its_display() {
        let ty = TypeExpr::literal(vec![Value::from("1"), Value::Int(2), Value::Bool(true)]);
        let (mut tk, b) = build(FieldSchema::new("lit", ty));
        assert_eq!(b.extract(&tk), Value::from("1"));
        tk.write(b.node(), Scalar::Index(1));
        assert_eq!(b.extract(&tk), Value::Int(2));
        tk.write(b.node(), Scalar::Index(2));
        assert_eq!(b.extract(&tk), Value::Bool(true));
    }

    #[test]
    fn literal_with_colliding_displays_is_rejected() {
        let mut tk = MemoryToolkit::new();
        let field = FieldSchema::new(
            "lit",
            TypeExpr::literal(vec![Value::from("1"), Value::Int(1)]),
        );
        let err = Dispatcher::default().build(&mut tk, &field).unwrap_err();
        assert_eq!(
            err.to_string(),
            "literal values `\"1\"` and `1` share the display string `1`"
        );
        assert_eq!(tk.live_nodes(), 0);
    }

    #[test]
    fn repeated_identical_literals_collapse() {
        let map = literal_display_map(&[Value::Int(1), Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn nan_in_configured_float_range_is_ignored() {
        let mut tk = MemoryToolkit::new();
        let settings = FormSettings {
            float_range: (f64::NAN, 1.0),
            ..FormSettings::default()
        };
        let field = FieldSchema::new("x", prim(PrimitiveKind::Float)).default_value(Value::Float(5.0));
        let binding = Dispatcher::default()
            .with_settings(settings)
            .build(&mut tk, &field)
            .unwrap();
        assert_eq!(binding.extract(&tk), Value::Float(1.0));
        assert!(tk.write(binding.node(), Scalar::Float(-3.5)));
        assert_eq!(binding.extract(&tk), Value::Float(-3.5));
    }

    #[test]
    fn entry_coercion_is_strict() {
        assert_eq!(coerce(PrimitiveKind::Float, &Value::Int(1)), Some(Value::Float(1.0)));
        assert_eq!(coerce(PrimitiveKind::Int, &Value::from(" 7 ")), Some(Value::Int(7)));
        assert_eq!(coerce(PrimitiveKind::Int, &Value::Float(2.5)), None);
        assert_eq!(coerce(PrimitiveKind::Int, &Value::from("oops")), None);
        assert_eq!(
            coerce(PrimitiveKind::Date, &Value::from("2024-02-29")),
            NaiveDate::from_ymd_opt(2024, 2, 29).map(Value::Date)
        );
        assert_eq!(coerce(PrimitiveKind::Null, &Value::Int(0)), None);
    }
}
