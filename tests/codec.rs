//! Integration tests for shape-directed decode/encode.

use json_shape::{codec, Codec, CodecOptions, DecodeError, RecordShape, Registry, Shape, TypedValue};
use serde_json::json;

fn root0() -> Shape {
    Shape::record(
        RecordShape::new("Root0")
            .field("bar", Shape::string())
            .field("baz", Shape::list(Shape::boolean()))
            .field("foo", Shape::boolean())
            .field("quux", Shape::list(Shape::boolean())),
    )
}

// ── Round trip ──────────────────────────────────────────────────────────────

#[test]
fn end_to_end_record() {
    let shape = root0();
    let input = json!({"quux": [], "foo": true, "baz": [true, false], "bar": "x"});
    let value = codec::decode(&shape, &input).unwrap();

    let record = value.as_record().unwrap();
    assert_eq!(record.name, "Root0");
    assert_eq!(record.get("bar").and_then(TypedValue::as_str), Some("x"));
    assert_eq!(record.get("foo").and_then(TypedValue::as_bool), Some(true));
    assert_eq!(
        record.get("baz").and_then(TypedValue::as_list),
        Some(&[TypedValue::Bool(true), TypedValue::Bool(false)][..])
    );
    assert_eq!(record.get("quux").and_then(TypedValue::as_list).map(<[_]>::len), Some(0));

    let encoded = codec::encode(&value);
    assert_eq!(encoded, input);
    // declaration order on output, regardless of input order
    let keys: Vec<&str> = encoded.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["bar", "baz", "foo", "quux"]);
}

#[test]
fn round_trip_mixed_shape() {
    let shape = Shape::record(
        RecordShape::new("Mixed")
            .field("id", Shape::integer())
            .field("score", Shape::float())
            .field("tags", Shape::map(Shape::list(Shape::string())))
            .field("note", Shape::optional(Shape::string()))
            .field("either", Shape::union([Shape::integer(), Shape::string()]))
            .field("color", Shape::enumeration(["red", "green"]))
            .field("extra", Shape::Any),
    );
    let input = json!({
        "id": -4,
        "score": 0.25,
        "tags": {"a": ["x", "y"], "b": []},
        "note": null,
        "either": "five",
        "color": "green",
        "extra": {"anything": [1, null, "goes"]}
    });
    let value = codec::decode(&shape, &input).unwrap();
    let encoded = codec::encode(&value);
    assert_eq!(encoded, input);
    assert_eq!(codec::decode(&shape, &encoded).unwrap(), value);
}

#[test]
fn list_order_is_preserved() {
    let shape = Shape::list(Shape::integer());
    let value = codec::decode(&shape, &json!([3, 1, 2])).unwrap();
    assert_eq!(codec::encode(&value), json!([3, 1, 2]));
}

// ── Optional ───────────────────────────────────────────────────────────────

#[test]
fn null_is_absent_for_any_inner_shape() {
    for inner in [Shape::integer(), Shape::list(Shape::string()), root0(), Shape::Any] {
        let value = codec::decode(&Shape::optional(inner), &json!(null)).unwrap();
        assert!(value.is_absent());
    }
}

#[test]
fn nullable_wrapper_round_trips_null() {
    let shape = Shape::optional(root0());
    let value = codec::decode(&shape, &json!(null)).unwrap();
    assert_eq!(value, TypedValue::absent());
    assert_eq!(codec::encode(&value), json!(null));
}

#[test]
fn missing_optional_field_is_absent_and_encodes_as_null() {
    let shape = Shape::record(RecordShape::new("R").field("x", Shape::optional(Shape::integer())));
    let value = codec::decode(&shape, &json!({})).unwrap();
    assert!(value.as_record().unwrap().get("x").unwrap().is_absent());
    assert_eq!(codec::encode(&value), json!({"x": null}));
}

#[test]
fn optional_key_field_is_omitted_when_absent() {
    let shape = Shape::record(RecordShape::new("R").optional_field("x", Shape::integer()));
    let absent = codec::decode(&shape, &json!({"x": null})).unwrap();
    assert_eq!(codec::encode(&absent), json!({}));
    let present = codec::decode(&shape, &json!({"x": 7})).unwrap();
    assert_eq!(codec::encode(&present), json!({"x": 7}));
}

// ── Unions ─────────────────────────────────────────────────────────────────

#[test]
fn union_prefers_first_declared_variant() {
    let shape = Shape::union([Shape::float(), Shape::integer()]);
    let value = codec::decode(&shape, &json!(3)).unwrap();
    assert!(matches!(&value, TypedValue::Union { variant: 0, value } if **value == TypedValue::Float(3.0)));

    let shape = Shape::union([Shape::integer(), Shape::float()]);
    let value = codec::decode(&shape, &json!(3)).unwrap();
    assert!(matches!(&value, TypedValue::Union { variant: 0, value } if **value == TypedValue::Integer(3)));
}

#[test]
fn union_falls_through_to_later_variant() {
    let shape = Shape::union([Shape::boolean(), Shape::list(Shape::boolean())]);
    let value = codec::decode(&shape, &json!([true])).unwrap();
    assert!(matches!(value, TypedValue::Union { variant: 1, .. }));
}

#[test]
fn exhausted_union_reports_every_attempt() {
    let shape = Shape::union([Shape::boolean(), Shape::integer()]);
    let err = codec::decode(&shape, &json!("nope")).unwrap_err();
    let DecodeError::UnionExhausted { attempts } = err else { panic!("expected an exhausted union") };
    assert_eq!(
        attempts,
        vec![
            DecodeError::ShapeMismatch { expected: "boolean", actual: "string" },
            DecodeError::ShapeMismatch { expected: "integer", actual: "string" },
        ]
    );
}

// ── Records ────────────────────────────────────────────────────────────────

#[test]
fn missing_required_field() {
    let shape = Shape::record(RecordShape::new("R").field("x", Shape::string()));
    let err = codec::decode(&shape, &json!({})).unwrap_err();
    assert_eq!(err, DecodeError::MissingField { record: "R".into(), field: "x".into() });
}

#[test]
fn unknown_keys_are_ignored_and_dropped() {
    let shape = Shape::record(RecordShape::new("R").field("x", Shape::string()));
    let value = codec::decode(&shape, &json!({"x": "v", "extra": 1})).unwrap();
    assert_eq!(codec::encode(&value), json!({"x": "v"}));
}

#[test]
fn nested_failure_carries_full_path() {
    let shape = Shape::record(
        RecordShape::new("Order").field(
            "lines",
            Shape::list(Shape::record(RecordShape::new("Line").field("qty", Shape::integer()))),
        ),
    );
    let err = codec::decode(&shape, &json!({"lines": [{"qty": 1}, {"qty": "two"}]})).unwrap_err();
    assert_eq!(err.path(), ".lines[1].qty");
    assert_eq!(err.leaf(), &DecodeError::ShapeMismatch { expected: "integer", actual: "string" });

    let err = codec::decode(&shape, &json!({"lines": [{}]})).unwrap_err();
    assert_eq!(err.path(), ".lines[0].qty");
    assert!(matches!(err.leaf(), DecodeError::MissingField { field, .. } if field == "qty"));
}

#[test]
fn record_rejects_non_objects() {
    let err = codec::decode(&root0(), &json!([1])).unwrap_err();
    assert_eq!(err, DecodeError::ShapeMismatch { expected: "object", actual: "array" });
}

// ── Enum ───────────────────────────────────────────────────────────────────

#[test]
fn enum_rejects_unlisted_value() {
    let shape = Shape::enumeration(["a", "b"]);
    let err = codec::decode(&shape, &json!("c")).unwrap_err();
    assert!(matches!(err, DecodeError::NotInEnum { value, .. } if value == "c"));
    assert!(matches!(
        codec::decode(&shape, &json!(1)),
        Err(DecodeError::ShapeMismatch { expected: "enum string", .. })
    ));
}

// ── Recursive shapes ───────────────────────────────────────────────────────

fn tree_registry() -> Registry {
    let node = RecordShape::new("Node")
        .field("value", Shape::integer())
        .field("children", Shape::list(Shape::reference("Node")));
    let mut registry = Registry::new();
    registry.define("Node", Shape::record(node));
    registry
}

#[test]
fn self_referential_record() {
    let registry = tree_registry();
    let codec = Codec::new(&registry).unwrap();
    let input = json!({"value": 1, "children": [
        {"value": 2, "children": []},
        {"value": 3, "children": [{"value": 4, "children": []}]}
    ]});
    let shape = Shape::reference("Node");
    let value = codec.decode(&shape, &input).unwrap();
    assert_eq!(codec.encode(&value), input);
}

#[test]
fn unresolved_ref_without_registry() {
    let err = codec::decode(&Shape::reference("Nope"), &json!(1)).unwrap_err();
    assert_eq!(err, DecodeError::UnresolvedRef("Nope".into()));
}

#[test]
fn depth_limit_stops_deep_input() {
    let registry = tree_registry();
    let codec = Codec::with_options(&registry, CodecOptions { max_depth: 6 }).unwrap();

    let mut deep = json!({"value": 0, "children": []});
    for i in 1..10 {
        deep = json!({"value": i, "children": [deep]});
    }
    let err = codec.decode(&Shape::reference("Node"), &deep).unwrap_err();
    assert_eq!(err.leaf(), &DecodeError::DepthLimitExceeded(6));

    let shallow = json!({"value": 1, "children": [{"value": 2, "children": []}]});
    assert!(codec.decode(&Shape::reference("Node"), &shallow).is_ok());
}

// ── Concurrency ────────────────────────────────────────────────────────────

#[test]
fn codec_is_shared_across_threads() {
    let registry = tree_registry();
    let codec = Codec::new(&registry).unwrap();
    let shape = Shape::reference("Node");
    std::thread::scope(|scope| {
        for i in 0..8i64 {
            let codec = &codec;
            let shape = &shape;
            scope.spawn(move || {
                let input = json!({"value": i, "children": [{"value": i + 1, "children": []}]});
                let value = codec.decode(shape, &input).unwrap();
                assert_eq!(codec.encode(&value), input);
            });
        }
    });
}
