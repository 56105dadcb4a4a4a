use serde_json::{Map, Number, Value};

use crate::value::TypedValue;

/// Total over every `TypedValue`. A non-finite float, which `decode` never
/// produces, becomes `null` just as `serde_json::json!` would make it.
pub fn encode(value: &TypedValue) -> Value {
    match value {
        TypedValue::Bool(b) => Value::Bool(*b),
        TypedValue::Integer(i) => Value::from(*i),
        TypedValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        TypedValue::String(s) | TypedValue::Enum(s) => Value::String(s.clone()),
        TypedValue::Optional(None) => Value::Null,
        TypedValue::Optional(Some(inner)) => encode(inner),
        TypedValue::List(items) => Value::Array(items.iter().map(encode).collect()),
        TypedValue::Map(entries) => {
            Value::Object(entries.iter().map(|(k, v)| (k.clone(), encode(v))).collect())
        }
        TypedValue::Union { value, .. } => encode(value),
        TypedValue::Record(record) => {
            let mut out = Map::with_capacity(record.fields.len());
            for field in &record.fields {
                if field.optional && field.value.is_absent() {
                    continue;
                }
                out.insert(field.name.clone(), encode(&field.value));
            }
            Value::Object(out)
        }
        TypedValue::Any(json) => json.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::encode;
    use crate::value::{FieldValue, RecordValue, TypedValue};

    #[test]
    fn absent_optional_key_is_omitted() {
        let record = RecordValue {
            name: "R".into(),
            fields: vec![
                FieldValue { name: "kept".into(), value: TypedValue::absent(), optional: false },
                FieldValue { name: "dropped".into(), value: TypedValue::absent(), optional: true },
            ],
        };
        assert_eq!(encode(&record.into()), json!({"kept": null}));
    }

    #[test]
    fn nan_encodes_as_null() {
        assert_eq!(encode(&TypedValue::Float(f64::NAN)), json!(null));
    }

    #[test]
    fn union_tag_is_not_materialized() {
        let v = TypedValue::Union { variant: 3, value: Box::new(TypedValue::from("x")) };
        assert_eq!(encode(&v), json!("x"));
    }
}
