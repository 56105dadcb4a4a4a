use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::Codec;
use crate::error::DecodeError;
use crate::shape::{PrimitiveKind, RecordShape, Shape};
use crate::value::{FieldValue, RecordValue, TypedValue};

impl Codec<'_> {
    pub(super) fn decode_at(&self, shape: &Shape, json: &Value, depth: usize) -> Result<TypedValue, DecodeError> {
        match shape {
            Shape::Primitive(kind) => decode_primitive(*kind, json),
            Shape::Optional(inner) => match json {
                Value::Null => Ok(TypedValue::absent()),
                _ => Ok(TypedValue::present(self.decode_at(inner, json, depth)?)),
            },
            Shape::List(element) => {
                let Value::Array(items) = json else {
                    return Err(DecodeError::mismatch("array", json));
                };
                let depth = self.descend(depth)?;
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        self.decode_at(element, item, depth)
                            .map_err(|e| DecodeError::Element { index, source: Box::new(e) })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(TypedValue::List)
            }
            Shape::Map(value) => {
                let Value::Object(entries) = json else {
                    return Err(DecodeError::mismatch("object", json));
                };
                let depth = self.descend(depth)?;
                let mut out = IndexMap::with_capacity(entries.len());
                for (key, item) in entries {
                    let v = self
                        .decode_at(value, item, depth)
                        .map_err(|e| DecodeError::Entry { key: key.clone(), source: Box::new(e) })?;
                    out.insert(key.clone(), v);
                }
                Ok(TypedValue::Map(out))
            }
            Shape::Union(variants) => self.decode_union(variants, json, depth),
            Shape::Record(record) => {
                let Value::Object(entries) = json else {
                    return Err(DecodeError::mismatch("object", json));
                };
                let depth = self.descend(depth)?;
                self.decode_record(record, entries, depth)
            }
            Shape::Ref(name) => {
                let target = self.registry.get(name).ok_or_else(|| DecodeError::UnresolvedRef(name.clone()))?;
                tracing::trace!(%name, "following shape ref");
                self.decode_at(target, json, depth)
            }
            Shape::Enum(allowed) => {
                let Value::String(s) = json else {
                    return Err(DecodeError::mismatch("enum string", json));
                };
                if allowed.iter().any(|a| a == s) {
                    Ok(TypedValue::Enum(s.clone()))
                } else {
                    Err(DecodeError::NotInEnum { value: s.clone(), allowed: allowed.clone() })
                }
            }
            Shape::Any => Ok(TypedValue::Any(json.clone())),
        }
    }

    fn descend(&self, depth: usize) -> Result<usize, DecodeError> {
        if depth >= self.options.max_depth {
            return Err(DecodeError::DepthLimitExceeded(self.options.max_depth));
        }
        Ok(depth + 1)
    }

    // Declaration order decides; no best-match scoring.
    fn decode_union(&self, variants: &[Shape], json: &Value, depth: usize) -> Result<TypedValue, DecodeError> {
        let mut attempts = Vec::with_capacity(variants.len());
        for (variant, shape) in variants.iter().enumerate() {
            match self.decode_at(shape, json, depth) {
                Ok(value) => {
                    tracing::trace!(variant, shape = %shape, "union variant matched");
                    return Ok(TypedValue::Union { variant, value: Box::new(value) });
                }
                Err(error) => {
                    tracing::trace!(variant, shape = %shape, %error, "union variant rejected");
                    attempts.push(error);
                }
            }
        }
        Err(DecodeError::UnionExhausted { attempts })
    }

    // Keys are looked up by field name; keys the record doesn't declare are ignored.
    fn decode_record(&self, record: &RecordShape, entries: &Map<String, Value>, depth: usize) -> Result<TypedValue, DecodeError> {
        let mut fields = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            let value = match entries.get(&field.name) {
                Some(item) => self.decode_at(&field.shape, item, depth).map_err(|e| DecodeError::Field {
                    record: record.name.clone(),
                    field: field.name.clone(),
                    source: Box::new(e),
                })?,
                // a missing key reads as `null` wherever `null` is accepted
                None if self.registry.accepts_null(&field.shape) => {
                    self.decode_at(&field.shape, &Value::Null, depth).map_err(|e| DecodeError::Field {
                        record: record.name.clone(),
                        field: field.name.clone(),
                        source: Box::new(e),
                    })?
                }
                None => {
                    return Err(DecodeError::MissingField {
                        record: record.name.clone(),
                        field: field.name.clone(),
                    });
                }
            };
            fields.push(FieldValue { name: field.name.clone(), value, optional: field.optional });
        }
        Ok(TypedValue::Record(RecordValue { name: record.name.clone(), fields }))
    }
}

fn decode_primitive(kind: PrimitiveKind, json: &Value) -> Result<TypedValue, DecodeError> {
    match (kind, json) {
        (PrimitiveKind::Boolean, Value::Bool(b)) => Ok(TypedValue::Bool(*b)),
        (PrimitiveKind::String, Value::String(s)) => Ok(TypedValue::String(s.clone())),
        (PrimitiveKind::Integer, Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(TypedValue::Integer(i)),
            (None, _) if n.is_u64() => Err(out_of_range()),
            // `3.0` is integral; `i64::MAX as f64` rounds up to 2^63, hence `<`
            (None, Some(f)) if f.fract() == 0.0 => {
                if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    Ok(TypedValue::Integer(f as i64))
                } else {
                    Err(out_of_range())
                }
            }
            (None, _) => Err(DecodeError::mismatch("integer", json)),
        },
        (PrimitiveKind::Float, Value::Number(n)) => n
            .as_f64()
            .map(TypedValue::Float)
            .ok_or_else(|| DecodeError::mismatch("float", json)),
        _ => Err(DecodeError::mismatch(kind.name(), json)),
    }
}

fn out_of_range() -> DecodeError {
    DecodeError::ShapeMismatch { expected: "integer", actual: "integer outside i64 range" }
}
