//! Typed values: what `decode` produces and `encode` consumes.
use indexmap::IndexMap;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Optional(Option<Box<TypedValue>>),
    List(Vec<TypedValue>),
    /// Equality ignores key order.
    Map(IndexMap<String, TypedValue>),
    /// `variant` indexes the union's declared variants.
    Union { variant: usize, value: Box<TypedValue> },
    Record(RecordValue),
    Enum(String),
    Any(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    pub name: String,
    pub fields: Vec<FieldValue>,   // declaration order
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: TypedValue,
    /// Mirrors `Field::optional`: omit the key on encode when absent.
    pub optional: bool,
}

impl TypedValue {
    pub fn absent() -> Self {
        TypedValue::Optional(None)
    }

    pub fn present(value: TypedValue) -> Self {
        TypedValue::Optional(Some(Box::new(value)))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, TypedValue::Optional(None))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self { TypedValue::Bool(b) => Some(*b), _ => None }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self { TypedValue::Integer(i) => Some(*i), _ => None }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self { TypedValue::Float(f) => Some(*f), _ => None }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) | TypedValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TypedValue]> {
        match self { TypedValue::List(xs) => Some(xs), _ => None }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self { TypedValue::Record(r) => Some(r), _ => None }
    }

    /// Unwraps `Optional` and `Union` layers down to the carried value.
    /// Absent optionals yield `None`.
    pub fn inner(&self) -> Option<&TypedValue> {
        match self {
            TypedValue::Optional(None) => None,
            TypedValue::Optional(Some(v)) => v.inner(),
            TypedValue::Union { value, .. } => value.inner(),
            other => Some(other),
        }
    }
}

impl RecordValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    pub fn with(mut self, name: impl Into<String>, value: TypedValue) -> Self {
        self.fields.push(FieldValue { name: name.into(), value, optional: false });
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self { TypedValue::Bool(b) }
}

impl From<i64> for TypedValue {
    fn from(i: i64) -> Self { TypedValue::Integer(i) }
}

impl From<f64> for TypedValue {
    fn from(f: f64) -> Self { TypedValue::Float(f) }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self { TypedValue::String(s.to_string()) }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self { TypedValue::String(s) }
}

impl From<RecordValue> for TypedValue {
    fn from(r: RecordValue) -> Self { TypedValue::Record(r) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_equality_ignores_order() {
        let a: IndexMap<_, _> = [("x".to_string(), TypedValue::from(1i64)), ("y".to_string(), 2i64.into())].into_iter().collect();
        let b: IndexMap<_, _> = [("y".to_string(), TypedValue::from(2i64)), ("x".to_string(), 1i64.into())].into_iter().collect();
        assert_eq!(TypedValue::Map(a), TypedValue::Map(b));
    }

    #[test]
    fn inner_peels_wrappers() {
        let v = TypedValue::Union { variant: 1, value: Box::new(TypedValue::present("hi".into())) };
        assert_eq!(v.inner().and_then(TypedValue::as_str), Some("hi"));
        assert_eq!(TypedValue::absent().inner(), None);
    }
}
