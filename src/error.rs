use std::fmt::Write as _;

use thiserror::Error;

/// Why a JSON value was rejected. Container levels wrap the inner failure
/// with their position, so the outermost error carries the whole trail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("expected {expected}, found {actual}")]
    ShapeMismatch { expected: &'static str, actual: &'static str },

    #[error("missing required field `{field}` of {record}")]
    MissingField { record: String, field: String },

    #[error("no union variant matched ({} tried)", .attempts.len())]
    UnionExhausted { attempts: Vec<DecodeError> },

    #[error("at index {index}: {source}")]
    Element { index: usize, source: Box<DecodeError> },

    #[error("at key `{key}`: {source}")]
    Entry { key: String, source: Box<DecodeError> },

    #[error("in {record}.{field}: {source}")]
    Field { record: String, field: String, source: Box<DecodeError> },

    #[error("`{value}` is not one of {allowed:?}")]
    NotInEnum { value: String, allowed: Vec<String> },

    #[error("unresolved shape reference `{0}`")]
    UnresolvedRef(String),

    #[error("nesting deeper than {0} levels")]
    DepthLimitExceeded(usize),
}

impl DecodeError {
    pub(crate) fn mismatch(expected: &'static str, actual: &serde_json::Value) -> Self {
        DecodeError::ShapeMismatch { expected, actual: json_kind(actual) }
    }

    /// Root-to-leaf location of the failure, e.g. `.items[2].name`.
    /// Empty when the failure is at the root.
    pub fn path(&self) -> String {
        let mut out = String::new();
        let mut cur = self;
        loop {
            match cur {
                DecodeError::Element { index, source } => {
                    let _ = write!(out, "[{index}]");
                    cur = source.as_ref();
                }
                DecodeError::Entry { key, source } => {
                    let _ = write!(out, "[{key:?}]");
                    cur = source.as_ref();
                }
                DecodeError::Field { field, source, .. } => {
                    let _ = write!(out, ".{field}");
                    cur = source.as_ref();
                }
                DecodeError::MissingField { field, .. } => {
                    let _ = write!(out, ".{field}");
                    return out;
                }
                _ => return out,
            }
        }
    }

    /// The innermost failure, with positional wrappers stripped.
    pub fn leaf(&self) -> &DecodeError {
        match self {
            DecodeError::Element { source, .. }
            | DecodeError::Entry { source, .. }
            | DecodeError::Field { source, .. } => source.leaf(),
            other => other,
        }
    }
}

/// Rejections raised while turning a schema document into shapes.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("at JSON path {path} → {message}")]
    Parse { path: String, message: String },

    #[error("reference to undefined definition `{0}`")]
    UnknownRef(String),

    #[error("definition `{0}` refers back to itself without an intervening list, map or record")]
    RefCycle(String),

    #[error("unknown type `{0}`")]
    UnknownType(String),

    #[error("at {at}: {message}")]
    Invalid { at: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub(crate) fn json_kind(v: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
