//! Shape descriptors: the static description a codec walks.
//!
//! Shapes are built once (by hand or by `lower`) and then only read. Recursive
//! records are expressed with `Shape::Ref`, which names a definition in a
//! `Registry` instead of embedding it.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Integer,
    Float,
    String,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Float => "float",
            PrimitiveKind::String => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Primitive(PrimitiveKind),
    Optional(Box<Shape>),       // null or absent ⇒ absent
    List(Box<Shape>),
    Map(Box<Shape>),            // string keys only
    Union(Vec<Shape>),          // first variant that decodes wins
    Record(Arc<RecordShape>),
    Ref(String),                // by-name pointer into a Registry
    Enum(Vec<String>),
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordShape {
    pub name: String,
    pub fields: Vec<Field>,     // declaration order = encode order
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub shape: Shape,
    /// Absent values are omitted on encode instead of written as `null`.
    pub optional: bool,
    pub description: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl Shape {
    pub fn boolean() -> Self { Shape::Primitive(PrimitiveKind::Boolean) }
    pub fn integer() -> Self { Shape::Primitive(PrimitiveKind::Integer) }
    pub fn float() -> Self { Shape::Primitive(PrimitiveKind::Float) }
    pub fn string() -> Self { Shape::Primitive(PrimitiveKind::String) }

    /// `Optional(Optional(x))` cannot tell its two absences apart in JSON,
    /// so a shape that already decodes `null` is returned as is. Refs are
    /// not followed here; see `Registry::collapse_optionals`.
    pub fn optional(inner: Shape) -> Self {
        if inner.admits_null() { inner } else { Shape::Optional(Box::new(inner)) }
    }
    pub fn list(element: Shape) -> Self { Shape::List(Box::new(element)) }
    pub fn map(value: Shape) -> Self { Shape::Map(Box::new(value)) }
    pub fn union(variants: impl IntoIterator<Item = Shape>) -> Self {
        Shape::Union(variants.into_iter().collect())
    }
    pub fn record(record: RecordShape) -> Self { Shape::Record(Arc::new(record)) }
    pub fn reference(name: impl Into<String>) -> Self { Shape::Ref(name.into()) }
    pub fn enumeration<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Shape::Enum(values.into_iter().map(Into::into).collect())
    }
}

impl RecordShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new(), description: None }
    }

    /// Append a required-key field.
    pub fn field(mut self, name: impl Into<String>, shape: Shape) -> Self {
        self.fields.push(Field { name: name.into(), shape, optional: false, description: None });
        self
    }

    /// Append a field whose key may be omitted; the shape is made `Optional`.
    pub fn optional_field(mut self, name: impl Into<String>, shape: Shape) -> Self {
        let shape = Shape::optional(shape);
        self.fields.push(Field { name: name.into(), shape, optional: true, description: None });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTROSPECTION
// ————————————————————————————————————————————————————————————————————————————

impl Shape {
    /// Variant tag, also used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Primitive(kind) => kind.name(),
            Shape::Optional(_) => "optional",
            Shape::List(_) => "list",
            Shape::Map(_) => "map",
            Shape::Union(_) => "union",
            Shape::Record(_) => "record",
            Shape::Ref(_) => "ref",
            Shape::Enum(_) => "enum",
            Shape::Any => "any",
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Shape::Optional(_))
    }

    /// An optional, or a union with a variant that is (at any nesting).
    pub fn admits_null(&self) -> bool {
        match self {
            Shape::Optional(_) => true,
            Shape::Union(variants) => variants.iter().any(Shape::admits_null),
            _ => false,
        }
    }

    /// Direct sub-shapes, in declaration order.
    pub fn children(&self) -> Vec<&Shape> {
        match self {
            Shape::Optional(inner) | Shape::List(inner) | Shape::Map(inner) => vec![inner.as_ref()],
            Shape::Union(variants) => variants.iter().collect(),
            Shape::Record(record) => record.fields.iter().map(|f| &f.shape).collect(),
            Shape::Primitive(_) | Shape::Ref(_) | Shape::Enum(_) | Shape::Any => Vec::new(),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Primitive(kind) => write!(f, "{}", kind.name()),
            Shape::Optional(inner) => write!(f, "{inner}?"),
            Shape::List(inner) => write!(f, "[{inner}]"),
            Shape::Map(inner) => write!(f, "{{string: {inner}}}"),
            Shape::Union(variants) => {
                write!(f, "(")?;
                for (i, v) in variants.iter().enumerate() {
                    if i > 0 { write!(f, " | ")?; }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
            Shape::Record(record) => write!(f, "{}", record.name),
            Shape::Ref(name) => write!(f, "&{name}"),
            Shape::Enum(values) => write!(f, "enum{values:?}"),
            Shape::Any => write!(f, "any"),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// REGISTRY
// ————————————————————————————————————————————————————————————————————————————

/// Named shape definitions that `Shape::Ref` points into.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    definitions: IndexMap<String, Shape>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    /// Add or replace a definition. Call `check` once all are in.
    pub fn define(&mut self, name: impl Into<String>, shape: Shape) -> &mut Self {
        self.definitions.insert(name.into(), shape);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Shape> {
        self.definitions.get(name)
    }

    pub fn len(&self) -> usize { self.definitions.len() }
    pub fn is_empty(&self) -> bool { self.definitions.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Shape)> {
        self.definitions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every ref must resolve, and no definition may reach itself through
    /// refs, optionals and unions alone: decoding such a cycle never
    /// consumes any JSON and would not terminate.
    pub fn check(&self) -> Result<(), SchemaError> {
        for (_, shape) in self.iter() {
            self.check_refs(shape)?;
        }
        let mut marks = HashMap::new();
        for (name, _) in self.iter() {
            if self.visit_unguarded(name, &mut marks) {
                return Err(SchemaError::RefCycle(name.to_string()));
            }
        }
        tracing::debug!(definitions = self.len(), "registry checked");
        Ok(())
    }

    /// Like `check`, but also verifies the refs reachable from `root`.
    pub fn check_root(&self, root: &Shape) -> Result<(), SchemaError> {
        self.check_refs(root)?;
        self.check()
    }

    /// Whether `shape` decodes JSON `null`, following refs and union variants.
    /// `Any` is left out: it carries `null` as a value, not as absence.
    ///
    /// Expects a checked registry; an unguarded ref cycle would not terminate.
    pub fn accepts_null(&self, shape: &Shape) -> bool {
        match shape {
            Shape::Optional(_) => true,
            Shape::Union(variants) => variants.iter().any(|v| self.accepts_null(v)),
            Shape::Ref(name) => self.get(name).is_some_and(|target| self.accepts_null(target)),
            _ => false,
        }
    }

    /// Drop every `Optional` wrapper whose inner shape already accepts
    /// `null` through a ref or union, in the definitions and in `root`.
    /// Run after `check`.
    pub fn collapse_optionals(&mut self, root: &Shape) -> Shape {
        let definitions: IndexMap<String, Shape> = self
            .definitions
            .iter()
            .map(|(name, shape)| (name.clone(), self.collapse(shape)))
            .collect();
        let root = self.collapse(root);
        self.definitions = definitions;
        root
    }

    fn collapse(&self, shape: &Shape) -> Shape {
        match shape {
            Shape::Optional(inner) => {
                let inner = self.collapse(inner);
                if self.accepts_null(&inner) { inner } else { Shape::Optional(Box::new(inner)) }
            }
            Shape::List(element) => Shape::list(self.collapse(element)),
            Shape::Map(value) => Shape::map(self.collapse(value)),
            Shape::Union(variants) => Shape::Union(variants.iter().map(|v| self.collapse(v)).collect()),
            Shape::Record(record) => Shape::record(RecordShape {
                name: record.name.clone(),
                fields: record
                    .fields
                    .iter()
                    .map(|f| Field { shape: self.collapse(&f.shape), ..f.clone() })
                    .collect(),
                description: record.description.clone(),
            }),
            Shape::Primitive(_) | Shape::Ref(_) | Shape::Enum(_) | Shape::Any => shape.clone(),
        }
    }

    /// Depth-first walk over the unguarded-ref graph; `true` on a back edge.
    fn visit_unguarded<'s>(&'s self, name: &'s str, marks: &mut HashMap<&'s str, Mark>) -> bool {
        match marks.get(name) {
            Some(Mark::Active) => return true,
            Some(Mark::Done) => return false,
            None => {}
        }
        marks.insert(name, Mark::Active);
        if let Some(shape) = self.definitions.get(name) {
            let mut next = Vec::new();
            unguarded_refs(shape, &mut next);
            if next.into_iter().any(|n| self.visit_unguarded(n, marks)) {
                return true;
            }
        }
        marks.insert(name, Mark::Done);
        false
    }

    fn check_refs(&self, shape: &Shape) -> Result<(), SchemaError> {
        if let Shape::Ref(name) = shape {
            if !self.definitions.contains_key(name) {
                return Err(SchemaError::UnknownRef(name.clone()));
            }
        }
        shape.children().into_iter().try_for_each(|child| self.check_refs(child))
    }
}

#[derive(Clone, Copy)]
enum Mark { Active, Done }

// refs reachable without passing through a list, map or record
fn unguarded_refs<'s>(shape: &'s Shape, out: &mut Vec<&'s str>) {
    match shape {
        Shape::Ref(name) => out.push(name),
        Shape::Optional(inner) => unguarded_refs(inner, out),
        Shape::Union(variants) => variants.iter().for_each(|v| unguarded_refs(v, out)),
        _ => {}
    }
}
