//! Schema documents: the JSON Typedef (RFC 8927) dialect shapes are declared in.
//!
//! Supported forms: empty, `type`, `enum`, `elements`, `values`,
//! `properties`/`optionalProperties`, `discriminator`/`mapping`, `ref`, plus a
//! non-standard `oneOf` for ordered unions. `nullable` and
//! `metadata.description` apply to every form.
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::codec::{Codec, CodecOptions};
use crate::error::SchemaError;
use crate::shape::{Registry, Shape};

/// One schema node exactly as written. At most one form keyword may be set;
/// `lower` enforces that.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SchemaDoc {
    #[serde(default)]
    pub definitions: IndexMap<String, SchemaDoc>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub metadata: IndexMap<String, Value>,

    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    #[serde(rename = "enum")]
    pub enum_: Option<Vec<String>>,
    pub elements: Option<Box<SchemaDoc>>,
    pub values: Option<Box<SchemaDoc>>,
    pub properties: Option<IndexMap<String, SchemaDoc>>,
    pub optional_properties: Option<IndexMap<String, SchemaDoc>>,
    pub additional_properties: Option<bool>,
    pub discriminator: Option<String>,
    pub mapping: Option<IndexMap<String, SchemaDoc>>,
    pub one_of: Option<Vec<SchemaDoc>>,
}

impl SchemaDoc {
    pub fn description(&self) -> Option<&str> {
        self.metadata.get("description").and_then(Value::as_str)
    }
}

/// A lowered schema: named definitions plus the root shape.
#[derive(Debug, Clone)]
pub struct Schema {
    registry: Registry,
    root: Shape,
}

impl Schema {
    pub(crate) fn new(registry: Registry, root: Shape) -> Self {
        Self { registry, root }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn root(&self) -> &Shape {
        &self.root
    }

    /// Lower `doc`, naming the root record (if any) `root_name`.
    pub fn from_doc(doc: &SchemaDoc, root_name: &str) -> Result<Self, SchemaError> {
        crate::lower::lower_schema(doc, root_name)
    }

    pub fn from_value(value: Value, root_name: &str) -> Result<Self, SchemaError> {
        let doc: SchemaDoc = crate::path_de::from_value_with_path(value)?;
        Self::from_doc(&doc, root_name)
    }

    pub fn from_json_str(src: &str, root_name: &str) -> Result<Self, SchemaError> {
        let doc: SchemaDoc = crate::path_de::from_str_with_path(src)?;
        Self::from_doc(&doc, root_name)
    }

    pub fn from_path(path: impl AsRef<Path>, root_name: &str) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        tracing::debug!(path = %path.display(), "loading schema");
        let doc: SchemaDoc = crate::path_de::from_slice_with_path(&bytes)?;
        Self::from_doc(&doc, root_name)
    }

    /// The registry was checked during lowering.
    pub fn codec(&self, options: CodecOptions) -> Codec<'_> {
        Codec::from_checked(&self.registry, options)
    }
}
