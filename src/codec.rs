//! Shape-directed conversion between `serde_json::Value` and `TypedValue`.
//!
//! - `decode` walks a shape and a JSON value in lockstep and either builds a
//!   typed value or reports where the two disagree.
//! - `encode` needs no shape: a typed value already carries everything
//!   required to rebuild its JSON (field order, optional-key policy).
//!
//! Both are pure; a `Codec` holds only shared references and can be used
//! from many threads at once.
pub mod decode;
pub mod encode;

use serde_json::Value;

use crate::error::{DecodeError, SchemaError};
use crate::shape::{Registry, Shape};
use crate::value::TypedValue;

/// Matches serde_json's own parser recursion limit.
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy)]
pub struct CodecOptions {
    /// Deepest list/map/record nesting `decode` will descend into.
    pub max_depth: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Codec<'r> {
    registry: &'r Registry,
    options: CodecOptions,
}

impl<'r> Codec<'r> {
    /// Checks the registry once so decoding can rely on every ref resolving
    /// to something that consumes JSON.
    pub fn new(registry: &'r Registry) -> Result<Self, SchemaError> {
        Self::with_options(registry, CodecOptions::default())
    }

    pub fn with_options(registry: &'r Registry, options: CodecOptions) -> Result<Self, SchemaError> {
        registry.check()?;
        Ok(Self::from_checked(registry, options))
    }

    pub(crate) fn from_checked(registry: &'r Registry, options: CodecOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn options(&self) -> CodecOptions {
        self.options
    }

    pub fn decode(&self, shape: &Shape, json: &Value) -> Result<TypedValue, DecodeError> {
        self.decode_at(shape, json, 0)
    }

    pub fn encode(&self, value: &TypedValue) -> Value {
        encode::encode(value)
    }

    /// `encode(decode(json))`: the canonical form of `json` under `shape`,
    /// with unknown keys dropped and record fields in declaration order.
    pub fn normalize(&self, shape: &Shape, json: &Value) -> Result<Value, DecodeError> {
        self.decode(shape, json).map(|v| encode::encode(&v))
    }
}

/// Decode a shape that contains no `Ref`s.
pub fn decode(shape: &Shape, json: &Value) -> Result<TypedValue, DecodeError> {
    let registry = Registry::new();
    Codec::from_checked(&registry, CodecOptions::default()).decode(shape, json)
}

pub use encode::encode;
