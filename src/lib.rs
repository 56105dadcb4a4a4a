//! Shape-directed JSON codec.
//!
//! A [`Shape`] describes a declared type (primitive, optional, list, map,
//! ordered union, record, or a by-name reference for recursion). A [`Codec`]
//! walks a shape and a `serde_json::Value` together to produce a
//! [`TypedValue`], and turns typed values back into JSON.
//!
//! ```
//! use json_shape::{codec, RecordShape, Shape};
//! use serde_json::json;
//!
//! let shape = Shape::record(
//!     RecordShape::new("Point")
//!         .field("x", Shape::integer())
//!         .field("y", Shape::integer()),
//! );
//! let value = codec::decode(&shape, &json!({"y": 2, "x": 1, "z": 3})).unwrap();
//! assert_eq!(codec::encode(&value).to_string(), r#"{"x":1,"y":2}"#);
//! ```
pub mod codec;
pub mod error;
pub mod lower;
pub mod path_de;
pub mod schema;
pub mod shape;
pub mod value;

pub use codec::{Codec, CodecOptions, DEFAULT_MAX_DEPTH};
pub use error::{DecodeError, SchemaError};
pub use schema::{Schema, SchemaDoc};
pub use shape::{Field, PrimitiveKind, RecordShape, Registry, Shape};
pub use value::{FieldValue, RecordValue, TypedValue};
