//! Hessian 2.0 binary serialization for exchanging objects with JVM peers.
//!
//! Native structs are mapped onto Java classes with `#[derive(Hessian)]`
//! from `hessian-derive`, then written with an [`Encoder`] and read back with
//! a [`Decoder`], either into the dynamic [`Value`] model or straight into a
//! native type.
//!
//! ```
//! use hessian_core::{from_bytes_as, to_bytes};
//! use std::collections::BTreeMap;
//!
//! let mut scores = BTreeMap::new();
//! scores.insert("ada".to_string(), 36i32);
//! let bytes = to_bytes(&scores).unwrap();
//! let back: BTreeMap<String, i32> = from_bytes_as(&bytes).unwrap();
//! assert_eq!(back, scores);
//! ```

#![warn(missing_docs)]

// Derived impls name this crate by its external path.
extern crate self as hessian_core;

pub mod class_def;
pub mod config;
pub mod constants;
pub mod data_input;
pub mod data_output;
pub mod decoder;
pub mod encoder;
pub mod error;
mod object;
pub mod primitive;
pub mod refs;
pub mod registry;
pub mod traits;
pub mod value;

pub use config::{CodecConfig, CodecConfigBuilder, ConfigError};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{HessianError, ReferenceKind, Result};
pub use object::{object_from_shared, object_from_value};
pub use refs::Identity;
pub use registry::{ClassBinding, FieldLayout, HessianObject, JavaClass, TypeRegistry};
pub use traits::{Deserializable, Serializable};
pub use value::{List, Map, Object, Value};

/// Encodes one value into a fresh stream.
pub fn to_bytes<T: Serializable + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// Decodes exactly one value from `bytes`.
///
/// # Errors
///
/// Besides the decoder's own errors, returns [`HessianError::TrailingBytes`]
/// if input is left after the value.
pub fn from_bytes(bytes: &[u8]) -> Result<Value> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.decode()?;
    finish(&decoder)?;
    Ok(value)
}

/// Decodes exactly one value from `bytes` into `T`.
pub fn from_bytes_as<T: Deserializable>(bytes: &[u8]) -> Result<T> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.decode_as()?;
    finish(&decoder)?;
    Ok(value)
}

fn finish(decoder: &Decoder<'_>) -> Result<()> {
    match decoder.remaining() {
        0 => Ok(()),
        left => Err(HessianError::TrailingBytes(left)),
    }
}
