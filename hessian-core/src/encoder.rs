//! Hessian stream writer.

use std::sync::Arc;

use crate::class_def::{ClassDefinition, ClassDefinitionCache, TypeNameCache};
use crate::config::CodecConfig;
use crate::constants::*;
use crate::data_output::{WireSink, WireWriter};
use crate::error::{HessianError, Result};
use crate::primitive;
use crate::refs::{Identity, ReferenceTable};
use crate::registry::TypeRegistry;
use crate::traits::Serializable;
use crate::value::Value;

/// Writes values to a Hessian 2.0 byte stream.
///
/// Successive [`encode`](Self::encode) calls append to one stream: class
/// definitions and type names written by an earlier call are referenced by
/// index in later ones, and reference numbering continues. An encoder must
/// not be shared between concurrent writers.
///
/// # Example
///
/// ```
/// use hessian_core::{Decoder, Encoder, Value};
///
/// let mut encoder = Encoder::new();
/// encoder.encode(&vec![1i32, 2, 3]).unwrap();
///
/// let mut decoder = Decoder::new(encoder.buffer());
/// let decoded: Vec<i32> = decoder.decode_as().unwrap();
/// assert_eq!(decoded, vec![1, 2, 3]);
/// ```
#[derive(Debug)]
pub struct Encoder {
    pub(crate) output: WireWriter,
    config: CodecConfig,
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) classes: ClassDefinitionCache,
    type_names: TypeNameCache,
    references: ReferenceTable,
    depth: usize,
}

impl Encoder {
    /// Creates an encoder with the default configuration and the global
    /// registry.
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    /// Creates an encoder with the given configuration and the global
    /// registry.
    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            output: WireWriter::new(),
            config,
            registry: TypeRegistry::global(),
            classes: ClassDefinitionCache::new(),
            type_names: TypeNameCache::default(),
            references: ReferenceTable::new(),
            depth: 0,
        }
    }

    /// Replaces the registry used to resolve object types.
    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Returns the registry used to resolve object types.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Appends one complete value to the stream.
    ///
    /// # Errors
    ///
    /// Fails with [`HessianError::UnencodableType`] for values without a
    /// Hessian form, [`HessianError::DepthExceeded`] past the configured
    /// nesting limit, and [`HessianError::Borrowed`] if a shared cell is
    /// mutably borrowed. The stream is unusable after an error until
    /// [`reset`](Self::reset).
    pub fn encode<T: Serializable + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.references.begin_value();
        self.depth = 0;
        value.serialize(self)
    }

    /// Returns the bytes written so far.
    pub fn buffer(&self) -> &[u8] {
        self.output.as_bytes()
    }

    /// Consumes the encoder and returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.output.into_bytes()
    }

    /// Takes the bytes written so far, keeping the stream state.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output).into_bytes()
    }

    /// Returns the class definitions written on this stream.
    pub fn class_definitions(&self) -> &[ClassDefinition] {
        self.classes.definitions()
    }

    /// Clears the buffer and all per-stream state.
    pub fn reset(&mut self) {
        self.output.clear();
        self.classes.reset();
        self.type_names.reset();
        self.references.reset();
        self.depth = 0;
    }

    /// Writes `null`.
    pub fn write_null(&mut self) {
        primitive::write_null(&mut self.output);
    }

    /// Writes a boolean.
    pub fn write_bool(&mut self, value: bool) {
        primitive::write_bool(&mut self.output, value);
    }

    /// Writes a 32-bit int.
    pub fn write_int(&mut self, value: i32) {
        primitive::write_int(&mut self.output, value);
    }

    /// Writes a 64-bit long.
    pub fn write_long(&mut self, value: i64) {
        primitive::write_long(&mut self.output, value);
    }

    /// Writes a double.
    pub fn write_double(&mut self, value: f64) {
        primitive::write_double(&mut self.output, value, self.config.compact_doubles());
    }

    /// Writes a string.
    pub fn write_string(&mut self, value: &str) {
        primitive::write_string(&mut self.output, value, self.config.chunk_size());
    }

    /// Writes a binary blob.
    pub fn write_binary(&mut self, value: &[u8]) {
        primitive::write_binary(&mut self.output, value, self.config.chunk_size());
    }

    /// Writes a date given in milliseconds since the epoch.
    pub fn write_date(&mut self, millis: i64) {
        primitive::write_date(&mut self.output, millis);
    }

    fn write_type(&mut self, name: &str) {
        match self.type_names.lookup_or_insert(name) {
            Some(index) => self.write_int(index as i32),
            None => self.write_string(name),
        }
    }

    /// Starts a list, map, or object. Returns false if the value was already
    /// written on this stream, in which case a back-reference has been
    /// written in its place.
    pub(crate) fn begin_composite(&mut self, identity: Option<Identity>) -> Result<bool> {
        match identity {
            Some(identity) => {
                let (index, seen) = self.references.intern(identity);
                if seen {
                    self.output.write_u8(BC_REF);
                    self.write_int(index as i32);
                    return Ok(false);
                }
            }
            None => {
                self.references.assign();
            }
        }
        self.depth += 1;
        if self.depth > self.config.max_depth() {
            return Err(HessianError::DepthExceeded(self.config.max_depth()));
        }
        Ok(true)
    }

    pub(crate) fn end_composite(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Writes a list. Typed lists carry `type_name`, such as `[int`.
    ///
    /// `identity` is the address of the shared native value the items come
    /// from, if any; a second write of the same identity becomes a
    /// back-reference.
    pub fn write_list<T: Serializable>(
        &mut self,
        type_name: Option<&str>,
        items: &[T],
        identity: Option<Identity>,
    ) -> Result<()> {
        let len = i32::try_from(items.len()).map_err(|_| {
            HessianError::UnencodableType(format!("list of {} elements", items.len()))
        })?;
        if !self.begin_composite(identity)? {
            return Ok(());
        }
        match type_name {
            Some(name) if items.len() <= LIST_DIRECT_MAX => {
                self.output.write_u8(BC_LIST_DIRECT + items.len() as u8);
                self.write_type(name);
            }
            Some(name) => {
                self.output.write_u8(BC_LIST_FIXED);
                self.write_type(name);
                self.write_int(len);
            }
            None if items.len() <= LIST_DIRECT_MAX => {
                self.output.write_u8(BC_LIST_DIRECT_UNTYPED + items.len() as u8);
            }
            None => {
                self.output.write_u8(BC_LIST_FIXED_UNTYPED);
                self.write_int(len);
            }
        }
        for item in items {
            item.serialize(self)?;
        }
        self.end_composite();
        Ok(())
    }

    /// Writes a map. Typed maps carry `type_name`.
    pub fn write_map<'a, K, V, I>(
        &mut self,
        type_name: Option<&str>,
        entries: I,
        identity: Option<Identity>,
    ) -> Result<()>
    where
        K: Serializable + ?Sized + 'a,
        V: Serializable + ?Sized + 'a,
        I: IntoIterator<Item = (&'a K, &'a V)>,
    {
        if !self.begin_composite(identity)? {
            return Ok(());
        }
        match type_name {
            Some(name) => {
                self.output.write_u8(BC_MAP);
                self.write_type(name);
            }
            None => self.output.write_u8(BC_MAP_UNTYPED),
        }
        for (key, value) in entries {
            key.serialize(self)?;
            value.serialize(self)?;
        }
        self.output.write_u8(BC_END);
        self.end_composite();
        Ok(())
    }

    /// Writes a dynamically typed value.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.write_null(),
            Value::Bool(v) => self.write_bool(*v),
            Value::Int(v) => self.write_int(*v),
            Value::Long(v) => self.write_long(*v),
            Value::Double(v) => self.write_double(*v),
            Value::String(v) => self.write_string(v),
            Value::Binary(v) => self.write_binary(v),
            Value::Date(v) => self.write_date(*v),
            Value::List(list) => {
                let list_ref = list
                    .try_borrow()
                    .map_err(|_| HessianError::Borrowed("list".to_string()))?;
                return self.write_list(list_ref.type_name.as_deref(), &list_ref.items, value.identity());
            }
            Value::Map(map) => {
                let map_ref = map
                    .try_borrow()
                    .map_err(|_| HessianError::Borrowed("map".to_string()))?;
                return self.write_map(
                    map_ref.type_name.as_deref(),
                    map_ref.entries().iter().map(|(k, v)| (k, v)),
                    value.identity(),
                );
            }
            Value::Object(object) => return object.binding().write(object, self),
        }
        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{List, Map};
    use std::rc::Rc;

    fn encoded<T: Serializable + ?Sized>(value: &T) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.encode(value).unwrap();
        encoder.into_bytes()
    }

    #[test]
    fn test_typed_short_list() {
        assert_eq!(
            encoded(&vec![0i32, 1]),
            [0x72, 0x04, b'[', b'i', b'n', b't', 0x90, 0x91]
        );
    }

    #[test]
    fn test_typed_long_list() {
        let bytes = encoded(&vec![0i32; 8]);
        assert_eq!(&bytes[..7], &[b'V', 0x04, b'[', b'i', b'n', b't', 0x98]);
        assert_eq!(bytes.len(), 7 + 8);
    }

    #[test]
    fn test_untyped_lists() {
        let short = Value::list(List::new(vec![Value::Int(0), Value::from("a")]));
        assert_eq!(encoded(&short), [0x7a, 0x90, 0x01, b'a']);

        let long = Value::list(List::new(vec![Value::Null; 8]));
        let bytes = encoded(&long);
        assert_eq!(&bytes[..2], &[0x58, 0x98]);
    }

    #[test]
    fn test_type_name_written_once() {
        let mut encoder = Encoder::new();
        encoder.encode(&vec![1i32]).unwrap();
        let first = encoder.buffer().len();
        encoder.encode(&vec![2i32]).unwrap();
        assert_eq!(&encoder.buffer()[first..], &[0x71, 0x90, 0x92]);
    }

    #[test]
    fn test_untyped_map() {
        let map: Map = vec![(Value::Int(1), Value::from("fee"))].into_iter().collect();
        assert_eq!(
            encoded(&Value::map(map)),
            [b'H', 0x91, 0x03, b'f', b'e', b'e', b'Z']
        );
    }

    #[test]
    fn test_typed_map() {
        let mut map = Map::typed("com.caucho.test.Car");
        map.insert(Value::from("a"), Value::Int(0));
        let bytes = encoded(&Value::map(map));
        assert_eq!(&bytes[..2], &[b'M', 0x13]);
        assert_eq!(bytes.last(), Some(&b'Z'));
    }

    #[test]
    fn test_bytes_are_binary() {
        assert_eq!(encoded(&vec![1u8, 2, 3]), [0x23, 1, 2, 3]);
    }

    #[test]
    fn test_shared_list_written_once() {
        let shared = Rc::new(vec![7i32]);
        let pair = vec![shared.clone(), shared];
        let bytes = encoded(&pair);
        // outer list takes index 0, the shared list index 1
        assert_eq!(bytes[bytes.len() - 2..], [BC_REF, 0x91]);
    }

    #[test]
    fn test_cyclic_value_list() {
        let list = Rc::new(std::cell::RefCell::new(List::default()));
        list.borrow_mut().items.push(Value::List(list.clone()));
        let bytes = encoded(&Value::List(list.clone()));
        assert_eq!(bytes, [0x79, BC_REF, 0x90]);
        list.borrow_mut().items.clear();
    }

    #[test]
    fn test_depth_limit() {
        let config = CodecConfig::builder().max_depth(2).build().unwrap();
        let mut encoder = Encoder::with_config(config);
        assert!(encoder.encode(&vec![vec![1i32]]).is_ok());
        assert!(matches!(
            encoder.encode(&vec![vec![vec![1i32]]]),
            Err(HessianError::DepthExceeded(2))
        ));
    }

    #[test]
    fn test_full_doubles_when_not_compact() {
        let config = CodecConfig::builder().compact_doubles(false).build().unwrap();
        let mut encoder = Encoder::with_config(config);
        encoder.encode(&1.0f64).unwrap();
        assert_eq!(encoder.buffer(), &[b'D', 0x3f, 0xf0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_reset_and_take_bytes() {
        let mut encoder = Encoder::new();
        encoder.encode(&vec![1i32]).unwrap();
        let taken = encoder.take_bytes();
        assert_eq!(taken[0], 0x71);
        assert!(encoder.buffer().is_empty());

        encoder.reset();
        encoder.encode(&vec![1i32]).unwrap();
        assert_eq!(encoder.buffer(), taken.as_slice());
    }

    #[test]
    fn test_mutably_borrowed_cell_fails() {
        let cell = Rc::new(std::cell::RefCell::new(5i32));
        let _guard = cell.borrow_mut();
        let mut encoder = Encoder::new();
        assert!(matches!(
            encoder.encode(&cell),
            Err(HessianError::Borrowed(_))
        ));
    }
}
