//! Hessian stream reader.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::class_def::{ClassDefinitionTable, TypeNameTable};
use crate::config::CodecConfig;
use crate::constants::*;
use crate::data_input::{WireReader, WireSource};
use crate::error::{HessianError, Result};
use crate::primitive::{self, is_int_tag, is_long_tag, is_string_tag, malformed};
use crate::refs::ReferenceSlots;
use crate::registry::TypeRegistry;
use crate::traits::Deserializable;
use crate::value::{List, Map, Value};

/// Reads values from a Hessian 2.0 byte stream.
///
/// Successive [`decode`](Self::decode) calls read consecutive values of one
/// stream, sharing class definitions, type names, and references.
#[derive(Debug)]
pub struct Decoder<'a> {
    pub(crate) input: WireReader<'a>,
    config: CodecConfig,
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) classes: ClassDefinitionTable,
    type_names: TypeNameTable,
    pub(crate) references: ReferenceSlots,
    depth: usize,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over `data` with the default configuration and the
    /// global registry.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, CodecConfig::default())
    }

    /// Creates a decoder over `data` with the given configuration and the
    /// global registry.
    pub fn with_config(data: &'a [u8], config: CodecConfig) -> Self {
        Self {
            input: WireReader::new(data),
            config,
            registry: TypeRegistry::global(),
            classes: ClassDefinitionTable::new(),
            type_names: TypeNameTable::default(),
            references: ReferenceSlots::new(),
            depth: 0,
        }
    }

    /// Replaces the registry used to resolve class names.
    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Returns the registry used to resolve class names.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.input.remaining()
    }

    /// Returns the offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.input.position()
    }

    /// Returns the class definitions read on this stream.
    pub fn class_definitions(&self) -> &ClassDefinitionTable {
        &self.classes
    }

    /// Clears the per-stream tables. The read position is kept.
    pub fn reset(&mut self) {
        self.classes.reset();
        self.type_names.reset();
        self.references.reset();
        self.depth = 0;
    }

    /// Reads the next complete value.
    ///
    /// Back-references are resolved to the shared handle already decoded, so
    /// the result may contain `Rc` cycles. They stay alive after the decoder
    /// is dropped until broken, for example with [`Value::dismantle`].
    ///
    /// # Errors
    ///
    /// Fails with [`HessianError::MalformedTag`], [`HessianError::TruncatedInput`],
    /// [`HessianError::UnknownClassIdentity`], or [`HessianError::InvalidReference`]
    /// when the stream is not a valid value, and with
    /// [`HessianError::DepthExceeded`] past the configured nesting limit.
    pub fn decode(&mut self) -> Result<Value> {
        self.depth = 0;
        self.read_value()
    }

    /// Reads the next value and converts it to `T`, registering the object
    /// types `T` can contain first.
    pub fn decode_as<T: Deserializable>(&mut self) -> Result<T> {
        T::register_types(&self.registry)?;
        T::from_value(self.decode()?)
    }

    pub(crate) fn read_value(&mut self) -> Result<Value> {
        let mut tag = self.input.read_u8()?;
        while tag == BC_OBJECT_DEF {
            self.read_class_definition()?;
            tag = self.input.read_u8()?;
        }

        match tag {
            BC_NULL => Ok(Value::Null),
            BC_TRUE => Ok(Value::Bool(true)),
            BC_FALSE => Ok(Value::Bool(false)),

            0x80..=0xd7 | BC_INT => primitive::read_int(&mut self.input, tag).map(Value::Int),
            0xd8..=0xff | 0x38..=0x3f | BC_LONG_INT | BC_LONG => {
                primitive::read_long(&mut self.input, tag).map(Value::Long)
            }
            BC_DOUBLE_ZERO..=BC_DOUBLE_MILL | BC_DOUBLE => {
                primitive::read_double(&mut self.input, tag).map(Value::Double)
            }
            BC_DATE | BC_DATE_MINUTE => primitive::read_date(&mut self.input, tag).map(Value::Date),
            0x00..=0x1f | 0x30..=0x33 | BC_STRING | BC_STRING_CHUNK => {
                primitive::read_string(&mut self.input, tag).map(Value::String)
            }
            0x20..=0x2f | 0x34..=0x37 | BC_BINARY | BC_BINARY_CHUNK => {
                primitive::read_binary(&mut self.input, tag).map(Value::Binary)
            }

            0x70..=0x77 => {
                let type_name = self.read_type()?;
                self.read_fixed_list(Some(type_name), (tag - BC_LIST_DIRECT) as usize)
            }
            0x78..=0x7f => self.read_fixed_list(None, (tag - BC_LIST_DIRECT_UNTYPED) as usize),
            BC_LIST_FIXED => {
                let type_name = self.read_type()?;
                let len = self.read_length()?;
                self.read_fixed_list(Some(type_name), len)
            }
            BC_LIST_FIXED_UNTYPED => {
                let len = self.read_length()?;
                self.read_fixed_list(None, len)
            }
            BC_LIST_VARIABLE => {
                let type_name = self.read_type()?;
                self.read_variable_list(Some(type_name))
            }
            BC_LIST_VARIABLE_UNTYPED => self.read_variable_list(None),

            BC_MAP => {
                let type_name = self.read_type()?;
                self.read_map(Some(type_name))
            }
            BC_MAP_UNTYPED => self.read_map(None),

            0x60..=0x6f => self.read_object((tag - BC_OBJECT_DIRECT) as i64),
            BC_OBJECT => {
                let index = self.read_int_arg()?;
                self.read_object(index)
            }

            BC_REF => {
                let index = self.read_int_arg()?;
                self.references.resolve_reference(index)
            }

            _ => Err(malformed(&self.input, tag)),
        }
    }

    /// Reads an int or long used as a length or index.
    pub(crate) fn read_int_arg(&mut self) -> Result<i64> {
        let tag = self.input.read_u8()?;
        if is_int_tag(tag) {
            primitive::read_int(&mut self.input, tag).map(i64::from)
        } else if is_long_tag(tag) {
            primitive::read_long(&mut self.input, tag)
        } else {
            Err(malformed(&self.input, tag))
        }
    }

    pub(crate) fn read_length(&mut self) -> Result<usize> {
        let len = self.read_int_arg()?;
        usize::try_from(len).map_err(|_| HessianError::mismatch("length", format!("{}", len)))
    }

    pub(crate) fn read_string_arg(&mut self) -> Result<String> {
        let tag = self.input.read_u8()?;
        if !is_string_tag(tag) {
            return Err(malformed(&self.input, tag));
        }
        primitive::read_string(&mut self.input, tag)
    }

    /// Reads a type name given inline or as an index into the type table.
    fn read_type(&mut self) -> Result<String> {
        let tag = self.input.read_u8()?;
        if is_string_tag(tag) {
            let name = primitive::read_string(&mut self.input, tag)?;
            self.type_names.push(name.clone());
            Ok(name)
        } else if is_int_tag(tag) {
            let index = primitive::read_int(&mut self.input, tag)?;
            self.type_names.get(i64::from(index)).map(str::to_string)
        } else {
            Err(malformed(&self.input, tag))
        }
    }

    pub(crate) fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.config.max_depth() {
            return Err(HessianError::DepthExceeded(self.config.max_depth()));
        }
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn at_end(&self) -> Result<bool> {
        Ok(self.input.peek_u8()? == BC_END)
    }

    fn read_fixed_list(&mut self, type_name: Option<String>, len: usize) -> Result<Value> {
        self.enter()?;
        let cell = Rc::new(RefCell::new(List::default()));
        let index = self.references.reserve();
        self.references.bind(index, Value::List(cell.clone()));

        let mut items = Vec::with_capacity(len.min(self.input.remaining()));
        for _ in 0..len {
            items.push(self.read_value()?);
        }
        fill_list(&cell, type_name, items)?;
        self.leave();
        Ok(Value::List(cell))
    }

    fn read_variable_list(&mut self, type_name: Option<String>) -> Result<Value> {
        self.enter()?;
        let cell = Rc::new(RefCell::new(List::default()));
        let index = self.references.reserve();
        self.references.bind(index, Value::List(cell.clone()));

        let mut items = Vec::new();
        while !self.at_end()? {
            items.push(self.read_value()?);
        }
        self.input.read_u8()?;
        fill_list(&cell, type_name, items)?;
        self.leave();
        Ok(Value::List(cell))
    }

    fn read_map(&mut self, type_name: Option<String>) -> Result<Value> {
        self.enter()?;
        let cell = Rc::new(RefCell::new(Map::new()));
        let index = self.references.reserve();
        self.references.bind(index, Value::Map(cell.clone()));

        let mut map = match type_name {
            Some(name) => Map::typed(name),
            None => Map::new(),
        };
        while !self.at_end()? {
            let key = self.read_value()?;
            let value = self.read_value()?;
            map.insert(key, value);
        }
        self.input.read_u8()?;
        fill(&cell, map, "map")?;
        self.leave();
        Ok(Value::Map(cell))
    }
}

fn fill_list(cell: &RefCell<List>, type_name: Option<String>, items: Vec<Value>) -> Result<()> {
    let mut list = cell
        .try_borrow_mut()
        .map_err(|_| HessianError::Borrowed("list".to_string()))?;
    list.type_name = type_name;
    list.items = items;
    Ok(())
}

fn fill<T>(cell: &RefCell<T>, contents: T, what: &str) -> Result<()> {
    let mut slot = cell
        .try_borrow_mut()
        .map_err(|_| HessianError::Borrowed(what.to_string()))?;
    *slot = contents;
    Ok(())
}
