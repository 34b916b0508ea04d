//! Named objects on the wire: class definition records, object headers, and
//! conversion between decoded objects and native types.

use std::cell::RefCell;
use std::rc::Rc;

use crate::class_def::ClassDefinition;
use crate::constants::*;
use crate::data_input::WireSource;
use crate::data_output::WireSink;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{HessianError, Result};
use crate::refs::Identity;
use crate::registry::{ClassBinding, HessianObject, TypeDescriptor};
use crate::value::{Object, Value};

impl Encoder {
    /// Writes `value` as a Hessian object, emitting its class definition the
    /// first time its class appears on this stream.
    ///
    /// `identity` is the address of the shared cell holding `value`, if any;
    /// a second write of the same identity becomes a back-reference.
    pub fn write_object<T: HessianObject>(&mut self, value: &T, identity: Option<Identity>) -> Result<()> {
        let descriptor = self.registry.resolve::<T>()?;
        self.write_described(&descriptor, value, identity)
    }

    pub(crate) fn write_described<T: HessianObject>(
        &mut self,
        descriptor: &TypeDescriptor<T>,
        value: &T,
        identity: Option<Identity>,
    ) -> Result<()> {
        if !self.begin_composite(identity)? {
            return Ok(());
        }

        let class_name = descriptor.class_name();
        let (index, created) = self.classes.get_or_create(class_name, descriptor.field_names())?;
        if created {
            tracing::trace!(
                class = class_name,
                index,
                fields = descriptor.field_names().len(),
                "writing class definition"
            );
            self.output.write_u8(BC_OBJECT_DEF);
            self.write_string(class_name);
            self.write_int(descriptor.field_names().len() as i32);
            for name in descriptor.field_names() {
                self.write_string(name);
            }
        }

        if index <= OBJECT_DIRECT_MAX {
            self.output.write_u8(BC_OBJECT_DIRECT + index as u8);
        } else {
            self.output.write_u8(BC_OBJECT);
            self.write_int(index as i32);
        }

        for field in descriptor.fields() {
            field.write(value, self)?;
        }
        self.end_composite();
        Ok(())
    }
}

impl Decoder<'_> {
    /// Reads a `C` record and registers it at the next definition index.
    pub(crate) fn read_class_definition(&mut self) -> Result<()> {
        let class_name = self.read_string_arg()?;
        let count = self.read_length()?;
        let mut field_names = Vec::with_capacity(count.min(self.input.remaining()));
        for _ in 0..count {
            field_names.push(self.read_string_arg()?);
        }
        tracing::trace!(
            class = %class_name,
            index = self.classes.len(),
            fields = field_names.len(),
            "read class definition"
        );
        self.classes.register(ClassDefinition::new(class_name, field_names));
        Ok(())
    }

    /// Reads the fields of an object whose header named definition `index`.
    pub(crate) fn read_object(&mut self, index: i64) -> Result<Value> {
        let resolved = self.classes.resolve(index, &self.registry)?;
        self.enter()?;

        let object = Object::from_parts(resolved.binding.instantiate(), resolved.binding.clone());
        let slot = self.references.reserve();
        self.references.bind(slot, Value::Object(object.clone()));

        for target in resolved.slots.iter() {
            let value = self.read_value()?;
            if let Some(field) = *target {
                resolved.binding.assign(&object, field, value)?;
            }
        }
        self.leave();
        Ok(Value::Object(object))
    }
}

/// Converts a decoded value into an owned `T`.
///
/// `null` becomes `T::default()`. The object's fields are cloned out of the
/// shared cell, so other references to it in the stream are not affected.
pub fn object_from_value<T: HessianObject>(value: Value) -> Result<T> {
    match value {
        Value::Null => Ok(T::default()),
        Value::Object(object) => {
            let cell = object.cell::<T>()?;
            let borrowed = cell
                .try_borrow()
                .map_err(|_| HessianError::Borrowed(T::java_class_name().to_string()))?;
            Ok(borrowed.clone())
        }
        other => Err(HessianError::mismatch(T::java_class_name(), other.kind())),
    }
}

/// Converts a decoded value into the shared cell the decoder allocated for
/// it, so every reference to one object yields the same `Rc`.
pub fn object_from_shared<T: HessianObject>(value: Value) -> Result<Rc<RefCell<T>>> {
    match value {
        Value::Null => Ok(Rc::new(RefCell::new(T::default()))),
        Value::Object(object) => object
            .downcast::<T>()
            .ok_or_else(|| HessianError::mismatch(T::java_class_name(), object.class_name())),
        other => Err(HessianError::mismatch(T::java_class_name(), other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;
    use crate::traits::Deserializable;
    use hessian_derive::Hessian;
    use std::sync::Arc;

    #[derive(Debug, Clone, Default, PartialEq, Hessian)]
    #[hessian(class_name = "example.Car")]
    struct Car {
        pub color: String,
        pub model: String,
    }

    #[derive(Debug, Clone, Default, Hessian)]
    #[hessian(class_name = "example.Node")]
    struct Node {
        pub value: i32,
        pub next: Option<Rc<RefCell<Node>>>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Hessian)]
    #[hessian(class_name = "example.CarV2")]
    struct CarV2 {
        pub color: String,
    }

    fn encoder(registry: &Arc<TypeRegistry>) -> Encoder {
        Encoder::new().with_registry(registry.clone())
    }

    fn car(color: &str, model: &str) -> Car {
        Car {
            color: color.to_string(),
            model: model.to_string(),
        }
    }

    #[rustfmt::skip]
    const CAR_BYTES: &[u8] = &[
        b'C', 0x0b, b'e', b'x', b'a', b'm', b'p', b'l', b'e', b'.', b'C', b'a', b'r',
        0x92,
        0x05, b'c', b'o', b'l', b'o', b'r',
        0x05, b'm', b'o', b'd', b'e', b'l',
        0x60,
        0x03, b'r', b'e', b'd',
        0x08, b'c', b'o', b'r', b'v', b'e', b't', b't', b'e',
    ];

    #[test]
    fn test_object_wire_form() {
        let registry = Arc::new(TypeRegistry::new());
        let mut encoder = encoder(&registry);
        encoder.write_object(&car("red", "corvette"), None).unwrap();
        assert_eq!(encoder.buffer(), CAR_BYTES);
    }

    #[test]
    fn test_second_object_reuses_definition() {
        let registry = Arc::new(TypeRegistry::new());
        let mut encoder = encoder(&registry);
        encoder.write_object(&car("red", "corvette"), None).unwrap();
        let first = encoder.buffer().len();
        encoder.write_object(&car("green", "civic"), None).unwrap();
        let tail = &encoder.buffer()[first..];
        assert_eq!(tail[0], 0x60);
        assert_eq!(&tail[1..7], &[0x05, b'g', b'r', b'e', b'e', b'n']);
        assert_eq!(encoder.class_definitions().len(), 1);
    }

    #[test]
    fn test_decode_object() {
        let registry = Arc::new(TypeRegistry::new());
        registry.register::<Car>().unwrap();
        let mut decoder = Decoder::new(CAR_BYTES).with_registry(registry);
        let value = decoder.decode().unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.class_name(), "example.Car");
        assert!(object.is::<Car>());
        assert_eq!(object_from_value::<Car>(value).unwrap(), car("red", "corvette"));
    }

    #[test]
    fn test_long_object_header() {
        let registry = Arc::new(TypeRegistry::new());
        let mut encoder = encoder(&registry);
        // Occupy indices 0..=15 with placeholder definitions.
        for i in 0..16 {
            encoder
                .classes
                .get_or_create(&format!("pad.Class{}", i), &[])
                .unwrap();
        }
        encoder.write_object(&car("red", "mini"), None).unwrap();
        // header, then "red" and "mini"
        let bytes = encoder.buffer();
        assert_eq!(&bytes[bytes.len() - 11..bytes.len() - 9], &[b'O', 0xa0]);
    }

    #[test]
    fn test_unknown_class() {
        let registry = Arc::new(TypeRegistry::new());
        let mut decoder = Decoder::new(CAR_BYTES).with_registry(registry);
        assert!(matches!(
            decoder.decode(),
            Err(HessianError::UnknownClassIdentity(name)) if name == "example.Car"
        ));
    }

    #[test]
    fn test_header_before_definition() {
        let registry = Arc::new(TypeRegistry::new());
        let mut decoder = Decoder::new(&[0x61]).with_registry(registry);
        assert!(matches!(
            decoder.decode(),
            Err(HessianError::InvalidReference { index: 1, len: 0, .. })
        ));
    }

    #[test]
    fn test_extra_wire_fields_are_skipped() {
        let registry = Arc::new(TypeRegistry::new());
        registry.register::<CarV2>().unwrap();
        let mut bytes = CAR_BYTES.to_vec();
        bytes.splice(13..13, [b'V', b'2']);
        bytes[1] = 0x0d;
        let mut decoder = Decoder::new(&bytes).with_registry(registry);
        let decoded: CarV2 = object_from_value(decoder.decode().unwrap()).unwrap();
        assert_eq!(decoded.color, "red");
        assert_eq!(decoder.remaining(), 0);
    }

    #[test]
    fn test_missing_wire_fields_stay_default() {
        let registry = Arc::new(TypeRegistry::new());
        registry.register::<Car>().unwrap();
        #[rustfmt::skip]
        let bytes = [
            b'C', 0x0b, b'e', b'x', b'a', b'm', b'p', b'l', b'e', b'.', b'C', b'a', b'r',
            0x91, 0x05, b'm', b'o', b'd', b'e', b'l',
            0x60, 0x04, b'm', b'i', b'n', b'i',
        ];
        let mut decoder = Decoder::new(&bytes).with_registry(registry);
        let decoded: Car = object_from_value(decoder.decode().unwrap()).unwrap();
        assert_eq!(decoded, car("", "mini"));
    }

    #[test]
    fn test_self_referencing_object() {
        let registry = Arc::new(TypeRegistry::new());
        registry.register::<Node>().unwrap();
        let node = Rc::new(RefCell::new(Node {
            value: 7,
            next: None,
        }));
        node.borrow_mut().next = Some(node.clone());

        let mut encoder = encoder(&registry);
        encoder.encode(&node).unwrap();
        // next is written as a back-reference to the node itself
        assert_eq!(&encoder.buffer()[encoder.buffer().len() - 2..], &[b'Q', 0x90]);
        node.borrow_mut().next = None;

        let mut decoder = Decoder::new(encoder.buffer()).with_registry(registry);
        let decoded = Rc::<RefCell<Node>>::from_value(decoder.decode().unwrap()).unwrap();
        let next = decoded.borrow().next.clone().unwrap();
        assert!(Rc::ptr_eq(&decoded, &next));
        assert_eq!(next.borrow().value, 7);
        decoded.borrow_mut().next = None;
    }

    #[test]
    fn test_conversion_errors() {
        assert!(matches!(
            object_from_value::<Car>(Value::Int(1)),
            Err(HessianError::TypeMismatch { .. })
        ));
        assert_eq!(object_from_value::<Car>(Value::Null).unwrap(), Car::default());

        let registry = TypeRegistry::new();
        let other = Object::new(Rc::new(RefCell::new(CarV2::default())), &registry).unwrap();
        assert!(object_from_shared::<Car>(Value::Object(other.clone())).is_err());
        assert!(object_from_value::<Car>(Value::Object(other)).is_err());
    }
}
