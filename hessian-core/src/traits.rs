//! Conversions between native Rust types and the Hessian data model.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::encoder::Encoder;
use crate::error::{HessianError, Result};
use crate::refs::Identity;
use crate::registry::TypeRegistry;
use crate::value::{shared_handle, Value};

/// A native type that can be written to a Hessian stream.
pub trait Serializable {
    /// Writes `self`.
    fn serialize(&self, encoder: &mut Encoder) -> Result<()>;

    /// Writes `self` as the value behind a shared pointer with the given
    /// identity. Lists, maps, and objects write a back-reference when the
    /// identity was already written; everything else ignores it.
    fn serialize_shared(&self, encoder: &mut Encoder, identity: Identity) -> Result<()> {
        let _ = identity;
        self.serialize(encoder)
    }

    /// Returns the type name slices of this type are written under, such as
    /// `[int`. `None` writes an untyped list.
    fn list_type_name() -> Option<Cow<'static, str>>
    where
        Self: Sized,
    {
        None
    }

    /// Writes a slice of this type.
    fn serialize_slice(items: &[Self], encoder: &mut Encoder, identity: Option<Identity>) -> Result<()>
    where
        Self: Sized,
    {
        let type_name = Self::list_type_name();
        encoder.write_list(type_name.as_deref(), items, identity)
    }
}

/// A native type that can be built from a decoded [`Value`].
///
/// `null` and missing values convert to the type's zero value.
pub trait Deserializable: Sized {
    /// Converts a decoded value.
    fn from_value(value: Value) -> Result<Self>;

    /// Converts a decoded value into a shared cell. Object types return the
    /// decoded instance itself, so every reference to it in the stream ends
    /// up pointing at one cell.
    fn from_shared(value: Value) -> Result<Rc<RefCell<Self>>> {
        Ok(Rc::new(RefCell::new(Self::from_value(value)?)))
    }

    /// Converts a decoded value into an `Rc`. Every conversion of one
    /// decoded list, map, or object returns the same `Rc`, built from the
    /// value's contents at the first conversion.
    fn rc_from_value(value: Value) -> Result<Rc<Self>>
    where
        Self: 'static,
    {
        shared_handle(value, |value| Self::from_value(value).map(Rc::new))
    }

    /// Converts a decoded value into an `Arc`, sharing one `Arc` per decoded
    /// list, map, or object like [`rc_from_value`](Self::rc_from_value).
    fn arc_from_value(value: Value) -> Result<Arc<Self>>
    where
        Self: 'static,
    {
        shared_handle(value, |value| Self::from_value(value).map(Arc::new))
    }

    /// Converts a decoded list into a `Vec`.
    fn vec_from_value(value: Value) -> Result<Vec<Self>> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::List(list) => {
                let items = list
                    .try_borrow()
                    .map_err(|_| HessianError::Borrowed("list".to_string()))?
                    .items
                    .clone();
                items.into_iter().map(Self::from_value).collect()
            }
            other => Err(HessianError::mismatch("list", other.kind())),
        }
    }

    /// Registers the object types this type can contain.
    fn register_types(registry: &TypeRegistry) -> Result<()> {
        let _ = registry;
        Ok(())
    }
}

macro_rules! int_impl {
    ($($ty:ty => $list:expr),* $(,)?) => {$(
        impl Serializable for $ty {
            fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
                encoder.write_int(i32::from(*self));
                Ok(())
            }

            fn list_type_name() -> Option<Cow<'static, str>> {
                Some(Cow::Borrowed($list))
            }
        }

        impl Deserializable for $ty {
            fn from_value(value: Value) -> Result<Self> {
                integer_from_value(value, stringify!($ty))
            }
        }
    )*};
}

macro_rules! long_impl {
    ($($ty:ty),* $(,)?) => {$(
        impl Serializable for $ty {
            fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
                let value = i64::try_from(*self).map_err(|_| {
                    HessianError::UnencodableType(format!("{} {} exceeds long range", stringify!($ty), self))
                })?;
                encoder.write_long(value);
                Ok(())
            }

            fn list_type_name() -> Option<Cow<'static, str>> {
                Some(Cow::Borrowed("[long"))
            }
        }

        impl Deserializable for $ty {
            fn from_value(value: Value) -> Result<Self> {
                integer_from_value(value, stringify!($ty))
            }
        }
    )*};
}

fn integer_from_value<T: TryFrom<i64> + Default>(value: Value, name: &str) -> Result<T> {
    match value {
        Value::Null => Ok(T::default()),
        Value::Int(v) => T::try_from(v as i64)
            .map_err(|_| HessianError::mismatch(name, format!("int {} out of range", v))),
        Value::Long(v) => T::try_from(v)
            .map_err(|_| HessianError::mismatch(name, format!("long {} out of range", v))),
        other => Err(HessianError::mismatch(name, other.kind())),
    }
}

int_impl!(i8 => "[byte", i16 => "[short", i32 => "[int", u16 => "[int");
long_impl!(i64, isize, u32, u64, usize);

impl Serializable for u8 {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_int(i32::from(*self));
        Ok(())
    }

    fn list_type_name() -> Option<Cow<'static, str>> {
        Some(Cow::Borrowed("[byte"))
    }

    fn serialize_slice(items: &[Self], encoder: &mut Encoder, _identity: Option<Identity>) -> Result<()> {
        encoder.write_binary(items);
        Ok(())
    }
}

impl Deserializable for u8 {
    fn from_value(value: Value) -> Result<Self> {
        integer_from_value(value, "u8")
    }

    fn vec_from_value(value: Value) -> Result<Vec<Self>> {
        match value {
            Value::Binary(bytes) => Ok(bytes),
            Value::Null => Ok(Vec::new()),
            Value::List(list) => {
                let items = list
                    .try_borrow()
                    .map_err(|_| HessianError::Borrowed("list".to_string()))?
                    .items
                    .clone();
                items.into_iter().map(u8::from_value).collect()
            }
            other => Err(HessianError::mismatch("binary", other.kind())),
        }
    }
}

impl Serializable for bool {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_bool(*self);
        Ok(())
    }

    fn list_type_name() -> Option<Cow<'static, str>> {
        Some(Cow::Borrowed("[boolean"))
    }
}

impl Deserializable for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(HessianError::mismatch("bool", other.kind())),
        }
    }
}

impl Serializable for f64 {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_double(*self);
        Ok(())
    }

    fn list_type_name() -> Option<Cow<'static, str>> {
        Some(Cow::Borrowed("[double"))
    }
}

impl Deserializable for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(0.0),
            other => other
                .as_f64()
                .ok_or_else(|| HessianError::mismatch("f64", other.kind())),
        }
    }
}

impl Serializable for f32 {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_double(f64::from(*self));
        Ok(())
    }

    fn list_type_name() -> Option<Cow<'static, str>> {
        Some(Cow::Borrowed("[float"))
    }
}

impl Deserializable for f32 {
    fn from_value(value: Value) -> Result<Self> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl Serializable for str {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_string(self);
        Ok(())
    }
}

impl Serializable for String {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_string(self);
        Ok(())
    }

    fn list_type_name() -> Option<Cow<'static, str>> {
        Some(Cow::Borrowed("[string"))
    }
}

impl Deserializable for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            Value::Null => Ok(String::new()),
            other => Err(HessianError::mismatch("string", other.kind())),
        }
    }
}

impl Serializable for char {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        let mut buf = [0u8; 4];
        encoder.write_string(self.encode_utf8(&mut buf));
        Ok(())
    }
}

impl Deserializable for char {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok('\0'),
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(HessianError::mismatch(
                        "char",
                        format!("string of length {}", s.chars().count()),
                    )),
                }
            }
            other => Err(HessianError::mismatch("char", other.kind())),
        }
    }
}

impl Serializable for SystemTime {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        let millis = match self.duration_since(UNIX_EPOCH) {
            Ok(after) => i64::try_from(after.as_millis()),
            Err(before) => i64::try_from(before.duration().as_millis()).map(|m| -m),
        }
        .map_err(|_| HessianError::UnencodableType(format!("{:?} exceeds date range", self)))?;
        encoder.write_date(millis);
        Ok(())
    }
}

impl Deserializable for SystemTime {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(UNIX_EPOCH),
            Value::Date(millis) => {
                let offset = Duration::from_millis(millis.unsigned_abs());
                let time = if millis >= 0 {
                    UNIX_EPOCH.checked_add(offset)
                } else {
                    UNIX_EPOCH.checked_sub(offset)
                };
                time.ok_or_else(|| HessianError::mismatch("SystemTime", format!("date {}", millis)))
            }
            other => Err(HessianError::mismatch("date", other.kind())),
        }
    }
}

impl Serializable for Value {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_value(self)
    }
}

impl Deserializable for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: Serializable> Serializable for [T] {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        T::serialize_slice(self, encoder, None)
    }

    fn serialize_shared(&self, encoder: &mut Encoder, identity: Identity) -> Result<()> {
        T::serialize_slice(self, encoder, Some(identity))
    }
}

impl<T: Serializable, const N: usize> Serializable for [T; N] {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        T::serialize_slice(self, encoder, None)
    }

    fn serialize_shared(&self, encoder: &mut Encoder, identity: Identity) -> Result<()> {
        T::serialize_slice(self, encoder, Some(identity))
    }
}

impl<T: Serializable> Serializable for Vec<T> {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        T::serialize_slice(self, encoder, None)
    }

    fn serialize_shared(&self, encoder: &mut Encoder, identity: Identity) -> Result<()> {
        T::serialize_slice(self, encoder, Some(identity))
    }
}

impl<T: Deserializable> Deserializable for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        T::vec_from_value(value)
    }

    fn register_types(registry: &TypeRegistry) -> Result<()> {
        T::register_types(registry)
    }
}

impl<T: Serializable> Serializable for Option<T> {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        match self {
            Some(value) => value.serialize(encoder),
            None => {
                encoder.write_null();
                Ok(())
            }
        }
    }

    fn serialize_shared(&self, encoder: &mut Encoder, identity: Identity) -> Result<()> {
        match self {
            Some(value) => value.serialize_shared(encoder, identity),
            None => self.serialize(encoder),
        }
    }

    fn list_type_name() -> Option<Cow<'static, str>> {
        T::list_type_name()
    }
}

impl<T: Deserializable> Deserializable for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn register_types(registry: &TypeRegistry) -> Result<()> {
        T::register_types(registry)
    }
}

impl<T: Serializable> Serializable for Box<T> {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        (**self).serialize(encoder)
    }

    fn list_type_name() -> Option<Cow<'static, str>> {
        T::list_type_name()
    }
}

impl<T: Deserializable> Deserializable for Box<T> {
    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }

    fn register_types(registry: &TypeRegistry) -> Result<()> {
        T::register_types(registry)
    }
}

impl<T: Serializable> Serializable for Rc<T> {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        (**self).serialize_shared(encoder, Identity::of(Rc::as_ptr(self)))
    }

    fn list_type_name() -> Option<Cow<'static, str>> {
        T::list_type_name()
    }
}

impl<T: Deserializable + 'static> Deserializable for Rc<T> {
    fn from_value(value: Value) -> Result<Self> {
        T::rc_from_value(value)
    }

    fn register_types(registry: &TypeRegistry) -> Result<()> {
        T::register_types(registry)
    }
}

impl<T: Serializable> Serializable for Arc<T> {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        (**self).serialize_shared(encoder, Identity::of(Arc::as_ptr(self)))
    }

    fn list_type_name() -> Option<Cow<'static, str>> {
        T::list_type_name()
    }
}

impl<T: Deserializable + 'static> Deserializable for Arc<T> {
    fn from_value(value: Value) -> Result<Self> {
        T::arc_from_value(value)
    }

    fn register_types(registry: &TypeRegistry) -> Result<()> {
        T::register_types(registry)
    }
}

impl<T: Serializable> Serializable for RefCell<T> {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        self.try_borrow()
            .map_err(|_| HessianError::Borrowed(std::any::type_name::<T>().to_string()))?
            .serialize(encoder)
    }

    fn serialize_shared(&self, encoder: &mut Encoder, identity: Identity) -> Result<()> {
        self.try_borrow()
            .map_err(|_| HessianError::Borrowed(std::any::type_name::<T>().to_string()))?
            .serialize_shared(encoder, identity)
    }

    fn list_type_name() -> Option<Cow<'static, str>> {
        T::list_type_name()
    }
}

impl<T: Deserializable> Deserializable for RefCell<T> {
    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(RefCell::new)
    }

    fn rc_from_value(value: Value) -> Result<Rc<Self>>
    where
        Self: 'static,
    {
        T::from_shared(value)
    }

    fn register_types(registry: &TypeRegistry) -> Result<()> {
        T::register_types(registry)
    }
}

impl<K: Serializable, V: Serializable, S> Serializable for HashMap<K, V, S> {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_map(None, self.iter(), None)
    }

    fn serialize_shared(&self, encoder: &mut Encoder, identity: Identity) -> Result<()> {
        encoder.write_map(None, self.iter(), Some(identity))
    }
}

impl<K, V, S> Deserializable for HashMap<K, V, S>
where
    K: Deserializable + Eq + Hash,
    V: Deserializable,
    S: BuildHasher + Default,
{
    fn from_value(value: Value) -> Result<Self> {
        map_entries(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }

    fn register_types(registry: &TypeRegistry) -> Result<()> {
        K::register_types(registry)?;
        V::register_types(registry)
    }
}

impl<K: Serializable, V: Serializable> Serializable for BTreeMap<K, V> {
    fn serialize(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_map(None, self.iter(), None)
    }

    fn serialize_shared(&self, encoder: &mut Encoder, identity: Identity) -> Result<()> {
        encoder.write_map(None, self.iter(), Some(identity))
    }
}

impl<K, V> Deserializable for BTreeMap<K, V>
where
    K: Deserializable + Ord,
    V: Deserializable,
{
    fn from_value(value: Value) -> Result<Self> {
        map_entries(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }

    fn register_types(registry: &TypeRegistry) -> Result<()> {
        K::register_types(registry)?;
        V::register_types(registry)
    }
}

fn map_entries(value: Value) -> Result<Vec<(Value, Value)>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Map(map) => Ok(map
            .try_borrow()
            .map_err(|_| HessianError::Borrowed("map".to_string()))?
            .entries()
            .to_vec()),
        other => Err(HessianError::mismatch("map", other.kind())),
    }
}
