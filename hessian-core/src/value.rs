//! Dynamically typed values produced by the decoder.
//!
//! Lists, maps, and objects are shared handles: two places in a decoded graph
//! that were one value in the stream hold clones of one `Rc`, and cycles are
//! closed through those handles. Objects keep their registered native type,
//! which [`Object::downcast`] recovers.
//!
//! A cyclic graph is an `Rc` cycle and is never freed on its own. Call
//! [`Value::dismantle`] on a decoded value once it is no longer needed if the
//! stream may contain cycles.

use std::any::Any;
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::thread::LocalKey;

use crate::error::{HessianError, Result};
use crate::refs::Identity;
use crate::registry::{ClassBinding, HessianObject, TypeRegistry};

/// A shared list handle.
pub type ListRef = Rc<RefCell<List>>;

/// A shared map handle.
pub type MapRef = Rc<RefCell<Map>>;

/// An ordered sequence, optionally tagged with a type name.
#[derive(Clone, Default)]
pub struct List {
    /// Type name carried by typed lists, such as `[int`.
    pub type_name: Option<String>,
    /// The elements in stream order.
    pub items: Vec<Value>,
    conversions: Conversions,
}

impl List {
    /// Creates an untyped list.
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            type_name: None,
            items,
            conversions: Conversions::default(),
        }
    }

    /// Creates a typed list.
    pub fn typed(type_name: impl Into<String>, items: Vec<Value>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            items,
            conversions: Conversions::default(),
        }
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.items == other.items
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("type_name", &self.type_name)
            .field("items", &self.items)
            .finish()
    }
}

/// A key-unique mapping that keeps insertion order.
///
/// Scalar keys match by value, with doubles compared by bit pattern after
/// folding `-0.0` into `0.0`. Lists, maps, and objects used as keys match by
/// identity. Lookups and inserts are constant time.
#[derive(Clone, Default)]
pub struct Map {
    /// Type name carried by typed maps.
    pub type_name: Option<String>,
    entries: Vec<(Value, Value)>,
    index: HashMap<MapKey, usize>,
    conversions: Conversions,
}

impl Map {
    /// Creates an empty untyped map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty typed map.
    pub fn typed(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    /// Inserts an entry, returning the value it replaced.
    ///
    /// A replaced entry keeps its original position.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.index.entry(MapKey::of(&key)) {
            Entry::Occupied(slot) => {
                let (_, current) = &mut self.entries[*slot.get()];
                Some(std::mem::replace(current, value))
            }
            Entry::Vacant(slot) => {
                slot.insert(self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.lookup(&MapKey::of(key))
    }

    /// Returns the value stored under a string key.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.lookup(&MapKey::String(key.to_owned()))
    }

    fn lookup(&self, key: &MapKey) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Returns the entries in insertion order.
    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns every entry.
    pub fn take_entries(&mut self) -> Vec<(Value, Value)> {
        self.index.clear();
        std::mem::take(&mut self.entries)
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.entries == other.entries
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("type_name", &self.type_name)
            .field("entries", &self.entries)
            .finish()
    }
}

/// Hash key of a map entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MapKey {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(u64),
    String(String),
    Binary(Vec<u8>),
    Date(i64),
    Shared(Identity),
}

impl MapKey {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => MapKey::Null,
            Value::Bool(v) => MapKey::Bool(*v),
            Value::Int(v) => MapKey::Int(*v),
            Value::Long(v) => MapKey::Long(*v),
            Value::Double(v) if *v == 0.0 => MapKey::Double(0),
            Value::Double(v) => MapKey::Double(v.to_bits()),
            Value::String(v) => MapKey::String(v.clone()),
            Value::Binary(v) => MapKey::Binary(v.clone()),
            Value::Date(v) => MapKey::Date(*v),
            Value::List(l) => MapKey::Shared(Identity::of(Rc::as_ptr(l))),
            Value::Map(m) => MapKey::Shared(Identity::of(Rc::as_ptr(m))),
            Value::Object(o) => MapKey::Shared(o.identity()),
        }
    }
}

impl FromIterator<(Value, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// An instance of a registered native type.
///
/// The instance lives in an `Rc<RefCell<T>>`; the binding knows `T` and
/// carries the class name and field layout.
pub struct Object {
    inner: Rc<dyn Any>,
    binding: Arc<dyn ClassBinding>,
    conversions: Conversions,
}

impl Clone for Object {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            binding: self.binding.clone(),
            conversions: self.conversions.share(),
        }
    }
}

impl Object {
    /// Wraps a shared native value, resolving its binding in `registry`.
    pub fn new<T: HessianObject>(value: Rc<RefCell<T>>, registry: &TypeRegistry) -> Result<Self> {
        let binding: Arc<dyn ClassBinding> = registry.resolve::<T>()?;
        Ok(Self::from_parts(value, binding))
    }

    pub(crate) fn from_parts(inner: Rc<dyn Any>, binding: Arc<dyn ClassBinding>) -> Self {
        Self {
            inner,
            binding,
            conversions: Conversions::default(),
        }
    }

    /// Returns the class name the object was written under.
    pub fn class_name(&self) -> &str {
        self.binding.class_name()
    }

    /// Returns the binding for the object's native type.
    pub fn binding(&self) -> &Arc<dyn ClassBinding> {
        &self.binding
    }

    /// Returns true if the object is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.is::<RefCell<T>>()
    }

    /// Returns the shared native instance if the object is a `T`.
    pub fn downcast<T: 'static>(&self) -> Option<Rc<RefCell<T>>> {
        self.inner.clone().downcast::<RefCell<T>>().ok()
    }

    pub(crate) fn cell<T: 'static>(&self) -> Result<&RefCell<T>> {
        self.inner.downcast_ref::<RefCell<T>>().ok_or_else(|| {
            HessianError::mismatch(std::any::type_name::<T>(), self.binding.type_name())
        })
    }

    /// Returns the identity of the shared instance.
    pub fn identity(&self) -> Identity {
        Identity::of(Rc::as_ptr(&self.inner))
    }

    /// Returns true if both handles point to the same instance.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        self.identity() == other.identity()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Visit::enter(&FORMATTING, self.identity()) {
            Some(_visit) => self.binding.fmt_debug(self, f),
            None => write!(f, "{}(<cycle>)", self.class_name()),
        }
    }
}

/// Native handles already built from one shared value.
///
/// Converting the same list, map, or object into `Rc<T>` or `Arc<T>` twice
/// returns the handle built the first time, so every reference to a value in
/// the stream ends up as one allocation. Clones of an [`Object`] share the
/// slots; clones of a [`List`] or [`Map`] body start empty.
#[derive(Default)]
struct Conversions(Rc<RefCell<Vec<Box<dyn Any>>>>);

impl Conversions {
    fn share(&self) -> Self {
        Self(self.0.clone())
    }

    fn find<H: Clone + 'static>(&self) -> Option<H> {
        self.0
            .borrow()
            .iter()
            .find_map(|handle| handle.downcast_ref::<H>())
            .cloned()
    }

    fn store<H: 'static>(&self, handle: H) {
        self.0.borrow_mut().push(Box::new(handle));
    }
}

impl Clone for Conversions {
    fn clone(&self) -> Self {
        Self::default()
    }
}

/// Converts `value` into a shared native handle with `build`, reusing the
/// handle built by an earlier conversion of the same list, map, or object.
pub(crate) fn shared_handle<H: Clone + 'static>(
    value: Value,
    build: impl FnOnce(Value) -> Result<H>,
) -> Result<H> {
    let conversions = match &value {
        Value::List(l) => l
            .try_borrow()
            .map_err(|_| HessianError::Borrowed("list".to_string()))?
            .conversions
            .share(),
        Value::Map(m) => m
            .try_borrow()
            .map_err(|_| HessianError::Borrowed("map".to_string()))?
            .conversions
            .share(),
        Value::Object(o) => o.conversions.share(),
        _ => return build(value),
    };
    if let Some(handle) = conversions.find::<H>() {
        return Ok(handle);
    }
    let handle = build(value)?;
    conversions.store(handle.clone());
    Ok(handle)
}

thread_local! {
    static FORMATTING: RefCell<Vec<Identity>> = const { RefCell::new(Vec::new()) };
    static COMPARING: RefCell<Vec<(Identity, Identity)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a shared value as being walked on this thread until dropped.
struct Visit<K: 'static> {
    stack: &'static LocalKey<RefCell<Vec<K>>>,
}

impl<K: PartialEq + 'static> Visit<K> {
    /// Returns `None` if `key` is already being walked further up the stack.
    fn enter(stack: &'static LocalKey<RefCell<Vec<K>>>, key: K) -> Option<Self> {
        stack.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&key) {
                return None;
            }
            active.push(key);
            Some(Visit { stack })
        })
    }
}

impl<K: 'static> Drop for Visit<K> {
    fn drop(&mut self) {
        self.stack.with(|active| {
            active.borrow_mut().pop();
        });
    }
}

// Two containers already under comparison further up the stack are assumed
// equal, so cyclic graphs of the same shape compare equal.
fn shared_eq<T: PartialEq>(a: &Rc<RefCell<T>>, b: &Rc<RefCell<T>>) -> bool {
    if Rc::ptr_eq(a, b) {
        return true;
    }
    let pair = (Identity::of(Rc::as_ptr(a)), Identity::of(Rc::as_ptr(b)));
    let Some(_visit) = Visit::enter(&COMPARING, pair) else {
        return true;
    };
    match (a.try_borrow(), b.try_borrow()) {
        (Ok(a), Ok(b)) => *a == *b,
        _ => false,
    }
}

/// A decoded Hessian value.
#[derive(Clone, Default)]
pub enum Value {
    /// `null`.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A 32-bit int.
    Int(i32),
    /// A 64-bit long.
    Long(i64),
    /// A 64-bit double.
    Double(f64),
    /// A string.
    String(String),
    /// A binary blob.
    Binary(Vec<u8>),
    /// A UTC instant in milliseconds since the epoch.
    Date(i64),
    /// A list.
    List(ListRef),
    /// A map.
    Map(MapRef),
    /// An instance of a registered native type.
    Object(Object),
}

impl Value {
    /// Wraps a list in a new shared handle.
    pub fn list(list: List) -> Self {
        Value::List(Rc::new(RefCell::new(list)))
    }

    /// Wraps a map in a new shared handle.
    pub fn map(map: Map) -> Self {
        Value::Map(Rc::new(RefCell::new(map)))
    }

    /// Returns the name of this value's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Date(_) => "date",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    /// Returns true for `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an `i64` if it is an int or a long.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bytes, if this is a binary blob.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the list handle, if this is a list.
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the map handle, if this is a map.
    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the object, if this is one.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Empties every list and map reachable from this value and resets every
    /// reachable object to its default, which frees the `Rc` cycles a
    /// decoded graph may contain. Other handles into the graph see the
    /// emptied values afterwards.
    pub fn dismantle(&self) {
        let mut pending = vec![self.clone()];
        while let Some(value) = pending.pop() {
            match value {
                Value::List(list) => {
                    if let Ok(mut list) = list.try_borrow_mut() {
                        pending.append(&mut list.items);
                        list.conversions = Conversions::default();
                    }
                }
                Value::Map(map) => {
                    if let Ok(mut map) = map.try_borrow_mut() {
                        for (key, value) in map.take_entries() {
                            pending.push(key);
                            pending.push(value);
                        }
                        map.conversions = Conversions::default();
                    }
                }
                Value::Object(object) => {
                    object.conversions.0.borrow_mut().clear();
                    object.binding.clear(&object);
                }
                _ => {}
            }
        }
    }

    /// Returns the identity of a list, map, or object.
    pub fn identity(&self) -> Option<Identity> {
        match self {
            Value::List(l) => Some(Identity::of(Rc::as_ptr(l))),
            Value::Map(m) => Some(Identity::of(Rc::as_ptr(m))),
            Value::Object(o) => Some(o.identity()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::List(a), Value::List(b)) => shared_eq(a, b),
            (Value::Map(a), Value::Map(b)) => shared_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Value::Long(v) => f.debug_tuple("Long").field(v).finish(),
            Value::Double(v) => f.debug_tuple("Double").field(v).finish(),
            Value::String(v) => f.debug_tuple("String").field(v).finish(),
            Value::Binary(v) => f.debug_tuple("Binary").field(v).finish(),
            Value::Date(v) => f.debug_tuple("Date").field(v).finish(),
            Value::List(l) => {
                let Some(_visit) = Visit::enter(&FORMATTING, Identity::of(Rc::as_ptr(l))) else {
                    return f.write_str("List(<cycle>)");
                };
                match l.try_borrow() {
                    Ok(list) => f.debug_tuple("List").field(&*list).finish(),
                    Err(_) => f.write_str("List(<borrowed>)"),
                }
            }
            Value::Map(m) => {
                let Some(_visit) = Visit::enter(&FORMATTING, Identity::of(Rc::as_ptr(m))) else {
                    return f.write_str("Map(<cycle>)");
                };
                match m.try_borrow() {
                    Ok(map) => f.debug_tuple("Map").field(&*map).finish(),
                    Err(_) => f.write_str("Map(<borrowed>)"),
                }
            }
            Value::Object(o) => f.debug_tuple("Object").field(o).finish(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<List> for Value {
    fn from(v: List) -> Self {
        Value::list(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::map(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Null.kind(), "null");
        assert_eq!(Value::from(3).kind(), "int");
        assert_eq!(Value::from(3i64).kind(), "long");
        assert_eq!(Value::from("x").kind(), "string");
        assert_eq!(Value::list(List::default()).kind(), "list");
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Value::Int(-4).as_i64(), Some(-4));
        assert_eq!(Value::Long(1 << 40).as_i64(), Some(1 << 40));
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
        assert_eq!(Value::String("2".into()).as_i64(), None);
    }

    #[test]
    fn test_map_insert_replaces() {
        let mut map = Map::new();
        assert_eq!(map.insert("a".into(), 1.into()), None);
        assert_eq!(map.insert("b".into(), 2.into()), None);
        assert_eq!(map.insert("a".into(), 3.into()), Some(Value::Int(1)));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_str("a"), Some(&Value::Int(3)));
        assert_eq!(map.get(&Value::from("b")), Some(&Value::Int(2)));
        assert_eq!(map.entries()[0].0, Value::from("a"));
    }

    #[test]
    fn test_composite_keys_match_by_identity() {
        let key = Value::list(List::new(vec![1.into()]));
        let mut map = Map::new();
        map.insert(key.clone(), "first".into());
        map.insert(Value::list(List::new(vec![1.into()])), "second".into());
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&key), Some(&Value::from("first")));
    }

    #[test]
    fn test_list_equality_is_structural() {
        let a = Value::list(List::new(vec![1.into(), "x".into()]));
        let b = Value::list(List::new(vec![1.into(), "x".into()]));
        assert_eq!(a, b);
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_self_containing_list_equals_itself() {
        let list = Rc::new(RefCell::new(List::default()));
        list.borrow_mut().items.push(Value::List(list.clone()));
        let value = Value::List(list.clone());
        assert_eq!(value, value.clone());
        list.borrow_mut().items.clear();
    }

    #[test]
    fn test_distinct_cycles_of_same_shape_are_equal() {
        let cyclic = |head: i32| {
            let list = Rc::new(RefCell::new(List::new(vec![head.into()])));
            list.borrow_mut().items.push(Value::List(list.clone()));
            list
        };
        let (a, b, c) = (cyclic(1), cyclic(1), cyclic(2));
        assert_eq!(Value::List(a.clone()), Value::List(b.clone()));
        assert_ne!(Value::List(a.clone()), Value::List(c.clone()));
        for list in [a, b, c] {
            list.borrow_mut().items.clear();
        }
    }

    #[test]
    fn test_debug_stops_at_cycles() {
        let list = Rc::new(RefCell::new(List::default()));
        list.borrow_mut().items.push(Value::List(list.clone()));
        assert_eq!(
            format!("{:?}", Value::List(list.clone())),
            "List(List { type_name: None, items: [List(<cycle>)] })"
        );

        let map = Value::map(Map::new());
        if let Value::Map(cell) = &map {
            cell.borrow_mut().insert("self".into(), map.clone());
        }
        assert!(format!("{:?}", map).contains("Map(<cycle>)"));

        map.dismantle();
        Value::List(list.clone()).dismantle();
        assert!(list.borrow().items.is_empty());
        assert_eq!(Rc::strong_count(&list), 1);
    }

    #[test]
    fn test_shared_value_printed_twice_is_not_a_cycle() {
        let shared = Value::list(List::new(vec![7.into()]));
        let outer = Value::list(List::new(vec![shared.clone(), shared]));
        let text = format!("{:?}", outer);
        assert!(!text.contains("<cycle>"));
        assert_eq!(text.matches("Int(7)").count(), 2);
    }

    #[test]
    fn test_large_map_keeps_order_and_replaces() {
        let mut map = Map::new();
        for i in 0..50_000 {
            map.insert(Value::Int(i), Value::Int(i));
        }
        assert_eq!(map.insert(Value::Int(7), Value::from("seven")), Some(Value::Int(7)));
        assert_eq!(map.len(), 50_000);
        assert_eq!(map.entries()[7].1, Value::from("seven"));
        assert_eq!(map.get(&Value::Int(49_999)), Some(&Value::Int(49_999)));
        assert_eq!(map.get(&Value::Long(7)), None);
    }

    #[test]
    fn test_double_keys_fold_signed_zero() {
        let mut map = Map::new();
        map.insert(Value::Double(0.0), "zero".into());
        map.insert(Value::Double(-0.0), "negative zero".into());
        map.insert(Value::Double(f64::NAN), "nan".into());
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&Value::Double(0.0)), Some(&Value::from("negative zero")));
        assert_eq!(map.get(&Value::Double(f64::NAN)), Some(&Value::from("nan")));
    }

    #[test]
    fn test_take_entries_empties_index() {
        let mut map: Map = [(Value::from("a"), Value::Int(1))].into_iter().collect();
        assert_eq!(map.take_entries().len(), 1);
        assert!(map.is_empty());
        assert_eq!(map.get_str("a"), None);
        map.insert("a".into(), 2.into());
        assert_eq!(map.get_str("a"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_debug_of_borrowed_list() {
        let value = Value::list(List::default());
        let list = value.as_list().unwrap().clone();
        let _guard = list.borrow_mut();
        assert_eq!(format!("{:?}", value), "List(<borrowed>)");
    }
}
