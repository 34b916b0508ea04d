//! Type registry mapping native types to Java class names and field layouts.
//!
//! A [`TypeDescriptor`] is built once per native type from the layout its
//! [`HessianObject`] impl reports, with inline (flattened) members spliced in
//! at their declaration position. Descriptors are published in a
//! process-wide [`TypeRegistry`], which also indexes them by class name for
//! decoding.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use crate::encoder::Encoder;
use crate::error::{HessianError, Result};
use crate::value::{Object, Value};

/// Capability of a native type that is written as a named Java object.
pub trait JavaClass {
    /// Returns the fully qualified Java class name, such as
    /// `com.example.Person`.
    fn java_class_name() -> &'static str;
}

/// A native type written as a Hessian object.
///
/// Usually derived with `#[derive(Hessian)]` from `hessian-derive`.
///
/// A decoded [`Object`] formats itself through the type's `Debug`. A type
/// whose own fields can close an `Rc<RefCell<Self>>` cycle needs a `Debug`
/// that does not follow them; cycles through [`Value`] fields are cut by
/// `Value`'s own formatting.
pub trait HessianObject: JavaClass + Default + Clone + fmt::Debug + 'static {
    /// Returns the type's own fields and inline members in declaration order.
    fn layout() -> Vec<FieldLayout<Self>>;

    /// Registers the object types reachable from this type's fields.
    fn register_dependencies(registry: &TypeRegistry) -> Result<()> {
        let _ = registry;
        Ok(())
    }
}

/// Writes one field of `T`.
pub type WriteFn<T> = fn(&T, &mut Encoder) -> Result<()>;

/// Converts a decoded value and stores it into one field of `T`.
pub type AssignFn<T> = fn(&mut T, Value) -> Result<()>;

type SharedWrite<T> = Arc<dyn Fn(&T, &mut Encoder) -> Result<()> + Send + Sync>;
type SharedAssign<T> = Arc<dyn Fn(&mut T, Value) -> Result<()> + Send + Sync>;
type Splice<T> = Box<dyn Fn(&TypeRegistry) -> Result<Vec<FieldDescriptor<T>>> + Send + Sync>;

/// One entry of a type's declared layout.
pub enum FieldLayout<T> {
    /// A field written under its own wire name.
    Field {
        /// The Rust field name.
        rust_name: &'static str,
        /// Explicit wire name, replacing the bean-style default.
        rename: Option<&'static str>,
        /// Writes the field.
        write: WriteFn<T>,
        /// Assigns the field.
        assign: AssignFn<T>,
    },
    /// An embedded type whose fields are spliced in at this position.
    Inline {
        /// The Rust field name holding the embedded value.
        rust_name: &'static str,
        /// Produces the embedded type's descriptors, projected onto `T`.
        splice: Splice<T>,
    },
}

impl<T: 'static> FieldLayout<T> {
    /// Declares a plain field.
    pub fn field(
        rust_name: &'static str,
        rename: Option<&'static str>,
        write: WriteFn<T>,
        assign: AssignFn<T>,
    ) -> Self {
        FieldLayout::Field {
            rust_name,
            rename,
            write,
            assign,
        }
    }

    /// Declares an embedded `E` whose fields are flattened into `T`.
    pub fn inline<E: HessianObject>(
        rust_name: &'static str,
        get: fn(&T) -> &E,
        get_mut: fn(&mut T) -> &mut E,
    ) -> Self {
        FieldLayout::Inline {
            rust_name,
            splice: Box::new(move |registry: &TypeRegistry| {
                let embedded = registry.resolve::<E>()?;
                Ok(embedded
                    .fields()
                    .iter()
                    .map(|field| field.project(rust_name, get, get_mut))
                    .collect())
            }),
        }
    }
}

/// A resolved field: its wire name and how to reach it from `T`.
pub struct FieldDescriptor<T> {
    wire_name: String,
    path: String,
    write: SharedWrite<T>,
    assign: SharedAssign<T>,
}

impl<T: 'static> FieldDescriptor<T> {
    fn direct(rust_name: &'static str, rename: Option<&'static str>, write: WriteFn<T>, assign: AssignFn<T>) -> Self {
        Self {
            wire_name: rename.map(str::to_string).unwrap_or_else(|| bean_name(rust_name)),
            path: rust_name.to_string(),
            write: Arc::new(write),
            assign: Arc::new(assign),
        }
    }

    fn project<P: 'static>(
        &self,
        parent: &'static str,
        get: fn(&P) -> &T,
        get_mut: fn(&mut P) -> &mut T,
    ) -> FieldDescriptor<P> {
        let write = self.write.clone();
        let assign = self.assign.clone();
        FieldDescriptor {
            wire_name: self.wire_name.clone(),
            path: format!("{}.{}", parent, self.path),
            write: Arc::new(move |outer: &P, encoder: &mut Encoder| write(get(outer), encoder)),
            assign: Arc::new(move |outer: &mut P, value: Value| assign(get_mut(outer), value)),
        }
    }

    /// Returns the name the field is written under.
    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    /// Returns the dotted Rust path to the field, through inline members.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Writes the field of `value`.
    pub fn write(&self, value: &T, encoder: &mut Encoder) -> Result<()> {
        (self.write)(value, encoder)
    }

    /// Assigns a decoded value to the field of `target`.
    pub fn assign(&self, target: &mut T, value: Value) -> Result<()> {
        (self.assign)(target, value)
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("wire_name", &self.wire_name)
            .field("path", &self.path)
            .finish()
    }
}

/// Converts a Rust field name to its bean-style wire name.
///
/// `family_phone_number` becomes `familyPhoneNumber`; the first letter is
/// always lower case.
pub fn bean_name(rust_name: &str) -> String {
    let mut name = String::with_capacity(rust_name.len());
    let mut upper_next = false;
    for ch in rust_name.chars() {
        if ch == '_' {
            upper_next = !name.is_empty();
            continue;
        }
        if name.is_empty() {
            name.extend(ch.to_lowercase());
        } else if upper_next {
            name.extend(ch.to_uppercase());
        } else {
            name.push(ch);
        }
        upper_next = false;
    }
    name
}

/// The class name and flattened field list of a native type.
pub struct TypeDescriptor<T> {
    class_name: &'static str,
    fields: Vec<FieldDescriptor<T>>,
    field_names: Vec<String>,
    index: HashMap<String, usize>,
}

impl<T: HessianObject> TypeDescriptor<T> {
    fn build(registry: &TypeRegistry) -> Result<Self> {
        let mut fields = Vec::new();
        for layout in T::layout() {
            match layout {
                FieldLayout::Field {
                    rust_name,
                    rename,
                    write,
                    assign,
                } => fields.push(FieldDescriptor::direct(rust_name, rename, write, assign)),
                FieldLayout::Inline { splice, .. } => fields.extend(splice(registry)?),
            }
        }

        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if let Some(previous) = index.insert(field.wire_name.clone(), i) {
                return Err(HessianError::Definition(format!(
                    "{}: fields {} and {} both map to wire name {}",
                    T::java_class_name(),
                    fields[previous].path,
                    field.path,
                    field.wire_name
                )));
            }
        }

        Ok(Self {
            class_name: T::java_class_name(),
            field_names: fields.iter().map(|f| f.wire_name.clone()).collect(),
            fields,
            index,
        })
    }

    /// Returns the fields in wire order.
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }
}

impl<T> fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("class_name", &self.class_name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Type-erased access to a registered native type.
///
/// The decoder works with objects of whatever type a class name resolves to,
/// so everything it needs from a [`TypeDescriptor`] goes through this trait.
pub trait ClassBinding: Send + Sync {
    /// Returns the Java class name.
    fn class_name(&self) -> &str;

    /// Returns the wire field names in order.
    fn field_names(&self) -> &[String];

    /// Returns the position of the field written under `wire_name`.
    fn field_index(&self, wire_name: &str) -> Option<usize>;

    /// Returns the `TypeId` of the native type.
    fn rust_type(&self) -> TypeId;

    /// Returns the Rust name of the native type.
    fn type_name(&self) -> &'static str;

    /// Allocates a default instance as an `Rc<RefCell<T>>`.
    fn instantiate(&self) -> Rc<dyn Any>;

    /// Converts `value` and stores it into field `index` of `object`.
    fn assign(&self, object: &Object, index: usize, value: Value) -> Result<()>;

    /// Writes `object` as a Hessian object.
    fn write(&self, object: &Object, encoder: &mut Encoder) -> Result<()>;

    /// Formats `object` with the native type's `Debug`.
    fn fmt_debug(&self, object: &Object, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    /// Resets `object` to the native type's default, dropping its fields.
    fn clear(&self, object: &Object);
}

impl<T: HessianObject> ClassBinding for TypeDescriptor<T> {
    fn class_name(&self) -> &str {
        self.class_name
    }

    fn field_names(&self) -> &[String] {
        &self.field_names
    }

    fn field_index(&self, wire_name: &str) -> Option<usize> {
        self.index.get(wire_name).copied()
    }

    fn rust_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn instantiate(&self) -> Rc<dyn Any> {
        Rc::new(RefCell::new(T::default()))
    }

    fn assign(&self, object: &Object, index: usize, value: Value) -> Result<()> {
        let field = self.fields.get(index).ok_or_else(|| {
            HessianError::Definition(format!("{} has no field {}", self.class_name, index))
        })?;
        let mut target = object
            .cell::<T>()?
            .try_borrow_mut()
            .map_err(|_| HessianError::Borrowed(self.class_name.to_string()))?;
        field.assign(&mut target, value)
    }

    fn write(&self, object: &Object, encoder: &mut Encoder) -> Result<()> {
        let value = object
            .cell::<T>()?
            .try_borrow()
            .map_err(|_| HessianError::Borrowed(self.class_name.to_string()))?;
        encoder.write_described(self, &value, Some(object.identity()))
    }

    fn fmt_debug(&self, object: &Object, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match object.cell::<T>().map(RefCell::try_borrow) {
            Ok(Ok(value)) => fmt::Debug::fmt(&*value, f),
            _ => write!(f, "{}(<borrowed>)", self.class_name),
        }
    }

    fn clear(&self, object: &Object) {
        let stale = match object.cell::<T>().map(RefCell::try_borrow_mut) {
            Ok(Ok(mut value)) => std::mem::take(&mut *value),
            _ => return,
        };
        drop(stale);
    }
}

static GLOBAL: OnceLock<Arc<TypeRegistry>> = OnceLock::new();

/// Process-wide map between native types and Java classes.
///
/// Reads of an already built descriptor take a shared lock only. A
/// descriptor is built with no lock held and published with
/// first-writer-wins, so concurrent first use commits exactly one descriptor
/// per type.
#[derive(Default)]
pub struct TypeRegistry {
    by_type: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    by_class: RwLock<HashMap<String, Arc<dyn ClassBinding>>>,
    registered: Mutex<HashSet<TypeId>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared process-wide registry.
    pub fn global() -> Arc<TypeRegistry> {
        GLOBAL.get_or_init(|| Arc::new(TypeRegistry::new())).clone()
    }

    /// Returns the descriptor for `T`, building and publishing it on first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns [`HessianError::Definition`] if two fields of `T` (after
    /// flattening) share a wire name.
    pub fn resolve<T: HessianObject>(&self) -> Result<Arc<TypeDescriptor<T>>> {
        let id = TypeId::of::<T>();
        let cached = self
            .by_type
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned();
        if let Some(found) = cached {
            return Self::downcast(found);
        }

        // Inline members resolve their own types, so no lock is held here.
        let built: Arc<dyn Any + Send + Sync> = Arc::new(TypeDescriptor::<T>::build(self)?);
        let published = self
            .by_type
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_insert(built)
            .clone();
        let descriptor = Self::downcast::<T>(published)?;
        self.bind_class(descriptor.clone());
        Ok(descriptor)
    }

    fn downcast<T: HessianObject>(entry: Arc<dyn Any + Send + Sync>) -> Result<Arc<TypeDescriptor<T>>> {
        entry.downcast::<TypeDescriptor<T>>().map_err(|_| {
            HessianError::Definition(format!(
                "registry entry for {} holds another type",
                std::any::type_name::<T>()
            ))
        })
    }

    fn bind_class(&self, binding: Arc<dyn ClassBinding>) {
        let mut classes = self.by_class.write().unwrap_or_else(PoisonError::into_inner);
        match classes.get(binding.class_name()) {
            Some(existing) if existing.rust_type() != binding.rust_type() => {
                tracing::warn!(
                    class = binding.class_name(),
                    bound = existing.type_name(),
                    ignored = binding.type_name(),
                    "class name already bound to another type"
                );
            }
            Some(_) => {}
            None => {
                tracing::debug!(
                    class = binding.class_name(),
                    rust_type = binding.type_name(),
                    fields = binding.field_names().len(),
                    "bound class"
                );
                classes.insert(binding.class_name().to_string(), binding);
            }
        }
    }

    /// Resolves `T` and every object type reachable from its fields, so
    /// streams naming any of them can be decoded.
    pub fn register<T: HessianObject>(&self) -> Result<()> {
        self.resolve::<T>()?;
        let first = self
            .registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>());
        if first {
            T::register_dependencies(self)?;
        }
        Ok(())
    }

    /// Returns the binding registered under a Java class name.
    pub fn lookup(&self, class_name: &str) -> Option<Arc<dyn ClassBinding>> {
        self.by_class
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(class_name)
            .cloned()
    }

    /// Returns true if a native type is bound to `class_name`.
    pub fn contains_class(&self, class_name: &str) -> bool {
        self.by_class
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(class_name)
    }

    /// Returns the number of native types with a descriptor.
    pub fn len(&self) -> usize {
        self.by_type.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no descriptor has been built.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classes = self.by_class.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<&String> = classes.keys().collect();
        names.sort();
        f.debug_struct("TypeRegistry").field("classes", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hessian_derive::Hessian;

    #[derive(Debug, Clone, Default, PartialEq, Hessian)]
    #[hessian(class_name = "test.Name")]
    struct Name {
        pub first_name: String,
        pub last_name: String,
    }

    #[derive(Debug, Clone, Default, PartialEq, Hessian)]
    #[hessian(class_name = "test.Person")]
    struct Person {
        #[hessian(flatten)]
        pub name: Name,
        pub age: i32,
        #[hessian(field_name = "alias")]
        pub nick_name: String,
        hidden: String,
    }

    #[derive(Debug, Clone, Default, Hessian)]
    #[hessian(class_name = "test.Clash")]
    struct Clash {
        pub user_name: String,
        #[hessian(field_name = "userName")]
        pub login: String,
    }

    #[derive(Debug, Clone, Default, Hessian)]
    #[hessian(class_name = "test.Person")]
    struct Impostor {
        pub age: i32,
    }

    #[test]
    fn test_bean_names() {
        assert_eq!(bean_name("name"), "name");
        assert_eq!(bean_name("family_phone_number"), "familyPhoneNumber");
        assert_eq!(bean_name("Addrress"), "addrress");
        assert_eq!(bean_name("_private"), "private");
        assert_eq!(bean_name("a__b"), "aB");
    }

    #[test]
    fn test_descriptor_flattens_inline_fields() {
        let registry = TypeRegistry::new();
        let descriptor = registry.resolve::<Person>().unwrap();
        assert_eq!(
            descriptor.field_names(),
            &["firstName", "lastName", "age", "alias"]
        );
        assert_eq!(descriptor.fields()[0].path(), "name.first_name");
        assert_eq!(descriptor.field_index("alias"), Some(3));
        assert_eq!(descriptor.field_index("hidden"), None);
    }

    #[test]
    fn test_resolve_is_cached() {
        let registry = TypeRegistry::new();
        let a = registry.resolve::<Person>().unwrap();
        let b = registry.resolve::<Person>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        // Person and its inline Name
        assert_eq!(registry.len(), 2);
        assert!(registry.contains_class("test.Person"));
        assert!(registry.contains_class("test.Name"));
    }

    #[test]
    fn test_duplicate_wire_names_rejected() {
        let registry = TypeRegistry::new();
        let err = registry.resolve::<Clash>().unwrap_err();
        assert!(matches!(err, HessianError::Definition(_)));
        assert!(err.to_string().contains("userName"));
        assert!(!registry.contains_class("test.Clash"));
    }

    #[test]
    fn test_first_binding_wins() {
        let registry = TypeRegistry::new();
        registry.resolve::<Person>().unwrap();
        registry.resolve::<Impostor>().unwrap();
        let binding = registry.lookup("test.Person").unwrap();
        assert_eq!(binding.rust_type(), TypeId::of::<Person>());
    }

    #[test]
    fn test_assign_through_binding() {
        let registry = TypeRegistry::new();
        let binding: Arc<dyn ClassBinding> = registry.resolve::<Person>().unwrap();
        let object = Object::from_parts(binding.instantiate(), binding.clone());
        binding.assign(&object, 0, Value::from("Ada")).unwrap();
        binding.assign(&object, 2, Value::Int(36)).unwrap();

        let person = object.downcast::<Person>().unwrap();
        assert_eq!(person.borrow().name.first_name, "Ada");
        assert_eq!(person.borrow().age, 36);
        assert!(matches!(
            binding.assign(&object, 9, Value::Null),
            Err(HessianError::Definition(_))
        ));
    }

    #[test]
    fn test_concurrent_resolve_publishes_one_descriptor() {
        let registry = Arc::new(TypeRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let descriptor = registry.resolve::<Person>().unwrap();
                    Arc::as_ptr(&descriptor) as usize
                })
            })
            .collect();
        let addresses: HashSet<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(addresses.len(), 1);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&TypeRegistry::global(), &TypeRegistry::global()));
    }
}
