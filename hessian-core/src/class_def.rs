//! Per-stream class definition and type name tables.
//!
//! A class definition (`C` record) carries a class name and its ordered field
//! names. It is written once per stream, the first time an instance of the
//! class is written, and takes the next definition index. Object headers
//! after that only carry the index. Type names of typed lists and maps follow
//! the same first-as-string, then-as-index scheme in a table of their own.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{HessianError, ReferenceKind, Result};
use crate::registry::{ClassBinding, TypeRegistry};

/// A wire-level class definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefinition {
    class_name: String,
    field_names: Vec<String>,
}

impl ClassDefinition {
    /// Creates a definition.
    pub fn new(class_name: impl Into<String>, field_names: Vec<String>) -> Self {
        Self {
            class_name: class_name.into(),
            field_names,
        }
    }

    /// Returns the class name.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Returns the field names in wire order.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }
}

/// Encoder-side definition numbering.
#[derive(Debug, Default)]
pub struct ClassDefinitionCache {
    by_name: HashMap<String, usize>,
    definitions: Vec<ClassDefinition>,
}

impl ClassDefinitionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the definition index for `class_name`, assigning the next one
    /// if the class has not been written on this stream. The flag is true for
    /// a new definition, whose record the caller must write.
    ///
    /// # Errors
    ///
    /// Returns [`HessianError::Definition`] if the class was already defined
    /// with different field names.
    pub fn get_or_create(&mut self, class_name: &str, field_names: &[String]) -> Result<(usize, bool)> {
        if let Some(&index) = self.by_name.get(class_name) {
            if self.definitions[index].field_names != field_names {
                return Err(HessianError::Definition(format!(
                    "class {} already defined on this stream with fields {:?}, got {:?}",
                    class_name, self.definitions[index].field_names, field_names
                )));
            }
            return Ok((index, false));
        }
        let index = self.definitions.len();
        self.definitions
            .push(ClassDefinition::new(class_name, field_names.to_vec()));
        self.by_name.insert(class_name.to_string(), index);
        Ok((index, true))
    }

    /// Returns the definitions written so far, in index order.
    pub fn definitions(&self) -> &[ClassDefinition] {
        &self.definitions
    }

    /// Returns the number of definitions written.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if no definition has been written.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Clears all state.
    pub fn reset(&mut self) {
        self.by_name.clear();
        self.definitions.clear();
    }
}

/// A definition matched against a registered native type.
///
/// `slots[i]` is the native field index receiving the `i`th wire field, or
/// `None` when the native type has no field of that name.
#[derive(Clone)]
pub(crate) struct ResolvedClass {
    pub(crate) binding: Arc<dyn ClassBinding>,
    pub(crate) slots: Arc<[Option<usize>]>,
}

struct TableEntry {
    definition: Arc<ClassDefinition>,
    resolved: Option<ResolvedClass>,
}

/// Decoder-side definitions, indexed in the order they were read.
#[derive(Default)]
pub struct ClassDefinitionTable {
    entries: Vec<TableEntry>,
}

impl ClassDefinitionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition at the next index and returns that index.
    pub fn register(&mut self, definition: ClassDefinition) -> usize {
        self.entries.push(TableEntry {
            definition: Arc::new(definition),
            resolved: None,
        });
        self.entries.len() - 1
    }

    fn entry_mut(&mut self, index: i64) -> Result<&mut TableEntry> {
        let len = self.entries.len();
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get_mut(i))
            .ok_or(HessianError::InvalidReference {
                kind: ReferenceKind::Class,
                index,
                len,
            })
    }

    /// Returns the definition registered at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`HessianError::InvalidReference`] if no definition has been
    /// read at that index.
    pub fn get(&self, index: i64) -> Result<&Arc<ClassDefinition>> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .map(|entry| &entry.definition)
            .ok_or(HessianError::InvalidReference {
                kind: ReferenceKind::Class,
                index,
                len: self.entries.len(),
            })
    }

    /// Matches the definition at `index` against the native type registered
    /// for its class name. The match is computed once per definition.
    pub(crate) fn resolve(&mut self, index: i64, registry: &TypeRegistry) -> Result<ResolvedClass> {
        let entry = self.entry_mut(index)?;
        if let Some(resolved) = &entry.resolved {
            return Ok(resolved.clone());
        }
        let binding = registry
            .lookup(entry.definition.class_name())
            .ok_or_else(|| HessianError::UnknownClassIdentity(entry.definition.class_name().to_string()))?;
        let slots: Arc<[Option<usize>]> = entry
            .definition
            .field_names()
            .iter()
            .map(|name| binding.field_index(name))
            .collect();
        let resolved = ResolvedClass { binding, slots };
        entry.resolved = Some(resolved.clone());
        Ok(resolved)
    }

    /// Returns the number of definitions read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no definition has been read.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clears all state.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for ClassDefinitionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| &entry.definition))
            .finish()
    }
}

/// Encoder-side type name numbering.
#[derive(Debug, Default)]
pub struct TypeNameCache {
    indices: HashMap<String, usize>,
}

impl TypeNameCache {
    /// Returns the index of a type name already written, or records it at
    /// the next index and returns `None`.
    pub fn lookup_or_insert(&mut self, name: &str) -> Option<usize> {
        if let Some(&index) = self.indices.get(name) {
            return Some(index);
        }
        let index = self.indices.len();
        self.indices.insert(name.to_string(), index);
        None
    }

    /// Clears all state.
    pub fn reset(&mut self) {
        self.indices.clear();
    }
}

/// Decoder-side type names, indexed in the order they were read.
#[derive(Debug, Default)]
pub struct TypeNameTable {
    names: Vec<String>,
}

impl TypeNameTable {
    /// Records a type name read as a string.
    pub fn push(&mut self, name: String) {
        self.names.push(name);
    }

    /// Returns the type name at `index`.
    pub fn get(&self, index: i64) -> Result<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
            .ok_or(HessianError::InvalidReference {
                kind: ReferenceKind::Type,
                index,
                len: self.names.len(),
            })
    }

    /// Clears all state.
    pub fn reset(&mut self) {
        self.names.clear();
    }
}
