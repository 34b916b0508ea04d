//! Per-stream reference tables for lists, maps, and objects.
//!
//! Every composite value takes the next reference index the moment its
//! header is written or read, before any of its children. Both sides count
//! the same way, so a `Q` record carrying an index names the same value on
//! each end of the stream.

use std::collections::HashMap;

use crate::error::{HessianError, ReferenceKind, Result};
use crate::value::Value;

/// The address of a shared native value, used as its identity while
/// encoding.
///
/// Two `Rc`/`Arc` handles to one allocation have the same identity; two
/// structurally equal values in separate allocations do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity(usize);

impl Identity {
    /// Takes the identity of the value behind `ptr`.
    pub fn of<T: ?Sized>(ptr: *const T) -> Self {
        Identity(ptr as *const () as usize)
    }
}

/// Encoder-side reference numbering.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    next: usize,
    seen: HashMap<Identity, usize>,
}

impl ReferenceTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index already held by `identity`, or assigns it the next
    /// one. The flag is true when the identity was seen before.
    pub fn intern(&mut self, identity: Identity) -> (usize, bool) {
        if let Some(&index) = self.seen.get(&identity) {
            return (index, true);
        }
        let index = self.assign();
        self.seen.insert(identity, index);
        (index, false)
    }

    /// Assigns the next index to a value that can never be referenced again.
    pub fn assign(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }

    /// Forgets the identities of values written so far while keeping the
    /// numbering, so later values continue the stream's sequence.
    ///
    /// Called at the start of each top-level value: the values of an earlier
    /// call may have been dropped and their addresses reused.
    pub fn begin_value(&mut self) {
        self.seen.clear();
    }

    /// Returns how many indices have been assigned.
    pub fn len(&self) -> usize {
        self.next
    }

    /// Returns true if no index has been assigned.
    pub fn is_empty(&self) -> bool {
        self.next == 0
    }

    /// Clears all state.
    pub fn reset(&mut self) {
        self.next = 0;
        self.seen.clear();
    }
}

/// Decoder-side reference slots.
#[derive(Debug, Default)]
pub struct ReferenceSlots {
    slots: Vec<Option<Value>>,
}

impl ReferenceSlots {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next index for a composite whose fields are about to be
    /// read.
    pub fn reserve(&mut self) -> usize {
        self.slots.push(None);
        self.slots.len() - 1
    }

    /// Attaches a (possibly still filling) value to a reserved index.
    pub fn bind(&mut self, index: usize, value: Value) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(value);
        }
    }

    /// Returns the value a back-reference points to.
    pub fn resolve_reference(&self, index: i64) -> Result<Value> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.slots.get(i))
            .and_then(|slot| slot.clone())
            .ok_or(HessianError::InvalidReference {
                kind: ReferenceKind::Value,
                index,
                len: self.slots.len(),
            })
    }

    /// Returns the number of reserved indices.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing has been reserved.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Clears all state.
    pub fn reset(&mut self) {
        self.slots.clear();
    }
}
