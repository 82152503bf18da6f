//! Attributes and the sets that own them.

mod modifier;
mod set;
mod value;

pub use modifier::{ModifierAggregator, ModifierOp};
pub use set::{AttributeSet, BasicAttributeSet, DeferredCommand, ModCallbackData};
pub use value::{
    Attribute, AttributeChange, AttributeChangeKind, AttributeDescriptor, AttributeSetDescriptor,
    AttributeValues,
};

use std::collections::HashMap;
use std::fmt;

/// Position of an attribute within a component: which set, which slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeHandle {
    pub(crate) set: u16,
    pub(crate) index: u16,
}

impl AttributeHandle {
    pub fn set_index(self) -> usize {
        self.set as usize
    }

    /// Slot within the owning set's descriptor.
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for AttributeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attr#{}.{}", self.set, self.index)
    }
}

/// Name lookup for every attribute registered on a component.
///
/// Names are unique per component; a later set declaring an existing name
/// shadows nothing and is reported by [`AttributeIndex::register`].
#[derive(Clone, Debug, Default)]
pub struct AttributeIndex {
    by_name: HashMap<&'static str, AttributeHandle>,
}

impl AttributeIndex {
    /// Registers every attribute in `descriptor` as set number `set`.
    ///
    /// Returns the names that were already taken.
    pub(crate) fn register(
        &mut self,
        set: u16,
        descriptor: &'static AttributeSetDescriptor,
    ) -> Vec<&'static str> {
        let mut duplicates = Vec::new();
        for (index, attribute) in descriptor.attributes.iter().enumerate() {
            let handle = AttributeHandle {
                set,
                index: index as u16,
            };
            if self.by_name.contains_key(attribute.name) {
                duplicates.push(attribute.name);
            } else {
                self.by_name.insert(attribute.name, handle);
            }
        }
        duplicates
    }

    pub fn get(&self, name: &str) -> Option<AttributeHandle> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.by_name.clear();
    }
}
