//! Base/current storage for one attribute set.

use crate::config::AbilitySystemConfig;

use super::AttributeHandle;

/// Static description of one attribute slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttributeDescriptor {
    pub name: &'static str,
    pub default_value: f32,
}

impl AttributeDescriptor {
    pub const fn new(name: &'static str, default_value: f32) -> Self {
        Self {
            name,
            default_value,
        }
    }
}

/// Static, per-type list of the attributes a set declares.
///
/// Slot order is the index used by [`AttributeValues`] and by the set's own
/// index constants.
#[derive(Debug)]
pub struct AttributeSetDescriptor {
    pub name: &'static str,
    pub attributes: &'static [AttributeDescriptor],
}

impl AttributeSetDescriptor {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|attr| attr.name == name)
    }
}

/// A single numeric slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attribute {
    pub name: &'static str,
    pub base: f32,
    pub current: f32,
}

/// Which half of an attribute changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeChangeKind {
    Base,
    Current,
}

/// A committed change, as reported by
/// [`drain_attribute_changes`](crate::AbilitySystemComponent::drain_attribute_changes).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttributeChange {
    pub attribute: AttributeHandle,
    pub name: &'static str,
    pub kind: AttributeChangeKind,
    pub old_value: f32,
    pub new_value: f32,
}

/// Change recorded inside a set before the owning component maps it to a handle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LocalChange {
    pub(crate) index: u16,
    pub(crate) kind: AttributeChangeKind,
    pub(crate) old_value: f32,
    pub(crate) new_value: f32,
}

/// Storage for the attributes of one set.
///
/// Writes that move a value by more than
/// [`AbilitySystemConfig::VALUE_EPSILON`] are recorded; the owning component
/// drains the record after every call into the set, marking base changes dirty
/// and forwarding notifications.
#[derive(Clone, Debug)]
pub struct AttributeValues {
    attributes: Vec<Attribute>,
    changes: Vec<LocalChange>,
}

impl AttributeValues {
    /// Creates storage initialised to the descriptor's defaults.
    pub fn from_descriptor(descriptor: &AttributeSetDescriptor) -> Self {
        let attributes = descriptor
            .attributes
            .iter()
            .map(|desc| Attribute {
                name: desc.name,
                base: desc.default_value,
                current: desc.default_value,
            })
            .collect();
        Self {
            attributes,
            changes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    /// Base value at `index`, or 0 if out of range.
    pub fn base(&self, index: usize) -> f32 {
        self.attributes.get(index).map_or(0.0, |attr| attr.base)
    }

    /// Current value at `index`, or 0 if out of range.
    pub fn current(&self, index: usize) -> f32 {
        self.attributes.get(index).map_or(0.0, |attr| attr.current)
    }

    /// Writes both halves without recording a change. Meant for set construction.
    pub fn initialize(&mut self, index: usize, value: f32) {
        if let Some(attr) = self.attributes.get_mut(index) {
            attr.base = value;
            attr.current = value;
        }
    }

    /// Writes the base value. Returns true if the change was committed.
    pub fn set_base(&mut self, index: usize, value: f32) -> bool {
        let Some(attr) = self.attributes.get_mut(index) else {
            return false;
        };
        if (attr.base - value).abs() <= AbilitySystemConfig::VALUE_EPSILON {
            return false;
        }
        let old_value = attr.base;
        attr.base = value;
        self.changes.push(LocalChange {
            index: index as u16,
            kind: AttributeChangeKind::Base,
            old_value,
            new_value: value,
        });
        true
    }

    /// Writes the current value. Returns true if the change was committed.
    pub fn set_current(&mut self, index: usize, value: f32) -> bool {
        let Some(attr) = self.attributes.get_mut(index) else {
            return false;
        };
        if (attr.current - value).abs() <= AbilitySystemConfig::VALUE_EPSILON {
            return false;
        }
        let old_value = attr.current;
        attr.current = value;
        self.changes.push(LocalChange {
            index: index as u16,
            kind: AttributeChangeKind::Current,
            old_value,
            new_value: value,
        });
        true
    }

    pub(crate) fn drain_changes(&mut self) -> std::vec::Drain<'_, LocalChange> {
        self.changes.drain(..)
    }
}
