//! The attribute set trait and its modification pipeline.

use std::any::Any;
use std::fmt;

use gameplay_tags::GameplayTag;

use crate::effect::{EffectSpec, Modifier};
use crate::handle::AscId;

use super::{AttributeHandle, AttributeSetDescriptor, AttributeValues};

/// Everything a hook needs to know about one permanent modification.
#[derive(Clone, Copy, Debug)]
pub struct ModCallbackData<'a> {
    pub spec: &'a EffectSpec,
    pub modifier: &'a Modifier,
    /// Magnitude after snapshot evaluation.
    pub magnitude: f32,
    pub attribute: AttributeHandle,
    pub target: AscId,
}

impl ModCallbackData<'_> {
    pub fn source(&self) -> Option<AscId> {
        self.spec.source()
    }

    pub fn level(&self) -> i32 {
        self.spec.level()
    }
}

/// Requests queued by attribute hooks and applied by the owning component
/// once the hook returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeferredCommand {
    AddLooseTag(GameplayTag),
    RemoveLooseTag(GameplayTag),
}

/// A closed collection of attributes belonging to one subject.
///
/// Implementors expose a static descriptor and their [`AttributeValues`];
/// the provided [`AttributeSet::post_gameplay_effect_execute`] runs the
/// `pre-process → default → post-process` pipeline for permanent changes.
pub trait AttributeSet: fmt::Debug + Any {
    fn descriptor(&self) -> &'static AttributeSetDescriptor;

    fn values(&self) -> &AttributeValues;

    fn values_mut(&mut self) -> &mut AttributeValues;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Return true to take over the modification and skip the default math.
    fn pre_process_instant_effect(
        &mut self,
        _data: &ModCallbackData<'_>,
        _commands: &mut Vec<DeferredCommand>,
    ) -> bool {
        false
    }

    /// Runs after the modification has been committed.
    fn post_process_instant_effect(
        &mut self,
        _data: &ModCallbackData<'_>,
        _commands: &mut Vec<DeferredCommand>,
    ) {
    }

    /// Clamp hook for recalculated current values.
    fn pre_attribute_change(&self, _index: usize, _new_value: &mut f32) {}

    /// Clamp hook for permanent base-value changes.
    fn pre_attribute_base_change(&self, _index: usize, _new_base: &mut f32) {}

    fn post_gameplay_effect_execute(
        &mut self,
        data: &ModCallbackData<'_>,
        commands: &mut Vec<DeferredCommand>,
    ) {
        if self.pre_process_instant_effect(data, commands) {
            return;
        }
        self.apply_default_modification(data);
        self.post_process_instant_effect(data, commands);
    }

    /// Applies the modifier to the base value and mirrors it into the current value.
    fn apply_default_modification(&mut self, data: &ModCallbackData<'_>) {
        let index = data.attribute.index();
        let base = self.values().base(index);
        let mut new_base = data.modifier.op.apply(base, data.magnitude);
        self.pre_attribute_base_change(index, &mut new_base);

        let values = self.values_mut();
        values.set_base(index, new_base);
        values.set_current(index, new_base);
    }
}

/// An attribute set with no hooks, built from any static descriptor.
#[derive(Debug)]
pub struct BasicAttributeSet {
    descriptor: &'static AttributeSetDescriptor,
    values: AttributeValues,
}

impl BasicAttributeSet {
    pub fn new(descriptor: &'static AttributeSetDescriptor) -> Self {
        Self {
            descriptor,
            values: AttributeValues::from_descriptor(descriptor),
        }
    }

    /// Overrides the initial value of `name`, if declared.
    pub fn with_value(mut self, name: &str, value: f32) -> Self {
        if let Some(index) = self.descriptor.index_of(name) {
            self.values.initialize(index, value);
        }
        self
    }
}

impl AttributeSet for BasicAttributeSet {
    fn descriptor(&self) -> &'static AttributeSetDescriptor {
        self.descriptor
    }

    fn values(&self) -> &AttributeValues {
        &self.values
    }

    fn values_mut(&mut self) -> &mut AttributeValues {
        &mut self.values
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
