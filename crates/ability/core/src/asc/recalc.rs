//! Current-value recalculation for dirty attributes.

use crate::attribute::{AttributeHandle, ModifierAggregator};

use super::AbilitySystemComponent;

impl AbilitySystemComponent {
    /// Rebuilds the current value of every dirty attribute from its base
    /// value and the modifiers of the active effects indexed on it.
    ///
    /// Periodic effects and effects whose ongoing requirements are unmet
    /// contribute nothing.
    pub fn recalculate_dirty_attributes(&mut self) {
        let dirty = std::mem::take(&mut self.dirty_attributes);
        for attribute in dirty {
            self.recalculate_attribute(attribute);
        }
    }

    fn recalculate_attribute(&mut self, attribute: AttributeHandle) {
        let base = self.base_value_of(attribute);
        let mut aggregator = ModifierAggregator::new();

        if let Some(handles) = self.effect_index.get(&attribute) {
            for handle in handles {
                let Some(effect) = self.active_effects.get(handle) else {
                    continue;
                };
                let Some(def) = effect.spec().definition() else {
                    continue;
                };
                if def.is_periodic()
                    || !def
                        .ongoing_requirements
                        .requirements_met(&self.combined_tags)
                {
                    continue;
                }
                let stacks = effect.stack_count() as f32;
                for (modifier, magnitude, resolved) in effect.spec().resolved_modifiers() {
                    if resolved == Some(attribute) {
                        aggregator.add(modifier.op, magnitude * stacks);
                    }
                }
            }
        }

        let Some(set) = self.attribute_sets.get_mut(attribute.set_index()) else {
            return;
        };
        let mut value = aggregator.evaluate(base);
        set.pre_attribute_change(attribute.index(), &mut value);
        set.values_mut().set_current(attribute.index(), value);
        self.sync_attribute_set(attribute.set_index());

        tracing::trace!(
            target: "ability::attributes",
            attribute = %attribute,
            base,
            current = value,
            "attribute recalculated"
        );
    }
}
