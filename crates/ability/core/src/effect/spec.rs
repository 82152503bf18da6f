//! One application of an effect definition.

use std::collections::HashMap;
use std::sync::Arc;

use gameplay_tags::GameplayTag;

use crate::asc::AbilitySystemComponent;
use crate::attribute::{AttributeHandle, AttributeIndex};
use crate::handle::AscId;
use crate::pool::Poolable;
use crate::prediction::PredictionKey;

use super::{EffectContext, EffectDefinition, Modifier};

/// A pooled, per-application instance of an [`EffectDefinition`].
///
/// Modifier magnitudes are evaluated once, when the spec is created, and
/// stored in a list parallel to the definition's modifiers. Later changes to
/// the source's attributes do not affect them.
#[derive(Debug, Default)]
pub struct EffectSpec {
    def: Option<Arc<EffectDefinition>>,
    source: Option<AscId>,
    target: Option<AscId>,
    context: Option<Box<dyn EffectContext>>,
    level: i32,
    duration: f32,
    magnitudes: Vec<f32>,
    resolved: Vec<Option<AttributeHandle>>,
    set_by_caller: HashMap<GameplayTag, f32>,
}

impl EffectSpec {
    /// Creates a spec for `def` owned by `source`, at `level`.
    ///
    /// Shorthand for [`AbilitySystemComponent::make_outgoing_spec`].
    pub fn create(
        def: &Arc<EffectDefinition>,
        source: &mut AbilitySystemComponent,
        level: i32,
    ) -> EffectSpec {
        source.make_outgoing_spec(def, level)
    }

    pub(crate) fn initialize(
        &mut self,
        def: Arc<EffectDefinition>,
        source: AscId,
        level: i32,
        context: Box<dyn EffectContext>,
    ) {
        self.duration = def.duration;
        self.def = Some(def);
        self.source = Some(source);
        self.level = level;
        self.context = Some(context);
    }

    /// Evaluates every modifier magnitude against `source`.
    pub(crate) fn snapshot_magnitudes(&mut self, source: &AbilitySystemComponent) {
        let Some(def) = self.def.clone() else {
            return;
        };
        let mut magnitudes = std::mem::take(&mut self.magnitudes);
        magnitudes.clear();
        for modifier in &def.modifiers {
            magnitudes.push(modifier.magnitude.evaluate(self, source));
        }
        self.magnitudes = magnitudes;
    }

    /// Binds the target and caches each modifier's attribute handle.
    pub(crate) fn set_target(&mut self, target: AscId, attributes: &AttributeIndex) {
        self.target = Some(target);
        self.resolved.clear();
        let Some(def) = self.def.as_ref() else {
            return;
        };
        for modifier in &def.modifiers {
            let handle = attributes.get(&modifier.attribute);
            if handle.is_none() {
                tracing::warn!(
                    target: "ability::effects",
                    effect = %def.name,
                    attribute = %modifier.attribute,
                    "modifier targets an attribute the target does not have"
                );
            }
            self.resolved.push(handle);
        }
    }

    pub fn definition(&self) -> Option<&Arc<EffectDefinition>> {
        self.def.as_ref()
    }

    /// Definition name, or an empty string for a recycled spec.
    pub fn name(&self) -> &str {
        self.def.as_ref().map_or("", |def| def.name.as_str())
    }

    pub fn source(&self) -> Option<AscId> {
        self.source
    }

    pub fn target(&self) -> Option<AscId> {
        self.target
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn context(&self) -> Option<&dyn EffectContext> {
        self.context.as_deref()
    }

    pub fn context_mut(&mut self) -> Option<&mut (dyn EffectContext + 'static)> {
        self.context.as_deref_mut()
    }

    pub(crate) fn take_context(&mut self) -> Option<Box<dyn EffectContext>> {
        self.context.take()
    }

    pub fn prediction_key(&self) -> PredictionKey {
        self.context
            .as_ref()
            .map_or(PredictionKey::INVALID, |context| context.prediction_key())
    }

    pub(crate) fn set_prediction_key(&mut self, key: PredictionKey) {
        if let Some(context) = self.context.as_mut() {
            context.set_prediction_key(key);
        }
    }

    /// Snapshot magnitude of modifier `index`, or 0 if there is none.
    pub fn magnitude(&self, index: usize) -> f32 {
        self.magnitudes.get(index).copied().unwrap_or(0.0)
    }

    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Cached attribute handle of modifier `index`, once a target is bound.
    pub fn resolved_attribute(&self, index: usize) -> Option<AttributeHandle> {
        self.resolved.get(index).copied().flatten()
    }

    /// Pairs each modifier with its snapshot magnitude and resolved handle.
    pub fn resolved_modifiers(
        &self,
    ) -> impl Iterator<Item = (&Modifier, f32, Option<AttributeHandle>)> {
        self.def
            .iter()
            .flat_map(|def| def.modifiers.iter())
            .enumerate()
            .map(|(index, modifier)| {
                (
                    modifier,
                    self.magnitude(index),
                    self.resolved_attribute(index),
                )
            })
    }

    pub fn set_set_by_caller_magnitude(&mut self, tag: GameplayTag, magnitude: f32) {
        self.set_by_caller.insert(tag, magnitude);
    }

    /// Reads a caller-supplied magnitude, falling back to `default`.
    pub fn get_set_by_caller_magnitude(
        &self,
        tag: &GameplayTag,
        warn_if_missing: bool,
        default: f32,
    ) -> f32 {
        match self.set_by_caller.get(tag) {
            Some(value) => *value,
            None => {
                if warn_if_missing {
                    tracing::warn!(
                        target: "ability::effects",
                        effect = %self.name(),
                        tag = %tag,
                        "set-by-caller magnitude not found; using default"
                    );
                }
                default
            }
        }
    }
}

impl Poolable for EffectSpec {
    fn reset(&mut self) {
        self.def = None;
        self.source = None;
        self.target = None;
        self.context = None;
        self.level = 0;
        self.duration = 0.0;
        self.magnitudes.clear();
        self.resolved.clear();
        self.set_by_caller.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{DefaultEffectContext, DurationPolicy};

    fn spec_for(def: Arc<EffectDefinition>) -> EffectSpec {
        let mut spec = EffectSpec::default();
        spec.initialize(def, AscId(1), 2, Box::new(DefaultEffectContext::default()));
        spec
    }

    #[test]
    fn reset_clears_every_reference() {
        let def = EffectDefinition::builder("Burn", DurationPolicy::HasDuration)
            .duration(3.0)
            .modifier(Modifier::add("Health", -1.0))
            .build();
        let mut spec = spec_for(def);
        spec.set_set_by_caller_magnitude(GameplayTag::new("Data.Damage"), 4.0);
        spec.magnitudes.push(-1.0);
        spec.resolved.push(None);
        assert_eq!(spec.duration(), 3.0);

        spec.reset();
        assert!(spec.definition().is_none());
        assert!(spec.source().is_none());
        assert!(spec.context().is_none());
        assert!(spec.magnitudes().is_empty());
        assert!(spec.resolved.is_empty());
        assert_eq!(
            spec.get_set_by_caller_magnitude(&GameplayTag::new("Data.Damage"), false, 0.5),
            0.5
        );
    }

    #[test]
    fn set_by_caller_round_trip() {
        let def = EffectDefinition::builder("Hit", DurationPolicy::Instant).build();
        let mut spec = spec_for(def);
        let tag = GameplayTag::new("Data.Multiplier");
        spec.set_set_by_caller_magnitude(tag.clone(), 2.0);
        assert_eq!(spec.get_set_by_caller_magnitude(&tag, true, 1.0), 2.0);
    }

    #[test]
    fn prediction_key_lives_on_context() {
        let def = EffectDefinition::builder("Hit", DurationPolicy::Instant).build();
        let mut spec = spec_for(def);
        assert!(!spec.prediction_key().is_valid());
        spec.set_prediction_key(PredictionKey::from_raw(5));
        assert_eq!(spec.prediction_key(), PredictionKey::from_raw(5));
    }
}
