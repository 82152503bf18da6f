//! Per-application context objects and the factory that supplies them.

use std::fmt;

use crate::handle::{AbilitySpecHandle, AscId};
use crate::pool::{Pool, Poolable};
use crate::prediction::PredictionKey;

/// Targets chosen for an ability, typically by a targeting actor.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetData {
    pub targets: Vec<AscId>,
    pub hit_location: Option<[f32; 3]>,
}

impl TargetData {
    pub fn single(target: AscId) -> Self {
        Self {
            targets: vec![target],
            hit_location: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty() && self.hit_location.is_none()
    }
}

/// Who caused an effect application and under which prediction.
pub trait EffectContext: Poolable + fmt::Debug {
    fn instigator(&self) -> Option<AscId>;

    /// Ability spec that applied the effect, if any.
    fn ability(&self) -> Option<AbilitySpecHandle>;

    fn target_data(&self) -> Option<&TargetData>;

    fn prediction_key(&self) -> PredictionKey;

    fn set_instigator(&mut self, instigator: AscId, ability: Option<AbilitySpecHandle>);

    fn set_target_data(&mut self, data: TargetData);

    fn set_prediction_key(&mut self, key: PredictionKey);
}

/// The stock context.
#[derive(Clone, Debug, Default)]
pub struct DefaultEffectContext {
    instigator: Option<AscId>,
    ability: Option<AbilitySpecHandle>,
    target_data: Option<TargetData>,
    prediction_key: PredictionKey,
}

impl Poolable for DefaultEffectContext {
    fn reset(&mut self) {
        self.instigator = None;
        self.ability = None;
        self.target_data = None;
        self.prediction_key = PredictionKey::INVALID;
    }
}

impl EffectContext for DefaultEffectContext {
    fn instigator(&self) -> Option<AscId> {
        self.instigator
    }

    fn ability(&self) -> Option<AbilitySpecHandle> {
        self.ability
    }

    fn target_data(&self) -> Option<&TargetData> {
        self.target_data.as_ref()
    }

    fn prediction_key(&self) -> PredictionKey {
        self.prediction_key
    }

    fn set_instigator(&mut self, instigator: AscId, ability: Option<AbilitySpecHandle>) {
        self.instigator = Some(instigator);
        self.ability = ability;
    }

    fn set_target_data(&mut self, data: TargetData) {
        self.target_data = Some(data);
    }

    fn set_prediction_key(&mut self, key: PredictionKey) {
        self.prediction_key = key;
    }
}

/// Supplies a context for each new effect spec.
pub trait EffectContextFactory {
    fn create(&mut self) -> Box<dyn EffectContext>;

    /// Takes back a context whose spec has been recycled.
    fn release(&mut self, context: Box<dyn EffectContext>) {
        drop(context);
    }
}

/// Factory handing out pooled [`DefaultEffectContext`]s.
#[derive(Debug)]
pub struct PooledContextFactory {
    pool: Pool<Box<dyn EffectContext>>,
}

impl PooledContextFactory {
    pub fn new(prewarm: usize, max_retained: usize) -> Self {
        Self {
            pool: Pool::with_prewarm(max_retained, prewarm, new_default_context),
        }
    }

    pub fn idle(&self) -> usize {
        self.pool.available()
    }
}

impl Default for PooledContextFactory {
    fn default() -> Self {
        Self::new(
            crate::config::AbilitySystemConfig::DEFAULT_POOL_PREWARM,
            crate::config::AbilitySystemConfig::DEFAULT_MAX_POOLED_PER_TYPE,
        )
    }
}

fn new_default_context() -> Box<dyn EffectContext> {
    Box::new(DefaultEffectContext::default())
}

impl EffectContextFactory for PooledContextFactory {
    fn create(&mut self) -> Box<dyn EffectContext> {
        self.pool.acquire_with(new_default_context)
    }

    fn release(&mut self, context: Box<dyn EffectContext>) {
        self.pool.release(context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_contexts_come_back_clean() {
        let mut factory = PooledContextFactory::new(0, 4);
        let mut context = factory.create();
        context.set_instigator(AscId(7), None);
        context.set_prediction_key(PredictionKey::from_raw(3));
        context.set_target_data(TargetData::single(AscId(2)));
        factory.release(context);
        assert_eq!(factory.idle(), 1);

        let reused = factory.create();
        assert_eq!(reused.instigator(), None);
        assert!(!reused.prediction_key().is_valid());
        assert!(reused.target_data().is_none());
    }
}
