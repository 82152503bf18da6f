//! Duration, period and stack state of an applied effect.

use crate::asc::AbilitySystemComponent;
use crate::config::AbilitySystemConfig;
use crate::handle::ActiveEffectHandle;
use crate::pool::Poolable;

use super::{DurationPolicy, EffectSpec};

/// Period timer value for effects without a period.
const NO_PERIOD: f32 = -1.0;

/// A spec applied with a duration or infinite policy.
#[derive(Debug, Default)]
pub struct ActiveEffect {
    handle: ActiveEffectHandle,
    spec: EffectSpec,
    time_remaining: f32,
    stack_count: u32,
    period_timer: f32,
    is_expired: bool,
}

impl ActiveEffect {
    pub(crate) fn initialize(&mut self, handle: ActiveEffectHandle, spec: EffectSpec) {
        let periodic = spec.definition().is_some_and(|def| def.is_periodic());
        self.handle = handle;
        self.time_remaining = spec.duration();
        self.spec = spec;
        self.stack_count = 1;
        self.is_expired = false;
        // Periodic effects fire on the first tick after application.
        self.period_timer = if periodic { 0.0 } else { NO_PERIOD };
    }

    pub fn handle(&self) -> ActiveEffectHandle {
        self.handle
    }

    pub fn spec(&self) -> &EffectSpec {
        &self.spec
    }

    pub(crate) fn take_spec(&mut self) -> EffectSpec {
        std::mem::take(&mut self.spec)
    }

    pub fn time_remaining(&self) -> f32 {
        self.time_remaining
    }

    pub fn stack_count(&self) -> u32 {
        self.stack_count
    }

    pub fn period_timer(&self) -> f32 {
        self.period_timer
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired
    }

    /// False for a slot whose effect has been taken out or recycled.
    pub(crate) fn is_occupied(&self) -> bool {
        self.spec.definition().is_some()
    }

    fn period(&self) -> f32 {
        self.spec.definition().map_or(0.0, |def| def.period)
    }

    fn has_duration(&self) -> bool {
        self.spec
            .definition()
            .is_some_and(|def| def.duration_policy == DurationPolicy::HasDuration)
    }

    /// Adds one stack, up to the definition's limit.
    pub(crate) fn on_stack_applied(&mut self) {
        let Some(def) = self.spec.definition() else {
            return;
        };
        let limit = def.stacking.limit.max(1);
        let refresh = def.stacking.refreshes();
        self.stack_count = (self.stack_count + 1).min(limit);
        if refresh {
            self.refresh_duration_and_period();
        }
    }

    /// Restarts the duration and period timers without touching the stack count.
    pub(crate) fn refresh_duration_and_period(&mut self) {
        if self.has_duration() {
            self.time_remaining = self.spec.duration();
        }
        if self.period_timer >= 0.0 {
            self.period_timer = self.period();
        }
    }

    /// Advances timers by `dt`, executing the periodic payload on `asc`.
    ///
    /// Returns true once the effect has expired; the caller removes it.
    pub(crate) fn tick(&mut self, dt: f32, asc: &mut AbilitySystemComponent) -> bool {
        if self.has_duration() && !self.is_expired {
            self.time_remaining -= dt;
            if self.time_remaining <= AbilitySystemConfig::TIMER_TOLERANCE {
                self.time_remaining = 0.0;
                self.is_expired = true;
            }
        }

        if self.period_timer >= 0.0 {
            self.period_timer -= dt;
            if self.period_timer <= AbilitySystemConfig::TIMER_TOLERANCE {
                tracing::trace!(
                    target: "ability::effects",
                    effect = %self.spec.name(),
                    handle = %self.handle,
                    "periodic execution"
                );
                asc.execute_periodic_effect(&self.spec);
                self.period_timer = self.period();
            }
        }

        self.is_expired
    }
}

impl Poolable for ActiveEffect {
    fn reset(&mut self) {
        self.handle = ActiveEffectHandle::INVALID;
        self.spec.reset();
        self.time_remaining = 0.0;
        self.stack_count = 0;
        self.period_timer = NO_PERIOD;
        self.is_expired = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{
        DefaultEffectContext, EffectDefinition, StackDurationRefresh, StackingPolicy,
    };
    use crate::handle::AscId;

    fn active(def: std::sync::Arc<EffectDefinition>) -> ActiveEffect {
        let mut spec = EffectSpec::default();
        spec.initialize(def, AscId(1), 1, Box::new(DefaultEffectContext::default()));
        let mut effect = ActiveEffect::default();
        effect.initialize(ActiveEffectHandle(1), spec);
        effect
    }

    #[test]
    fn periodic_effect_starts_with_zero_timer() {
        let def = EffectDefinition::builder("Poison", DurationPolicy::Infinite)
            .period(1.0)
            .build();
        assert_eq!(active(def).period_timer(), 0.0);

        let def = EffectDefinition::builder("Buff", DurationPolicy::Infinite).build();
        assert!(active(def).period_timer() < 0.0);
    }

    #[test]
    fn stacks_clamp_and_refresh() {
        let def = EffectDefinition::builder("Rage", DurationPolicy::HasDuration)
            .duration(5.0)
            .stacking(StackingPolicy::by_target(2))
            .build();
        let mut effect = active(def);
        effect.time_remaining = 1.0;

        effect.on_stack_applied();
        assert_eq!(effect.stack_count(), 2);
        assert_eq!(effect.time_remaining(), 5.0);

        effect.on_stack_applied();
        assert_eq!(effect.stack_count(), 2);
    }

    #[test]
    fn never_refresh_keeps_timer() {
        let def = EffectDefinition::builder("Rage", DurationPolicy::HasDuration)
            .duration(5.0)
            .stacking(
                StackingPolicy::by_target(3).with_refresh(StackDurationRefresh::NeverRefresh),
            )
            .build();
        let mut effect = active(def);
        effect.time_remaining = 1.0;
        effect.on_stack_applied();
        assert_eq!(effect.stack_count(), 2);
        assert_eq!(effect.time_remaining(), 1.0);
    }

    #[test]
    fn reset_empties_the_slot() {
        let def = EffectDefinition::builder("Buff", DurationPolicy::Infinite).build();
        let mut effect = active(def);
        assert!(effect.is_occupied());
        effect.reset();
        assert!(!effect.is_occupied());
        assert_eq!(effect.stack_count(), 0);
    }
}
