//! Ability behaviours available to content, and the registry exposing them.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use ability_content::{BehaviourArgs, ContentRegistry};
use ability_core::{
    AbilityContext, ActiveEffectHandle, AscId, EffectDefinition, GameplayAbility, Poolable,
    TargetActor, TargetData, TargetingStatus, TaskEvent, TaskEventKind, WaitDelay, WaitTargetData,
};

use crate::calculations::{AttackPowerScaled, SetByCallerDamage};

/// The host's current target selection, shared with every targeting actor.
///
/// Actors read it once, when targeting starts.
#[derive(Clone, Debug, Default)]
pub struct TargetLock(Rc<Cell<Option<AscId>>>);

impl TargetLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, target: Option<AscId>) {
        self.0.set(target);
    }

    pub fn get(&self) -> Option<AscId> {
        self.0.get()
    }
}

/// Builds the registry every content file in this crate refers to.
///
/// Behaviours:
/// - `Strike`: commit, acquire a target, deliver the first payload effect
/// - `Fortify`: commit, hold the first payload effect on the owner for
///   `duration` seconds
///
/// Magnitudes: `AttackPower`. Executions: `SetByCallerDamage`.
pub fn registry(targets: &TargetLock) -> ContentRegistry {
    let strike_targets = targets.clone();
    ContentRegistry::new()
        .with_behaviour("Strike", move |args: &BehaviourArgs<'_>| {
            Box::new(Strike::new(args.effect(0), strike_targets.clone()))
                as Box<dyn GameplayAbility>
        })
        .with_behaviour("Fortify", |args: &BehaviourArgs<'_>| {
            Box::new(Fortify::new(args.effect(0), args.param("duration", 1.0)))
                as Box<dyn GameplayAbility>
        })
        .with_magnitude(
            "AttackPower",
            Arc::new(AttackPowerScaled { coefficient: 1.0 }),
        )
        .with_execution("SetByCallerDamage", Arc::new(SetByCallerDamage))
}

// ============================================================================
// Targeting
// ============================================================================

/// Targets whatever the lock held when targeting started.
#[derive(Debug)]
struct LockedTarget {
    lock: TargetLock,
    chosen: Option<AscId>,
}

impl TargetActor for LockedTarget {
    fn start_targeting(&mut self) {
        self.chosen = self.lock.get();
    }

    fn poll(&mut self, _dt: f32) -> TargetingStatus {
        match self.chosen {
            Some(target) => TargetingStatus::Ready(TargetData::single(target)),
            None => TargetingStatus::Cancelled,
        }
    }

    fn confirm_targeting(&mut self) {}

    fn cancel_targeting(&mut self) {
        self.chosen = None;
    }
}

// ============================================================================
// Strike
// ============================================================================

#[derive(Debug)]
pub struct Strike {
    payload: Option<Arc<EffectDefinition>>,
    targets: TargetLock,
}

impl Strike {
    pub fn new(payload: Option<Arc<EffectDefinition>>, targets: TargetLock) -> Self {
        Self { payload, targets }
    }
}

impl Poolable for Strike {
    fn reset(&mut self) {}
}

impl GameplayAbility for Strike {
    fn create_instance(&self) -> Box<dyn GameplayAbility> {
        Box::new(Strike::new(self.payload.clone(), self.targets.clone()))
    }

    fn activate_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        if !ctx.commit_ability() {
            ctx.cancel_ability();
            return;
        }
        WaitTargetData::start(
            ctx,
            Box::new(LockedTarget {
                lock: self.targets.clone(),
                chosen: None,
            }),
        );
    }

    fn on_task_event(&mut self, ctx: &mut AbilityContext<'_>, event: &TaskEvent) {
        match &event.kind {
            TaskEventKind::TargetDataReady(data) => {
                if let Some(payload) = self.payload.clone() {
                    ctx.apply_effect_to_targets(&payload, data);
                }
                ctx.end_ability();
            }
            TaskEventKind::TargetingCancelled => {
                tracing::info!(
                    target: "sim::abilities",
                    ability = %ctx.definition().name,
                    "strike has no target"
                );
                ctx.cancel_ability();
            }
            _ => {}
        }
    }
}

// ============================================================================
// Fortify
// ============================================================================

/// Holds a buff on the owner while the ability runs.
#[derive(Debug)]
pub struct Fortify {
    payload: Option<Arc<EffectDefinition>>,
    duration: f32,
    applied: Option<ActiveEffectHandle>,
}

impl Fortify {
    pub fn new(payload: Option<Arc<EffectDefinition>>, duration: f32) -> Self {
        Self {
            payload,
            duration,
            applied: None,
        }
    }
}

impl Poolable for Fortify {
    fn reset(&mut self) {
        self.applied = None;
    }
}

impl GameplayAbility for Fortify {
    fn create_instance(&self) -> Box<dyn GameplayAbility> {
        Box::new(Fortify::new(self.payload.clone(), self.duration))
    }

    fn activate_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        if !ctx.commit_ability() {
            ctx.cancel_ability();
            return;
        }
        if let Some(payload) = self.payload.clone() {
            self.applied = ctx.apply_effect_to_owner(&payload).active_handle();
        }
        WaitDelay::start(ctx, self.duration);
    }

    fn on_task_event(&mut self, ctx: &mut AbilityContext<'_>, event: &TaskEvent) {
        if event.kind == TaskEventKind::DelayFinished {
            ctx.end_ability();
        }
    }

    fn on_end_ability(&mut self, ctx: &mut AbilityContext<'_>, _was_cancelled: bool) {
        if let Some(handle) = self.applied.take() {
            ctx.asc_mut().remove_active_effect(handle);
        }
    }
}
