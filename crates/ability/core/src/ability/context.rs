//! The handle behaviour code uses to reach its owning component.

use std::sync::Arc;

use crate::asc::AbilitySystemComponent;
use crate::effect::{ApplyEffectResult, EffectDefinition, EffectSpec, TargetData};
use crate::handle::{AbilitySpecHandle, AscId};
use crate::prediction::{ActivationInfo, PredictionKey};

use super::spec::{AbilityEndReason, AbilityRuntime};
use super::task::{TaskNotice, TaskSet};
use super::{AbilityDefinition, AbilityTask, TaskHandle};

/// Access to the owning component during an ability callback.
pub struct AbilityContext<'a> {
    asc: &'a mut AbilitySystemComponent,
    runtime: &'a mut AbilityRuntime,
    handle: AbilitySpecHandle,
    definition: Arc<AbilityDefinition>,
    level: i32,
}

impl<'a> AbilityContext<'a> {
    pub(crate) fn new(
        asc: &'a mut AbilitySystemComponent,
        runtime: &'a mut AbilityRuntime,
        handle: AbilitySpecHandle,
        definition: Arc<AbilityDefinition>,
        level: i32,
    ) -> Self {
        Self {
            asc,
            runtime,
            handle,
            definition,
            level,
        }
    }

    pub fn spec_handle(&self) -> AbilitySpecHandle {
        self.handle
    }

    pub fn definition(&self) -> &Arc<AbilityDefinition> {
        &self.definition
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn activation(&self) -> ActivationInfo {
        self.runtime.activation
    }

    pub fn prediction_key(&self) -> PredictionKey {
        self.runtime.activation.prediction_key
    }

    pub fn owner(&self) -> AscId {
        self.asc.id()
    }

    pub fn asc(&self) -> &AbilitySystemComponent {
        self.asc
    }

    pub fn asc_mut(&mut self) -> &mut AbilitySystemComponent {
        self.asc
    }

    // ===== cost and cooldown =====

    /// Returns true if the owner can pay the cost right now.
    pub fn check_cost(&self) -> bool {
        self.asc.check_cost(&self.definition, self.level)
    }

    /// Applies the cost and cooldown effects to the owner.
    ///
    /// Returns false, applying nothing, if the cost can no longer be paid.
    pub fn commit_ability(&mut self) -> bool {
        if !self.check_cost() {
            tracing::info!(
                target: "ability::abilities",
                ability = %self.definition.name,
                "commit failed: insufficient cost"
            );
            return false;
        }
        let definition = Arc::clone(&self.definition);
        if let Some(cost) = definition.cost.as_ref() {
            self.apply_effect_to_owner(cost);
        }
        if let Some(cooldown) = definition.cooldown.as_ref() {
            self.apply_effect_to_owner(cooldown);
        }
        true
    }

    // ===== effects =====

    /// Creates a spec at the ability's level, instigated by this ability.
    pub fn make_outgoing_spec(&mut self, def: &Arc<EffectDefinition>) -> EffectSpec {
        let mut spec = self.asc.make_outgoing_spec(def, self.level);
        let owner = self.asc.id();
        if let Some(context) = spec.context_mut() {
            context.set_instigator(owner, Some(self.handle));
        }
        spec
    }

    pub fn apply_effect_to_owner(&mut self, def: &Arc<EffectDefinition>) -> ApplyEffectResult {
        let spec = self.make_outgoing_spec(def);
        self.asc.apply_effect_spec_to_self(spec)
    }

    pub fn apply_spec_to_owner(&mut self, spec: EffectSpec) -> ApplyEffectResult {
        self.asc.apply_effect_spec_to_self(spec)
    }

    /// Queues `spec` for delivery to another component.
    pub fn apply_spec_to_target(&mut self, spec: EffectSpec, target: AscId) {
        self.asc.queue_outgoing_effect(target, spec);
    }

    /// Queues a spec of `def` for every target in `data`.
    pub fn apply_effect_to_targets(&mut self, def: &Arc<EffectDefinition>, data: &TargetData) {
        for target in &data.targets {
            let mut spec = self.make_outgoing_spec(def);
            if let Some(context) = spec.context_mut() {
                context.set_target_data(data.clone());
            }
            if *target == self.asc.id() {
                self.asc.apply_effect_spec_to_self(spec);
            } else {
                self.asc.queue_outgoing_effect(*target, spec);
            }
        }
    }

    // ===== tasks =====

    /// A reset task of type `T`, recycled from the owner's pool if possible.
    pub fn new_task<T: AbilityTask + Default>(&mut self) -> Box<T> {
        TaskSet::acquire::<T>(&mut self.asc.pools.tasks)
    }

    /// Activates `task` for this ability.
    pub fn start_task<T: AbilityTask>(&mut self, task: Box<T>) -> TaskHandle {
        self.runtime.tasks.start(task, &mut self.asc.pools.tasks)
    }

    /// Cancels a running task; its completion is never reported.
    pub fn cancel_task(&mut self, task: TaskHandle) -> bool {
        self.runtime.tasks.cancel(task, &mut self.asc.pools.tasks)
    }

    pub fn is_task_running(&self, task: TaskHandle) -> bool {
        self.runtime.tasks.is_running(task)
    }

    pub fn task_mut<T: AbilityTask>(&mut self, task: TaskHandle) -> Option<&mut T> {
        self.runtime.tasks.task_mut(task)
    }

    // ===== lifetime =====

    /// Ends the ability once the current callback returns.
    pub fn end_ability(&mut self) {
        self.runtime.end_request = Some(AbilityEndReason::merge(
            self.runtime.end_request,
            AbilityEndReason::Ended,
        ));
    }

    /// Cancels the ability once the current callback returns.
    pub fn cancel_ability(&mut self) {
        self.runtime.end_request = Some(AbilityEndReason::Cancelled);
    }

    pub fn is_ending(&self) -> bool {
        self.runtime.end_request.is_some()
    }

    pub(crate) fn next_task_notice(&mut self) -> Option<TaskNotice> {
        self.runtime.tasks.next_notice()
    }
}
