//! Granting, activation, prediction and ending of abilities.

use std::borrow::Cow;
use std::sync::Arc;

use gameplay_tags::{TagContainer, TagCountContainer, TagPredicate};

use crate::ability::{
    AbilityContext, AbilityDefinition, AbilityEndReason, AbilitySpec, AbilityState,
    GameplayAbility, InstancingPolicy, NetExecutionPolicy, TaskNotice,
};
use crate::error::{ActivationError, SystemError};
use crate::handle::{AbilitySpecHandle, ActiveEffectHandle};
use crate::pool::Poolable;
use crate::prediction::{ActivationInfo, PredictionKey};

use super::AbilitySystemComponent;

impl AbilitySystemComponent {
    // ========================================================================
    // Granting
    // ========================================================================

    /// Grants `def` at `level` and returns the new spec's handle.
    pub fn grant_ability(&mut self, def: &Arc<AbilityDefinition>, level: i32) -> AbilitySpecHandle {
        self.grant_ability_internal(def, level, None)
    }

    pub(crate) fn grant_ability_internal(
        &mut self,
        def: &Arc<AbilityDefinition>,
        level: i32,
        granted_by: Option<ActiveEffectHandle>,
    ) -> AbilitySpecHandle {
        let handle = AbilitySpecHandle(self.ability_handles.next());
        let actor = self.actor_info();

        let mut spec = self.pools.ability_specs.acquire();
        spec.handle = handle;
        spec.definition = Some(Arc::clone(def));
        spec.level = level;
        spec.owner = Some(self.id);
        spec.granted_by = granted_by;

        match def.instancing {
            InstancingPolicy::NonInstanced => {
                let mut template = def.create_instance();
                template.on_give_ability(&actor, handle);
                spec.template = Some(template);
            }
            InstancingPolicy::InstancedPerActor => {
                let mut instance = def.create_instance();
                instance.on_give_ability(&actor, handle);
                spec.instance = Some(instance);
            }
            InstancingPolicy::InstancedPerExecution => {}
        }

        self.abilities.push(spec);
        tracing::debug!(
            target: "ability::abilities",
            ability = %def.name,
            handle = %handle,
            level,
            asc = self.id.0,
            "ability granted"
        );
        handle
    }

    /// Removes a granted ability, cancelling it first if it is active.
    pub fn clear_ability(&mut self, handle: AbilitySpecHandle) -> bool {
        if self.ability_spec(handle).is_some_and(AbilitySpec::is_active) {
            self.cancel_ability(handle);
        }
        let Some(index) = self.spec_index(handle) else {
            return false;
        };

        let mut spec = self.abilities.remove(index);
        if spec.is_active()
            && let Some(def) = spec.definition.as_ref()
        {
            // Still inside a callback; the cancel could not complete.
            self.blocked_ability_tags
                .remove_tags(&def.block_abilities_with_tag);
        }
        for mut behaviour in [spec.template.take(), spec.instance.take(), spec.recycled.take()]
            .into_iter()
            .flatten()
        {
            behaviour.on_remove_ability();
        }
        spec.runtime.tasks.cancel_all(&mut self.pools.tasks);

        tracing::debug!(
            target: "ability::abilities",
            ability = %spec.name(),
            handle = %handle,
            "ability cleared"
        );
        self.pools.ability_specs.release(spec);
        true
    }

    // ========================================================================
    // Queries
    // ========================================================================

    fn spec_index(&self, handle: AbilitySpecHandle) -> Option<usize> {
        self.abilities.iter().position(|spec| spec.handle == handle)
    }

    pub fn ability_spec(&self, handle: AbilitySpecHandle) -> Option<&AbilitySpec> {
        self.abilities.iter().find(|spec| spec.handle == handle)
    }

    /// First granted spec whose definition is named `name`.
    pub fn find_ability_spec(&self, name: &str) -> Option<&AbilitySpec> {
        self.abilities.iter().find(|spec| spec.name() == name)
    }

    pub fn activatable_abilities(&self) -> &[AbilitySpec] {
        &self.abilities
    }

    // ========================================================================
    // Activation gate
    // ========================================================================

    /// Checks whether `handle` may be activated locally right now.
    pub fn can_activate_ability(&self, handle: AbilitySpecHandle) -> Result<(), ActivationError> {
        self.check_activation(handle, None)
    }

    /// The activation gate as the authority sees it.
    ///
    /// With a valid `key`, state produced by that predicted activation (its
    /// granted tags, its block tags, its paid cost) does not count against it.
    pub fn can_activate_authoritative(
        &self,
        handle: AbilitySpecHandle,
        key: PredictionKey,
    ) -> Result<(), ActivationError> {
        self.check_activation(handle, key.is_valid().then_some(key))
    }

    fn check_activation(
        &self,
        handle: AbilitySpecHandle,
        key: Option<PredictionKey>,
    ) -> Result<(), ActivationError> {
        let spec = self
            .ability_spec(handle)
            .ok_or(ActivationError::SpecNotFound(handle))?;
        let def = spec
            .definition()
            .ok_or(ActivationError::SpecNotFound(handle))?;

        if spec.is_active() && key.is_none() {
            return Err(ActivationError::AlreadyActive);
        }

        let owner_tags = self.owner_tags_excluding(key);
        let blocked = match key {
            Some(key) if spec.is_active() && spec.activation().prediction_key == key => {
                let mut blocked = self.blocked_ability_tags.clone();
                blocked.remove_tags(&def.block_abilities_with_tag);
                Cow::Owned(blocked)
            }
            _ => Cow::Borrowed(&self.blocked_ability_tags),
        };

        let ability_blocked = blocked.tags().any(|block| def.ability_tags.has_tag(block));
        if ability_blocked || owner_tags.has_any(&def.activation_blocked_tags) {
            return Err(ActivationError::Blocked);
        }
        if !owner_tags.has_all(&def.activation_required_tags) {
            return Err(ActivationError::MissingRequiredTags);
        }
        if let Some(cooldown) = def.cooldown_tags()
            && owner_tags.has_any(cooldown)
        {
            return Err(ActivationError::OnCooldown);
        }
        if key.is_none() && !self.check_cost(def, spec.level()) {
            return Err(ActivationError::InsufficientCost);
        }
        Ok(())
    }

    /// Owner tags, minus tags granted by effects applied under `key`.
    fn owner_tags_excluding(&self, key: Option<PredictionKey>) -> Cow<'_, TagCountContainer> {
        let Some(key) = key else {
            return Cow::Borrowed(&self.combined_tags);
        };
        let mut tags = self.combined_tags.clone();
        for handle in &self.pending_predicted {
            let Some(effect) = self.active_effect(*handle) else {
                continue;
            };
            if effect.spec().prediction_key() != key {
                continue;
            }
            if let Some(def) = effect.spec().definition() {
                tags.remove_tags(&def.granted_tags);
            }
        }
        Cow::Owned(tags)
    }

    /// Returns true if the owner can pay the cost of `def` at `level`.
    ///
    /// Only scalable magnitudes are checked; custom calculations are assumed
    /// payable.
    pub(crate) fn check_cost(&self, def: &AbilityDefinition, level: i32) -> bool {
        let Some(cost) = def.cost.as_ref() else {
            return true;
        };
        for modifier in &cost.modifiers {
            let Some(magnitude) = modifier.magnitude.scalable_at(level) else {
                continue;
            };
            let Some(attribute) = self.attribute(&modifier.attribute) else {
                tracing::warn!(
                    target: "ability::abilities",
                    ability = %def.name,
                    attribute = %modifier.attribute,
                    "cost targets an unknown attribute"
                );
                continue;
            };
            let current = self.current_value_of(attribute);
            if modifier.op.apply(current, magnitude) < 0.0 {
                return false;
            }
        }
        true
    }

    // ========================================================================
    // Activation
    // ========================================================================

    /// Activates a granted ability according to its net execution policy.
    ///
    /// A predicted activation that the authority rejects is rolled back and
    /// still returns `Ok`; inspect the spec's end reason to observe it.
    pub fn try_activate_ability(
        &mut self,
        handle: AbilitySpecHandle,
    ) -> Result<(), ActivationError> {
        if let Err(err) = self.can_activate_ability(handle) {
            tracing::info!(
                target: "ability::abilities",
                handle = %handle,
                code = err.error_code(),
                severity = err.severity().as_str(),
                "activation refused: {err}"
            );
            return Err(err);
        }
        let policy = self
            .ability_spec(handle)
            .and_then(AbilitySpec::definition)
            .map_or(NetExecutionPolicy::default(), |def| def.net_execution);

        match policy {
            NetExecutionPolicy::LocalOnly => {
                self.activate_ability_internal(handle, ActivationInfo::default());
                Ok(())
            }
            NetExecutionPolicy::LocalPredicted => {
                let activation = ActivationInfo::predicted(self.prediction_keys.next_key());
                self.activate_ability_internal(handle, activation);
                self.server_try_activate(handle, activation)
            }
            NetExecutionPolicy::ServerOnly => {
                self.server_try_activate(handle, ActivationInfo::default())
            }
        }
    }

    fn server_try_activate(
        &mut self,
        handle: AbilitySpecHandle,
        activation: ActivationInfo,
    ) -> Result<(), ActivationError> {
        let verdict = match self.authority.take() {
            Some(mut authority) => {
                let verdict = authority.confirm_activation(self, handle, &activation);
                self.authority = Some(authority);
                verdict
            }
            None => self.can_activate_authoritative(handle, activation.prediction_key),
        };

        let key = activation.prediction_key;
        match verdict {
            Ok(()) if activation.is_predicted() => {
                self.confirm_prediction(key);
                Ok(())
            }
            Ok(()) => {
                self.activate_ability_internal(handle, activation);
                Ok(())
            }
            Err(err) if activation.is_predicted() => {
                tracing::warn!(
                    target: "ability::prediction",
                    handle = %handle,
                    key = %key,
                    code = err.error_code(),
                    "predicted activation rejected: {err}"
                );
                self.rollback_prediction(handle, key);
                Ok(())
            }
            Err(err) => {
                tracing::info!(
                    target: "ability::abilities",
                    handle = %handle,
                    code = err.error_code(),
                    "authority refused activation: {err}"
                );
                Err(ActivationError::RejectedByAuthority(err.to_string()))
            }
        }
    }

    fn confirm_prediction(&mut self, key: PredictionKey) {
        let effects = &self.active_effects;
        self.pending_predicted.retain(|handle| {
            effects
                .get(handle)
                .is_some_and(|effect| effect.spec().prediction_key() != key)
        });
        tracing::debug!(target: "ability::prediction", key = %key, "prediction confirmed");
    }

    fn rollback_prediction(&mut self, handle: AbilitySpecHandle, key: PredictionKey) {
        let predicted: Vec<ActiveEffectHandle> = self
            .pending_predicted
            .iter()
            .copied()
            .filter(|effect| {
                self.active_effects
                    .get(effect)
                    .is_some_and(|effect| effect.spec().prediction_key() == key)
            })
            .collect();
        let removed = predicted.len();
        for effect in predicted {
            self.remove_active_effect(effect);
        }

        match self.ability_spec(handle) {
            Some(spec) if spec.is_active() => {
                self.cancel_ability(handle);
            }
            Some(_) => {
                if let Some(index) = self.spec_index(handle) {
                    self.abilities[index].last_end = Some(AbilityEndReason::Cancelled);
                }
            }
            None => {}
        }

        tracing::info!(
            target: "ability::prediction",
            key = %key,
            handle = %handle,
            removed_effects = removed,
            "prediction rolled back"
        );
    }

    fn activate_ability_internal(&mut self, handle: AbilitySpecHandle, activation: ActivationInfo) {
        let Some(index) = self.spec_index(handle) else {
            return;
        };
        let Some(def) = self.abilities[index].definition.clone() else {
            return;
        };

        if def.instancing == InstancingPolicy::InstancedPerExecution {
            let actor = self.actor_info();
            let spec = &mut self.abilities[index];
            let mut instance = spec
                .recycled
                .take()
                .unwrap_or_else(|| def.create_instance());
            instance.on_give_ability(&actor, handle);
            spec.instance = Some(instance);
        }

        let spec = &mut self.abilities[index];
        spec.state = AbilityState::Activating;
        spec.last_end = None;
        spec.pending_end = None;
        spec.runtime.activation = activation;
        spec.runtime.end_request = None;

        if !def.cancel_abilities_with_tag.is_empty() {
            self.cancel_abilities_with_tags(&def.cancel_abilities_with_tag, Some(handle));
        }
        self.blocked_ability_tags
            .add_tags(&def.block_abilities_with_tag);

        tracing::info!(
            target: "ability::abilities",
            ability = %def.name,
            handle = %handle,
            key = %activation.prediction_key,
            asc = self.id.0,
            "ability activated"
        );

        let previous = std::mem::replace(
            &mut self.current_prediction_key,
            activation.prediction_key,
        );
        self.run_ability_callback(handle, |ability, ctx| ability.activate_ability(ctx));
        self.current_prediction_key = previous;
    }

    /// Cancels every active ability whose tags match `tags`.
    pub fn cancel_abilities_with_tags(
        &mut self,
        tags: &TagContainer,
        except: Option<AbilitySpecHandle>,
    ) -> usize {
        let matching: Vec<AbilitySpecHandle> = self
            .abilities
            .iter()
            .filter(|spec| Some(spec.handle) != except && spec.is_active())
            .filter(|spec| {
                spec.definition()
                    .is_some_and(|def| def.ability_tags.has_any(tags))
            })
            .map(AbilitySpec::handle)
            .collect();
        let cancelled = matching.len();
        for handle in matching {
            self.cancel_ability(handle);
        }
        cancelled
    }

    /// Runs `f` on the ability's behaviour, then delivers queued task
    /// notices and applies any end requested along the way.
    fn run_ability_callback<F>(&mut self, handle: AbilitySpecHandle, f: F)
    where
        F: FnOnce(&mut dyn GameplayAbility, &mut AbilityContext<'_>),
    {
        let Some(index) = self.spec_index(handle) else {
            return;
        };
        let spec = &mut self.abilities[index];
        let Some(def) = spec.definition.clone() else {
            return;
        };
        let level = spec.level;
        let from_instance = spec.instance.is_some();
        let Some(mut behaviour) = spec.instance.take().or_else(|| spec.template.take()) else {
            tracing::warn!(
                target: "ability::abilities",
                ability = %def.name,
                "ability has no behaviour to run"
            );
            return;
        };
        let mut runtime = std::mem::take(&mut spec.runtime);
        spec.busy = true;

        {
            let mut ctx = AbilityContext::new(self, &mut runtime, handle, def, level);
            f(behaviour.as_mut(), &mut ctx);
            loop {
                if ctx.is_ending() {
                    break;
                }
                let Some(notice) = ctx.next_task_notice() else {
                    break;
                };
                match notice {
                    TaskNotice::Event(event) => behaviour.on_task_event(&mut ctx, &event),
                    TaskNotice::Ended { task, cancelled } => {
                        behaviour.on_task_ended(&mut ctx, task, cancelled)
                    }
                }
            }
        }

        let Some(index) = self.spec_index(handle) else {
            // Cleared while the callback ran.
            runtime.tasks.cancel_all(&mut self.pools.tasks);
            behaviour.on_remove_ability();
            return;
        };
        let spec = &mut self.abilities[index];
        spec.busy = false;
        let mut end = runtime.end_request.take();
        if let Some(pending) = spec.pending_end.take() {
            end = Some(AbilityEndReason::merge(end, pending));
        }
        if spec.state == AbilityState::Activating {
            spec.state = AbilityState::Active;
        }
        spec.runtime = runtime;
        if from_instance {
            spec.instance = Some(behaviour);
        } else {
            spec.template = Some(behaviour);
        }

        if let Some(reason) = end {
            self.finish_ability(handle, reason);
        }
    }

    // ========================================================================
    // Ending
    // ========================================================================

    /// Ends an active ability normally.
    pub fn end_ability(&mut self, handle: AbilitySpecHandle) {
        self.finish_ability(handle, AbilityEndReason::Ended);
    }

    /// Cancels an active ability.
    pub fn cancel_ability(&mut self, handle: AbilitySpecHandle) {
        self.finish_ability(handle, AbilityEndReason::Cancelled);
    }

    fn finish_ability(&mut self, handle: AbilitySpecHandle, reason: AbilityEndReason) {
        let Some(index) = self.spec_index(handle) else {
            return;
        };
        let spec = &mut self.abilities[index];
        if !spec.is_active() {
            return;
        }
        if spec.busy {
            spec.pending_end = Some(AbilityEndReason::merge(spec.pending_end, reason));
            return;
        }
        let Some(def) = spec.definition.clone() else {
            return;
        };

        let level = spec.level;
        spec.state = AbilityState::Inactive;
        spec.last_end = Some(reason);
        spec.pending_end = None;
        spec.busy = true;
        let mut runtime = std::mem::take(&mut spec.runtime);
        let from_instance = spec.instance.is_some();
        let mut behaviour = spec.instance.take().or_else(|| spec.template.take());

        self.blocked_ability_tags
            .remove_tags(&def.block_abilities_with_tag);
        runtime.tasks.cancel_all(&mut self.pools.tasks);

        let cancelled = reason == AbilityEndReason::Cancelled;
        if let Some(behaviour) = behaviour.as_mut() {
            let mut ctx = AbilityContext::new(self, &mut runtime, handle, Arc::clone(&def), level);
            behaviour.on_end_ability(&mut ctx, cancelled);
        }
        runtime.tasks.cancel_all(&mut self.pools.tasks);
        runtime.end_request = None;
        runtime.activation = ActivationInfo::default();

        let Some(index) = self.spec_index(handle) else {
            if let Some(mut behaviour) = behaviour {
                behaviour.on_remove_ability();
            }
            return;
        };
        let spec = &mut self.abilities[index];
        spec.busy = false;
        spec.pending_end = None;
        spec.runtime = runtime;
        match (def.instancing, behaviour) {
            (InstancingPolicy::InstancedPerExecution, Some(mut instance)) => {
                instance.reset();
                spec.recycled = Some(instance);
            }
            (_, behaviour) if from_instance => spec.instance = behaviour,
            (_, behaviour) => spec.template = behaviour,
        }

        tracing::info!(
            target: "ability::abilities",
            ability = %def.name,
            handle = %handle,
            reason = %reason,
            "ability ended"
        );
    }

    /// Advances the latent tasks of every active ability.
    pub(crate) fn tick_abilities(&mut self, dt: f32) {
        let handles: Vec<AbilitySpecHandle> = self
            .abilities
            .iter()
            .filter(|spec| spec.is_active() && !spec.busy && spec.running_tasks() > 0)
            .map(AbilitySpec::handle)
            .collect();

        for handle in handles {
            let Some(index) = self.spec_index(handle) else {
                continue;
            };
            let spec = &mut self.abilities[index];
            if !spec.is_active() || spec.busy {
                continue;
            }
            spec.runtime.tasks.tick(dt, &mut self.pools.tasks);
            if spec.runtime.tasks.has_notices() {
                self.run_ability_callback(handle, |_, _| {});
            }
        }
    }
}
