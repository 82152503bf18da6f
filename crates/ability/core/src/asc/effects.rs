//! Effect application, stacking, execution and expiry.

use std::sync::Arc;

use gameplay_tags::{TagContainer, TagPredicate};

use crate::attribute::{AttributeHandle, ModCallbackData};
use crate::cue::{CueEvent, CueParameters, GameplayCueDispatcher};
use crate::effect::{
    ActiveEffect, ApplyEffectResult, EffectDefinition, EffectSpec, Modifier, StackingType,
};
use crate::error::ApplyRejection;
use crate::handle::{ActiveEffectHandle, AscId};

use super::{AbilitySystemComponent, OutgoingEffect};

impl AbilitySystemComponent {
    // ========================================================================
    // Specs
    // ========================================================================

    /// Creates a pooled spec of `def` with this component as its source.
    ///
    /// Modifier magnitudes are snapshotted against this component now.
    pub fn make_outgoing_spec(&mut self, def: &Arc<EffectDefinition>, level: i32) -> EffectSpec {
        let mut spec = self.pools.specs.acquire();
        let mut context = self.context_factory.create();
        context.set_instigator(self.id, None);
        spec.initialize(Arc::clone(def), self.id, level, context);
        spec.snapshot_magnitudes(self);
        spec
    }

    /// Returns a spec that will not be applied to the pools.
    pub fn discard_spec(&mut self, spec: EffectSpec) {
        self.recycle_spec(spec);
    }

    pub(crate) fn recycle_spec(&mut self, mut spec: EffectSpec) {
        if let Some(context) = spec.take_context() {
            self.context_factory.release(context);
        }
        self.pools.specs.release(spec);
    }

    pub(crate) fn recycle_active_effect(&mut self, mut effect: ActiveEffect) {
        let spec = effect.take_spec();
        self.recycle_spec(spec);
        self.pools.active_effects.release(effect);
    }

    // ========================================================================
    // Cross-component delivery
    // ========================================================================

    /// Holds `spec` until the host delivers it to `target`.
    pub fn queue_outgoing_effect(&mut self, target: AscId, spec: EffectSpec) {
        tracing::debug!(
            target: "ability::effects",
            effect = %spec.name(),
            source = self.id.0,
            target_asc = target.0,
            "outgoing effect queued"
        );
        self.outgoing.push(OutgoingEffect { target, spec });
    }

    /// Takes every queued outgoing effect, oldest first.
    pub fn drain_outgoing_effects(&mut self) -> Vec<OutgoingEffect> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn has_outgoing_effects(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Applies a spec created by this component to another one.
    ///
    /// Specs made by a different component are rejected and recycled here.
    pub fn apply_effect_spec_to_target(
        &mut self,
        spec: EffectSpec,
        target: &mut AbilitySystemComponent,
    ) -> ApplyEffectResult {
        if spec.source() != Some(self.id) {
            tracing::warn!(
                target: "ability::effects",
                effect = %spec.name(),
                asc = self.id.0,
                source = ?spec.source(),
                "spec applied through a component that did not create it"
            );
            self.recycle_spec(spec);
            return ApplyEffectResult::Rejected(ApplyRejection::ForeignSource);
        }
        target.apply_effect_spec_to_self(spec)
    }

    // ========================================================================
    // Application
    // ========================================================================

    /// Applies `spec` to this component, consuming it.
    pub fn apply_effect_spec_to_self(&mut self, mut spec: EffectSpec) -> ApplyEffectResult {
        let Some(def) = spec.definition().cloned() else {
            tracing::error!(target: "ability::effects", asc = self.id.0, "spec has no definition");
            self.recycle_spec(spec);
            return ApplyEffectResult::Rejected(ApplyRejection::MissingDefinition);
        };

        spec.set_target(self.id, &self.attribute_index);
        if self.current_prediction_key.is_valid() && !spec.prediction_key().is_valid() {
            spec.set_prediction_key(self.current_prediction_key);
        }

        if !def
            .application_requirements
            .requirements_met(&self.combined_tags)
        {
            tracing::info!(
                target: "ability::effects",
                effect = %def.name,
                asc = self.id.0,
                "application requirements not met"
            );
            self.recycle_spec(spec);
            return ApplyEffectResult::Rejected(ApplyRejection::ApplicationRequirementsUnmet);
        }

        if !def.remove_effects_with_tags.is_empty() {
            self.remove_active_effects_with_granted_tags(&def.remove_effects_with_tags);
        }

        if def.is_instant() {
            self.execute_effect(&spec);
            self.recycle_spec(spec);
            return ApplyEffectResult::Executed;
        }

        if def.stacking.kind != StackingType::None
            && let Some(handle) = self.find_stack_target(&def, spec.source())
        {
            self.stack_onto(handle, &def);
            self.recycle_spec(spec);
            return ApplyEffectResult::Stacked(handle);
        }

        let handle = ActiveEffectHandle(self.effect_handles.next());
        let predicted = spec.prediction_key().is_valid();
        let mut effect = self.pools.active_effects.acquire();
        effect.initialize(handle, spec);
        self.active_effects.insert(handle, effect);
        if predicted {
            self.pending_predicted.push(handle);
        }
        self.on_effect_applied(handle, &def);
        ApplyEffectResult::Applied(handle)
    }

    fn find_stack_target(
        &self,
        def: &Arc<EffectDefinition>,
        source: Option<AscId>,
    ) -> Option<ActiveEffectHandle> {
        self.active_effects
            .values()
            .find(|effect| {
                effect.is_occupied()
                    && !effect.is_expired()
                    && effect
                        .spec()
                        .definition()
                        .is_some_and(|existing| Arc::ptr_eq(existing, def))
                    && (def.stacking.kind != StackingType::AggregateBySource
                        || effect.spec().source() == source)
            })
            .map(ActiveEffect::handle)
    }

    fn stack_onto(&mut self, handle: ActiveEffectHandle, def: &EffectDefinition) {
        let Some(effect) = self.active_effects.get_mut(&handle) else {
            return;
        };
        if effect.stack_count() >= def.stacking.limit.max(1) {
            // At the limit the application only refreshes the timers.
            if def.stacking.refreshes() {
                effect.refresh_duration_and_period();
            }
            tracing::info!(
                target: "ability::effects",
                effect = %def.name,
                handle = %handle,
                limit = def.stacking.limit,
                "stack limit reached"
            );
        } else {
            effect.on_stack_applied();
            tracing::debug!(
                target: "ability::effects",
                effect = %def.name,
                handle = %handle,
                stacks = effect.stack_count(),
                "stack added"
            );
        }
        self.mark_effect_attributes_dirty(handle);
    }

    fn mark_effect_attributes_dirty(&mut self, handle: ActiveEffectHandle) {
        if let Some(effect) = self.active_effects.get(&handle) {
            self.dirty_attributes
                .extend(effect.spec().resolved_modifiers().filter_map(|(_, _, attr)| attr));
        }
    }

    fn on_effect_applied(&mut self, handle: ActiveEffectHandle, def: &Arc<EffectDefinition>) {
        let Some(effect) = self.active_effects.get(&handle) else {
            return;
        };
        let level = effect.spec().level();
        let attributes = unique_attributes(effect.spec());

        self.effect_tags.add_tags(&def.granted_tags);
        for attribute in &attributes {
            self.effect_index.entry(*attribute).or_default().push(handle);
        }
        if !def.granted_tags.is_empty() {
            self.on_tags_changed();
        }

        for ability in &def.granted_abilities {
            self.grant_ability_internal(ability, level, Some(handle));
        }

        if let Some(effect) = self.active_effects.get(&handle) {
            let stacks = effect.stack_count();
            let dispatcher = self.cue_dispatcher.as_deref_mut();
            fire_cues(
                dispatcher,
                self.id,
                effect.spec(),
                stacks,
                &[CueEvent::OnActive, CueEvent::WhileActive],
            );
        }

        if !def.is_periodic() {
            self.dirty_attributes.extend(attributes);
        }

        tracing::debug!(
            target: "ability::effects",
            effect = %def.name,
            handle = %handle,
            asc = self.id.0,
            "effect applied"
        );
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Removes an active effect. Returns false if the handle is unknown.
    pub fn remove_active_effect(&mut self, handle: ActiveEffectHandle) -> bool {
        let Some(effect) = self.active_effects.remove(&handle) else {
            return false;
        };
        if !effect.is_occupied() {
            // Mid-tick: the ticking loop owns the effect and recycles it.
            return true;
        }
        self.on_effect_removed(effect);
        true
    }

    /// Removes every active effect granting or carrying any of `tags`.
    ///
    /// Returns the number of effects removed.
    pub fn remove_active_effects_with_granted_tags(&mut self, tags: &TagContainer) -> usize {
        if tags.is_empty() {
            return 0;
        }
        let matching: Vec<ActiveEffectHandle> = self
            .active_effects
            .values()
            .filter(|effect| {
                effect.spec().definition().is_some_and(|def| {
                    def.granted_tags.has_any(tags) || def.asset_tags.has_any(tags)
                })
            })
            .map(ActiveEffect::handle)
            .collect();
        let removed = matching.len();
        for handle in matching {
            self.remove_active_effect(handle);
        }
        removed
    }

    pub(crate) fn on_effect_removed(&mut self, effect: ActiveEffect) {
        let handle = effect.handle();
        self.pending_predicted.retain(|pending| *pending != handle);

        if let Some(def) = effect.spec().definition().cloned() {
            self.effect_tags.remove_tags(&def.granted_tags);
            for attribute in unique_attributes(effect.spec()) {
                if let Some(list) = self.effect_index.get_mut(&attribute) {
                    list.retain(|indexed| *indexed != handle);
                    if list.is_empty() {
                        self.effect_index.remove(&attribute);
                    }
                }
                self.dirty_attributes.insert(attribute);
            }
            if !def.granted_tags.is_empty() {
                self.on_tags_changed();
            }

            let granted: Vec<_> = self
                .abilities
                .iter()
                .filter(|spec| spec.granted_by == Some(handle))
                .map(|spec| spec.handle)
                .collect();
            for ability in granted {
                self.clear_ability(ability);
            }

            let dispatcher = self.cue_dispatcher.as_deref_mut();
            fire_cues(
                dispatcher,
                self.id,
                effect.spec(),
                effect.stack_count(),
                &[CueEvent::Removed],
            );

            tracing::debug!(
                target: "ability::effects",
                effect = %def.name,
                handle = %handle,
                asc = self.id.0,
                "effect removed"
            );
        }

        self.recycle_active_effect(effect);
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Runs an instant or periodic payload: permanent base-value changes.
    fn execute_effect(&mut self, spec: &EffectSpec) {
        let Some(def) = spec.definition().cloned() else {
            return;
        };

        if let Some(execution) = def.execution.as_ref() {
            let mut output = std::mem::take(&mut self.execution_scratch);
            output.clear();
            execution.execute(spec, self, &mut output);
            for modifier in &output {
                let Some(attribute) = self.attribute(&modifier.attribute) else {
                    tracing::warn!(
                        target: "ability::effects",
                        effect = %def.name,
                        attribute = %modifier.attribute,
                        "execution output targets an unknown attribute"
                    );
                    continue;
                };
                let magnitude = modifier.magnitude.evaluate(spec, self);
                self.apply_permanent_modifier(spec, modifier, magnitude, attribute);
            }
            output.clear();
            self.execution_scratch = output;
        }

        for (index, modifier) in def.modifiers.iter().enumerate() {
            let attribute = spec
                .resolved_attribute(index)
                .or_else(|| self.attribute(&modifier.attribute));
            let Some(attribute) = attribute else {
                continue;
            };
            self.apply_permanent_modifier(spec, modifier, spec.magnitude(index), attribute);
        }

        let dispatcher = self.cue_dispatcher.as_deref_mut();
        fire_cues(dispatcher, self.id, spec, 1, &[CueEvent::Executed]);

        tracing::trace!(
            target: "ability::effects",
            effect = %def.name,
            asc = self.id.0,
            "effect executed"
        );
    }

    /// Periodic tick of an active effect. Stack count does not scale it.
    pub(crate) fn execute_periodic_effect(&mut self, spec: &EffectSpec) {
        self.execute_effect(spec);
    }

    fn apply_permanent_modifier(
        &mut self,
        spec: &EffectSpec,
        modifier: &Modifier,
        magnitude: f32,
        attribute: AttributeHandle,
    ) {
        let target = self.id;
        let mut commands = std::mem::take(&mut self.deferred);
        let Some(set) = self.attribute_sets.get_mut(attribute.set_index()) else {
            self.deferred = commands;
            return;
        };
        let data = ModCallbackData {
            spec,
            modifier,
            magnitude,
            attribute,
            target,
        };
        set.post_gameplay_effect_execute(&data, &mut commands);
        self.sync_attribute_set(attribute.set_index());

        for command in commands.drain(..) {
            self.apply_deferred(command);
        }
        self.deferred = commands;
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances durations and periods, removing effects that expire.
    pub(crate) fn tick_active_effects(&mut self, dt: f32) {
        let mut handles = std::mem::take(&mut self.tick_scratch);
        handles.clear();
        handles.extend(self.active_effects.keys().rev().copied());

        let mut expired = Vec::new();
        for handle in handles.iter().copied() {
            let Some(slot) = self.active_effects.get_mut(&handle) else {
                continue;
            };
            if !slot.is_occupied() {
                continue;
            }
            let mut effect = std::mem::take(slot);
            let done = effect.tick(dt, self);
            match self.active_effects.get_mut(&handle) {
                Some(slot) => *slot = effect,
                None => {
                    // Removed while its payload ran.
                    self.on_effect_removed(effect);
                    continue;
                }
            }
            if done {
                expired.push(handle);
            }
        }
        handles.clear();
        self.tick_scratch = handles;

        for handle in expired {
            if let Some(effect) = self.active_effects.remove(&handle) {
                tracing::debug!(
                    target: "ability::effects",
                    effect = %effect.spec().name(),
                    handle = %handle,
                    "effect expired"
                );
                self.on_effect_removed(effect);
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn active_effects(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.active_effects
            .values()
            .filter(|effect| effect.is_occupied())
    }

    pub fn active_effect(&self, handle: ActiveEffectHandle) -> Option<&ActiveEffect> {
        self.active_effects
            .get(&handle)
            .filter(|effect| effect.is_occupied())
    }

    pub fn active_effect_count(&self) -> usize {
        self.active_effects().count()
    }

    /// First active effect created from exactly `def`.
    pub fn find_active_effect_by_definition(
        &self,
        def: &Arc<EffectDefinition>,
    ) -> Option<ActiveEffectHandle> {
        self.active_effects()
            .find(|effect| {
                effect
                    .spec()
                    .definition()
                    .is_some_and(|existing| Arc::ptr_eq(existing, def))
            })
            .map(ActiveEffect::handle)
    }

    /// Effects applied under a prediction key that is not yet confirmed.
    pub fn pending_predicted_effect_count(&self) -> usize {
        self.pending_predicted.len()
    }
}

fn unique_attributes(spec: &EffectSpec) -> Vec<AttributeHandle> {
    let mut attributes: Vec<AttributeHandle> = spec
        .resolved_modifiers()
        .filter_map(|(_, _, attribute)| attribute)
        .collect();
    attributes.sort_unstable();
    attributes.dedup();
    attributes
}

fn fire_cues(
    dispatcher: Option<&mut (dyn GameplayCueDispatcher + 'static)>,
    target: AscId,
    spec: &EffectSpec,
    stack_count: u32,
    events: &[CueEvent],
) {
    let Some(dispatcher) = dispatcher else {
        return;
    };
    let Some(def) = spec.definition() else {
        return;
    };
    let params = CueParameters {
        spec,
        target,
        stack_count,
    };
    for event in events {
        for tag in &def.cue_tags {
            dispatcher.handle_cue(tag, *event, &params);
        }
    }
}
