//! The ability system component: owner of attributes, effects, tags and
//! granted abilities for one subject.
//!
//! Time only advances through [`AbilitySystemComponent::tick`]. Within a tick,
//! ability tasks run first, then (on the authoritative side) effect durations
//! and periods, then one recalculation pass over dirty attributes.

mod abilities;
mod effects;
mod recalc;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use gameplay_tags::{GameplayTag, TagCountContainer, TagPredicate};

use crate::ability::{AbilityActorInfo, AbilitySpec};
use crate::attribute::{
    AttributeChange, AttributeChangeKind, AttributeHandle, AttributeIndex, AttributeSet,
    DeferredCommand,
};
use crate::config::AbilitySystemConfig;
use crate::cue::GameplayCueDispatcher;
use crate::effect::{ActiveEffect, EffectContextFactory, EffectSpec, Modifier, PooledContextFactory};
use crate::handle::{ActiveEffectHandle, ActorId, AscId, HandleCounter};
use crate::pool::PoolManager;
use crate::prediction::{ActivationAuthority, LocalAuthority, PredictionKey, PredictionKeyGenerator};

/// An effect spec addressed to another component.
///
/// Produced by abilities targeting other subjects; the host delivers it with
/// [`AbilitySystemComponent::apply_effect_spec_to_self`] on the target.
#[derive(Debug)]
pub struct OutgoingEffect {
    pub target: AscId,
    pub spec: EffectSpec,
}

/// Orchestrates attributes, effects, tags and abilities of one subject.
pub struct AbilitySystemComponent {
    id: AscId,
    owner: Option<ActorId>,
    avatar: Option<ActorId>,
    config: AbilitySystemConfig,

    loose_tags: TagCountContainer,
    effect_tags: TagCountContainer,
    combined_tags: TagCountContainer,
    blocked_ability_tags: TagCountContainer,

    attribute_sets: Vec<Box<dyn AttributeSet>>,
    attribute_index: AttributeIndex,
    dirty_attributes: BTreeSet<AttributeHandle>,
    attribute_changes: Vec<AttributeChange>,

    active_effects: BTreeMap<ActiveEffectHandle, ActiveEffect>,
    /// Attribute → active effects with a modifier on it.
    effect_index: HashMap<AttributeHandle, Vec<ActiveEffectHandle>>,
    effect_handles: HandleCounter,
    pending_predicted: Vec<ActiveEffectHandle>,
    outgoing: Vec<OutgoingEffect>,

    abilities: Vec<AbilitySpec>,
    ability_handles: HandleCounter,

    prediction_keys: PredictionKeyGenerator,
    current_prediction_key: PredictionKey,

    pub(crate) pools: PoolManager,
    context_factory: Box<dyn EffectContextFactory>,
    cue_dispatcher: Option<Box<dyn GameplayCueDispatcher>>,
    authority: Option<Box<dyn ActivationAuthority>>,

    deferred: Vec<DeferredCommand>,
    execution_scratch: Vec<Modifier>,
    tick_scratch: Vec<ActiveEffectHandle>,
}

/// Builder for [`AbilitySystemComponent`].
pub struct AbilitySystemBuilder {
    id: AscId,
    config: AbilitySystemConfig,
    context_factory: Option<Box<dyn EffectContextFactory>>,
    cue_dispatcher: Option<Box<dyn GameplayCueDispatcher>>,
    authority: Option<Box<dyn ActivationAuthority>>,
}

impl AbilitySystemBuilder {
    pub fn config(mut self, config: AbilitySystemConfig) -> Self {
        self.config = config;
        self
    }

    pub fn context_factory(mut self, factory: impl EffectContextFactory + 'static) -> Self {
        self.context_factory = Some(Box::new(factory));
        self
    }

    pub fn cue_dispatcher(mut self, dispatcher: impl GameplayCueDispatcher + 'static) -> Self {
        self.cue_dispatcher = Some(Box::new(dispatcher));
        self
    }

    pub fn authority(mut self, authority: impl ActivationAuthority + 'static) -> Self {
        self.authority = Some(Box::new(authority));
        self
    }

    pub fn build(self) -> AbilitySystemComponent {
        let config = self.config;
        let context_factory = self.context_factory.unwrap_or_else(|| {
            Box::new(PooledContextFactory::new(
                config.pool_prewarm,
                config.max_pooled_per_type,
            ))
        });
        let authority = self
            .authority
            .unwrap_or_else(|| Box::new(LocalAuthority));

        AbilitySystemComponent {
            id: self.id,
            owner: None,
            avatar: None,
            loose_tags: TagCountContainer::new(),
            effect_tags: TagCountContainer::new(),
            combined_tags: TagCountContainer::new(),
            blocked_ability_tags: TagCountContainer::new(),
            attribute_sets: Vec::new(),
            attribute_index: AttributeIndex::default(),
            dirty_attributes: BTreeSet::new(),
            attribute_changes: Vec::with_capacity(AbilitySystemConfig::DEFAULT_ATTRIBUTE_CAPACITY),
            active_effects: BTreeMap::new(),
            effect_index: HashMap::with_capacity(AbilitySystemConfig::DEFAULT_ATTRIBUTE_CAPACITY),
            effect_handles: HandleCounter::default(),
            pending_predicted: Vec::new(),
            outgoing: Vec::new(),
            abilities: Vec::with_capacity(AbilitySystemConfig::DEFAULT_ABILITY_CAPACITY),
            ability_handles: HandleCounter::default(),
            prediction_keys: PredictionKeyGenerator::default(),
            current_prediction_key: PredictionKey::INVALID,
            pools: PoolManager::new(config.pool_prewarm, config.max_pooled_per_type),
            context_factory,
            cue_dispatcher: self.cue_dispatcher,
            authority: Some(authority),
            deferred: Vec::new(),
            execution_scratch: Vec::new(),
            tick_scratch: Vec::with_capacity(AbilitySystemConfig::DEFAULT_ACTIVE_EFFECT_CAPACITY),
            config,
        }
    }
}

impl AbilitySystemComponent {
    /// A component with default configuration and collaborators.
    pub fn new(id: AscId) -> Self {
        Self::builder(id).build()
    }

    pub fn builder(id: AscId) -> AbilitySystemBuilder {
        AbilitySystemBuilder {
            id,
            config: AbilitySystemConfig::default(),
            context_factory: None,
            cue_dispatcher: None,
            authority: None,
        }
    }

    pub fn init_ability_actor_info(&mut self, owner: ActorId, avatar: ActorId) {
        self.owner = Some(owner);
        self.avatar = Some(avatar);
    }

    pub fn id(&self) -> AscId {
        self.id
    }

    pub fn owner(&self) -> Option<ActorId> {
        self.owner
    }

    pub fn avatar(&self) -> Option<ActorId> {
        self.avatar
    }

    pub fn config(&self) -> &AbilitySystemConfig {
        &self.config
    }

    pub fn pools(&self) -> &PoolManager {
        &self.pools
    }

    pub(crate) fn actor_info(&self) -> AbilityActorInfo {
        AbilityActorInfo {
            asc: self.id,
            owner: self.owner,
            avatar: self.avatar,
        }
    }

    /// Replaces the cue dispatcher.
    pub fn set_cue_dispatcher(&mut self, dispatcher: impl GameplayCueDispatcher + 'static) {
        self.cue_dispatcher = Some(Box::new(dispatcher));
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances the component by `dt` seconds.
    ///
    /// Effect durations and periods only advance when `is_server` is set.
    pub fn tick(&mut self, dt: f32, is_server: bool) {
        self.tick_abilities(dt);
        if is_server {
            self.tick_active_effects(dt);
        }
        if !self.dirty_attributes.is_empty() {
            self.recalculate_dirty_attributes();
        }
    }

    /// Returns all pooled state and clears every collection.
    pub fn dispose(&mut self) {
        let handles: Vec<_> = self.abilities.iter().map(AbilitySpec::handle).collect();
        for handle in handles {
            self.clear_ability(handle);
        }

        let effects = std::mem::take(&mut self.active_effects);
        for (_, effect) in effects {
            self.recycle_active_effect(effect);
        }
        for outgoing in std::mem::take(&mut self.outgoing) {
            self.recycle_spec(outgoing.spec);
        }

        self.effect_index.clear();
        self.pending_predicted.clear();
        self.loose_tags.clear();
        self.effect_tags.clear();
        self.combined_tags.clear();
        self.blocked_ability_tags.clear();
        self.attribute_sets.clear();
        self.attribute_index.clear();
        self.dirty_attributes.clear();
        self.attribute_changes.clear();
        self.deferred.clear();
        self.execution_scratch.clear();
        self.current_prediction_key = PredictionKey::INVALID;
        self.owner = None;
        self.avatar = None;
        self.pools.clear();
        tracing::debug!(target: "ability::asc", asc = self.id.0, "disposed");
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Adds an attribute set; returns its index.
    pub fn add_attribute_set<S: AttributeSet>(&mut self, set: S) -> usize {
        let index = self.attribute_sets.len();
        let duplicates = self
            .attribute_index
            .register(index as u16, set.descriptor());
        for name in duplicates {
            tracing::warn!(
                target: "ability::attributes",
                attribute = name,
                set = set.descriptor().name,
                "attribute name already registered; later declaration is unreachable by name"
            );
        }
        self.attribute_sets.push(Box::new(set));
        index
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeHandle> {
        self.attribute_index.get(name)
    }

    pub fn base_value(&self, name: &str) -> Option<f32> {
        self.attribute(name).map(|handle| self.base_value_of(handle))
    }

    pub fn current_value(&self, name: &str) -> Option<f32> {
        self.attribute(name).map(|handle| self.current_value_of(handle))
    }

    pub fn base_value_of(&self, handle: AttributeHandle) -> f32 {
        self.attribute_sets
            .get(handle.set_index())
            .map_or(0.0, |set| set.values().base(handle.index()))
    }

    pub fn current_value_of(&self, handle: AttributeHandle) -> f32 {
        self.attribute_sets
            .get(handle.set_index())
            .map_or(0.0, |set| set.values().current(handle.index()))
    }

    /// Writes a base value directly. The attribute is recalculated next tick.
    pub fn set_base_value(&mut self, handle: AttributeHandle, value: f32) -> bool {
        let Some(set) = self.attribute_sets.get_mut(handle.set_index()) else {
            return false;
        };
        let mut value = value;
        set.pre_attribute_base_change(handle.index(), &mut value);
        let changed = set.values_mut().set_base(handle.index(), value);
        self.sync_attribute_set(handle.set_index());
        changed
    }

    /// Includes `handle` in the next recalculation pass.
    pub fn mark_attribute_dirty(&mut self, handle: AttributeHandle) {
        self.dirty_attributes.insert(handle);
    }

    pub fn is_attribute_dirty(&self, handle: AttributeHandle) -> bool {
        self.dirty_attributes.contains(&handle)
    }

    /// Typed access to an attribute set.
    pub fn attribute_set<S: AttributeSet>(&self) -> Option<&S> {
        self.attribute_sets
            .iter()
            .find_map(|set| set.as_any().downcast_ref::<S>())
    }

    /// Runs `f` on the attribute set of type `S`, then records its changes.
    pub fn modify_attribute_set<S: AttributeSet, R>(
        &mut self,
        f: impl FnOnce(&mut S) -> R,
    ) -> Option<R> {
        let index = self
            .attribute_sets
            .iter()
            .position(|set| set.as_any().is::<S>())?;
        let result = self.attribute_sets[index]
            .as_any_mut()
            .downcast_mut::<S>()
            .map(f);
        self.sync_attribute_set(index);
        result
    }

    pub fn attribute_sets(&self) -> impl Iterator<Item = &dyn AttributeSet> {
        self.attribute_sets.iter().map(|set| set.as_ref())
    }

    /// Takes every attribute change recorded since the last call.
    pub fn drain_attribute_changes(&mut self) -> Vec<AttributeChange> {
        std::mem::take(&mut self.attribute_changes)
    }

    /// Moves changes recorded by a set into the component's log, marking
    /// base changes dirty.
    pub(crate) fn sync_attribute_set(&mut self, set_index: usize) {
        let Some(set) = self.attribute_sets.get_mut(set_index) else {
            return;
        };
        let descriptor = set.descriptor();
        for change in set.values_mut().drain_changes() {
            let attribute = AttributeHandle {
                set: set_index as u16,
                index: change.index,
            };
            if change.kind == AttributeChangeKind::Base {
                self.dirty_attributes.insert(attribute);
            }
            let name = descriptor
                .attributes
                .get(change.index as usize)
                .map_or("", |desc| desc.name);
            tracing::trace!(
                target: "ability::attributes",
                attribute = name,
                kind = %change.kind,
                old = change.old_value,
                new = change.new_value,
                "attribute changed"
            );
            self.attribute_changes.push(AttributeChange {
                attribute,
                name,
                kind: change.kind,
                old_value: change.old_value,
                new_value: change.new_value,
            });
        }
    }

    // ========================================================================
    // Tags
    // ========================================================================

    pub fn combined_tags(&self) -> &TagCountContainer {
        &self.combined_tags
    }

    pub fn loose_tags(&self) -> &TagCountContainer {
        &self.loose_tags
    }

    /// Tags that currently block abilities from activating.
    pub fn blocked_ability_tags(&self) -> &TagCountContainer {
        &self.blocked_ability_tags
    }

    pub fn has_tag(&self, tag: &GameplayTag) -> bool {
        self.combined_tags.has_tag(tag)
    }

    pub fn add_loose_tag(&mut self, tag: GameplayTag) {
        self.loose_tags.add_tag(&tag);
        self.on_tags_changed();
    }

    /// Returns false if the tag was not held as a loose tag.
    pub fn remove_loose_tag(&mut self, tag: &GameplayTag) -> bool {
        let removed = self.loose_tags.remove_tag(tag);
        if removed {
            self.on_tags_changed();
        }
        removed
    }

    /// Rebuilds the combined tags and re-dirties tag-gated effects.
    fn on_tags_changed(&mut self) {
        let mut combined = self.loose_tags.clone();
        combined.merge(&self.effect_tags);
        self.combined_tags = combined;

        for effect in self.active_effects.values() {
            let gated = effect
                .spec()
                .definition()
                .is_some_and(|def| !def.ongoing_requirements.is_empty());
            if gated {
                self.dirty_attributes
                    .extend(effect.spec().resolved_modifiers().filter_map(|(_, _, attr)| attr));
            }
        }
    }

    fn apply_deferred(&mut self, command: DeferredCommand) {
        match command {
            DeferredCommand::AddLooseTag(tag) => self.add_loose_tag(tag),
            DeferredCommand::RemoveLooseTag(tag) => {
                self.remove_loose_tag(&tag);
            }
        }
    }
}

impl fmt::Debug for AbilitySystemComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilitySystemComponent")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("attribute_sets", &self.attribute_sets.len())
            .field("active_effects", &self.active_effects.len())
            .field("abilities", &self.abilities.len())
            .field("combined_tags", &self.combined_tags)
            .finish()
    }
}
