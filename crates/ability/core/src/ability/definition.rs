//! Ability templates and the behaviour trait they carry.

use std::fmt;
use std::sync::Arc;

use gameplay_tags::TagContainer;

use crate::effect::EffectDefinition;
use crate::handle::{AbilitySpecHandle, ActorId, AscId};
use crate::pool::Poolable;

use super::{AbilityContext, TaskEvent, TaskHandle};

/// Where ability state lives between and during activations.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstancingPolicy {
    /// Runs on the behaviour object created when the ability is granted.
    NonInstanced,
    /// One instance per owner, created when the ability is granted.
    #[default]
    InstancedPerActor,
    /// A fresh (or recycled) instance for every activation.
    InstancedPerExecution,
}

/// Which side runs an activation.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetExecutionPolicy {
    LocalOnly,
    #[default]
    LocalPredicted,
    ServerOnly,
}

/// Identity handed to behaviours when they are granted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbilityActorInfo {
    pub asc: AscId,
    pub owner: Option<ActorId>,
    pub avatar: Option<ActorId>,
}

/// Behaviour of an ability.
///
/// Callbacks receive an [`AbilityContext`] for reaching the owning component.
/// Requests to end or cancel made through the context take effect once the
/// callback returns.
pub trait GameplayAbility: Poolable + fmt::Debug {
    /// A new behaviour object configured like this one.
    fn create_instance(&self) -> Box<dyn GameplayAbility>;

    fn activate_ability(&mut self, ctx: &mut AbilityContext<'_>);

    fn on_task_event(&mut self, _ctx: &mut AbilityContext<'_>, _event: &TaskEvent) {}

    fn on_task_ended(
        &mut self,
        _ctx: &mut AbilityContext<'_>,
        _task: TaskHandle,
        _cancelled: bool,
    ) {
    }

    fn on_end_ability(&mut self, _ctx: &mut AbilityContext<'_>, _was_cancelled: bool) {}

    fn on_give_ability(&mut self, _info: &AbilityActorInfo, _spec: AbilitySpecHandle) {}

    fn on_remove_ability(&mut self) {}
}

/// Shared, immutable ability template.
#[derive(Debug)]
pub struct AbilityDefinition {
    pub name: String,
    pub instancing: InstancingPolicy,
    pub net_execution: NetExecutionPolicy,
    pub cost: Option<Arc<EffectDefinition>>,
    pub cooldown: Option<Arc<EffectDefinition>>,
    /// Tags describing the ability itself.
    pub ability_tags: TagContainer,
    pub activation_required_tags: TagContainer,
    pub activation_blocked_tags: TagContainer,
    /// Running abilities with matching ability tags are cancelled on activation.
    pub cancel_abilities_with_tag: TagContainer,
    /// Abilities with matching ability tags cannot activate while this one runs.
    pub block_abilities_with_tag: TagContainer,
    behavior: Box<dyn GameplayAbility>,
}

impl AbilityDefinition {
    pub fn builder(
        name: impl Into<String>,
        behavior: Box<dyn GameplayAbility>,
    ) -> AbilityDefinitionBuilder {
        AbilityDefinitionBuilder::new(name, behavior)
    }

    pub(crate) fn create_instance(&self) -> Box<dyn GameplayAbility> {
        self.behavior.create_instance()
    }

    /// Tags the cooldown effect would grant.
    pub fn cooldown_tags(&self) -> Option<&TagContainer> {
        self.cooldown.as_ref().map(|def| &def.granted_tags)
    }
}

/// Builder for [`AbilityDefinition`].
#[derive(Debug)]
pub struct AbilityDefinitionBuilder {
    def: AbilityDefinition,
}

impl AbilityDefinitionBuilder {
    pub fn new(name: impl Into<String>, behavior: Box<dyn GameplayAbility>) -> Self {
        Self {
            def: AbilityDefinition {
                name: name.into(),
                instancing: InstancingPolicy::default(),
                net_execution: NetExecutionPolicy::default(),
                cost: None,
                cooldown: None,
                ability_tags: TagContainer::new(),
                activation_required_tags: TagContainer::new(),
                activation_blocked_tags: TagContainer::new(),
                cancel_abilities_with_tag: TagContainer::new(),
                block_abilities_with_tag: TagContainer::new(),
                behavior,
            },
        }
    }

    pub fn instancing(mut self, policy: InstancingPolicy) -> Self {
        self.def.instancing = policy;
        self
    }

    pub fn net_execution(mut self, policy: NetExecutionPolicy) -> Self {
        self.def.net_execution = policy;
        self
    }

    pub fn cost(mut self, cost: Arc<EffectDefinition>) -> Self {
        self.def.cost = Some(cost);
        self
    }

    pub fn cooldown(mut self, cooldown: Arc<EffectDefinition>) -> Self {
        self.def.cooldown = Some(cooldown);
        self
    }

    pub fn ability_tags(mut self, tags: TagContainer) -> Self {
        self.def.ability_tags = tags;
        self
    }

    pub fn activation_required_tags(mut self, tags: TagContainer) -> Self {
        self.def.activation_required_tags = tags;
        self
    }

    pub fn activation_blocked_tags(mut self, tags: TagContainer) -> Self {
        self.def.activation_blocked_tags = tags;
        self
    }

    pub fn cancel_abilities_with_tag(mut self, tags: TagContainer) -> Self {
        self.def.cancel_abilities_with_tag = tags;
        self
    }

    pub fn block_abilities_with_tag(mut self, tags: TagContainer) -> Self {
        self.def.block_abilities_with_tag = tags;
        self
    }

    pub fn build(self) -> Arc<AbilityDefinition> {
        Arc::new(self.def)
    }
}
