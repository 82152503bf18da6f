//! Granted abilities.

use std::sync::Arc;

use crate::handle::{AbilitySpecHandle, ActiveEffectHandle, AscId};
use crate::pool::Poolable;
use crate::prediction::ActivationInfo;

use super::task::TaskSet;
use super::{AbilityDefinition, GameplayAbility};

/// Activation state of a granted ability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AbilityState {
    #[default]
    Inactive,
    /// Inside `activate_ability`.
    Activating,
    Active,
}

/// How the most recent activation finished.
///
/// A cancel request always wins over a plain end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AbilityEndReason {
    Ended,
    Cancelled,
}

/// Per-activation bookkeeping kept apart from the behaviour object.
#[derive(Debug, Default)]
pub(crate) struct AbilityRuntime {
    pub(crate) tasks: TaskSet,
    pub(crate) activation: ActivationInfo,
    pub(crate) end_request: Option<AbilityEndReason>,
}

/// An ability granted to one component.
#[derive(Debug, Default)]
pub struct AbilitySpec {
    pub(crate) handle: AbilitySpecHandle,
    pub(crate) definition: Option<Arc<AbilityDefinition>>,
    pub(crate) level: i32,
    pub(crate) owner: Option<AscId>,
    pub(crate) state: AbilityState,
    pub(crate) last_end: Option<AbilityEndReason>,
    /// Behaviour object for non-instanced abilities.
    pub(crate) template: Option<Box<dyn GameplayAbility>>,
    /// Live instance for instanced abilities.
    pub(crate) instance: Option<Box<dyn GameplayAbility>>,
    /// Reset per-execution instance kept for the next activation.
    pub(crate) recycled: Option<Box<dyn GameplayAbility>>,
    pub(crate) runtime: AbilityRuntime,
    pub(crate) granted_by: Option<ActiveEffectHandle>,
    /// Set while a behaviour callback holds the instance and runtime.
    pub(crate) busy: bool,
    /// End requested from outside while busy.
    pub(crate) pending_end: Option<AbilityEndReason>,
}

impl AbilitySpec {
    pub fn handle(&self) -> AbilitySpecHandle {
        self.handle
    }

    pub fn definition(&self) -> Option<&Arc<AbilityDefinition>> {
        self.definition.as_ref()
    }

    pub fn name(&self) -> &str {
        self.definition.as_ref().map_or("", |def| def.name.as_str())
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn owner(&self) -> Option<AscId> {
        self.owner
    }

    pub fn state(&self) -> AbilityState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != AbilityState::Inactive
    }

    pub fn last_end_reason(&self) -> Option<AbilityEndReason> {
        self.last_end
    }

    /// Active effect that granted this ability, if any.
    pub fn granted_by(&self) -> Option<ActiveEffectHandle> {
        self.granted_by
    }

    pub fn has_instance(&self) -> bool {
        self.instance.is_some()
    }

    /// Tasks currently running for this ability.
    pub fn running_tasks(&self) -> usize {
        self.runtime.tasks.running()
    }

    pub fn activation(&self) -> ActivationInfo {
        self.runtime.activation
    }
}

impl Poolable for AbilitySpec {
    fn reset(&mut self) {
        self.handle = AbilitySpecHandle::INVALID;
        self.definition = None;
        self.level = 0;
        self.owner = None;
        self.state = AbilityState::Inactive;
        self.last_end = None;
        self.template = None;
        self.instance = None;
        self.recycled = None;
        self.runtime = AbilityRuntime::default();
        self.granted_by = None;
        self.busy = false;
        self.pending_end = None;
    }
}

impl AbilityEndReason {
    pub(crate) fn merge(current: Option<Self>, incoming: Self) -> Self {
        match (current, incoming) {
            (Some(AbilityEndReason::Cancelled), _) | (_, AbilityEndReason::Cancelled) => {
                AbilityEndReason::Cancelled
            }
            _ => AbilityEndReason::Ended,
        }
    }
}
