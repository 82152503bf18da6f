//! Abilities, their granted specs and latent tasks.

mod context;
mod definition;
mod spec;
mod task;
pub mod tasks;

pub use context::AbilityContext;
pub use definition::{
    AbilityActorInfo, AbilityDefinition, AbilityDefinitionBuilder, GameplayAbility,
    InstancingPolicy, NetExecutionPolicy,
};
pub use spec::{AbilityEndReason, AbilitySpec, AbilityState};
pub use task::{AbilityTask, TaskEvent, TaskEventKind, TaskHandle, TaskStep};

pub(crate) use task::TaskNotice;
