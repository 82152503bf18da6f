//! Gameplay ability simulation: attributes, effects, tags and abilities.
//!
//! Everything a subject can be affected by lives on one
//! [`AbilitySystemComponent`]. Host code advances it with
//! [`AbilitySystemComponent::tick`] and moves specs between components with
//! [`AbilitySystemComponent::drain_outgoing_effects`]; there are no threads,
//! timers or callbacks into the host other than the injected collaborators
//! ([`EffectContextFactory`], [`GameplayCueDispatcher`],
//! [`ActivationAuthority`]).
//!
//! Modules:
//! - [`attribute`]: attribute sets, base/current values and modifier math
//! - [`effect`]: effect definitions, specs and active effects
//! - [`ability`]: ability definitions, granted specs and latent tasks
//! - [`prediction`]: prediction keys and the activation authority
//! - [`cue`]: cosmetic cue dispatch
//! - [`pool`]: object pools for specs, effects and tasks
pub mod ability;
pub mod asc;
pub mod attribute;
pub mod config;
pub mod cue;
pub mod effect;
pub mod error;
pub mod handle;
pub mod pool;
pub mod prediction;

pub use ability::tasks::{TargetActor, TargetingStatus, WaitDelay, WaitTargetData};
pub use ability::{
    AbilityActorInfo, AbilityContext, AbilityDefinition, AbilityDefinitionBuilder,
    AbilityEndReason, AbilitySpec, AbilityState, AbilityTask, GameplayAbility, InstancingPolicy,
    NetExecutionPolicy, TaskEvent, TaskEventKind, TaskHandle, TaskStep,
};
pub use asc::{AbilitySystemBuilder, AbilitySystemComponent, OutgoingEffect};
pub use attribute::{
    Attribute, AttributeChange, AttributeChangeKind, AttributeDescriptor, AttributeHandle,
    AttributeIndex, AttributeSet, AttributeSetDescriptor, AttributeValues, BasicAttributeSet,
    DeferredCommand, ModCallbackData, ModifierAggregator, ModifierOp,
};
pub use config::{AbilitySystemConfig, ReplicationMode};
pub use cue::{
    CueEvent, CueHandlerId, CueParameters, CueRouter, GameplayCueDispatcher, GameplayCueHandler,
};
pub use effect::{
    ActiveEffect, ApplyEffectResult, DefaultEffectContext, DurationPolicy, EffectContext,
    EffectContextFactory, EffectDefinition, EffectDefinitionBuilder, EffectSpec,
    ExecutionCalculation, Magnitude, MagnitudeCalculation, Modifier, PooledContextFactory,
    ScalableFloat, StackDurationRefresh, StackingPolicy, StackingType, TargetData,
};
pub use error::{ActivationError, ApplyRejection, ErrorSeverity, SystemError};
pub use handle::{AbilitySpecHandle, ActiveEffectHandle, ActorId, AscId};
pub use pool::{Pool, PoolManager, PoolStats, Poolable, TypedPool};
pub use prediction::{ActivationAuthority, ActivationInfo, LocalAuthority, PredictionKey};

pub use gameplay_tags::{
    GameplayTag, TagContainer, TagCountContainer, TagPredicate, TagRequirements,
};
