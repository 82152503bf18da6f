//! Immutable effect templates.

use std::sync::Arc;

use gameplay_tags::{TagContainer, TagRequirements};

use crate::ability::AbilityDefinition;
use crate::attribute::ModifierOp;

use super::{ExecutionCalculation, Magnitude};

// ============================================================================
// Policies
// ============================================================================

/// Lifetime of an applied effect.
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
pub enum DurationPolicy {
    /// Executes once as a permanent base-value change.
    #[default]
    Instant,
    /// Active until its duration runs out.
    HasDuration,
    /// Active until removed.
    Infinite,
}

/// How repeated applications of one definition combine.
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
pub enum StackingType {
    /// Every application is its own active effect.
    #[default]
    None,
    /// One stack per (definition, source).
    AggregateBySource,
    /// One stack per definition on the target.
    AggregateByTarget,
}

/// Whether a successful re-application refreshes the stack's timers.
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
pub enum StackDurationRefresh {
    #[default]
    RefreshOnSuccessfulApplication,
    NeverRefresh,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackingPolicy {
    pub kind: StackingType,
    pub limit: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_refresh: StackDurationRefresh,
}

impl StackingPolicy {
    pub const fn none() -> Self {
        Self {
            kind: StackingType::None,
            limit: 1,
            duration_refresh: StackDurationRefresh::RefreshOnSuccessfulApplication,
        }
    }

    pub const fn by_source(limit: u32) -> Self {
        Self {
            kind: StackingType::AggregateBySource,
            limit,
            duration_refresh: StackDurationRefresh::RefreshOnSuccessfulApplication,
        }
    }

    pub const fn by_target(limit: u32) -> Self {
        Self {
            kind: StackingType::AggregateByTarget,
            limit,
            duration_refresh: StackDurationRefresh::RefreshOnSuccessfulApplication,
        }
    }

    pub const fn with_refresh(mut self, refresh: StackDurationRefresh) -> Self {
        self.duration_refresh = refresh;
        self
    }

    pub fn refreshes(&self) -> bool {
        self.duration_refresh == StackDurationRefresh::RefreshOnSuccessfulApplication
    }
}

impl Default for StackingPolicy {
    fn default() -> Self {
        Self::none()
    }
}

// ============================================================================
// Modifiers
// ============================================================================

/// One attribute change carried by an effect.
#[derive(Clone, Debug)]
pub struct Modifier {
    /// Name of the target attribute, resolved against the target's sets.
    pub attribute: String,
    pub op: ModifierOp,
    pub magnitude: Magnitude,
}

impl Modifier {
    pub fn new(
        attribute: impl Into<String>,
        op: ModifierOp,
        magnitude: impl Into<Magnitude>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            op,
            magnitude: magnitude.into(),
        }
    }

    pub fn add(attribute: impl Into<String>, magnitude: impl Into<Magnitude>) -> Self {
        Self::new(attribute, ModifierOp::Add, magnitude)
    }

    pub fn multiply(attribute: impl Into<String>, magnitude: impl Into<Magnitude>) -> Self {
        Self::new(attribute, ModifierOp::Multiply, magnitude)
    }

    pub fn divide(attribute: impl Into<String>, magnitude: impl Into<Magnitude>) -> Self {
        Self::new(attribute, ModifierOp::Divide, magnitude)
    }

    pub fn override_with(attribute: impl Into<String>, magnitude: impl Into<Magnitude>) -> Self {
        Self::new(attribute, ModifierOp::Override, magnitude)
    }
}

// ============================================================================
// Definition
// ============================================================================

/// Shared, immutable template for an effect.
///
/// Definitions are handed around as `Arc<EffectDefinition>`; stacking
/// compares definitions by pointer identity.
#[derive(Debug)]
pub struct EffectDefinition {
    pub name: String,
    pub duration_policy: DurationPolicy,
    /// Seconds, for [`DurationPolicy::HasDuration`].
    pub duration: f32,
    /// Seconds between periodic executions; zero or less means not periodic.
    pub period: f32,
    pub modifiers: Vec<Modifier>,
    pub execution: Option<Arc<dyn ExecutionCalculation>>,
    pub stacking: StackingPolicy,
    /// Abilities granted to the target while the effect is active.
    pub granted_abilities: Vec<Arc<AbilityDefinition>>,
    /// Tags describing the effect itself.
    pub asset_tags: TagContainer,
    /// Tags granted to the target while the effect is active.
    pub granted_tags: TagContainer,
    pub application_requirements: TagRequirements,
    /// Gate evaluated on every recalculation; unmet means the effect is inert.
    pub ongoing_requirements: TagRequirements,
    /// Active effects whose asset or granted tags match are removed on apply.
    pub remove_effects_with_tags: TagContainer,
    pub cue_tags: TagContainer,
}

impl EffectDefinition {
    pub fn builder(
        name: impl Into<String>,
        duration_policy: DurationPolicy,
    ) -> EffectDefinitionBuilder {
        EffectDefinitionBuilder::new(name, duration_policy)
    }

    pub fn is_instant(&self) -> bool {
        self.duration_policy == DurationPolicy::Instant
    }

    pub fn is_periodic(&self) -> bool {
        self.period > 0.0
    }
}

/// Builder for [`EffectDefinition`].
#[derive(Debug)]
pub struct EffectDefinitionBuilder {
    def: EffectDefinition,
}

impl EffectDefinitionBuilder {
    pub fn new(name: impl Into<String>, duration_policy: DurationPolicy) -> Self {
        Self {
            def: EffectDefinition {
                name: name.into(),
                duration_policy,
                duration: 0.0,
                period: 0.0,
                modifiers: Vec::new(),
                execution: None,
                stacking: StackingPolicy::none(),
                granted_abilities: Vec::new(),
                asset_tags: TagContainer::new(),
                granted_tags: TagContainer::new(),
                application_requirements: TagRequirements::default(),
                ongoing_requirements: TagRequirements::default(),
                remove_effects_with_tags: TagContainer::new(),
                cue_tags: TagContainer::new(),
            },
        }
    }

    pub fn duration(mut self, seconds: f32) -> Self {
        self.def.duration = seconds;
        self
    }

    pub fn period(mut self, seconds: f32) -> Self {
        self.def.period = seconds;
        self
    }

    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.def.modifiers.push(modifier);
        self
    }

    pub fn execution(mut self, execution: Arc<dyn ExecutionCalculation>) -> Self {
        self.def.execution = Some(execution);
        self
    }

    pub fn stacking(mut self, stacking: StackingPolicy) -> Self {
        self.def.stacking = stacking;
        self
    }

    pub fn grant_ability(mut self, ability: Arc<AbilityDefinition>) -> Self {
        self.def.granted_abilities.push(ability);
        self
    }

    pub fn asset_tags(mut self, tags: TagContainer) -> Self {
        self.def.asset_tags = tags;
        self
    }

    pub fn granted_tags(mut self, tags: TagContainer) -> Self {
        self.def.granted_tags = tags;
        self
    }

    pub fn application_requirements(mut self, requirements: TagRequirements) -> Self {
        self.def.application_requirements = requirements;
        self
    }

    pub fn ongoing_requirements(mut self, requirements: TagRequirements) -> Self {
        self.def.ongoing_requirements = requirements;
        self
    }

    pub fn remove_effects_with_tags(mut self, tags: TagContainer) -> Self {
        self.def.remove_effects_with_tags = tags;
        self
    }

    pub fn cue_tags(mut self, tags: TagContainer) -> Self {
        self.def.cue_tags = tags;
        self
    }

    /// Finalises the definition.
    ///
    /// Instant effects never tick, so any period is dropped. Stack limits are
    /// at least one.
    pub fn build(mut self) -> Arc<EffectDefinition> {
        let def = &mut self.def;
        if def.duration_policy == DurationPolicy::Instant && def.period > 0.0 {
            tracing::warn!(
                target: "ability::effects",
                effect = %def.name,
                period = def.period,
                "instant effect cannot be periodic; ignoring period"
            );
            def.period = 0.0;
        }
        if def.duration_policy == DurationPolicy::HasDuration && def.duration <= 0.0 {
            tracing::warn!(
                target: "ability::effects",
                effect = %def.name,
                "effect has a duration policy but no positive duration"
            );
        }
        if def.stacking.limit == 0 {
            def.stacking.limit = 1;
        }
        Arc::new(self.def)
    }
}
