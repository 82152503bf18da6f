//! On-disk shapes of content files.

use std::collections::BTreeMap;

use ability_core::{
    DurationPolicy, InstancingPolicy, ModifierOp, NetExecutionPolicy, ScalableFloat,
    StackingPolicy,
};
use gameplay_tags::{TagContainer, TagRequirements};
use serde::{Deserialize, Serialize};

/// One content file.
///
/// ```ron
/// (
///     effects: [
///         (
///             name: "Effect.Heal",
///             modifiers: [(attribute: "Health", op: Add, magnitude: Constant(25.0))],
///         ),
///     ],
///     abilities: [
///         (name: "Ability.Heal", behaviour: "SelfCast", cost: Some("Cost.Heal")),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentFile {
    #[serde(default)]
    pub effects: Vec<EffectData>,
    #[serde(default)]
    pub abilities: Vec<AbilityData>,
}

impl ContentFile {
    /// Appends every definition of `other`.
    pub fn merge(&mut self, other: ContentFile) {
        self.effects.extend(other.effects);
        self.abilities.extend(other.abilities);
    }
}

/// Where a modifier's magnitude comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MagnitudeData {
    /// A level-independent value.
    Constant(f32),
    Scalable(ScalableFloat),
    /// Name of a registered magnitude calculation.
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierData {
    pub attribute: String,
    pub op: ModifierOp,
    pub magnitude: MagnitudeData,
}

/// Effect definition as written in a content file.
///
/// Every field except `name` may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectData {
    pub name: String,
    pub duration_policy: DurationPolicy,
    pub duration: f32,
    pub period: f32,
    pub modifiers: Vec<ModifierData>,
    /// Name of a registered execution calculation.
    pub execution: Option<String>,
    pub stacking: StackingPolicy,
    /// Names of abilities granted while the effect is active.
    pub granted_abilities: Vec<String>,
    pub asset_tags: TagContainer,
    pub granted_tags: TagContainer,
    pub application_requirements: TagRequirements,
    pub ongoing_requirements: TagRequirements,
    pub remove_effects_with_tags: TagContainer,
    pub cue_tags: TagContainer,
}

/// Ability definition as written in a content file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityData {
    pub name: String,
    /// Name of a registered behaviour prototype.
    pub behaviour: String,
    pub instancing: InstancingPolicy,
    pub net_execution: NetExecutionPolicy,
    /// Name of the cost effect.
    pub cost: Option<String>,
    /// Name of the cooldown effect.
    pub cooldown: Option<String>,
    pub ability_tags: TagContainer,
    pub activation_required_tags: TagContainer,
    pub activation_blocked_tags: TagContainer,
    pub cancel_abilities_with_tag: TagContainer,
    pub block_abilities_with_tag: TagContainer,
    /// Names of effects handed to the behaviour.
    pub effects: Vec<String>,
    /// Numeric tuning handed to the behaviour.
    pub params: BTreeMap<String, f32>,
}
