//! Magnitude and execution calculations referenced by content.

use ability_core::{
    AbilitySystemComponent, EffectSpec, ExecutionCalculation, MagnitudeCalculation, Modifier,
};
use gameplay_tags::GameplayTag;

/// Set-by-caller key carrying a flat damage amount.
pub fn damage_data_tag() -> GameplayTag {
    GameplayTag::new("Data.Damage")
}

/// Scales the source's attack power, snapshotted when the spec is created.
#[derive(Clone, Copy, Debug)]
pub struct AttackPowerScaled {
    pub coefficient: f32,
}

impl MagnitudeCalculation for AttackPowerScaled {
    fn calculate(&self, _spec: &EffectSpec, source: &AbilitySystemComponent) -> f32 {
        source.current_value("AttackPower").unwrap_or(0.0) * self.coefficient
    }
}

/// Emits `Damage` equal to the spec's `Data.Damage` set-by-caller value.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetByCallerDamage;

impl ExecutionCalculation for SetByCallerDamage {
    fn execute(
        &self,
        spec: &EffectSpec,
        _target: &AbilitySystemComponent,
        output: &mut Vec<Modifier>,
    ) {
        let amount = spec.get_set_by_caller_magnitude(&damage_data_tag(), true, 0.0);
        if amount > 0.0 {
            output.push(Modifier::add("Damage", amount));
        }
    }
}
