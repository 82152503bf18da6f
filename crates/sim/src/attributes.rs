//! The combatant attribute set.

use std::any::Any;

use ability_core::{
    AttributeDescriptor, AttributeSet, AttributeSetDescriptor, AttributeValues, DeferredCommand,
    ModCallbackData, ModifierOp,
};
use gameplay_tags::GameplayTag;

pub const HEALTH: usize = 0;
pub const MAX_HEALTH: usize = 1;
pub const MANA: usize = 2;
pub const MAX_MANA: usize = 3;
pub const ATTACK_POWER: usize = 4;
pub const DEFENSE: usize = 5;
/// Incoming damage. Never stored: executions against it are converted into
/// health loss after defense.
pub const DAMAGE: usize = 6;

pub static CHARACTER: AttributeSetDescriptor = AttributeSetDescriptor {
    name: "Character",
    attributes: &[
        AttributeDescriptor::new("Health", 100.0),
        AttributeDescriptor::new("MaxHealth", 100.0),
        AttributeDescriptor::new("Mana", 50.0),
        AttributeDescriptor::new("MaxMana", 50.0),
        AttributeDescriptor::new("AttackPower", 10.0),
        AttributeDescriptor::new("Defense", 0.0),
        AttributeDescriptor::new("Damage", 0.0),
    ],
};

/// Loose tag added when health reaches zero.
pub fn dead_tag() -> GameplayTag {
    GameplayTag::new("State.Dead")
}

#[derive(Debug)]
pub struct CharacterAttributeSet {
    values: AttributeValues,
}

impl CharacterAttributeSet {
    pub fn new() -> Self {
        Self {
            values: AttributeValues::from_descriptor(&CHARACTER),
        }
    }

    /// Overrides the starting value of `name`, if declared.
    pub fn with_value(mut self, name: &str, value: f32) -> Self {
        if let Some(index) = CHARACTER.index_of(name) {
            self.values.initialize(index, value);
        }
        self
    }

    pub fn health(&self) -> f32 {
        self.values.current(HEALTH)
    }

    pub fn mana(&self) -> f32 {
        self.values.current(MANA)
    }

    pub fn is_dead(&self) -> bool {
        self.values.base(HEALTH) <= 0.0
    }

    fn clamp(&self, index: usize, value: &mut f32) {
        let max = match index {
            HEALTH => self.values.current(MAX_HEALTH),
            MANA => self.values.current(MAX_MANA),
            _ => return,
        };
        *value = value.clamp(0.0, max.max(0.0));
    }
}

impl Default for CharacterAttributeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeSet for CharacterAttributeSet {
    fn descriptor(&self) -> &'static AttributeSetDescriptor {
        &CHARACTER
    }

    fn values(&self) -> &AttributeValues {
        &self.values
    }

    fn values_mut(&mut self) -> &mut AttributeValues {
        &mut self.values
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn pre_attribute_change(&self, index: usize, new_value: &mut f32) {
        self.clamp(index, new_value);
    }

    fn pre_attribute_base_change(&self, index: usize, new_base: &mut f32) {
        self.clamp(index, new_base);
    }

    /// Converts incoming `Damage` into health loss reduced by defense.
    fn pre_process_instant_effect(
        &mut self,
        data: &ModCallbackData<'_>,
        commands: &mut Vec<DeferredCommand>,
    ) -> bool {
        if data.attribute.index() != DAMAGE || data.modifier.op != ModifierOp::Add {
            return false;
        }

        let mitigated = (data.magnitude - self.values.current(DEFENSE)).max(0.0);
        if mitigated <= 0.0 {
            return true;
        }

        let health = self.values.base(HEALTH);
        let mut new_health = health - mitigated;
        self.clamp(HEALTH, &mut new_health);
        self.values.set_base(HEALTH, new_health);
        self.values.set_current(HEALTH, new_health);

        tracing::debug!(
            target: "sim::attributes",
            target_asc = data.target.0,
            effect = %data.spec.name(),
            incoming = data.magnitude,
            mitigated,
            health = new_health,
            "damage taken"
        );

        if health > 0.0 && new_health <= 0.0 {
            commands.push(DeferredCommand::AddLooseTag(dead_tag()));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ability_core::{
        AbilitySystemComponent, AscId, DurationPolicy, EffectDefinition, Modifier,
    };

    fn combatant(defense: f32) -> AbilitySystemComponent {
        let mut asc = AbilitySystemComponent::new(AscId(1));
        asc.add_attribute_set(CharacterAttributeSet::new().with_value("Defense", defense));
        asc
    }

    fn hit(asc: &mut AbilitySystemComponent, amount: f32) {
        let def = EffectDefinition::builder("Hit", DurationPolicy::Instant)
            .modifier(Modifier::add("Damage", amount))
            .build();
        let spec = asc.make_outgoing_spec(&def, 1);
        asc.apply_effect_spec_to_self(spec);
    }

    #[test]
    fn damage_is_reduced_by_defense() {
        let mut asc = combatant(4.0);
        hit(&mut asc, 10.0);

        assert_eq!(asc.base_value("Health"), Some(94.0));
        assert_eq!(asc.base_value("Damage"), Some(0.0));
    }

    #[test]
    fn defense_can_absorb_a_hit() {
        let mut asc = combatant(20.0);
        hit(&mut asc, 10.0);
        assert_eq!(asc.base_value("Health"), Some(100.0));
    }

    #[test]
    fn lethal_damage_clamps_and_marks_dead() {
        let mut asc = combatant(0.0);
        hit(&mut asc, 250.0);

        assert_eq!(asc.base_value("Health"), Some(0.0));
        assert!(asc.has_tag(&dead_tag()));
        assert!(asc.attribute_set::<CharacterAttributeSet>().is_some_and(|set| set.is_dead()));

        // Further hits on a corpse do not stack the tag.
        hit(&mut asc, 10.0);
        assert_eq!(asc.loose_tags().count(&dead_tag()), 1);
    }

    #[test]
    fn healing_is_capped_at_max_health() {
        let mut asc = combatant(0.0);
        let heal = EffectDefinition::builder("Heal", DurationPolicy::Instant)
            .modifier(Modifier::add("Health", 40.0))
            .build();
        let spec = asc.make_outgoing_spec(&heal, 1);
        asc.apply_effect_spec_to_self(spec);

        assert_eq!(asc.base_value("Health"), Some(100.0));
    }
}
