use std::cell::Cell;
use std::fs;
use std::rc::Rc;
use std::sync::Arc;

use ability_content::{BehaviourArgs, ContentLoader, ContentRegistry};
use ability_core::{
    AbilityContext, AbilitySystemComponent, AscId, AttributeDescriptor, AttributeSetDescriptor,
    BasicAttributeSet, DurationPolicy, EffectDefinition, EffectSpec, GameplayAbility,
    GameplayTag, InstancingPolicy, MagnitudeCalculation, Poolable, StackingType, TagPredicate,
};

static STATS: AttributeSetDescriptor = AttributeSetDescriptor {
    name: "Stats",
    attributes: &[
        AttributeDescriptor::new("Health", 100.0),
        AttributeDescriptor::new("Mana", 40.0),
        AttributeDescriptor::new("Strength", 12.0),
    ],
};

/// Commits, applies its first payload effect to the owner, ends.
#[derive(Debug)]
struct SelfCast {
    payload: Option<Arc<EffectDefinition>>,
}

impl Poolable for SelfCast {
    fn reset(&mut self) {}
}

impl GameplayAbility for SelfCast {
    fn create_instance(&self) -> Box<dyn GameplayAbility> {
        Box::new(SelfCast {
            payload: self.payload.clone(),
        })
    }

    fn activate_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        if !ctx.commit_ability() {
            ctx.cancel_ability();
            return;
        }
        if let Some(payload) = self.payload.clone() {
            ctx.apply_effect_to_owner(&payload);
        }
        ctx.end_ability();
    }
}

#[derive(Debug)]
struct HalfStrength;

impl MagnitudeCalculation for HalfStrength {
    fn calculate(&self, _spec: &EffectSpec, source: &AbilitySystemComponent) -> f32 {
        source.current_value("Strength").unwrap_or(0.0) * 0.5
    }
}

fn registry() -> ContentRegistry {
    ContentRegistry::new()
        .with_behaviour("SelfCast", |args: &BehaviourArgs<'_>| {
            Box::new(SelfCast {
                payload: args.effect(0),
            }) as Box<dyn GameplayAbility>
        })
        .with_magnitude("HalfStrength", Arc::new(HalfStrength))
}

const EFFECTS: &str = r#"
(
    effects: [
        (
            name: "Cost.Heal",
            modifiers: [(attribute: "Mana", op: Add, magnitude: Constant(-10.0))],
        ),
        (
            name: "Cooldown.Heal",
            duration_policy: HasDuration,
            duration: 2.0,
            granted_tags: ["Cooldown.Heal"],
        ),
        (
            name: "Effect.Heal",
            modifiers: [(attribute: "Health", op: Add, magnitude: Custom("HalfStrength"))],
            cue_tags: ["GameplayCue.Heal"],
        ),
        (
            name: "Effect.Rage",
            duration_policy: Infinite,
            modifiers: [(
                attribute: "Strength",
                op: Add,
                magnitude: Scalable((base: 2.0, per_level: 1.0)),
            )],
            stacking: (kind: AggregateByTarget, limit: 2),
        ),
    ],
)
"#;

const ABILITIES: &str = r#"
(
    abilities: [
        (
            name: "Ability.Heal",
            behaviour: "SelfCast",
            instancing: InstancedPerExecution,
            cost: Some("Cost.Heal"),
            cooldown: Some("Cooldown.Heal"),
            ability_tags: ["Ability.Heal"],
            effects: ["Effect.Heal"],
        ),
    ],
)
"#;

#[test]
fn directory_files_resolve_across_each_other() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("effects.ron"), EFFECTS).unwrap();
    fs::write(dir.path().join("abilities.ron"), ABILITIES).unwrap();
    fs::write(dir.path().join("notes.txt"), "not content").unwrap();

    let library = ContentLoader::load_dir(dir.path(), &registry()).unwrap();
    assert_eq!(library.effect_count(), 4);
    assert_eq!(library.ability_count(), 1);

    let heal = library.require_ability("Ability.Heal").unwrap();
    assert_eq!(heal.instancing, InstancingPolicy::InstancedPerExecution);
    let cost = library.effect("Cost.Heal").unwrap();
    assert!(Arc::ptr_eq(heal.cost.as_ref().unwrap(), &cost));
    assert!(heal.cooldown_tags().unwrap().has_tag_exact(&GameplayTag::new("Cooldown.Heal")));

    let rage = library.effect("Effect.Rage").unwrap();
    assert_eq!(rage.duration_policy, DurationPolicy::Infinite);
    assert_eq!(rage.stacking.kind, StackingType::AggregateByTarget);
    assert_eq!(rage.stacking.limit, 2);
}

#[test]
fn loaded_ability_runs_against_a_component() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("content.ron");
    let combined = format!(
        "(effects: {}, abilities: {})",
        section(EFFECTS, "effects"),
        section(ABILITIES, "abilities")
    );
    fs::write(&path, combined).unwrap();
    let library = ContentLoader::load(&path, &registry()).unwrap();

    let mut asc = AbilitySystemComponent::new(AscId(1));
    asc.add_attribute_set(BasicAttributeSet::new(&STATS).with_value("Health", 50.0));
    let handle = asc.grant_ability(&library.require_ability("Ability.Heal").unwrap(), 1);

    asc.try_activate_ability(handle).unwrap();
    asc.tick(0.0, true);

    assert_eq!(asc.base_value("Health"), Some(56.0));
    assert_eq!(asc.base_value("Mana"), Some(30.0));
    assert!(asc.has_tag(&GameplayTag::new("Cooldown.Heal")));
    assert!(asc.try_activate_ability(handle).is_err());
}

#[test]
fn unknown_references_fail_the_load() {
    let missing_effect = r#"(abilities: [(name: "A", behaviour: "SelfCast", cost: Some("Nope"))])"#;
    let err = ContentLoader::load_str(missing_effect, &registry()).unwrap_err();
    assert!(err.to_string().contains("Unknown effect 'Nope'"), "{err}");

    let missing_behaviour = r#"(abilities: [(name: "A", behaviour: "Dance")])"#;
    let err = ContentLoader::load_str(missing_behaviour, &registry()).unwrap_err();
    assert!(err.to_string().contains("Dance"), "{err}");

    let missing_magnitude = r#"(effects: [(
        name: "E",
        modifiers: [(attribute: "Health", op: Add, magnitude: Custom("Luck"))],
    )])"#;
    let err = ContentLoader::load_str(missing_magnitude, &registry()).unwrap_err();
    assert!(err.to_string().contains("Luck"), "{err}");
}

#[test]
fn reference_cycles_are_rejected() {
    let source = r#"
    (
        effects: [(name: "Grant", duration_policy: Infinite, granted_abilities: ["Loop"])],
        abilities: [(name: "Loop", behaviour: "SelfCast", cost: Some("Grant"))],
    )
    "#;
    let err = ContentLoader::load_str(source, &registry()).unwrap_err();
    assert!(err.to_string().contains("cycle"), "{err}");
}

#[test]
fn each_ability_gets_its_own_behaviour() {
    let built = Rc::new(Cell::new(0));
    let counter = Rc::clone(&built);
    let registry = ContentRegistry::new().with_behaviour("SelfCast", move |_: &BehaviourArgs<'_>| {
        counter.set(counter.get() + 1);
        Box::new(SelfCast { payload: None }) as Box<dyn GameplayAbility>
    });
    let source = r#"
    (
        abilities: [
            (name: "A", behaviour: "SelfCast"),
            (name: "B", behaviour: "SelfCast"),
        ],
    )
    "#;
    let library = ContentLoader::load_str(source, &registry).unwrap();
    assert_eq!(library.ability_count(), 2);
    assert_eq!(built.get(), 2);
}

#[test]
fn malformed_ron_reports_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ron");
    fs::write(&path, "(effects: [(name: )])").unwrap();
    let err = ContentLoader::load(&path, &registry()).unwrap_err();
    assert!(err.to_string().contains("broken.ron"), "{err}");
}

/// Extracts the bracketed list that follows `key:` in `source`.
fn section<'a>(source: &'a str, key: &str) -> &'a str {
    let start = source.find(&format!("{key}:")).unwrap() + key.len() + 1;
    let open = start + source[start..].find('[').unwrap();
    let close = source.rfind(']').unwrap();
    &source[open..=close]
}
