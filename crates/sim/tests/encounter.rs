use ability_content::ContentLoader;
use ability_sim::{
    Encounter, EncounterReport, EventKind, ScriptStep, Side, SimConfig, TargetLock, registry,
};

fn run_default() -> EncounterReport {
    let config = SimConfig::default();
    Encounter::from_config(&config)
        .expect("shipped content loads")
        .run(&config)
}

fn rejections<'a>(report: &'a EncounterReport, subject: &'a str) -> Vec<(&'a str, &'static str)> {
    report
        .events_for(subject)
        .filter_map(|kind| match kind {
            EventKind::Rejected { ability, code } => Some((ability.as_str(), *code)),
            _ => None,
        })
        .collect()
}

fn is_activation(kind: &EventKind, name: &str) -> bool {
    matches!(kind, EventKind::Activated { ability } if ability == name)
}

fn is_cue(kind: &EventKind, name: &str, phase: &str) -> bool {
    matches!(kind, EventKind::Cue { tag, event, .. } if tag == name && event == phase)
}

#[test]
fn default_encounter_plays_out() {
    let report = run_default();
    assert_eq!(report.ticks, 160);

    let brute = report.subject("brute").expect("brute snapshot");
    assert_eq!(brute.attribute("Health").map(|attr| attr.base), Some(0.0));
    assert!(brute.has_tag("State.Dead"));

    // Four strikes and a 25-point trap land before the lethal trap.
    let reached_35 = report.events_for("brute").any(|kind| {
        matches!(kind, EventKind::Attribute { attribute, kind, new, .. }
            if attribute == "Health" && kind == "base" && (new - 35.0).abs() < 1e-3)
    });
    assert!(reached_35, "{report}");

    let strikes = report
        .events_for("hero")
        .filter(|kind| is_activation(kind, "Ability.Strike"))
        .count();
    assert_eq!(strikes, 4);

    let hits = report
        .events_for("brute")
        .filter(|kind| is_cue(kind, "GameplayCue.Hit", "executed"))
        .count();
    assert_eq!(hits, 4);
}

#[test]
fn fortify_blocks_attacks_and_death_blocks_everything() {
    let report = run_default();

    assert_eq!(
        rejections(&report, "hero"),
        vec![("Ability.Strike", "ACTIVATION_BLOCKED")]
    );
    assert_eq!(
        rejections(&report, "brute"),
        vec![("Ability.Venom", "ACTIVATION_BLOCKED")]
    );
}

#[test]
fn cleanse_removes_the_poison() {
    let report = run_default();
    let hero = report.subject("hero").expect("hero snapshot");

    assert!(hero.effects.iter().all(|effect| !effect.starts_with("Debuff.Poison")));
    assert!(!hero.has_tag("State.Poisoned"));
    assert!(hero.attribute("Health").is_some_and(|attr| attr.base < 100.0));
    assert!(
        report
            .events_for("hero")
            .any(|kind| matches!(kind, EventKind::TagAdded { tag } if tag == "State.Poisoned"))
    );
}

#[test]
fn strike_lands_in_the_tick_it_is_used() {
    let targets = TargetLock::new();
    let library = ContentLoader::load_dir(&SimConfig::default_content_dir(), &registry(&targets))
        .expect("shipped content loads");
    let mut encounter = Encounter::new(
        library,
        targets,
        vec![ScriptStep::activate(0.0, Side::Hero, "Ability.Strike")],
    )
    .expect("combatants build");

    encounter.step(0.05);

    assert_eq!(encounter.subject(Side::Brute).base_value("Health"), Some(90.0));
    assert_eq!(encounter.subject(Side::Hero).base_value("Mana"), Some(40.0));
}

#[test]
fn report_serializes_to_json() {
    let json = run_default().to_json().expect("report serializes");
    assert!(json.contains("\"type\": \"rejected\""));
    assert!(json.contains("\"subject\": \"brute\""));
}

#[test]
fn missing_abilities_fail_setup() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SimConfig::default();
    config.content_dir = dir.path().to_path_buf();

    let err = Encounter::from_config(&config).unwrap_err();
    assert!(err.to_string().contains("Ability.Strike"), "{err}");
}
