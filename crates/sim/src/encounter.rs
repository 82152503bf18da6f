//! A scripted fight between two ability system components.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use ability_content::{ContentLibrary, ContentLoader};
use ability_core::{
    AbilitySpecHandle, AbilitySystemComponent, ActorId, ApplyEffectResult, AscId, CueEvent,
    CueParameters, CueRouter, GameplayTag, SystemError,
};
use anyhow::Result;

use crate::attributes::CharacterAttributeSet;
use crate::behaviours::{TargetLock, registry};
use crate::calculations::damage_data_tag;
use crate::config::SimConfig;
use crate::report::{EncounterEvent, EncounterReport, EventKind, SubjectSnapshot};

/// Script times are matched against accumulated tick time with this slack.
const TIME_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Hero,
    Brute,
}

impl Side {
    pub fn id(self) -> AscId {
        match self {
            Side::Hero => AscId(1),
            Side::Brute => AscId(2),
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Hero => Side::Brute,
            Side::Brute => Side::Hero,
        }
    }

    fn abilities(self) -> &'static [&'static str] {
        match self {
            Side::Hero => &["Ability.Strike", "Ability.Fortify"],
            Side::Brute => &["Ability.Venom"],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Activates a granted ability against the opponent.
    Activate { actor: Side, ability: &'static str },
    /// Applies an effect directly, as a trap or script would.
    Apply {
        source: Side,
        target: Side,
        effect: &'static str,
        level: i32,
        /// `Data.Damage` set-by-caller magnitude.
        damage: Option<f32>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptStep {
    pub at: f32,
    pub action: Action,
}

impl ScriptStep {
    pub fn activate(at: f32, actor: Side, ability: &'static str) -> Self {
        Self {
            at,
            action: Action::Activate { actor, ability },
        }
    }

    pub fn apply(at: f32, source: Side, target: Side, effect: &'static str) -> Self {
        Self {
            at,
            action: Action::Apply {
                source,
                target,
                effect,
                level: 1,
                damage: None,
            },
        }
    }

    pub fn trap(at: f32, target: Side, damage: f32) -> Self {
        Self {
            at,
            action: Action::Apply {
                source: target.opponent(),
                target,
                effect: "Trap.Spikes",
                level: 1,
                damage: Some(damage),
            },
        }
    }
}

/// The timeline the binary runs.
pub fn default_script() -> Vec<ScriptStep> {
    use Side::*;
    vec![
        ScriptStep::apply(0.0, Hero, Hero, "Regen.Mana"),
        ScriptStep::activate(0.0, Hero, "Ability.Strike"),
        ScriptStep::activate(0.25, Brute, "Ability.Venom"),
        ScriptStep::activate(1.2, Hero, "Ability.Strike"),
        ScriptStep::activate(1.5, Hero, "Ability.Fortify"),
        ScriptStep::activate(2.5, Brute, "Ability.Venom"),
        // Fortify blocks attacks while it runs.
        ScriptStep::activate(2.8, Hero, "Ability.Strike"),
        ScriptStep::trap(3.0, Brute, 25.0),
        ScriptStep::activate(4.0, Hero, "Ability.Strike"),
        ScriptStep::apply(4.5, Hero, Hero, "Cleanse"),
        ScriptStep::activate(5.5, Hero, "Ability.Strike"),
        ScriptStep::trap(6.0, Brute, 50.0),
        ScriptStep::activate(6.5, Brute, "Ability.Venom"),
    ]
}

#[derive(Debug)]
struct CueRecord {
    target: AscId,
    tag: String,
    event: CueEvent,
    effect: String,
}

#[derive(Debug)]
struct Subject {
    side: Side,
    asc: AbilitySystemComponent,
    abilities: BTreeMap<&'static str, AbilitySpecHandle>,
    known_tags: Vec<GameplayTag>,
}

impl Subject {
    fn new(
        side: Side,
        library: &ContentLibrary,
        cues: &Rc<RefCell<Vec<CueRecord>>>,
    ) -> Result<Self> {
        let mut router = CueRouter::new();
        let log = Rc::clone(cues);
        router.register(
            GameplayTag::new("GameplayCue"),
            move |tag: &GameplayTag, event: CueEvent, params: &CueParameters<'_>| {
                log.borrow_mut().push(CueRecord {
                    target: params.target,
                    tag: tag.name().to_owned(),
                    event,
                    effect: params.effect_name().to_owned(),
                });
            },
        );

        let mut asc = AbilitySystemComponent::builder(side.id())
            .cue_dispatcher(router)
            .build();
        asc.init_ability_actor_info(ActorId(side.id().0), ActorId(side.id().0));
        let set = match side {
            Side::Hero => CharacterAttributeSet::new(),
            Side::Brute => CharacterAttributeSet::new().with_value("AttackPower", 8.0),
        };
        asc.add_attribute_set(set);

        let mut abilities = BTreeMap::new();
        for name in side.abilities() {
            let def = library.require_ability(name)?;
            abilities.insert(*name, asc.grant_ability(&def, 1));
        }

        Ok(Self {
            side,
            asc,
            abilities,
            known_tags: Vec::new(),
        })
    }

    fn name(&self) -> String {
        self.side.to_string()
    }
}

/// Two combatants, a content library and a script, advanced in fixed ticks.
#[derive(Debug)]
pub struct Encounter {
    library: ContentLibrary,
    targets: TargetLock,
    hero: Subject,
    brute: Subject,
    script: VecDeque<ScriptStep>,
    cues: Rc<RefCell<Vec<CueRecord>>>,
    time: f32,
    ticks: u32,
    events: Vec<EncounterEvent>,
}

impl Encounter {
    /// Builds both combatants from `library`.
    ///
    /// `targets` must be the lock the library's behaviours were built with.
    pub fn new(
        library: ContentLibrary,
        targets: TargetLock,
        mut script: Vec<ScriptStep>,
    ) -> Result<Self> {
        script.sort_by(|a, b| a.at.total_cmp(&b.at));
        let cues = Rc::new(RefCell::new(Vec::new()));
        let hero = Subject::new(Side::Hero, &library, &cues)?;
        let brute = Subject::new(Side::Brute, &library, &cues)?;

        Ok(Self {
            library,
            targets,
            hero,
            brute,
            script: script.into(),
            cues,
            time: 0.0,
            ticks: 0,
            events: Vec::new(),
        })
    }

    /// Loads content from the configured directory and uses the default script.
    pub fn from_config(config: &SimConfig) -> Result<Self> {
        let targets = TargetLock::new();
        let registry = registry(&targets);
        let library = ContentLoader::load_dir(&config.content_dir, &registry)?;
        Self::new(library, targets, default_script())
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn subject(&self, side: Side) -> &AbilitySystemComponent {
        match side {
            Side::Hero => &self.hero.asc,
            Side::Brute => &self.brute.asc,
        }
    }

    /// Runs for the configured duration and reports.
    pub fn run(mut self, config: &SimConfig) -> EncounterReport {
        let dt = config.dt();
        let total = config.total_ticks();
        tracing::info!(target: "sim::encounter", ticks = total, dt, "encounter started");
        for _ in 0..total {
            self.step(dt);
        }
        self.finish()
    }

    /// One fixed tick: due script steps, both components, then deliveries.
    pub fn step(&mut self, dt: f32) {
        while self
            .script
            .front()
            .is_some_and(|step| step.at <= self.time + TIME_EPSILON)
        {
            if let Some(step) = self.script.pop_front() {
                self.perform(step.action);
            }
        }

        self.hero.asc.tick(dt, true);
        self.brute.asc.tick(dt, true);
        self.deliver_outgoing();

        self.time += dt;
        self.ticks += 1;
        self.collect_events();
    }

    /// Consumes the encounter and captures the final state.
    pub fn finish(mut self) -> EncounterReport {
        self.collect_events();
        let subjects = vec![
            SubjectSnapshot::capture(&self.hero.name(), &self.hero.asc),
            SubjectSnapshot::capture(&self.brute.name(), &self.brute.asc),
        ];
        self.hero.asc.dispose();
        self.brute.asc.dispose();

        tracing::info!(
            target: "sim::encounter",
            seconds = self.time,
            events = self.events.len(),
            "encounter finished"
        );
        EncounterReport {
            seconds: self.time,
            ticks: self.ticks,
            events: self.events,
            subjects,
        }
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::Activate { actor, ability } => self.activate(actor, ability),
            Action::Apply {
                source,
                target,
                effect,
                level,
                damage,
            } => self.apply(source, target, effect, level, damage),
        }
    }

    fn activate(&mut self, actor: Side, ability: &'static str) {
        self.targets.set(Some(actor.opponent().id()));
        let subject = self.subject_mut(actor);
        let Some(handle) = subject.abilities.get(ability).copied() else {
            tracing::warn!(target: "sim::encounter", %actor, ability, "ability not granted");
            return;
        };

        let kind = match subject.asc.try_activate_ability(handle) {
            Ok(()) => EventKind::Activated {
                ability: ability.to_owned(),
            },
            Err(err) => EventKind::Rejected {
                ability: ability.to_owned(),
                code: err.error_code(),
            },
        };
        self.record(actor.to_string(), kind);
    }

    fn apply(&mut self, source: Side, target: Side, effect: &str, level: i32, damage: Option<f32>) {
        let Some(def) = self.library.effect(effect) else {
            tracing::warn!(target: "sim::encounter", effect, "unknown effect in script");
            return;
        };

        let (from, to) = self.pair_mut(source);
        let mut spec = from.asc.make_outgoing_spec(&def, level);
        if let Some(amount) = damage {
            spec.set_set_by_caller_magnitude(damage_data_tag(), amount);
        }
        let result = if source == target {
            from.asc.apply_effect_spec_to_self(spec)
        } else {
            from.asc.apply_effect_spec_to_target(spec, &mut to.asc)
        };

        self.record(
            target.to_string(),
            EventKind::EffectApplied {
                effect: effect.to_owned(),
                source: source.to_string(),
                outcome: describe(result),
            },
        );
    }

    /// Hands every queued outgoing spec to its target.
    fn deliver_outgoing(&mut self) {
        for sender in [Side::Hero, Side::Brute] {
            let (from, to) = self.pair_mut(sender);
            let deliveries = from.asc.drain_outgoing_effects();
            let mut applied = Vec::with_capacity(deliveries.len());

            for delivery in deliveries {
                let effect = delivery.spec.name().to_owned();
                let result = if delivery.target == to.asc.id() {
                    to.asc.apply_effect_spec_to_self(delivery.spec)
                } else if delivery.target == from.asc.id() {
                    from.asc.apply_effect_spec_to_self(delivery.spec)
                } else {
                    tracing::warn!(
                        target: "sim::encounter",
                        target_asc = delivery.target.0,
                        effect = %effect,
                        "outgoing effect has no recipient"
                    );
                    from.asc.discard_spec(delivery.spec);
                    continue;
                };
                let recipient = if delivery.target == to.asc.id() { to.side } else { from.side };
                applied.push((recipient, effect, result));
            }

            for (recipient, effect, result) in applied {
                self.record(
                    recipient.to_string(),
                    EventKind::EffectApplied {
                        effect,
                        source: sender.to_string(),
                        outcome: describe(result),
                    },
                );
            }
        }
    }

    fn collect_events(&mut self) {
        let time = self.time;
        let mut collected = Vec::new();

        for subject in [&mut self.hero, &mut self.brute] {
            let name = subject.name();
            for change in subject.asc.drain_attribute_changes() {
                collected.push(EncounterEvent {
                    time,
                    subject: name.clone(),
                    kind: EventKind::Attribute {
                        attribute: change.name.to_owned(),
                        kind: change.kind.to_string(),
                        old: change.old_value,
                        new: change.new_value,
                    },
                });
            }

            let held: Vec<GameplayTag> = subject.asc.combined_tags().tags().cloned().collect();
            for tag in &held {
                if !subject.known_tags.contains(tag) {
                    collected.push(EncounterEvent {
                        time,
                        subject: name.clone(),
                        kind: EventKind::TagAdded {
                            tag: tag.name().to_owned(),
                        },
                    });
                }
            }
            subject.known_tags = held;
        }

        for cue in self.cues.borrow_mut().drain(..) {
            let subject = [Side::Hero, Side::Brute]
                .into_iter()
                .find(|side| side.id() == cue.target)
                .map_or_else(|| format!("asc{}", cue.target.0), |side| side.to_string());
            collected.push(EncounterEvent {
                time,
                subject,
                kind: EventKind::Cue {
                    tag: cue.tag,
                    event: cue.event.to_string(),
                    effect: cue.effect,
                },
            });
        }

        self.events.extend(collected);
    }

    fn record(&mut self, subject: String, kind: EventKind) {
        tracing::info!(target: "sim::encounter", time = self.time, %subject, ?kind, "event");
        self.events.push(EncounterEvent {
            time: self.time,
            subject,
            kind,
        });
    }

    fn subject_mut(&mut self, side: Side) -> &mut Subject {
        match side {
            Side::Hero => &mut self.hero,
            Side::Brute => &mut self.brute,
        }
    }

    /// `first` and its opponent, both mutable.
    fn pair_mut(&mut self, first: Side) -> (&mut Subject, &mut Subject) {
        match first {
            Side::Hero => (&mut self.hero, &mut self.brute),
            Side::Brute => (&mut self.brute, &mut self.hero),
        }
    }
}

fn describe(result: ApplyEffectResult) -> String {
    match result {
        ApplyEffectResult::Executed => "executed".to_owned(),
        ApplyEffectResult::Applied(handle) => format!("applied {handle}"),
        ApplyEffectResult::Stacked(handle) => format!("stacked onto {handle}"),
        ApplyEffectResult::Rejected(reason) => format!("rejected: {}", reason.error_code()),
    }
}
