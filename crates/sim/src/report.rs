//! What an encounter produced.

use std::fmt;

use ability_core::AbilitySystemComponent;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Activated {
        ability: String,
    },
    Rejected {
        ability: String,
        code: &'static str,
    },
    EffectApplied {
        effect: String,
        source: String,
        outcome: String,
    },
    Attribute {
        attribute: String,
        kind: String,
        old: f32,
        new: f32,
    },
    TagAdded {
        tag: String,
    },
    Cue {
        tag: String,
        event: String,
        effect: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EncounterEvent {
    pub time: f32,
    pub subject: String,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttributeSnapshot {
    pub name: String,
    pub base: f32,
    pub current: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubjectSnapshot {
    pub name: String,
    pub id: u64,
    pub attributes: Vec<AttributeSnapshot>,
    pub tags: Vec<String>,
    pub effects: Vec<String>,
}

impl SubjectSnapshot {
    pub fn capture(name: &str, asc: &AbilitySystemComponent) -> Self {
        let attributes = asc
            .attribute_sets()
            .flat_map(|set| set.values().iter())
            .map(|attr| AttributeSnapshot {
                name: attr.name.to_owned(),
                base: attr.base,
                current: attr.current,
            })
            .collect();
        let tags = asc
            .combined_tags()
            .tags()
            .map(|tag| tag.name().to_owned())
            .collect();
        let effects = asc
            .active_effects()
            .map(|effect| format!("{} x{}", effect.spec().name(), effect.stack_count()))
            .collect();

        Self {
            name: name.to_owned(),
            id: asc.id().0,
            attributes,
            tags,
            effects,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSnapshot> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag == name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EncounterReport {
    pub seconds: f32,
    pub ticks: u32,
    pub events: Vec<EncounterEvent>,
    pub subjects: Vec<SubjectSnapshot>,
}

impl EncounterReport {
    pub fn subject(&self, name: &str) -> Option<&SubjectSnapshot> {
        self.subjects.iter().find(|subject| subject.name == name)
    }

    /// Events recorded for `subject`, in order.
    pub fn events_for<'a>(&'a self, subject: &'a str) -> impl Iterator<Item = &'a EventKind> + 'a {
        self.events
            .iter()
            .filter(move |event| event.subject == subject)
            .map(|event| &event.kind)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for EncounterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "encounter: {:.2}s over {} ticks", self.seconds, self.ticks)?;
        for event in &self.events {
            write!(f, "[{:>6.2}] {:<6} ", event.time, event.subject)?;
            match &event.kind {
                EventKind::Activated { ability } => writeln!(f, "activated {ability}")?,
                EventKind::Rejected { ability, code } => {
                    writeln!(f, "rejected {ability} ({code})")?
                }
                EventKind::EffectApplied {
                    effect,
                    source,
                    outcome,
                } => writeln!(f, "{effect} from {source}: {outcome}")?,
                EventKind::Attribute {
                    attribute,
                    kind,
                    old,
                    new,
                } => writeln!(f, "{attribute} ({kind}) {old:.1} -> {new:.1}")?,
                EventKind::TagAdded { tag } => writeln!(f, "gained {tag}")?,
                EventKind::Cue { tag, event, effect } => {
                    writeln!(f, "cue {tag} {event} ({effect})")?
                }
            }
        }
        for subject in &self.subjects {
            writeln!(f, "{} (asc {}):", subject.name, subject.id)?;
            for attr in &subject.attributes {
                writeln!(f, "  {:<12} {:>7.1} / {:>7.1}", attr.name, attr.base, attr.current)?;
            }
            if !subject.tags.is_empty() {
                writeln!(f, "  tags: {}", subject.tags.join(", "))?;
            }
            if !subject.effects.is_empty() {
                writeln!(f, "  effects: {}", subject.effects.join(", "))?;
            }
        }
        Ok(())
    }
}

