//! Headless encounter simulation.
//!
//! Loads ability content, builds two combatants and drives them through a
//! scripted timeline, recording every activation, effect application,
//! attribute change and cue along the way.

pub mod attributes;
pub mod behaviours;
pub mod calculations;
pub mod config;
pub mod encounter;
pub mod logging;
pub mod report;

pub use attributes::CharacterAttributeSet;
pub use behaviours::{TargetLock, registry};
pub use config::{OutputFormat, SimArgs, SimConfig};
pub use encounter::{Action, Encounter, ScriptStep, Side, default_script};
pub use report::{EncounterEvent, EncounterReport, EventKind, SubjectSnapshot};
