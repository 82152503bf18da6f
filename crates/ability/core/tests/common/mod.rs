#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use ability_core::{
    AbilityContext, AbilitySystemComponent, AscId, AttributeDescriptor, AttributeSetDescriptor,
    BasicAttributeSet, CueEvent, CueParameters, EffectDefinition, GameplayAbility,
    GameplayCueDispatcher, GameplayTag, Poolable, TaskEvent, TaskEventKind, WaitDelay,
};

pub static CHARACTER: AttributeSetDescriptor = AttributeSetDescriptor {
    name: "Character",
    attributes: &[
        AttributeDescriptor::new("Health", 100.0),
        AttributeDescriptor::new("MaxHealth", 100.0),
        AttributeDescriptor::new("Mana", 50.0),
        AttributeDescriptor::new("AttackPower", 20.0),
        AttributeDescriptor::new("Defense", 5.0),
    ],
};

pub fn approx_eq(left: f32, right: f32) -> bool {
    (left - right).abs() < 1e-4
}

#[track_caller]
pub fn assert_close(actual: Option<f32>, expected: f32) {
    let actual = actual.expect("attribute should exist");
    assert!(
        approx_eq(actual, expected),
        "expected {expected}, got {actual}"
    );
}

/// A component with the character set registered.
pub fn character(id: u64) -> AbilitySystemComponent {
    let mut asc = AbilitySystemComponent::new(AscId(id));
    asc.add_attribute_set(BasicAttributeSet::new(&CHARACTER));
    asc
}

pub fn tag(name: &str) -> GameplayTag {
    GameplayTag::new(name)
}

/// Applies `def` to `asc` from `asc` itself.
pub fn apply_self(
    asc: &mut AbilitySystemComponent,
    def: &Arc<EffectDefinition>,
    level: i32,
) -> ability_core::ApplyEffectResult {
    let spec = asc.make_outgoing_spec(def, level);
    asc.apply_effect_spec_to_self(spec)
}

// ============================================================================
// Cue recording
// ============================================================================

#[derive(Debug, Default)]
pub struct CueLog {
    pub entries: Vec<(String, CueEvent, String)>,
}

impl GameplayCueDispatcher for CueLog {
    fn handle_cue(&mut self, tag: &GameplayTag, event: CueEvent, params: &CueParameters<'_>) {
        self.entries.push((
            tag.name().to_owned(),
            event,
            params.effect_name().to_owned(),
        ));
    }
}

// ============================================================================
// Behaviours
// ============================================================================

/// Commits, optionally applies an effect to its owner, then ends.
#[derive(Debug, Default)]
pub struct OneShot {
    pub effect: Option<Arc<EffectDefinition>>,
    pub activations: Rc<Cell<u32>>,
}

impl Poolable for OneShot {
    fn reset(&mut self) {}
}

impl GameplayAbility for OneShot {
    fn create_instance(&self) -> Box<dyn GameplayAbility> {
        Box::new(OneShot {
            effect: self.effect.clone(),
            activations: Rc::clone(&self.activations),
        })
    }

    fn activate_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        if !ctx.commit_ability() {
            ctx.cancel_ability();
            return;
        }
        self.activations.set(self.activations.get() + 1);
        if let Some(effect) = self.effect.clone() {
            ctx.apply_effect_to_owner(&effect);
        }
        ctx.end_ability();
    }
}

/// Applies a buff, waits, then ends. Records what it saw.
#[derive(Debug, Default)]
pub struct Channel {
    pub buff: Option<Arc<EffectDefinition>>,
    pub delay: f32,
    pub log: Rc<RefCell<Vec<String>>>,
    pub created: Rc<Cell<u32>>,
    pub runs: u32,
}

impl Poolable for Channel {
    fn reset(&mut self) {
        self.runs = 0;
    }
}

impl GameplayAbility for Channel {
    fn create_instance(&self) -> Box<dyn GameplayAbility> {
        self.created.set(self.created.get() + 1);
        Box::new(Channel {
            buff: self.buff.clone(),
            delay: self.delay,
            log: Rc::clone(&self.log),
            created: Rc::clone(&self.created),
            runs: 0,
        })
    }

    fn activate_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        self.runs += 1;
        self.log.borrow_mut().push(format!("activate:{}", self.runs));
        if !ctx.commit_ability() {
            ctx.cancel_ability();
            return;
        }
        if let Some(buff) = self.buff.clone() {
            ctx.apply_effect_to_owner(&buff);
        }
        WaitDelay::start(ctx, self.delay);
    }

    fn on_task_event(&mut self, ctx: &mut AbilityContext<'_>, event: &TaskEvent) {
        if event.kind == TaskEventKind::DelayFinished {
            self.log.borrow_mut().push("delay".to_owned());
            ctx.end_ability();
        }
    }

    fn on_end_ability(&mut self, _ctx: &mut AbilityContext<'_>, was_cancelled: bool) {
        let outcome = if was_cancelled { "cancelled" } else { "ended" };
        self.log.borrow_mut().push(outcome.to_owned());
    }
}
