mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use ability_core::{
    AbilityContext, AbilityDefinition, AbilityEndReason, AbilitySpecHandle, AbilityState,
    AbilitySystemComponent, ActivationAuthority, ActivationError, ActivationInfo, AscId,
    BasicAttributeSet, DurationPolicy, EffectDefinition, GameplayAbility, InstancingPolicy,
    Modifier, NetExecutionPolicy, Poolable, TagContainer, TargetActor, TargetData,
    TargetingStatus, TaskEvent, TaskEventKind, WaitDelay, WaitTargetData,
};

use common::{CHARACTER, Channel, OneShot, apply_self, assert_close, character, tag};

#[derive(Debug, Default)]
struct RejectAll;

impl ActivationAuthority for RejectAll {
    fn confirm_activation(
        &mut self,
        _asc: &AbilitySystemComponent,
        _ability: AbilitySpecHandle,
        _activation: &ActivationInfo,
    ) -> Result<(), ActivationError> {
        Err(ActivationError::Blocked)
    }
}

fn rejecting_character(id: u64) -> AbilitySystemComponent {
    let mut asc = AbilitySystemComponent::builder(AscId(id))
        .authority(RejectAll)
        .build();
    asc.add_attribute_set(BasicAttributeSet::new(&CHARACTER));
    asc
}

fn channel(delay: f32) -> (Channel, Rc<RefCell<Vec<String>>>, Rc<Cell<u32>>) {
    let behaviour = Channel {
        delay,
        ..Channel::default()
    };
    let log = Rc::clone(&behaviour.log);
    let created = Rc::clone(&behaviour.created);
    (behaviour, log, created)
}

fn log_of(log: &Rc<RefCell<Vec<String>>>) -> Vec<String> {
    log.borrow().clone()
}

// ============================================================================
// Activation basics
// ============================================================================

#[test]
fn local_only_one_shot_runs_and_ends() {
    let mut asc = character(1);
    let behaviour = OneShot::default();
    let count = Rc::clone(&behaviour.activations);
    let def = AbilityDefinition::builder("Jab", Box::new(behaviour))
        .net_execution(NetExecutionPolicy::LocalOnly)
        .build();
    let handle = asc.grant_ability(&def, 1);

    asc.try_activate_ability(handle).expect("activation succeeds");

    assert_eq!(count.get(), 1);
    let spec = asc.ability_spec(handle).expect("still granted");
    assert_eq!(spec.state(), AbilityState::Inactive);
    assert_eq!(spec.last_end_reason(), Some(AbilityEndReason::Ended));
    assert!(!spec.activation().is_predicted());
}

#[test]
fn cost_and_cooldown_gate_reactivation() {
    let mut asc = character(1);
    let cost = EffectDefinition::builder("FireballCost", DurationPolicy::Instant)
        .modifier(Modifier::add("Mana", -30.0))
        .build();
    let cooldown = EffectDefinition::builder("FireballCooldown", DurationPolicy::HasDuration)
        .duration(2.0)
        .granted_tags(TagContainer::from_names(["Cooldown.Fireball"]))
        .build();
    let def = AbilityDefinition::builder("Fireball", Box::new(OneShot::default()))
        .cost(cost)
        .cooldown(cooldown)
        .build();
    let handle = asc.grant_ability(&def, 1);

    asc.try_activate_ability(handle).expect("first cast");
    assert_close(asc.base_value("Mana"), 20.0);
    assert!(asc.has_tag(&tag("Cooldown.Fireball")));
    assert_eq!(asc.pending_predicted_effect_count(), 0);

    assert_eq!(
        asc.try_activate_ability(handle),
        Err(ActivationError::OnCooldown)
    );

    asc.tick(2.0, true);
    assert!(!asc.has_tag(&tag("Cooldown.Fireball")));
    assert_eq!(
        asc.try_activate_ability(handle),
        Err(ActivationError::InsufficientCost)
    );
}

#[test]
fn activation_tag_requirements() {
    let mut asc = character(1);
    let def = AbilityDefinition::builder("Shoot", Box::new(OneShot::default()))
        .activation_required_tags(TagContainer::from_names(["State.Armed"]))
        .activation_blocked_tags(TagContainer::from_names(["State.Stunned"]))
        .build();
    let handle = asc.grant_ability(&def, 1);

    assert_eq!(
        asc.can_activate_ability(handle),
        Err(ActivationError::MissingRequiredTags)
    );

    asc.add_loose_tag(tag("State.Armed.Rifle"));
    assert_eq!(asc.can_activate_ability(handle), Ok(()));

    asc.add_loose_tag(tag("State.Stunned"));
    assert_eq!(
        asc.try_activate_ability(handle),
        Err(ActivationError::Blocked)
    );
}

#[test]
fn unknown_spec_is_reported() {
    let mut asc = character(1);
    let def = AbilityDefinition::builder("Gone", Box::new(OneShot::default())).build();
    let handle = asc.grant_ability(&def, 1);
    assert!(asc.clear_ability(handle));

    assert_eq!(
        asc.try_activate_ability(handle),
        Err(ActivationError::SpecNotFound(handle))
    );
}

// ============================================================================
// Latent abilities and tasks
// ============================================================================

#[test]
fn wait_delay_ends_ability_after_ticks() {
    let mut asc = character(1);
    let (behaviour, log, _) = channel(1.0);
    let def = AbilityDefinition::builder("Channel", Box::new(behaviour))
        .net_execution(NetExecutionPolicy::LocalOnly)
        .build();
    let handle = asc.grant_ability(&def, 1);

    asc.try_activate_ability(handle).expect("activation succeeds");
    let spec = asc.ability_spec(handle).expect("granted");
    assert_eq!(spec.state(), AbilityState::Active);
    assert_eq!(spec.running_tasks(), 1);
    assert_eq!(
        asc.try_activate_ability(handle),
        Err(ActivationError::AlreadyActive)
    );

    asc.tick(0.5, false);
    assert!(asc.ability_spec(handle).is_some_and(|spec| spec.is_active()));

    asc.tick(0.5, false);
    let spec = asc.ability_spec(handle).expect("granted");
    assert_eq!(spec.state(), AbilityState::Inactive);
    assert_eq!(spec.last_end_reason(), Some(AbilityEndReason::Ended));
    assert_eq!(log_of(&log), ["activate:1", "delay", "ended"]);
    assert_eq!(asc.pools().idle_tasks::<WaitDelay>(), 1);
}

#[test]
fn cancel_stops_tasks_without_completion() {
    let mut asc = character(1);
    let (behaviour, log, _) = channel(3.0);
    let def = AbilityDefinition::builder("Channel", Box::new(behaviour))
        .net_execution(NetExecutionPolicy::LocalOnly)
        .build();
    let handle = asc.grant_ability(&def, 1);

    asc.try_activate_ability(handle).expect("activation succeeds");
    asc.cancel_ability(handle);
    asc.tick(5.0, true);

    let spec = asc.ability_spec(handle).expect("granted");
    assert_eq!(spec.running_tasks(), 0);
    assert_eq!(spec.last_end_reason(), Some(AbilityEndReason::Cancelled));
    assert_eq!(log_of(&log), ["activate:1", "cancelled"]);
}

#[test]
fn per_execution_instances_are_recycled() {
    let mut asc = character(1);
    let (behaviour, log, created) = channel(0.0);
    let def = AbilityDefinition::builder("Blink", Box::new(behaviour))
        .instancing(InstancingPolicy::InstancedPerExecution)
        .net_execution(NetExecutionPolicy::LocalOnly)
        .build();
    let handle = asc.grant_ability(&def, 1);
    assert_eq!(created.get(), 0);

    asc.try_activate_ability(handle).expect("first activation");
    asc.try_activate_ability(handle).expect("second activation");

    assert_eq!(created.get(), 1);
    assert_eq!(
        log_of(&log),
        ["activate:1", "delay", "ended", "activate:1", "delay", "ended"]
    );
    assert!(!asc.ability_spec(handle).expect("granted").has_instance());
}

#[test]
fn per_actor_instance_is_created_at_grant_and_kept() {
    let mut asc = character(1);
    let (behaviour, log, created) = channel(0.0);
    let def = AbilityDefinition::builder("Guard", Box::new(behaviour))
        .net_execution(NetExecutionPolicy::LocalOnly)
        .build();
    let handle = asc.grant_ability(&def, 1);
    assert_eq!(created.get(), 1);

    asc.try_activate_ability(handle).expect("first activation");
    asc.try_activate_ability(handle).expect("second activation");

    assert_eq!(created.get(), 1);
    assert_eq!(
        log_of(&log),
        ["activate:1", "delay", "ended", "activate:2", "delay", "ended"]
    );
}

#[test]
fn non_instanced_runs_on_the_template() {
    let mut asc = character(1);
    let behaviour = OneShot::default();
    let count = Rc::clone(&behaviour.activations);
    let def = AbilityDefinition::builder("Tap", Box::new(behaviour))
        .instancing(InstancingPolicy::NonInstanced)
        .net_execution(NetExecutionPolicy::LocalOnly)
        .build();
    let handle = asc.grant_ability(&def, 1);

    asc.try_activate_ability(handle).expect("activation");
    asc.try_activate_ability(handle).expect("activation");

    assert_eq!(count.get(), 2);
    assert!(!asc.ability_spec(handle).expect("granted").has_instance());
}

// ============================================================================
// Blocking and cancelling
// ============================================================================

#[test]
fn block_and_cancel_tags() {
    let mut asc = character(1);
    let (stance_behaviour, stance_log, _) = channel(10.0);
    let stance = AbilityDefinition::builder("Stance", Box::new(stance_behaviour))
        .net_execution(NetExecutionPolicy::LocalOnly)
        .ability_tags(TagContainer::from_names(["Ability.Stance"]))
        .block_abilities_with_tag(TagContainer::from_names(["Ability.Attack"]))
        .build();
    let slash = AbilityDefinition::builder("Slash", Box::new(OneShot::default()))
        .net_execution(NetExecutionPolicy::LocalOnly)
        .ability_tags(TagContainer::from_names(["Ability.Attack.Slash"]))
        .build();
    let dodge = AbilityDefinition::builder("Dodge", Box::new(OneShot::default()))
        .net_execution(NetExecutionPolicy::LocalOnly)
        .cancel_abilities_with_tag(TagContainer::from_names(["Ability.Stance"]))
        .build();

    let stance = asc.grant_ability(&stance, 1);
    let slash = asc.grant_ability(&slash, 1);
    let dodge = asc.grant_ability(&dodge, 1);

    asc.try_activate_ability(stance).expect("stance");
    assert_eq!(
        asc.try_activate_ability(slash),
        Err(ActivationError::Blocked)
    );

    asc.try_activate_ability(dodge).expect("dodge");
    assert_eq!(
        asc.ability_spec(stance).and_then(|spec| spec.last_end_reason()),
        Some(AbilityEndReason::Cancelled)
    );
    assert!(asc.blocked_ability_tags().is_empty());
    assert_eq!(log_of(&stance_log), ["activate:1", "cancelled"]);

    asc.try_activate_ability(slash).expect("slash no longer blocked");
}

#[test]
fn removing_granting_effect_cancels_granted_ability() {
    let mut asc = character(1);
    let (behaviour, log, _) = channel(10.0);
    let granted = AbilityDefinition::builder("Empowered", Box::new(behaviour))
        .net_execution(NetExecutionPolicy::LocalOnly)
        .build();
    let empower = EffectDefinition::builder("Empower", DurationPolicy::HasDuration)
        .duration(1.0)
        .grant_ability(granted)
        .build();

    let effect = apply_self(&mut asc, &empower, 3)
        .active_handle()
        .expect("applied");
    let spec = asc.find_ability_spec("Empowered").expect("granted by effect");
    assert_eq!(spec.level(), 3);
    assert_eq!(spec.granted_by(), Some(effect));
    let handle = spec.handle();

    asc.try_activate_ability(handle).expect("activation");
    asc.tick(1.0, true);

    assert!(asc.find_ability_spec("Empowered").is_none());
    assert_eq!(log_of(&log), ["activate:1", "cancelled"]);
}

// ============================================================================
// Prediction
// ============================================================================

#[test]
fn rejected_prediction_is_rolled_back() {
    let mut asc = rejecting_character(1);
    let buff = EffectDefinition::builder("Focus", DurationPolicy::Infinite)
        .granted_tags(TagContainer::from_names(["Buff.Focus"]))
        .modifier(Modifier::add("AttackPower", 10.0))
        .build();
    let (behaviour, log, _) = channel(5.0);
    let behaviour = Channel {
        buff: Some(buff),
        ..behaviour
    };
    let def = AbilityDefinition::builder("Focus", Box::new(behaviour)).build();
    let handle = asc.grant_ability(&def, 1);

    let result = asc.try_activate_ability(handle);
    asc.tick(0.0, true);

    assert_eq!(result, Ok(()));
    assert_eq!(asc.active_effect_count(), 0);
    assert_eq!(asc.pending_predicted_effect_count(), 0);
    assert!(!asc.has_tag(&tag("Buff.Focus")));
    assert_close(asc.current_value("AttackPower"), 20.0);

    let spec = asc.ability_spec(handle).expect("granted");
    assert!(!spec.is_active());
    assert_eq!(spec.last_end_reason(), Some(AbilityEndReason::Cancelled));
    assert_eq!(log_of(&log), ["activate:1", "cancelled"]);
}

#[test]
fn confirmed_prediction_keeps_effects() {
    let mut asc = character(1);
    let buff = EffectDefinition::builder("Focus", DurationPolicy::Infinite)
        .modifier(Modifier::add("AttackPower", 10.0))
        .build();
    let (behaviour, _, _) = channel(5.0);
    let behaviour = Channel {
        buff: Some(buff),
        ..behaviour
    };
    let def = AbilityDefinition::builder("Focus", Box::new(behaviour)).build();
    let handle = asc.grant_ability(&def, 1);

    asc.try_activate_ability(handle).expect("activation");
    asc.tick(0.0, true);

    let spec = asc.ability_spec(handle).expect("granted");
    assert!(spec.is_active());
    assert!(spec.activation().is_predicted());
    assert_eq!(asc.active_effect_count(), 1);
    assert_eq!(asc.pending_predicted_effect_count(), 0);
    let effect = asc.active_effects().next().expect("buff is active");
    assert_eq!(effect.spec().prediction_key(), spec.activation().prediction_key);
    assert_close(asc.current_value("AttackPower"), 30.0);
}

#[test]
fn server_only_rejection_is_an_error() {
    let mut asc = rejecting_character(1);
    let behaviour = OneShot::default();
    let count = Rc::clone(&behaviour.activations);
    let def = AbilityDefinition::builder("Smite", Box::new(behaviour))
        .net_execution(NetExecutionPolicy::ServerOnly)
        .build();
    let handle = asc.grant_ability(&def, 1);

    let result = asc.try_activate_ability(handle);

    assert!(matches!(result, Err(ActivationError::RejectedByAuthority(_))));
    assert_eq!(count.get(), 0);
}

#[test]
fn server_only_runs_without_prediction_key() {
    let mut asc = character(1);
    let (behaviour, _, _) = channel(1.0);
    let def = AbilityDefinition::builder("Smite", Box::new(behaviour))
        .net_execution(NetExecutionPolicy::ServerOnly)
        .build();
    let handle = asc.grant_ability(&def, 1);

    asc.try_activate_ability(handle).expect("authority accepts");

    let spec = asc.ability_spec(handle).expect("granted");
    assert!(spec.is_active());
    assert!(!spec.activation().is_predicted());
}

// ============================================================================
// Targeting and cross-component delivery
// ============================================================================

#[derive(Debug)]
struct FixedTarget {
    target: AscId,
}

impl TargetActor for FixedTarget {
    fn start_targeting(&mut self) {}

    fn poll(&mut self, _dt: f32) -> TargetingStatus {
        TargetingStatus::Ready(TargetData::single(self.target))
    }

    fn confirm_targeting(&mut self) {}

    fn cancel_targeting(&mut self) {}
}

#[derive(Debug)]
struct Bolt {
    damage: Arc<EffectDefinition>,
    target: AscId,
}

impl Poolable for Bolt {
    fn reset(&mut self) {}
}

impl GameplayAbility for Bolt {
    fn create_instance(&self) -> Box<dyn GameplayAbility> {
        Box::new(Bolt {
            damage: Arc::clone(&self.damage),
            target: self.target,
        })
    }

    fn activate_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        WaitTargetData::start(
            ctx,
            Box::new(FixedTarget {
                target: self.target,
            }),
        );
    }

    fn on_task_event(&mut self, ctx: &mut AbilityContext<'_>, event: &TaskEvent) {
        if let TaskEventKind::TargetDataReady(data) = &event.kind {
            let damage = Arc::clone(&self.damage);
            ctx.apply_effect_to_targets(&damage, data);
            ctx.end_ability();
        }
    }
}

#[test]
fn targeted_effect_is_delivered_through_the_outgoing_queue() {
    let mut caster = character(1);
    let mut victim = character(2);
    let damage = EffectDefinition::builder("BoltDamage", DurationPolicy::Instant)
        .modifier(Modifier::add("Health", -10.0))
        .build();
    let def = AbilityDefinition::builder(
        "Bolt",
        Box::new(Bolt {
            damage,
            target: victim.id(),
        }),
    )
    .net_execution(NetExecutionPolicy::LocalOnly)
    .build();
    let handle = caster.grant_ability(&def, 1);

    caster.try_activate_ability(handle).expect("activation");
    assert!(!caster.has_outgoing_effects());
    caster.tick(0.1, true);

    let outgoing = caster.drain_outgoing_effects();
    assert_eq!(outgoing.len(), 1);
    let delivery = outgoing.into_iter().next().expect("one delivery");
    assert_eq!(delivery.target, victim.id());
    let context = delivery.spec.context().expect("spec carries a context");
    assert_eq!(context.instigator(), Some(caster.id()));
    assert_eq!(context.ability(), Some(handle));
    assert_eq!(
        context.target_data().map(|data| data.targets.clone()),
        Some(vec![victim.id()])
    );

    victim.apply_effect_spec_to_self(delivery.spec);
    assert_close(victim.base_value("Health"), 90.0);
    assert_close(caster.base_value("Health"), 100.0);
    assert_eq!(
        caster.ability_spec(handle).and_then(|spec| spec.last_end_reason()),
        Some(AbilityEndReason::Ended)
    );
}
