use std::any::Any;
use std::fmt;

use crate::ability::{AbilityContext, AbilityTask, TaskEventKind, TaskHandle, TaskStep};
use crate::effect::TargetData;
use crate::pool::Poolable;

/// Result of polling a targeting actor.
#[derive(Clone, Debug, PartialEq)]
pub enum TargetingStatus {
    Pending,
    Ready(TargetData),
    Cancelled,
}

/// Host-side target selection (a reticle, an area query, an AI picker).
pub trait TargetActor: fmt::Debug {
    fn start_targeting(&mut self);

    /// Advances selection; called once per tick while the task waits.
    fn poll(&mut self, dt: f32) -> TargetingStatus;

    /// Requests that the current selection be confirmed.
    fn confirm_targeting(&mut self);

    fn cancel_targeting(&mut self);

    /// Releases the actor. Called exactly once when the task ends.
    fn destroy(&mut self) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum TargetingState {
    #[default]
    Idle,
    Targeting,
    Finished,
}

/// Waits for a [`TargetActor`] to produce target data or cancel.
#[derive(Debug, Default)]
pub struct WaitTargetData {
    actor: Option<Box<dyn TargetActor>>,
    state: TargetingState,
}

impl WaitTargetData {
    pub fn start(ctx: &mut AbilityContext<'_>, actor: Box<dyn TargetActor>) -> TaskHandle {
        let mut task = ctx.new_task::<WaitTargetData>();
        task.actor = Some(actor);
        ctx.start_task(task)
    }

    /// Forwards a confirm request to the actor.
    pub fn confirm(&mut self) {
        if self.state == TargetingState::Targeting
            && let Some(actor) = self.actor.as_mut()
        {
            actor.confirm_targeting();
        }
    }

    fn step_for(&mut self, status: TargetingStatus) -> TaskStep {
        match status {
            TargetingStatus::Pending => TaskStep::Pending,
            TargetingStatus::Ready(data) => {
                self.state = TargetingState::Finished;
                TaskStep::Complete(TaskEventKind::TargetDataReady(data))
            }
            TargetingStatus::Cancelled => {
                self.state = TargetingState::Finished;
                TaskStep::Complete(TaskEventKind::TargetingCancelled)
            }
        }
    }
}

impl Poolable for WaitTargetData {
    fn reset(&mut self) {
        self.actor = None;
        self.state = TargetingState::Idle;
    }
}

impl AbilityTask for WaitTargetData {
    fn on_activate(&mut self) -> TaskStep {
        let Some(actor) = self.actor.as_mut() else {
            tracing::error!(
                target: "ability::tasks",
                "wait-target-data started without a target actor"
            );
            return TaskStep::End;
        };
        actor.start_targeting();
        self.state = TargetingState::Targeting;
        TaskStep::Pending
    }

    fn wants_tick(&self) -> bool {
        self.state == TargetingState::Targeting
    }

    fn tick(&mut self, dt: f32) -> TaskStep {
        let status = match self.actor.as_mut() {
            Some(actor) => actor.poll(dt),
            None => return TaskStep::End,
        };
        self.step_for(status)
    }

    fn on_destroy(&mut self) {
        if let Some(mut actor) = self.actor.take() {
            if self.state == TargetingState::Targeting {
                actor.cancel_targeting();
            }
            actor.destroy();
        }
        self.state = TargetingState::Finished;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::AscId;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Log {
        calls: Vec<&'static str>,
    }

    #[derive(Debug)]
    struct ScriptedActor {
        log: Rc<RefCell<Log>>,
        confirmed: bool,
    }

    impl TargetActor for ScriptedActor {
        fn start_targeting(&mut self) {
            self.log.borrow_mut().calls.push("start");
        }

        fn poll(&mut self, _dt: f32) -> TargetingStatus {
            if self.confirmed {
                TargetingStatus::Ready(TargetData::single(AscId(2)))
            } else {
                TargetingStatus::Pending
            }
        }

        fn confirm_targeting(&mut self) {
            self.confirmed = true;
        }

        fn cancel_targeting(&mut self) {
            self.log.borrow_mut().calls.push("cancel");
        }

        fn destroy(&mut self) {
            self.log.borrow_mut().calls.push("destroy");
        }
    }

    fn task_with(log: &Rc<RefCell<Log>>) -> WaitTargetData {
        WaitTargetData {
            actor: Some(Box::new(ScriptedActor {
                log: Rc::clone(log),
                confirmed: false,
            })),
            state: TargetingState::Idle,
        }
    }

    #[test]
    fn confirm_delivers_target_data() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut task = task_with(&log);
        assert_eq!(task.on_activate(), TaskStep::Pending);
        assert_eq!(task.tick(0.1), TaskStep::Pending);

        task.confirm();
        assert_eq!(
            task.tick(0.1),
            TaskStep::Complete(TaskEventKind::TargetDataReady(TargetData::single(AscId(2))))
        );
        task.on_destroy();
        assert_eq!(log.borrow().calls, vec!["start", "destroy"]);
    }

    #[test]
    fn destroy_while_targeting_cancels_actor() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut task = task_with(&log);
        task.on_activate();
        task.on_destroy();
        assert_eq!(log.borrow().calls, vec!["start", "cancel", "destroy"]);
    }

    #[test]
    fn missing_actor_ends_immediately() {
        let mut task = WaitTargetData::default();
        assert_eq!(task.on_activate(), TaskStep::End);
    }
}
