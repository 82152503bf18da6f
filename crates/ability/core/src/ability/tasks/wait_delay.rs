use std::any::Any;

use crate::ability::{AbilityContext, AbilityTask, TaskEventKind, TaskHandle, TaskStep};
use crate::config::AbilitySystemConfig;
use crate::pool::Poolable;

/// Completes with [`TaskEventKind::DelayFinished`] after a number of seconds.
#[derive(Debug, Default)]
pub struct WaitDelay {
    duration: f32,
    elapsed: f32,
}

impl WaitDelay {
    /// Starts a delay of `seconds` for the ability behind `ctx`.
    pub fn start(ctx: &mut AbilityContext<'_>, seconds: f32) -> TaskHandle {
        let mut task = ctx.new_task::<WaitDelay>();
        task.duration = seconds;
        ctx.start_task(task)
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }
}

impl Poolable for WaitDelay {
    fn reset(&mut self) {
        self.duration = 0.0;
        self.elapsed = 0.0;
    }
}

impl AbilityTask for WaitDelay {
    fn on_activate(&mut self) -> TaskStep {
        if self.duration <= 0.0 {
            TaskStep::Complete(TaskEventKind::DelayFinished)
        } else {
            TaskStep::Pending
        }
    }

    fn wants_tick(&self) -> bool {
        true
    }

    fn tick(&mut self, dt: f32) -> TaskStep {
        self.elapsed += dt;
        if self.duration - self.elapsed <= AbilitySystemConfig::TIMER_TOLERANCE {
            TaskStep::Complete(TaskEventKind::DelayFinished)
        } else {
            TaskStep::Pending
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
