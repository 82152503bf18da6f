//! Latent units of work owned by an active ability.
//!
//! A task is a small state machine. It reports progress through [`TaskStep`]
//! instead of invoking callbacks; the owning component turns completed steps
//! into [`TaskEvent`]s for the ability and recycles the task into a pool
//! keyed by its concrete type.

use std::any::{Any, TypeId};
use std::collections::VecDeque;
use std::fmt;

use crate::effect::TargetData;
use crate::pool::{Poolable, TypedPool};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u32);

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// What a task reports after activating or ticking.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskStep {
    /// Still waiting.
    Pending,
    /// Done; deliver `event` to the ability and end.
    Complete(TaskEventKind),
    /// Done without anything to report.
    End,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TaskEventKind {
    DelayFinished,
    TargetDataReady(TargetData),
    TargetingCancelled,
    Custom(&'static str),
}

/// A completion delivered to the owning ability.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskEvent {
    pub task: TaskHandle,
    pub kind: TaskEventKind,
}

/// A pooled latent operation.
pub trait AbilityTask: Poolable + fmt::Debug + Any {
    /// Called once when the task starts.
    fn on_activate(&mut self) -> TaskStep;

    /// Ticking tasks are advanced on every component tick while active.
    fn wants_tick(&self) -> bool {
        false
    }

    fn tick(&mut self, _dt: f32) -> TaskStep {
        TaskStep::Pending
    }

    /// Releases whatever the task holds. Runs on completion and on cancel.
    fn on_destroy(&mut self) {}

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Notification produced by a [`TaskSet`] for the owning ability.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TaskNotice {
    Event(TaskEvent),
    Ended { task: TaskHandle, cancelled: bool },
}

#[derive(Debug)]
struct TaskSlot {
    handle: TaskHandle,
    type_id: TypeId,
    task: Box<dyn AbilityTask>,
}

/// Running tasks of one ability activation.
#[derive(Debug, Default)]
pub(crate) struct TaskSet {
    slots: Vec<TaskSlot>,
    next_handle: u32,
    notices: VecDeque<TaskNotice>,
}

impl TaskSet {
    /// Acquires a task of type `T` from `pool`, or builds a default one.
    pub(crate) fn acquire<T: AbilityTask + Default>(
        pool: &mut TypedPool<dyn AbilityTask>,
    ) -> Box<T> {
        pool.take(TypeId::of::<T>())
            .and_then(|task| task.into_any().downcast::<T>().ok())
            .unwrap_or_default()
    }

    /// Activates `task`. Tasks that finish during activation end immediately.
    pub(crate) fn start<T: AbilityTask>(
        &mut self,
        mut task: Box<T>,
        pool: &mut TypedPool<dyn AbilityTask>,
    ) -> TaskHandle {
        self.next_handle += 1;
        let handle = TaskHandle(self.next_handle);
        let step = task.on_activate();
        let slot = TaskSlot {
            handle,
            type_id: TypeId::of::<T>(),
            task,
        };
        tracing::trace!(target: "ability::tasks", task = %handle, "task activated");
        match step {
            TaskStep::Pending => self.slots.push(slot),
            TaskStep::Complete(kind) => {
                self.notices
                    .push_back(TaskNotice::Event(TaskEvent { task: handle, kind }));
                self.finish(slot, false, pool);
            }
            TaskStep::End => self.finish(slot, false, pool),
        }
        handle
    }

    /// Advances every ticking task by `dt`.
    pub(crate) fn tick(&mut self, dt: f32, pool: &mut TypedPool<dyn AbilityTask>) {
        let mut index = 0;
        while index < self.slots.len() {
            let slot = &mut self.slots[index];
            let step = if slot.task.wants_tick() {
                slot.task.tick(dt)
            } else {
                TaskStep::Pending
            };
            match step {
                TaskStep::Pending => index += 1,
                TaskStep::Complete(kind) => {
                    let slot = self.slots.remove(index);
                    self.notices.push_back(TaskNotice::Event(TaskEvent {
                        task: slot.handle,
                        kind,
                    }));
                    self.finish(slot, false, pool);
                }
                TaskStep::End => {
                    let slot = self.slots.remove(index);
                    self.finish(slot, false, pool);
                }
            }
        }
    }

    /// Cancels one task. Its completion event is never delivered.
    pub(crate) fn cancel(
        &mut self,
        handle: TaskHandle,
        pool: &mut TypedPool<dyn AbilityTask>,
    ) -> bool {
        let Some(index) = self.slots.iter().position(|slot| slot.handle == handle) else {
            return false;
        };
        let slot = self.slots.remove(index);
        self.finish(slot, true, pool);
        true
    }

    /// Cancels every running task and drops pending notices.
    pub(crate) fn cancel_all(&mut self, pool: &mut TypedPool<dyn AbilityTask>) {
        while let Some(slot) = self.slots.pop() {
            self.finish(slot, true, pool);
        }
        self.notices.clear();
    }

    fn finish(
        &mut self,
        mut slot: TaskSlot,
        cancelled: bool,
        pool: &mut TypedPool<dyn AbilityTask>,
    ) {
        slot.task.on_destroy();
        self.notices.push_back(TaskNotice::Ended {
            task: slot.handle,
            cancelled,
        });
        tracing::trace!(target: "ability::tasks", task = %slot.handle, cancelled, "task ended");
        pool.release(slot.type_id, slot.task);
    }

    pub(crate) fn next_notice(&mut self) -> Option<TaskNotice> {
        self.notices.pop_front()
    }

    pub(crate) fn has_notices(&self) -> bool {
        !self.notices.is_empty()
    }

    pub(crate) fn is_running(&self, handle: TaskHandle) -> bool {
        self.slots.iter().any(|slot| slot.handle == handle)
    }

    pub(crate) fn running(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn task_mut<T: AbilityTask>(&mut self, handle: TaskHandle) -> Option<&mut T> {
        self.slots
            .iter_mut()
            .find(|slot| slot.handle == handle)
            .and_then(|slot| slot.task.as_any_mut().downcast_mut::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Countdown {
        ticks: u32,
        destroyed: bool,
    }

    impl Poolable for Countdown {
        fn reset(&mut self) {
            self.ticks = 0;
            self.destroyed = false;
        }
    }

    impl AbilityTask for Countdown {
        fn on_activate(&mut self) -> TaskStep {
            if self.ticks == 0 {
                TaskStep::Complete(TaskEventKind::Custom("instant"))
            } else {
                TaskStep::Pending
            }
        }

        fn wants_tick(&self) -> bool {
            true
        }

        fn tick(&mut self, _dt: f32) -> TaskStep {
            self.ticks -= 1;
            if self.ticks == 0 {
                TaskStep::Complete(TaskEventKind::Custom("done"))
            } else {
                TaskStep::Pending
            }
        }

        fn on_destroy(&mut self) {
            self.destroyed = true;
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn Any> {
            self
        }
    }

    #[test]
    fn completes_then_returns_to_pool() {
        let mut pool: TypedPool<dyn AbilityTask> = TypedPool::new(4);
        let mut tasks = TaskSet::default();

        let mut task = TaskSet::acquire::<Countdown>(&mut pool);
        task.ticks = 2;
        let handle = tasks.start(task, &mut pool);
        assert!(tasks.is_running(handle));

        tasks.tick(0.1, &mut pool);
        assert!(tasks.next_notice().is_none());
        tasks.tick(0.1, &mut pool);
        assert_eq!(
            tasks.next_notice(),
            Some(TaskNotice::Event(TaskEvent {
                task: handle,
                kind: TaskEventKind::Custom("done"),
            }))
        );
        assert_eq!(
            tasks.next_notice(),
            Some(TaskNotice::Ended {
                task: handle,
                cancelled: false
            })
        );
        assert_eq!(pool.available(TypeId::of::<Countdown>()), 1);

        let reused = TaskSet::acquire::<Countdown>(&mut pool);
        assert_eq!(reused.ticks, 0);
        assert!(!reused.destroyed);
    }

    #[test]
    fn cancel_suppresses_completion() {
        let mut pool: TypedPool<dyn AbilityTask> = TypedPool::new(4);
        let mut tasks = TaskSet::default();
        let mut task = TaskSet::acquire::<Countdown>(&mut pool);
        task.ticks = 1;
        let handle = tasks.start(task, &mut pool);

        assert!(tasks.cancel(handle, &mut pool));
        tasks.tick(0.1, &mut pool);
        assert_eq!(
            tasks.next_notice(),
            Some(TaskNotice::Ended {
                task: handle,
                cancelled: true
            })
        );
        assert!(tasks.next_notice().is_none());
        assert!(!tasks.cancel(handle, &mut pool));
    }

    #[test]
    fn task_finishing_on_activate_never_runs() {
        let mut pool: TypedPool<dyn AbilityTask> = TypedPool::new(4);
        let mut tasks = TaskSet::default();
        let task = TaskSet::acquire::<Countdown>(&mut pool);
        let handle = tasks.start(task, &mut pool);
        assert!(!tasks.is_running(handle));
        assert_eq!(tasks.running(), 0);
        assert!(matches!(tasks.next_notice(), Some(TaskNotice::Event(_))));
    }
}
