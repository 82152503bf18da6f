//! Cosmetic cue notifications.
//!
//! The component fires a cue for every cue tag of an effect when it becomes
//! active, executes, or is removed. Dispatch is fire-and-forget: nothing in
//! the simulation depends on what a handler does.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use gameplay_tags::GameplayTag;

use crate::effect::EffectSpec;
use crate::handle::AscId;

/// Lifecycle point a cue is fired for.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CueEvent {
    /// A duration or infinite effect was applied.
    OnActive,
    /// Fired right after `OnActive`; persistent visuals start here.
    WhileActive,
    /// An instant or periodic execution ran.
    Executed,
    Removed,
}

/// Data passed along with a cue.
#[derive(Clone, Copy, Debug)]
pub struct CueParameters<'a> {
    pub spec: &'a EffectSpec,
    pub target: AscId,
    pub stack_count: u32,
}

impl CueParameters<'_> {
    pub fn effect_name(&self) -> &str {
        self.spec.name()
    }

    pub fn source(&self) -> Option<AscId> {
        self.spec.source()
    }

    pub fn level(&self) -> i32 {
        self.spec.level()
    }
}

/// Receiver of cue notifications, injected into a component.
pub trait GameplayCueDispatcher {
    fn handle_cue(&mut self, tag: &GameplayTag, event: CueEvent, params: &CueParameters<'_>);
}

/// Lets several components share one dispatcher.
impl<T: GameplayCueDispatcher + ?Sized> GameplayCueDispatcher for Rc<RefCell<T>> {
    fn handle_cue(&mut self, tag: &GameplayTag, event: CueEvent, params: &CueParameters<'_>) {
        self.borrow_mut().handle_cue(tag, event, params);
    }
}

/// A handler registered on a [`CueRouter`].
pub trait GameplayCueHandler {
    fn on_cue(&mut self, tag: &GameplayTag, event: CueEvent, params: &CueParameters<'_>);
}

impl<F> GameplayCueHandler for F
where
    F: FnMut(&GameplayTag, CueEvent, &CueParameters<'_>),
{
    fn on_cue(&mut self, tag: &GameplayTag, event: CueEvent, params: &CueParameters<'_>) {
        self(tag, event, params);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CueHandlerId(u64);

/// Routes cues to handlers registered per tag.
///
/// A handler registered for `GameplayCue.Fire` receives cues tagged
/// `GameplayCue.Fire` and `GameplayCue.Fire.Impact`.
#[derive(Default)]
pub struct CueRouter {
    handlers: BTreeMap<GameplayTag, Vec<(CueHandlerId, Box<dyn GameplayCueHandler>)>>,
    next_id: u64,
}

impl CueRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        tag: GameplayTag,
        handler: impl GameplayCueHandler + 'static,
    ) -> CueHandlerId {
        self.next_id += 1;
        let id = CueHandlerId(self.next_id);
        self.handlers
            .entry(tag)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Returns false if `id` was not registered under `tag`.
    pub fn unregister(&mut self, tag: &GameplayTag, id: CueHandlerId) -> bool {
        let Some(list) = self.handlers.get_mut(tag) else {
            return false;
        };
        let before = list.len();
        list.retain(|(handler_id, _)| *handler_id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.handlers.remove(tag);
        }
        removed
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }
}

impl GameplayCueDispatcher for CueRouter {
    fn handle_cue(&mut self, tag: &GameplayTag, event: CueEvent, params: &CueParameters<'_>) {
        let mut handled = false;
        for (registered, list) in self.handlers.iter_mut() {
            if !tag.matches(registered) {
                continue;
            }
            for (_, handler) in list.iter_mut() {
                handler.on_cue(tag, event, params);
                handled = true;
            }
        }
        if !handled {
            tracing::trace!(target: "ability::cues", tag = %tag, %event, "no cue handler");
        }
    }
}

impl std::fmt::Debug for CueRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueRouter")
            .field("tags", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
