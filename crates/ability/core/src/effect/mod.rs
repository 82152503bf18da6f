//! Effect definitions, per-application specs and active effects.

mod active;
mod context;
mod definition;
mod execution;
mod magnitude;
mod spec;

pub use active::ActiveEffect;
pub use context::{
    DefaultEffectContext, EffectContext, EffectContextFactory, PooledContextFactory, TargetData,
};
pub use definition::{
    DurationPolicy, EffectDefinition, EffectDefinitionBuilder, Modifier, StackDurationRefresh,
    StackingPolicy, StackingType,
};
pub use execution::ExecutionCalculation;
pub use magnitude::{Magnitude, MagnitudeCalculation, ScalableFloat};
pub use spec::EffectSpec;

use crate::error::ApplyRejection;
use crate::handle::ActiveEffectHandle;

/// Outcome of applying an effect spec to a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyEffectResult {
    /// An instant effect ran and its spec was recycled.
    Executed,
    /// A new active effect was created.
    Applied(ActiveEffectHandle),
    /// An existing active effect absorbed the application.
    Stacked(ActiveEffectHandle),
    Rejected(ApplyRejection),
}

impl ApplyEffectResult {
    pub fn is_rejected(&self) -> bool {
        matches!(self, ApplyEffectResult::Rejected(_))
    }

    /// Handle of the active effect that now represents the application.
    pub fn active_handle(&self) -> Option<ActiveEffectHandle> {
        match self {
            ApplyEffectResult::Applied(handle) | ApplyEffectResult::Stacked(handle) => {
                Some(*handle)
            }
            _ => None,
        }
    }
}
