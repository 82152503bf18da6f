//! Custom execution logic run alongside an effect's modifiers.

use std::fmt;

use crate::asc::AbilitySystemComponent;

use super::{EffectSpec, Modifier};

/// Produces extra permanent modifiers each time an effect executes.
///
/// Runs for instant applications and for every periodic execution, before the
/// definition's own modifiers. Output modifiers are resolved by attribute
/// name on the target and applied to base values; scalable magnitudes are
/// evaluated at the spec's level.
pub trait ExecutionCalculation: fmt::Debug {
    fn execute(
        &self,
        spec: &EffectSpec,
        target: &AbilitySystemComponent,
        output: &mut Vec<Modifier>,
    );
}
