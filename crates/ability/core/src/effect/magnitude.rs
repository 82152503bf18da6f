//! Level-scaled and custom modifier magnitudes.

use std::fmt;
use std::sync::Arc;

use crate::asc::AbilitySystemComponent;

use super::EffectSpec;

/// A value that grows linearly with level.
///
/// Level 1 (and anything below) yields `base`; each level above adds
/// `per_level`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScalableFloat {
    pub base: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub per_level: f32,
}

impl ScalableFloat {
    pub const fn new(base: f32, per_level: f32) -> Self {
        Self { base, per_level }
    }

    pub const fn constant(value: f32) -> Self {
        Self::new(value, 0.0)
    }

    pub fn value_at(&self, level: i32) -> f32 {
        let steps = if level > 0 { level - 1 } else { 0 };
        self.base + self.per_level * steps as f32
    }
}

impl From<f32> for ScalableFloat {
    fn from(value: f32) -> Self {
        Self::constant(value)
    }
}

/// Computes a modifier magnitude from the spec being created and its source.
///
/// Evaluated once, when the spec is created.
pub trait MagnitudeCalculation: fmt::Debug {
    fn calculate(&self, spec: &EffectSpec, source: &AbilitySystemComponent) -> f32;
}

/// How a modifier's magnitude is obtained.
#[derive(Clone, Debug)]
pub enum Magnitude {
    Scalable(ScalableFloat),
    Custom(Arc<dyn MagnitudeCalculation>),
}

impl Magnitude {
    /// Evaluates the magnitude for `spec` as created by `source`.
    pub fn evaluate(&self, spec: &EffectSpec, source: &AbilitySystemComponent) -> f32 {
        match self {
            Magnitude::Scalable(value) => value.value_at(spec.level()),
            Magnitude::Custom(calculation) => calculation.calculate(spec, source),
        }
    }

    /// The level-scaled value, if this is not a custom calculation.
    pub fn scalable_at(&self, level: i32) -> Option<f32> {
        match self {
            Magnitude::Scalable(value) => Some(value.value_at(level)),
            Magnitude::Custom(_) => None,
        }
    }
}

impl From<f32> for Magnitude {
    fn from(value: f32) -> Self {
        Magnitude::Scalable(ScalableFloat::constant(value))
    }
}

impl From<ScalableFloat> for Magnitude {
    fn from(value: ScalableFloat) -> Self {
        Magnitude::Scalable(value)
    }
}
