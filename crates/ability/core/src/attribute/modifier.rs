//! Modifier operations and the current-value aggregate.

/// Arithmetic applied by a modifier.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierOp {
    Add,
    Multiply,
    Divide,
    Override,
}

impl ModifierOp {
    /// Applies the operation to a base value (permanent modification).
    ///
    /// Dividing by zero leaves the value unchanged.
    pub fn apply(self, value: f32, magnitude: f32) -> f32 {
        match self {
            ModifierOp::Add => value + magnitude,
            ModifierOp::Multiply => value * magnitude,
            ModifierOp::Divide => {
                if magnitude != 0.0 {
                    value / magnitude
                } else {
                    value
                }
            }
            ModifierOp::Override => magnitude,
        }
    }
}

/// Accumulates temporary modifiers for one attribute during recalculation.
///
/// ```text
/// current = override, if any
///         = ((base + additive) * multiplicative) / divisive
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModifierAggregator {
    additive: f32,
    multiplicative: f32,
    divisive: f32,
    override_value: Option<f32>,
}

impl ModifierAggregator {
    pub fn new() -> Self {
        Self {
            additive: 0.0,
            multiplicative: 1.0,
            divisive: 1.0,
            override_value: None,
        }
    }

    /// Adds one modifier contribution. The last override wins.
    pub fn add(&mut self, op: ModifierOp, magnitude: f32) {
        match op {
            ModifierOp::Add => self.additive += magnitude,
            ModifierOp::Multiply => self.multiplicative *= magnitude,
            ModifierOp::Divide => {
                if magnitude != 0.0 {
                    self.divisive *= magnitude;
                }
            }
            ModifierOp::Override => self.override_value = Some(magnitude),
        }
    }

    pub fn evaluate(&self, base: f32) -> f32 {
        if let Some(value) = self.override_value {
            return value;
        }
        let divisive = if self.divisive == 0.0 {
            1.0
        } else {
            self.divisive
        };
        ((base + self.additive) * self.multiplicative) / divisive
    }
}

impl Default for ModifierAggregator {
    fn default() -> Self {
        Self::new()
    }
}
