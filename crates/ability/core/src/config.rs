//! Tunables for an ability system component.

/// How much effect state an owning component exposes to remote peers.
///
/// The simulation itself never serializes state; the mode is carried so hosts
/// can decide what to replicate.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReplicationMode {
    /// Every active effect is visible to every peer.
    #[default]
    Full,
    /// Active effects are visible to the owner; others only see tags and cues.
    Mixed,
    /// Only tags and cues are visible.
    Minimal,
}

/// Configuration for one [`AbilitySystemComponent`](crate::AbilitySystemComponent).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilitySystemConfig {
    pub replication_mode: ReplicationMode,
    /// Objects created up front in each pool.
    pub pool_prewarm: usize,
    /// Upper bound on idle objects retained per pool.
    pub max_pooled_per_type: usize,
}

impl AbilitySystemConfig {
    // ===== numeric tolerances =====
    /// Base-value writes smaller than this are ignored.
    pub const VALUE_EPSILON: f32 = f32::EPSILON;
    /// Duration and period timers at or below this many seconds have elapsed.
    pub const TIMER_TOLERANCE: f32 = 1e-4;

    // ===== initial container capacities =====
    pub const DEFAULT_ACTIVE_EFFECT_CAPACITY: usize = 32;
    pub const DEFAULT_ATTRIBUTE_CAPACITY: usize = 32;
    pub const DEFAULT_ABILITY_CAPACITY: usize = 16;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_POOL_PREWARM: usize = 0;
    pub const DEFAULT_MAX_POOLED_PER_TYPE: usize = 64;

    pub fn new() -> Self {
        Self {
            replication_mode: ReplicationMode::default(),
            pool_prewarm: Self::DEFAULT_POOL_PREWARM,
            max_pooled_per_type: Self::DEFAULT_MAX_POOLED_PER_TYPE,
        }
    }

    pub fn with_replication_mode(mut self, mode: ReplicationMode) -> Self {
        self.replication_mode = mode;
        self
    }

    pub fn with_pool_prewarm(mut self, prewarm: usize) -> Self {
        self.pool_prewarm = prewarm;
        self
    }

    pub fn with_max_pooled_per_type(mut self, max: usize) -> Self {
        self.max_pooled_per_type = max;
        self
    }
}

impl Default for AbilitySystemConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replication_mode_parses_case_insensitively() {
        assert_eq!("MIXED".parse::<ReplicationMode>().ok(), Some(ReplicationMode::Mixed));
        assert_eq!(ReplicationMode::Minimal.to_string(), "minimal");
    }

    #[test]
    fn builders_override_defaults() {
        let config = AbilitySystemConfig::new()
            .with_pool_prewarm(4)
            .with_max_pooled_per_type(8);
        assert_eq!(config.pool_prewarm, 4);
        assert_eq!(config.max_pooled_per_type, 8);
        assert_eq!(config.replication_mode, ReplicationMode::Full);
    }
}
