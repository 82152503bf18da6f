//! Opaque identifiers handed out by an ability system component.

use std::fmt;

/// Identity of an [`AbilitySystemComponent`](crate::AbilitySystemComponent).
///
/// Specs reference their source and target through this id instead of
/// holding pointers to other components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AscId(pub u64);

/// Host-side object that owns or embodies a component (a player state, a pawn).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u64);

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub(crate) u64);

        impl $name {
            /// The never-issued handle.
            pub const INVALID: Self = Self(0);

            pub fn is_valid(self) -> bool {
                self.0 != 0
            }

            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

handle_type!(
    /// Handle of an active effect on one component.
    ActiveEffectHandle,
    "effect"
);

handle_type!(
    /// Handle of a granted ability spec on one component.
    AbilitySpecHandle,
    "ability"
);

/// Monotonic handle source. Zero is reserved for the invalid handle.
#[derive(Clone, Debug, Default)]
pub(crate) struct HandleCounter(u64);

impl HandleCounter {
    pub(crate) fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(1).max(1);
        self.0
    }
}
