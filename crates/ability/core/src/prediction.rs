//! Prediction keys and the authority that confirms predicted activations.

use std::fmt;

use crate::asc::AbilitySystemComponent;
use crate::error::ActivationError;
use crate::handle::AbilitySpecHandle;

/// Correlates a locally predicted activation with its authoritative outcome.
///
/// Keys increase monotonically per component; zero is never issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PredictionKey(u32);

impl PredictionKey {
    pub const INVALID: Self = Self(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for PredictionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pk#{}", self.0)
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct PredictionKeyGenerator {
    last: u32,
}

impl PredictionKeyGenerator {
    pub(crate) fn next_key(&mut self) -> PredictionKey {
        self.last = self.last.wrapping_add(1).max(1);
        PredictionKey(self.last)
    }
}

/// Per-activation data handed to behaviours and to the authority.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActivationInfo {
    pub prediction_key: PredictionKey,
}

impl ActivationInfo {
    pub fn predicted(key: PredictionKey) -> Self {
        Self {
            prediction_key: key,
        }
    }

    pub fn is_predicted(&self) -> bool {
        self.prediction_key.is_valid()
    }
}

/// The authoritative side of an activation.
///
/// Called for `LocalPredicted` activations after the local run (with the
/// activation's own key) and for `ServerOnly` activations before anything runs.
pub trait ActivationAuthority {
    fn confirm_activation(
        &mut self,
        asc: &AbilitySystemComponent,
        ability: AbilitySpecHandle,
        activation: &ActivationInfo,
    ) -> Result<(), ActivationError>;
}

/// Same-process authority: re-validates the activation gate on the component.
///
/// For predicted activations the tags granted and cost paid under the
/// activation's key are excluded, so a prediction does not veto itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalAuthority;

impl ActivationAuthority for LocalAuthority {
    fn confirm_activation(
        &mut self,
        asc: &AbilitySystemComponent,
        ability: AbilitySpecHandle,
        activation: &ActivationInfo,
    ) -> Result<(), ActivationError> {
        asc.can_activate_authoritative(ability, activation.prediction_key)
    }
}
