//! Error classification shared by the ability system.
//!
//! Failures that callers are expected to branch on (activation refused, effect
//! application rejected) are returned as typed values. Lookup failures inside
//! a tick are logged and skipped rather than surfaced.

use crate::handle::AbilitySpecHandle;

/// Severity level of an error, used for logging and recovery decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Temporary condition; the same request may succeed later.
    ///
    /// Examples: ability on cooldown, not enough mana.
    Recoverable,

    /// Invalid request; retrying without changes will fail again.
    ///
    /// Examples: unknown ability handle, tag requirements unmet.
    Validation,

    /// Unexpected state inconsistency that points at a bug.
    Internal,

    /// The component cannot continue.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for ability-system errors.
pub trait SystemError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable identifier for the error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

// ============================================================================
// Activation Errors
// ============================================================================

/// Reasons an ability activation request is refused.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActivationError {
    #[error("ability spec {0} is not granted")]
    SpecNotFound(AbilitySpecHandle),

    #[error("ability is already active")]
    AlreadyActive,

    #[error("activation blocked by tags")]
    Blocked,

    #[error("required activation tags are missing")]
    MissingRequiredTags,

    #[error("ability is on cooldown")]
    OnCooldown,

    #[error("insufficient resources to pay the cost")]
    InsufficientCost,

    #[error("activation rejected by authority: {0}")]
    RejectedByAuthority(String),
}

impl SystemError for ActivationError {
    fn severity(&self) -> ErrorSeverity {
        use ActivationError::*;
        match self {
            SpecNotFound(_) => ErrorSeverity::Validation,
            AlreadyActive | Blocked | OnCooldown | InsufficientCost => ErrorSeverity::Recoverable,
            MissingRequiredTags => ErrorSeverity::Validation,
            RejectedByAuthority(_) => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        use ActivationError::*;
        match self {
            SpecNotFound(_) => "ACTIVATION_SPEC_NOT_FOUND",
            AlreadyActive => "ACTIVATION_ALREADY_ACTIVE",
            Blocked => "ACTIVATION_BLOCKED",
            MissingRequiredTags => "ACTIVATION_MISSING_REQUIRED_TAGS",
            OnCooldown => "ACTIVATION_ON_COOLDOWN",
            InsufficientCost => "ACTIVATION_INSUFFICIENT_COST",
            RejectedByAuthority(_) => "ACTIVATION_REJECTED_BY_AUTHORITY",
        }
    }
}

// ============================================================================
// Effect Application Rejections
// ============================================================================

/// Reasons an effect spec is not applied to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApplyRejection {
    #[error("effect spec has no definition")]
    MissingDefinition,

    #[error("target does not meet the application tag requirements")]
    ApplicationRequirementsUnmet,

    #[error("effect spec was created by another component")]
    ForeignSource,
}

impl SystemError for ApplyRejection {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ApplyRejection::MissingDefinition => ErrorSeverity::Internal,
            ApplyRejection::ApplicationRequirementsUnmet => ErrorSeverity::Recoverable,
            ApplyRejection::ForeignSource => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApplyRejection::MissingDefinition => "EFFECT_MISSING_DEFINITION",
            ApplyRejection::ApplicationRequirementsUnmet => "EFFECT_REQUIREMENTS_UNMET",
            ApplyRejection::ForeignSource => "EFFECT_FOREIGN_SOURCE",
        }
    }
}
