//! Data-driven ability and effect definitions.
//!
//! Definitions are authored in RON and turned into shared
//! [`ability_core::EffectDefinition`] / [`ability_core::AbilityDefinition`]
//! values. Anything that is code rather than data (ability behaviours,
//! execution calculations, custom magnitudes) is referenced by name and
//! looked up in a [`ContentRegistry`] supplied by the host.
//!
//! A typical content directory:
//!
//! ```text
//! content/
//! ├── effects.ron
//! └── abilities.ron
//! ```

pub mod registry;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use registry::{BehaviourArgs, ContentRegistry};

#[cfg(feature = "loaders")]
pub use loaders::{
    AbilityData, ContentFile, ContentLibrary, ContentLoader, EffectData, MagnitudeData,
    ModifierData,
};
