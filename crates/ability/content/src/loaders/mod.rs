//! RON loaders for effect and ability definitions.
//!
//! Files share one layout ([`ContentFile`]); a directory of files is merged
//! before references are resolved, so definitions may refer to each other
//! across files.

pub mod format;
pub mod library;

pub use format::{AbilityData, ContentFile, EffectData, MagnitudeData, ModifierData};
pub use library::{ContentLibrary, ContentLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
