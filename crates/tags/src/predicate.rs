//! Set-membership queries shared by every tag collection.

use crate::{GameplayTag, TagContainer};

/// Query surface over a collection of tags.
///
/// Implementors only provide [`TagPredicate::has_tag`] and
/// [`TagPredicate::has_tag_exact`]; the set queries are derived from them.
pub trait TagPredicate {
    /// Returns true if the collection holds `tag` or any descendant of it.
    fn has_tag(&self, tag: &GameplayTag) -> bool;

    /// Returns true if the collection holds exactly `tag`.
    fn has_tag_exact(&self, tag: &GameplayTag) -> bool;

    /// Returns true if at least one tag of `tags` is held.
    ///
    /// An empty query never matches.
    fn has_any(&self, tags: &TagContainer) -> bool {
        tags.iter().any(|tag| self.has_tag(tag))
    }

    /// Returns true if every tag of `tags` is held.
    ///
    /// An empty query always matches.
    fn has_all(&self, tags: &TagContainer) -> bool {
        tags.iter().all(|tag| self.has_tag(tag))
    }

    /// Returns true if no tag of `tags` is held.
    fn has_none(&self, tags: &TagContainer) -> bool {
        !self.has_any(tags)
    }
}
