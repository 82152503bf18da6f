//! Reference-counted tag sets for runtime owner state.

use std::collections::BTreeMap;

use crate::{GameplayTag, TagContainer, TagPredicate};

/// A tag multiset.
///
/// Every grant increments a counter and every revoke decrements it; a tag is
/// held while its count is positive. Two effects granting the same tag keep
/// it alive until both are removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagCountContainer {
    counts: BTreeMap<GameplayTag, u32>,
}

impl TagCountContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the count of `tag`.
    pub fn add_tag(&mut self, tag: &GameplayTag) {
        if tag.is_empty() {
            return;
        }
        *self.counts.entry(tag.clone()).or_insert(0) += 1;
    }

    /// Decrements the count of `tag`, dropping it at zero.
    ///
    /// Returns false if the tag was not held.
    pub fn remove_tag(&mut self, tag: &GameplayTag) -> bool {
        match self.counts.get_mut(tag) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.counts.remove(tag);
                true
            }
            None => false,
        }
    }

    /// Increments every tag in `tags`.
    pub fn add_tags(&mut self, tags: &TagContainer) {
        for tag in tags {
            self.add_tag(tag);
        }
    }

    /// Decrements every tag in `tags`.
    pub fn remove_tags(&mut self, tags: &TagContainer) {
        for tag in tags {
            self.remove_tag(tag);
        }
    }

    /// Adds all counts held by `other` to this container.
    pub fn merge(&mut self, other: &TagCountContainer) {
        for (tag, count) in &other.counts {
            *self.counts.entry(tag.clone()).or_insert(0) += count;
        }
    }

    /// Current count of exactly `tag`.
    pub fn count(&self, tag: &GameplayTag) -> u32 {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct tags held.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Iterates the distinct tags held.
    pub fn tags(&self) -> impl Iterator<Item = &GameplayTag> {
        self.counts.keys()
    }

    /// Snapshot of the held tags as a plain container.
    pub fn to_container(&self) -> TagContainer {
        self.counts.keys().cloned().collect()
    }
}

impl TagPredicate for TagCountContainer {
    fn has_tag(&self, tag: &GameplayTag) -> bool {
        self.counts.keys().any(|held| held.matches(tag))
    }

    fn has_tag_exact(&self, tag: &GameplayTag) -> bool {
        self.counts.contains_key(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_survives_until_last_revoke() {
        let stun = GameplayTag::new("State.Stunned");
        let mut tags = TagCountContainer::new();
        tags.add_tag(&stun);
        tags.add_tag(&stun);

        assert!(tags.remove_tag(&stun));
        assert!(tags.has_tag(&stun));
        assert!(tags.remove_tag(&stun));
        assert!(!tags.has_tag(&stun));
        assert!(!tags.remove_tag(&stun));
    }

    #[test]
    fn merge_sums_counts() {
        let tag = GameplayTag::new("A");
        let mut left = TagCountContainer::new();
        let mut right = TagCountContainer::new();
        left.add_tag(&tag);
        right.add_tag(&tag);
        left.merge(&right);
        assert_eq!(left.count(&tag), 2);
    }
}
