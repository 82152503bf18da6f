//! Plain tag sets used by definitions.

use std::collections::BTreeSet;

use crate::{GameplayTag, TagPredicate};

/// An ordered set of tags.
///
/// Used for definition data (granted tags, asset tags, requirement lists).
/// Duplicates collapse; iteration order is by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct TagContainer {
    tags: BTreeSet<GameplayTag>,
}

impl TagContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a container from tag names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().map(GameplayTag::new).collect()
    }

    /// Adds a tag. Returns false if it was already present.
    pub fn add(&mut self, tag: GameplayTag) -> bool {
        if tag.is_empty() {
            return false;
        }
        self.tags.insert(tag)
    }

    /// Adds every tag from `other`.
    pub fn extend_from(&mut self, other: &TagContainer) {
        self.tags.extend(other.tags.iter().cloned());
    }

    /// Removes a tag. Returns false if it was not present.
    pub fn remove(&mut self, tag: &GameplayTag) -> bool {
        self.tags.remove(tag)
    }

    /// Removes every tag.
    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameplayTag> {
        self.tags.iter()
    }
}

impl TagPredicate for TagContainer {
    fn has_tag(&self, tag: &GameplayTag) -> bool {
        self.tags.iter().any(|held| held.matches(tag))
    }

    fn has_tag_exact(&self, tag: &GameplayTag) -> bool {
        self.tags.contains(tag)
    }
}

impl FromIterator<GameplayTag> for TagContainer {
    fn from_iter<I: IntoIterator<Item = GameplayTag>>(iter: I) -> Self {
        let mut container = TagContainer::new();
        for tag in iter {
            container.add(tag);
        }
        container
    }
}

impl<'a> IntoIterator for &'a TagContainer {
    type Item = &'a GameplayTag;
    type IntoIter = std::collections::btree_set::Iter<'a, GameplayTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_and_all_follow_hierarchy() {
        let held = TagContainer::from_names(["State.Stunned", "Debuff.Poison"]);

        assert!(held.has_any(&TagContainer::from_names(["Debuff", "Buff"])));
        assert!(held.has_all(&TagContainer::from_names(["Debuff", "State"])));
        assert!(!held.has_all(&TagContainer::from_names(["Debuff", "Buff"])));
    }

    #[test]
    fn empty_queries() {
        let held = TagContainer::from_names(["A"]);
        assert!(!held.has_any(&TagContainer::new()));
        assert!(held.has_all(&TagContainer::new()));
    }

    #[test]
    fn empty_names_are_ignored() {
        let container = TagContainer::from_names(["", "A"]);
        assert_eq!(container.len(), 1);
    }
}
