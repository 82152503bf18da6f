//! A single hierarchical tag.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Separator between hierarchy levels in a tag name.
pub const SEPARATOR: char = '.';

/// A hierarchical gameplay tag such as `Ability.Skill.Fireball`.
///
/// Cloning is cheap (the name is reference counted). Equality and ordering
/// compare the full name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct GameplayTag(Arc<str>);

impl GameplayTag {
    /// Creates a tag from its full dotted name.
    ///
    /// Leading/trailing separators and whitespace are trimmed.
    pub fn new(name: impl AsRef<str>) -> Self {
        let trimmed = name.as_ref().trim().trim_matches(SEPARATOR);
        Self(Arc::from(trimmed))
    }

    /// Full dotted name of this tag.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns true if this tag has an empty name.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `self` equals `other` or is a descendant of it.
    ///
    /// `Status.Debuff.Poison` matches `Status.Debuff` and `Status`, but
    /// `Status.DebuffX` does not match `Status.Debuff`.
    pub fn matches(&self, other: &GameplayTag) -> bool {
        let name = self.name();
        let parent = other.name();
        if parent.is_empty() {
            return false;
        }
        match name.strip_prefix(parent) {
            Some("") => true,
            Some(rest) => rest.starts_with(SEPARATOR),
            None => false,
        }
    }

    /// Returns the direct parent tag, if any.
    pub fn parent(&self) -> Option<GameplayTag> {
        self.name()
            .rfind(SEPARATOR)
            .map(|idx| GameplayTag::new(&self.name()[..idx]))
    }

    /// Number of hierarchy levels (`A.B.C` has depth 3).
    pub fn depth(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.name().split(SEPARATOR).count()
        }
    }
}

impl fmt::Debug for GameplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.name())
    }
}

impl fmt::Display for GameplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for GameplayTag {
    fn from(name: &str) -> Self {
        GameplayTag::new(name)
    }
}

impl From<String> for GameplayTag {
    fn from(name: String) -> Self {
        GameplayTag::new(name)
    }
}

impl Borrow<str> for GameplayTag {
    fn borrow(&self) -> &str {
        self.name()
    }
}
