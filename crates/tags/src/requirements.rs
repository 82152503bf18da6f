//! Required / ignored tag pairs.

use crate::{TagContainer, TagPredicate};

/// Tag gate evaluated against an owner's tags.
///
/// Met when the owner holds every `required` tag and none of the `ignored`
/// tags. Empty requirements are always met.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagRequirements {
    #[cfg_attr(feature = "serde", serde(default))]
    pub required: TagContainer,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ignored: TagContainer,
}

impl TagRequirements {
    pub fn new(required: TagContainer, ignored: TagContainer) -> Self {
        Self { required, ignored }
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.ignored.is_empty()
    }

    /// Returns true if `owner` satisfies both lists.
    pub fn requirements_met<P: TagPredicate + ?Sized>(&self, owner: &P) -> bool {
        owner.has_all(&self.required) && owner.has_none(&self.ignored)
    }

    /// Returns true if the `required` list is satisfied.
    pub fn required_met<P: TagPredicate + ?Sized>(&self, owner: &P) -> bool {
        owner.has_all(&self.required)
    }

    /// Returns true if no `ignored` tag is held.
    pub fn ignored_clear<P: TagPredicate + ?Sized>(&self, owner: &P) -> bool {
        owner.has_none(&self.ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_and_ignored() {
        let reqs = TagRequirements::new(
            TagContainer::from_names(["State.Alive"]),
            TagContainer::from_names(["State.Stunned"]),
        );

        assert!(reqs.requirements_met(&TagContainer::from_names(["State.Alive"])));
        let stunned = TagContainer::from_names(["State.Alive", "State.Stunned"]);
        assert!(!reqs.requirements_met(&stunned));
        assert!(!reqs.requirements_met(&TagContainer::new()));
        assert!(TagRequirements::default().requirements_met(&TagContainer::new()));
    }
}
