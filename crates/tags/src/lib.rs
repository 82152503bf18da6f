//! Hierarchical gameplay tags with set-membership queries.
//!
//! Tags are dot-separated names (`"Status.Debuff.Poison"`). A container that
//! holds a tag also answers queries for every parent of that tag, so holding
//! `Status.Debuff.Poison` satisfies a query for `Status.Debuff`.
//!
//! The ability system only consumes the predicate surface exposed by
//! [`TagPredicate`]; how tags are stored is private to this crate.
//!
//! - [`GameplayTag`]: a single interned-by-`Arc` tag name
//! - [`TagContainer`]: a plain set of tags (definition data)
//! - [`TagCountContainer`]: reference-counted tags (runtime owner state)
//! - [`TagRequirements`]: required / ignored pairs evaluated against a predicate

pub mod container;
pub mod count;
pub mod predicate;
pub mod requirements;
pub mod tag;

pub use container::TagContainer;
pub use count::TagCountContainer;
pub use predicate::TagPredicate;
pub use requirements::TagRequirements;
pub use tag::GameplayTag;
