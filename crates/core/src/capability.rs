//! # Capabilities - The Closed Behavior Vocabulary
//!
//! An operator is characterized by what you can *do* with it: evaluate it,
//! differentiate it, take its adjoint, take its proximal step. Each of those
//! behaviors is a [`Capability`], and a [`CapSet`] is a subset of the eight
//! possible capabilities.
//!
//! The vocabulary is closed on purpose. Kind resolution (see the `kind`
//! module) is a reverse lookup from a capability set to a canonical operator
//! kind, and that lookup is only total because the vocabulary cannot grow at
//! runtime. This replaces the reflective "list the methods of the class"
//! discovery of dynamic designs with a statically declared constant per kind.
//!
//! ## Example
//!
//! ```
//! use opalg_core::capability::{CapSet, Capability};
//!
//! let set = CapSet::EMPTY
//!     .with(Capability::Apply)
//!     .with(Capability::Jacobian);
//!
//! assert!(set.contains(Capability::Apply));
//! assert!(!set.contains(Capability::Prox));
//! assert!(set.is_subset(set.with(Capability::Adjoint)));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named behavior an operator may or may not support.
///
/// `Lipschitz` and `DiffLipschitz` are part of the vocabulary but behave
/// differently from the rest: every operator carries those two scalar
/// estimates (defaulted to "unknown", i.e. +∞), so they never appear in a
/// kind's canonical capability set and are combined by dedicated arithmetic
/// in the combinators rather than by deferred closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Evaluate the operator at a point.
    Apply,
    /// Global Lipschitz bound (scalar estimate, always present).
    Lipschitz,
    /// Best local linear approximation, itself a linear operator.
    Jacobian,
    /// Lipschitz bound of the derivative (scalar estimate, always present).
    DiffLipschitz,
    /// The operator is scalar-valued (a functional).
    SingleValued,
    /// Gradient of a scalar-valued differentiable operator.
    Gradient,
    /// Proximal operator.
    Prox,
    /// Adjoint of a linear operator.
    Adjoint,
}

/// All capabilities, in declaration order. Used by [`CapSet::iter`].
pub const ALL_CAPABILITIES: [Capability; 8] = [
    Capability::Apply,
    Capability::Lipschitz,
    Capability::Jacobian,
    Capability::DiffLipschitz,
    Capability::SingleValued,
    Capability::Gradient,
    Capability::Prox,
    Capability::Adjoint,
];

impl Capability {
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Human-readable name, used in error messages and `Display`.
    pub const fn name(self) -> &'static str {
        match self {
            Capability::Apply => "apply",
            Capability::Lipschitz => "lipschitz",
            Capability::Jacobian => "jacobian",
            Capability::DiffLipschitz => "diff_lipschitz",
            Capability::SingleValued => "single_valued",
            Capability::Gradient => "gradient",
            Capability::Prox => "prox",
            Capability::Adjoint => "adjoint",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A subset of the capability vocabulary.
///
/// Backed by a single byte; all set operations are `const` so canonical
/// kind sets can be declared as constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapSet(u8);

impl CapSet {
    /// The empty set.
    pub const EMPTY: CapSet = CapSet(0);

    /// Build a set from a slice of capabilities.
    pub const fn of(caps: &[Capability]) -> CapSet {
        let mut bits = 0u8;
        let mut i = 0;
        while i < caps.len() {
            bits |= caps[i].bit();
            i += 1;
        }
        CapSet(bits)
    }

    /// The set plus one capability.
    pub const fn with(self, cap: Capability) -> CapSet {
        CapSet(self.0 | cap.bit())
    }

    /// The set minus one capability.
    pub const fn without(self, cap: Capability) -> CapSet {
        CapSet(self.0 & !cap.bit())
    }

    /// Membership test.
    pub const fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Set intersection.
    pub const fn intersect(self, other: CapSet) -> CapSet {
        CapSet(self.0 & other.0)
    }

    /// Set union.
    pub const fn union(self, other: CapSet) -> CapSet {
        CapSet(self.0 | other.0)
    }

    /// `self ⊆ other`.
    pub const fn is_subset(self, other: CapSet) -> bool {
        self.0 & !other.0 == 0
    }

    /// Number of capabilities in the set.
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// True when no capability is present.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the member capabilities in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        ALL_CAPABILITIES
            .into_iter()
            .filter(move |c| self.contains(*c))
    }
}

impl fmt::Display for CapSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, cap) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", cap)?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<Capability> for CapSet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter()
            .fold(CapSet::EMPTY, |acc, cap| acc.with(cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set() {
        assert!(CapSet::EMPTY.is_empty());
        assert_eq!(CapSet::EMPTY.len(), 0);
        for cap in ALL_CAPABILITIES {
            assert!(!CapSet::EMPTY.contains(cap));
        }
    }

    #[test]
    fn test_with_without() {
        let set = CapSet::EMPTY.with(Capability::Apply).with(Capability::Prox);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Capability::Prox));

        let smaller = set.without(Capability::Prox);
        assert!(!smaller.contains(Capability::Prox));
        assert!(smaller.contains(Capability::Apply));

        // Removing an absent capability is a no-op.
        assert_eq!(smaller.without(Capability::Adjoint), smaller);
    }

    #[test]
    fn test_intersection_and_union() {
        let a = CapSet::of(&[Capability::Apply, Capability::Jacobian]);
        let b = CapSet::of(&[Capability::Apply, Capability::Adjoint]);

        let both = a.intersect(b);
        assert_eq!(both, CapSet::of(&[Capability::Apply]));

        let either = a.union(b);
        assert_eq!(either.len(), 3);
    }

    #[test]
    fn test_subset() {
        let small = CapSet::of(&[Capability::Apply]);
        let big = CapSet::of(&[Capability::Apply, Capability::SingleValued]);

        assert!(small.is_subset(big));
        assert!(!big.is_subset(small));
        assert!(big.is_subset(big));
        assert!(CapSet::EMPTY.is_subset(small));
    }

    #[test]
    fn test_display() {
        let set = CapSet::of(&[Capability::Apply, Capability::Gradient]);
        assert_eq!(set.to_string(), "{apply, gradient}");
        assert_eq!(CapSet::EMPTY.to_string(), "{}");
    }

    #[test]
    fn test_iter_roundtrip() {
        let set = CapSet::of(&[
            Capability::Apply,
            Capability::SingleValued,
            Capability::Prox,
        ]);
        let collected: CapSet = set.iter().collect();
        assert_eq!(collected, set);
    }
}
