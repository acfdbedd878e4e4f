//! # Kinds - The Operator Lattice
//!
//! A [`Kind`] is a canonical bundle of capabilities: `Map` can only be
//! applied, `LinOp` can additionally be differentiated (trivially) and
//! transposed, `ProxFunc` is a scalar-valued operator with a proximal step,
//! and so on. The seven base kinds are closed under the algebraic
//! combinators: intersecting any two canonical sets (with the combinators'
//! pruning rules applied) lands back on a canonical set, which is what makes
//! [`Kind::resolve`] total in practice.
//!
//! ## Resolution
//!
//! `resolve` is a plain linear scan comparing for *exact* equality — the
//! lattice is small enough that anything cleverer would be noise:
//!
//! ```
//! use opalg_core::capability::{CapSet, Capability};
//! use opalg_core::kind::Kind;
//!
//! let caps = CapSet::of(&[Capability::Apply, Capability::Jacobian]);
//! assert_eq!(Kind::resolve(caps), Some(Kind::DiffMap));
//! assert_eq!(Kind::resolve(CapSet::EMPTY), None);
//! ```
//!
//! ## Refinements
//!
//! The refinements of `LinOp` (square, normal, self-adjoint, unitary,
//! idempotent, positive-definite) add semantic invariants without adding
//! capabilities. They are modeled as a [`Structure`] of independent flags
//! rather than a subclass tree: an orthogonal projection simply *is*
//! idempotent and self-adjoint at the same time, no diamond required.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capability::{CapSet, Capability};

/// The seven canonical operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Anything that can be evaluated.
    Map,
    /// A differentiable map.
    DiffMap,
    /// A scalar-valued map.
    Func,
    /// A differentiable scalar-valued map.
    DiffFunc,
    /// A scalar-valued map with a proximal operator.
    ProxFunc,
    /// A linear operator.
    LinOp,
    /// A linear functional.
    LinFunc,
}

/// The base kinds in resolution-scan order.
pub const BASE_KINDS: [Kind; 7] = [
    Kind::Map,
    Kind::DiffMap,
    Kind::Func,
    Kind::DiffFunc,
    Kind::ProxFunc,
    Kind::LinOp,
    Kind::LinFunc,
];

impl Kind {
    /// The canonical capability set of the kind.
    ///
    /// The two Lipschitz scalars never appear here: they are carried by
    /// every operator instance as numeric estimates, not as optional
    /// behaviors.
    pub const fn caps(self) -> CapSet {
        match self {
            Kind::Map => CapSet::of(&[Capability::Apply]),
            Kind::DiffMap => CapSet::of(&[Capability::Apply, Capability::Jacobian]),
            Kind::Func => CapSet::of(&[Capability::Apply, Capability::SingleValued]),
            Kind::DiffFunc => CapSet::of(&[
                Capability::Apply,
                Capability::SingleValued,
                Capability::Jacobian,
                Capability::Gradient,
            ]),
            Kind::ProxFunc => CapSet::of(&[
                Capability::Apply,
                Capability::SingleValued,
                Capability::Prox,
            ]),
            Kind::LinOp => CapSet::of(&[
                Capability::Apply,
                Capability::Jacobian,
                Capability::Adjoint,
            ]),
            Kind::LinFunc => CapSet::of(&[
                Capability::Apply,
                Capability::SingleValued,
                Capability::Jacobian,
                Capability::Gradient,
                Capability::Adjoint,
            ]),
        }
    }

    /// Reverse lookup: the kind whose canonical set equals `caps` exactly.
    pub fn resolve(caps: CapSet) -> Option<Kind> {
        BASE_KINDS.into_iter().find(|k| k.caps() == caps)
    }

    /// True for the linear kinds (`LinOp`, `LinFunc`).
    pub const fn is_linear(self) -> bool {
        matches!(self, Kind::LinOp | Kind::LinFunc)
    }

    /// True for the scalar-valued kinds.
    pub const fn is_functional(self) -> bool {
        self.caps().contains(Capability::SingleValued)
    }

    /// Kinds that derive their Jacobian instead of storing one: linear
    /// kinds answer with themselves, gradient-carrying functionals build an
    /// explicit linear functional from the gradient.
    pub const fn derives_jacobian(self) -> bool {
        matches!(self, Kind::LinOp | Kind::DiffFunc | Kind::LinFunc)
    }

    /// The single-valued counterpart used by `squeeze`: `Map → Func`,
    /// `DiffMap → DiffFunc`, `LinOp → LinFunc`; functional kinds map to
    /// themselves.
    pub const fn squeezed(self) -> Kind {
        match self {
            Kind::Map => Kind::Func,
            Kind::DiffMap => Kind::DiffFunc,
            Kind::LinOp => Kind::LinFunc,
            k => k,
        }
    }

    /// Name as written in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Map => "Map",
            Kind::DiffMap => "DiffMap",
            Kind::Func => "Func",
            Kind::DiffFunc => "DiffFunc",
            Kind::ProxFunc => "ProxFunc",
            Kind::LinOp => "LinOp",
            Kind::LinFunc => "LinFunc",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Linear-Operator Structure Tags
// ============================================================================

/// Semantic invariants of a linear operator, tracked as independent flags.
///
/// These refine the linear kinds without granting new capabilities:
/// a unitary operator is still applied/transposed through the same entry
/// points, but the numerical services are allowed to shortcut (its norm is
/// 1, its pseudo-inverse is its adjoint), and the prox-composition rule is
/// allowed to preserve the proximal operator.
///
/// Combinations express the refinement lattice by conjunction:
/// an orthogonal projection is `idempotent && self_adjoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Structure {
    /// Codomain and domain sizes coincide.
    pub square: bool,
    /// Commutes with its adjoint.
    pub normal: bool,
    /// Adjoint coincides with apply.
    pub self_adjoint: bool,
    /// Self-adjoint with positive spectrum (semantic tag only).
    pub pos_def: bool,
    /// Norm-preserving; Lipschitz constant is exactly 1.
    pub unitary: bool,
    /// Applying twice equals applying once.
    pub idempotent: bool,
}

impl Structure {
    /// No invariant claimed.
    pub const PLAIN: Structure = Structure {
        square: false,
        normal: false,
        self_adjoint: false,
        pos_def: false,
        unitary: false,
        idempotent: false,
    };

    /// Orthogonal projection: idempotent and self-adjoint.
    pub const fn is_orth_proj(self) -> bool {
        self.idempotent && self.self_adjoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_sets_are_distinct() {
        for (i, a) in BASE_KINDS.into_iter().enumerate() {
            for b in BASE_KINDS.into_iter().skip(i + 1) {
                assert_ne!(a.caps(), b.caps(), "{a} and {b} share a canonical set");
            }
        }
    }

    #[test]
    fn test_resolve_roundtrip() {
        for kind in BASE_KINDS {
            assert_eq!(Kind::resolve(kind.caps()), Some(kind));
        }
    }

    #[test]
    fn test_resolve_rejects_non_canonical() {
        // {apply, prox} without single_valued is not a canonical set.
        let caps = CapSet::of(&[Capability::Apply, Capability::Prox]);
        assert_eq!(Kind::resolve(caps), None);
    }

    #[test]
    fn test_lipschitz_scalars_not_canonical() {
        for kind in BASE_KINDS {
            assert!(!kind.caps().contains(Capability::Lipschitz));
            assert!(!kind.caps().contains(Capability::DiffLipschitz));
        }
    }

    #[test]
    fn test_functional_kinds() {
        assert!(Kind::Func.is_functional());
        assert!(Kind::DiffFunc.is_functional());
        assert!(Kind::ProxFunc.is_functional());
        assert!(Kind::LinFunc.is_functional());
        assert!(!Kind::Map.is_functional());
        assert!(!Kind::DiffMap.is_functional());
        assert!(!Kind::LinOp.is_functional());
    }

    #[test]
    fn test_squeezed_is_idempotent() {
        for kind in BASE_KINDS {
            assert_eq!(kind.squeezed(), kind.squeezed().squeezed());
            assert!(kind.squeezed().is_functional());
        }
    }

    #[test]
    fn test_squeeze_targets_keep_capabilities() {
        // Squeezing must never lose a capability other than gaining
        // single-valued ones, otherwise `specialize` would reject it.
        for kind in [Kind::Map, Kind::DiffMap, Kind::LinOp] {
            assert!(kind.caps().is_subset(kind.squeezed().caps()));
        }
    }

    #[test]
    fn test_orth_proj_is_a_conjunction() {
        let mut s = Structure::PLAIN;
        assert!(!s.is_orth_proj());
        s.idempotent = true;
        assert!(!s.is_orth_proj());
        s.self_adjoint = true;
        assert!(s.is_orth_proj());
    }
}
