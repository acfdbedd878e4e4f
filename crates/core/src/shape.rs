//! # Shapes - Codomain/Domain Sizes
//!
//! An operator maps vectors of one size to vectors of another, so its shape
//! is the pair `(codomain size, domain size)`. The domain side may be
//! *agnostic*: a pure scalar map such as a homothety accepts input of any
//! dimension. The codomain side never is — an operator must commit to the
//! size of what it produces.
//!
//! Shape inference is where composition legality is decided:
//! summing requires range-broadcastable codomains and matching (or
//! agnostic) domains, composing requires the left domain to meet the right
//! codomain. A mismatch is not a bug in the caller's data — it is a
//! mathematically undefined operation, reported as a value error carrying
//! both shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::OpError;

/// Codomain/domain size pair. `dim == None` means domain-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    /// Codomain size (never agnostic).
    pub codim: usize,
    /// Domain size, or `None` for a domain-agnostic operator.
    pub dim: Option<usize>,
}

impl Shape {
    /// Shape with concrete codomain and domain sizes.
    pub const fn new(codim: usize, dim: usize) -> Shape {
        Shape {
            codim,
            dim: Some(dim),
        }
    }

    /// Domain-agnostic shape.
    pub const fn agnostic(codim: usize) -> Shape {
        Shape { codim, dim: None }
    }

    /// Square shape `(n, n)`.
    pub const fn square(n: usize) -> Shape {
        Shape::new(n, n)
    }

    /// Functional shape `(1, n)`.
    pub const fn functional(dim: usize) -> Shape {
        Shape::new(1, dim)
    }

    /// True when codomain and domain sizes coincide.
    pub fn is_square(&self) -> bool {
        self.dim == Some(self.codim)
    }

    /// True when the domain size is unconstrained.
    pub const fn is_agnostic(&self) -> bool {
        self.dim.is_none()
    }

    /// The transposed shape, when the domain is concrete.
    pub fn transposed(&self) -> Option<Shape> {
        self.dim.map(|d| Shape::new(d, self.codim))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dim {
            Some(d) => write!(f, "({}, {})", self.codim, d),
            None => write!(f, "({}, *)", self.codim),
        }
    }
}

/// Shape of `lhs + rhs`.
///
/// Codomains must be range-broadcastable (`N == M` or either is 1), domains
/// must be identical unless at least one side is agnostic. The result takes
/// the broadcast codomain and the concrete domain if any.
pub fn infer_sum_shape(lhs: &Shape, rhs: &Shape) -> Result<Shape, OpError> {
    let mismatch = || OpError::SumShape {
        lhs: *lhs,
        rhs: *rhs,
    };

    let codim = if lhs.codim == rhs.codim || lhs.codim == 1 || rhs.codim == 1 {
        lhs.codim.max(rhs.codim)
    } else {
        return Err(mismatch());
    };

    let dim = match (lhs.dim, rhs.dim) {
        (Some(a), Some(b)) if a == b => Some(a),
        (Some(_), Some(_)) => return Err(mismatch()),
        (Some(a), None) | (None, Some(a)) => Some(a),
        (None, None) => None,
    };

    Ok(Shape { codim, dim })
}

/// Shape of `lhs ∘ rhs`.
///
/// The left domain must equal the right codomain, unless the left operand
/// is domain-agnostic. The result inherits the left codomain and the right
/// domain (agnosticism included).
pub fn infer_composition_shape(lhs: &Shape, rhs: &Shape) -> Result<Shape, OpError> {
    match lhs.dim {
        Some(d) if d != rhs.codim => Err(OpError::ComposeShape {
            lhs: *lhs,
            rhs: *rhs,
        }),
        _ => Ok(Shape {
            codim: lhs.codim,
            dim: rhs.dim,
        }),
    }
}
