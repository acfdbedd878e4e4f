//! # Error Types
//!
//! Errors in the operator algebra are precondition violations: an attempt
//! to combine operators whose shapes do not line up, to invoke a capability
//! a kind does not carry, or to specialize an operator into a kind more
//! capable than what it implements. The engine is deterministic and
//! side-effect free, so every failure is reproducible at the call site;
//! there is nothing to retry.
//!
//! Capability checks are intentionally deferred to call time: capability
//! sets are structural (derived from the kind), so construction cannot tell
//! a missing implementation apart from one that is derived lazily.

use thiserror::Error;

use crate::capability::{CapSet, Capability};
use crate::kind::Kind;
use crate::shape::Shape;

/// Errors raised by the operator-algebra engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OpError {
    /// Addends are not range-broadcastable / domain-compatible.
    #[error("cannot sum operators with inconsistent shapes {lhs} and {rhs}")]
    SumShape { lhs: Shape, rhs: Shape },

    /// Left domain does not meet right codomain.
    #[error("cannot compose operators with inconsistent shapes {lhs} and {rhs}")]
    ComposeShape { lhs: Shape, rhs: Shape },

    /// Shift vector size does not match the operator domain.
    #[error("invalid shift size {got} for operator of shape {shape}")]
    ShiftSize { got: usize, shape: Shape },

    /// A capability was invoked on an operator whose kind does not carry it.
    #[error("operator of kind {kind} does not implement {capability}")]
    Unsupported { kind: Kind, capability: Capability },

    /// `specialize` target is not a capability superset of the source.
    #[error("cannot specialize an operator of kind {from} to kind {to}")]
    Specialize { from: Kind, to: Kind },

    /// A combinator produced a capability set outside the kind lattice.
    /// The combination rules guarantee this cannot happen for canonical
    /// inputs, so seeing it means an operator was built with a corrupted
    /// capability set.
    #[error("capability set {caps} does not resolve to a canonical kind")]
    UnresolvedKind { caps: CapSet },

    /// Shape rejected at construction (zero codomain, non-functional shape
    /// for a functional kind, non-square shape for square structure).
    #[error("invalid shape {shape} for operator of kind {kind}: {reason}")]
    InvalidShape {
        kind: Kind,
        shape: Shape,
        reason: &'static str,
    },

    /// An input vector has the wrong length for the operator.
    #[error("dimension mismatch: expected a vector of length {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The operation needs a concrete domain size but the operator is
    /// domain-agnostic.
    #[error("{operation} requires an operator with a concrete domain size")]
    ConcreteDomainRequired { operation: &'static str },

    /// Scalar operand rejected (division by zero, non-finite factor).
    #[error("invalid scalar operand {value}")]
    InvalidScalar { value: f64 },

    /// A deferred numerical service (e.g. a pseudo-inverse closure) failed.
    #[error("numerical service failed: {0}")]
    Numerical(String),
}
