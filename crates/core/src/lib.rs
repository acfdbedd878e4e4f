//! # Core - Operator Algebra Foundations
//!
//! This crate provides the foundational abstractions for a capability-typed
//! operator algebra:
//!
//! - **Capabilities**: The behaviors an operator can carry (apply, gradient,
//!   adjoint, prox, ...)
//! - **Kinds**: The lattice of operator kinds, each a canonical capability set
//! - **Shapes**: Codomain/domain sizes with domain-agnostic operators
//! - **Operators**: Instances bundling a kind, a shape and deferred
//!   capability implementations
//! - **Algebra**: Closed combinators (sums, compositions, scaling, argument
//!   transforms) that re-resolve the result kind
//! - **Factory**: Stock instances (identity, homothety, explicit matrices)
//! - **Precision**: Process-wide floating-point width policy
//! - **Errors**: First-class algebra failures
//!
//! ## Design Philosophy
//!
//! "Capability-first" means an operator's kind is data, not a type
//! parameter: composites compute their kind at combination time from what
//! the operands can actually do, and every capability call is checked
//! against it. Evaluation is deferred throughout, so a deep composite is
//! a cheap tree of closures until an array is pushed through it.

pub mod algebra;
pub mod capability;
pub mod error;
pub mod factory;
pub mod kind;
pub mod operator;
pub mod precision;
pub mod shape;

// Re-export key types at crate root for convenience
pub use capability::{CapSet, Capability, ALL_CAPABILITIES};
pub use error::OpError;
pub use factory::{explicit_lin_func, explicit_lin_op, homothety, identity};
pub use kind::{Kind, Structure, BASE_KINDS};
pub use operator::{Builder, Operator};
pub use precision::{get_precision, set_precision, Precision, PrecisionGuard};
pub use shape::Shape;
