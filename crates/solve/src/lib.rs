//! # Solve - Numerical Services for the Operator Algebra
//!
//! Matrix-free numerics over `opalg-core` operators:
//!
//! - **Spectral**: Operator norms, top singular values and eigenvalues by
//!   (deflated) power iteration, with structure shortcuts and norm caching
//! - **Pinv**: Pseudo-inverse solves via conjugate gradients on the damped
//!   normal equations, and the dagger operator wrapping them
//!
//! ## Design Philosophy
//!
//! The algebra core stays symbolic and cheap; anything that iterates over
//! arrays lives here. Services touch operators only through their public
//! capability entry points, so they work identically on explicit matrices
//! and on deep lazy composites.

pub mod error;
pub mod pinv;
pub mod spectral;

// Re-export key types at crate root for convenience
pub use error::SolveError;
pub use pinv::{dagger, pinv, PinvConfig};
pub use spectral::{eigen_values, lipschitz, operator_norm, singular_values, SpectralConfig};
