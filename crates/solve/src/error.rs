//! Failures of the numerical services.

use thiserror::Error;

use opalg_core::{Kind, OpError};

/// Errors raised while estimating spectra or solving linear systems.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolveError {
    /// The underlying operator rejected a capability call.
    #[error(transparent)]
    Operator(#[from] OpError),

    /// Spectral services only apply to linear operators.
    #[error("operator of kind {0} is not linear")]
    NotLinear(Kind),

    /// Eigenvalue estimation by power iteration needs a self-adjoint
    /// operator; general spectra are out of reach of this method.
    #[error("operator of kind {0} is not marked self-adjoint")]
    NotSelfAdjoint(Kind),
}
