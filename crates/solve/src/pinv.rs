//! # Pseudo-Inverse
//!
//! Moore-Penrose pseudo-inverse of a linear operator, evaluated matrix-free
//! as the conjugate-gradient solution of the (optionally damped) normal
//! equations `(AᵗA + λI)x = Aᵗb`. The [`dagger`] wrapper packages the
//! solve as an operator of the transposed shape, so `A⁺` participates in
//! the algebra like any other linear operator.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use opalg_core::{Builder, Kind, OpError, Operator};

use crate::error::SolveError;

/// Tuning knobs for the normal-equation solve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PinvConfig {
    /// Tikhonov damping `λ` added to the Gram diagonal; zero for the plain
    /// pseudo-inverse.
    pub damp: f64,
    /// Conjugate-gradient iteration cap.
    pub max_iter: usize,
    /// Residual-norm stopping tolerance.
    pub tol: f64,
}

impl Default for PinvConfig {
    fn default() -> Self {
        PinvConfig {
            damp: 0.0,
            max_iter: 256,
            tol: 1e-10,
        }
    }
}

/// Conjugate gradients on a symmetric positive semi-definite matvec.
/// Returns the final iterate when the cap is reached, the way a truncated
/// solve is expected to behave inside outer iterations.
fn conjugate_gradient<F>(
    matvec: F,
    b: &DVector<f64>,
    config: &PinvConfig,
) -> Result<DVector<f64>, SolveError>
where
    F: Fn(&DVector<f64>) -> Result<DVector<f64>, SolveError>,
{
    let mut x = DVector::zeros(b.len());
    let mut r = b.clone();
    let mut rs = r.dot(&r);
    if rs.sqrt() <= config.tol {
        return Ok(x);
    }
    let mut p = r.clone();
    for _ in 0..config.max_iter {
        let ap = matvec(&p)?;
        let denom = p.dot(&ap);
        if denom.abs() <= f64::EPSILON * rs {
            break;
        }
        let alpha = rs / denom;
        x += &p * alpha;
        r -= &ap * alpha;
        let rs_next = r.dot(&r);
        if rs_next.sqrt() <= config.tol {
            break;
        }
        p = &r + &p * (rs_next / rs);
        rs = rs_next;
    }
    Ok(x)
}

/// `A⁺b`: the least-squares, least-norm solution of `Ax = b`.
///
/// A unitary operator inverts exactly through its adjoint, and an
/// orthogonal projection is its own pseudo-inverse; everything else goes
/// through the damped normal equations.
pub fn pinv(op: &Operator, b: &DVector<f64>, config: &PinvConfig) -> Result<DVector<f64>, SolveError> {
    if !op.kind().is_linear() {
        return Err(SolveError::NotLinear(op.kind()));
    }
    if op.structure().unitary {
        return Ok(op.adjoint(b)?);
    }
    if op.structure().is_orth_proj() {
        return Ok(op.apply(b)?);
    }
    let gram = op.gram()?;
    let damp = config.damp;
    let matvec = |x: &DVector<f64>| -> Result<DVector<f64>, SolveError> {
        let mut gx = gram.apply(x)?;
        if damp != 0.0 {
            gx += x * damp;
        }
        Ok(gx)
    };
    let rhs = op.adjoint(b)?;
    conjugate_gradient(matvec, &rhs, config)
}

/// The pseudo-inverse as an operator of the transposed shape.
///
/// Its apply is a deferred [`pinv`] solve against the source, its adjoint
/// the same solve against the transpose (`(A⁺)ᵗ = (Aᵗ)⁺`). Solver
/// failures inside the closures surface as numerical-service errors.
pub fn dagger(op: &Operator, config: PinvConfig) -> Result<Operator, SolveError> {
    if !op.kind().is_linear() {
        return Err(SolveError::NotLinear(op.kind()));
    }
    let shape = op
        .shape()
        .transposed()
        .ok_or(OpError::ConcreteDomainRequired {
            operation: "dagger",
        })?;
    let transposed = op.transpose()?;
    let fwd = op.clone();
    let out = Builder::new(Kind::LinOp, shape)
        .apply(move |b| {
            pinv(&fwd, b, &config).map_err(|e| OpError::Numerical(e.to_string()))
        })
        .adjoint(move |b| {
            pinv(&transposed, b, &config).map_err(|e| OpError::Numerical(e.to_string()))
        })
        .build()?;
    Ok(out.squeeze())
}
