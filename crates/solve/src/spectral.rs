//! # Spectral Estimation
//!
//! Power-iteration based estimates of operator norms, singular values and
//! eigenvalues. Everything here is matrix-free: the operator is only ever
//! touched through `apply` and `adjoint`, so arbitrarily deep composites
//! work without materialization.
//!
//! The spectral norm of a linear operator is its exact Lipschitz constant,
//! which is why [`lipschitz`] routes through [`operator_norm`] for linear
//! kinds. Computed norms are written into the operator's shared norm cache,
//! so repeated queries against clones of the same operator are free.

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use opalg_core::{OpError, Operator};

use crate::error::SolveError;

/// Tuning knobs for the power iterations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpectralConfig {
    /// Iteration cap per eigenpair.
    pub max_iter: usize,
    /// Relative tolerance on successive Rayleigh quotients.
    pub tol: f64,
    /// Seed for the random starting vectors; estimates are reproducible.
    pub seed: u64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        SpectralConfig {
            max_iter: 256,
            tol: 1e-6,
            seed: 0,
        }
    }
}

fn require_linear(op: &Operator) -> Result<(), SolveError> {
    if op.kind().is_linear() {
        Ok(())
    } else {
        Err(SolveError::NotLinear(op.kind()))
    }
}

fn concrete_dim(op: &Operator, operation: &'static str) -> Result<usize, SolveError> {
    op.dim()
        .ok_or(OpError::ConcreteDomainRequired { operation })
        .map_err(SolveError::from)
}

fn random_unit(rng: &mut StdRng, n: usize) -> DVector<f64> {
    let v = DVector::from_fn(n, |_, _| -> f64 { StandardNormal.sample(rng) });
    let norm = v.norm();
    if norm == 0.0 {
        DVector::from_element(n, 1.0 / (n as f64).sqrt())
    } else {
        v / norm
    }
}

/// Largest-magnitude eigenpair of a self-adjoint matvec by power iteration,
/// with the iterate kept orthogonal to previously found eigenvectors.
fn dominant_eigenpair<F>(
    matvec: &F,
    n: usize,
    deflate: &[DVector<f64>],
    rng: &mut StdRng,
    config: &SpectralConfig,
) -> Result<(f64, DVector<f64>), SolveError>
where
    F: Fn(&DVector<f64>) -> Result<DVector<f64>, SolveError>,
{
    let orthogonalize = |v: &mut DVector<f64>| {
        for u in deflate {
            let c = u.dot(v);
            *v -= u * c;
        }
    };

    let mut v = random_unit(rng, n);
    orthogonalize(&mut v);
    let mut lambda = 0.0;
    for _ in 0..config.max_iter {
        let mut w = matvec(&v)?;
        orthogonalize(&mut w);
        let estimate = v.dot(&w);
        let norm = w.norm();
        if norm == 0.0 {
            return Ok((0.0, v));
        }
        let next = w / norm;
        let converged = (estimate - lambda).abs() <= config.tol * estimate.abs().max(1.0);
        lambda = estimate;
        v = next;
        if converged {
            break;
        }
    }
    Ok((lambda, v))
}

/// Spectral norm (largest singular value) of a linear operator.
///
/// Structure shortcuts are exact: a homothety's norm is its factor's
/// magnitude, a unitary operator and a non-trivial orthogonal projection
/// have norm 1. Otherwise the norm is estimated as the square root of the
/// dominant eigenvalue of the Gram operator and cached on the instance.
pub fn operator_norm(op: &Operator, config: &SpectralConfig) -> Result<f64, SolveError> {
    require_linear(op)?;
    if let Some(c) = op.homothety_factor() {
        return Ok(c.abs());
    }
    if op.structure().unitary || op.structure().is_orth_proj() {
        return Ok(1.0);
    }
    if let Some(norm) = op.cached_norm() {
        return Ok(norm);
    }

    let n = concrete_dim(op, "operator norm")?;
    let gram = op.gram()?;
    let matvec = |x: &DVector<f64>| gram.apply(x).map_err(SolveError::from);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let (lambda, _) = dominant_eigenpair(&matvec, n, &[], &mut rng, config)?;
    let norm = lambda.max(0.0).sqrt();
    op.cache_norm(norm);
    Ok(norm)
}

/// Lipschitz constant estimate.
///
/// For a linear operator this is the spectral norm, which is exact and
/// usually far tighter than any bound attached at construction. Any other
/// kind keeps its declared bound.
pub fn lipschitz(op: &Operator, config: &SpectralConfig) -> Result<f64, SolveError> {
    if op.kind().is_linear() {
        operator_norm(op, config)
    } else {
        Ok(op.lipschitz())
    }
}

/// The `k` largest singular values, in descending order.
///
/// Estimated by deflated power iteration on the Gram operator; `k` is
/// clamped to the domain size.
pub fn singular_values(
    op: &Operator,
    k: usize,
    config: &SpectralConfig,
) -> Result<Vec<f64>, SolveError> {
    require_linear(op)?;
    let n = concrete_dim(op, "singular values")?;
    let k = k.min(n);
    let gram = op.gram()?;
    let matvec = |x: &DVector<f64>| gram.apply(x).map_err(SolveError::from);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut found = Vec::with_capacity(k);
    let mut basis: Vec<DVector<f64>> = Vec::with_capacity(k);
    for _ in 0..k {
        let (lambda, v) = dominant_eigenpair(&matvec, n, &basis, &mut rng, config)?;
        found.push(lambda.max(0.0).sqrt());
        basis.push(v);
    }
    Ok(found)
}

/// The `k` largest-magnitude eigenvalues of a self-adjoint operator, in
/// descending magnitude order, with their signs.
pub fn eigen_values(
    op: &Operator,
    k: usize,
    config: &SpectralConfig,
) -> Result<Vec<f64>, SolveError> {
    require_linear(op)?;
    if !op.structure().self_adjoint {
        return Err(SolveError::NotSelfAdjoint(op.kind()));
    }
    let n = concrete_dim(op, "eigenvalues")?;
    let k = k.min(n);
    let matvec = |x: &DVector<f64>| op.apply(x).map_err(SolveError::from);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut found = Vec::with_capacity(k);
    let mut basis: Vec<DVector<f64>> = Vec::with_capacity(k);
    for _ in 0..k {
        let (lambda, v) = dominant_eigenpair(&matvec, n, &basis, &mut rng, config)?;
        found.push(lambda);
        basis.push(v);
    }
    Ok(found)
}
