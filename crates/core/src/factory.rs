//! # Stock Operators
//!
//! Ready-made instances: the identity, homotheties (scalar multiples of
//! the identity) and dense matrix-backed linear operators. Homotheties
//! carry their factor on the instance, which is what lets the composition
//! combinator apply the exact proximal rescaling rule.
//!
//! All factories go through [`Builder::build`], so degenerate shapes
//! (zero-sized domains or codomains) are rejected the same way they are
//! everywhere else.

use nalgebra::{DMatrix, DVector};

use crate::error::OpError;
use crate::kind::{Kind, Structure};
use crate::operator::{Builder, Operator};
use crate::shape::Shape;

pub(crate) fn homothety_structure(c: f64) -> Structure {
    Structure {
        square: true,
        normal: true,
        self_adjoint: true,
        pos_def: c > 0.0,
        unitary: c.abs() == 1.0,
        idempotent: c == 1.0,
    }
}

/// The identity on `ℝⁿ`.
pub fn identity(n: usize) -> Result<Operator, OpError> {
    homothety(1.0, n)
}

/// The homothety `x ↦ c·x` on `ℝⁿ`.
pub fn homothety(c: f64, n: usize) -> Result<Operator, OpError> {
    let op = Builder::new(Kind::LinOp, Shape::square(n))
        .apply(move |x: &DVector<f64>| Ok(x * c))
        .adjoint(move |y: &DVector<f64>| Ok(y * c))
        .lipschitz(c.abs())
        .structure(homothety_structure(c))
        .scale_factor(c)
        .build()?;
    Ok(op.squeeze())
}

/// A dense matrix as a linear operator. The Frobenius norm of the matrix
/// serves as the initial Lipschitz bound; the numerical services tighten
/// it to the spectral norm on demand.
pub fn explicit_lin_op(matrix: DMatrix<f64>) -> Result<Operator, OpError> {
    let shape = Shape::new(matrix.nrows(), matrix.ncols());
    let lip = matrix.norm();
    let mt = matrix.transpose();
    let op = Builder::new(Kind::LinOp, shape)
        .apply(move |x: &DVector<f64>| Ok(&matrix * x))
        .adjoint(move |y: &DVector<f64>| Ok(&mt * y))
        .lipschitz(lip)
        .build()?;
    Ok(op.squeeze())
}

/// A weight vector as the linear functional `x ↦ ⟨w, x⟩`.
pub fn explicit_lin_func(weights: DVector<f64>) -> Result<Operator, OpError> {
    let shape = Shape::functional(weights.len());
    let lip = weights.norm();
    let wt = weights.clone();
    Builder::new(Kind::LinFunc, shape)
        .apply(move |x: &DVector<f64>| Ok(DVector::from_element(1, weights.dot(x))))
        .adjoint(move |y: &DVector<f64>| Ok(&wt * y[0]))
        .lipschitz(lip)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_structure() {
        let id = identity(4).unwrap();
        assert_eq!(id.kind(), Kind::LinOp);
        assert!(id.structure().unitary);
        assert!(id.structure().idempotent);
        assert!(id.structure().pos_def);
        assert_eq!(id.homothety_factor(), Some(1.0));
        let x = DVector::from_vec(vec![1.0, -2.0, 3.0, -4.0]);
        assert_eq!(id.apply(&x).unwrap(), x);
    }

    #[test]
    fn test_homothety_squeezes_to_lin_func() {
        let h = homothety(-2.0, 1).unwrap();
        assert_eq!(h.kind(), Kind::LinFunc);
        assert_eq!(h.lipschitz(), 2.0);
        assert!(!h.structure().pos_def);
        assert!(!h.structure().unitary);
    }

    #[test]
    fn test_factories_reject_zero_sized_domains() {
        assert!(matches!(identity(0), Err(OpError::InvalidShape { .. })));
        assert!(matches!(
            explicit_lin_op(DMatrix::zeros(0, 3)),
            Err(OpError::InvalidShape { .. })
        ));
        assert!(matches!(
            explicit_lin_func(DVector::zeros(0)),
            Err(OpError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_explicit_lin_op_round_trip() {
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let a = explicit_lin_op(m.clone()).unwrap();
        assert_eq!(a.shape(), Shape::new(2, 3));
        assert_relative_eq!(a.to_matrix().unwrap(), m);
        let y = DVector::from_vec(vec![1.0, -1.0]);
        assert_relative_eq!(a.adjoint(&y).unwrap(), m.transpose() * y);
        // Frobenius bound dominates the spectral norm.
        assert!(a.lipschitz() >= 6.0);
    }

    #[test]
    fn test_explicit_lin_func_gradient_is_the_weights() {
        let w = DVector::from_vec(vec![3.0, -1.0, 2.0]);
        let f = explicit_lin_func(w.clone()).unwrap();
        assert_eq!(f.kind(), Kind::LinFunc);
        assert_eq!(f.gradient(&DVector::zeros(3)).unwrap(), w);
        assert_relative_eq!(f.lipschitz(), w.norm());
    }
}
