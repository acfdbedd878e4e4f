//! # Algebraic Combinators
//!
//! Closed arithmetic over operators: sums, compositions, scalar scaling,
//! integer powers and argument transforms. Each combinator resolves the
//! result kind from the operands' capability sets, synthesizes the result's
//! capability closures over cheap clones of the operands, and propagates
//! the Lipschitz estimates.
//!
//! ## Kind resolution
//!
//! A sum keeps exactly the capabilities both operands share, minus the
//! proximal one (a sum of proximable functionals has no closed-form prox
//! in general). The one exception is a proximable functional plus a linear
//! functional, which stays proximable through the shift rule
//! `prox_{f+l}(x, τ) = prox_f(x − τ∇l, τ)`.
//!
//! A composition also intersects, then re-grants what the chain rule
//! recovers: a 1-output left operand makes the composite single-valued,
//! and a shared Jacobian makes it differentiable with
//! `∇(A∘B)(x) = J_B(x)ᵗ ∇A(Bx)`. The proximal capability survives a
//! composition only against a unitary operator
//! (`prox_{f∘U} = Uᵗ ∘ prox_f ∘ U`) or a homothety
//! (`prox_{f(c·)}(x, τ) = c⁻¹ prox_f(cx, c²τ)`).
//!
//! Every combinator finishes with a squeeze, so a 1-output composite
//! always lands in its single-valued kind.

use nalgebra::DVector;

use crate::capability::{CapSet, Capability};
use crate::error::OpError;
use crate::factory;
use crate::kind::{Kind, Structure};
use crate::operator::{Builder, Operator};
use crate::precision;
use crate::shape::{infer_composition_shape, infer_sum_shape, Shape};

/// Product of two non-negative bounds where an unknown (+∞) factor is
/// annihilated by a zero one: a constant map composed with anything is
/// still constant.
fn bound_mul(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 {
        0.0
    } else {
        a * b
    }
}

/// Entrywise sum with scalar broadcasting on either side.
fn broadcast_add(u: &DVector<f64>, v: &DVector<f64>) -> Result<DVector<f64>, OpError> {
    if u.len() == v.len() {
        Ok(u + v)
    } else if u.len() == 1 {
        Ok(v.add_scalar(u[0]))
    } else if v.len() == 1 {
        Ok(u.add_scalar(v[0]))
    } else {
        Err(OpError::DimensionMismatch {
            expected: u.len(),
            got: v.len(),
        })
    }
}

fn unresolved(caps: CapSet) -> OpError {
    OpError::UnresolvedKind { caps }
}

impl Operator {
    /// Pointwise sum `self + other`, with range broadcasting: a 1-output
    /// operand is added to every output of the other.
    pub fn add(&self, other: &Operator) -> Result<Operator, OpError> {
        let shape = infer_sum_shape(&self.shape, &other.shape)?;
        let prox_pair = matches!(
            (self.kind, other.kind),
            (Kind::ProxFunc, Kind::LinFunc) | (Kind::LinFunc, Kind::ProxFunc)
        );
        let mut caps = self
            .properties()
            .intersect(other.properties())
            .without(Capability::Prox);
        if prox_pair {
            caps = caps.with(Capability::Prox);
        }
        let kind = Kind::resolve(caps).ok_or(unresolved(caps))?;

        let mut b = Builder::new(kind, shape)
            .lipschitz(self.lipschitz() + other.lipschitz())
            .diff_lipschitz(self.dlip + other.dlip);

        let (la, ra) = (self.clone(), other.clone());
        b = b.apply(move |x| broadcast_add(&la.apply(x)?, &ra.apply(x)?));

        if caps.contains(Capability::Gradient) {
            let (lg, rg) = (self.clone(), other.clone());
            b = b.gradient(move |x| Ok(lg.gradient(x)? + rg.gradient(x)?));
        }
        if caps.contains(Capability::Adjoint) {
            let (lt, rt) = (self.clone(), other.clone());
            let m = shape.codim;
            // A broadcast 1-output term contributes through the sum of the
            // cotangent entries: (A + 1wᵗ)ᵗy = Aᵗy + w·Σy.
            let part = move |op: &Operator, y: &DVector<f64>| {
                if op.codim() == m {
                    op.adjoint(y)
                } else {
                    op.adjoint(&DVector::from_element(1, y.sum()))
                }
            };
            b = b.adjoint(move |y| Ok(part(&lt, y)? + part(&rt, y)?));
        }
        if caps.contains(Capability::Jacobian) && !kind.derives_jacobian() {
            let (lj, rj) = (self.clone(), other.clone());
            b = b.jacobian(move |x| lj.jacobian(x)?.add(&rj.jacobian(x)?));
        }
        if prox_pair {
            let (p, l) = if self.kind == Kind::ProxFunc {
                (self.clone(), other.clone())
            } else {
                (other.clone(), self.clone())
            };
            b = b.prox(move |x, tau| p.prox(&(x - l.gradient(x)? * tau), tau));
        }
        Ok(b.build()?.squeeze())
    }

    /// Pointwise difference `self - other`.
    pub fn sub(&self, other: &Operator) -> Result<Operator, OpError> {
        self.add(&other.scale(-1.0)?)
    }

    /// Composition `self ∘ other`: first `other`, then `self`.
    pub fn compose(&self, other: &Operator) -> Result<Operator, OpError> {
        let shape = infer_composition_shape(&self.shape, &other.shape)?;
        let mut caps = self
            .properties()
            .intersect(other.properties())
            .without(Capability::Prox)
            .without(Capability::SingleValued)
            .without(Capability::Gradient);
        if self.shape.codim == 1 {
            caps = caps.with(Capability::SingleValued);
            if caps.contains(Capability::Jacobian) {
                caps = caps.with(Capability::Gradient);
            }
        }

        #[derive(Clone, Copy)]
        enum ProxRule {
            Plain,
            Unitary,
            Homothety(f64),
        }
        let rule = if self.kind == Kind::ProxFunc {
            if other.structure().unitary {
                ProxRule::Unitary
            } else {
                match other.scale {
                    Some(c) if c != 0.0 => ProxRule::Homothety(c),
                    _ => ProxRule::Plain,
                }
            }
        } else {
            ProxRule::Plain
        };
        if !matches!(rule, ProxRule::Plain) {
            caps = caps.with(Capability::Prox);
        }
        let kind = Kind::resolve(caps).ok_or(unresolved(caps))?;

        let scale = match (self.scale, other.scale) {
            (Some(a), Some(b)) => Some(a * b),
            _ => None,
        };
        let structure = if let Some(c) = scale {
            factory::homothety_structure(c)
        } else if self.structure.unitary && other.structure.unitary {
            Structure {
                square: true,
                normal: true,
                unitary: true,
                ..Structure::PLAIN
            }
        } else {
            Structure::PLAIN
        };
        let dlip = if self.kind.is_linear() {
            bound_mul(self.lipschitz(), other.dlip)
        } else if other.kind.is_linear() {
            bound_mul(self.dlip, bound_mul(other.lipschitz(), other.lipschitz()))
        } else {
            f64::INFINITY
        };

        let mut b = Builder::new(kind, shape)
            .lipschitz(bound_mul(self.lipschitz(), other.lipschitz()))
            .diff_lipschitz(dlip)
            .structure(structure);
        if let Some(c) = scale {
            b = b.scale_factor(c);
        }

        let (la, ra) = (self.clone(), other.clone());
        b = b.apply(move |x| la.apply(&ra.apply(x)?));

        if caps.contains(Capability::Adjoint) {
            let (lt, rt) = (self.clone(), other.clone());
            b = b.adjoint(move |y| rt.adjoint(&lt.adjoint(y)?));
        }
        if caps.contains(Capability::Jacobian) && !kind.derives_jacobian() {
            let (lj, rj) = (self.clone(), other.clone());
            b = b.jacobian(move |x| {
                let inner = rj.apply(x)?;
                lj.jacobian(&inner)?.compose(&rj.jacobian(x)?)
            });
        }
        if caps.contains(Capability::Gradient) && !kind.is_linear() {
            let (lg, rg) = (self.clone(), other.clone());
            b = b.gradient(move |x| {
                let inner = rg.apply(x)?;
                let outer = lg.jacobian(&inner)?.adjoint(&DVector::from_element(1, 1.0))?;
                rg.jacobian(x)?.adjoint(&outer)
            });
        }
        match rule {
            ProxRule::Plain => {}
            ProxRule::Unitary => {
                let (p, u) = (self.clone(), other.clone());
                b = b.prox(move |x, tau| u.adjoint(&p.prox(&u.apply(x)?, tau)?));
            }
            ProxRule::Homothety(c) => {
                let p = self.clone();
                b = b.prox(move |x, tau| Ok(p.prox(&(x * c), tau * c * c)? / c));
            }
        }
        Ok(b.build()?.squeeze())
    }

    /// Scalar scaling `c · self`.
    ///
    /// A proximable functional stays proximable only for `c > 0`
    /// (`prox_{cf}(x, τ) = prox_f(x, cτ)`); a non-positive factor breaks
    /// convexity and the result demotes to a plain functional.
    pub fn scale(&self, c: f64) -> Result<Operator, OpError> {
        if !c.is_finite() {
            return Err(OpError::InvalidScalar { value: c });
        }
        if c == 1.0 {
            return Ok(self.clone());
        }
        let keeps_prox = self.kind == Kind::ProxFunc && c > 0.0;
        let kind = if self.kind == Kind::ProxFunc && !keeps_prox {
            Kind::Func
        } else {
            self.kind
        };
        let structure = Structure {
            square: self.structure.square,
            normal: self.structure.normal,
            self_adjoint: self.structure.self_adjoint,
            pos_def: self.structure.pos_def && c > 0.0,
            unitary: self.structure.unitary && c.abs() == 1.0,
            idempotent: false,
        };

        let mut b = Builder::new(kind, self.shape)
            .lipschitz(bound_mul(self.lipschitz(), c.abs()))
            .diff_lipschitz(bound_mul(self.dlip, c.abs()))
            .structure(structure);
        if let Some(s) = self.scale {
            b = b.scale_factor(s * c);
        }

        let a = self.clone();
        b = b.apply(move |x| Ok(a.apply(x)? * c));
        if kind.is_linear() {
            let a = self.clone();
            b = b.adjoint(move |y| Ok(a.adjoint(y)? * c));
        }
        if kind.caps().contains(Capability::Gradient) && !kind.is_linear() {
            let a = self.clone();
            b = b.gradient(move |x| Ok(a.gradient(x)? * c));
        }
        if kind.caps().contains(Capability::Jacobian) && !kind.derives_jacobian() {
            let a = self.clone();
            b = b.jacobian(move |x| a.jacobian(x)?.scale(c));
        }
        if keeps_prox {
            let a = self.clone();
            b = b.prox(move |x, tau| a.prox(x, tau * c));
        }
        Ok(b.build()?.squeeze())
    }

    /// Pointwise negation `-self`.
    pub fn neg(&self) -> Result<Operator, OpError> {
        self.scale(-1.0)
    }

    /// Scalar division `self / c`.
    pub fn div(&self, c: f64) -> Result<Operator, OpError> {
        if c == 0.0 || !c.is_finite() {
            return Err(OpError::InvalidScalar { value: c });
        }
        self.scale(1.0 / c)
    }

    /// Integer power `self ∘ self ∘ … ∘ self` (`k` factors). The first
    /// power is the operator itself whatever its shape; any other power
    /// requires a square or domain-agnostic operator. The zeroth power is
    /// the identity on the codomain; an idempotent operator is its own
    /// positive power.
    pub fn powi(&self, k: u32) -> Result<Operator, OpError> {
        if k == 1 {
            return Ok(self.clone());
        }
        if !self.shape.is_agnostic() && !self.shape.is_square() {
            return Err(OpError::InvalidShape {
                kind: self.kind,
                shape: self.shape,
                reason: "powers require a square or domain-agnostic operator",
            });
        }
        if k == 0 {
            return factory::identity(self.shape.codim);
        }
        if self.structure.idempotent {
            return Ok(self.clone());
        }
        let mut acc = self.clone();
        for _ in 1..k {
            acc = acc.compose(self)?;
        }
        Ok(acc)
    }

    /// Argument shift: `x ↦ self(x + shift)`.
    ///
    /// A shifted linear operator is affine, so linear kinds land in their
    /// differentiable counterparts; everything else keeps its kind, with
    /// the prox following `prox_{f(·+s)}(x, τ) = prox_f(x + s, τ) − s`.
    /// A domain-agnostic operator picks up the shift's size as its domain.
    pub fn argshift(&self, shift: &DVector<f64>) -> Result<Operator, OpError> {
        if let Some(d) = self.shape.dim {
            if shift.len() != d {
                return Err(OpError::ShiftSize {
                    got: shift.len(),
                    shape: self.shape,
                });
            }
        }
        let shift = precision::coerce(shift);
        let shape = Shape::new(self.shape.codim, shift.len());
        let caps = self.properties().without(Capability::Adjoint);
        let kind = Kind::resolve(caps).ok_or(unresolved(caps))?;

        let mut b = Builder::new(kind, shape)
            .lipschitz(self.lipschitz())
            .diff_lipschitz(self.dlip);

        let (a, s) = (self.clone(), shift.clone());
        b = b.apply(move |x| a.apply(&(x + &s)));
        if caps.contains(Capability::Gradient) {
            let (a, s) = (self.clone(), shift.clone());
            b = b.gradient(move |x| a.gradient(&(x + &s)));
        }
        if caps.contains(Capability::Jacobian) && !kind.derives_jacobian() {
            let (a, s) = (self.clone(), shift.clone());
            b = b.jacobian(move |x| a.jacobian(&(x + &s)));
        }
        if caps.contains(Capability::Prox) {
            let (a, s) = (self.clone(), shift);
            b = b.prox(move |x, tau| Ok(a.prox(&(x + &s), tau)? - &s));
        }
        Ok(b.build()?.squeeze())
    }

    /// Argument scaling: `x ↦ self(c · x)`, i.e. composition with the
    /// homothety of factor `c`. Requires a concrete domain.
    pub fn argscale(&self, c: f64) -> Result<Operator, OpError> {
        if c == 0.0 || !c.is_finite() {
            return Err(OpError::InvalidScalar { value: c });
        }
        let d = self.shape.dim.ok_or(OpError::ConcreteDomainRequired {
            operation: "argscale",
        })?;
        self.compose(&factory::homothety(c, d)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{explicit_lin_func, homothety, identity};
    use approx::assert_relative_eq;

    fn half_sq_norm(n: usize) -> Operator {
        Builder::new(Kind::ProxFunc, Shape::functional(n))
            .apply(|x| Ok(DVector::from_element(1, 0.5 * x.dot(x))))
            .prox(|x, tau| Ok(x / (1.0 + tau)))
            .lipschitz(f64::INFINITY)
            .build()
            .unwrap()
    }

    fn sin_map(n: usize) -> Operator {
        Builder::new(Kind::DiffMap, Shape::new(n, n))
            .apply(|x| Ok(x.map(f64::sin)))
            .jacobian(|x| {
                crate::factory::explicit_lin_op(nalgebra::DMatrix::from_diagonal(&x.map(f64::cos)))
            })
            .lipschitz(1.0)
            .diff_lipschitz(1.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_bound_mul_annihilates_unknowns() {
        assert_eq!(bound_mul(0.0, f64::INFINITY), 0.0);
        assert_eq!(bound_mul(f64::INFINITY, 0.0), 0.0);
        assert_eq!(bound_mul(2.0, 3.0), 6.0);
        assert!(bound_mul(f64::INFINITY, 2.0).is_infinite());
    }

    #[test]
    fn test_sum_intersects_and_drops_prox() {
        let f = half_sq_norm(3);
        let g = half_sq_norm(3);
        let s = f.add(&g).unwrap();
        assert_eq!(s.kind(), Kind::Func);
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(s.apply(&x).unwrap()[0], x.dot(&x));
    }

    #[test]
    fn test_prox_func_plus_lin_func_stays_proximable() {
        let f = half_sq_norm(2);
        let w = DVector::from_vec(vec![1.0, -1.0]);
        let l = explicit_lin_func(w.clone()).unwrap();
        let s = f.add(&l).unwrap();
        assert_eq!(s.kind(), Kind::ProxFunc);
        // prox_{f+l}(x, τ) = (x − τw)/(1 + τ) for f = ½‖·‖².
        let x = DVector::from_vec(vec![3.0, 5.0]);
        let tau = 0.5;
        let got = s.prox(&x, tau).unwrap();
        let want = (&x - &w * tau) / (1.0 + tau);
        assert_relative_eq!(got, want);
    }

    #[test]
    fn test_broadcast_sum_and_adjoint() {
        let l = explicit_lin_func(DVector::from_vec(vec![1.0, 1.0])).unwrap();
        let a = crate::factory::explicit_lin_op(nalgebra::DMatrix::identity(2, 2)).unwrap();
        let s = a.add(&l).unwrap();
        assert_eq!(s.shape(), Shape::new(2, 2));
        assert_eq!(s.kind(), Kind::LinOp);
        let x = DVector::from_vec(vec![1.0, 2.0]);
        // (I + 1wᵗ)x = x + ⟨w,x⟩·1
        assert_eq!(s.apply(&x).unwrap(), DVector::from_vec(vec![4.0, 5.0]));
        // Adjoint agrees with the materialized matrix.
        let y = DVector::from_vec(vec![1.0, -2.0]);
        let m = s.to_matrix().unwrap();
        assert_relative_eq!(s.adjoint(&y).unwrap(), m.transpose() * &y);
    }

    #[test]
    fn test_composition_kind_and_chain_rule() {
        let f = Builder::new(Kind::DiffFunc, Shape::functional(2))
            .apply(|x| Ok(DVector::from_element(1, 0.5 * x.dot(x))))
            .gradient(|x| Ok(x.clone()))
            .diff_lipschitz(1.0)
            .build()
            .unwrap();
        let a = crate::factory::explicit_lin_op(nalgebra::DMatrix::from_row_slice(
            2,
            3,
            &[1.0, 0.0, 2.0, 0.0, 1.0, 0.0],
        ))
        .unwrap();
        let c = f.compose(&a).unwrap();
        assert_eq!(c.kind(), Kind::DiffFunc);
        assert_eq!(c.shape(), Shape::functional(3));
        // ∇(f∘A)(x) = Aᵗ A x
        let x = DVector::from_vec(vec![1.0, 1.0, 1.0]);
        let want = a.adjoint(&a.apply(&x).unwrap()).unwrap();
        assert_relative_eq!(c.gradient(&x).unwrap(), want);
    }

    #[test]
    fn test_composition_lipschitz_products() {
        let s = sin_map(2);
        let h = homothety(3.0, 2).unwrap();
        let c = s.compose(&h).unwrap();
        assert_relative_eq!(c.lipschitz(), 3.0);
        // Linear-right rule: dlip·lip².
        assert_relative_eq!(c.diff_lipschitz(), 9.0);
        let c2 = h.compose(&s).unwrap();
        // Linear-left rule: lip·dlip.
        assert_relative_eq!(c2.diff_lipschitz(), 3.0);
    }

    #[test]
    fn test_prox_composed_with_unitary() {
        // Signed permutation, a unitary operator.
        let u = Builder::new(Kind::LinOp, Shape::square(2))
            .apply(|x| Ok(DVector::from_vec(vec![x[1], -x[0]])))
            .adjoint(|y| Ok(DVector::from_vec(vec![-y[1], y[0]])))
            .lipschitz(1.0)
            .structure(Structure {
                square: true,
                normal: true,
                unitary: true,
                ..Structure::PLAIN
            })
            .build()
            .unwrap();
        let f = half_sq_norm(2);
        let c = f.compose(&u).unwrap();
        assert_eq!(c.kind(), Kind::ProxFunc);
        // For f = ½‖·‖², f∘U = f, so the prox must match f's.
        let x = DVector::from_vec(vec![2.0, -6.0]);
        assert_relative_eq!(c.prox(&x, 0.7).unwrap(), f.prox(&x, 0.7).unwrap());
    }

    #[test]
    fn test_prox_composed_with_homothety() {
        let f = half_sq_norm(2);
        let c = f.argscale(2.0).unwrap();
        assert_eq!(c.kind(), Kind::ProxFunc);
        // g(x) = f(2x) = 2‖x‖², prox_g(x, τ) = x/(1 + 4τ).
        let x = DVector::from_vec(vec![1.0, -1.0]);
        let tau = 0.25;
        assert_relative_eq!(c.prox(&x, tau).unwrap(), &x / (1.0 + 4.0 * tau));
    }

    #[test]
    fn test_prox_lost_against_general_lin_op() {
        let f = half_sq_norm(2);
        let a = crate::factory::explicit_lin_op(nalgebra::DMatrix::from_row_slice(
            2,
            2,
            &[2.0, 1.0, 0.0, 1.0],
        ))
        .unwrap();
        let c = f.compose(&a).unwrap();
        assert_eq!(c.kind(), Kind::Func);
        assert!(c.prox(&DVector::zeros(2), 1.0).is_err());
    }

    #[test]
    fn test_scale_demotes_non_positive_prox() {
        let f = half_sq_norm(2);
        assert_eq!(f.scale(2.0).unwrap().kind(), Kind::ProxFunc);
        assert_eq!(f.scale(-2.0).unwrap().kind(), Kind::Func);
        // prox_{2f}(x, τ) = prox_f(x, 2τ).
        let x = DVector::from_vec(vec![3.0, 1.0]);
        let got = f.scale(2.0).unwrap().prox(&x, 0.5).unwrap();
        assert_relative_eq!(got, f.prox(&x, 1.0).unwrap());
    }

    #[test]
    fn test_scale_rejects_non_finite() {
        let f = half_sq_norm(2);
        assert!(matches!(
            f.scale(f64::NAN),
            Err(OpError::InvalidScalar { .. })
        ));
    }

    #[test]
    fn test_sub_keeps_prox_against_lin_func() {
        let f = half_sq_norm(2);
        let w = DVector::from_vec(vec![1.0, 2.0]);
        let d = f.sub(&explicit_lin_func(w.clone()).unwrap()).unwrap();
        assert_eq!(d.kind(), Kind::ProxFunc);
        // prox_{f−l}(x, τ) = prox_f(x + τw, τ).
        let x = DVector::from_vec(vec![1.0, 1.0]);
        let tau = 0.5;
        assert_relative_eq!(
            d.prox(&x, tau).unwrap(),
            f.prox(&(&x + &w * tau), tau).unwrap()
        );
    }

    #[test]
    fn test_neg_flips_outputs() {
        let s = sin_map(2);
        let n = s.neg().unwrap();
        let x = DVector::from_vec(vec![0.3, -0.7]);
        assert_relative_eq!(n.apply(&x).unwrap(), -s.apply(&x).unwrap());
        assert_eq!(n.kind(), Kind::DiffMap);
    }

    #[test]
    fn test_div_by_zero_rejected() {
        let s = sin_map(2);
        assert!(matches!(s.div(0.0), Err(OpError::InvalidScalar { .. })));
    }

    #[test]
    fn test_powi() {
        let h = homothety(2.0, 3).unwrap();
        let p = h.powi(3).unwrap();
        let x = DVector::from_vec(vec![1.0, 0.0, -1.0]);
        assert_relative_eq!(p.apply(&x).unwrap(), &x * 8.0);
        // Zeroth power is the identity.
        let id = h.powi(0).unwrap();
        assert_relative_eq!(id.apply(&x).unwrap(), x);
        // Idempotent shortcut.
        assert!(identity(3).unwrap().powi(5).unwrap().structure().idempotent);
    }

    #[test]
    fn test_powi_rejects_rectangular() {
        let a = crate::factory::explicit_lin_op(nalgebra::DMatrix::zeros(2, 3)).unwrap();
        assert!(matches!(a.powi(2), Err(OpError::InvalidShape { .. })));
    }

    #[test]
    fn test_powi_one_is_the_operator_itself() {
        // The first power composes nothing, so rectangular shapes are fine.
        let m = nalgebra::DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 2.0, -1.0, 4.0, 0.0]);
        let a = crate::factory::explicit_lin_op(m.clone()).unwrap();
        let p = a.powi(1).unwrap();
        assert_eq!(p.shape(), a.shape());
        assert_eq!(p.kind(), Kind::LinOp);
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(p.apply(&x).unwrap(), &m * &x);
    }

    #[test]
    fn test_argshift_demotes_linear_and_shifts_prox() {
        let w = DVector::from_vec(vec![1.0, 2.0]);
        let l = explicit_lin_func(w.clone()).unwrap();
        let s = DVector::from_vec(vec![0.5, -0.5]);
        let shifted = l.argshift(&s).unwrap();
        // An affine functional is differentiable but no longer linear.
        assert_eq!(shifted.kind(), Kind::DiffFunc);
        let x = DVector::from_vec(vec![1.0, 1.0]);
        assert_relative_eq!(
            shifted.apply(&x).unwrap()[0],
            w.dot(&(&x + &s))
        );
        assert_relative_eq!(shifted.gradient(&x).unwrap(), w);

        let f = half_sq_norm(2);
        let fs = f.argshift(&s).unwrap();
        assert_eq!(fs.kind(), Kind::ProxFunc);
        // prox_{f(·+s)}(x, τ) = prox_f(x + s, τ) − s.
        let got = fs.prox(&x, 1.0).unwrap();
        assert_relative_eq!(got, f.prox(&(&x + &s), 1.0).unwrap() - &s);
    }

    #[test]
    fn test_argshift_size_mismatch() {
        let f = half_sq_norm(2);
        let s = DVector::zeros(3);
        assert!(matches!(f.argshift(&s), Err(OpError::ShiftSize { .. })));
    }

    #[test]
    fn test_shape_mismatch_errors() {
        let a = crate::factory::explicit_lin_op(nalgebra::DMatrix::zeros(2, 3)).unwrap();
        let b = crate::factory::explicit_lin_op(nalgebra::DMatrix::zeros(2, 2)).unwrap();
        assert!(matches!(a.add(&b), Err(OpError::SumShape { .. })));
        assert!(matches!(a.compose(&b), Err(OpError::ComposeShape { .. })));
    }
}
