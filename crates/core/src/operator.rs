//! # Operator Instances
//!
//! An [`Operator`] is a shape, a kind, and a bag of optional capability
//! implementations: boxed closures for `apply`, `gradient`, `adjoint`,
//! `jacobian` and `prox`, plus the two always-present scalar bounds
//! (Lipschitz and differential-Lipschitz, defaulted to +∞ = unknown).
//!
//! Instances are immutable once published: the combinators in the `algebra`
//! module always synthesize a *new* operator whose closures capture cheap
//! clones of the operands (all implementations live behind `Arc`), so an
//! operator can participate in any number of composites concurrently.
//!
//! ## Derived capabilities
//!
//! Not every capability a kind carries is stored as a closure. Mirroring
//! the mathematical facts rather than duplicating data:
//!
//! - linear kinds answer `jacobian` with themselves (a linear map is its
//!   own best linear approximation);
//! - scalar-valued linear kinds derive `gradient` from `adjoint` (the
//!   gradient of `x ↦ ⟨w, x⟩` is the constant `w = Aᵗ·1`);
//! - gradient-carrying kinds derive `jacobian` as an explicit linear
//!   functional built from the gradient (a 1-output Jacobian *is* the
//!   gradient row);
//! - self-adjoint structure answers `adjoint` with `apply`;
//! - `fenchel_prox` derives from `prox` by Moreau's identity.
//!
//! This is why the combinators discard `Jacobian` after resolving a kind
//! that derives it: binding a closure there would shadow the derivation.

use nalgebra::{DMatrix, DVector};
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::capability::{CapSet, Capability};
use crate::error::OpError;
use crate::factory;
use crate::kind::{Kind, Structure};
use crate::precision;
use crate::shape::Shape;

/// Deferred array-to-array capability implementation.
pub type ArrayFn = Arc<dyn Fn(&DVector<f64>) -> Result<DVector<f64>, OpError> + Send + Sync>;

/// Deferred Jacobian implementation: a point to a linear operator.
pub type JacobianFn = Arc<dyn Fn(&DVector<f64>) -> Result<Operator, OpError> + Send + Sync>;

/// Deferred proximal implementation: a point and a step size to a point.
pub type ProxFn = Arc<dyn Fn(&DVector<f64>, f64) -> Result<DVector<f64>, OpError> + Send + Sync>;

/// A capability-tracked mathematical operator.
#[derive(Clone)]
pub struct Operator {
    pub(crate) shape: Shape,
    pub(crate) kind: Kind,
    pub(crate) structure: Structure,
    /// Set on homothety instances; the factor drives the exact prox
    /// rescaling rule in the composition combinator.
    pub(crate) scale: Option<f64>,
    pub(crate) apply_fn: Option<ArrayFn>,
    pub(crate) gradient_fn: Option<ArrayFn>,
    pub(crate) adjoint_fn: Option<ArrayFn>,
    pub(crate) jacobian_fn: Option<JacobianFn>,
    pub(crate) prox_fn: Option<ProxFn>,
    pub(crate) lip: f64,
    pub(crate) dlip: f64,
    /// Shared spectral-norm cache, filled lazily by the numerical services.
    pub(crate) norm_cache: Arc<OnceLock<f64>>,
}

impl Operator {
    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn structure(&self) -> Structure {
        self.structure
    }

    /// Codomain size.
    pub fn codim(&self) -> usize {
        self.shape.codim
    }

    /// Domain size, `None` when domain-agnostic.
    pub fn dim(&self) -> Option<usize> {
        self.shape.dim
    }

    /// The canonical capability set of the operator's kind.
    ///
    /// Extra hand-attached implementations beyond the canonical set are
    /// callable but invisible here: the algebra only tracks the kind.
    pub fn properties(&self) -> CapSet {
        self.kind.caps()
    }

    /// True iff every capability in `caps` is carried by this operator.
    pub fn has(&self, caps: CapSet) -> bool {
        caps.is_subset(self.properties())
    }

    /// Global Lipschitz bound estimate (+∞ when unknown).
    ///
    /// For a linear operator a spectral norm computed by the numerical
    /// services supersedes the construction-time bound, so combinators
    /// built afterwards inherit the tightened value.
    pub fn lipschitz(&self) -> f64 {
        if self.kind.is_linear() {
            if let Some(norm) = self.cached_norm() {
                return norm;
            }
        }
        self.lip
    }

    /// Lipschitz bound estimate of the derivative (+∞ when unknown).
    pub fn diff_lipschitz(&self) -> f64 {
        self.dlip
    }

    /// The scaling factor when this operator is a homothety.
    pub fn homothety_factor(&self) -> Option<f64> {
        self.scale
    }

    /// Spectral-norm estimate cached by the numerical services, if any.
    pub fn cached_norm(&self) -> Option<f64> {
        self.norm_cache.get().copied()
    }

    /// Record a computed spectral norm. The cache is shared across clones
    /// of this operator and is write-once.
    pub fn cache_norm(&self, norm: f64) {
        let _ = self.norm_cache.set(norm);
    }

    // ------------------------------------------------------------------
    // Capability entry points
    // ------------------------------------------------------------------

    /// Evaluate the operator.
    pub fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>, OpError> {
        self.check_len(x, self.shape.dim)?;
        let x = precision::coerce(x);
        match &self.apply_fn {
            Some(f) => f(&x),
            None => Err(self.unsupported(Capability::Apply)),
        }
    }

    /// Adjoint of a linear operator. Self-adjoint structure falls back to
    /// `apply`.
    pub fn adjoint(&self, y: &DVector<f64>) -> Result<DVector<f64>, OpError> {
        self.check_len(y, Some(self.shape.codim))?;
        let y = precision::coerce(y);
        match (&self.adjoint_fn, &self.apply_fn) {
            (Some(f), _) => f(&y),
            (None, Some(f)) if self.structure.self_adjoint => f(&y),
            _ => Err(self.unsupported(Capability::Adjoint)),
        }
    }

    /// Gradient of a scalar-valued differentiable operator.
    ///
    /// Linear functionals derive it as the constant `Aᵗ·1`.
    pub fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>, OpError> {
        self.check_len(x, self.shape.dim)?;
        let x = precision::coerce(x);
        match &self.gradient_fn {
            Some(f) => f(&x),
            None if self.kind.is_linear() && self.shape.codim == 1 => {
                self.adjoint(&DVector::from_element(1, 1.0))
            }
            None => Err(self.unsupported(Capability::Gradient)),
        }
    }

    /// The Jacobian at `x`, as a linear operator.
    ///
    /// Linear kinds are their own Jacobian; gradient-carrying kinds build
    /// an explicit linear functional from the gradient.
    pub fn jacobian(&self, x: &DVector<f64>) -> Result<Operator, OpError> {
        self.check_len(x, self.shape.dim)?;
        if self.kind.is_linear() {
            return Ok(self.clone());
        }
        let x = precision::coerce(x);
        if let Some(f) = &self.jacobian_fn {
            return f(&x);
        }
        if self.properties().contains(Capability::Gradient) {
            return factory::explicit_lin_func(self.gradient(&x)?);
        }
        Err(self.unsupported(Capability::Jacobian))
    }

    /// Proximal operator with step `tau`.
    pub fn prox(&self, x: &DVector<f64>, tau: f64) -> Result<DVector<f64>, OpError> {
        self.check_len(x, self.shape.dim)?;
        let x = precision::coerce(x);
        match &self.prox_fn {
            Some(f) => f(&x, tau),
            None => Err(self.unsupported(Capability::Prox)),
        }
    }

    /// Proximal operator of the Fenchel conjugate, via Moreau's identity:
    /// `prox_{σf*}(x) = x − σ·prox_{f/σ}(x/σ)`.
    pub fn fenchel_prox(&self, x: &DVector<f64>, sigma: f64) -> Result<DVector<f64>, OpError> {
        let x = precision::coerce(x);
        let p = self.prox(&(&x / sigma), 1.0 / sigma)?;
        Ok(&x - p * sigma)
    }

    // ------------------------------------------------------------------
    // Linear-operator views
    // ------------------------------------------------------------------

    /// The transposed operator: `apply` and `adjoint` swapped, Lipschitz
    /// bound preserved. Self-adjoint operators are their own transpose.
    pub fn transpose(&self) -> Result<Operator, OpError> {
        if !self.kind.is_linear() {
            return Err(self.unsupported(Capability::Adjoint));
        }
        if self.structure.self_adjoint {
            return Ok(self.clone());
        }
        let shape = self
            .shape
            .transposed()
            .ok_or(OpError::ConcreteDomainRequired {
                operation: "transpose",
            })?;
        let fwd = self.clone();
        let bwd = self.clone();
        let op = Builder::new(Kind::LinOp, shape)
            .apply(move |y| fwd.adjoint(y))
            .adjoint(move |x| bwd.apply(x))
            .lipschitz(self.lipschitz())
            .structure(Structure {
                self_adjoint: false,
                ..self.structure
            })
            .build()?;
        Ok(op.squeeze())
    }

    /// The Gram operator `AᵗA`.
    pub fn gram(&self) -> Result<Operator, OpError> {
        let mut g = self.transpose()?.compose(self)?;
        g.structure.square = true;
        Ok(g)
    }

    /// The co-Gram operator `AAᵗ`. For a normal operator the result is
    /// additionally marked self-adjoint.
    pub fn cogram(&self) -> Result<Operator, OpError> {
        let mut g = self.compose(&self.transpose()?)?;
        g.structure.square = true;
        if self.structure.normal {
            g.structure.normal = true;
            g.structure.self_adjoint = true;
        }
        Ok(g)
    }

    /// Materialize a linear operator column by column.
    pub fn to_matrix(&self) -> Result<DMatrix<f64>, OpError> {
        if !self.kind.is_linear() {
            return Err(self.unsupported(Capability::Adjoint));
        }
        let d = self.shape.dim.ok_or(OpError::ConcreteDomainRequired {
            operation: "to_matrix",
        })?;
        let mut columns = Vec::with_capacity(d);
        for j in 0..d {
            let mut e = DVector::zeros(d);
            e[j] = 1.0;
            columns.push(self.apply(&e)?);
        }
        Ok(DMatrix::from_columns(&columns))
    }

    // ------------------------------------------------------------------
    // Specialization
    // ------------------------------------------------------------------

    /// Re-kind the operator to `to`, which must carry at least the source's
    /// capabilities (an operator cannot claim behaviors it does not have).
    ///
    /// When the source carries a Jacobian and the target is single-valued,
    /// a gradient is synthesized from the Jacobian: the 1-output Jacobian
    /// row, read back through its adjoint.
    pub fn specialize(&self, to: Kind) -> Result<Operator, OpError> {
        if to == self.kind {
            return Ok(self.clone());
        }
        if !self.properties().is_subset(to.caps()) {
            return Err(OpError::Specialize {
                from: self.kind,
                to,
            });
        }
        if to.is_functional() && self.shape.codim != 1 {
            return Err(OpError::InvalidShape {
                kind: to,
                shape: self.shape,
                reason: "functionals must have shape (1, n)",
            });
        }
        Ok(self.cast_to(to))
    }

    /// Downcast a 1-output operator to its single-valued counterpart kind;
    /// anything else is returned unchanged. Idempotent.
    pub fn squeeze(&self) -> Operator {
        if self.shape.codim == 1 && self.kind.squeezed() != self.kind {
            self.cast_to(self.kind.squeezed())
        } else {
            self.clone()
        }
    }

    /// Kind change after the guards have passed: implementations carry
    /// over unchanged, plus the Jacobian-to-gradient synthesis.
    fn cast_to(&self, to: Kind) -> Operator {
        let mut out = self.clone();
        out.kind = to;
        if self.properties().contains(Capability::Jacobian)
            && to.caps().contains(Capability::Gradient)
            && out.gradient_fn.is_none()
            && !self.kind.is_linear()
        {
            let src = self.clone();
            out.gradient_fn = Some(Arc::new(move |x| {
                src.jacobian(x)?.adjoint(&DVector::from_element(1, 1.0))
            }));
        }
        out
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn unsupported(&self, capability: Capability) -> OpError {
        OpError::Unsupported {
            kind: self.kind,
            capability,
        }
    }

    fn check_len(&self, x: &DVector<f64>, expected: Option<usize>) -> Result<(), OpError> {
        match expected {
            Some(n) if x.len() != n => Err(OpError::DimensionMismatch {
                expected: n,
                got: x.len(),
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.shape)
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("kind", &self.kind)
            .field("shape", &self.shape)
            .field("structure", &self.structure)
            .field("lipschitz", &self.lip)
            .field("diff_lipschitz", &self.dlip)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Constructor for operator instances.
///
/// Capability implementations are attached individually; shape validation
/// happens in [`Builder::build`]. Capability *presence* is structural
/// (derived from the kind), so a missing implementation is only reported at
/// first use, never at construction.
pub struct Builder {
    op: Operator,
}

impl Builder {
    pub fn new(kind: Kind, shape: Shape) -> Builder {
        Builder {
            op: Operator {
                shape,
                kind,
                structure: Structure::PLAIN,
                scale: None,
                apply_fn: None,
                gradient_fn: None,
                adjoint_fn: None,
                jacobian_fn: None,
                prox_fn: None,
                lip: f64::INFINITY,
                // A linear map has a constant Jacobian.
                dlip: if kind.is_linear() { 0.0 } else { f64::INFINITY },
                norm_cache: Arc::new(OnceLock::new()),
            },
        }
    }

    pub fn apply<F>(mut self, f: F) -> Builder
    where
        F: Fn(&DVector<f64>) -> Result<DVector<f64>, OpError> + Send + Sync + 'static,
    {
        self.op.apply_fn = Some(Arc::new(f));
        self
    }

    pub fn gradient<F>(mut self, f: F) -> Builder
    where
        F: Fn(&DVector<f64>) -> Result<DVector<f64>, OpError> + Send + Sync + 'static,
    {
        self.op.gradient_fn = Some(Arc::new(f));
        self
    }

    pub fn adjoint<F>(mut self, f: F) -> Builder
    where
        F: Fn(&DVector<f64>) -> Result<DVector<f64>, OpError> + Send + Sync + 'static,
    {
        self.op.adjoint_fn = Some(Arc::new(f));
        self
    }

    pub fn jacobian<F>(mut self, f: F) -> Builder
    where
        F: Fn(&DVector<f64>) -> Result<Operator, OpError> + Send + Sync + 'static,
    {
        self.op.jacobian_fn = Some(Arc::new(f));
        self
    }

    pub fn prox<F>(mut self, f: F) -> Builder
    where
        F: Fn(&DVector<f64>, f64) -> Result<DVector<f64>, OpError> + Send + Sync + 'static,
    {
        self.op.prox_fn = Some(Arc::new(f));
        self
    }

    pub fn lipschitz(mut self, bound: f64) -> Builder {
        self.op.lip = bound;
        self
    }

    pub fn diff_lipschitz(mut self, bound: f64) -> Builder {
        self.op.dlip = bound;
        self
    }

    pub fn structure(mut self, structure: Structure) -> Builder {
        self.op.structure = structure;
        self
    }

    pub(crate) fn scale_factor(mut self, factor: f64) -> Builder {
        self.op.scale = Some(factor);
        self
    }

    pub fn build(self) -> Result<Operator, OpError> {
        let op = self.op;
        let invalid = |reason| OpError::InvalidShape {
            kind: op.kind,
            shape: op.shape,
            reason,
        };
        if op.shape.codim == 0 {
            return Err(invalid("codomain size must be positive"));
        }
        if op.shape.dim == Some(0) {
            return Err(invalid("domain size must be positive"));
        }
        if op.kind.is_functional() && op.shape.codim != 1 {
            return Err(invalid("functionals must have shape (1, n)"));
        }
        if op.structure.square && !op.shape.is_agnostic() && !op.shape.is_square() {
            return Err(invalid("square structure requires codomain == domain"));
        }
        Ok(op)
    }
}
