//! # Precision Policy
//!
//! A process-wide numeric precision setting, enforced at every entry point
//! that accepts an array (`apply`, `adjoint`, `gradient`, `jacobian`,
//! `prox`, `argshift`). Arrays always travel as `f64`; under the `Single`
//! policy their values are rounded through `f32` on the way in, so every
//! capability implementation observes single-precision data regardless of
//! what the caller handed over.
//!
//! Coercion is idempotent: rounding an already-rounded vector changes
//! nothing. That is what lets composite operators call back into their
//! operands' public entry points without a double-casting problem.

use nalgebra::DVector;
use std::sync::atomic::{AtomicU8, Ordering};

/// Numeric precision enforced at array entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// Round arrays through `f32` at every entry point.
    Single,
    /// Leave arrays untouched (native `f64`).
    #[default]
    Double,
}

static CURRENT: AtomicU8 = AtomicU8::new(1); // Double

/// The precision currently in force.
pub fn get_precision() -> Precision {
    match CURRENT.load(Ordering::Relaxed) {
        0 => Precision::Single,
        _ => Precision::Double,
    }
}

/// Install a new process-wide precision.
pub fn set_precision(p: Precision) {
    let v = match p {
        Precision::Single => 0,
        Precision::Double => 1,
    };
    CURRENT.store(v, Ordering::Relaxed);
}

/// Cast a vector to the current precision.
pub fn coerce(x: &DVector<f64>) -> DVector<f64> {
    match get_precision() {
        Precision::Double => x.clone(),
        Precision::Single => x.map(|v| v as f32 as f64),
    }
}

/// Scoped precision override; restores the previous setting on drop.
///
/// Intended for tests and for callers that need a temporary policy without
/// disturbing the rest of the process.
pub struct PrecisionGuard {
    previous: Precision,
}

impl PrecisionGuard {
    pub fn new(p: Precision) -> Self {
        let previous = get_precision();
        set_precision(p);
        PrecisionGuard { previous }
    }
}

impl Drop for PrecisionGuard {
    fn drop(&mut self) {
        set_precision(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // The policy is process-global; serialize the tests that touch it.
    static LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_double_is_a_passthrough() {
        let _lock = LOCK.lock().unwrap();
        let x = DVector::from_vec(vec![0.1, 0.2, core::f64::consts::PI]);
        assert_eq!(coerce(&x), x);
    }

    #[test]
    fn test_single_rounds_through_f32() {
        let _lock = LOCK.lock().unwrap();
        let _guard = PrecisionGuard::new(Precision::Single);
        let x = DVector::from_vec(vec![core::f64::consts::PI]);
        let y = coerce(&x);
        assert_eq!(y[0], core::f64::consts::PI as f32 as f64);
        assert_ne!(y[0], core::f64::consts::PI);
    }

    #[test]
    fn test_coercion_is_idempotent() {
        let _lock = LOCK.lock().unwrap();
        let _guard = PrecisionGuard::new(Precision::Single);
        let x = DVector::from_vec(vec![1.0 / 3.0, 2.0 / 7.0]);
        let once = coerce(&x);
        let twice = coerce(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_guard_restores() {
        let _lock = LOCK.lock().unwrap();
        let before = get_precision();
        {
            let _guard = PrecisionGuard::new(Precision::Single);
            assert_eq!(get_precision(), Precision::Single);
        }
        assert_eq!(get_precision(), before);
    }
}
