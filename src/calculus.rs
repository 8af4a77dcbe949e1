//! Numeric calculus over explicit functions
//!
//! Step sizes are fixed, matching one-hundredth of a coordinate unit. These
//! are plotting aids, not a numerics library.

use std::sync::Arc;

use crate::errors::EvalError;
use crate::relation::{FunctionFn, Relation};

/// Step for forward differences and Riemann sums
pub const CALCULUS_DX: f64 = 0.01;

/// Forward-difference derivative of `f`.
pub fn differentiate(f: &FunctionFn) -> FunctionFn {
    let f = Arc::clone(f);
    Arc::new(move |x: f64| -> Result<f64, EvalError> { Ok((f(x + CALCULUS_DX)? - f(x)?) / CALCULUS_DX) })
}

/// Left Riemann sum of `f` from `a` to `b`. Negative when `b < a`.
pub fn integrate(f: &(dyn Fn(f64) -> Result<f64, EvalError> + Send + Sync), a: f64, b: f64) -> Result<f64, EvalError> {
    let (dir, span) = if a <= b { (1.0, b - a) } else { (-1.0, a - b) };
    if !span.is_finite() {
        return Err(EvalError::NonFinite { value: span });
    }

    let steps = (span / CALCULUS_DX).ceil() as usize;
    let mut sum = 0.0;
    for i in 0..steps {
        let x = a + dir * i as f64 * CALCULUS_DX;
        sum += dir * f(x)? * CALCULUS_DX;
    }
    Ok(sum)
}

/// `x ↦ ∫ₐˣ f`
pub fn antiderivative(f: &FunctionFn, a: f64) -> FunctionFn {
    let f = Arc::clone(f);
    Arc::new(move |x: f64| integrate(f.as_ref(), a, x))
}

impl Relation {
    /// Derivative of an explicit function; `None` for other kinds.
    pub fn derivative(&self) -> Option<Relation> {
        match self {
            Relation::Explicit(f) => Some(Relation::Explicit(differentiate(f))),
            _ => None,
        }
    }

    /// Antiderivative of an explicit function anchored at `a`.
    pub fn antiderivative(&self, a: f64) -> Option<Relation> {
        match self {
            Relation::Explicit(f) => Some(Relation::Explicit(antiderivative(f, a))),
            _ => None,
        }
    }
}
