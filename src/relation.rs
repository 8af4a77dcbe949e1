//! Renderable relations
//!
//! A [`Relation`] is the closed set of shapes the renderer knows how to draw.
//! Every variant wraps a pure, thread-safe closure so the rasterizer can call
//! it from many chunk tasks at once.

use std::fmt;
use std::sync::Arc;

use num_complex::Complex64;

use crate::errors::EvalError;
use crate::types::Coord;

pub type PredicateFn = Arc<dyn Fn(Coord) -> bool + Send + Sync>;
pub type ImplicitFn = Arc<dyn Fn(Coord) -> Result<f64, EvalError> + Send + Sync>;
pub type FunctionFn = Arc<dyn Fn(f64) -> Result<f64, EvalError> + Send + Sync>;
pub type ComplexFn = Arc<dyn Fn(Complex64) -> Complex64 + Send + Sync>;

/// Something that can be drawn onto a canvas.
#[derive(Clone)]
pub enum Relation {
    /// Region where the predicate holds
    Predicate(PredicateFn),
    /// Curve where the function crosses zero
    Implicit(ImplicitFn),
    /// y = f(x)
    Explicit(FunctionFn),
    /// r = f(θ)
    Polar(FunctionFn),
    /// Remap of the whole canvas through z ↦ f(z)
    Complex(ComplexFn),
}

/// Discriminant of a [`Relation`], for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Predicate,
    Implicit,
    Explicit,
    Polar,
    Complex,
}

impl RelationKind {
    pub fn name(self) -> &'static str {
        match self {
            RelationKind::Predicate => "predicate",
            RelationKind::Implicit => "implicit",
            RelationKind::Explicit => "explicit",
            RelationKind::Polar => "polar",
            RelationKind::Complex => "complex",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Relation {
    pub fn predicate(f: impl Fn(Coord) -> bool + Send + Sync + 'static) -> Relation {
        Relation::Predicate(Arc::new(f))
    }

    pub fn implicit(f: impl Fn(Coord) -> Result<f64, EvalError> + Send + Sync + 'static) -> Relation {
        Relation::Implicit(Arc::new(f))
    }

    pub fn explicit(f: impl Fn(f64) -> Result<f64, EvalError> + Send + Sync + 'static) -> Relation {
        Relation::Explicit(Arc::new(f))
    }

    pub fn polar(f: impl Fn(f64) -> Result<f64, EvalError> + Send + Sync + 'static) -> Relation {
        Relation::Polar(Arc::new(f))
    }

    pub fn complex(f: impl Fn(Complex64) -> Complex64 + Send + Sync + 'static) -> Relation {
        Relation::Complex(Arc::new(f))
    }

    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::Predicate(_) => RelationKind::Predicate,
            Relation::Implicit(_) => RelationKind::Implicit,
            Relation::Explicit(_) => RelationKind::Explicit,
            Relation::Polar(_) => RelationKind::Polar,
            Relation::Complex(_) => RelationKind::Complex,
        }
    }

    /// The equivalent zero-set form: `y - f(x)` for explicit functions,
    /// `r - f(θ)` for polar ones. Predicates and complex maps have none.
    pub fn to_implicit(&self) -> Option<Relation> {
        match self {
            Relation::Implicit(_) => Some(self.clone()),
            Relation::Explicit(f) => {
                let f = Arc::clone(f);
                Some(Relation::implicit(move |c| Ok(c.y() - f(c.x())?)))
            }
            Relation::Polar(f) => {
                let f = Arc::clone(f);
                Some(Relation::implicit(move |c| {
                    let (r, theta) = c.polar();
                    Ok(r - f(theta)?)
                }))
            }
            Relation::Predicate(_) | Relation::Complex(_) => None,
        }
    }

    /// Evaluate as a zero-set function at `c`, if this relation has one.
    pub fn implicit_value(&self, c: Coord) -> Option<Result<f64, EvalError>> {
        match self {
            Relation::Implicit(f) => Some(f(c)),
            Relation::Explicit(f) => Some(f(c.x()).map(|y| c.y() - y)),
            Relation::Polar(f) => {
                let (r, theta) = c.polar();
                Some(f(theta).map(|v| r - v))
            }
            Relation::Predicate(_) | Relation::Complex(_) => None,
        }
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Relation::{:?}(..)", self.kind())
    }
}
