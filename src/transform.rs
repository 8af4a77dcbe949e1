//! Transform combinators
//!
//! A [`Transform`] wraps a relation so that it draws moved, scaled, rotated
//! or mirrored. Point-based relations are transformed by pre-transforming
//! the sample coordinate with the inverse transform, so transforms compose
//! without touching the wrapped closure.
//!
//! Explicit functions stay explicit under offset and scale; polar functions
//! stay polar under a positive uniform scale about the origin. Any other
//! combination converts the function to its implicit form first.

use std::sync::Arc;

use crate::relation::Relation;
use crate::types::Coord;

/// An invertible affine transform of the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// Translate by the given vector
    Offset(Coord),
    /// Scale each axis about `pivot`
    Scale { sx: f64, sy: f64, pivot: Coord },
    /// Rotate counter-clockwise by `theta` radians about `pivot`
    Rotate { theta: f64, pivot: Coord },
    /// Mirror across y = x
    Invert,
}

impl Transform {
    pub fn offset(by: Coord) -> Transform {
        Transform::Offset(by)
    }

    pub fn scale(s: f64) -> Transform {
        Transform::scale_axes(s, s)
    }

    pub fn scale_about(s: f64, pivot: Coord) -> Transform {
        Transform::Scale { sx: s, sy: s, pivot }
    }

    pub fn scale_axes(sx: f64, sy: f64) -> Transform {
        Transform::Scale { sx, sy, pivot: Coord::ORIGIN }
    }

    pub fn scale_axes_about(sx: f64, sy: f64, pivot: Coord) -> Transform {
        Transform::Scale { sx, sy, pivot }
    }

    pub fn rotate(theta: f64) -> Transform {
        Transform::Rotate { theta, pivot: Coord::ORIGIN }
    }

    pub fn rotate_about(theta: f64, pivot: Coord) -> Transform {
        Transform::Rotate { theta, pivot }
    }

    pub fn invert() -> Transform {
        Transform::Invert
    }

    /// Where `c` lands under this transform.
    pub fn forward(&self, c: Coord) -> Coord {
        match *self {
            Transform::Offset(by) => c + by,
            Transform::Scale { sx, sy, pivot } => {
                let d = c - pivot;
                pivot + Coord::new(d.x() * sx, d.y() * sy)
            }
            Transform::Rotate { theta, pivot } => c.rotate_about(theta, pivot),
            Transform::Invert => c.swap(),
        }
    }

    /// The point that lands on `c` under this transform.
    pub fn inverse(&self, c: Coord) -> Coord {
        match *self {
            Transform::Offset(by) => c - by,
            Transform::Scale { sx, sy, pivot } => pivot + (c - pivot).div_axes(sx, sy),
            Transform::Rotate { theta, pivot } => c.rotate_about(-theta, pivot),
            Transform::Invert => c.swap(),
        }
    }

    /// Wrap `relation` so it draws transformed.
    pub fn apply(&self, relation: &Relation) -> Relation {
        let t = *self;
        match relation {
            Relation::Predicate(p) => {
                let p = Arc::clone(p);
                Relation::predicate(move |c| p(t.inverse(c)))
            }
            Relation::Implicit(f) => {
                let f = Arc::clone(f);
                Relation::implicit(move |c| f(t.inverse(c)))
            }
            Relation::Complex(f) => {
                let f = Arc::clone(f);
                Relation::complex(move |z| f(t.inverse(Coord::from_complex(z)).to_complex()))
            }
            Relation::Explicit(f) => match t {
                Transform::Offset(by) => {
                    let f = Arc::clone(f);
                    Relation::explicit(move |x| Ok(f(x - by.x())? + by.y()))
                }
                Transform::Scale { sx, sy, pivot } => {
                    let f = Arc::clone(f);
                    Relation::explicit(move |x| {
                        let y = f(pivot.x() + (x - pivot.x()) / sx)?;
                        Ok(pivot.y() + sy * (y - pivot.y()))
                    })
                }
                Transform::Rotate { .. } | Transform::Invert => self.apply_implicit(relation),
            },
            Relation::Polar(f) => match t {
                Transform::Scale { sx, sy, pivot } if sx == sy && sx > 0.0 && pivot == Coord::ORIGIN => {
                    let f = Arc::clone(f);
                    Relation::polar(move |theta| Ok(sx * f(theta)?))
                }
                _ => self.apply_implicit(relation),
            },
        }
    }

    fn apply_implicit(&self, relation: &Relation) -> Relation {
        match relation.to_implicit() {
            Some(implicit) => self.apply(&implicit),
            None => relation.clone(),
        }
    }
}

impl Relation {
    pub fn transform(&self, t: Transform) -> Relation {
        t.apply(self)
    }

    pub fn offset(&self, by: Coord) -> Relation {
        self.transform(Transform::offset(by))
    }

    pub fn scale(&self, s: f64) -> Relation {
        self.transform(Transform::scale(s))
    }

    pub fn rotate(&self, theta: f64) -> Relation {
        self.transform(Transform::rotate(theta))
    }

    pub fn invert(&self) -> Relation {
        self.transform(Transform::invert())
    }
}
