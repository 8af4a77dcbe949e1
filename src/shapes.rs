//! Derived shapes built from canonical unit forms plus transforms

use crate::relation::Relation;
use crate::transform::Transform;
use crate::types::Coord;

/// Iteration cap for [`mandelbrot`]
pub const MANDELBROT_ITERATIONS: usize = 200;

/// Escape radius for the Mandelbrot iteration
pub const ESCAPE_RADIUS: f64 = 2.0;

/// x² + y² − 1
pub fn unit_circle() -> Relation {
    Relation::implicit(|c| Ok(c.x() * c.x() + c.y() * c.y() - 1.0))
}

pub fn circle(r: f64) -> Relation {
    unit_circle().scale(r)
}

pub fn circle_at(r: f64, center: Coord) -> Relation {
    circle(r).offset(center)
}

/// Ellipse with semi-axes `a` (along x) and `b` (along y).
pub fn ellipse(a: f64, b: f64) -> Relation {
    unit_circle().transform(Transform::scale_axes(a, b))
}

pub fn ellipse_at(a: f64, b: f64, center: Coord) -> Relation {
    ellipse(a, b).offset(center)
}

/// Points whose orbit under z ↦ z² + c stays bounded.
pub fn mandelbrot() -> Relation {
    mandelbrot_with(MANDELBROT_ITERATIONS)
}

pub fn mandelbrot_with(max_iterations: usize) -> Relation {
    Relation::predicate(move |c| {
        let seed = c.to_complex();
        let mut z = num_complex::Complex64::new(0.0, 0.0);
        for _ in 0..max_iterations {
            z = z * z + seed;
            if z.norm() >= ESCAPE_RADIUS {
                return false;
            }
        }
        true
    })
}

/// Complex-plane map z ↦ zⁿ
pub fn power_map(n: i32) -> Relation {
    Relation::complex(move |z| z.powi(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(relation: &Relation, x: f64, y: f64) -> f64 {
        relation.implicit_value(Coord::new(x, y)).unwrap().unwrap()
    }

    #[test]
    fn circle_has_radius() {
        let c = circle(2.0);
        assert!(value(&c, 2.0, 0.0).abs() < 1e-12);
        assert!(value(&c, 0.0, -2.0).abs() < 1e-12);
        assert!(value(&c, 0.0, 0.0) < 0.0);
        assert!(value(&c, 3.0, 0.0) > 0.0);
    }

    #[test]
    fn circle_at_center() {
        let c = circle_at(1.0, Coord::new(2.0, 3.0));
        assert!(value(&c, 3.0, 3.0).abs() < 1e-12);
        assert!(value(&c, 2.0, 3.0) < 0.0);
    }

    #[test]
    fn ellipse_semi_axes() {
        let e = ellipse_at(3.0, 1.0, Coord::new(0.0, 1.0));
        assert!(value(&e, 3.0, 1.0).abs() < 1e-12);
        assert!(value(&e, 0.0, 2.0).abs() < 1e-12);
        assert!(value(&e, 0.0, 2.5) > 0.0);
    }

    #[test]
    fn mandelbrot_membership() {
        let Relation::Predicate(m) = mandelbrot() else { panic!("expected predicate") };
        assert!(m(Coord::new(0.0, 0.0)));
        assert!(m(Coord::new(-1.0, 0.0)));
        assert!(!m(Coord::new(1.0, 1.0)));
        assert!(!m(Coord::new(0.5, 0.0)));
    }

    #[test]
    fn power_map_squares() {
        let Relation::Complex(f) = power_map(2) else { panic!("expected complex") };
        let z = f(Coord::new(0.0, 1.0).to_complex());
        assert!((z.re + 1.0).abs() < 1e-12 && z.im.abs() < 1e-12);
    }
}
