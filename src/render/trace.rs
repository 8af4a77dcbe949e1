//! Parametric passes: explicit and polar functions, slope fields
//!
//! Tracers sample a curve along its parameter and join consecutive samples
//! with segments. A failed or non-finite sample breaks the polyline there;
//! the walk carries on from the next good sample.

use super::Canvas;
use super::chunks;
use crate::errors::{EvalError, RenderError};
use crate::types::{Color, Coord};

/// Join `prev` to `next` when both exist. `joined` says a segment already
/// ends at `prev`; it is updated for the next call.
fn connect(canvas: &Canvas, prev: Option<Coord>, next: Option<Coord>, joined: &mut bool, color: Color) {
    match (prev, next) {
        (Some(a), Some(b)) => {
            if *joined {
                canvas.draw_joined_line(a, b, color);
            } else {
                canvas.draw_line(a, b, color);
            }
            *joined = true;
        }
        _ => *joined = false,
    }
}

fn valid(c: Coord) -> Option<Coord> {
    c.is_valid().then_some(c)
}

/// Trace y = f(x) column by column.
///
/// The columns are split into spans; each span walks from its first column
/// to the next span's first column, so neighboring spans meet without
/// talking to each other. A span leaves its first pixel to the previous
/// span when that span drew a segment into it.
pub fn explicit(
    canvas: &Canvas,
    f: &(dyn Fn(f64) -> Result<f64, EvalError> + Send + Sync),
    color: Color,
) -> Result<(), RenderError> {
    let spans = chunks::spans(canvas.width, canvas.options.chunk_size);
    let sample = |column: u32| -> Option<Coord> {
        let x = canvas.pixel_to_coord(column as i64, 0).x();
        f(x).ok().and_then(|y| valid(Coord::new(x, y)))
    };

    chunks::fan_out(&spans, canvas.options.cancel.as_ref(), |span| {
        let mut prev = sample(span.start);
        let mut joined = span.start > 0 && prev.is_some() && sample(span.start - 1).is_some();
        for column in span.start + 1..=span.end {
            let next = sample(column);
            connect(canvas, prev, next, &mut joined, color);
            prev = next;
        }
    })
}

/// Trace r = f(θ) over θ in [0, 2π].
///
/// Each angular chunk steps one increment past its end so that it overlaps
/// the next chunk's first sample.
pub fn polar(
    canvas: &Canvas,
    f: &(dyn Fn(f64) -> Result<f64, EvalError> + Send + Sync),
    color: Color,
) -> Result<(), RenderError> {
    let opts = &canvas.options;
    let step = opts.angle_chunk / opts.angle_steps.max(1) as f64;
    let ranges = chunks::angle_chunks(opts.angle_chunk);
    let sample = |theta: f64| -> Option<Coord> { f(theta).ok().and_then(|r| valid(Coord::from_polar(r, theta))) };

    chunks::fan_out(&ranges, opts.cancel.as_ref(), |range| {
        let steps = ((range.end - range.start) / step).round() as u64;
        let mut prev = sample(range.start);
        let mut joined = false;
        for k in 1..=steps + 1 {
            let next = sample(range.start + k as f64 * step);
            connect(canvas, prev, next, &mut joined, color);
            prev = next;
        }
    })
}

/// Forward-Euler walk of dy/dx = slope(x, y) from `start`, one pixel width
/// per step, in both directions at once.
///
/// A direction stops after it leaves the viewport, when the slope cannot be
/// evaluated, or after as many steps as the canvas is wide.
pub fn differential(
    canvas: &Canvas,
    slope: &(dyn Fn(Coord) -> Result<f64, EvalError> + Sync),
    start: Coord,
    color: Color,
) -> Result<(), RenderError> {
    let dx = canvas.pixel_size().x;
    let directions = [dx, -dx];

    chunks::fan_out(&directions, canvas.options.cancel.as_ref(), |&dx| {
        // Both directions leave `start`; the forward one blends it
        let mut joined = dx < 0.0;
        let mut prev = start;
        for _ in 0..canvas.width {
            let Ok(m) = slope(prev) else {
                break;
            };
            let next = prev + Coord::new(dx, m * dx);
            if !next.is_valid() {
                break;
            }
            if joined {
                canvas.draw_joined_line(prev, next, color);
            } else {
                canvas.draw_line(prev, next, color);
            }
            joined = true;
            prev = next;
            if !canvas.area.contains(next) {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::Relation;
    use crate::types::{Area, Scale};

    fn canvas() -> Canvas {
        let area = Area::try_new(-5.0, 5.0, 5.0, -5.0).unwrap();
        Canvas::new(area, Scale::try_new(10.0).unwrap()).unwrap()
    }

    fn is_drawn(c: &Canvas, x: u32, y: u32) -> bool {
        c.pixel(x, y) != Some(Color::WHITE)
    }

    // ==================== Explicit tests ====================

    #[test]
    fn horizontal_line() {
        let mut c = canvas();
        c.draw(&Relation::explicit(|_| Ok(0.0)), Color::BLACK).unwrap();
        for x in 0..100 {
            assert!(is_drawn(&c, x, 50), "column {}", x);
        }
        assert!(!is_drawn(&c, 10, 49));
    }

    #[test]
    fn steep_function_is_connected() {
        let mut c = canvas();
        c.draw(&Relation::explicit(|x| Ok(4.0 * x)), Color::BLACK).unwrap();
        // Every row the curve crosses inside the viewport has a pixel
        for y in 0..100 {
            assert!((0..100).any(|x| is_drawn(&c, x, y)), "row {}", y);
        }
    }

    #[test]
    fn span_seams_are_continuous() {
        let mut c = canvas().with_options(crate::render::RenderOptions { chunk_size: 3, ..Default::default() });
        c.draw(&Relation::explicit(|x| Ok(x / 2.0)), Color::BLACK).unwrap();
        for x in 0..100 {
            assert!((0..100).any(|y| is_drawn(&c, x, y)), "column {}", x);
        }
    }

    #[test]
    fn translucent_line_is_blended_once_per_pixel() {
        let mut c = canvas().with_options(crate::render::RenderOptions { chunk_size: 3, ..Default::default() });
        c.draw(&Relation::explicit(|_| Ok(0.0)), Color::rgba(0, 0, 0, 128)).unwrap();
        let first = c.pixel(0, 50).unwrap();
        assert!((120..=135).contains(&first.r), "{}", first);
        for x in 1..100 {
            assert_eq!(c.pixel(x, 50), Some(first), "column {}", x);
        }
    }

    #[test]
    fn failures_leave_gaps() {
        let mut c = canvas();
        let relation = Relation::explicit(|x| {
            if x < 0.0 { Err(EvalError::Domain { function: "sqrt", argument: x }) } else { Ok(1.0) }
        });
        c.draw(&relation, Color::BLACK).unwrap();
        assert!(!is_drawn(&c, 20, 40));
        assert!(is_drawn(&c, 70, 40));
    }

    // ==================== Polar tests ====================

    #[test]
    fn polar_circle_is_closed() {
        let mut c = canvas();
        c.draw(&Relation::polar(|_| Ok(3.0)), Color::BLACK).unwrap();
        // Radius 3 is 30 px from the center at (50, 50)
        assert!(is_drawn(&c, 80, 50));
        assert!(is_drawn(&c, 50, 20));
        assert!(is_drawn(&c, 20, 50) || is_drawn(&c, 19, 50));
        assert!(is_drawn(&c, 50, 80) || is_drawn(&c, 50, 79));
        assert!(!is_drawn(&c, 50, 50));
    }

    // ==================== Slope field tests ====================

    #[test]
    fn constant_slope_draws_a_line() {
        let c = canvas();
        c.draw_slope_field(|_| Ok(0.0), Coord::new(0.0, 2.0), Color::BLACK).unwrap();
        // y = 2 is row 30
        assert!(is_drawn(&c, 0, 30));
        assert!(is_drawn(&c, 99, 30));
        assert!(!is_drawn(&c, 50, 31));
    }

    #[test]
    fn translucent_slope_field_is_blended_once_per_pixel() {
        let c = canvas();
        c.draw_slope_field(|_| Ok(0.0), Coord::ORIGIN, Color::rgba(0, 0, 0, 128)).unwrap();
        let start = c.pixel(50, 50).unwrap();
        assert!((120..=135).contains(&start.r), "{}", start);
        for x in 1..99 {
            assert_eq!(c.pixel(x, 50), Some(start), "column {}", x);
        }
    }

    #[test]
    fn failing_slope_stops() {
        let c = canvas();
        c.draw_slope_field(
            |p| if p.x() > 1.0 { Err(EvalError::NonFinite { value: f64::NAN }) } else { Ok(0.0) },
            Coord::ORIGIN,
            Color::BLACK,
        )
        .unwrap();
        assert!(is_drawn(&c, 10, 50));
        assert!(!is_drawn(&c, 80, 50));
    }
}
