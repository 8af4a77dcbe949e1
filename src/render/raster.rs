//! Per-pixel passes over square tiles

use num_complex::Complex64;

use super::Canvas;
use super::buffer::PixelBuffer;
use super::chunks::{self, Tile};
use crate::errors::{EvalError, RenderError};
use crate::log::trace;
use crate::types::{Color, Coord};

fn tiles(canvas: &Canvas) -> Vec<Tile> {
    chunks::tiles(canvas.width, canvas.height, canvas.options.chunk_size)
}

/// Fill every pixel whose top-left corner satisfies `p`.
pub fn predicate(canvas: &Canvas, p: &(dyn Fn(Coord) -> bool + Send + Sync), color: Color) -> Result<(), RenderError> {
    let tiles = tiles(canvas);
    chunks::fan_out(&tiles, canvas.options.cancel.as_ref(), |t| {
        for y in t.y0..t.y1 {
            for x in t.x0..t.x1 {
                let (x, y) = (x as i64, y as i64);
                if p(canvas.pixel_to_coord(x, y)) {
                    canvas.buffer.blend(x, y, color);
                }
            }
        }
    })
}

/// Finite sample or nothing.
fn sample(f: &(dyn Fn(Coord) -> Result<f64, EvalError> + Send + Sync), c: Coord) -> Option<f64> {
    match f(c) {
        Ok(v) if v.is_finite() => Some(v),
        Ok(_) => None,
        Err(_e) => {
            trace!(%c, error = %_e, "sample failed");
            None
        }
    }
}

/// Whether the 2×2 stencil anchored at a pixel straddles the zero set.
///
/// An exact zero at the anchor always draws. Otherwise any neighbor of the
/// opposite strict sign draws; a zero neighbor does not.
pub fn crosses_zero(center: f64, neighbors: [f64; 3]) -> bool {
    center == 0.0
        || neighbors
            .iter()
            .any(|&n| (center > 0.0 && n < 0.0) || (center < 0.0 && n > 0.0))
}

/// Sign-change scan of `f` over the canvas.
///
/// Each tile samples its `(w + 1) × (h + 1)` lattice of pixel corners once;
/// a pixel whose four corners include a non-finite or failed sample is
/// skipped.
pub fn implicit(
    canvas: &Canvas,
    f: &(dyn Fn(Coord) -> Result<f64, EvalError> + Send + Sync),
    color: Color,
) -> Result<(), RenderError> {
    let tiles = tiles(canvas);
    chunks::fan_out(&tiles, canvas.options.cancel.as_ref(), |t| {
        let w = t.width() as usize + 1;
        let h = t.height() as usize + 1;

        let mut lattice = Vec::with_capacity(w * h);
        for j in 0..h {
            for i in 0..w {
                let c = canvas.pixel_to_coord(t.x0 as i64 + i as i64, t.y0 as i64 + j as i64);
                lattice.push(sample(f, c));
            }
        }

        for j in 0..h - 1 {
            for i in 0..w - 1 {
                let at = |di: usize, dj: usize| lattice[(j + dj) * w + i + di];
                let (Some(center), Some(right), Some(below), Some(diagonal)) = (at(0, 0), at(1, 0), at(0, 1), at(1, 1))
                else {
                    continue;
                };
                if crosses_zero(center, [right, below, diagonal]) {
                    canvas.buffer.blend(t.x0 as i64 + i as i64, t.y0 as i64 + j as i64, color);
                }
            }
        }
    })
}

/// Scatter every pixel to where `f` sends its coordinate.
///
/// Reads the live buffer and writes a new one, which starts as background.
/// Destinations outside the viewport are dropped; when several sources land
/// on one destination, which one wins is unspecified.
pub fn complex_map(
    canvas: &Canvas,
    f: &(dyn Fn(Complex64) -> Complex64 + Send + Sync),
) -> Result<PixelBuffer, RenderError> {
    let out = PixelBuffer::new(canvas.width, canvas.height, canvas.style.background);
    let tiles = tiles(canvas);
    chunks::fan_out(&tiles, canvas.options.cancel.as_ref(), |t| {
        for y in t.y0..t.y1 {
            for x in t.x0..t.x1 {
                let (x, y) = (x as i64, y as i64);
                let z = f(canvas.pixel_to_coord(x, y).to_complex());
                let dest = Coord::from_complex(z);
                if !canvas.area.contains(dest) {
                    continue;
                }
                let (dx, dy) = canvas.coord_to_pixel(dest);
                if let Some(color) = canvas.buffer.get(x, y) {
                    out.set(dx, dy, color);
                }
            }
        }
    })?;
    Ok(out)
}
