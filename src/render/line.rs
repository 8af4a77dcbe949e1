//! Segment rasterization
//!
//! Segments arrive in continuous pixel space (x right, y down). They are
//! clipped to the buffer, expanded by one pixel, with Cohen-Sutherland in
//! floating point, so an endpoint far outside the canvas (a sample near an
//! asymptote) costs only the visible pixels. The clipped segment is floored
//! to integer pixels and drawn 8-connected with Bresenham.

use glam::DVec2;

use super::buffer::PixelBuffer;
use crate::types::Color;

const INSIDE: u8 = 0;
const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const TOP: u8 = 4;
const BOTTOM: u8 = 8;

/// Clip `p0`-`p1` to `[min, max]`. `None` when nothing is visible.
pub fn clip(mut p0: DVec2, mut p1: DVec2, min: DVec2, max: DVec2) -> Option<(DVec2, DVec2)> {
    // Converges in at most four rounds for finite input
    const MAX_ITERATIONS: u32 = 8;

    let outcode = |p: DVec2| -> u8 {
        let mut code = INSIDE;
        if p.x < min.x {
            code |= LEFT;
        } else if p.x > max.x {
            code |= RIGHT;
        }
        if p.y < min.y {
            code |= TOP;
        } else if p.y > max.y {
            code |= BOTTOM;
        }
        code
    };

    let mut code0 = outcode(p0);
    let mut code1 = outcode(p1);

    for _ in 0..MAX_ITERATIONS {
        if code0 | code1 == INSIDE {
            return Some((p0, p1));
        }
        if code0 & code1 != INSIDE {
            return None;
        }

        let out = if code0 != INSIDE { code0 } else { code1 };
        let d = p1 - p0;
        let p = if out & TOP != 0 {
            DVec2::new(p0.x + d.x * (min.y - p0.y) / d.y, min.y)
        } else if out & BOTTOM != 0 {
            DVec2::new(p0.x + d.x * (max.y - p0.y) / d.y, max.y)
        } else if out & LEFT != 0 {
            DVec2::new(min.x, p0.y + d.y * (min.x - p0.x) / d.x)
        } else {
            DVec2::new(max.x, p0.y + d.y * (max.x - p0.x) / d.x)
        };
        if !p.is_finite() {
            return None;
        }

        if out == code0 {
            p0 = p;
            code0 = outcode(p0);
        } else {
            p1 = p;
            code1 = outcode(p1);
        }
    }
    None
}

/// Draw the segment `p0`-`p1` (pixel space) into `buffer`. Both endpoints
/// are drawn. Non-finite endpoints draw nothing.
pub fn draw_segment(buffer: &PixelBuffer, p0: DVec2, p1: DVec2, color: Color) {
    segment(buffer, p0, p1, color, false);
}

/// Like [`draw_segment`] but leaves out the pixel under `p0`, which the
/// previous segment of a polyline already blended.
pub fn draw_joined_segment(buffer: &PixelBuffer, p0: DVec2, p1: DVec2, color: Color) {
    segment(buffer, p0, p1, color, true);
}

fn segment(buffer: &PixelBuffer, p0: DVec2, p1: DVec2, color: Color, skip_start: bool) {
    if !p0.is_finite() || !p1.is_finite() || !(p1 - p0).is_finite() {
        return;
    }

    let min = DVec2::splat(-1.0);
    let max = DVec2::new(buffer.width() as f64 + 1.0, buffer.height() as f64 + 1.0);
    let Some((a, b)) = clip(p0, p1, min, max) else {
        return;
    };

    // An unclipped start floors to the previous segment's last pixel
    let skip = skip_start.then(|| (p0.x.floor() as i64, p0.y.floor() as i64));
    let (x0, y0) = (a.x.floor() as i64, a.y.floor() as i64);
    let (x1, y1) = (b.x.floor() as i64, b.y.floor() as i64);
    walk((x0, y0), (x1, y1), |x, y| {
        if skip != Some((x, y)) {
            buffer.blend(x, y, color);
        }
    });
}

/// Integer Bresenham between two pixels, inclusive.
pub fn draw_pixels(buffer: &PixelBuffer, p0: (i64, i64), p1: (i64, i64), color: Color) {
    walk(p0, p1, |x, y| buffer.blend(x, y, color));
}

/// Visit every pixel of the 8-connected line `p0`-`p1` once.
fn walk(p0: (i64, i64), p1: (i64, i64), mut visit: impl FnMut(i64, i64)) {
    let ((x0, y0), (x1, y1)) = (p0, p1);
    if x0 == x1 {
        // Vertical
        for y in y0.min(y1)..=y0.max(y1) {
            visit(x0, y);
        }
        return;
    }
    if y0 == y1 {
        // Horizontal
        for x in x0.min(x1)..=x0.max(x1) {
            visit(x, y0);
        }
        return;
    }

    // Walk left to right
    let ((mut x, mut y), (xe, ye)) = if x0 <= x1 { ((x0, y0), (x1, y1)) } else { ((x1, y1), (x0, y0)) };
    let dx = xe - x;
    let dy = -(ye - y).abs();
    let sy = if y < ye { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        visit(x, y);
        if x == xe && y == ye {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += 1;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
