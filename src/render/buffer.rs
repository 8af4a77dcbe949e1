//! Shared pixel storage and the "over" compositor
//!
//! Pixels are packed RGBA8 in atomic cells so chunk tasks can blend through a
//! shared reference. Disjoint tasks never contend; where two tasks do touch
//! the same pixel (tracer seams, complex-map collisions) the compare-and-swap
//! loop keeps every write whole.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::types::Color;

const MAX16: u64 = 0xFFFF;

/// Composite `src` over `dst`.
///
/// Both colors are widened to 16 bits per channel before blending and the
/// result is rounded back to 8 bits once, so repeated translucent draws do
/// not drift.
pub fn blend_over(dst: Color, src: Color) -> Color {
    match src.a {
        0 => return dst,
        255 => return src,
        _ => {}
    }

    let [sr, sg, sb, sa] = src.to_rgba16().map(u64::from);
    let [dr, dg, db, da] = dst.to_rgba16().map(u64::from);

    let inv = MAX16 - sa;
    // Premultiplied, scaled by MAX16
    let out_a = sa * MAX16 + da * inv;
    if out_a == 0 {
        return Color::TRANSPARENT;
    }
    let channel = |s: u64, d: u64| -> u8 {
        let c16 = (s * sa * MAX16 + d * da * inv + out_a / 2) / out_a;
        to_u8(c16)
    };

    Color::rgba(
        channel(sr, dr),
        channel(sg, dg),
        channel(sb, db),
        to_u8((out_a + MAX16 / 2) / MAX16),
    )
}

fn to_u8(c16: u64) -> u8 {
    ((c16.min(MAX16) + 128) / 257) as u8
}

/// Fixed-size RGBA pixel grid, row-major.
pub struct PixelBuffer {
    width: u32,
    height: u32,
    cells: Vec<AtomicU32>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, fill: Color) -> PixelBuffer {
        let len = width as usize * height as usize;
        let packed = fill.pack();
        PixelBuffer {
            width,
            height,
            cells: (0..len).map(|_| AtomicU32::new(packed)).collect(),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: i64, y: i64) -> Option<Color> {
        self.index(x, y).map(|i| Color::unpack(self.cells[i].load(Ordering::Relaxed)))
    }

    /// Overwrite a pixel. Out-of-range writes are dropped.
    pub fn set(&self, x: i64, y: i64, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.cells[i].store(color.pack(), Ordering::Relaxed);
        }
    }

    /// Composite `color` over a pixel. Out-of-range writes are dropped.
    pub fn blend(&self, x: i64, y: i64, color: Color) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if color.a == 0 {
            return;
        }
        let _ = self.cells[i].fetch_update(Ordering::Relaxed, Ordering::Relaxed, |old| {
            Some(blend_over(Color::unpack(old), color).pack())
        });
    }

    /// Row-major iterator over all pixels.
    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.cells.iter().map(|c| Color::unpack(c.load(Ordering::Relaxed)))
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.colors().flat_map(|c| [c.r, c.g, c.b, c.a]).collect()
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
