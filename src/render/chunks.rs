//! Work partitioning and the fan-out/fan-in join
//!
//! Every pass splits its domain into independent chunks, runs one rayon task
//! per chunk, and returns only once all of them have finished.

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::errors::RenderError;
use crate::log::debug;

/// Cooperative cancellation flag shared between a caller and a render.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Half-open pixel rectangle `[x0, x1) × [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Tile {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Square tiles of side `size` covering `width × height`; edge tiles are
/// smaller.
pub fn tiles(width: u32, height: u32, size: u32) -> Vec<Tile> {
    let size = size.max(1);
    let mut out = Vec::new();
    for x0 in (0..width).step_by(size as usize) {
        for y0 in (0..height).step_by(size as usize) {
            out.push(Tile {
                x0,
                y0,
                x1: (x0 + size).min(width),
                y1: (y0 + size).min(height),
            });
        }
    }
    out
}

/// Column ranges `start..end` of width `size` over `0..len`. Consecutive
/// ranges share their boundary: one range's `end` is the next one's `start`.
pub fn spans(len: u32, size: u32) -> Vec<Range<u32>> {
    let size = size.max(1);
    (0..len).step_by(size as usize).map(|start| start..(start + size).min(len)).collect()
}

/// Angular chunks of width `chunk` covering `[0, 2π)`.
pub fn angle_chunks(chunk: f64) -> Vec<Range<f64>> {
    use std::f64::consts::TAU;

    if chunk.is_nan() || chunk <= 0.0 {
        return vec![0.0..TAU];
    }
    let count = (TAU / chunk).ceil() as usize;
    (0..count)
        .map(|i| {
            let start = i as f64 * chunk;
            start..(start + chunk).min(TAU)
        })
        .filter(|r| r.start < TAU)
        .collect()
}

/// Run `task` once per unit in parallel and wait for all of them.
///
/// With a token, units that start after cancellation are skipped and the
/// call reports [`RenderError::Cancelled`]; pixels already written stay.
pub fn fan_out<T, F>(units: &[T], cancel: Option<&CancelToken>, task: F) -> Result<(), RenderError>
where
    T: Sync,
    F: Fn(&T) + Sync + Send,
{
    debug!(chunks = units.len(), "fan out");
    units.par_iter().try_for_each(|unit| {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(RenderError::Cancelled);
        }
        task(unit);
        Ok(())
    })?;

    match cancel {
        Some(token) if token.is_cancelled() => {
            debug!("render cancelled");
            Err(RenderError::Cancelled)
        }
        _ => Ok(()),
    }
}
