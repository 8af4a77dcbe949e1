//! Default colors and chunking parameters

use std::f64::consts::FRAC_PI_4;

use crate::types::Color;

pub const BACKGROUND: Color = Color::WHITE;
pub const RELATION: Color = Color::BLACK;
pub const AXIS: Color = Color::RED;
pub const GRID: Color = Color::LIGHT_GRAY;

/// Largest canvas, in pixels, a scale may produce
pub const MAX_PIXELS: usize = 1 << 28;
/// Closest spacing between grid lines, in pixels
pub const MIN_GRID_SPACING: f64 = 4.0;

/// Side of a square raster chunk, and width of an explicit-tracer chunk, in pixels
pub const CHUNK_SIZE: u32 = 64;
/// Angular width of one polar-tracer chunk
pub const ANGLE_CHUNK: f64 = FRAC_PI_4;
/// Steps per angular chunk
pub const ANGLE_STEPS: u32 = 100;
