//! Raster rendering of relations
//!
//! This module is organized into submodules:
//! - `defaults`: default colors and chunk sizes
//! - `buffer`: atomic pixel storage and the "over" compositor
//! - `line`: clipped Bresenham segments
//! - `chunks`: work partitioning, the parallel join, cancellation
//! - `raster`: per-pixel passes (predicates, implicit relations, complex maps)
//! - `trace`: parametric passes (explicit, polar, slope fields)

pub mod buffer;
pub mod chunks;
pub mod defaults;
pub mod line;
pub mod raster;
pub mod trace;

use std::path::Path;

use glam::DVec2;

pub use buffer::{PixelBuffer, blend_over};
pub use chunks::CancelToken;

use crate::errors::{Error, EvalError, RenderError, ValidationError};
use crate::log::debug;
use crate::relation::Relation;
use crate::types::{Area, Color, Coord, Scale};

/// Colors used for everything that is not given an explicit color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub background: Color,
    pub relation: Color,
    pub axis: Color,
    pub grid: Color,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            background: defaults::BACKGROUND,
            relation: defaults::RELATION,
            axis: defaults::AXIS,
            grid: defaults::GRID,
        }
    }
}

/// How passes are split into parallel work.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Square tile side for per-pixel passes, and column span for the
    /// explicit tracer
    pub chunk_size: u32,
    /// Angular width of one polar chunk, radians
    pub angle_chunk: f64,
    /// Steps per angular chunk
    pub angle_steps: u32,
    pub cancel: Option<CancelToken>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            chunk_size: defaults::CHUNK_SIZE,
            angle_chunk: defaults::ANGLE_CHUNK,
            angle_steps: defaults::ANGLE_STEPS,
            cancel: None,
        }
    }
}

/// A viewport mapped onto a pixel buffer.
///
/// Pixel `(0, 0)` is the top-left corner of the viewport; pixel rows grow
/// downwards while y grows upwards.
#[derive(Debug)]
pub struct Canvas {
    area: Area,
    scale: Scale,
    width: u32,
    height: u32,
    buffer: PixelBuffer,
    style: Style,
    options: RenderOptions,
}

impl Canvas {
    /// A canvas of `area.width() * scale` by `area.height() * scale` pixels,
    /// filled with the default background.
    pub fn new(area: Area, scale: Scale) -> Result<Canvas, ValidationError> {
        Canvas::with_style(area, scale, Style::default())
    }

    pub fn with_style(area: Area, scale: Scale, style: Style) -> Result<Canvas, ValidationError> {
        let width = scale.pixels(area.width());
        let height = scale.pixels(area.height());
        if width == 0 || height == 0 {
            return Err(ValidationError::EmptyCanvas { width, height });
        }
        match (width as usize).checked_mul(height as usize) {
            Some(pixels) if pixels <= defaults::MAX_PIXELS => {}
            _ => {
                return Err(ValidationError::CanvasTooLarge { width, height, limit: defaults::MAX_PIXELS });
            }
        }
        debug!(width, height, %area, "new canvas");
        Ok(Canvas {
            area,
            scale,
            width,
            height,
            buffer: PixelBuffer::new(width, height, style.background),
            style,
            options: RenderOptions::default(),
        })
    }

    /// Validate a raw scale and build a canvas.
    pub fn from_raw_scale(area: Area, scale: f64, style: Style) -> Result<Canvas, ValidationError> {
        let scale = Scale::try_new(scale).map_err(|reason| ValidationError::InvalidScale { value: scale, reason })?;
        Canvas::with_style(area, scale, style)
    }

    pub fn with_options(mut self, options: RenderOptions) -> Canvas {
        self.options = options;
        self
    }

    pub fn area(&self) -> &Area {
        &self.area
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    // ------------------------------------------------------------------
    // Mapping
    // ------------------------------------------------------------------

    /// Coordinate of the top-left corner of pixel `(i, j)`. Indices outside
    /// the canvas extrapolate linearly.
    pub fn pixel_to_coord(&self, i: i64, j: i64) -> Coord {
        let step = self.pixel_size();
        Coord::new(
            self.area.left() + i as f64 * step.x,
            self.area.top() - j as f64 * step.y,
        )
    }

    /// Pixel containing `c`. Truncates toward the top-left pixel corner.
    pub fn coord_to_pixel(&self, c: Coord) -> (i64, i64) {
        let p = self.to_pixel_space(c).floor();
        (p.x as i64, p.y as i64)
    }

    /// Width and height of one pixel in coordinate units.
    pub fn pixel_size(&self) -> DVec2 {
        DVec2::new(
            self.area.width() / self.width as f64,
            self.area.height() / self.height as f64,
        )
    }

    /// Continuous pixel-space position of `c`, x right and y down.
    fn to_pixel_space(&self, c: Coord) -> DVec2 {
        DVec2::new(
            (c.x() - self.area.left()) * self.width as f64 / self.area.width(),
            (self.area.top() - c.y()) * self.height as f64 / self.area.height(),
        )
    }

    // ------------------------------------------------------------------
    // Pixel access
    // ------------------------------------------------------------------

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.buffer.get(x as i64, y as i64)
    }

    pub fn blend_pixel(&self, x: u32, y: u32, color: Color) {
        self.buffer.blend(x as i64, y as i64, color);
    }

    pub fn blend_coord(&self, c: Coord, color: Color) {
        if c.is_valid() {
            let (x, y) = self.coord_to_pixel(c);
            self.buffer.blend(x, y, color);
        }
    }

    /// Color of the pixel containing `c`, if it is on the canvas.
    pub fn color_at(&self, c: Coord) -> Option<Color> {
        if !c.is_valid() {
            return None;
        }
        let (x, y) = self.coord_to_pixel(c);
        self.buffer.get(x, y)
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    /// Segment between two coordinates. Nothing is drawn if either endpoint
    /// is not finite.
    pub fn draw_line(&self, c0: Coord, c1: Coord, color: Color) {
        if !c0.is_valid() || !c1.is_valid() {
            return;
        }
        line::draw_segment(&self.buffer, self.to_pixel_space(c0), self.to_pixel_space(c1), color);
    }

    /// Next segment of a polyline whose previous segment ended at `c0`.
    /// The pixel under `c0` is not blended again.
    pub fn draw_joined_line(&self, c0: Coord, c1: Coord, color: Color) {
        if !c0.is_valid() || !c1.is_valid() {
            return;
        }
        line::draw_joined_segment(&self.buffer, self.to_pixel_space(c0), self.to_pixel_space(c1), color);
    }

    pub fn draw_axes(&self) {
        let a = self.area;
        self.draw_line(Coord::new(0.0, a.top()), Coord::new(0.0, a.bottom()), self.style.axis);
        self.draw_line(Coord::new(a.left(), 0.0), Coord::new(a.right(), 0.0), self.style.axis);
    }

    /// Grid lines at every non-zero multiple of [`grid_step`] inside the
    /// viewport, then the axes on top.
    pub fn draw_grid(&self) {
        let a = self.area;
        let step = grid_step(self.scale);
        debug!(step, "grid");
        for x in multiples_between(a.left(), a.right(), step) {
            self.draw_line(Coord::new(x, a.top()), Coord::new(x, a.bottom()), self.style.grid);
        }
        for y in multiples_between(a.bottom(), a.top(), step) {
            self.draw_line(Coord::new(a.left(), y), Coord::new(a.right(), y), self.style.grid);
        }
        self.draw_axes();
    }

    /// Draw `relation` in `color`. Complex maps ignore the color and remap
    /// the whole canvas.
    ///
    /// Returns only after every chunk of the pass has finished.
    pub fn draw(&mut self, relation: &Relation, color: Color) -> Result<(), RenderError> {
        debug!(kind = %relation.kind(), %color, "draw");
        match relation {
            Relation::Predicate(p) => raster::predicate(self, p.as_ref(), color),
            Relation::Implicit(f) => raster::implicit(self, f.as_ref(), color),
            Relation::Explicit(f) => trace::explicit(self, f.as_ref(), color),
            Relation::Polar(f) => trace::polar(self, f.as_ref(), color),
            Relation::Complex(f) => {
                let remapped = raster::complex_map(self, f.as_ref())?;
                debug!("swapping in remapped buffer");
                self.buffer = remapped;
                Ok(())
            }
        }
    }

    /// Draw `relation` in the style's relation color.
    pub fn draw_relation(&mut self, relation: &Relation) -> Result<(), RenderError> {
        let color = self.style.relation;
        self.draw(relation, color)
    }

    /// Trace the solution of dy/dx = `slope(x, y)` through `start`, forwards
    /// and backwards, with one-pixel Euler steps.
    pub fn draw_slope_field<F>(&self, slope: F, start: Coord, color: Color) -> Result<(), RenderError>
    where
        F: Fn(Coord) -> Result<f64, EvalError> + Sync,
    {
        trace::differential(self, &slope, start, color)
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    pub fn to_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width, self.height, |x, y| {
            let c = self.pixel(x, y).unwrap_or(Color::TRANSPARENT);
            image::Rgba([c.r, c.g, c.b, c.a])
        })
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        self.to_image().save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Grid spacing in coordinate units: 1, or the smallest power of ten that
/// keeps lines at least [`defaults::MIN_GRID_SPACING`] pixels apart.
pub fn grid_step(scale: Scale) -> f64 {
    let units = defaults::MIN_GRID_SPACING / scale.raw();
    if units <= 1.0 {
        return 1.0;
    }
    10f64.powi(units.log10().ceil() as i32)
}

/// Non-zero multiples of `step` strictly between `lo` and `hi`.
fn multiples_between(lo: f64, hi: f64, step: f64) -> impl Iterator<Item = f64> {
    let first = (lo / step).floor() as i64 + 1;
    let last = (hi / step).ceil() as i64 - 1;
    (first..=last).filter(|&n| n != 0).map(move |n| n as f64 * step)
}
