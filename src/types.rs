//! Numeric and geometric primitives: coordinates, viewports, scale, colors.
//!
//! Every value here is `Copy` and immutable; operations return new values.
//! User-provided numbers enter through `try_*` constructors that reject
//! NaN and infinities.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use glam::{DVec2, dvec2};
use num_complex::Complex64;

use crate::errors::{ColorParseError, ValidationError};

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is zero when non-zero required
    Zero,
    /// Value is negative when positive required
    Negative,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Zero => write!(f, "value is zero"),
            NumericError::Negative => write!(f, "value is negative"),
        }
    }
}

impl std::error::Error for NumericError {}

// ============================================================================
// Coord
// ============================================================================

/// A point in coordinate (math) space, y pointing up.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[repr(transparent)]
pub struct Coord(DVec2);

impl Coord {
    pub const ORIGIN: Coord = Coord(DVec2::ZERO);

    #[inline]
    pub const fn new(x: f64, y: f64) -> Coord {
        Coord(dvec2(x, y))
    }

    /// Build a coordinate from a radius and an angle in radians.
    #[inline]
    pub fn from_polar(r: f64, theta: f64) -> Coord {
        let (sin, cos) = theta.sin_cos();
        Coord::new(r * cos, r * sin)
    }

    #[inline]
    pub fn from_complex(z: Complex64) -> Coord {
        Coord::new(z.re, z.im)
    }

    #[inline]
    pub fn x(self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(self) -> f64 {
        self.0.y
    }

    #[inline]
    pub fn to_complex(self) -> Complex64 {
        Complex64::new(self.0.x, self.0.y)
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn dist(self, other: Coord) -> f64 {
        self.0.distance(other.0)
    }

    #[inline]
    pub fn dist_origin(self) -> f64 {
        self.0.length()
    }

    #[inline]
    pub fn within_dist(self, other: Coord, dist: f64) -> bool {
        self.dist(other) <= dist
    }

    /// Polar form `(r, theta)` with theta normalized to `[0, 2π)`.
    pub fn polar(self) -> (f64, f64) {
        let r = self.dist_origin();
        let mut theta = self.0.y.atan2(self.0.x);
        if theta < 0.0 {
            theta += std::f64::consts::TAU;
        }
        (r, theta)
    }

    /// Rotate counter-clockwise about the origin.
    pub fn rotate(self, theta: f64) -> Coord {
        let (r, t) = self.polar();
        Coord::from_polar(r, t + theta)
    }

    /// Rotate counter-clockwise about `pivot`.
    pub fn rotate_about(self, theta: f64, pivot: Coord) -> Coord {
        (self - pivot).rotate(theta) + pivot
    }

    /// Mirror across the line y = x.
    #[inline]
    pub fn swap(self) -> Coord {
        Coord::new(self.0.y, self.0.x)
    }

    /// Per-axis division.
    #[inline]
    pub fn div_axes(self, sx: f64, sy: f64) -> Coord {
        Coord(self.0 / dvec2(sx, sy))
    }

    /// Both components are finite (not NaN, not infinite).
    #[inline]
    pub fn is_valid(self) -> bool {
        self.0.is_finite()
    }
}

impl From<DVec2> for Coord {
    fn from(v: DVec2) -> Coord {
        Coord(v)
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Coord {
        Coord::new(x, y)
    }
}

impl Add for Coord {
    type Output = Coord;
    fn add(self, rhs: Coord) -> Coord { Coord(self.0 + rhs.0) }
}
impl Sub for Coord {
    type Output = Coord;
    fn sub(self, rhs: Coord) -> Coord { Coord(self.0 - rhs.0) }
}
impl Mul<f64> for Coord {
    type Output = Coord;
    fn mul(self, rhs: f64) -> Coord { Coord(self.0 * rhs) }
}
impl Div<f64> for Coord {
    type Output = Coord;
    fn div(self, rhs: f64) -> Coord { Coord(self.0 / rhs) }
}
impl Neg for Coord {
    type Output = Coord;
    fn neg(self) -> Coord { Coord(-self.0) }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0.x, self.0.y)
    }
}

// ============================================================================
// Area
// ============================================================================

/// Rectangular viewport in coordinate space.
///
/// `top_left` has the lower x and the higher y; `bottom_right` the opposite.
/// Containment is half-open: x in `[left, right)`, y in `(bottom, top]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Area {
    top_left: Coord,
    bottom_right: Coord,
}

impl Area {
    /// Create an area from its top-left `(x0, y0)` and bottom-right `(x1, y1)` corners.
    pub fn try_new(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<Area, ValidationError> {
        Area::from_corners(Coord::new(x0, y0), Coord::new(x1, y1))
    }

    pub fn from_corners(top_left: Coord, bottom_right: Coord) -> Result<Area, ValidationError> {
        if !top_left.is_valid() || !bottom_right.is_valid() {
            return Err(ValidationError::NonFiniteCorner {
                top_left: top_left.to_string(),
                bottom_right: bottom_right.to_string(),
            });
        }
        if bottom_right.x() < top_left.x() || bottom_right.y() > top_left.y() {
            return Err(ValidationError::MisorderedCorners {
                top_left: top_left.to_string(),
                bottom_right: bottom_right.to_string(),
            });
        }
        // Finite corners can still be too far apart to subtract
        if !(bottom_right.0 - top_left.0).is_finite() {
            return Err(ValidationError::NonFiniteExtent {
                top_left: top_left.to_string(),
                bottom_right: bottom_right.to_string(),
            });
        }
        Ok(Area { top_left, bottom_right })
    }

    #[inline]
    pub fn top_left(&self) -> Coord {
        self.top_left
    }

    #[inline]
    pub fn bottom_right(&self) -> Coord {
        self.bottom_right
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.top_left.x()
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.bottom_right.x()
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.top_left.y()
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.bottom_right.y()
    }

    pub fn width(&self) -> f64 {
        self.right() - self.left()
    }

    pub fn height(&self) -> f64 {
        self.top() - self.bottom()
    }

    pub fn size(&self) -> Coord {
        Coord::new(self.width(), self.height())
    }

    pub fn center(&self) -> Coord {
        Coord((self.top_left.0 + self.bottom_right.0) * 0.5)
    }

    pub fn contains(&self, c: Coord) -> bool {
        self.left() <= c.x() && c.x() < self.right() && self.top() >= c.y() && c.y() > self.bottom()
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.top_left, self.bottom_right)
    }
}

// ============================================================================
// Scale
// ============================================================================

/// Pixels per coordinate unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale(f64);

impl Scale {
    /// Create a Scale with validation (rejects NaN, infinite, zero, negative)
    pub fn try_new(pixels_per_unit: f64) -> Result<Scale, NumericError> {
        if pixels_per_unit.is_nan() {
            Err(NumericError::NaN)
        } else if pixels_per_unit.is_infinite() {
            Err(NumericError::Infinite)
        } else if pixels_per_unit == 0.0 {
            Err(NumericError::Zero)
        } else if pixels_per_unit < 0.0 {
            Err(NumericError::Negative)
        } else {
            Ok(Scale(pixels_per_unit))
        }
    }

    #[inline]
    pub fn raw(self) -> f64 {
        self.0
    }

    /// Pixel extent of a coordinate length, truncated.
    pub fn pixels(self, length: f64) -> u32 {
        let px = (length * self.0).trunc();
        if px <= 0.0 {
            0
        } else if px >= u32::MAX as f64 {
            u32::MAX
        } else {
            px as u32
        }
    }
}

// ============================================================================
// Color
// ============================================================================

/// Straight (non-premultiplied) 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const RED: Color = Color::rgb(0xFF, 0x00, 0x00);
    pub const LIGHT_GRAY: Color = Color::rgb(0xE0, 0xE0, 0xE0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    #[inline]
    pub fn is_opaque(self) -> bool {
        self.a == 0xFF
    }

    /// Pack into `0xRRGGBBAA`.
    #[inline]
    pub const fn pack(self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }

    #[inline]
    pub const fn unpack(v: u32) -> Color {
        let [r, g, b, a] = v.to_be_bytes();
        Color { r, g, b, a }
    }

    /// Channels widened to 16 bits (`c * 257`), alpha last.
    #[inline]
    pub fn to_rgba16(self) -> [u32; 4] {
        [self.r, self.g, self.b, self.a].map(|c| c as u32 * 257)
    }

    pub fn to_hex(self) -> String {
        if self.is_opaque() {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Parse `#RRGGBB` or `#RRGGBBAA`.
    fn from_str(s: &str) -> Result<Color, ColorParseError> {
        let invalid = || ColorParseError { input: s.to_string() };
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let alpha = if hex.len() == 8 { channel(6)? } else { 0xFF };
        Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
