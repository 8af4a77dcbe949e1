//! Error types with rich diagnostics using miette
//!
//! Parse errors carry source spans so a malformed expression points at the
//! offending token. Evaluation errors are per-sample and never fatal.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::types::NumericError;

/// Name used for expression sources in diagnostics
pub const SOURCE_NAME: &str = "<expression>";

pub(crate) fn named_source(source: &str) -> NamedSource<String> {
    NamedSource::new(SOURCE_NAME, source.to_string())
}

// ============================================================================
// Validation Errors
// ============================================================================

/// Malformed viewport or canvas parameters
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("viewport corner is not finite: {top_left} / {bottom_right}")]
    #[diagnostic(code(relplot::validation::non_finite_corner))]
    NonFiniteCorner { top_left: String, bottom_right: String },

    #[error("viewport corners are out of order: {top_left} / {bottom_right}")]
    #[diagnostic(
        code(relplot::validation::misordered_corners),
        help("give the top-left corner (lower x, higher y) first, then the bottom-right corner")
    )]
    MisorderedCorners { top_left: String, bottom_right: String },

    #[error("viewport extent overflows: {top_left} / {bottom_right}")]
    #[diagnostic(code(relplot::validation::non_finite_extent))]
    NonFiniteExtent { top_left: String, bottom_right: String },

    #[error("invalid scale {value}: {reason}")]
    #[diagnostic(
        code(relplot::validation::invalid_scale),
        help("the scale is pixels per coordinate unit and must be positive")
    )]
    InvalidScale { value: f64, reason: NumericError },

    #[error("malformed viewport: {input}")]
    #[diagnostic(
        code(relplot::validation::malformed_viewport),
        help("write the viewport as {{(x0, y0), (x1, y1)}}")
    )]
    MalformedViewport { input: String },

    #[error("canvas would be {width}x{height} pixels")]
    #[diagnostic(
        code(relplot::validation::empty_canvas),
        help("increase the scale or the viewport size")
    )]
    EmptyCanvas { width: u32, height: u32 },

    #[error("canvas would be {width}x{height} pixels, more than {limit}")]
    #[diagnostic(
        code(relplot::validation::canvas_too_large),
        help("decrease the scale or the viewport size")
    )]
    CanvasTooLarge { width: u32, height: u32, limit: usize },
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Errors that occur while parsing or type-checking expression text
#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error("syntax error: {message}")]
    #[diagnostic(code(relplot::parse::syntax))]
    Syntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("unknown function: {name}")]
    #[diagnostic(code(relplot::parse::unknown_function))]
    UnknownFunction {
        name: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("not a known function")]
        span: SourceSpan,
    },

    #[error("{name} takes {expected} argument(s), got {got}")]
    #[diagnostic(code(relplot::parse::wrong_arity))]
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("called here")]
        span: SourceSpan,
    },

    #[error("unknown variable: {name}")]
    #[diagnostic(
        code(relplot::parse::unknown_variable),
        help("available variables are x, y, r and theta")
    )]
    UnknownVariable {
        name: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("not defined")]
        span: SourceSpan,
    },

    #[error("type mismatch: expected {expected}, got {got}")]
    #[diagnostic(code(relplot::parse::type_mismatch))]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
        #[source_code]
        src: NamedSource<String>,
        #[label("this expression is a {got}")]
        span: SourceSpan,
    },
}

/// An equation needs exactly one `==`
#[derive(Error, Diagnostic, Debug)]
#[error("expected exactly one `==`, found {found}")]
#[diagnostic(
    code(relplot::parse::equality_count),
    help("write the relation as `left == right`")
)]
pub struct EqualityCountError {
    pub found: usize,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("in this expression")]
    pub span: SourceSpan,
}

/// Why an expression could not be turned into a relation
#[derive(Error, Diagnostic, Debug)]
pub enum ClassifyError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    EqualityCount(#[from] EqualityCountError),
}

// ============================================================================
// Evaluation Errors
// ============================================================================

/// A single sample failed to evaluate. Renderers skip the sample.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("undefined variable: {name}")]
    #[diagnostic(code(relplot::eval::undefined_variable))]
    UnknownVariable { name: String },

    #[error("{function}({argument}) is outside the domain")]
    #[diagnostic(code(relplot::eval::domain))]
    Domain { function: &'static str, argument: f64 },

    #[error("result is not finite: {value}")]
    #[diagnostic(code(relplot::eval::non_finite))]
    NonFinite { value: f64 },

    #[error("type mismatch: expected {expected}, got {got}")]
    #[diagnostic(code(relplot::eval::type_mismatch))]
    TypeMismatch { expected: &'static str, got: &'static str },
}

// ============================================================================
// Render Errors
// ============================================================================

/// Errors that occur during rendering
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("render cancelled")]
    #[diagnostic(code(relplot::render::cancelled))]
    Cancelled,
}

/// A color token that is not `#RRGGBB` or `#RRGGBBAA`
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("invalid color: {input}")]
#[diagnostic(code(relplot::color::invalid), help("colors are written #RRGGBB or #RRGGBBAA"))]
pub struct ColorParseError {
    pub input: String,
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Any error a render job can produce
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Color(#[from] ColorParseError),

    #[error("failed to encode image")]
    #[diagnostic(code(relplot::image))]
    Image(#[from] image::ImageError),
}
