//! Rasterize mathematical relations over a rectangular viewport.
//!
//! Expressions such as `y == x^2`, `r == 2` or `x^2 + y^2 == 1` are parsed,
//! classified into a [`Relation`] and drawn onto a [`Canvas`] by chunked,
//! parallel passes. Finished canvases export to PNG.

use pest_derive::Parser;

pub mod ast;
pub mod calculus;
pub mod classify;
pub mod errors;
pub mod eval;
pub mod library;
pub mod log;
pub mod parse;
pub mod relation;
pub mod render;
pub mod shapes;
pub mod transform;
pub mod types;

pub use classify::classify;
pub use errors::{ClassifyError, Error, EvalError, ParseError, RenderError, ValidationError};
pub use eval::{Bindings, Expression, PointBindings, Value};
pub use library::Library;
pub use parse::parse_viewport;
pub use relation::{Relation, RelationKind};
pub use render::{CancelToken, Canvas, RenderOptions, Style};
pub use transform::Transform;
pub use types::{Area, Color, Coord, Scale};

#[derive(Parser)]
#[grammar = "expr.pest"]
pub struct ExprParser;

/// One expression in a plot, optionally with its own color.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotItem {
    pub expression: String,
    pub color: Option<Color>,
}

impl PlotItem {
    pub fn new(expression: impl Into<String>) -> PlotItem {
        PlotItem { expression: expression.into(), color: None }
    }

    pub fn with_color(mut self, color: Color) -> PlotItem {
        self.color = Some(color);
        self
    }
}

/// Everything needed to produce one image.
#[derive(Debug, Clone)]
pub struct PlotJob {
    pub area: Area,
    /// Pixels per coordinate unit. Validated by [`render_job`].
    pub scale: f64,
    pub style: Style,
    pub options: RenderOptions,
    pub grid: bool,
    pub items: Vec<PlotItem>,
}

impl PlotJob {
    /// A job with the default style and options, grid on, and no items.
    pub fn new(area: Area, scale: f64) -> PlotJob {
        PlotJob {
            area,
            scale,
            style: Style::default(),
            options: RenderOptions::default(),
            grid: true,
            items: Vec::new(),
        }
    }

    pub fn item(mut self, item: PlotItem) -> PlotJob {
        self.items.push(item);
        self
    }
}

/// Render a whole job.
///
/// The scale and every expression are checked before anything is drawn, so
/// a job either fails with its first fatal error or produces a complete
/// canvas. Items are drawn in order over the grid.
pub fn render_job(job: &PlotJob, library: &Library) -> Result<Canvas, Error> {
    let mut canvas = Canvas::from_raw_scale(job.area, job.scale, job.style)?.with_options(job.options.clone());

    let relations = job
        .items
        .iter()
        .map(|item| {
            let relation = classify(&item.expression, library)?;
            Ok((relation, item.color.unwrap_or(job.style.relation)))
        })
        .collect::<Result<Vec<_>, ClassifyError>>()?;

    log::debug!(items = relations.len(), grid = job.grid, "render job");
    if job.grid {
        canvas.draw_grid();
    }
    for (relation, color) in &relations {
        canvas.draw(relation, *color)?;
    }
    Ok(canvas)
}
