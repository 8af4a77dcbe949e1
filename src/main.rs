//! `relplot [-o out.png] [--no-grid] "{(x0, y0), (x1, y1)}" SCALE EXPR [#RRGGBB]...`

use std::path::PathBuf;

use miette::{Diagnostic, IntoDiagnostic};
use relplot::{Color, Library, PlotItem, PlotJob, parse_viewport, render_job};
use thiserror::Error;

const DEFAULT_OUTPUT: &str = "out.png";

#[derive(Error, Diagnostic, Debug, PartialEq)]
enum UsageError {
    #[error("missing {what}")]
    #[diagnostic(code(relplot::usage::missing), help("relplot [-o FILE] [--no-grid] VIEWPORT SCALE EXPR [#RRGGBB]..."))]
    Missing { what: &'static str },

    #[error("scale is not a number: {input}")]
    #[diagnostic(code(relplot::usage::scale))]
    Scale { input: String },

    #[error("color {input} does not follow an expression")]
    #[diagnostic(code(relplot::usage::stray_color), help("each color token applies to the expression before it"))]
    StrayColor { input: String },
}

#[derive(Debug)]
struct Args {
    output: PathBuf,
    job: PlotJob,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> miette::Result<Args> {
        let mut output = PathBuf::from(DEFAULT_OUTPUT);
        let mut grid = true;
        let mut positional = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-o" | "--output" => {
                    output = args.next().ok_or(UsageError::Missing { what: "output path after -o" })?.into();
                }
                "--no-grid" => grid = false,
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let viewport = positional.next().ok_or(UsageError::Missing { what: "viewport" })?;
        let area = parse_viewport(&viewport)?;
        let scale_text = positional.next().ok_or(UsageError::Missing { what: "scale" })?;
        let scale: f64 = scale_text
            .trim()
            .parse()
            .map_err(|_| UsageError::Scale { input: scale_text.clone() })?;

        let mut job = PlotJob::new(area, scale);
        job.grid = grid;

        for token in positional {
            if token.starts_with('#') {
                let color: Color = token.parse()?;
                match job.items.last_mut() {
                    Some(item) if item.color.is_none() => item.color = Some(color),
                    _ => return Err(UsageError::StrayColor { input: token }.into()),
                }
            } else {
                job.items.push(PlotItem::new(token));
            }
        }

        Ok(Args { output, job })
    }
}

fn main() -> miette::Result<()> {
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    let canvas = render_job(&args.job, &Library::standard())?;

    // Encode fully in memory first so a failed encode leaves no partial file
    let mut png = std::io::Cursor::new(Vec::new());
    canvas
        .to_image()
        .write_to(&mut png, image::ImageFormat::Png)
        .map_err(relplot::Error::from)?;
    std::fs::write(&args.output, png.into_inner()).into_diagnostic()?;
    Ok(())
}
