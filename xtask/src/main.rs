use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use relplot::{Area, Color, Library, PlotItem, PlotJob, render_job};
use std::fs;

/// Every gallery image covers the same viewport
const GALLERY_VIEWPORT: (f64, f64, f64, f64) = (-5.0, 5.0, 5.0, -5.0);
const GALLERY_SCALE: f64 = 60.0;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo xtask <command>");
        eprintln!("Commands:");
        eprintln!("  gallery [FILE]    Render every plot listed in FILE (default demos/gallery.txt)");
        std::process::exit(1);
    }

    match args[1].as_str() {
        "gallery" => gallery(args.get(2).map(Utf8PathBuf::from)),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            std::process::exit(1);
        }
    }
}

fn workspace_root() -> Utf8PathBuf {
    let manifest_dir = Utf8Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir.parent().unwrap_or(manifest_dir).to_owned()
}

/// One `NAME | EXPR | #COLOR` line; the color is optional.
#[derive(Debug)]
struct Entry {
    name: String,
    expression: String,
    color: Option<Color>,
}

fn parse_gallery(text: &str) -> Result<Vec<Entry>, String> {
    let mut entries = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        let (name, expression, color) = match fields[..] {
            [name, expression] => (name, expression, None),
            [name, expression, color] => (name, expression, Some(color)),
            _ => return Err(format!("line {}: expected `NAME | EXPR | #COLOR`", n + 1)),
        };
        let color = color
            .map(|c| c.parse::<Color>().map_err(|e| format!("line {}: {}", n + 1, e)))
            .transpose()?;
        entries.push(Entry {
            name: name.to_string(),
            expression: expression.to_string(),
            color,
        });
    }
    Ok(entries)
}

fn gallery(file: Option<Utf8PathBuf>) {
    let root = workspace_root();
    let file = file.unwrap_or_else(|| root.join("demos/gallery.txt"));
    let output_dir = root.join("target/gallery");

    let text = fs::read_to_string(&file).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", file, e);
        std::process::exit(1);
    });
    let entries = parse_gallery(&text).unwrap_or_else(|e| {
        eprintln!("{}: {}", file, e);
        std::process::exit(1);
    });
    fs::create_dir_all(&output_dir).expect("Failed to create output directory");

    let (x0, y0, x1, y1) = GALLERY_VIEWPORT;
    let area = Area::try_new(x0, y0, x1, y1).expect("gallery viewport is valid");
    let library = Library::standard();

    let failures: Vec<String> = entries
        .par_iter()
        .filter_map(|entry| {
            let mut item = PlotItem::new(&entry.expression);
            item.color = entry.color;
            let job = PlotJob::new(area, GALLERY_SCALE).item(item);
            let path = output_dir.join(format!("{}.png", entry.name));

            let result = render_job(&job, &library).and_then(|canvas| canvas.save_png(&path));
            match result {
                Ok(()) => {
                    eprintln!("Rendered {}", path);
                    None
                }
                Err(e) => Some(format!("{} ({}): {}", entry.name, entry.expression, e)),
            }
        })
        .collect();

    println!("Rendered {} of {} plots into {}", entries.len() - failures.len(), entries.len(), output_dir);
    if !failures.is_empty() {
        for failure in &failures {
            eprintln!("FAILED {}", failure);
        }
        std::process::exit(1);
    }
}
