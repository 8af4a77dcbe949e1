//! End-to-end rendering properties on real canvases.

use std::collections::HashSet;

use relplot::render::defaults;
use relplot::shapes;
use relplot::{
    Area, CancelToken, Canvas, ClassifyError, Color, Coord, Error, Library, PlotItem, PlotJob, RelationKind,
    RenderError, RenderOptions, Scale, ValidationError, classify, render_job,
};

fn viewport() -> Area {
    Area::try_new(-5.0, 5.0, 5.0, -5.0).unwrap()
}

/// 1000×1000 canvas over (−5, 5)–(5, −5), no grid.
fn canvas() -> Canvas {
    Canvas::new(viewport(), Scale::try_new(100.0).unwrap()).unwrap()
}

fn render(expression: &str) -> Canvas {
    let mut canvas = canvas();
    let relation = classify(expression, &Library::standard()).unwrap();
    canvas.draw_relation(&relation).unwrap();
    canvas
}

fn drawn(canvas: &Canvas) -> HashSet<(i64, i64)> {
    let mut out = HashSet::new();
    for y in 0..canvas.height() {
        for x in 0..canvas.width() {
            if canvas.pixel(x, y) != Some(defaults::BACKGROUND) {
                out.insert((x as i64, y as i64));
            }
        }
    }
    out
}

fn near(set: &HashSet<(i64, i64)>, (x, y): (i64, i64), tolerance: i64) -> bool {
    (-tolerance..=tolerance).any(|dx| (-tolerance..=tolerance).any(|dy| set.contains(&(x + dx, y + dy))))
}

// =============================================================================
// Mapping
// =============================================================================

#[test]
fn mapping_is_invertible_within_one_pixel() {
    let c = canvas();
    let step = c.pixel_size();
    for &(x, y) in &[(0.0, 0.0), (-4.99, 4.99), (3.1415, -2.718), (4.999, -4.999), (-1.23, 0.456)] {
        let p = Coord::new(x, y);
        let (i, j) = c.coord_to_pixel(p);
        let back = c.pixel_to_coord(i, j);
        assert!((back.x() - x).abs() <= step.x, "x {} -> {}", x, back.x());
        assert!((back.y() - y).abs() <= step.y, "y {} -> {}", y, back.y());
    }
}

#[test]
fn viewport_is_half_open() {
    let area = viewport();
    assert!(area.contains(Coord::new(0.0, 0.0)));
    assert!(area.contains(Coord::new(-5.0, 5.0)));
    assert!(!area.contains(Coord::new(5.0, 5.0)));
    assert!(!area.contains(Coord::new(0.0, -5.0)));
}

// =============================================================================
// Classification
// =============================================================================

#[test]
fn classifier_picks_cheapest_form() {
    let lib = Library::standard();
    assert_eq!(classify("y==x^2", &lib).unwrap().kind(), RelationKind::Explicit);
    assert_eq!(classify("r==2", &lib).unwrap().kind(), RelationKind::Polar);
    assert_eq!(classify("x^2+y^2==1", &lib).unwrap().kind(), RelationKind::Implicit);
    assert!(matches!(classify("x==y==1", &lib), Err(ClassifyError::EqualityCount(e)) if e.found == 2));
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn circle_of_radius_two_is_a_closed_ring() {
    let c = render("x^2+y^2==4");
    assert_eq!((c.width(), c.height()), (1000, 1000));

    let pixels = drawn(&c);
    assert!(!pixels.is_empty());
    for &(x, y) in &pixels {
        let d = (((x - 500).pow(2) + (y - 500).pow(2)) as f64).sqrt();
        assert!((d - 200.0).abs() <= 2.0, "pixel ({}, {}) is {} px from center", x, y, d);
    }

    // No gaps around the ring
    for step in 0..720 {
        let theta = step as f64 * std::f64::consts::TAU / 720.0;
        let x = (500.0 + 200.0 * theta.cos()).round() as i64;
        let y = (500.0 - 200.0 * theta.sin()).round() as i64;
        assert!(near(&pixels, (x, y), 2), "gap at θ = {}", theta);
    }
}

#[test]
fn polar_and_implicit_rings_agree() {
    let implicit = drawn(&render("x^2+y^2==4"));
    let polar = drawn(&render("r==2"));
    for &p in &polar {
        assert!(near(&implicit, p, 2), "polar pixel {:?} has no implicit neighbor", p);
    }
}

#[test]
fn implicit_and_explicit_circles_overlap() {
    let implicit = drawn(&render("x^2+y^2==1"));
    let explicit = drawn(&render("y==sqrt(1-x^2)"));
    assert!(!explicit.is_empty());

    // Upper half, away from the vertical tangents at x = ±1
    let inside = |&(x, y): &(i64, i64)| (410..=590).contains(&x) && y < 490;
    for &p in explicit.iter().filter(|p| inside(p)) {
        assert!(near(&implicit, p, 1), "explicit pixel {:?} has no implicit neighbor", p);
    }
    for &p in implicit.iter().filter(|p| inside(p)) {
        assert!(near(&explicit, p, 2), "implicit pixel {:?} has no explicit neighbor", p);
    }
}

#[test]
fn reciprocal_leaves_pole_column_undrawn() {
    let c = render("1/x==y");
    // x = 0 is column 500
    for y in 0..c.height() {
        assert_eq!(c.pixel(500, y), Some(defaults::BACKGROUND), "row {}", y);
    }
    // The branches are still drawn: y = 1/x = 1 at x = 1 is (600, 400)
    assert!(near(&drawn(&c), (600, 400), 1));
    assert!(near(&drawn(&c), (400, 600), 1));
}

#[test]
fn partial_domain_is_skipped() {
    let c = render("y==sqrt(x)");
    let pixels = drawn(&c);
    assert!(pixels.iter().all(|&(x, _)| x >= 499));
    assert!(near(&pixels, (900, 300), 1));
}

#[test]
fn predicate_fills_region() {
    let c = render("x < 0 && y > 0");
    assert_eq!(c.color_at(Coord::new(-2.0, 2.0)), Some(Color::BLACK));
    assert_eq!(c.color_at(Coord::new(2.0, 2.0)), Some(defaults::BACKGROUND));
    assert_eq!(c.color_at(Coord::new(-2.0, -2.0)), Some(defaults::BACKGROUND));
}

#[test]
fn mandelbrot_contains_its_main_cardioid() {
    let area = Area::try_new(-2.0, 1.5, 1.0, -1.5).unwrap();
    let mut c = Canvas::new(area, Scale::try_new(20.0).unwrap()).unwrap();
    c.draw(&shapes::mandelbrot(), Color::BLACK).unwrap();
    assert_eq!(c.color_at(Coord::new(-0.5, 0.0)), Some(Color::BLACK));
    assert_eq!(c.color_at(Coord::new(0.9, 0.9)), Some(Color::WHITE));
}

#[test]
fn shifted_circle_matches_its_equation() {
    let mut shifted = canvas();
    shifted
        .draw(&shapes::circle_at(1.0, Coord::new(2.0, -1.0)), Color::BLACK)
        .unwrap();
    let expected = drawn(&render("(x-2)^2+(y+1)^2==1"));
    let got = drawn(&shifted);
    for &p in &got {
        assert!(near(&expected, p, 1), "pixel {:?}", p);
    }
    assert!(got.len() * 10 >= expected.len() * 9);
}

// =============================================================================
// Compositing
// =============================================================================

#[test]
fn opaque_transparent_and_idempotent_draws() {
    let c = canvas();
    let blue = Color::rgb(0, 0, 255);

    c.blend_pixel(10, 10, blue);
    assert_eq!(c.pixel(10, 10), Some(blue));

    c.blend_pixel(20, 20, Color::rgba(0, 255, 0, 0));
    assert_eq!(c.pixel(20, 20), Some(defaults::BACKGROUND));

    c.blend_pixel(10, 10, blue);
    assert_eq!(c.pixel(10, 10), Some(blue));
}

#[test]
fn later_items_draw_over_earlier_ones() {
    let mut job = PlotJob::new(viewport(), 10.0)
        .item(PlotItem::new("y==0").with_color(Color::rgb(0, 0, 255)))
        .item(PlotItem::new("y==0").with_color(Color::rgb(0, 255, 0)));
    job.grid = false;
    let c = render_job(&job, &Library::standard()).unwrap();
    assert_eq!(c.pixel(10, 50), Some(Color::rgb(0, 255, 0)));
}

#[test]
fn translucent_implicit_blends_with_background() {
    // Each pixel of an implicit pass is blended exactly once
    let mut job = PlotJob::new(viewport(), 10.0).item(PlotItem::new("x==0").with_color(Color::rgba(0, 0, 0, 128)));
    job.grid = false;
    let c = render_job(&job, &Library::standard()).unwrap();
    let px = c.pixel(50, 10).unwrap();
    assert_eq!(px.a, 255);
    assert!((120..=135).contains(&px.r), "{}", px);
}

#[test]
fn translucent_explicit_blends_each_pixel_once() {
    let mut job = PlotJob::new(viewport(), 10.0).item(PlotItem::new("y==0").with_color(Color::rgba(0, 0, 0, 128)));
    job.grid = false;
    let c = render_job(&job, &Library::standard()).unwrap();
    let first = c.pixel(0, 50).unwrap();
    assert!((120..=135).contains(&first.r), "{}", first);
    for x in 1..c.width() {
        assert_eq!(c.pixel(x, 50), Some(first), "column {}", x);
    }
}

#[test]
fn oversized_job_is_a_validation_error() {
    let job = PlotJob::new(viewport(), 1e9).item(PlotItem::new("y==x"));
    assert!(matches!(
        render_job(&job, &Library::standard()),
        Err(Error::Validation(ValidationError::CanvasTooLarge { .. }))
    ));
}

#[test]
fn huge_viewport_with_grid_finishes() {
    let area = Area::try_new(-1e300, 1e300, 1e300, -1e300).unwrap();
    let job = PlotJob::new(area, 1e-297).item(PlotItem::new("y==x"));
    let c = render_job(&job, &Library::standard()).unwrap();
    assert!(c.width() >= 1999);
}

// =============================================================================
// Jobs
// =============================================================================

#[test]
fn cancelled_job_reports_cancellation() {
    let token = CancelToken::new();
    token.cancel();
    let mut job = PlotJob::new(viewport(), 10.0).item(PlotItem::new("y==x"));
    job.options = RenderOptions { cancel: Some(token), ..Default::default() };
    assert!(matches!(
        render_job(&job, &Library::standard()),
        Err(Error::Render(RenderError::Cancelled))
    ));
}

#[test]
fn png_export_round_trips() {
    let job = PlotJob::new(viewport(), 10.0).item(PlotItem::new("r==3").with_color(Color::rgb(0, 0, 255)));
    let c = render_job(&job, &Library::standard()).unwrap();

    let path = std::env::temp_dir().join(format!("relplot-export-{}.png", std::process::id()));
    c.save_png(&path).unwrap();
    let decoded = image::open(&path).unwrap().to_rgba8();
    std::fs::remove_file(&path).ok();

    assert_eq!(decoded.dimensions(), (100, 100));
    assert_eq!(decoded, c.to_image());
}
