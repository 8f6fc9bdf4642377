//! Colorbar legends.
//!
//! A legend is laid out as SVG in points, rasterized with resvg at the
//! requested DPI, cropped to its drawn pixels and encoded as PNG. The label
//! and value range are also stored as PNG text chunks.

use std::fmt::Write;
use std::sync::{Arc, OnceLock};

use tracing::debug;
use window_common::{DatasetKind, WindowError, WindowResult};

use crate::colormap::{Colormap, ValueRange};
use crate::png::encode_png;
use crate::svg::fmt_num;

/// Discrete bands of a day-count legend (`linspace(0, days, 50)` boundaries).
pub const COUNT_BANDS: usize = 49;
/// Steps of a continuous legend.
pub const CONTINUOUS_STEPS: usize = 256;

const BAR_WIDTH: f64 = 14.0;
const BAR_HEIGHT: f64 = 180.0;
const TICK_LENGTH: f64 = 4.0;
const FONT_SIZE: f64 = 10.0;
const MAX_TICKS: usize = 6;

/// Number of color bands drawn for a dataset kind.
pub fn band_count(kind: DatasetKind) -> usize {
    match kind {
        DatasetKind::Count => COUNT_BANDS,
        DatasetKind::Continuous => CONTINUOUS_STEPS,
    }
}

/// Lay out the colorbar as an SVG document in points.
pub fn legend_svg(kind: DatasetKind, range: &ValueRange, colormap: &Colormap) -> String {
    let ticks = nice_ticks(range.min as f64, range.max as f64, MAX_TICKS);
    let labels: Vec<String> = ticks.iter().map(|&t| format_tick(t, &ticks)).collect();
    let widest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(1) as f64;

    let label_x = BAR_WIDTH + TICK_LENGTH + 2.0;
    let title_x = label_x + widest * FONT_SIZE * 0.62 + FONT_SIZE;
    let width = title_x + FONT_SIZE * 0.5;
    let height = BAR_HEIGHT + FONT_SIZE;
    let top = FONT_SIZE / 2.0;

    let mut svg = String::with_capacity(16 * 1024);
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = fmt_num(width),
        h = fmt_num(height)
    );

    // Bands, bottom (minimum) to top (maximum)
    let bands = if range.span() > 0.0 { band_count(kind) } else { 1 };
    let band_height = BAR_HEIGHT / bands as f64;
    svg.push_str("<g shape-rendering=\"crispEdges\">\n");
    for i in 0..bands {
        let t = (i as f32 + 0.5) / bands as f32;
        let color = if bands == 1 { colormap.sample(0.0) } else { colormap.sample(t) };
        let y = top + BAR_HEIGHT - (i + 1) as f64 * band_height;
        let _ = writeln!(
            svg,
            "<rect x=\"0\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            fmt_num(y),
            fmt_num(BAR_WIDTH),
            fmt_num(band_height),
            color.to_hex()
        );
    }
    svg.push_str("</g>\n");

    let _ = writeln!(
        svg,
        "<rect x=\"0\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"#000000\" stroke-width=\"0.8\"/>",
        fmt_num(top),
        fmt_num(BAR_WIDTH),
        fmt_num(BAR_HEIGHT)
    );

    for (tick, label) in ticks.iter().zip(&labels) {
        let position = if range.span() > 0.0 {
            range.normalize(*tick as f32) as f64
        } else {
            0.5
        };
        let y = top + BAR_HEIGHT * (1.0 - position);
        let _ = writeln!(
            svg,
            "<line x1=\"{}\" y1=\"{y}\" x2=\"{}\" y2=\"{y}\" stroke=\"#000000\" stroke-width=\"0.8\"/>",
            fmt_num(BAR_WIDTH),
            fmt_num(BAR_WIDTH + TICK_LENGTH),
            y = fmt_num(y)
        );
        let _ = writeln!(
            svg,
            "<text x=\"{}\" y=\"{}\" font-family=\"DejaVu Sans, sans-serif\" font-size=\"{}\">{}</text>",
            fmt_num(label_x),
            fmt_num(y + FONT_SIZE * 0.35),
            fmt_num(FONT_SIZE),
            escape_xml(label)
        );
    }

    let _ = writeln!(
        svg,
        "<text transform=\"translate({} {}) rotate(-90)\" text-anchor=\"middle\" font-family=\"DejaVu Sans, sans-serif\" font-size=\"{}\">{}</text>",
        fmt_num(title_x),
        fmt_num(top + BAR_HEIGHT / 2.0),
        fmt_num(FONT_SIZE),
        escape_xml(kind.legend_label())
    );

    svg.push_str("</svg>\n");
    svg
}

/// Render the legend of `kind` over `range` as PNG bytes.
pub fn render_legend_png(
    kind: DatasetKind,
    range: &ValueRange,
    colormap: &Colormap,
    dpi: u32,
) -> WindowResult<Vec<u8>> {
    let svg = legend_svg(kind, range, colormap);
    let scale = dpi.max(1) as f32 / 72.0;
    let (pixels, width, height) = rasterize(&svg, scale)?;
    let (pixels, width, height) = crop_to_content(pixels, width, height)?;

    let min = range.min.to_string();
    let max = range.max.to_string();
    let text = [
        ("Label", kind.legend_label()),
        ("ValueMin", min.as_str()),
        ("ValueMax", max.as_str()),
    ];

    debug!(%kind, width, height, dpi, "Rendered legend");
    encode_png(&pixels, width as usize, height as usize, &text)
}

/// Face every legend label is set in, whatever the host has installed.
const LEGEND_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
const LEGEND_FAMILY: &str = "DejaVu Sans";

fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_font_data(LEGEND_FONT.to_vec());
            db.set_sans_serif_family(LEGEND_FAMILY);
            Arc::new(db)
        })
        .clone()
}

/// Rasterize SVG text, returning straight-alpha RGBA pixels.
fn rasterize(svg: &str, scale: f32) -> WindowResult<(Vec<u8>, u32, u32)> {
    let opt = usvg::Options {
        fontdb: font_database(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|e| WindowError::RenderFailure(format!("legend SVG: {}", e)))?;

    let size = tree.size();
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;
    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        WindowError::RenderFailure(format!("cannot allocate {}x{} legend", width, height))
    })?;

    resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    let pixels = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    Ok((pixels, width, height))
}

/// Trim fully transparent rows and columns from every side.
fn crop_to_content(pixels: Vec<u8>, width: u32, height: u32) -> WindowResult<(Vec<u8>, u32, u32)> {
    let image = image::RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| WindowError::RenderFailure("legend buffer size mismatch".to_string()))?;

    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, px) in image.enumerate_pixels() {
        if px[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    let (x0, y0, x1, y1) =
        bounds.ok_or_else(|| WindowError::RenderFailure("legend is empty".to_string()))?;
    let (w, h) = (x1 - x0 + 1, y1 - y0 + 1);
    let cropped = image::imageops::crop_imm(&image, x0, y0, w, h).to_image();

    Ok((cropped.into_raw(), w, h))
}

/// Round tick values covering `[min, max]` with at most `max_ticks` entries.
pub fn nice_ticks(min: f64, max: f64, max_ticks: usize) -> Vec<f64> {
    if !(max > min) || !min.is_finite() || !max.is_finite() {
        return vec![min];
    }

    let step = nice_step((max - min) / (max_ticks.max(2) - 1) as f64);
    let first = (min / step).ceil() * step;
    let count = ((max - first) / step + 1e-9).floor() as usize;

    (0..=count).map(|i| first + i as f64 * step).collect()
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 2.5 {
        2.5
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn format_tick(value: f64, ticks: &[f64]) -> String {
    let step = if ticks.len() > 1 {
        ticks[1] - ticks[0]
    } else {
        value.abs().max(1.0)
    };
    let decimals = if step >= 1.0 && step.fract() == 0.0 {
        0
    } else {
        (-step.log10().floor()).max(1.0) as usize
    };
    let text = format!("{:.*}", decimals, value);
    if text.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        text.trim_start_matches('-').to_string()
    } else {
        text
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
