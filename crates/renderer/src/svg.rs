//! Vector rendering of a clipped raster.
//!
//! Every row becomes a series of `<rect>` elements, one per run of cells
//! sharing a color. Missing cells produce no element, so they stay
//! transparent. There is no background, frame or axis.

use std::fmt::Write;

use window_common::Raster2d;

use crate::colormap::{Color, ColorScale};

/// Size of the SVG canvas for a raster of `rows` x `cols` cells, with the
/// longer side spanning `density` user units.
pub fn canvas_size(rows: usize, cols: usize, density: u32) -> (f64, f64, f64) {
    let cell = density as f64 / rows.max(cols).max(1) as f64;
    (cols as f64 * cell, rows as f64 * cell, cell)
}

/// Render the raster to SVG text, north at the top.
pub fn render_svg(raster: &Raster2d, scale: &ColorScale, density: u32) -> String {
    let (rows, cols) = raster.shape();
    let (width, height, cell) = canvas_size(rows, cols, density);
    let flip = raster.grid.lat_ascending();

    let mut svg = open_document(width, height);

    for out_row in 0..rows {
        let row = if flip { rows - 1 - out_row } else { out_row };
        let y = out_row as f64 * cell;

        let mut run: Option<(usize, Color)> = None;
        for col in 0..=cols {
            let color = if col < cols {
                raster.get(row, col).and_then(|v| scale.color_for(v))
            } else {
                None
            };

            match (run, color) {
                (Some((_, current)), Some(c)) if current == c => {}
                _ => {
                    if let Some((start, current)) = run.take() {
                        push_rect(&mut svg, start as f64 * cell, y, (col - start) as f64 * cell, cell, current);
                    }
                    run = color.map(|c| (col, c));
                }
            }
        }
    }

    close_document(svg)
}

/// An SVG with the raster's footprint and nothing drawn.
pub fn render_blank_svg(rows: usize, cols: usize, density: u32) -> String {
    let (width, height, _) = canvas_size(rows, cols, density);
    close_document(open_document(width, height))
}

fn open_document(width: f64, height: f64) -> String {
    let (w, h) = (fmt_num(width), fmt_num(height));
    let mut svg = String::with_capacity(4096);
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" version=\"1.1\">"
    );
    svg.push_str("<g shape-rendering=\"crispEdges\">\n");
    svg
}

fn close_document(mut svg: String) -> String {
    svg.push_str("</g>\n</svg>\n");
    svg
}

fn push_rect(svg: &mut String, x: f64, y: f64, width: f64, height: f64, color: Color) {
    let _ = writeln!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
        fmt_num(x),
        fmt_num(y),
        fmt_num(width),
        fmt_num(height),
        color.to_hex()
    );
}

/// Up to four decimals, trailing zeros trimmed.
pub(crate) fn fmt_num(value: f64) -> String {
    let s = format!("{:.4}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(10.0), "10");
        assert_eq!(fmt_num(136.363636), "136.3636");
        assert_eq!(fmt_num(0.5), "0.5");
        assert_eq!(fmt_num(-0.00001), "0");
    }

    #[test]
    fn test_canvas_size_longer_side() {
        let (w, h, cell) = canvas_size(2, 4, 1000);
        assert_eq!((w, h, cell), (1000.0, 500.0, 250.0));
    }
}
