//! Image rendering for reduced and clipped rasters.
//!
//! Produces, per dataset kind:
//! - an SVG image of the raster (one rect per run of equal color)
//! - a PNG colorbar legend labeled with the physical quantity
//!
//! All rendering goes through a [`RenderSession`], which holds the
//! process-wide render lock for an image and legend pair.

pub mod colormap;
pub mod legend;
pub mod png;
pub mod stretch;
pub mod svg;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use window_common::{DatasetKind, DateWindow, Raster2d, WindowError, WindowResult};

pub use colormap::{Color, ColorScale, ColorStop, Colormap, ValueRange};
pub use legend::render_legend_png;
pub use stretch::{make_stretchable, make_stretchable_str};
pub use svg::{render_blank_svg, render_svg};

/// What to draw for a raster with no valid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPolicy {
    /// Fail with `RenderFailure`.
    #[default]
    Error,
    /// Write an empty image and a legend over the kind's fallback range.
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// SVG user units spanned by the longer side of the raster.
    pub density: u32,
    /// Rasterization resolution of legends.
    pub legend_dpi: u32,
    pub empty_policy: EmptyPolicy,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            density: 1500,
            legend_dpi: 1200,
            empty_policy: EmptyPolicy::Error,
        }
    }
}

/// Owner of the process-wide render lock.
#[derive(Debug, Default)]
pub struct Renderer {
    lock: Mutex<()>,
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            lock: Mutex::new(()),
            options,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Acquire the render lock. It is released when the session drops.
    pub fn session(&self) -> RenderSession<'_> {
        let guard = self.lock.lock().unwrap_or_else(|poisoned| {
            warn!("Render lock was poisoned by a panicking render; continuing");
            poisoned.into_inner()
        });
        RenderSession {
            _guard: guard,
            options: &self.options,
        }
    }
}

/// Rendering calls made while holding the render lock.
pub struct RenderSession<'a> {
    _guard: MutexGuard<'a, ()>,
    options: &'a RenderOptions,
}

impl RenderSession<'_> {
    /// Write the SVG image of `raster` to `output`.
    ///
    /// An all-missing raster fails under `EmptyPolicy::Error` and yields an
    /// empty image of the raster's footprint under `EmptyPolicy::Blank`.
    pub fn render(&self, raster: &Raster2d, scale: &ColorScale, output: &Path) -> WindowResult<()> {
        let (rows, cols) = raster.shape();
        let svg = if raster.is_all_missing() {
            match self.options.empty_policy {
                EmptyPolicy::Error => {
                    return Err(WindowError::RenderFailure(
                        "raster has no valid cells to draw".to_string(),
                    ))
                }
                EmptyPolicy::Blank => render_blank_svg(rows, cols, self.options.density),
            }
        } else {
            render_svg(raster, scale, self.options.density)
        };

        std::fs::write(output, svg)?;
        debug!(path = %output.display(), rows, cols, "Wrote raster image");
        Ok(())
    }

    /// Write the PNG legend of `kind` over `range` to `output`.
    pub fn render_legend(
        &self,
        kind: DatasetKind,
        range: &ValueRange,
        colormap: &Colormap,
        output: &Path,
    ) -> WindowResult<()> {
        let png = render_legend_png(kind, range, colormap, self.options.legend_dpi)?;
        std::fs::write(output, png)?;
        debug!(path = %output.display(), %kind, min = range.min, max = range.max, "Wrote legend");
        Ok(())
    }

    /// Render the image and legend of one dataset kind with a shared range.
    ///
    /// Returns the range both were drawn with.
    pub fn render_pair(
        &self,
        kind: DatasetKind,
        window: &DateWindow,
        raster: &Raster2d,
        colormap: &Colormap,
        image_path: &Path,
        legend_path: &Path,
    ) -> WindowResult<ValueRange> {
        let range = match ValueRange::for_kind(kind, window.days(), raster) {
            Some(range) => range,
            None => match self.options.empty_policy {
                EmptyPolicy::Error => {
                    return Err(WindowError::RenderFailure(format!(
                        "{} raster has no valid cells to draw",
                        kind
                    )))
                }
                EmptyPolicy::Blank => ValueRange::new(0.0, 0.0),
            },
        };

        let scale = ColorScale::new(colormap.clone(), range);
        self.render(raster, &scale, image_path)?;
        self.render_legend(kind, &range, colormap, legend_path)?;
        Ok(range)
    }
}
