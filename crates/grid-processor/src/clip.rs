//! Boundary clipping and per-region statistics.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use window_common::{CrsCode, GeoGrid, Raster2d, WindowError, WindowResult};

use crate::boundary::BoundaryPolygon;

/// What to do with a raster that carries no CRS tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrsPolicy {
    /// Tag the raster with the boundary's CRS without checking it.
    #[default]
    AssignBoundary,
    /// Fail with `CrsMismatch`.
    Require,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipOptions {
    pub crs_policy: CrsPolicy,
    /// Crop the result to the rows and columns holding cells inside the boundary.
    pub drop: bool,
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self {
            crs_policy: CrsPolicy::AssignBoundary,
            drop: true,
        }
    }
}

/// Restrict a raster to the cells whose centers lie inside or on the boundary.
///
/// Cells outside become NaN; cells inside keep their value, NaN included.
/// With `drop` set the result is cropped to the footprint of the inside
/// cells, otherwise it keeps the input shape.
pub fn clip(
    raster: &Raster2d,
    boundary: &BoundaryPolygon,
    options: &ClipOptions,
) -> WindowResult<Raster2d> {
    let crs = resolve_crs(raster.crs, boundary.crs(), options.crs_policy)?;

    if !raster.grid.cell_bbox().intersects(boundary.bounding_box()) {
        return Err(WindowError::DisjointGeometry);
    }

    let mask = inside_mask(&raster.grid, boundary);
    let footprint = Footprint::of(&mask, raster.grid.nlon()).ok_or(WindowError::DisjointGeometry)?;

    let masked: Vec<f32> = raster
        .values
        .iter()
        .zip(&mask)
        .map(|(&v, &inside)| if inside { v } else { f32::NAN })
        .collect();

    let clipped = if options.drop {
        let grid = raster
            .grid
            .subset(footprint.rows.clone(), footprint.cols.clone())?;
        let nlon = raster.grid.nlon();
        let values = footprint
            .rows
            .clone()
            .flat_map(|row| {
                let start = row * nlon;
                masked[start + footprint.cols.start..start + footprint.cols.end].iter().copied()
            })
            .collect();
        Raster2d::new(grid, values)?
    } else {
        Raster2d::new(raster.grid.clone(), masked)?
    };

    debug!(
        rows = ?footprint.rows,
        cols = ?footprint.cols,
        inside = mask.iter().filter(|&&m| m).count(),
        "Clipped raster to boundary"
    );

    Ok(clipped.with_crs(crs))
}

/// Summary of the non-missing cells inside one region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneStats {
    pub count: usize,
    pub mean: f64,
    pub min: f32,
    pub max: f32,
}

/// Statistics of the valid cells whose centers fall inside `region`, or
/// `None` when there are none.
pub fn zonal_stats(raster: &Raster2d, region: &BoundaryPolygon) -> Option<ZoneStats> {
    if !raster.grid.cell_bbox().intersects(region.bounding_box()) {
        return None;
    }

    let mask = inside_mask(&raster.grid, region);
    let mut count = 0usize;
    let mut sum = 0.0f64;
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;

    for (&v, _) in raster.values.iter().zip(&mask).filter(|(v, &m)| m && !v.is_nan()) {
        count += 1;
        sum += v as f64;
        min = min.min(v);
        max = max.max(v);
    }

    (count > 0).then(|| ZoneStats {
        count,
        mean: sum / count as f64,
        min,
        max,
    })
}

fn resolve_crs(raster: Option<CrsCode>, boundary: CrsCode, policy: CrsPolicy) -> WindowResult<CrsCode> {
    match (raster, policy) {
        (Some(crs), _) if crs == boundary => Ok(crs),
        (Some(crs), _) => Err(WindowError::crs_mismatch(crs, boundary)),
        (None, CrsPolicy::AssignBoundary) => {
            warn!(crs = %boundary, "Raster has no CRS; assigning the boundary CRS unverified");
            Ok(boundary)
        }
        (None, CrsPolicy::Require) => Err(WindowError::CrsMismatch {
            raster: "unset".to_string(),
            boundary: boundary.to_string(),
        }),
    }
}

/// Row-major flags: cell center inside or on the boundary.
fn inside_mask(grid: &GeoGrid, boundary: &BoundaryPolygon) -> Vec<bool> {
    let nlon = grid.nlon();
    (0..grid.nlat())
        .into_par_iter()
        .flat_map_iter(|row| {
            (0..nlon).map(move |col| {
                let (lon, lat) = grid.cell_center(row, col);
                boundary.contains(lon, lat)
            })
        })
        .collect()
}

/// Row and column ranges spanned by the set cells of a mask.
struct Footprint {
    rows: std::ops::Range<usize>,
    cols: std::ops::Range<usize>,
}

impl Footprint {
    fn of(mask: &[bool], nlon: usize) -> Option<Self> {
        let mut rows: Option<(usize, usize)> = None;
        let mut cols: Option<(usize, usize)> = None;

        for (idx, _) in mask.iter().enumerate().filter(|(_, &m)| m) {
            let (row, col) = (idx / nlon, idx % nlon);
            rows = Some(rows.map_or((row, row), |(lo, hi)| (lo.min(row), hi.max(row))));
            cols = Some(cols.map_or((col, col), |(lo, hi)| (lo.min(col), hi.max(col))));
        }

        let (r0, r1) = rows?;
        let (c0, c1) = cols?;
        Some(Self {
            rows: r0..r1 + 1,
            cols: c0..c1 + 1,
        })
    }
}
