//! Temporal reduction of a (time, lat, lon) variable over a date window.

use rayon::prelude::*;
use tracing::debug;
use window_common::{
    Aggregation, DatasetKind, DateWindow, GriddedDataset, Raster2d, WindowError, WindowResult,
};

/// Collapse the time axis of `variable` over the inclusive `window`.
///
/// `Count` sums the slices; `Continuous` averages them and turns a mean of
/// exactly zero into missing. Missing inputs propagate: a cell with any NaN
/// slice in the window is NaN in the result. The result keeps the dataset's
/// grid and CRS tag.
pub fn reduce(
    dataset: &GriddedDataset,
    variable: &str,
    window: &DateWindow,
    kind: DatasetKind,
) -> WindowResult<Raster2d> {
    if window.end() >= dataset.time_len {
        return Err(WindowError::InvalidRange {
            start: window.start() as i64,
            end: window.end() as i64,
            time_len: dataset.time_len,
        });
    }

    let data = dataset.variable(variable)?;
    let plane = dataset.grid.len();
    let days = window.days() as f64;
    let aggregation = kind.aggregation();
    let zero_is_missing = kind.zero_is_missing();

    let values: Vec<f32> = (0..plane)
        .into_par_iter()
        .map(|cell| {
            let total: f64 = window
                .indices()
                .map(|t| data[t * plane + cell] as f64)
                .sum();
            let value = match aggregation {
                Aggregation::Sum => total,
                Aggregation::Mean => total / days,
            };
            if zero_is_missing && value == 0.0 {
                f32::NAN
            } else {
                value as f32
            }
        })
        .collect();

    let mut raster = Raster2d::new(dataset.grid.clone(), values)?;
    raster.crs = dataset.crs;

    debug!(
        variable,
        %kind,
        %window,
        valid = raster.valid_count(),
        "Reduced time axis"
    );

    Ok(raster)
}

/// Validate `start`/`end` against the dataset and reduce.
pub fn reduce_range(
    dataset: &GriddedDataset,
    variable: &str,
    start: i64,
    end: i64,
    kind: DatasetKind,
) -> WindowResult<Raster2d> {
    let window = DateWindow::new(start, end, dataset.time_len)?;
    reduce(dataset, variable, &window, kind)
}
