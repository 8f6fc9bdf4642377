//! Synthetic grids and datasets with predictable values.

use window_common::{CrsCode, GeoGrid, GriddedDataset};

/// Evenly spaced coordinate axis of `n` points.
pub fn axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Grid stored north-first: `nlat` rows going south from `north`, `nlon`
/// columns going east from `west`, `step` degrees apart.
pub fn north_up_grid(north: f64, west: f64, step: f64, nlat: usize, nlon: usize) -> GeoGrid {
    GeoGrid::new(axis(north, -step, nlat), axis(west, step, nlon))
        .expect("synthetic axes are monotonic")
}

/// Grid stored south-first, as many NetCDF writers produce.
pub fn south_up_grid(south: f64, west: f64, step: f64, nlat: usize, nlon: usize) -> GeoGrid {
    GeoGrid::new(axis(south, step, nlat), axis(west, step, nlon))
        .expect("synthetic axes are monotonic")
}

/// Dataset with one variable whose value at (t, row, col) is `f(t, row, col)`.
///
/// The dataset is tagged EPSG:4326.
pub fn dataset_from_fn<F>(grid: &GeoGrid, time_len: usize, variable: &str, f: F) -> GriddedDataset
where
    F: Fn(usize, usize, usize) -> f32,
{
    let mut values = Vec::with_capacity(time_len * grid.len());
    for t in 0..time_len {
        for row in 0..grid.nlat() {
            for col in 0..grid.nlon() {
                values.push(f(t, row, col));
            }
        }
    }

    GriddedDataset::new(grid.clone(), time_len)
        .and_then(|ds| ds.with_variable(variable, values))
        .expect("synthetic dataset is consistent")
        .with_crs(CrsCode::Epsg4326)
}

/// Dataset filled with one value everywhere.
pub fn constant_dataset(grid: &GeoGrid, time_len: usize, variable: &str, value: f32) -> GriddedDataset {
    dataset_from_fn(grid, time_len, variable, |_, _, _| value)
}

/// Binary indicator dataset: a cell is 1 on day `t` when `(t + row + col)` is even.
pub fn indicator_dataset(grid: &GeoGrid, time_len: usize, variable: &str) -> GriddedDataset {
    dataset_from_fn(grid, time_len, variable, |t, row, col| ((t + row + col) % 2 == 0) as u8 as f32)
}
