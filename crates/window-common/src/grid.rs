//! Gridded raster types: coordinate grids, 3-D time series and 2-D rasters.
//!
//! All value buffers are flat, row-major over (lat, lon); the 3-D dataset
//! stacks one such plane per time step.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, CrsCode, WindowError, WindowResult};

/// Latitude/longitude coordinate vectors defining the cell centers of a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoGrid {
    lat: Vec<f64>,
    lon: Vec<f64>,
}

impl GeoGrid {
    /// Create a grid, validating that both axes are non-empty, finite and
    /// strictly monotonic.
    pub fn new(lat: Vec<f64>, lon: Vec<f64>) -> WindowResult<Self> {
        check_axis("lat", &lat)?;
        check_axis("lon", &lon)?;
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    /// Number of rows (latitude points).
    pub fn nlat(&self) -> usize {
        self.lat.len()
    }

    /// Number of columns (longitude points).
    pub fn nlon(&self) -> usize {
        self.lon.len()
    }

    /// Total number of grid cells.
    pub fn len(&self) -> usize {
        self.nlat() * self.nlon()
    }

    /// Always false for a validated grid; present for clippy's sake.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether latitude increases with the row index (south-up storage).
    pub fn lat_ascending(&self) -> bool {
        self.lat.len() < 2 || self.lat[1] > self.lat[0]
    }

    /// Flat index of a (row, col) cell.
    pub fn flat_index(&self, row: usize, col: usize) -> usize {
        row * self.nlon() + col
    }

    /// Cell center as (lon, lat).
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        (self.lon[col], self.lat[row])
    }

    /// Extent of the cell centers.
    pub fn bbox(&self) -> BoundingBox {
        let (lat_min, lat_max) = min_max(&self.lat);
        let (lon_min, lon_max) = min_max(&self.lon);
        BoundingBox::new(lon_min, lat_min, lon_max, lat_max)
    }

    /// Extent of the cells themselves, half a cell beyond the outer centers.
    pub fn cell_bbox(&self) -> BoundingBox {
        let centers = self.bbox();
        let half_lon = half_step(&self.lon);
        let half_lat = half_step(&self.lat);
        BoundingBox::new(
            centers.min_x - half_lon,
            centers.min_y - half_lat,
            centers.max_x + half_lon,
            centers.max_y + half_lat,
        )
    }

    /// Sub-grid covering the given row and column ranges.
    pub fn subset(&self, rows: Range<usize>, cols: Range<usize>) -> WindowResult<GeoGrid> {
        if rows.is_empty() || cols.is_empty() || rows.end > self.nlat() || cols.end > self.nlon() {
            return Err(WindowError::InvalidFormat(format!(
                "subset rows {:?} cols {:?} outside grid {}x{}",
                rows,
                cols,
                self.nlat(),
                self.nlon()
            )));
        }
        Ok(GeoGrid {
            lat: self.lat[rows].to_vec(),
            lon: self.lon[cols].to_vec(),
        })
    }
}

fn check_axis(name: &str, values: &[f64]) -> WindowResult<()> {
    if values.is_empty() {
        return Err(WindowError::InvalidFormat(format!("{} axis is empty", name)));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(WindowError::InvalidFormat(format!(
            "{} axis contains non-finite coordinates",
            name
        )));
    }
    if values.len() > 1 {
        let ascending = values[1] > values[0];
        let monotonic = values
            .windows(2)
            .all(|w| if ascending { w[1] > w[0] } else { w[1] < w[0] });
        if !monotonic {
            return Err(WindowError::InvalidFormat(format!(
                "{} axis is not strictly monotonic",
                name
            )));
        }
    }
    Ok(())
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

fn half_step(values: &[f64]) -> f64 {
    if values.len() < 2 {
        0.0
    } else {
        (values[1] - values[0]).abs() / 2.0
    }
}

/// A 2-D (lat x lon) raster, the result of reducing or clipping.
///
/// Missing cells are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster2d {
    pub grid: GeoGrid,
    pub values: Vec<f32>,
    pub crs: Option<CrsCode>,
}

impl Raster2d {
    /// Create a raster without a CRS tag.
    pub fn new(grid: GeoGrid, values: Vec<f32>) -> WindowResult<Self> {
        if values.len() != grid.len() {
            return Err(WindowError::InvalidFormat(format!(
                "raster has {} values for a {}x{} grid",
                values.len(),
                grid.nlat(),
                grid.nlon()
            )));
        }
        Ok(Self {
            grid,
            values,
            crs: None,
        })
    }

    /// Tag the raster with a coordinate reference system.
    pub fn with_crs(mut self, crs: CrsCode) -> Self {
        self.crs = Some(crs);
        self
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.grid.nlat(), self.grid.nlon())
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.grid.nlat() || col >= self.grid.nlon() {
            return None;
        }
        self.values.get(self.grid.flat_index(row, col)).copied()
    }

    /// Number of non-missing cells.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(|v| v.is_nan())
    }

    /// Minimum and maximum of the non-missing cells.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// A gridded time series: one or more (time, lat, lon) variables sharing a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedDataset {
    pub grid: GeoGrid,
    pub time_len: usize,
    pub crs: Option<CrsCode>,
    variables: BTreeMap<String, Vec<f32>>,
}

impl GriddedDataset {
    pub fn new(grid: GeoGrid, time_len: usize) -> WindowResult<Self> {
        if time_len == 0 {
            return Err(WindowError::InvalidFormat("time axis is empty".to_string()));
        }
        Ok(Self {
            grid,
            time_len,
            crs: None,
            variables: BTreeMap::new(),
        })
    }

    /// Add a (time, lat, lon) variable; its length must match the axes.
    pub fn with_variable(mut self, name: impl Into<String>, values: Vec<f32>) -> WindowResult<Self> {
        self.insert_variable(name, values)?;
        Ok(self)
    }

    pub fn insert_variable(&mut self, name: impl Into<String>, values: Vec<f32>) -> WindowResult<()> {
        let name = name.into();
        let expected = self.time_len * self.grid.len();
        if values.len() != expected {
            return Err(WindowError::InvalidFormat(format!(
                "variable '{}' has {} values, expected {} ({} x {} x {})",
                name,
                values.len(),
                expected,
                self.time_len,
                self.grid.nlat(),
                self.grid.nlon()
            )));
        }
        self.variables.insert(name, values);
        Ok(())
    }

    pub fn with_crs(mut self, crs: CrsCode) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Full (time, lat, lon) buffer of a variable.
    pub fn variable(&self, name: &str) -> WindowResult<&[f32]> {
        self.variables
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| WindowError::MissingVariable(name.to_string()))
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// One (lat, lon) plane of a variable.
    pub fn time_slice(&self, name: &str, t: usize) -> WindowResult<&[f32]> {
        let data = self.variable(name)?;
        let plane = self.grid.len();
        data.get(t * plane..(t + 1) * plane).ok_or_else(|| {
            WindowError::InvalidFormat(format!("time index {} outside variable '{}'", t, name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GeoGrid {
        GeoGrid::new(vec![40.0, 39.0, 38.0], vec![-122.0, -121.0]).unwrap()
    }

    #[test]
    fn test_grid_rejects_bad_axes() {
        assert!(GeoGrid::new(vec![], vec![1.0]).is_err());
        assert!(GeoGrid::new(vec![1.0, 1.0], vec![1.0]).is_err());
        assert!(GeoGrid::new(vec![1.0, 3.0, 2.0], vec![1.0]).is_err());
        assert!(GeoGrid::new(vec![f64::NAN], vec![1.0]).is_err());
    }

    #[test]
    fn test_grid_bbox_and_order() {
        let g = grid();
        assert!(!g.lat_ascending());
        assert_eq!(g.bbox(), BoundingBox::new(-122.0, 38.0, -121.0, 40.0));
        assert_eq!(g.cell_bbox(), BoundingBox::new(-122.5, 37.5, -120.5, 40.5));
        assert_eq!(g.cell_center(2, 1), (-121.0, 38.0));
    }

    #[test]
    fn test_subset() {
        let sub = grid().subset(1..3, 0..1).unwrap();
        assert_eq!(sub.lat(), &[39.0, 38.0]);
        assert_eq!(sub.lon(), &[-122.0]);
        assert!(grid().subset(0..4, 0..1).is_err());
    }

    #[test]
    fn test_raster_value_range_skips_missing() {
        let r = Raster2d::new(grid(), vec![f32::NAN, 3.0, -1.0, 7.5, f32::NAN, 0.0]).unwrap();
        assert_eq!(r.value_range(), Some((-1.0, 7.5)));
        assert_eq!(r.valid_count(), 4);
        assert!(!r.is_all_missing());
        assert_eq!(r.get(1, 1), Some(7.5));
        assert_eq!(r.get(3, 0), None);
    }

    #[test]
    fn test_dataset_variable_lookup() {
        let ds = GriddedDataset::new(grid(), 2)
            .unwrap()
            .with_variable("burn", (0..12).map(|v| v as f32).collect())
            .unwrap();

        assert_eq!(ds.time_slice("burn", 1).unwrap(), &[6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
        assert!(matches!(
            ds.variable("temperature"),
            Err(WindowError::MissingVariable(name)) if name == "temperature"
        ));
        assert!(GriddedDataset::new(grid(), 2)
            .unwrap()
            .with_variable("short", vec![0.0; 5])
            .is_err());
    }
}
