//! NetCDF reader for gridded time-series rasters.
//!
//! Reads NetCDF-4 files holding one or more `(time, lat, lon)` variables
//! over a regular latitude/longitude grid, such as the daily burn-window
//! indicator and daily temperature datasets.
//!
//! # Data Layout
//!
//! - Coordinate variables `lat`/`latitude` and `lon`/`longitude` define cell centers.
//! - Every variable whose dimensions are `(<time>, <lat dim>, <lon dim>)` is loaded
//!   as `f32`, with `_FillValue`/`missing_value` mapped to NaN and CF packing
//!   (`scale_factor`, `add_offset`) applied.
//! - A grid-mapping variable (`spatial_ref` or `crs`) tags the dataset CRS when it
//!   names an EPSG code.

pub mod error;
pub mod native;

pub use error::{NetCdfError, NetCdfResult};
pub use native::{load_dataset, silence_hdf5_errors};
