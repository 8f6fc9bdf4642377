//! Temporal reduction and boundary clipping of gridded rasters.
//!
//! # Architecture
//!
//! ```text
//! GriddedDataset (time, lat, lon)
//!      │
//!      ▼
//! reduce(window, kind) ── sum (COUNT) / mean, zero -> NaN (CONTINUOUS)
//!      │
//!      ▼
//! Raster2d (lat, lon)
//!      │
//!      ▼
//! clip(boundary) ── cell centers inside or on the polygon, cropped to footprint
//!      │
//!      ▼
//! Raster2d ready for rendering
//! ```

pub mod boundary;
pub mod clip;
mod esri;
pub mod reduce;

// Re-export commonly used types at crate root
pub use boundary::{BoundaryPolygon, BoundarySet};
pub use clip::{clip, zonal_stats, ClipOptions, CrsPolicy, ZoneStats};
pub use reduce::{reduce, reduce_range};
