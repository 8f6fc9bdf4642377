//! Common types shared across the burn-window crates and services.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod kind;

pub use bbox::BoundingBox;
pub use crs::CrsCode;
pub use error::{WindowError, WindowResult};
pub use grid::{GeoGrid, GriddedDataset, Raster2d};
pub use kind::{Aggregation, DatasetKind, DateWindow};
