//! Fixtures shared by the burn-window test suites.
//!
//! - [`generators`]: synthetic grids and datasets with predictable values
//! - [`fixtures`]: grid constants and boundary GeoJSON documents
//! - [`netcdf_writer`]: writes datasets to disk in the layout the service reads
//! - [`shapefile_writer`]: polygon shapefiles with optional `.prj` files

pub mod fixtures;
pub mod generators;
pub mod netcdf_writer;
pub mod shapefile_writer;

pub use fixtures::*;
pub use generators::*;
pub use netcdf_writer::*;
pub use shapefile_writer::*;

/// Assert two numbers are within `tolerance` of each other, compared as `f64`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($actual:expr, $expected:expr, $tolerance:expr) => {{
        let (actual, expected) = ($actual as f64, $expected as f64);
        let tolerance = $tolerance as f64;
        assert!(
            (actual - expected).abs() <= tolerance,
            "assertion failed: {} is not within {} of {}",
            actual,
            tolerance,
            expected
        );
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_within_tolerance() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(-5.5_f32, -5.500001_f32, 0.0001);
    }

    #[test]
    #[should_panic(expected = "is not within")]
    fn test_approx_outside_tolerance() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }
}
