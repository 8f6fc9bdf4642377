//! Tests for boundary clipping and zonal statistics.

use grid_processor::{clip, zonal_stats, BoundaryPolygon, ClipOptions, CrsPolicy};
use test_utils::{assert_approx_eq, boundary, north_up_grid};
use window_common::{CrsCode, GeoGrid, Raster2d, WindowError};

fn raster(grid: GeoGrid, values: Vec<f32>) -> Raster2d {
    Raster2d::new(grid, values).unwrap().with_crs(CrsCode::Epsg4326)
}

fn square(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> BoundaryPolygon {
    BoundaryPolygon::from_geojson_str(&boundary::square_geojson(min_lon, min_lat, max_lon, max_lat))
        .unwrap()
}

// ============================================================================
// Containment
// ============================================================================

#[test]
fn test_raster_inside_boundary_is_unchanged() {
    let grid = north_up_grid(40.0, -120.0, 1.0, 3, 3);
    let values: Vec<f32> = (0..9).map(|v| v as f32).collect();
    let input = raster(grid, values);

    let clipped = clip(&input, &square(-121.0, 37.0, -117.0, 41.0), &ClipOptions::default()).unwrap();
    assert_eq!(clipped, input);
}

#[test]
fn test_missing_cells_inside_stay_missing() {
    let grid = north_up_grid(40.0, -120.0, 1.0, 2, 2);
    let input = raster(grid, vec![1.0, f32::NAN, 3.0, 4.0]);

    let clipped = clip(&input, &square(-121.0, 38.0, -118.0, 41.0), &ClipOptions::default()).unwrap();
    assert_eq!(clipped.shape(), (2, 2));
    assert!(clipped.values[1].is_nan());
    assert_eq!(clipped.valid_count(), 3);
}

#[test]
fn test_cell_centers_on_edge_are_kept() {
    // Centers at lon -120, -119, -118; boundary edge exactly at -119.
    let grid = north_up_grid(40.0, -120.0, 1.0, 1, 3);
    let input = raster(grid, vec![1.0, 2.0, 3.0]);

    let options = ClipOptions {
        drop: false,
        ..ClipOptions::default()
    };
    let clipped = clip(&input, &square(-121.0, 39.0, -119.0, 41.0), &options).unwrap();
    assert_eq!(clipped.values[0], 1.0);
    assert_eq!(clipped.values[1], 2.0);
    assert!(clipped.values[2].is_nan());
}

// ============================================================================
// Footprint
// ============================================================================

#[test]
fn test_drop_crops_to_inside_footprint() {
    let grid = north_up_grid(40.0, -120.0, 1.0, 4, 4);
    let input = raster(grid, vec![1.0; 16]);

    // Covers rows 1..3 (lat 39, 38) and cols 1..3 (lon -119, -118).
    let clipped = clip(&input, &square(-119.5, 37.5, -117.5, 39.5), &ClipOptions::default()).unwrap();
    assert_eq!(clipped.shape(), (2, 2));
    assert_eq!(clipped.grid.lat(), &[39.0, 38.0]);
    assert_eq!(clipped.grid.lon(), &[-119.0, -118.0]);
    assert_eq!(clipped.valid_count(), 4);
}

#[test]
fn test_no_drop_keeps_shape() {
    let grid = north_up_grid(40.0, -120.0, 1.0, 4, 4);
    let input = raster(grid.clone(), vec![1.0; 16]);

    let options = ClipOptions {
        drop: false,
        ..ClipOptions::default()
    };
    let clipped = clip(&input, &square(-119.5, 37.5, -117.5, 39.5), &options).unwrap();
    assert_eq!(clipped.grid, grid);
    assert_eq!(clipped.valid_count(), 4);
    assert!(clipped.get(0, 0).unwrap().is_nan());
}

// ============================================================================
// Errors and CRS handling
// ============================================================================

#[test]
fn test_raster_outside_boundary_is_disjoint() {
    let grid = north_up_grid(40.0, -120.0, 1.0, 3, 3);
    let input = raster(grid, vec![1.0; 9]);

    let far = square(-80.0, 25.0, -70.0, 35.0);
    assert!(matches!(
        clip(&input, &far, &ClipOptions::default()),
        Err(WindowError::DisjointGeometry)
    ));
}

#[test]
fn test_boundary_between_cell_centers_is_disjoint() {
    let grid = north_up_grid(40.0, -120.0, 1.0, 2, 2);
    let input = raster(grid, vec![1.0; 4]);

    let sliver = square(-119.8, 39.2, -119.2, 39.8);
    assert!(matches!(
        clip(&input, &sliver, &ClipOptions::default()),
        Err(WindowError::DisjointGeometry)
    ));
}

#[test]
fn test_untagged_raster_gets_boundary_crs() {
    let grid = north_up_grid(40.0, -120.0, 1.0, 2, 2);
    let input = Raster2d::new(grid, vec![1.0; 4]).unwrap();

    let clipped = clip(&input, &square(-121.0, 38.0, -118.0, 41.0), &ClipOptions::default()).unwrap();
    assert_eq!(clipped.crs, Some(CrsCode::Epsg4326));
}

#[test]
fn test_untagged_raster_rejected_when_required() {
    let grid = north_up_grid(40.0, -120.0, 1.0, 2, 2);
    let input = Raster2d::new(grid, vec![1.0; 4]).unwrap();

    let options = ClipOptions {
        crs_policy: CrsPolicy::Require,
        ..ClipOptions::default()
    };
    assert!(matches!(
        clip(&input, &square(-121.0, 38.0, -118.0, 41.0), &options),
        Err(WindowError::CrsMismatch { .. })
    ));
}

#[test]
fn test_mismatched_crs_fails() {
    let grid = north_up_grid(40.0, -120.0, 1.0, 2, 2);
    let input = Raster2d::new(grid, vec![1.0; 4]).unwrap().with_crs(CrsCode::Epsg3857);

    let err = clip(&input, &square(-121.0, 38.0, -118.0, 41.0), &ClipOptions::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Raster CRS EPSG:3857 does not match boundary CRS EPSG:4326"
    );
}

// ============================================================================
// Zonal statistics
// ============================================================================

#[test]
fn test_zonal_stats_inside_region() {
    let grid = north_up_grid(40.0, -120.0, 1.0, 2, 2);
    let input = raster(grid, vec![1.0, 2.0, f32::NAN, 6.0]);

    let stats = zonal_stats(&input, &square(-121.0, 38.0, -118.0, 41.0)).unwrap();
    assert_eq!(stats.count, 3);
    assert_approx_eq!(stats.mean, 3.0, 1e-9);
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 6.0);
}

#[test]
fn test_zonal_stats_empty_region() {
    let grid = north_up_grid(40.0, -120.0, 1.0, 2, 2);
    let input = raster(grid, vec![1.0; 4]);

    assert!(zonal_stats(&input, &square(0.0, 0.0, 1.0, 1.0)).is_none());
}
