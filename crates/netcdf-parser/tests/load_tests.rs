//! Tests for loading gridded datasets from NetCDF files on disk.

use std::path::Path;

use netcdf_parser::load_dataset;
use window_common::{CrsCode, WindowError};

const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#;

/// Write a 3-day, 2x3 file with one indicator variable.
fn write_fixture(path: &Path, fill: Option<f32>) {
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("time", 3).unwrap();
    file.add_dimension("lat", 2).unwrap();
    file.add_dimension("lon", 3).unwrap();

    {
        let mut lat = file.add_variable::<f64>("lat", &["lat"]).unwrap();
        lat.put_values(&[38.0, 37.0], ..).unwrap();
    }
    {
        let mut lon = file.add_variable::<f64>("lon", &["lon"]).unwrap();
        lon.put_values(&[-122.0, -121.0, -120.0], ..).unwrap();
    }
    {
        let mut data = file
            .add_variable::<f32>("__xarray_dataarray_variable__", &["time", "lat", "lon"])
            .unwrap();
        if let Some(fill) = fill {
            data.put_attribute("missing_value", fill).unwrap();
        }
        let mut values: Vec<f32> = (0..18).map(|i| (i % 2) as f32).collect();
        if let Some(fill) = fill {
            values[0] = fill;
        }
        data.put_values(&values, ..).unwrap();
    }
    {
        let mut crs = file.add_variable::<i32>("spatial_ref", &[]).unwrap();
        crs.put_attribute("crs_wkt", WGS84_WKT).unwrap();
    }
}

// ============================================================================
// Successful loads
// ============================================================================

#[test]
fn test_load_dataset_reads_axes_and_variable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("window.nc");
    write_fixture(&path, None);

    let ds = load_dataset(&path).unwrap();
    assert_eq!(ds.time_len, 3);
    assert_eq!(ds.grid.lat(), &[38.0, 37.0]);
    assert_eq!(ds.grid.lon(), &[-122.0, -121.0, -120.0]);
    assert_eq!(ds.crs, Some(CrsCode::Epsg4326));

    let slice = ds.time_slice("__xarray_dataarray_variable__", 1).unwrap();
    assert_eq!(slice, &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn test_load_dataset_maps_missing_value_to_nan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("temperature.nc");
    write_fixture(&path, Some(-9999.0));

    let ds = load_dataset(&path).unwrap();
    let first = ds.time_slice("__xarray_dataarray_variable__", 0).unwrap();
    assert!(first[0].is_nan());
    assert_eq!(first[1], 1.0);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_dataset(dir.path().join("absent.nc")).unwrap_err();
    match err {
        WindowError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_variable_is_reported_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("window.nc");
    write_fixture(&path, None);

    let ds = load_dataset(&path).unwrap();
    assert!(matches!(
        ds.variable("burn"),
        Err(WindowError::MissingVariable(name)) if name == "burn"
    ));
}

#[test]
fn test_file_without_coordinates_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.nc");
    {
        let mut file = netcdf::create(&path).unwrap();
        file.add_dimension("x", 2).unwrap();
        let mut v = file.add_variable::<f32>("data", &["x"]).unwrap();
        v.put_values(&[1.0f32, 2.0], ..).unwrap();
    }

    assert!(matches!(
        load_dataset(&path),
        Err(WindowError::InvalidFormat(_))
    ));
}
