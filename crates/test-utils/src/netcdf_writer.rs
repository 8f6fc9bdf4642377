//! Write synthetic datasets as NetCDF files for end-to-end tests.

use std::path::Path;

use window_common::{CrsCode, GriddedDataset};

const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#;

/// Write every variable of `dataset` with `time`, `lat`, `lon` dimensions.
///
/// A dataset tagged EPSG:4326 also gets a `spatial_ref` grid-mapping variable.
pub fn write_netcdf(path: &Path, dataset: &GriddedDataset) {
    let mut file = netcdf::create(path).expect("create NetCDF file");
    file.add_dimension("time", dataset.time_len).expect("time dimension");
    file.add_dimension("lat", dataset.grid.nlat()).expect("lat dimension");
    file.add_dimension("lon", dataset.grid.nlon()).expect("lon dimension");

    {
        let mut time = file.add_variable::<i32>("time", &["time"]).expect("time variable");
        let days: Vec<i32> = (0..dataset.time_len as i32).collect();
        time.put_values(&days, ..).expect("time values");
    }
    {
        let mut lat = file.add_variable::<f64>("lat", &["lat"]).expect("lat variable");
        lat.put_values(dataset.grid.lat(), ..).expect("lat values");
    }
    {
        let mut lon = file.add_variable::<f64>("lon", &["lon"]).expect("lon variable");
        lon.put_values(dataset.grid.lon(), ..).expect("lon values");
    }

    let names: Vec<String> = dataset.variable_names().map(str::to_string).collect();
    for name in names {
        let values = dataset.variable(&name).expect("listed variable");
        let mut var = file
            .add_variable::<f32>(&name, &["time", "lat", "lon"])
            .expect("data variable");
        var.put_values(values, ..).expect("data values");
    }

    if dataset.crs == Some(CrsCode::Epsg4326) {
        let mut crs = file
            .add_variable::<i32>("spatial_ref", &[])
            .expect("spatial_ref variable");
        crs.put_attribute("crs_wkt", WGS84_WKT).expect("crs_wkt attribute");
    }
}
