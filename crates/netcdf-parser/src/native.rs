//! Native NetCDF parsing using the netcdf library.
//!
//! The netcdf library wraps libnetcdf/HDF5 and needs a file path; datasets
//! are read straight from disk on every request.

use std::path::Path;
use std::sync::Once;

use tracing::{debug, warn};
use window_common::{CrsCode, GeoGrid, GriddedDataset, WindowResult};

use crate::error::{NetCdfError, NetCdfResult};

/// Accepted names for the latitude coordinate variable.
const LAT_NAMES: &[&str] = &["lat", "latitude"];
/// Accepted names for the longitude coordinate variable.
const LON_NAMES: &[&str] = &["lon", "longitude"];
/// Grid-mapping variables that may carry the dataset CRS.
const GRID_MAPPING_NAMES: &[&str] = &["spatial_ref", "crs"];

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This function disables that output by calling
/// H5Eset_auto2 with null handlers. Safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Load every `(time, lat, lon)` variable of a NetCDF file.
///
/// A missing file fails immediately with an I/O error; missing coordinate
/// variables or a file without any gridded variable fail with `InvalidFormat`.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> WindowResult<GriddedDataset> {
    Ok(read_dataset(path.as_ref())?)
}

fn read_dataset(path: &Path) -> NetCdfResult<GriddedDataset> {
    silence_hdf5_errors();

    if !path.exists() {
        return Err(NetCdfError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let file = netcdf::open(path)?;

    let (lat_dim, lat) = read_coordinate(&file, LAT_NAMES)?;
    let (lon_dim, lon) = read_coordinate(&file, LON_NAMES)?;
    let grid = GeoGrid::new(lat, lon)?;

    let mut time_len: Option<usize> = None;
    let mut variables = Vec::new();

    for var in file.variables() {
        let dims = var.dimensions();
        if dims.len() != 3 || dims[1].name() != lat_dim || dims[2].name() != lon_dim {
            continue;
        }

        let steps = dims[0].len();
        match time_len {
            None => time_len = Some(steps),
            Some(expected) if expected != steps => {
                warn!(
                    variable = %var.name(),
                    steps,
                    expected,
                    "Skipping variable with a different time axis"
                );
                continue;
            }
            Some(_) => {}
        }

        let raw: Vec<f32> = var.get_values(..)?;
        let packing = Packing::from_variable(&var);
        variables.push((var.name(), packing.unpack(raw)));
    }

    let time_len = time_len.ok_or_else(|| {
        NetCdfError::MissingData(format!(
            "no (time, {}, {}) variable in {}",
            lat_dim,
            lon_dim,
            path.display()
        ))
    })?;

    let mut dataset = GriddedDataset::new(grid, time_len)?;
    for (name, values) in variables {
        dataset.insert_variable(name, values)?;
    }
    if let Some(crs) = read_grid_mapping(&file) {
        dataset = dataset.with_crs(crs);
    }

    debug!(
        path = %path.display(),
        time_len,
        nlat = dataset.grid.nlat(),
        nlon = dataset.grid.nlon(),
        crs = ?dataset.crs,
        "Loaded gridded dataset"
    );

    Ok(dataset)
}

/// Read the first matching 1-D coordinate variable, returning its dimension
/// name and values.
fn read_coordinate(file: &netcdf::File, names: &[&str]) -> NetCdfResult<(String, Vec<f64>)> {
    for &name in names {
        if let Some(var) = file.variable(name) {
            let dims = var.dimensions();
            if dims.len() != 1 {
                return Err(NetCdfError::InvalidFormat(format!(
                    "coordinate variable '{}' has {} dimensions",
                    name,
                    dims.len()
                )));
            }
            let values: Vec<f64> = var.get_values(..)?;
            return Ok((dims[0].name(), values));
        }
    }

    Err(NetCdfError::MissingData(format!(
        "coordinate variable {}",
        names.join("/")
    )))
}

/// CF packing attributes of a data variable.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Packing {
    fill_value: Option<f64>,
    missing_value: Option<f64>,
    scale_factor: f64,
    add_offset: f64,
}

impl Default for Packing {
    fn default() -> Self {
        Self {
            fill_value: None,
            missing_value: None,
            scale_factor: 1.0,
            add_offset: 0.0,
        }
    }
}

impl Packing {
    fn from_variable(var: &netcdf::Variable) -> Self {
        Self {
            fill_value: get_f64_attr(var, "_FillValue"),
            missing_value: get_f64_attr(var, "missing_value"),
            scale_factor: get_f64_attr(var, "scale_factor").unwrap_or(1.0),
            add_offset: get_f64_attr(var, "add_offset").unwrap_or(0.0),
        }
    }

    fn is_missing(&self, raw: f64) -> bool {
        raw.is_nan() || self.fill_value == Some(raw) || self.missing_value == Some(raw)
    }

    fn unpack(&self, raw: Vec<f32>) -> Vec<f32> {
        let scaled = self.scale_factor != 1.0 || self.add_offset != 0.0;
        raw.into_iter()
            .map(|v| {
                let v = v as f64;
                if self.is_missing(v) {
                    f32::NAN
                } else if scaled {
                    (v * self.scale_factor + self.add_offset) as f32
                } else {
                    v as f32
                }
            })
            .collect()
    }
}

fn read_grid_mapping(file: &netcdf::File) -> Option<CrsCode> {
    for &name in GRID_MAPPING_NAMES {
        let Some(var) = file.variable(name) else {
            continue;
        };
        for attr in ["epsg_code", "crs"] {
            if let Some(code) = get_string_attr(&var, attr).and_then(|s| CrsCode::parse(&s).ok()) {
                return Some(code);
            }
        }
        for attr in ["crs_wkt", "spatial_ref"] {
            if let Some(code) = get_string_attr(&var, attr).and_then(|s| epsg_from_wkt(&s)) {
                return Some(code);
            }
        }
    }
    None
}

/// Extract the outermost EPSG authority code of a WKT1 or WKT2 string.
fn epsg_from_wkt(wkt: &str) -> Option<CrsCode> {
    let start = if let Some(pos) = wkt.rfind("AUTHORITY[\"EPSG\",\"") {
        pos + "AUTHORITY[\"EPSG\",\"".len()
    } else {
        wkt.rfind("ID[\"EPSG\",")? + "ID[\"EPSG\",".len()
    };
    let digits: String = wkt[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    CrsCode::parse(&format!("EPSG:{}", digits)).ok()
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get a numeric attribute as f64.
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

/// Helper to get a string attribute.
fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_applies_fill_and_scale() {
        let packing = Packing {
            fill_value: Some(-9999.0),
            missing_value: Some(-1.0),
            scale_factor: 0.5,
            add_offset: 10.0,
        };
        let out = packing.unpack(vec![2.0, -9999.0, -1.0, 0.0]);
        assert_eq!(out[0], 11.0);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_eq!(out[3], 10.0);
    }

    #[test]
    fn test_unpack_passthrough() {
        let out = Packing::default().unpack(vec![0.0, 1.0, 1.0]);
        assert_eq!(out, vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_epsg_from_wkt1() {
        let wkt = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#;
        assert_eq!(epsg_from_wkt(wkt), Some(CrsCode::Epsg4326));
    }

    #[test]
    fn test_epsg_from_wkt2() {
        let wkt = r#"PROJCRS["WGS 84 / Pseudo-Mercator",BASEGEOGCRS["WGS 84"],ID["EPSG",3857]]"#;
        assert_eq!(epsg_from_wkt(wkt), Some(CrsCode::Epsg3857));
        assert_eq!(epsg_from_wkt("LOCAL_CS[\"x\"]"), None);
    }
}
