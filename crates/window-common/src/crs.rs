//! Coordinate Reference System codes and the few conversions the service needs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius used by spherical Web Mercator (meters).
const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

/// Well-known CRS codes understood by the raster and boundary loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// NAD83 Geographic
    Epsg4269,
    /// Web Mercator (meters)
    Epsg3857,
}

impl CrsCode {
    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326" / "epsg:4326"
    /// - "CRS:84" and "urn:ogc:def:crs:OGC:1.3:CRS84"
    /// - "urn:ogc:def:crs:EPSG::3857"
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();
        let code = normalized
            .strip_prefix("URN:OGC:DEF:CRS:")
            .map(|rest| rest.replace("::", ":"))
            .unwrap_or_else(|| normalized.clone());

        match code.as_str() {
            "EPSG:4326" | "CRS:84" | "OGC:1.3:CRS84" | "OGC:CRS84" => Ok(CrsCode::Epsg4326),
            "EPSG:4269" => Ok(CrsCode::Epsg4269),
            "EPSG:3857" | "EPSG:900913" | "EPSG:102100" => Ok(CrsCode::Epsg3857),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg4269 => "EPSG:4269",
            CrsCode::Epsg3857 => "EPSG:3857",
        };
        write!(f, "{}", code)
    }
}

impl std::str::FromStr for CrsCode {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Convert spherical Web Mercator meters to (longitude, latitude) degrees.
pub fn web_mercator_to_geographic(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / WEB_MERCATOR_RADIUS).to_degrees();
    let lat = (2.0 * (y / WEB_MERCATOR_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    (lon, lat)
}

/// Convert (longitude, latitude) degrees to spherical Web Mercator meters.
pub fn geographic_to_web_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = WEB_MERCATOR_RADIUS * lon.to_radians();
    let y = WEB_MERCATOR_RADIUS * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(CrsCode::parse("EPSG:4326").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("epsg:3857").unwrap(), CrsCode::Epsg3857);
        assert_eq!(CrsCode::parse("CRS:84").unwrap(), CrsCode::Epsg4326);
        assert_eq!(
            CrsCode::parse("urn:ogc:def:crs:EPSG::3857").unwrap(),
            CrsCode::Epsg3857
        );
        assert_eq!(
            CrsCode::parse("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(),
            CrsCode::Epsg4326
        );
        assert!(CrsCode::parse("EPSG:99999").is_err());
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for code in [CrsCode::Epsg4326, CrsCode::Epsg4269, CrsCode::Epsg3857] {
            assert_eq!(CrsCode::parse(&code.to_string()).unwrap(), code);
        }
    }

    #[test]
    fn test_web_mercator_inverse() {
        // Sacramento, roughly
        let (x, y) = geographic_to_web_mercator(-121.49, 38.58);
        let (lon, lat) = web_mercator_to_geographic(x, y);
        assert!((lon + 121.49).abs() < 1e-9);
        assert!((lat - 38.58).abs() < 1e-9);

        let (lon0, lat0) = web_mercator_to_geographic(0.0, 0.0);
        assert!(lon0.abs() < 1e-12 && lat0.abs() < 1e-12);
    }
}
