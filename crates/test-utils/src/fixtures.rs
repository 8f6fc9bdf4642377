//! Common test fixtures: boundary GeoJSON documents and grid layouts.

/// Grid layouts used across the suite.
pub mod grid {
    /// A coarse grid over California: 11 x 11 cells, one degree apart,
    /// centers from 42N/124W to 32N/114W.
    pub const CA_NORTH: f64 = 42.0;
    pub const CA_WEST: f64 = -124.0;
    pub const CA_STEP: f64 = 1.0;
    pub const CA_SIZE: usize = 11;

    /// Name of the data variable written by xarray for an unnamed DataArray.
    pub const XARRAY_VARIABLE: &str = "__xarray_dataarray_variable__";
}

/// Boundary GeoJSON documents.
pub mod boundary {
    use serde_json::json;
    use window_common::crs::geographic_to_web_mercator;

    fn ring(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> serde_json::Value {
        json!([[
            [min_lon, min_lat],
            [max_lon, min_lat],
            [max_lon, max_lat],
            [min_lon, max_lat],
            [min_lon, min_lat]
        ]])
    }

    /// FeatureCollection with one rectangular polygon in EPSG:4326.
    pub fn square_geojson(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> String {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "NAME": "Square" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": ring(min_lon, min_lat, max_lon, max_lat)
                }
            }]
        })
        .to_string()
    }

    /// The same rectangle stored in Web Mercator meters with a legacy `crs` member.
    pub fn mercator_square_geojson(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> String {
        let (x0, y0) = geographic_to_web_mercator(min_lon, min_lat);
        let (x1, y1) = geographic_to_web_mercator(max_lon, max_lat);
        json!({
            "type": "FeatureCollection",
            "crs": {
                "type": "name",
                "properties": { "name": "urn:ogc:def:crs:EPSG::3857" }
            },
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": ring(x0, y0, x1, y1)
                }
            }]
        })
        .to_string()
    }

    /// Two named rectangles splitting `[min_lon, max_lon]` at `split_lon`.
    pub fn two_region_geojson(
        min_lon: f64,
        min_lat: f64,
        split_lon: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> String {
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "name": "West" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": ring(min_lon, min_lat, split_lon, max_lat)
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "NAME": "East" },
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [ring(split_lon, min_lat, max_lon, max_lat)]
                    }
                }
            ]
        })
        .to_string()
    }

    /// A boundary covering every cell of the California test grid.
    pub fn california_box_geojson() -> String {
        square_geojson(-124.5, 31.5, -113.5, 42.5)
    }
}
