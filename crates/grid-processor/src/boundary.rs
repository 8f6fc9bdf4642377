//! Boundary polygons loaded from GeoJSON or ESRI shapefiles.
//!
//! The state outline is read once at service start and shared read-only by
//! every request. Boundaries stored in Web Mercator are converted to
//! geographic degrees at load time, so `contains` always takes (lon, lat).

use std::path::Path;

use geo::{BoundingRect, Coord, Intersects, MapCoords, MultiPolygon, Point, Polygon};
use geojson::{Feature, GeoJson};
use tracing::{debug, info, warn};

use crate::esri;
use window_common::crs::web_mercator_to_geographic;
use window_common::{BoundingBox, CrsCode, WindowError, WindowResult};

/// A single immutable region outline.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPolygon {
    geometry: MultiPolygon<f64>,
    crs: CrsCode,
    bbox: BoundingBox,
}

impl BoundaryPolygon {
    /// Build a boundary from polygons expressed in `crs`.
    ///
    /// Web Mercator input is converted to EPSG:4326.
    pub fn new(geometry: MultiPolygon<f64>, crs: CrsCode) -> WindowResult<Self> {
        let (geometry, crs) = match crs {
            CrsCode::Epsg3857 => {
                let converted = geometry.map_coords(|c| {
                    let (x, y) = web_mercator_to_geographic(c.x, c.y);
                    Coord { x, y }
                });
                (converted, CrsCode::Epsg4326)
            }
            other => (geometry, other),
        };

        let rect = geometry
            .bounding_rect()
            .ok_or_else(|| WindowError::Boundary("boundary has no polygons".to_string()))?;
        let bbox = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);

        Ok(Self {
            geometry,
            crs,
            bbox,
        })
    }

    /// Read a boundary file: `.shp` as a shapefile, anything else as GeoJSON.
    pub fn load<P: AsRef<Path>>(path: P) -> WindowResult<Self> {
        let path = path.as_ref();
        let is_shapefile = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("shp"));
        let boundary = if is_shapefile {
            Self::from_shapefile(path)?
        } else {
            Self::from_geojson_str(&std::fs::read_to_string(path)?)?
        };
        info!(
            path = %path.display(),
            crs = %boundary.crs,
            polygons = boundary.geometry.0.len(),
            "Loaded boundary polygon"
        );
        Ok(boundary)
    }

    /// Union of every polygon in a shapefile, CRS taken from its `.prj`.
    pub fn from_shapefile<P: AsRef<Path>>(path: P) -> WindowResult<Self> {
        let (geometry, crs) = esri::read_polygons(path.as_ref())?;
        Self::new(geometry, crs)
    }

    /// Parse a FeatureCollection, Feature or bare geometry.
    ///
    /// All polygonal geometries are merged into one multipolygon; other
    /// geometry types are ignored.
    pub fn from_geojson_str(text: &str) -> WindowResult<Self> {
        let geojson = parse_geojson(text)?;
        let crs = declared_crs(&geojson)?.unwrap_or(CrsCode::Epsg4326);

        let mut polygons = Vec::new();
        match geojson {
            GeoJson::FeatureCollection(fc) => {
                for feature in fc.features {
                    push_feature(feature, &mut polygons)?;
                }
            }
            GeoJson::Feature(feature) => push_feature(feature, &mut polygons)?,
            GeoJson::Geometry(geometry) => push_geometry(geometry, &mut polygons)?,
        }

        Self::new(MultiPolygon::new(polygons), crs)
    }

    /// Whether a point lies inside the boundary or on its edge.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.bbox.contains_point(lon, lat) && self.geometry.intersects(&Point::new(lon, lat))
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }
}

/// Named regions sharing one CRS, such as the counties of a state.
#[derive(Debug, Clone, Default)]
pub struct BoundarySet {
    regions: Vec<(String, BoundaryPolygon)>,
}

impl BoundarySet {
    pub fn load<P: AsRef<Path>>(path: P) -> WindowResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let set = Self::from_geojson_str(&text)?;
        info!(path = %path.display(), regions = set.len(), "Loaded region set");
        Ok(set)
    }

    /// Parse a FeatureCollection whose features carry a `name` or `NAME`
    /// property. Unnamed features are skipped.
    pub fn from_geojson_str(text: &str) -> WindowResult<Self> {
        let geojson = parse_geojson(text)?;
        let crs = declared_crs(&geojson)?.unwrap_or(CrsCode::Epsg4326);

        let GeoJson::FeatureCollection(fc) = geojson else {
            return Err(WindowError::Boundary(
                "region set must be a FeatureCollection".to_string(),
            ));
        };

        let mut regions = Vec::with_capacity(fc.features.len());
        for feature in fc.features {
            let Some(name) = feature_name(&feature) else {
                warn!("Skipping region without a name property");
                continue;
            };
            let mut polygons = Vec::new();
            push_feature(feature, &mut polygons)?;
            if polygons.is_empty() {
                warn!(region = %name, "Skipping region without polygons");
                continue;
            }
            regions.push((name, BoundaryPolygon::new(MultiPolygon::new(polygons), crs)?));
        }

        Ok(Self { regions })
    }

    pub fn get(&self, name: &str) -> Option<&BoundaryPolygon> {
        self.regions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, region)| region)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundaryPolygon)> {
        self.regions.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn parse_geojson(text: &str) -> WindowResult<GeoJson> {
    text.parse::<GeoJson>()
        .map_err(|e| WindowError::Boundary(format!("invalid GeoJSON: {}", e)))
}

/// CRS named by the legacy top-level `crs` member, if any.
fn declared_crs(geojson: &GeoJson) -> WindowResult<Option<CrsCode>> {
    let members = match geojson {
        GeoJson::FeatureCollection(fc) => fc.foreign_members.as_ref(),
        GeoJson::Feature(f) => f.foreign_members.as_ref(),
        GeoJson::Geometry(g) => g.foreign_members.as_ref(),
    };

    let name = members
        .and_then(|m| m.get("crs"))
        .and_then(|crs| crs.pointer("/properties/name"))
        .and_then(|v| v.as_str());

    match name {
        Some(name) => CrsCode::parse(name)
            .map(Some)
            .map_err(|e| WindowError::Boundary(e.to_string())),
        None => Ok(None),
    }
}

fn feature_name(feature: &Feature) -> Option<String> {
    feature
        .property("name")
        .or_else(|| feature.property("NAME"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn push_feature(feature: Feature, out: &mut Vec<Polygon<f64>>) -> WindowResult<()> {
    match feature.geometry {
        Some(geometry) => push_geometry(geometry, out),
        None => Ok(()),
    }
}

fn push_geometry(geometry: geojson::Geometry, out: &mut Vec<Polygon<f64>>) -> WindowResult<()> {
    let geometry = geo::Geometry::<f64>::try_from(geometry)
        .map_err(|e| WindowError::Boundary(format!("unsupported geometry: {}", e)))?;
    collect_polygons(geometry, out);
    Ok(())
}

fn collect_polygons(geometry: geo::Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geometry {
        geo::Geometry::Polygon(p) => out.push(p),
        geo::Geometry::MultiPolygon(mp) => out.extend(mp.0),
        geo::Geometry::GeometryCollection(gc) => {
            for g in gc.0 {
                collect_polygons(g, out);
            }
        }
        _ => debug!("Ignoring non-polygonal geometry"),
    }
}
