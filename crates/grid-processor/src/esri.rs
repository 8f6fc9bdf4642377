//! ESRI shapefile boundaries.
//!
//! Polygon shapes (plain, M and Z) are read from the `.shp` file; the sidecar
//! `.prj` decides the CRS. Geographic WKT of any datum is taken as EPSG:4326
//! and Web-Mercator WKT as EPSG:3857. A missing `.prj` means EPSG:4326.

use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::{PolygonRing, Shape};
use tracing::{debug, warn};
use window_common::{CrsCode, WindowError, WindowResult};

/// Read every polygon of a shapefile and the CRS declared next to it.
pub(crate) fn read_polygons(path: &Path) -> WindowResult<(MultiPolygon<f64>, CrsCode)> {
    // NotFound surfaces as Io rather than a parse error
    std::fs::metadata(path)?;

    let shapes = shapefile::read_shapes(path)
        .map_err(|e| WindowError::Boundary(format!("{}: {}", path.display(), e)))?;

    let mut polygons = Vec::new();
    for shape in shapes {
        match shape {
            Shape::Polygon(p) => push_rings(p.rings(), |pt| Coord { x: pt.x, y: pt.y }, &mut polygons),
            Shape::PolygonM(p) => push_rings(p.rings(), |pt| Coord { x: pt.x, y: pt.y }, &mut polygons),
            Shape::PolygonZ(p) => push_rings(p.rings(), |pt| Coord { x: pt.x, y: pt.y }, &mut polygons),
            Shape::NullShape => {}
            other => debug!(shape = ?other.shapetype(), "Ignoring non-polygon shape"),
        }
    }

    let crs = match std::fs::read_to_string(path.with_extension("prj")) {
        Ok(wkt) => crs_from_wkt(&wkt)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No .prj next to shapefile; assuming EPSG:4326");
            CrsCode::Epsg4326
        }
        Err(e) => return Err(e.into()),
    };

    Ok((MultiPolygon::new(polygons), crs))
}

/// Outer rings start a polygon; inner rings are holes of the last one.
fn push_rings<P, F>(rings: &[PolygonRing<P>], xy: F, out: &mut Vec<Polygon<f64>>)
where
    F: Fn(&P) -> Coord<f64>,
{
    for ring in rings {
        let line: LineString<f64> = ring.points().iter().map(&xy).collect();
        match ring {
            PolygonRing::Outer(_) => out.push(Polygon::new(line, Vec::new())),
            PolygonRing::Inner(_) => match out.last_mut() {
                Some(polygon) => polygon.interiors_push(line),
                None => warn!("Inner ring before any outer ring; skipped"),
            },
        }
    }
}

/// CRS of an ESRI `.prj` WKT string.
pub(crate) fn crs_from_wkt(wkt: &str) -> WindowResult<CrsCode> {
    let upper = wkt.trim().to_ascii_uppercase();
    if upper.starts_with("GEOGCS") {
        Ok(CrsCode::Epsg4326)
    } else if upper.starts_with("PROJCS") && upper.contains("MERCATOR") {
        Ok(CrsCode::Epsg3857)
    } else {
        Err(WindowError::Boundary(format!(
            "unsupported shapefile projection: {}",
            wkt.chars().take(60).collect::<String>()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_from_wkt() {
        let nad83 = r#"GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
        assert_eq!(crs_from_wkt(nad83).unwrap(), CrsCode::Epsg4326);

        let mercator = r#"PROJCS["WGS_1984_Web_Mercator_Auxiliary_Sphere",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]]],PROJECTION["Mercator_Auxiliary_Sphere"],UNIT["Meter",1.0]]"#;
        assert_eq!(crs_from_wkt(mercator).unwrap(), CrsCode::Epsg3857);

        let albers = r#"PROJCS["NAD_1983_California_Teale_Albers",PROJECTION["Albers"]]"#;
        assert!(matches!(crs_from_wkt(albers), Err(WindowError::Boundary(_))));
    }
}
