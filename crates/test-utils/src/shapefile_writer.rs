//! Write small polygon shapefiles for boundary tests.

use std::path::Path;

use shapefile::{Point, Polygon, PolygonRing, ShapeWriter};
use window_common::crs::geographic_to_web_mercator;

/// `.prj` text of a NAD83 geographic shapefile, as TIGER files ship.
pub const NAD83_PRJ: &str = r#"GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// `.prj` text of a Web-Mercator shapefile.
pub const WEB_MERCATOR_PRJ: &str = r#"PROJCS["WGS_1984_Web_Mercator_Auxiliary_Sphere",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Mercator_Auxiliary_Sphere"],UNIT["Meter",1.0]]"#;

/// Clockwise closed rectangle, the outer-ring order shapefiles use.
fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<Point> {
    vec![
        Point::new(min_x, min_y),
        Point::new(min_x, max_y),
        Point::new(max_x, max_y),
        Point::new(max_x, min_y),
        Point::new(min_x, min_y),
    ]
}

fn write(path: &Path, polygons: &[Polygon], prj: Option<&str>) {
    let writer = ShapeWriter::from_path(path).expect("create shapefile");
    writer.write_shapes(polygons).expect("write shapes");
    if let Some(prj) = prj {
        std::fs::write(path.with_extension("prj"), prj).expect("write .prj");
    }
}

/// One rectangle in degrees, with an optional `.prj`.
pub fn write_square_shapefile(
    path: &Path,
    (min_lon, min_lat, max_lon, max_lat): (f64, f64, f64, f64),
    prj: Option<&str>,
) {
    let polygon = Polygon::new(PolygonRing::Outer(rectangle(min_lon, min_lat, max_lon, max_lat)));
    write(path, &[polygon], prj);
}

/// The same rectangle stored in Web-Mercator meters.
pub fn write_mercator_square_shapefile(path: &Path, (min_lon, min_lat, max_lon, max_lat): (f64, f64, f64, f64)) {
    let (x0, y0) = geographic_to_web_mercator(min_lon, min_lat);
    let (x1, y1) = geographic_to_web_mercator(max_lon, max_lat);
    let polygon = Polygon::new(PolygonRing::Outer(rectangle(x0, y0, x1, y1)));
    write(path, &[polygon], Some(WEB_MERCATOR_PRJ));
}

/// A rectangle with a rectangular hole.
pub fn write_holed_square_shapefile(
    path: &Path,
    outer: (f64, f64, f64, f64),
    hole: (f64, f64, f64, f64),
) {
    let mut hole_ring = rectangle(hole.0, hole.1, hole.2, hole.3);
    hole_ring.reverse();
    let polygon = Polygon::with_rings(vec![
        PolygonRing::Outer(rectangle(outer.0, outer.1, outer.2, outer.3)),
        PolygonRing::Inner(hole_ring),
    ]);
    write(path, &[polygon], Some(NAD83_PRJ));
}
