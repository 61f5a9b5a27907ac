use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::{self as shp, dbase::Record, Shape};

/// EPSG code for NAD83 geographic coordinates (Census/TIGER default).
pub(crate) const EPSG_NAD83: u32 = 4269;

/// EPSG code for WGS84 geographic coordinates.
pub(crate) const EPSG_WGS84: u32 = 4326;

/// Read all shapes and attribute records from a `.shp` file (with its `.dbf` sidecar).
pub(crate) fn read_from_shapefile(path: &Path) -> Result<(Vec<MultiPolygon<f64>>, Vec<Record>)> {
    let mut reader = shp::Reader::from_path(path)
        .with_context(|| format!("[common::shp] Failed to open shapefile: {}", path.display()))?;

    let count = reader.shape_count()
        .with_context(|| format!("[common::shp] Failed to read shape count: {}", path.display()))?;

    let mut shapes = Vec::with_capacity(count);
    let mut records = Vec::with_capacity(count);
    for (i, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result
            .with_context(|| format!("[common::shp] Error reading shape+record {i} from {}", path.display()))?;
        shapes.push(shape_to_multipolygon(shape)
            .with_context(|| format!("[common::shp] Shape {i} in {} is not a polygon", path.display()))?);
        records.push(record);
    }

    Ok((shapes, records))
}

/// Convert a shapefile shape to a geo MultiPolygon, discarding any M/Z values.
pub(crate) fn shape_to_multipolygon(shape: Shape) -> Result<MultiPolygon<f64>> {
    match shape {
        Shape::Polygon(polygon) => Ok(shp_to_geo(&polygon)),
        Shape::PolygonM(polygon) => Ok(shp_to_geo(&flatten_rings(polygon.rings(), |p| shp::Point::new(p.x, p.y)))),
        Shape::PolygonZ(polygon) => Ok(shp_to_geo(&flatten_rings(polygon.rings(), |p| shp::Point::new(p.x, p.y)))),
        Shape::NullShape => Ok(MultiPolygon(vec![])),
        other => bail!("found non-Polygon shape: {:?}", other.shapetype()),
    }
}

/// Drop the extra dimensions of a measured or 3D polygon.
fn flatten_rings<P>(rings: &[shp::PolygonRing<P>], xy: impl Fn(&P) -> shp::Point) -> shp::Polygon {
    shp::Polygon::with_rings(rings.iter()
        .map(|ring| match ring {
            shp::PolygonRing::Outer(points) => shp::PolygonRing::Outer(points.iter().map(&xy).collect()),
            shp::PolygonRing::Inner(points) => shp::PolygonRing::Inner(points.iter().map(&xy).collect()),
        })
        .collect())
}

/// Convert shapefile::Polygon to geo::MultiPolygon<f64>.
/// Shapefile stores each outer ring followed by its holes.
pub(crate) fn shp_to_geo(p: &shp::Polygon) -> MultiPolygon<f64> {
    fn to_line_string(points: &[shp::Point]) -> LineString<f64> {
        let mut coords = points.iter()
            .map(|pt| Coord { x: pt.x, y: pt.y })
            .collect::<Vec<_>>();
        if coords.first() != coords.last() { coords.push(coords[0]) }
        LineString(coords)
    }

    let mut polys = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes = Vec::new();

    for ring in p.rings() {
        match ring {
            shp::PolygonRing::Outer(points) => {
                if let Some(ext) = exterior.take() {
                    polys.push(Polygon::new(ext, std::mem::take(&mut holes)));
                }
                exterior = Some(to_line_string(points));
            }
            shp::PolygonRing::Inner(points) => holes.push(to_line_string(points)),
        }
    }
    if let Some(ext) = exterior {
        polys.push(Polygon::new(ext, holes));
    }

    MultiPolygon(polys)
}

/// Convert geo::MultiPolygon<f64> to shapefile::Polygon.
pub(crate) fn geo_to_shp(mp: &MultiPolygon<f64>) -> shp::Polygon {
    /// Get the signed area of a shapefile::Point list (negative for clockwise)
    fn signed_area(pts: &[shp::Point]) -> f64 {
        pts.windows(2).map(|w| w[0].x * w[1].y - w[1].x * w[0].y).sum::<f64>() / 2.0
    }

    fn ring_points(ring: &LineString<f64>) -> Vec<shp::Point> {
        let mut pts = ring.coords().map(|c| shp::Point { x: c.x, y: c.y }).collect::<Vec<_>>();
        if let (Some(first), Some(last)) = (pts.first().copied(), pts.last().copied()) {
            if first.x != last.x || first.y != last.y { pts.push(first) }
        }
        pts
    }

    // Shapefile ordering: [ext CW, hole CCW, hole CCW, ..., next ext CW, ...]
    let mut rings = Vec::new();
    for poly in &mp.0 {
        let mut exterior = ring_points(poly.exterior());
        if signed_area(&exterior) > 0.0 { exterior.reverse() }
        rings.push(shp::PolygonRing::Outer(exterior));

        for hole in poly.interiors() {
            let mut interior = ring_points(hole);
            if signed_area(&interior) < 0.0 { interior.reverse() }
            rings.push(shp::PolygonRing::Inner(interior));
        }
    }

    shp::Polygon::with_rings(rings)
}

/// Detect the geographic datum of a shapefile from its `.prj` sidecar.
/// Returns `None` when the layer is already in a projected coordinate system.
pub(crate) fn epsg_from_shapefile(path: &Path) -> Option<u32> {
    let Ok(wkt) = fs::read_to_string(path.with_extension("prj")) else {
        return Some(EPSG_NAD83); // TIGER/Census default
    };
    epsg_from_wkt(&wkt)
}

/// Parse the datum out of an ESRI WKT projection string.
pub(crate) fn epsg_from_wkt(wkt: &str) -> Option<u32> {
    let wkt = wkt.trim_start().to_ascii_uppercase();
    if wkt.starts_with("PROJCS") { return None }
    if wkt.contains("NORTH_AMERICAN_1983") || wkt.contains("NAD83") || wkt.contains("NAD_1983") {
        Some(EPSG_NAD83)
    } else {
        Some(EPSG_WGS84)
    }
}
