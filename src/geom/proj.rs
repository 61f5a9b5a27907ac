use anyhow::{anyhow, Context, Result};
use geo::{Coord, MapCoords};
use proj4rs::{proj::Proj, transform::transform};

use crate::{common::{EPSG_NAD83, EPSG_WGS84}, geom::Geometries};

/// A UTM zone chosen for a set of geometries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UtmZone {
    pub zone: u32,
    pub north: bool,
    pub nad83: bool,
}

impl UtmZone {
    /// Estimate the UTM zone from a lon/lat center, as `estimate_utm_crs` does.
    /// NAD83 UTM zones are only defined in the northern hemisphere.
    pub fn from_lon_lat(lon: f64, lat: f64, epsg: u32) -> Self {
        let zone = (((lon + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u32;
        let north = lat >= 0.0;
        Self { zone, north, nad83: epsg == EPSG_NAD83 && north }
    }

    /// EPSG code of the projected CRS (269zz NAD83, 326zz/327zz WGS84).
    pub fn epsg(&self) -> u32 {
        match (self.nad83, self.north) {
            (true, _) => 26900 + self.zone,
            (false, true) => 32600 + self.zone,
            (false, false) => 32700 + self.zone,
        }
    }

    /// PROJ.4 string for this zone.
    pub fn proj4(&self) -> String {
        let datum = if self.nad83 { "NAD83" } else { "WGS84" };
        let south = if self.north { "" } else { " +south" };
        format!("+proj=utm +zone={}{south} +datum={datum} +units=m +no_defs +type=crs", self.zone)
    }

    /// ESRI WKT for this zone, as written to a shapefile's `.prj` sidecar.
    pub fn esri_wkt(&self) -> String {
        let (datum_name, geogcs, central_meridian) = (
            if self.nad83 { "NAD_1983" } else { "WGS_1984" },
            geographic_wkt(if self.nad83 { EPSG_NAD83 } else { EPSG_WGS84 }),
            -183.0 + 6.0 * self.zone as f64,
        );
        let (hemisphere, false_northing) = if self.north { ("N", 0.0) } else { ("S", 10_000_000.0) };
        format!(
            concat!(
                r#"PROJCS["{}_UTM_Zone_{}{}",{},PROJECTION["Transverse_Mercator"],"#,
                r#"PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",{:.1}],"#,
                r#"PARAMETER["Central_Meridian",{:.1}],PARAMETER["Scale_Factor",0.9996],"#,
                r#"PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#,
            ),
            datum_name, self.zone, hemisphere, geogcs, false_northing, central_meridian,
        )
    }
}

/// ESRI WKT for a geographic CRS.
pub(crate) fn geographic_wkt(epsg: u32) -> &'static str {
    match epsg {
        EPSG_NAD83 => concat!(
            r#"GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983","#,
            r#"SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],"#,
            r#"UNIT["Degree",0.0174532925199433]]"#,
        ),
        _ => concat!(
            r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984","#,
            r#"SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],"#,
            r#"UNIT["Degree",0.0174532925199433]]"#,
        ),
    }
}

/// PROJ.4 string for the source geographic CRS.
fn geographic_proj4(epsg: u32) -> &'static str {
    match epsg {
        EPSG_NAD83 | 4937 => "+proj=longlat +datum=NAD83 +no_defs +type=crs",
        _ => "+proj=longlat +datum=WGS84 +no_defs +type=crs",
    }
}

impl Geometries {
    /// Estimate a UTM zone from the center of the geometries' bounds.
    /// Returns None if the geometries are already projected or empty.
    pub fn estimate_utm_zone(&self) -> Option<UtmZone> {
        let epsg = self.epsg()?;
        let center = self.bounds()?.center();
        Some(UtmZone::from_lon_lat(center.x, center.y, epsg))
    }

    /// Reproject shapes from lon/lat to the given UTM zone (meters).
    /// Already-projected geometries are returned unchanged.
    pub fn to_utm(&self, zone: UtmZone) -> Result<Geometries> {
        let Some(epsg) = self.epsg() else { return Ok(self.clone()) };

        let from = Proj::from_proj_string(geographic_proj4(epsg))
            .with_context(|| format!("[geom::proj] failed to build source PROJ.4 for EPSG:{epsg}"))?;
        let to = {
            let proj_string = zone.proj4();
            Proj::from_proj_string(&proj_string)
                .with_context(|| format!("[geom::proj] failed to build target PROJ.4: {proj_string}"))?
        };

        // Degrees → radians in, meters out.
        let projected = self.shapes().iter()
            .map(|shape| shape.try_map_coords(|coord: Coord<f64>| {
                let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
                transform(&from, &to, &mut point)
                    .map_err(|e| anyhow!("[geom::proj] CRS transform failed at {coord:?}: {e:?}"))?;
                Ok::<_, anyhow::Error>(Coord { x: point.0, y: point.1 })
            }))
            .collect::<Result<Vec<_>>>()?;

        Ok(Geometries::new(projected, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::epsg_from_wkt;

    #[test]
    fn illinois_falls_in_zone_16_north() {
        // Springfield, IL
        let zone = UtmZone::from_lon_lat(-89.65, 39.78, EPSG_NAD83);
        assert_eq!(zone, UtmZone { zone: 16, north: true, nad83: true });
        assert_eq!(zone.epsg(), 26916);
        assert!(zone.proj4().contains("+zone=16 "));
        assert!(zone.proj4().contains("+datum=NAD83"));
    }

    #[test]
    fn southern_hemisphere_uses_wgs84() {
        let zone = UtmZone::from_lon_lat(151.2, -33.9, EPSG_NAD83);
        assert!(!zone.north && !zone.nad83);
        assert_eq!(zone.epsg(), 32756);
        assert!(zone.proj4().contains("+south"));
        assert_eq!(UtmZone::from_lon_lat(-89.65, 39.78, EPSG_WGS84).epsg(), 32616);
    }

    #[test]
    fn projected_geometries_are_untouched() {
        let geoms = Geometries::new(vec![crate::geom::tests::square(500_000.0, 4_000_000.0, 10.0)], None);
        assert!(geoms.estimate_utm_zone().is_none());
        let zone = UtmZone::from_lon_lat(-89.0, 40.0, EPSG_NAD83);
        assert_eq!(geoms.to_utm(zone).unwrap().shapes(), geoms.shapes());
    }

    #[test]
    fn central_meridian_maps_to_false_easting() {
        // Zone 16 central meridian is -87°; points on it project to x = 500 km.
        let geoms = Geometries::new(vec![crate::geom::tests::square(-87.0, 40.0, 0.01)], Some(EPSG_NAD83));
        let zone = geoms.estimate_utm_zone().unwrap();
        assert_eq!(zone.zone, 16);

        let projected = geoms.to_utm(zone).unwrap();
        assert_eq!(projected.epsg(), None);
        let min = projected.bounds().unwrap().min();
        assert!((min.x - 500_000.0).abs() < 1.0, "x = {}", min.x);
        assert!(min.y > 4_400_000.0 && min.y < 4_450_000.0, "y = {}", min.y);
    }

    #[test]
    fn wkt_sidecars_read_back_as_projected_or_geographic() {
        let zone = UtmZone::from_lon_lat(-89.65, 39.78, EPSG_NAD83);
        let wkt = zone.esri_wkt();
        assert!(wkt.starts_with(r#"PROJCS["NAD_1983_UTM_Zone_16N""#));
        assert!(wkt.contains(r#"PARAMETER["Central_Meridian",-87.0]"#));
        assert_eq!(epsg_from_wkt(&wkt), None);

        assert_eq!(epsg_from_wkt(geographic_wkt(EPSG_NAD83)), Some(EPSG_NAD83));
        assert_eq!(epsg_from_wkt(geographic_wkt(EPSG_WGS84)), Some(EPSG_WGS84));
    }
}
