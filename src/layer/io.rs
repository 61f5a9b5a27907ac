use std::{fs::{self, File}, io::BufWriter, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geo::MultiPolygon;
use polars::prelude::*;
use serde_json::{json, Map, Value};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};

use crate::{common, geom::geographic_wkt, layer::Layer};

/// How a DataFrame column is stored in a DBF table.
#[derive(Clone, Copy, Debug)]
enum FieldKind {
    Character(u8),
    Integer,
    Float,
    Logical,
}

impl FieldKind {
    fn of(column: &Column) -> Result<Self> {
        Ok(match column.dtype() {
            DataType::String => {
                let longest = column.str()?.into_iter().flatten().map(str::len).max().unwrap_or(1);
                FieldKind::Character(longest.clamp(1, 254) as u8)
            }
            DataType::Boolean => FieldKind::Logical,
            dtype if dtype.is_integer() => FieldKind::Integer,
            dtype if dtype.is_float() => FieldKind::Float,
            dtype => bail!("[layer::io] Column {:?} has unsupported type {dtype}", column.name()),
        })
    }

    fn value(&self, value: AnyValue) -> FieldValue {
        match (self, value) {
            (FieldKind::Character(_), AnyValue::Null) => FieldValue::Character(None),
            (FieldKind::Character(_), value) => FieldValue::Character(Some(match value {
                AnyValue::String(s) => s.to_string(),
                AnyValue::StringOwned(s) => s.to_string(),
                other => other.to_string(),
            })),
            (FieldKind::Logical, value) => FieldValue::Logical(match value {
                AnyValue::Boolean(b) => Some(b),
                _ => None,
            }),
            (FieldKind::Integer | FieldKind::Float, value) => FieldValue::Numeric(value.extract::<f64>()),
        }
    }
}

impl Layer {
    /// Write the layer as `.shp`/`.shx`/`.dbf`, plus a `.prj` describing its CRS.
    pub fn write_shapefile(&self, path: &Path) -> Result<()> {
        common::ensure_parent_exists(path)?;

        let columns = self.data.get_columns();
        let kinds = columns.iter().map(FieldKind::of).collect::<Result<Vec<_>>>()?;

        let mut table = TableWriterBuilder::new();
        for (column, kind) in columns.iter().zip(&kinds) {
            let name = FieldName::try_from(column.name().as_str())
                .map_err(|e| anyhow!("[layer::write_shapefile] Invalid DBF field name {:?}: {e:?}", column.name()))?;
            table = match kind {
                FieldKind::Character(length) => table.add_character_field(name, *length),
                FieldKind::Integer => table.add_numeric_field(name, 18, 0),
                FieldKind::Float => table.add_numeric_field(name, 18, 8),
                FieldKind::Logical => table.add_logical_field(name),
            };
        }

        {
            let mut writer = shapefile::Writer::from_path(path, table)
                .with_context(|| format!("[layer::write_shapefile] Failed to create {}", path.display()))?;

            for (row, shape) in self.geoms.shapes().iter().enumerate() {
                let mut record = Record::default();
                for (column, kind) in columns.iter().zip(&kinds) {
                    record.insert(column.name().to_string(), kind.value(column.get(row)?));
                }
                writer.write_shape_and_record(&common::geo_to_shp(shape), &record)
                    .with_context(|| format!("[layer::write_shapefile] Failed to write unit {row}"))?;
            }
        }

        fs::write(path.with_extension("prj"), self.crs_wkt())
            .with_context(|| format!("[layer::write_shapefile] Failed to write projection for {}", path.display()))?;

        Ok(())
    }

    /// Write the layer as a GeoJSON FeatureCollection with every column as a property.
    pub fn write_geojson(&self, path: &Path) -> Result<()> {
        common::ensure_parent_exists(path)?;

        let file = File::create(path)
            .with_context(|| format!("[layer::write_geojson] Failed to create {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), &self.to_geojson()?)
            .with_context(|| format!("[layer::write_geojson] Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Build the GeoJSON FeatureCollection for this layer.
    pub fn to_geojson(&self) -> Result<Value> {
        let columns = self.data.get_columns();

        let features = self.geoms.shapes().iter().enumerate()
            .map(|(row, shape)| {
                let mut properties = Map::new();
                for column in columns {
                    properties.insert(column.name().to_string(), any_value_to_json(column.get(row)?));
                }
                Ok(json!({
                    "type": "Feature",
                    "geometry": multipolygon_to_geojson(shape),
                    "properties": properties,
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(json!({
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", self.crs_epsg()) } },
            "features": features,
        }))
    }

    /// EPSG code of the layer's current CRS.
    fn crs_epsg(&self) -> u32 {
        match (self.utm, self.geoms.epsg()) {
            (Some(zone), _) => zone.epsg(),
            (None, Some(epsg)) => epsg,
            (None, None) => common::EPSG_WGS84,
        }
    }

    /// ESRI WKT of the layer's current CRS.
    fn crs_wkt(&self) -> String {
        match self.utm {
            Some(zone) => zone.esri_wkt(),
            None => geographic_wkt(self.geoms.epsg().unwrap_or(common::EPSG_WGS84)).to_string(),
        }
    }
}

fn any_value_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => json!(b),
        AnyValue::String(s) => json!(s),
        AnyValue::StringOwned(s) => json!(s.as_str()),
        AnyValue::Float32(v) => json!(v),
        AnyValue::Float64(v) => json!(v),
        other if other.dtype().is_integer() => other.extract::<i64>().map_or(Value::Null, |v| json!(v)),
        other => json!(other.to_string()),
    }
}

/// GeoJSON geometry for a MultiPolygon; each polygon is [exterior, holes...].
fn multipolygon_to_geojson(shape: &MultiPolygon<f64>) -> Value {
    if shape.0.is_empty() { return Value::Null }

    let ring = |ring: &geo::LineString<f64>| ring.coords().map(|c| [c.x, c.y]).collect::<Vec<_>>();
    let polygons = shape.0.iter()
        .map(|polygon| std::iter::once(ring(polygon.exterior()))
            .chain(polygon.interiors().iter().map(ring))
            .collect::<Vec<_>>())
        .collect::<Vec<_>>();

    json!({ "type": "MultiPolygon", "coordinates": polygons })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{tests::square, Geometries};

    fn layer() -> Layer {
        let geoms = Geometries::new(vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0)], Some(common::EPSG_NAD83));
        Layer::new(geoms, df!(
            "NAME" => ["west", "east"],
            "TOTPOP" => [100i64, 250],
            "SHARE" => [0.25, 0.75],
        ).unwrap()).unwrap()
    }

    #[test]
    fn shapefile_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out/IL.shp");
        layer().write_shapefile(&path).unwrap();

        assert!(path.with_extension("dbf").is_file());
        assert!(path.with_extension("shx").is_file());

        let back = Layer::from_shapefile(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.geoms().epsg(), Some(common::EPSG_NAD83));
        assert_eq!(back.data().get_column_names_str(), vec!["NAME", "SHARE", "TOTPOP"]);
        assert_eq!(back.column_sum("TOTPOP"), Some(350.0));
        assert_eq!(back.data().column("NAME").unwrap().str().unwrap().get(1), Some("east"));
        assert!((back.column_sum("SHARE").unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn geojson_has_properties_and_crs() {
        let value = layer().to_geojson().unwrap();
        assert_eq!(value["crs"]["properties"]["name"], "urn:ogc:def:crs:EPSG::4269");

        let feature = &value["features"][1];
        assert_eq!(feature["properties"]["NAME"], "east");
        assert_eq!(feature["properties"]["TOTPOP"], 250);
        assert_eq!(feature["geometry"]["type"], "MultiPolygon");
        // One polygon, one ring, five closed coordinates.
        assert_eq!(feature["geometry"]["coordinates"][0][0].as_array().unwrap().len(), 5);
    }

    #[test]
    fn geojson_file_is_written() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("IL.geojson");
        layer().write_geojson(&path).unwrap();
        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["features"].as_array().unwrap().len(), 2);
    }
}
