use std::{collections::{BTreeSet, HashMap}, path::Path};

use anyhow::{ensure, Context, Result};
use polars::prelude::*;
use shapefile::dbase::{FieldValue, Record};
use tracing::{debug, warn};

use crate::{common, geom::{Geometries, UtmZone}};

/// A set of geographic units: one shape and one attribute row per unit.
#[derive(Debug, Clone)]
pub struct Layer {
    pub(super) geoms: Geometries,
    pub(super) data: DataFrame,
    pub(super) utm: Option<UtmZone>, // Set once reprojected
}

impl Layer {
    /// Pair geometries with an attribute table of the same height.
    pub fn new(geoms: Geometries, data: DataFrame) -> Result<Self> {
        ensure!(geoms.len() == data.height(),
            "[layer::new] {} shapes but {} attribute rows", geoms.len(), data.height());
        Ok(Self { geoms, data, utm: None })
    }

    /// Load a layer from a `.shp` file and its `.dbf`/`.prj` sidecars.
    pub fn from_shapefile(path: &Path) -> Result<Self> {
        common::require_file_exists(path)?;

        let (shapes, records) = common::read_from_shapefile(path)?;
        let data = records_to_dataframe(records)
            .with_context(|| format!("[layer::from_shapefile] Failed to read attributes of {}", path.display()))?;
        let geoms = Geometries::new(shapes, common::epsg_from_shapefile(path));

        debug!(path = %path.display(), units = geoms.len(), columns = data.width(), epsg = ?geoms.epsg(), "loaded shapefile");
        Self::new(geoms, data)
    }

    #[inline] pub fn len(&self) -> usize { self.geoms.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.geoms.is_empty() }

    #[inline] pub fn geoms(&self) -> &Geometries { &self.geoms }

    #[inline] pub fn data(&self) -> &DataFrame { &self.data }

    /// UTM zone the layer has been projected to, if any.
    #[inline] pub fn utm_zone(&self) -> Option<UtmZone> { self.utm }

    /// Validate geometries: no empty shapes and no overlapping units.
    pub fn doctor(&self) -> Result<()> {
        self.geoms.doctor()
    }

    /// Reproject to the UTM zone at the center of the layer's bounds.
    /// A layer that is already projected is left as is.
    pub fn to_utm(&self) -> Result<Self> {
        let Some(zone) = self.geoms.estimate_utm_zone() else { return Ok(self.clone()) };
        self.to_utm_zone(zone)
    }

    /// Reproject to a specific UTM zone, so several layers can share one CRS.
    pub fn to_utm_zone(&self, zone: UtmZone) -> Result<Self> {
        if self.geoms.epsg().is_none() { return Ok(self.clone()) }
        debug!(epsg = zone.epsg(), "reprojecting layer");
        Ok(Self { geoms: self.geoms.to_utm(zone)?, data: self.data.clone(), utm: Some(zone) })
    }

    /// Sum of a numeric column, or None if it is missing or not numeric.
    pub fn column_sum(&self, name: &str) -> Option<f64> {
        let column = self.data.column(name).ok()?;
        if !column.dtype().is_primitive_numeric() { return None }
        column.cast(&DataType::Float64).ok()?.f64().ok()?.sum()
    }
}

/// Convert DBF records to a DataFrame, one column per field, in name order.
/// Numeric fields holding only whole numbers become Int64 columns.
fn records_to_dataframe(records: Vec<Record>) -> Result<DataFrame> {
    let rows = records.into_iter()
        .map(|record| record.into_iter().collect::<HashMap<String, FieldValue>>())
        .collect::<Vec<_>>();
    let names = rows.iter().flat_map(|row| row.keys().cloned()).collect::<BTreeSet<_>>();

    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let values = rows.iter().map(|row| row.get(&name)).collect::<Vec<_>>();
        let Some(first) = values.iter().flatten().next() else { continue };

        let column = match first {
            FieldValue::Character(_) | FieldValue::Memo(_) => Column::new(name.as_str().into(),
                values.iter().map(|v| match v {
                    Some(FieldValue::Character(Some(s))) => Some(s.trim().to_string()),
                    Some(FieldValue::Memo(s)) => Some(s.trim().to_string()),
                    _ => None,
                }).collect::<Vec<_>>()),
            FieldValue::Logical(_) => Column::new(name.as_str().into(),
                values.iter().map(|v| match v {
                    Some(FieldValue::Logical(b)) => *b,
                    _ => None,
                }).collect::<Vec<_>>()),
            FieldValue::Numeric(_) | FieldValue::Float(_) | FieldValue::Integer(_)
            | FieldValue::Double(_) | FieldValue::Currency(_) => {
                let numbers = values.iter().map(|v| match v {
                    Some(FieldValue::Numeric(n)) => *n,
                    Some(FieldValue::Float(f)) => f.map(f64::from),
                    Some(FieldValue::Integer(i)) => Some(f64::from(*i)),
                    Some(FieldValue::Double(d) | FieldValue::Currency(d)) => Some(*d),
                    _ => None,
                }).collect::<Vec<_>>();

                if numbers.iter().flatten().all(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64) {
                    Column::new(name.as_str().into(), numbers.iter().map(|n| n.map(|n| n as i64)).collect::<Vec<_>>())
                } else {
                    Column::new(name.as_str().into(), numbers)
                }
            }
            other => {
                warn!(field = %name, kind = ?other, "skipping unsupported DBF field type");
                continue
            }
        };
        columns.push(column);
    }

    Ok(DataFrame::new(columns)?)
}
