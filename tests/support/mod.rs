use std::path::Path;

use geo::{coord, MultiPolygon, Rect};
use ilmander::{Geometries, Layer};
use polars::prelude::{Column, DataFrame};

/// `count + 1` grid line positions starting at `origin`, shared by every cell that uses them.
pub fn grid_lines(origin: f64, step: f64, count: usize) -> Vec<f64> {
    (0..=count).map(|i| origin + step * i as f64).collect()
}

/// Axis-aligned rectangle, in degrees.
pub fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> MultiPolygon<f64> {
    MultiPolygon(vec![Rect::new(coord! { x: min_x, y: min_y }, coord! { x: max_x, y: max_y }).to_polygon()])
}

/// Write a NAD83 layer of shapes and integer columns as a shapefile.
pub fn write_layer(path: &Path, shapes: Vec<MultiPolygon<f64>>, columns: Vec<(&str, Vec<i64>)>) {
    let data = DataFrame::new(columns.into_iter()
        .map(|(name, values)| Column::new(name.into(), values))
        .collect()).unwrap();
    Layer::new(Geometries::new(shapes, Some(4269)), data).unwrap()
        .write_shapefile(path).unwrap();
}
