mod support;

use ilmander::{run_merge, Layer, MergeConfig};
use polars::prelude::DataType;

/// Two precincts side by side, each split into four census blocks, one district each.
#[test]
fn merge_aggregates_blocks_and_labels_districts() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    let xs = support::grid_lines(-89.71, 0.005, 8);
    let ys = support::grid_lines(39.69, 0.005, 4);

    // Blocks fill the 4x2 cells between xs[2..6] and ys[2..4].
    let blocks = (0..8)
        .map(|i| {
            let (col, row) = (2 + i % 4, 2 + i / 4);
            support::rect(xs[col], ys[row], xs[col + 1], ys[row + 1])
        })
        .collect::<Vec<_>>();
    support::write_layer(&dir.join("p2.shp"), blocks.clone(), vec![("P0020001", (1..=8).collect())]);
    support::write_layer(&dir.join("p4.shp"), blocks, vec![("P0040001", vec![1; 8])]);
    support::write_layer(&dir.join("vest.shp"),
        vec![support::rect(xs[2], ys[2], xs[4], ys[4]), support::rect(xs[4], ys[2], xs[6], ys[4])],
        vec![("G20PREDBID", vec![60, 30]), ("G20PRERTRU", vec![40, 70]), ("G20PRELJOR", vec![1, 2])],
    );
    support::write_layer(&dir.join("sldu.shp"),
        vec![support::rect(xs[4], ys[0], xs[8], ys[4]), support::rect(xs[0], ys[0], xs[4], ys[4])],
        vec![("DISTRICTN", vec![7, 3])],
    );

    let config = MergeConfig {
        population: dir.join("p2.shp"),
        vap: dir.join("p4.shp"),
        precincts: dir.join("vest.shp"),
        districts: dir.join("sldu.shp"),
        pop_columns: vec!["P0020001".into()],
        vap_columns: vec!["P0040001".into()],
        ..Default::default()
    };
    let outputs = run_merge(&config, &dir.join("IL")).unwrap();
    assert!(outputs.geojson.is_file());

    let merged = Layer::from_shapefile(&outputs.shapefile).unwrap();
    let data = merged.data();
    assert_eq!(merged.len(), 2);
    assert!(merged.geoms().epsg().is_none());

    let column = |name: &str| data.column(name).unwrap().cast(&DataType::Float64).unwrap()
        .f64().unwrap().into_iter().map(|v| v.unwrap()).collect::<Vec<_>>();

    // Left precinct holds blocks 0, 1, 4, 5; the right one blocks 2, 3, 6, 7.
    assert_eq!(column("TOTPOP"), vec![1.0 + 2.0 + 5.0 + 6.0, 3.0 + 4.0 + 7.0 + 8.0]);
    assert_eq!(column("VAP"), vec![4.0, 4.0]);
    assert_eq!(column("G20PRED"), vec![60.0, 30.0]);
    assert_eq!(column("SSD"), vec![3.0, 7.0]);
    assert!(data.column("G20PRELJOR").is_err());
    assert!(data.column("G20PREDBID").is_err());
}
