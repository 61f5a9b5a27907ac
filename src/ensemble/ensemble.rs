use std::{fs::File, path::Path};

use anyhow::{ensure, Context, Result};
use polars::{frame::DataFrame, io::{SerReader, SerWriter}, prelude::{Column, CsvReader, CsvWriter, DataType}};
use tracing::warn;

use crate::{election::{Election, Party}, partition::Partition};

const STEP: &str = "step";
const CUT_EDGES: &str = "cutedge_ensemble";
const DEMWIN_SUFFIX: &str = "_demwin_ensemble";
const MEAN_MEDIAN_PREFIX: &str = "mean_median_diff_";
const EFFICIENCY_GAP_PREFIX: &str = "efficiency_gap_";

/// Per-state statistics of a chain run, one row per recorded partition.
///
/// Columns are `step`, `cutedge_ensemble`, then for each election alias
/// `<alias>_demwin_ensemble`, `mean_median_diff_<alias>` and `efficiency_gap_<alias>`
/// (grouped by statistic). Undefined metrics are stored as NaN.
#[derive(Clone, Debug, Default)]
pub struct Ensemble {
    elections: Vec<Election>,
    columns: Vec<(String, Vec<f64>)>,
}

impl Ensemble {
    pub fn new(elections: Vec<Election>) -> Self {
        let names = std::iter::once(STEP.to_string())
            .chain(std::iter::once(CUT_EDGES.to_string()))
            .chain(elections.iter().map(|e| format!("{}{DEMWIN_SUFFIX}", e.alias())))
            .chain(elections.iter().map(|e| format!("{MEAN_MEDIAN_PREFIX}{}", e.alias())))
            .chain(elections.iter().map(|e| format!("{EFFICIENCY_GAP_PREFIX}{}", e.alias())));

        Self { columns: names.map(|name| (name, Vec::new())).collect(), elections }
    }

    /// Number of recorded rows.
    #[inline] pub fn len(&self) -> usize { self.columns.first().map_or(0, |(_, values)| values.len()) }

    #[inline] pub fn is_empty(&self) -> bool { self.len() == 0 }

    #[inline] pub fn elections(&self) -> &[Election] { &self.elections }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, values)| values.as_slice())
    }

    /// Append the statistics of `partition` as the row for `step`.
    pub fn record(&mut self, step: usize, partition: &Partition) {
        assert!(self.columns.len() == 2 + 3 * self.elections.len(),
            "ensemble has no elections to score (was it read from CSV?)");

        let results = self.elections.iter().map(|e| e.results(partition)).collect::<Vec<_>>();
        let metric = |value: Option<f64>, name: &str, alias: &str| value.unwrap_or_else(|| {
            warn!(step, election = alias, "[ensemble] {name} undefined without votes; recording NaN");
            f64::NAN
        });

        let row = [step as f64, partition.cut_edge_count() as f64].into_iter()
            .chain(results.iter().map(|r| r.seats(Party::Democratic) as f64))
            .chain(results.iter().zip(&self.elections).map(|(r, e)| metric(r.mean_median(), "mean-median", e.alias())))
            .chain(results.iter().zip(&self.elections).map(|(r, e)| metric(r.efficiency_gap(), "efficiency gap", e.alias())))
            .collect::<Vec<_>>();

        self.columns.iter_mut().zip(row).for_each(|((_, values), value)| values.push(value));
    }

    /// Convert to a DataFrame. Step, cut-edge and seat columns are integers.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns = self.columns.iter()
            .map(|(name, values)| if is_count_column(name) {
                Column::new(name.as_str().into(), values.iter().map(|&v| v as i64).collect::<Vec<_>>())
            } else {
                Column::new(name.as_str().into(), values.clone())
            })
            .collect::<Vec<_>>();

        DataFrame::new(columns).context("[ensemble::to_dataframe] Failed to build DataFrame")
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut df = self.to_dataframe()?;
        let file = File::create(path)
            .with_context(|| format!("[ensemble::write_csv] Failed to create CSV file: {}", path.display()))?;
        CsvWriter::new(file)
            .finish(&mut df)
            .with_context(|| format!("[ensemble::write_csv] Failed to write CSV to {}", path.display()))
    }

    /// Read an ensemble written by [`Ensemble::write_csv`]. Election aliases are
    /// recovered from column names, so the result can be inspected but not extended.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("[ensemble::read_csv] Failed to open CSV file: {}", path.display()))?;
        let df = CsvReader::new(file)
            .finish()
            .with_context(|| format!("[ensemble::read_csv] Failed to read CSV from {}", path.display()))?;

        Self::from_dataframe(&df)
    }

    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        ensure!(df.column(STEP).is_ok() && df.column(CUT_EDGES).is_ok(),
            "[ensemble::from_dataframe] Missing {STEP:?} or {CUT_EDGES:?} column");

        let columns = df.get_columns().iter()
            .map(|column| {
                let values = column.cast(&DataType::Float64)
                    .and_then(|c| Ok(c.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect::<Vec<_>>()))
                    .with_context(|| format!("[ensemble::from_dataframe] Column {:?} is not numeric", column.name()))?;
                Ok((column.name().to_string(), values))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { elections: Vec::new(), columns })
    }

    /// Election aliases present in the columns, in column order.
    pub fn aliases(&self) -> Vec<&str> {
        self.column_names().filter_map(|name| name.strip_suffix(DEMWIN_SUFFIX)).collect()
    }
}

/// Columns holding whole-number counts.
fn is_count_column(name: &str) -> bool {
    name == STEP || name == CUT_EDGES || name.ends_with(DEMWIN_SUFFIX)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::graph::Graph;

    /// Path of four precincts split into two districts of two.
    fn partition(assignments: Vec<u32>) -> Partition {
        let graph = Graph::new(4,
            &[vec![1], vec![0, 2], vec![1, 3], vec![2]],
            &[vec![1.0], vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0]],
            HashMap::from([
                ("D".to_string(), vec![40, 20, 15, 15]),
                ("R".to_string(), vec![10, 30, 35, 35]),
                ("D0".to_string(), vec![0, 0, 0, 0]),
                ("R0".to_string(), vec![0, 0, 0, 0]),
            ]),
            HashMap::new(),
        );
        Partition::with_assignments(2, graph, assignments)
    }

    fn elections() -> Vec<Election> {
        vec![Election::new("TEST", "test", "D", "R"), Election::new("EMPTY", "empty", "D0", "R0")]
    }

    #[test]
    fn columns_follow_election_aliases() {
        let ensemble = Ensemble::new(elections());
        assert_eq!(ensemble.column_names().collect::<Vec<_>>(), vec![
            "step", "cutedge_ensemble",
            "test_demwin_ensemble", "empty_demwin_ensemble",
            "mean_median_diff_test", "mean_median_diff_empty",
            "efficiency_gap_test", "efficiency_gap_empty",
        ]);
        assert!(ensemble.is_empty());
        assert_eq!(ensemble.aliases(), vec!["test", "empty"]);
    }

    #[test]
    fn records_one_row_per_state() {
        let mut ensemble = Ensemble::new(elections());
        ensemble.record(0, &partition(vec![1, 1, 2, 2]));
        ensemble.record(1, &partition(vec![1, 2, 2, 2]));

        assert_eq!(ensemble.len(), 2);
        assert_eq!(ensemble.column("step"), Some(&[0.0, 1.0][..]));
        assert_eq!(ensemble.column("cutedge_ensemble"), Some(&[1.0, 1.0][..]));
        // Districts (60, 40) and (30, 70), then (40, 10) and (50, 100).
        assert_eq!(ensemble.column("test_demwin_ensemble"), Some(&[1.0, 1.0][..]));

        let gap = ensemble.column("efficiency_gap_test").unwrap()[0];
        assert!((gap - 0.10).abs() < 1e-12);
        assert!(ensemble.column("mean_median_diff_empty").unwrap().iter().all(|v| v.is_nan()));
        assert_eq!(ensemble.column("empty_demwin_ensemble"), Some(&[0.0, 0.0][..]));
    }

    #[test]
    fn csv_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ensembles.csv");

        let mut ensemble = Ensemble::new(vec![Election::new("TEST", "test", "D", "R")]);
        ensemble.record(0, &partition(vec![1, 1, 2, 2]));
        ensemble.record(1, &partition(vec![1, 1, 1, 2]));
        ensemble.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("step,cutedge_ensemble,test_demwin_ensemble,mean_median_diff_test,efficiency_gap_test\n0,1,1,"));

        let read = Ensemble::read_csv(&path).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read.aliases(), vec!["test"]);
        for name in ensemble.column_names() {
            let (a, b) = (ensemble.column(name).unwrap(), read.column(name).unwrap());
            assert!(a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-12), "{name}: {a:?} vs {b:?}");
        }
    }

    #[test]
    fn reading_requires_step_and_cut_edges() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(Ensemble::read_csv(&path).is_err());
    }

    #[test]
    #[should_panic(expected = "no elections to score")]
    fn read_ensembles_cannot_record() {
        let mut ensemble = Ensemble::new(elections());
        ensemble.record(0, &partition(vec![1, 1, 2, 2]));
        let mut read = Ensemble::from_dataframe(&ensemble.to_dataframe().unwrap()).unwrap();
        read.record(1, &partition(vec![1, 1, 2, 2]));
    }
}
