use anyhow::{bail, ensure, Context, Result};
use polars::prelude::*;
use tracing::{info, warn};

use crate::layer::Layer;

impl Layer {
    /// Sum `columns` of `source` onto the rows of `self`, where `assignment[i]` is
    /// the row of `self` that contains source unit `i`. Rows with no sources get 0.
    /// Integer columns stay integers.
    pub fn aggregate_from(&mut self, source: &Layer, assignment: &[u32], columns: &[&str]) -> Result<()> {
        ensure!(assignment.len() == source.len(),
            "[layer::aggregate_from] assignment has {} entries for {} source units", assignment.len(), source.len());
        ensure!(assignment.iter().all(|&t| (t as usize) < self.len()),
            "[layer::aggregate_from] assignment refers to a unit outside the target layer");

        for &name in columns {
            let column = source.data.column(name)
                .with_context(|| format!("[layer::aggregate_from] Missing source column {name:?}"))?;
            if !column.dtype().is_primitive_numeric() {
                bail!("[layer::aggregate_from] Column {name:?} is not numeric ({})", column.dtype());
            }

            let values = column.cast(&DataType::Float64)?;
            let mut sums = vec![0.0; self.len()];
            for (value, &target) in values.f64()?.into_iter().zip(assignment) {
                sums[target as usize] += value.unwrap_or(0.0);
            }

            let aggregated = if column.dtype().is_integer() {
                Column::new(name.into(), sums.iter().map(|&v| v as i64).collect::<Vec<_>>())
            } else {
                Column::new(name.into(), sums)
            };
            self.data.with_column(aggregated)?;
        }

        Ok(())
    }

    /// Copy `label` from `target` onto each unit of `self` as column `name`,
    /// where `assignment[i]` is the target unit containing unit `i`.
    pub fn relabel(&mut self, assignment: &[u32], target: &Layer, label: &str, name: &str) -> Result<()> {
        ensure!(assignment.len() == self.len(),
            "[layer::relabel] assignment has {} entries for {} units", assignment.len(), self.len());
        ensure!(assignment.iter().all(|&t| (t as usize) < target.len()),
            "[layer::relabel] assignment refers to a unit outside the target layer");

        let labels = target.data.column(label)
            .with_context(|| format!("[layer::relabel] Missing label column {label:?}"))?;
        let indices = assignment.iter().map(|&t| t as IdxSize).collect::<Vec<_>>();
        let mut relabeled = labels.as_materialized_series().take_slice(&indices)?;
        relabeled.rename(name.into());

        self.data.with_column(relabeled)?;
        Ok(())
    }

    /// Rename columns; names not present are skipped with a warning.
    pub fn rename<S: AsRef<str>>(&mut self, names: &[(S, S)]) -> Result<()> {
        for (from, to) in names {
            let (from, to) = (from.as_ref(), to.as_ref());
            if self.data.column(from).is_err() {
                warn!(column = from, "cannot rename missing column");
                continue
            }
            self.data.rename(from, to.into())
                .with_context(|| format!("[layer::rename] Failed to rename {from:?} to {to:?}"))?;
        }
        Ok(())
    }

    /// Drop columns; names not present are skipped with a warning.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        for name in names.iter().map(AsRef::as_ref) {
            if self.data.drop_in_place(name).is_err() {
                warn!(column = name, "cannot drop missing column");
            }
        }
        Ok(())
    }

    /// Log the totals of `columns` in `source` next to their totals in `self`.
    /// Returns false if any pair differs.
    pub fn log_conservation(&self, source: &Layer, columns: &[&str]) -> bool {
        columns.iter().fold(true, |ok, &name| {
            let (before, after) = (source.column_sum(name), self.column_sum(name));
            info!(column = name, source = ?before, aggregated = ?after, "population total");
            match (before, after) {
                (Some(a), Some(b)) if (a - b).abs() <= 1e-6 * a.abs().max(1.0) => ok,
                _ => { warn!(column = name, "aggregated total does not match source"); false }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{tests::square, Geometries};

    fn blocks() -> Layer {
        let geoms = Geometries::new((0..4).map(|i| square(i as f64, 0.0, 1.0)).collect(), None);
        Layer::new(geoms, df!(
            "POP" => [1i64, 2, 3, 4],
            "SHARE" => [0.5, 0.25, 0.125, 0.125],
        ).unwrap()).unwrap()
    }

    fn precincts() -> Layer {
        let geoms = Geometries::new(vec![square(0.0, 0.0, 2.0), square(2.0, 0.0, 2.0), square(4.0, 0.0, 2.0)], None);
        Layer::new(geoms, df!("NAME" => ["p0", "p1", "p2"]).unwrap()).unwrap()
    }

    #[test]
    fn aggregation_conserves_totals_and_types() {
        let (blocks, mut precincts) = (blocks(), precincts());
        precincts.aggregate_from(&blocks, &[0, 0, 1, 1], &["POP", "SHARE"]).unwrap();

        let pop = precincts.data().column("POP").unwrap();
        assert_eq!(pop.dtype(), &DataType::Int64);
        assert_eq!(pop.i64().unwrap().into_no_null_iter().collect::<Vec<_>>(), vec![3, 7, 0]);
        assert_eq!(precincts.data().column("SHARE").unwrap().f64().unwrap().get(0), Some(0.75));
        assert!(precincts.log_conservation(&blocks, &["POP", "SHARE"]));
    }

    #[test]
    fn aggregation_rejects_bad_input() {
        let (blocks, mut precincts) = (blocks(), precincts());
        assert!(precincts.aggregate_from(&blocks, &[0, 0, 1], &["POP"]).is_err());
        assert!(precincts.aggregate_from(&blocks, &[0, 0, 1, 7], &["POP"]).is_err());
        assert!(precincts.aggregate_from(&blocks, &[0, 0, 1, 1], &["MISSING"]).is_err());
    }

    #[test]
    fn relabel_copies_target_labels() {
        let (mut blocks, precincts) = (blocks(), precincts());
        blocks.relabel(&[2, 0, 0, 1], &precincts, "NAME", "PRECINCT").unwrap();
        let labels = blocks.data().column("PRECINCT").unwrap().str().unwrap()
            .into_no_null_iter().collect::<Vec<_>>();
        assert_eq!(labels, vec!["p2", "p0", "p0", "p1"]);
    }

    #[test]
    fn rename_and_drop_skip_missing_columns() {
        let mut layer = blocks();
        layer.rename(&[("POP", "TOTPOP"), ("NOPE", "X")]).unwrap();
        layer.drop_columns(&["SHARE", "ALSO_NOPE"]).unwrap();
        assert_eq!(layer.data().get_column_names_str(), vec!["TOTPOP"]);
    }
}
