use std::collections::HashMap;

use ndarray::{Array2, Axis};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightType { I64, F64 }

/// Node weights stored as type-separated matrices, one column per named series.
#[derive(Clone, Debug, Default)]
pub struct WeightMatrix {
    series: HashMap<String, (WeightType, usize)>, // len = k_i + k_f
    i64: Array2<i64>, // (n, k_i)
    f64: Array2<f64>, // (n, k_f)
}

impl WeightMatrix {
    /// Build a matrix with `num_rows` rows from named integer and float series.
    /// Series columns are laid out in name order.
    pub fn new(num_rows: usize, weights_i64: HashMap<String, Vec<i64>>, weights_f64: HashMap<String, Vec<f64>>) -> Self {
        let mut names_i64 = weights_i64.keys().cloned().collect::<Vec<_>>();
        let mut names_f64 = weights_f64.keys().cloned().collect::<Vec<_>>();
        names_i64.sort();
        names_f64.sort();

        let mut i64 = Array2::zeros((num_rows, names_i64.len()));
        for (k, name) in names_i64.iter().enumerate() {
            let values = &weights_i64[name];
            assert!(values.len() == num_rows, "series {name} must have {num_rows} values");
            i64.column_mut(k).iter_mut().zip(values).for_each(|(dst, &v)| *dst = v);
        }

        let mut f64 = Array2::zeros((num_rows, names_f64.len()));
        for (k, name) in names_f64.iter().enumerate() {
            let values = &weights_f64[name];
            assert!(values.len() == num_rows, "series {name} must have {num_rows} values");
            f64.column_mut(k).iter_mut().zip(values).for_each(|(dst, &v)| *dst = v);
        }

        let series = names_i64.into_iter().enumerate().map(|(k, name)| (name, (WeightType::I64, k)))
            .chain(names_f64.into_iter().enumerate().map(|(k, name)| (name, (WeightType::F64, k))))
            .collect();

        Self { series, i64, f64 }
    }

    /// A zeroed matrix with the same series layout and `num_rows` rows.
    pub fn copy_of_size(&self, num_rows: usize) -> Self {
        Self {
            series: self.series.clone(),
            i64: Array2::zeros((num_rows, self.i64.ncols())),
            f64: Array2::zeros((num_rows, self.f64.ncols())),
        }
    }

    #[inline] pub fn num_rows(&self) -> usize { self.i64.nrows().max(self.f64.nrows()) }

    #[inline] pub fn contains(&self, series: &str) -> bool { self.series.contains_key(series) }

    /// Names of all series, sorted.
    pub fn series_names(&self) -> Vec<&str> {
        let mut names = self.series.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Value of `series` at `row`, widened to f64. None if the series is unknown.
    pub fn get_as_f64(&self, series: &str, row: usize) -> Option<f64> {
        match self.series.get(series)? {
            (WeightType::I64, k) => Some(self.i64[(row, *k)] as f64),
            (WeightType::F64, k) => Some(self.f64[(row, *k)]),
        }
    }

    /// Add `other[other_row]` into `self[row]`.
    pub fn add_row_from(&mut self, row: usize, other: &WeightMatrix, other_row: usize) {
        self.i64.row_mut(row).scaled_add(1, &other.i64.row(other_row));
        self.f64.row_mut(row).scaled_add(1.0, &other.f64.row(other_row));
    }

    /// Subtract `other[other_row]` from `self[row]`.
    pub fn subtract_row_from(&mut self, row: usize, other: &WeightMatrix, other_row: usize) {
        self.i64.row_mut(row).scaled_add(-1, &other.i64.row(other_row));
        self.f64.row_mut(row).scaled_add(-1.0, &other.f64.row(other_row));
    }

    /// Add the sum of `other[rows]` into `self[row]`.
    pub fn add_rows_from(&mut self, row: usize, other: &WeightMatrix, rows: &[usize]) {
        self.i64.row_mut(row).scaled_add(1, &other.i64.select(Axis(0), rows).sum_axis(Axis(0)));
        self.f64.row_mut(row).scaled_add(1.0, &other.f64.select(Axis(0), rows).sum_axis(Axis(0)));
    }

    /// Subtract the sum of `other[rows]` from `self[row]`.
    pub fn subtract_rows_from(&mut self, row: usize, other: &WeightMatrix, rows: &[usize]) {
        self.i64.row_mut(row).scaled_add(-1, &other.i64.select(Axis(0), rows).sum_axis(Axis(0)));
        self.f64.row_mut(row).scaled_add(-1.0, &other.f64.select(Axis(0), rows).sum_axis(Axis(0)));
    }

    /// Overwrite `self[row]` with the column sums of `other`.
    pub fn set_row_to_sum_of(&mut self, row: usize, other: &WeightMatrix) {
        self.i64.row_mut(row).assign(&other.i64.sum_axis(Axis(0)));
        self.f64.row_mut(row).assign(&other.f64.sum_axis(Axis(0)));
    }

    /// Zero every row.
    pub fn clear_all_rows(&mut self) {
        self.i64.fill(0);
        self.f64.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_weights() -> WeightMatrix {
        WeightMatrix::new(
            3,
            HashMap::from([("POP".to_string(), vec![10, 20, 30])]),
            HashMap::from([("AREA".to_string(), vec![0.5, 1.5, 2.0])]),
        )
    }

    #[test]
    fn series_lookup_by_name() {
        let weights = make_weights();
        assert!(weights.contains("POP") && weights.contains("AREA"));
        assert!(!weights.contains("VAP"));
        assert_eq!(weights.series_names(), vec!["AREA", "POP"]);
        assert_eq!(weights.get_as_f64("POP", 1), Some(20.0));
        assert_eq!(weights.get_as_f64("AREA", 2), Some(2.0));
        assert_eq!(weights.get_as_f64("VAP", 0), None);
    }

    #[test]
    fn row_arithmetic() {
        let units = make_weights();
        let mut parts = units.copy_of_size(2);
        assert_eq!(parts.num_rows(), 2);
        assert_eq!(parts.get_as_f64("POP", 0), Some(0.0));

        parts.set_row_to_sum_of(0, &units);
        assert_eq!(parts.get_as_f64("POP", 0), Some(60.0));
        assert_eq!(parts.get_as_f64("AREA", 0), Some(4.0));

        parts.subtract_rows_from(0, &units, &[0, 2]);
        parts.add_rows_from(1, &units, &[0, 2]);
        assert_eq!(parts.get_as_f64("POP", 0), Some(20.0));
        assert_eq!(parts.get_as_f64("POP", 1), Some(40.0));

        parts.subtract_row_from(1, &units, 2);
        parts.add_row_from(0, &units, 2);
        assert_eq!(parts.get_as_f64("POP", 0), Some(50.0));
        assert_eq!(parts.get_as_f64("AREA", 1), Some(0.5));

        parts.clear_all_rows();
        assert_eq!(parts.get_as_f64("POP", 0), Some(0.0));
    }

    #[test]
    #[should_panic(expected = "series POP must have 3 values")]
    fn new_panics_on_short_series() {
        WeightMatrix::new(3, HashMap::from([("POP".to_string(), vec![1, 2])]), HashMap::new());
    }
}
