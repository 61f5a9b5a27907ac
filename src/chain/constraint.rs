use std::fmt;

use crate::partition::Partition;

#[derive(Clone, Debug, PartialEq)]
enum ConstraintKind {
    PopulationBounds { series: String, min: f64, max: f64 },
    CutEdgeUpperBound { bound: usize },
    Contiguous,
}

/// A validity test every state of a chain must pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    kind: ConstraintKind,
}

impl Constraint {
    /// Every district's `series` total lies within `tolerance` of the ideal,
    /// where the ideal is the statewide total of `initial` over its district count.
    pub fn within_percent_of_ideal_population(initial: &Partition, tolerance: f64, series: &str) -> Self {
        let ideal = initial.total(series) / initial.num_districts() as f64;
        Self::population_bounds(series, ideal * (1.0 - tolerance), ideal * (1.0 + tolerance))
    }

    /// Every district's `series` total lies in `[min, max]`.
    pub fn population_bounds(series: &str, min: f64, max: f64) -> Self {
        Self { kind: ConstraintKind::PopulationBounds { series: series.to_string(), min, max } }
    }

    /// At most `bound` cut edges.
    pub fn cut_edge_upper_bound(bound: usize) -> Self {
        Self { kind: ConstraintKind::CutEdgeUpperBound { bound } }
    }

    /// Every district induces a connected subgraph.
    pub fn contiguous() -> Self {
        Self { kind: ConstraintKind::Contiguous }
    }

    pub fn is_satisfied(&self, partition: &Partition) -> bool {
        match &self.kind {
            ConstraintKind::PopulationBounds { series, min, max } => {
                partition.part_totals(series).iter().all(|pop| (*min..=*max).contains(pop))
            },
            ConstraintKind::CutEdgeUpperBound { bound } => partition.cut_edge_count() <= *bound,
            ConstraintKind::Contiguous => partition.all_contiguous(),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConstraintKind::PopulationBounds { series, min, max } => write!(f, "{series} within [{min:.1}, {max:.1}]"),
            ConstraintKind::CutEdgeUpperBound { bound } => write!(f, "at most {bound} cut edges"),
            ConstraintKind::Contiguous => write!(f, "contiguous districts"),
        }
    }
}
