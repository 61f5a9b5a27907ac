use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use crate::{
    chain::{always_accept, Constraint, MarkovChain, Recom},
    common,
    config::ChainConfig,
    election::Party,
    ensemble::Ensemble,
    graph::Graph,
    layer::Layer,
    partition::Partition,
    plot::{BoxPlot, Histogram},
};

/// A ReCom chain accepting every valid proposal.
pub type RecomChain = MarkovChain<Recom, fn(&Partition) -> bool>;

/// Build the precinct dual graph of a shapefile and read its enacted plan.
pub fn load_initial_partition(shapefile: &Path, config: &ChainConfig) -> Result<Partition> {
    common::require_file_exists(shapefile)?;
    let layer = Layer::from_shapefile(shapefile)
        .with_context(|| format!("[analysis] Failed to load precinct layer {}", shapefile.display()))?;

    let graph = Graph::from_layer(&layer, &config.series(), config.adjacency)
        .context("[analysis] Failed to build dual graph")?;
    info!(nodes = graph.node_count(), edges = graph.edge_count() / 2, "built dual graph");

    let partition = Partition::from_layer_column(graph, &layer, &config.assignment_column, config.num_districts)
        .context("[analysis] Failed to read enacted plan")?;
    info!(districts = partition.num_districts(), cut_edges = partition.cut_edge_count(), "loaded initial plan");

    Ok(partition)
}

/// Constraints named by the config: population balance always, cut edges and contiguity on request.
pub fn constraints(initial: &Partition, config: &ChainConfig) -> Vec<Constraint> {
    let mut constraints = vec![
        Constraint::within_percent_of_ideal_population(initial, config.pop_tolerance, &config.pop_column),
    ];
    if let Some(factor) = config.cut_edge_factor {
        let bound = (factor * initial.cut_edge_count() as f64).floor() as usize;
        constraints.push(Constraint::cut_edge_upper_bound(bound));
    }
    if config.contiguous { constraints.push(Constraint::contiguous()) }
    constraints
}

/// Set up a seeded ReCom chain from the enacted plan.
pub fn build_chain(initial: Partition, config: &ChainConfig) -> Result<RecomChain> {
    let recom = Recom::for_partition(&initial, &config.pop_column, config.pop_tolerance, config.node_repeats)
        .with_max_attempts(config.max_attempts);
    let constraints = constraints(&initial, config);

    let chain = MarkovChain::new(recom, constraints, always_accept as fn(&Partition) -> bool, initial, config.steps, config.seed)
        .context("[analysis] Failed to start chain")?;
    Ok(chain.with_progress_interval(config.progress_interval))
}

/// Run the chain and record the statistics of every state.
pub fn run_ensemble(initial: Partition, config: &ChainConfig) -> Result<Ensemble> {
    let mut ensemble = Ensemble::new(config.elections());
    let mut chain = build_chain(initial, config)?;

    while let Some(state) = chain.next_state() {
        let state = state.context("[analysis] Chain proposal failed")?;
        ensemble.record(ensemble.len(), state);
    }

    info!(
        states = ensemble.len(),
        invalid = chain.invalid_proposals(),
        rejected = chain.rejected_proposals(),
        "chain finished"
    );
    Ok(ensemble)
}

/// Readable name of an election alias, as used in plot titles.
fn describe(alias: &str) -> String {
    match alias {
        "pres" => "Presidential".to_string(),
        "sen" => "Senate".to_string(),
        other => other.to_string(),
    }
}

/// Title of each plotted ensemble column.
fn histogram_titles(ensemble: &Ensemble) -> Vec<(String, String)> {
    let aliases = ensemble.aliases();
    std::iter::once(("cutedge_ensemble".to_string(), "Cut Edges".to_string()))
        .chain(aliases.iter().map(|a| (format!("{a}_demwin_ensemble"), format!("{} Elections Won by Democrats", describe(a)))))
        .chain(aliases.iter().map(|a| (format!("mean_median_diff_{a}"), format!("Mean-Median Difference for {} Election", describe(a)))))
        .chain(aliases.iter().map(|a| (format!("efficiency_gap_{a}"), format!("Efficiency Gap for {} Election", describe(a)))))
        .collect()
}

/// Write one histogram per ensemble column to `output_dir`, each marking row 0
/// (the enacted plan). `initial_cut_edges` overrides the cut-edge reference.
pub fn write_histograms(ensemble: &Ensemble, initial_cut_edges: Option<usize>, output_dir: &Path) -> Result<Vec<PathBuf>> {
    common::ensure_dir_exists(output_dir)?;

    let mut written = Vec::new();
    for (column, title) in histogram_titles(ensemble) {
        let Some(values) = ensemble.column(&column) else {
            warn!(column, "ensemble has no such column; skipping");
            continue
        };

        let reference = match (column.as_str(), initial_cut_edges) {
            ("cutedge_ensemble", Some(count)) => Some(count as f64),
            _ => values.first().copied(),
        };

        let mut histogram = Histogram::new(&title, values).with_x_label(&column);
        if let Some(reference) = reference { histogram = histogram.with_reference(reference) }

        let path = output_dir.join(format!("{column}.svg"));
        histogram.write_svg(&path)?;
        info!(path = %path.display(), "wrote histogram");
        written.push(path);
    }

    Ok(written)
}

/// Run a short chain and plot the sorted Democratic share of each district
/// against the enacted plan's (row 0, drawn as red dots).
pub fn write_sorted_share_boxplot(initial: Partition, config: &ChainConfig, election: &str, output: &Path) -> Result<()> {
    let election = config.elections().into_iter()
        .find(|e| e.name() == election || e.alias() == election)
        .ok_or_else(|| anyhow!("[analysis] Unknown election {election:?}"))?;

    let mut chain = build_chain(initial, config)?;
    let mut rows = Vec::with_capacity(config.steps);
    while let Some(state) = chain.next_state() {
        let state = state.context("[analysis] Chain proposal failed")?;
        let mut shares = election.results(state).percents(Party::Democratic);
        shares.sort_unstable_by(f64::total_cmp);
        rows.push(shares);
    }

    let markers = rows.first().cloned()
        .ok_or_else(|| anyhow!("[analysis] Chain produced no states"))?;

    common::ensure_parent_exists(output)?;
    BoxPlot::from_rows("Comparing the 2021 plan to an ensemble", &rows)
        .with_labels("Sorted districts", &format!("Democratic vote % ({} {})", describe(election.alias()), election.name()))
        .with_markers(markers)
        .with_guide(0.5)
        .with_y_range(0.0, 1.0)
        .write_svg(output)?;

    info!(path = %output.display(), states = rows.len(), "wrote boxplot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::election::Election;

    #[test]
    fn titles_cover_every_column() {
        let ensemble = Ensemble::new(vec![
            Election::new("G20PRE", "pres", "D", "R"),
            Election::new("G20USS", "sen", "D", "R"),
        ]);
        let titles = histogram_titles(&ensemble);
        assert_eq!(titles.len(), 7);
        assert!(titles.iter().all(|(column, _)| ensemble.column(column).is_some()));
        assert!(titles.contains(&("efficiency_gap_pres".into(), "Efficiency Gap for Presidential Election".into())));
        assert!(titles.contains(&("sen_demwin_ensemble".into(), "Senate Elections Won by Democrats".into())));
    }

    #[test]
    fn optional_constraints_follow_config() {
        let initial = Partition::with_assignments(2, crate::graph::grid_graph(4, 4, |_| 1),
            (0..16).map(|i| if i % 4 < 2 { 1 } else { 2 }).collect());

        let mut config = ChainConfig { pop_column: "POP".into(), elections: vec![], ..Default::default() };
        assert_eq!(constraints(&initial, &config).len(), 1);

        config.cut_edge_factor = Some(2.0);
        config.contiguous = true;
        let constraints = constraints(&initial, &config);
        assert_eq!(constraints.len(), 3);
        assert_eq!(constraints[1], Constraint::cut_edge_upper_bound(8));
    }
}
