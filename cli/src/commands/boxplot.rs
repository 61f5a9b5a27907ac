use anyhow::Result;
use ilmander::{load_initial_partition, write_sorted_share_boxplot};
use tracing::info;

/// States sampled when `--steps` is not given.
const DEFAULT_STEPS: usize = 1000;

/// Cut-edge bound, as a multiple of the enacted plan's, when the config sets none.
const DEFAULT_CUT_EDGE_FACTOR: f64 = 2.0;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::BoxplotArgs) -> Result<()> {
    let mut config = super::chain_config(&args.chain)?;
    config.steps = args.chain.steps.unwrap_or(DEFAULT_STEPS);
    config.cut_edge_factor = config.cut_edge_factor.or(Some(DEFAULT_CUT_EDGE_FACTOR));
    let out_path = &args.output.clone().unwrap_or("./boxplot.svg".into());

    info!(shapefile = %args.chain.shapefile.display(), "[boxplot] loading precinct graph");
    let initial = load_initial_partition(&args.chain.shapefile, &config)?;

    info!(steps = config.steps, election = %args.election, "[boxplot] sampling plans");
    write_sorted_share_boxplot(initial, &config, &args.election, out_path)?;

    Ok(())
}
