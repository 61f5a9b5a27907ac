use anyhow::Result;
use ilmander::{load_initial_partition, run_ensemble};
use tracing::info;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::RunArgs) -> Result<()> {
    let config = super::chain_config(&args.chain)?;
    let out_path = &args.output.clone().unwrap_or("./ensembles.csv".into());

    info!(shapefile = %args.chain.shapefile.display(), "[run] loading precinct graph");
    let initial = load_initial_partition(&args.chain.shapefile, &config)?;

    info!(steps = config.steps, seed = config.seed, tolerance = config.pop_tolerance, "[run] running ReCom chain");
    let ensemble = run_ensemble(initial, &config)?;

    info!(path = %out_path.display(), rows = ensemble.len(), "[run] writing ensemble");
    ensemble.write_csv(out_path)?;

    Ok(())
}
