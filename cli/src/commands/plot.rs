use anyhow::Result;
use ilmander::{load_initial_partition, load_toml, write_histograms, ChainConfig, Ensemble};
use tracing::info;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::PlotArgs) -> Result<()> {
    let out_dir = &args.output.clone().unwrap_or("./plots".into());

    info!(path = %args.ensemble.display(), "[plot] reading ensemble");
    let ensemble = Ensemble::read_csv(&args.ensemble)?;

    let initial_cut_edges = match &args.graph {
        Some(shapefile) => {
            let config = match &args.config {
                Some(path) => load_toml::<ChainConfig>(path)?,
                None => ChainConfig::default(),
            };
            Some(load_initial_partition(shapefile, &config)?.cut_edge_count())
        },
        None => None,
    };

    let written = write_histograms(&ensemble, initial_cut_edges, out_dir)?;
    info!(count = written.len(), dir = %out_dir.display(), "[plot] wrote histograms");

    Ok(())
}
