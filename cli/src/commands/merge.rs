use anyhow::Result;
use ilmander::{load_toml, run_merge, MergeConfig};
use tracing::info;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::MergeArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_toml::<MergeConfig>(path)?,
        None => MergeConfig::default(),
    };
    let out_dir = &args.output.clone().unwrap_or("./IL".into());

    let outputs = run_merge(&config, out_dir)?;
    info!(shapefile = %outputs.shapefile.display(), geojson = %outputs.geojson.display(), "[merge] done");

    Ok(())
}
