pub mod boxplot;
pub mod merge;
pub mod plot;
pub mod run;

use anyhow::Result;
use ilmander::{load_toml, ChainConfig};

use crate::cli::ChainArgs;

/// Chain config from `--config` (or defaults), with command-line overrides applied.
pub(crate) fn chain_config(args: &ChainArgs) -> Result<ChainConfig> {
    let mut config = match &args.config {
        Some(path) => load_toml::<ChainConfig>(path)?,
        None => ChainConfig::default(),
    };
    if let Some(steps) = args.steps { config.steps = steps }
    if let Some(seed) = args.seed { config.seed = seed }
    Ok(config)
}
