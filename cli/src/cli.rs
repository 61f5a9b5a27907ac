use std::path::PathBuf;

/// Ensemble analysis of Illinois redistricting plans (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "ilmander", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Merge census blocks, precinct returns and districts into one precinct layer
    Merge(MergeArgs),

    /// Run a ReCom chain from the enacted plan and write ensemble statistics
    Run(RunArgs),

    /// Plot histograms of ensemble statistics
    Plot(PlotArgs),

    /// Run a short chain and plot sorted district vote shares against the enacted plan
    Boxplot(BoxplotArgs),
}

#[derive(clap::Args, Debug)]
pub struct MergeArgs {
    /// Merge configuration (input paths, column names); defaults to the Illinois layout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Output directory, defaults to "./IL"
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}

/// Chain settings shared by `run` and `boxplot`.
#[derive(clap::Args, Debug)]
pub struct ChainArgs {
    /// Merged precinct shapefile with district assignments
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub shapefile: PathBuf,

    /// Chain configuration TOML
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Number of states to sample (including the enacted plan)
    #[arg(long)]
    pub steps: Option<usize>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub chain: ChainArgs,

    /// Output CSV, defaults to "./ensembles.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct PlotArgs {
    /// Ensemble CSV written by `run`
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub ensemble: PathBuf,

    /// Precinct shapefile; when given, its enacted plan's cut-edge count marks the cut-edge histogram
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub graph: Option<PathBuf>,

    /// Chain configuration TOML used to read the enacted plan
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Output directory, defaults to "./plots"
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct BoxplotArgs {
    #[command(flatten)]
    pub chain: ChainArgs,

    /// Election name or alias to plot
    #[arg(short, long, default_value = "G20USS")]
    pub election: String,

    /// Output SVG, defaults to "./boxplot.svg"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}
