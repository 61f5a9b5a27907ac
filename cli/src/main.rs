mod cli;
mod commands;
mod logging;

use cli::{Cli, Commands};
use commands::{boxplot, merge, plot, run};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match &cli.command {
        Commands::Merge(args) => merge::run(&cli, args),
        Commands::Run(args) => run::run(&cli, args),
        Commands::Plot(args) => plot::run(&cli, args),
        Commands::Boxplot(args) => boxplot::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
