use anyhow::Result;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use continuum::cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(cli.log_level))
        .with_writer(std::io::stderr)
        .init();

    execute(cli).await
}
