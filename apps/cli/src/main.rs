use clap::Parser;
use tracing_subscriber::EnvFilter;

use sealpost_cli::config::CliConfig;
use sealpost_cli::{run, Cli};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = CliConfig::load()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let cli = Cli::parse();
    let output = run(cli, &config)?;
    println!("{output}");
    Ok(())
}
