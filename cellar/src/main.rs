use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Price-list and sample-request backend")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let config = match cellar::config::Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %cli.config.display(), error = %e, "Could not load config");
            std::process::exit(1);
        }
    };

    if let Err(e) = cellar::run(config).await {
        tracing::error!(error = %e, "Server exited");
        std::process::exit(1);
    }
}
