use clap::Parser;
use fare_watch::cli::{redacted_config, Cli, Commands};
use fare_watch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };
    config.apply_env()?;

    // Initialize telemetry; the guard writes the metrics file on exit
    let _telemetry = fare_watch::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Watch(args) => args.execute(config).await?,
        Commands::Month(args) => args.execute(config).await?,
        Commands::Extract(args) => args.execute().await?,
        Commands::Config => {
            println!("# Effective configuration");
            print!("{}", redacted_config(&config)?);
        }
    }

    Ok(())
}
