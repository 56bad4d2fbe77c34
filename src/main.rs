use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use urlscraper::config::Config;
use urlscraper::probes::{HttpProbe, Probe};

#[derive(Parser)]
#[command(
    name = "urlscraper",
    about = "URL submission service with background validation and latency benchmarking",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the service (API server + ingestion workers + benchmark refresh)
    Serve {
        /// Config file (falls back to URLSCRAPER_CONFIG, then ./urlscraper.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind address, overriding server.listen_address
        #[arg(long)]
        bind: Option<String>,
    },

    /// Benchmark a single URL once and print the result
    Probe {
        /// URL to request
        url: String,

        /// Config file (only the [client] and [logging] sections are used)
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    PrintConfig {
        /// Config file (falls back to URLSCRAPER_CONFIG, then ./urlscraper.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, bind } => {
            let mut config = Config::resolve(config.as_deref())?;
            if let Some(bind) = bind {
                config.server.listen_address = bind;
            }
            urlscraper::telemetry::init(&config.logging);
            tracing::info!(bind = %config.server.listen_address, "Starting urlscraper");
            urlscraper::serve(config).await?;
        }
        Commands::Probe { url, config, json } => {
            let config = Config::resolve(config.as_deref())?;
            urlscraper::telemetry::init(&config.logging);

            let probe = HttpProbe::new(config.client.timeout())?;
            let (result, cause) = match probe.run(&url).await {
                Ok(result) => (result, None),
                Err(failure) => (failure.result, Some(failure.cause.to_string())),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("URL:      {}", result.url);
                println!("Status:   {}", result.status);
                println!("Duration: {:?}", result.duration);
                if let Some(cause) = &cause {
                    println!("Cause:    {}", cause);
                }
            }

            if let Some(cause) = cause {
                bail!("{} failed: {}", result.url, cause);
            }
        }
        Commands::PrintConfig { config } => {
            let config = Config::resolve(config.as_deref())?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
