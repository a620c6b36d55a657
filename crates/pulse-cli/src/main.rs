mod harvest;
mod phases;

#[cfg(test)]
mod tests;

use clap::{Parser, Subcommand};
use pulse_core::Channel;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pulse")]
#[command(about = "Harvest, enrich and normalize social media activity")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Harvest, enrich and normalize in one go (the default)
    Run {
        /// Restrict harvesting to one platform
        #[arg(long)]
        platform: Option<Channel>,
    },
    /// Fetch profiles, posts and comments from the configured platforms
    Harvest {
        /// Restrict harvesting to one platform
        #[arg(long)]
        platform: Option<Channel>,

        /// Print the platforms that would be harvested and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Add sentiment and keyword columns to every harvested post and comment file
    Enrich,
    /// Join the enriched files into posts.csv and comments.csv
    Normalize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = pulse_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    match cli.command.unwrap_or(Commands::Run { platform: None }) {
        Commands::Run { platform } => {
            let sources = pulse_core::load_sources(&config.sources_path)?;
            harvest::run_harvest(&config, &sources, platform, false).await?;
            phases::run_enrich(&config).await?;
            phases::run_normalize(&config)?;
        }
        Commands::Harvest { platform, dry_run } => {
            let sources = pulse_core::load_sources(&config.sources_path)?;
            harvest::run_harvest(&config, &sources, platform, dry_run).await?;
        }
        Commands::Enrich => {
            phases::run_enrich(&config).await?;
        }
        Commands::Normalize => {
            phases::run_normalize(&config)?;
        }
    }

    Ok(())
}
