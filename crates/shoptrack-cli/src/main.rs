mod run;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shoptrack")]
#[command(about = "Campaign shopping-data scrape pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the scrape pipeline over all opted-in campaigns.
    Run {
        /// Restrict the run to one campaign id.
        #[arg(long)]
        campaign: Option<i64>,
        /// Process keywords one at a time instead of the worker pool.
        #[arg(long)]
        sequential: bool,
    },
    /// List campaigns opted in to scraping and their keyword counts.
    Campaigns,
    /// Apply pending database migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = shoptrack_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = shoptrack_db::PoolConfig::from_app_config(&config);
    let pool = shoptrack_db::connect_pool(&config.database_url, pool_config).await?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            campaign,
            sequential,
        } => run::run_pipeline(&pool, &config, campaign, !sequential).await,
        Commands::Campaigns => run::list_campaigns(&pool).await,
        Commands::Migrate => {
            let applied = shoptrack_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
            Ok(())
        }
    }
}
