/// Clear the breaking-news slot.
/// By default only a lapsed record is cleared; suitable for cron
/// (e.g. */5 * * * * /app/clear-breaking-news).
///
/// Usage: clear-breaking-news [--force]
///   --force : Empty the slot even if the record has not expired

use chrono::Utc;
use clap::Parser;

use breaking_news_api::{
    db::{self, PgOptionStore},
    services::expiry::ExpiryService,
};

#[derive(Parser)]
#[command(name = "clear-breaking-news", about = "Clear an expired (or any) breaking news record")]
struct Args {
    /// Clear the slot unconditionally
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Missing required env var: DATABASE_URL"))?;
    let pool = db::create_pool(&database_url).await?;
    let store = PgOptionStore::new(pool);

    if args.force {
        ExpiryService::clear(&store).await?;
        tracing::info!("Breaking news slot cleared");
    } else if ExpiryService::sweep(&store, Utc::now()).await? {
        tracing::info!("Expired breaking news cleared");
    } else {
        tracing::info!("Nothing to clear");
    }

    Ok(())
}
