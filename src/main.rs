use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use breaking_news_api::{
    build_router,
    config::Config,
    db::{self, PgOptionStore, PgPostRepository},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let options = Arc::new(PgOptionStore::new(pool.clone()));
    let posts = Arc::new(PgPostRepository::new(pool));

    info!("Site time zone: {}", config.site_timezone);

    let state = AppState::new(options, posts, config.clone());
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Breaking news API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
