pub mod options;
pub mod posts;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use options::{MemoryOptionStore, OptionStore, PgOptionStore};
pub use posts::{MemoryPostRepository, PgPostRepository, PostRepository};

/// Failure talking to the backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored value could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("stored row is invalid: {0}")]
    Invalid(String),
}

pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the migrations embedded in ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
