use anyhow::Result;
use tracing::info;

use stocktrack_api::db;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting database migration");

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://stocktrack.db?mode=rwc".to_string());

    info!("Connecting to database: {}", database_url);

    let pool = db::establish_connection(&database_url).await?;
    db::run_migrations(&pool).await?;

    info!("Migration completed successfully");
    Ok(())
}
