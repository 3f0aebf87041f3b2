//! Applies `schema.sql` to the database named by `DATABASE_URL`.

use vehicle_portal_api::config::Config;
use vehicle_portal_api::db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "init_schema=info,vehicle_portal_api=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let db = Database::new(&config.database_url, 1).await?;

    db.apply_schema().await?;
    tracing::info!("Schema applied");

    Ok(())
}
