use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vehicle_portal_api::api::{handlers::AppState, router::build_app};
use vehicle_portal_api::config::Config;
use vehicle_portal_api::db::Database;
use vehicle_portal_api::db_storage::PgStore;
use vehicle_portal_api::domain::vehicles::VehicleLookupService;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, connects to PostgreSQL, wires the
/// repositories into the vehicle service and starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vehicle_portal_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let db = Database::new(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database connection pool established");

    let store = Arc::new(PgStore::new(db.pool.clone()));
    let app_state = Arc::new(AppState {
        vehicles: VehicleLookupService::from_store(store.clone()),
        customers: store,
    });

    let app = build_app(app_state, &config)?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
