use std::sync::Arc;

use axum::{
    routing::{get, post, MethodRouter},
    Router,
};
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::handlers::{self, AppState};
use crate::openapi::ApiDoc;

/// Vehicle routes. Static segments take precedence over `:registration_no`.
///
/// Every path is also served with a trailing slash, which is the form the
/// portal frontend requests.
pub fn vehicle_routes() -> Router<Arc<AppState>> {
    let routes: [(&str, MethodRouter<Arc<AppState>>); 6] = [
        ("/vehicles/my-vehicles", get(handlers::my_vehicles)),
        ("/vehicles/create", post(handlers::create_or_get_vehicle)),
        (
            "/vehicles/create-or-get-vehicle-info",
            post(handlers::create_or_get_vehicle),
        ),
        (
            "/vehicles/vehicle-complete-data",
            get(handlers::vehicle_complete_data),
        ),
        (
            "/vehicles",
            get(handlers::list_vehicles).post(handlers::create_vehicle),
        ),
        (
            "/vehicles/:registration_no",
            get(handlers::retrieve_vehicle)
                .put(handlers::update_vehicle)
                .patch(handlers::update_vehicle)
                .delete(handlers::delete_vehicle),
        ),
    ];

    routes
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            router
                .route(path, method_router.clone())
                .route(&format!("{}/", path), method_router)
        })
}

fn docs() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// Routes and state only. Used directly by tests.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(vehicle_routes())
        .merge(docs())
        .with_state(state)
}

/// Routes plus the production middleware stack.
///
/// Rate limiting keys on the client IP, so the server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn build_app(state: Arc<AppState>, config: &Config) -> anyhow::Result<Router> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limiter configuration"))?,
    );

    let protected_routes = vehicle_routes().merge(docs()).layer(
        ServiceBuilder::new()
            .layer(RequestBodyLimitLayer::new(config.request_body_limit_bytes))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    Ok(app)
}
