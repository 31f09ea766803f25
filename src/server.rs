//! Router assembly and store wiring shared by the binary and tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::{GatewayConfig, StoreBackend};
use crate::error::GatewayError;
use crate::service::SessionCoordinator;
use crate::store::{KeyValueStore, MemoryStore, RedisStore, RoomStore};
use crate::ws::handler::ws_handler;

/// Opens the configured store backend and builds a coordinator over it.
///
/// # Errors
///
/// Returns [`GatewayError::StoreUnavailable`] if the Redis backend is
/// selected and cannot be reached.
pub async fn build_coordinator(config: &GatewayConfig) -> Result<SessionCoordinator, GatewayError> {
    let kv: Arc<dyn KeyValueStore> = match config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Redis => Arc::new(RedisStore::connect(&config.redis_url).await?),
    };
    tracing::info!(backend = kv.backend(), prefix = %config.store_key_prefix, "room store ready");
    let store = RoomStore::new(kv, config.store_key_prefix.clone(), config.store_timeout());
    Ok(SessionCoordinator::with_store(
        store,
        config.connection_queue_capacity,
    ))
}

/// Builds the full HTTP router: REST API, `/ws` and (with the `swagger-ui`
/// feature) the API docs.
///
/// `http_timeout` bounds REST requests only; WebSocket sessions are
/// long-lived.
pub fn build_router(state: AppState, http_timeout: Duration) -> Router {
    let rest = api::build_router().layer(TimeoutLayer::new(http_timeout));
    let app = Router::new().merge(rest).route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        app.merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::openapi::ApiDoc::openapi()),
        )
    };

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
    .with_state(state)
}
