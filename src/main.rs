//! Attendify Assistant server entry point.
//!
//! Loads configuration, wires the adapters into the assistant pipeline and
//! serves the chatbot routes until Ctrl-C.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use attendify_assistant::adapters::auth::{JwtConfig, JwtSessionValidator};
use attendify_assistant::adapters::cache::{InMemorySnapshotCache, RedisSnapshotCache};
use attendify_assistant::adapters::generation::{OllamaClient, OllamaConfig};
use attendify_assistant::adapters::http::{assistant_router, AssistantAppState, AuthState};
use attendify_assistant::adapters::postgres::{PostgresSchoolRecordsReader, PostgresSnapshotSource};
use attendify_assistant::application::handlers::{AssistantSettings, RetrievalPlanner, SnapshotProvider};
use attendify_assistant::config::{AppConfig, ServerConfig};
use attendify_assistant::ports::{SnapshotCache, TextGenerator};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.server);

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect_lazy(&config.database.url)?;

    let cache = snapshot_cache(&config).await;
    let query_timeout = config.database.query_timeout();
    let snapshots = Arc::new(SnapshotProvider::new(
        Arc::new(PostgresSnapshotSource::new(pool.clone(), query_timeout)),
        cache,
        config.assistant.snapshot_ttl(),
    ));
    let planner = Arc::new(RetrievalPlanner::new(Arc::new(
        PostgresSchoolRecordsReader::new(pool, query_timeout),
    )));

    let generator: Arc<dyn TextGenerator> =
        Arc::new(OllamaClient::new(OllamaConfig::from(&config.generation))?);
    let auth: AuthState = Arc::new(JwtSessionValidator::new(JwtConfig::from(&config.auth)));

    let state = AssistantAppState::new(
        snapshots,
        planner,
        generator,
        AssistantSettings::from_config(&config),
        config.generation.stream_timeout(),
    );

    // The timeout bounds time-to-headers only, so SSE bodies keep flowing.
    let app = assistant_router(state, auth)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config.server))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        %addr,
        environment = ?config.server.environment,
        model = %config.generation.model,
        "Starting Attendify assistant"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "attendify_assistant={},tower_http=info",
            server.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if server.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Redis when configured and reachable, otherwise a process-local cache.
async fn snapshot_cache(config: &AppConfig) -> Arc<dyn SnapshotCache> {
    let Some(url) = config.redis.url.as_deref() else {
        return Arc::new(InMemorySnapshotCache::new());
    };

    let connection = match redis::Client::open(url) {
        Ok(client) => client.get_multiplexed_async_connection().await,
        Err(e) => Err(e),
    };

    match connection {
        Ok(conn) => {
            info!("Snapshot cache: redis");
            Arc::new(RedisSnapshotCache::new(conn, config.redis.key_prefix.clone()))
        }
        Err(e) => {
            warn!(error = %e, "Redis unavailable, using in-memory snapshot cache");
            Arc::new(InMemorySnapshotCache::new())
        }
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() && !server.is_production() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(origins)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
