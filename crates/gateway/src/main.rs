//! RoastingReels Gateway
//!
//! The main entry point for all external requests.
//! Handles:
//! - The movie and review REST API
//! - Server-side page flows (browse, add movie, reviews, accounts)
//! - Metadata suggestions and translation
//! - Observability (logging, metrics, health)

mod handlers;
#[cfg(test)]
mod test_support;
mod validation;
mod web;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use roastingreels_common::{
    auth::JwtManager,
    config::AppConfig,
    db::{DbPool, Repository, Store},
    metadata::{MetadataService, TmdbClient},
    metrics,
    translation::{Translate, Translator},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub jwt: Arc<JwtManager>,
    pub metadata: Arc<MetadataService>,
    pub translator: Arc<dyn Translate>,
    pub metrics: Option<PrometheusHandle>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    init_tracing(&config);

    info!("Starting RoastingReels Gateway v{}", roastingreels_common::VERSION);

    config.validate().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;

    let config = Arc::new(config);

    // Initialize metrics
    let metrics_handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            metrics::UPSTREAM_BUCKETS,
        )?
        .install_recorder()?;
    metrics::register_metrics();

    // Outbound clients
    let translator = Translator::new(&config.translation, &config.tls).map_err(|e| {
        tracing::error!(error = %e, "Translator is misconfigured");
        e
    })?;
    let provider = Arc::new(TmdbClient::from_config(&config.metadata, &config.tls)?);
    let metadata = MetadataService::new(provider, config.metadata.image_base_url.clone());
    let jwt = JwtManager::from_config(&config.auth)?;

    // Initialize database connection
    let db = DbPool::new(&config.database).await?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    tokio::fs::create_dir_all(&config.uploads.posters_dir).await?;

    // Create app state
    let state = AppState {
        config: config.clone(),
        store: Arc::new(Repository::new(db)),
        jwt: Arc::new(jwt),
        metadata: Arc::new(metadata),
        translator: Arc::new(translator),
        metrics: Some(metrics_handle),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},tower_http=info,sqlx=warn",
            config.observability.log_level
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    use handlers::{auth, health, movies, reviews, suggestions, translate};

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Multipart poster uploads need headroom over the file itself
    let body_limit = DefaultBodyLimit::max(state.config.uploads.max_poster_bytes + 1024 * 1024);
    let timeout = TimeoutLayer::new(state.config.request_timeout());

    // REST API
    let api_routes = Router::new()
        // Movies
        .route("/movies", get(movies::list_movies).post(movies::create_movie))
        .route(
            "/movies/{id}",
            get(movies::get_movie)
                .put(movies::update_movie)
                .patch(movies::update_movie)
                .delete(movies::delete_movie),
        )
        .route("/movies/{id}/crew", get(movies::get_crew))

        // Reviews
        .route(
            "/movies/{id}/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route(
            "/movies/{id}/reviews/{review_id}",
            get(reviews::get_review)
                .put(reviews::update_review)
                .patch(reviews::update_review)
                .delete(reviews::delete_review),
        );

    // Compose the app
    Router::new()
        // Health endpoints (no auth)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(health::metrics))

        // Token issuance
        .route("/api/login_check", post(auth::login_check))

        // Form helpers
        .route("/search-movie-title", get(suggestions::search_movie_title))
        .route("/get-movie-details", get(suggestions::get_movie_details))
        .route("/translate", post(translate::translate))

        .nest("/api/v1", api_routes)
        .merge(web::routes())
        .layer(body_limit)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // request ids are set outside the layer that echoes them
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
