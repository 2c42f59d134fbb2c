//! # citypulse-server
//!
//! REST API server for the CityPulse ML engines.

use axum::{
    routing::{get, post},
    Router,
};
use citypulse_anomaly::AnomalyEngine;
use citypulse_core::CityConfig;
use citypulse_forecast::ForecastEngine;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<AnomalyEngine>,
    pub forecaster: Arc<ForecastEngine>,
}

#[tokio::main]
async fn main() {
    // Load .env file (optional - won't fail if missing)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "citypulse_server=info,tower_http=info".into()),
        )
        .init();

    let config = Arc::new(CityConfig::mohali());
    let model_dir = env::var("MODEL_DIR").unwrap_or_else(|_| "models".to_string());
    let detector = AnomalyEngine::new(Arc::clone(&config), &model_dir)
        .expect("failed to load anomaly model artifacts");
    let state = AppState {
        detector: Arc::new(detector),
        forecaster: Arc::new(ForecastEngine::new(config)),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/api/v1/detect", post(routes::detect))
        .route("/api/v1/forecast", get(routes::forecast_all))
        .route("/api/v1/forecast/:node_id", get(routes::forecast_node))
        .route("/api/v1/train", post(routes::train))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Server configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "5001".to_string())
        .parse()
        .expect("PORT must be a valid number");
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Invalid HOST:PORT configuration");

    tracing::info!(
        "citypulse-server v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
