use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::api::AppState;
use crate::config::{Config, REQUIRED_VARIABLES};
use crate::genai::{HttpTextModel, TextModel};
use crate::ocm::OcmClient;

mod api;
mod config;
mod genai;
mod geo;
mod live;
mod ocm;
mod rank;

const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    if let Err(e) = run().await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::env().inspect_err(|e| {
        error!(
            "config: {e}. Check all required environment variables ({}) are set.",
            REQUIRED_VARIABLES.join(", ")
        );
    })?;

    let http = reqwest::Client::builder()
        .timeout(OUTBOUND_TIMEOUT)
        .build()?;

    let ocm = OcmClient::new(
        http.clone(),
        &config.ocm_base_url,
        config.ocm_api_key.clone(),
    )?;
    let model: Arc<dyn TextModel> = Arc::new(HttpTextModel::new(http, config.textgen_url.clone()));

    let state = AppState { ocm, model };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(api::index))
        .route("/optimize", post(api::optimize))
        .route("/predict_time", post(api::predict_time))
        .route("/ai_insight", post(api::ai_insight))
        .route("/ws", get(live::ws_handler))
        .layer(cors)
        .with_state(state);

    let listen_addr = format!("0.0.0.0:{}", config.listen_port);
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;

    info!("Server is running on http://localhost:{}", config.listen_port);
    axum::serve(listener, app).await?;

    Ok(())
}
