use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use embeddings_api::config::ServiceConfig;
use embeddings_api::embeddings::{self, AppState};
use embeddings_api::inference::BertEncoder;
use embeddings_api::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    telemetry::init_tracing();

    let cfg = ServiceConfig::from_env()?;
    println!("🚀 Starting embeddings server...");
    info!(
        "MODEL_ID={} USE_CUDA={} USE_MPS={}",
        cfg.model_id, cfg.use_cuda, cfg.use_mps
    );

    // -----------------------------
    // Model (loaded once, read-only afterwards)
    // -----------------------------
    let load_cfg = cfg.clone();
    let encoder = tokio::task::spawn_blocking(move || BertEncoder::load(&load_cfg))
        .await
        .context("model loading task panicked")??;
    info!(
        "serving {} on {} ({} dims, max {} tokens)",
        encoder.model_id(),
        encoder.device_kind(),
        encoder.hidden_size(),
        encoder.max_len()
    );

    let state = AppState::new(Arc::new(encoder));
    let app = embeddings::app(state);

    let addr = cfg.bind_addr;
    println!("🌐 HTTP listening on http://{addr}");
    println!("🛠 Embeddings at POST http://{addr}/embeddings");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
