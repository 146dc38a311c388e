use std::sync::Arc;

use tokio::net::TcpListener;

use embeddings_api::config;
use embeddings_api::embeddings::{self, AppState, RandomEmbedder};
use embeddings_api::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let addr = config::bind_addr_from_env()?;

    println!("🎲 Starting embeddings simulator (random vectors)...");
    let state = AppState::new(Arc::new(RandomEmbedder::new()));
    let app = embeddings::app(state);

    println!("🌐 HTTP listening on http://{addr}");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
