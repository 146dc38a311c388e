use anyhow::Result;

use embeddings_api::telemetry;
use embeddings_api::vector_store::{run_smoke_test, PointCheck, QdrantRestClient, SmokeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let cfg = SmokeConfig::from_env()?;
    let client = QdrantRestClient::new(cfg.qdrant_url.clone());
    println!(
        "🎯 Qdrant smoke test against {} (collection '{}', dim {})",
        client.base_url(),
        cfg.collection,
        cfg.vector_dim
    );

    run_smoke_test(&client, &cfg, print_check).await?;
    println!("✅ all points round-tripped");

    Ok(())
}

fn print_check(check: &PointCheck) {
    println!("✅ point {}", check.id);
    println!("   upsert: {}", check.upsert_body);
    println!("   fetch:  {}", check.fetch_body);
}
