use anyhow::{anyhow, Context, Result};
use reqwest::StatusCode;
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::client::QdrantRestClient;
use super::types::{PointId, VectorPoint};
use crate::config::{is_flag_set, non_empty};

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";
pub const DEFAULT_COLLECTION: &str = "documents";
pub const DEFAULT_VECTOR_DIM: usize = 4096;
pub const VECTOR_FILL: f32 = 0.1;
pub const INTEGER_POINT_ID: u64 = 12345;

#[derive(Debug, Clone)]
pub struct SmokeConfig {
    pub qdrant_url: String,
    pub collection: String,
    pub vector_dim: usize,
    pub create_collection: bool,
}

impl SmokeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vector_dim = match non_empty(lookup("SMOKE_VECTOR_DIM")) {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|dim| *dim > 0)
                .ok_or_else(|| anyhow!("SMOKE_VECTOR_DIM must be a positive integer, got '{raw}'"))?,
            None => DEFAULT_VECTOR_DIM,
        };

        Ok(Self {
            qdrant_url: non_empty(lookup("QDRANT_URL")).unwrap_or_else(|| DEFAULT_QDRANT_URL.into()),
            collection: non_empty(lookup("QDRANT_COLLECTION"))
                .unwrap_or_else(|| DEFAULT_COLLECTION.into()),
            vector_dim,
            create_collection: is_flag_set(lookup("SMOKE_CREATE_COLLECTION")),
        })
    }
}

/// Outcome of one upsert + fetch, with the raw bodies kept for printing.
#[derive(Debug, Clone)]
pub struct PointCheck {
    pub id: PointId,
    pub upsert_body: String,
    pub fetch_body: String,
}

pub fn build_point(id: PointId, title: &str, dim: usize) -> VectorPoint {
    let mut payload = Map::new();
    payload.insert("title".into(), Value::from(title));
    payload.insert("content".into(), Value::from("Test content"));
    VectorPoint {
        id,
        vector: vec![VECTOR_FILL; dim],
        payload,
    }
}

/// Upserts `point`, reads it back and requires the stored payload to equal the sent one.
pub async fn round_trip(
    client: &QdrantRestClient,
    collection: &str,
    point: &VectorPoint,
) -> Result<PointCheck> {
    info!("upserting point {}", point.id);
    let (upsert, update) = client
        .upsert_and_confirm(collection, std::slice::from_ref(point))
        .await
        .with_context(|| format!("upsert of point {} failed", point.id))?;
    info!("upsert response for {}: {}", point.id, upsert.body);
    if update.status != "completed" {
        warn!("upsert of {} finished with status '{}'", point.id, update.status);
    }

    info!("fetching point {}", point.id);
    let (fetch, stored) = client
        .fetch_point(collection, &point.id)
        .await
        .with_context(|| format!("fetch of point {} failed", point.id))?;
    info!("fetch response for {}: {}", point.id, fetch.body);

    let stored_payload = stored.payload.unwrap_or_default();
    if stored_payload != point.payload {
        return Err(anyhow!(
            "payload mismatch for point {}: sent {}, stored {}",
            point.id,
            Value::Object(point.payload.clone()),
            Value::Object(stored_payload)
        ));
    }

    Ok(PointCheck {
        id: point.id.clone(),
        upsert_body: upsert.body,
        fetch_body: fetch.body,
    })
}

/// Creates the collection if asked, then round-trips a UUID-keyed and an
/// integer-keyed point. Stops at the first failure; `on_check` sees every
/// point that made it through before that.
pub async fn run_smoke_test<F>(
    client: &QdrantRestClient,
    cfg: &SmokeConfig,
    mut on_check: F,
) -> Result<Vec<PointCheck>>
where
    F: FnMut(&PointCheck),
{
    if cfg.create_collection {
        ensure_collection(client, cfg).await?;
    }

    let uuid = Uuid::new_v4();
    info!("generated UUID {uuid}");

    let points = [
        build_point(PointId::Uuid(uuid), "Test with UUID", cfg.vector_dim),
        build_point(PointId::Num(INTEGER_POINT_ID), "Test with integer", cfg.vector_dim),
    ];

    let mut checks = Vec::with_capacity(points.len());
    for point in &points {
        let check = round_trip(client, &cfg.collection, point).await?;
        on_check(&check);
        checks.push(check);
    }
    Ok(checks)
}

async fn ensure_collection(client: &QdrantRestClient, cfg: &SmokeConfig) -> Result<()> {
    let reply = client
        .create_collection(&cfg.collection, cfg.vector_dim, "Cosine")
        .await?;
    if reply.status.is_success() {
        info!("created collection {}", cfg.collection);
        return Ok(());
    }
    // Older servers answer 400 instead of 409 for an existing collection.
    let exists = reply.status == StatusCode::CONFLICT
        || (reply.status == StatusCode::BAD_REQUEST && reply.body.contains("already exists"));
    if exists {
        info!("collection {} already exists", cfg.collection);
        return Ok(());
    }
    Err(anyhow!(
        "failed to create collection {}: {} {}",
        cfg.collection,
        reply.status,
        reply.body
    ))
}
