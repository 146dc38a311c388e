use anyhow::{anyhow, Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::types::{PointId, QdrantEnvelope, RetrievedPoint, UpdateResult, UpsertPoints, VectorPoint};

/// Raw reply from Qdrant: the status line plus the untouched body text.
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: String,
}

impl ApiReply {
    /// Decodes `result` from the `{result, status, time}` envelope. Non-2xx
    /// statuses and a missing `result` are errors.
    pub fn result<T: DeserializeOwned>(&self) -> Result<T> {
        if !self.status.is_success() {
            return Err(anyhow!("qdrant returned {}: {}", self.status, self.body));
        }
        let envelope: QdrantEnvelope<T> = serde_json::from_str(&self.body)
            .with_context(|| format!("unexpected qdrant response: {}", self.body))?;
        let status = envelope.status;
        envelope
            .result
            .ok_or_else(|| anyhow!("qdrant response has no result (status {status}): {}", self.body))
    }
}

/// Thin client over the Qdrant REST API (points upsert/fetch, collection create).
#[derive(Clone)]
pub struct QdrantRestClient {
    client: reqwest::Client,
    base_url: String,
}

impl QdrantRestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn create_collection(
        &self,
        collection: &str,
        size: usize,
        distance: &str,
    ) -> Result<ApiReply> {
        let url = format!("{}/collections/{collection}", self.base_url);
        let body = json!({ "vectors": { "size": size, "distance": distance } });
        debug!("PUT {url}");
        let response = self.client.put(&url).json(&body).send().await?;
        read_reply(response).await
    }

    /// `PUT /collections/{name}/points?wait=true`
    pub async fn upsert_points(&self, collection: &str, points: &[VectorPoint]) -> Result<ApiReply> {
        let url = format!("{}/collections/{collection}/points", self.base_url);
        debug!("PUT {url} ({} points)", points.len());
        let response = self
            .client
            .put(&url)
            .query(&[("wait", "true")])
            .json(&UpsertPoints { points })
            .send()
            .await?;
        read_reply(response).await
    }

    /// `GET /collections/{name}/points/{id}`
    pub async fn get_point(&self, collection: &str, id: &PointId) -> Result<ApiReply> {
        let url = format!("{}/collections/{collection}/points/{id}", self.base_url);
        debug!("GET {url}");
        let response = self.client.get(&url).send().await?;
        read_reply(response).await
    }

    pub async fn upsert_and_confirm(
        &self,
        collection: &str,
        points: &[VectorPoint],
    ) -> Result<(ApiReply, UpdateResult)> {
        let reply = self.upsert_points(collection, points).await?;
        let update = reply.result::<UpdateResult>()?;
        Ok((reply, update))
    }

    pub async fn fetch_point(
        &self,
        collection: &str,
        id: &PointId,
    ) -> Result<(ApiReply, RetrievedPoint)> {
        let reply = self.get_point(collection, id).await?;
        let point = reply.result::<RetrievedPoint>()?;
        Ok((reply, point))
    }
}

async fn read_reply(response: reqwest::Response) -> Result<ApiReply> {
    let status = response.status();
    let body = response
        .text()
        .await
        .context("failed to read qdrant response body")?;
    Ok(ApiReply { status, body })
}
