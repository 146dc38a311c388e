use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub type Payload = Map<String, Value>;

/// Qdrant accepts either an unsigned integer or a UUID as a point id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(Uuid),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{n}"),
            PointId::Uuid(u) => write!(f, "{}", u.hyphenated()),
        }
    }
}

impl From<u64> for PointId {
    fn from(value: u64) -> Self {
        PointId::Num(value)
    }
}

impl From<Uuid> for PointId {
    fn from(value: Uuid) -> Self {
        PointId::Uuid(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPoint {
    pub id: PointId,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

#[derive(Debug, Serialize)]
pub struct UpsertPoints<'a> {
    pub points: &'a [VectorPoint],
}

/// A point as returned by `GET /collections/{name}/points/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievedPoint {
    pub id: PointId,
    #[serde(default)]
    pub payload: Option<Payload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResult {
    #[serde(default)]
    pub operation_id: Option<u64>,
    pub status: String,
}

/// Every Qdrant REST reply is wrapped like this.
#[derive(Debug, Clone, Deserialize)]
pub struct QdrantEnvelope<T> {
    #[serde(default = "Option::default")]
    pub result: Option<T>,
    #[serde(default)]
    pub status: Value,
}
