use anyhow::Result;

use crate::inference::BertEncoder;

/// Whatever turns a batch of strings into vectors behind `POST /embeddings`.
pub trait EmbeddingBackend: Send + Sync {
    /// One vector per input, in input order.
    fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>>;

    fn model_id(&self) -> &str;

    /// Human-readable service name for `GET /`.
    fn service_name(&self) -> &str;

    fn device_label(&self) -> String;

    fn endpoint_description(&self) -> &str;

    /// Dimensionality reported alongside `data`.
    fn dimensions(&self, data: &[Vec<f32>]) -> usize {
        data.first().map(Vec::len).unwrap_or(0)
    }
}

impl EmbeddingBackend for BertEncoder {
    fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        self.encode(inputs)
    }

    fn model_id(&self) -> &str {
        BertEncoder::model_id(self)
    }

    fn service_name(&self) -> &str {
        "Embeddings API"
    }

    fn device_label(&self) -> String {
        self.device_kind().to_string()
    }

    fn endpoint_description(&self) -> &str {
        "POST - Generate embeddings for the given texts"
    }
}
