use anyhow::Result;
use rand::Rng;

use super::backend::EmbeddingBackend;

/// Matches all-MiniLM-L6-v2 so downstream collections can be sized the same.
pub const SIMULATED_DIMENSIONS: usize = 384;
pub const SIMULATOR_MODEL_ID: &str = "random-embeddings-simulator";

/// Stand-in backend returning uniform `[0, 1)` vectors. Nothing is normalized
/// and nothing is reproducible.
#[derive(Debug, Clone)]
pub struct RandomEmbedder {
    dimensions: usize,
}

impl RandomEmbedder {
    pub fn new() -> Self {
        Self {
            dimensions: SIMULATED_DIMENSIONS,
        }
    }
}

impl Default for RandomEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingBackend for RandomEmbedder {
    fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut rng = rand::thread_rng();
        Ok(inputs
            .iter()
            .map(|_| (0..self.dimensions).map(|_| rng.gen::<f32>()).collect())
            .collect())
    }

    fn model_id(&self) -> &str {
        SIMULATOR_MODEL_ID
    }

    fn service_name(&self) -> &str {
        "Embeddings API Simulator"
    }

    fn device_label(&self) -> String {
        "simulation".to_string()
    }

    fn endpoint_description(&self) -> &str {
        "POST - Generate simulated embeddings"
    }

    fn dimensions(&self, _data: &[Vec<f32>]) -> usize {
        self.dimensions
    }
}
