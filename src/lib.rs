pub mod config;
pub mod embeddings;
pub mod inference;
pub mod telemetry;
pub mod vector_store;
