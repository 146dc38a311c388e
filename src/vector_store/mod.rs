//! REST plumbing for the Qdrant smoke test.

pub mod client;
pub mod smoke;
pub mod types;

pub use client::{ApiReply, QdrantRestClient};
pub use smoke::{run_smoke_test, PointCheck, SmokeConfig};
pub use types::{Payload, PointId, VectorPoint};
