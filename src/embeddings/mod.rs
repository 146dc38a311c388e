use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod backend;
pub mod dto;
pub mod handler;
pub mod simulator;

pub use backend::EmbeddingBackend;
pub use simulator::RandomEmbedder;

use handler::{create_embeddings, root};

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn EmbeddingBackend>,
}

impl AppState {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { backend }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/embeddings", post(create_embeddings))
}

/// Full application: routes, CORS, request tracing and state.
pub fn app(state: AppState) -> Router {
    router()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use axum::body::{to_bytes, Body, Bytes};
    use axum::http::{Request, StatusCode};
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    use super::dto::{EmbeddingResponse, ErrorBody, ServiceInfo};
    use super::simulator::SIMULATED_DIMENSIONS;

    /// Deterministic backend: vector i is the unit basis vector e_(len % 4).
    struct FixedBackend;

    impl EmbeddingBackend for FixedBackend {
        fn embed(&self, inputs: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(inputs
                .iter()
                .map(|s| {
                    let mut v = vec![0.0; 4];
                    v[s.len() % 4] = 1.0;
                    v
                })
                .collect())
        }
        fn model_id(&self) -> &str {
            "fixed"
        }
        fn service_name(&self) -> &str {
            "Embeddings API"
        }
        fn device_label(&self) -> String {
            "cpu".into()
        }
        fn endpoint_description(&self) -> &str {
            "POST - test"
        }
    }

    struct FailingBackend;

    impl EmbeddingBackend for FailingBackend {
        fn embed(&self, _inputs: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Err(anyhow!("tokenizer exploded"))
        }
        fn model_id(&self) -> &str {
            "broken"
        }
        fn service_name(&self) -> &str {
            "Embeddings API"
        }
        fn device_label(&self) -> String {
            "cpu".into()
        }
        fn endpoint_description(&self) -> &str {
            "POST - test"
        }
    }

    fn app_with(backend: impl EmbeddingBackend + 'static) -> Router {
        app(AppState::new(Arc::new(backend)))
    }

    async fn post_json(app: Router, body: &str) -> (StatusCode, Bytes) {
        let res = app
            .oneshot(
                Request::post("/embeddings")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, bytes)
    }

    fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn returns_one_vector_per_input_in_order() {
        let (status, body) =
            post_json(app_with(FixedBackend), r#"{"inputs": ["a", "bb", "ccc"]}"#).await;
        assert_eq!(status, StatusCode::OK);
        let res: EmbeddingResponse = parse(&body);
        assert_eq!(res.model, "fixed");
        assert_eq!(res.dimensions, 4);
        assert_eq!(res.data.len(), 3);
        assert_eq!(res.data[0], vec![0.0, 1.0, 0.0, 0.0]);
        assert_eq!(res.data[2], vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[tokio::test]
    async fn empty_inputs_give_empty_data() {
        let (status, body) = post_json(app_with(FixedBackend), r#"{"inputs": []}"#).await;
        assert_eq!(status, StatusCode::OK);
        let res: EmbeddingResponse = parse(&body);
        assert!(res.data.is_empty());
        assert_eq!(res.dimensions, 0);
    }

    #[tokio::test]
    async fn empty_inputs_skip_the_backend() {
        let (status, _) = post_json(app_with(FailingBackend), r#"{"inputs": []}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn model_override_is_ignored() {
        let (status, body) = post_json(
            app_with(FixedBackend),
            r#"{"inputs": ["x"], "model": "something-else"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let res: EmbeddingResponse = parse(&body);
        assert_eq!(res.model, "fixed");
    }

    #[tokio::test]
    async fn backend_failure_is_500_with_detail() {
        let (status, body) = post_json(app_with(FailingBackend), r#"{"inputs": ["x"]}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let err: ErrorBody = parse(&body);
        assert!(err.detail.contains("tokenizer exploded"));
    }

    #[tokio::test]
    async fn simulator_route_reports_384() {
        let (status, body) =
            post_json(app_with(RandomEmbedder::new()), r#"{"inputs": ["a", "b"]}"#).await;
        assert_eq!(status, StatusCode::OK);
        let res: EmbeddingResponse = parse(&body);
        assert_eq!(res.model, "random-embeddings-simulator");
        assert_eq!(res.dimensions, SIMULATED_DIMENSIONS);
        assert!(res.data.iter().all(|v| v.len() == SIMULATED_DIMENSIONS));

        let (_, body) = post_json(app_with(RandomEmbedder::new()), r#"{"inputs": []}"#).await;
        let res: EmbeddingResponse = parse(&body);
        assert!(res.data.is_empty());
        assert_eq!(res.dimensions, SIMULATED_DIMENSIONS);
    }

    #[tokio::test]
    async fn root_describes_simulator() {
        let res = app_with(RandomEmbedder::new())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let info: ServiceInfo = parse(&bytes);
        assert_eq!(info.name, "Embeddings API Simulator");
        assert_eq!(info.model, "random-embeddings-simulator");
        assert_eq!(info.device, "simulation");
        assert!(info.endpoints.contains_key("/embeddings"));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let (status, _) = post_json(app_with(FixedBackend), r#"{"texts": ["x"]}"#).await;
        assert!(status.is_client_error());
    }
}
