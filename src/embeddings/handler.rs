use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use tracing::{debug, error, info};

use super::dto::{EmbeddingRequest, EmbeddingResponse, ErrorBody, ServiceInfo};
use super::AppState;

type ApiError = (StatusCode, Json<ErrorBody>);

pub async fn create_embeddings(
    State(state): State<AppState>,
    Json(req): Json<EmbeddingRequest>,
) -> Result<Json<EmbeddingResponse>, ApiError> {
    let backend = state.backend.clone();
    let model = backend.model_id().to_string();

    if let Some(requested) = req.model.as_deref().filter(|m| *m != model) {
        debug!("ignoring model override '{requested}', serving {model}");
    }

    let count = req.inputs.len();
    info!(count, "embedding request");

    let data = if req.inputs.is_empty() {
        Vec::new()
    } else {
        let worker = backend.clone();
        tokio::task::spawn_blocking(move || worker.embed(&req.inputs))
            .await
            .map_err(|err| internal_error(format!("embedding task failed: {err}")))?
            .map_err(|err| internal_error(format!("{err:#}")))?
    };

    let dimensions = backend.dimensions(&data);

    Ok(Json(EmbeddingResponse {
        data,
        model,
        dimensions,
    }))
}

pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    let backend = &state.backend;
    let mut endpoints = BTreeMap::new();
    endpoints.insert(
        "/embeddings".to_string(),
        backend.endpoint_description().to_string(),
    );

    Json(ServiceInfo {
        name: backend.service_name().to_string(),
        model: backend.model_id().to_string(),
        device: backend.device_label(),
        endpoints,
    })
}

fn internal_error(detail: String) -> ApiError {
    error!("embedding failed: {detail}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { detail }),
    )
}
