//! HTTP surface of the descriptor service
//!
//! Endpoints:
//!   GET /api/edf/descriptor?key=..&fileUrl=..  - Download, decode and store an EDF header
//!   GET /api/edf/metadata/:id?key=..           - Fetch a stored record
//!
//! Error bodies are plain text; successful responses are JSON. The OpenAPI
//! document is served at `/api-docs/openapi.json` with Swagger UI at `/swagger-ui`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, StorageBackend};
use crate::service::{
    AuthService, EdfFileService, InMemoryStore, JsonLinesStore, MetadataStore, PresharedKeyAuth,
    ServiceError, StorageError, UrlRetriever,
};
use crate::types::{EdfMetadata, StoredMetadata};

type ApiError = (StatusCode, String);

/// Application state shared across handlers
pub struct AppState {
    pub auth: Arc<dyn AuthService>,
    pub service: Arc<EdfFileService>,
}

impl AppState {
    pub fn new(auth: Arc<dyn AuthService>, service: EdfFileService) -> Self {
        Self {
            auth,
            service: Arc::new(service),
        }
    }

    /// Wires the retriever, store and key check described by `config`
    ///
    /// Expects a validated config; a missing secret key leaves every key invalid.
    pub fn from_config(config: &Config) -> Result<Self, StorageError> {
        let store: Arc<dyn MetadataStore> = match (config.storage.backend, &config.storage.path) {
            (StorageBackend::JsonLines, Some(path)) => Arc::new(JsonLinesStore::open(path)?),
            _ => Arc::new(InMemoryStore::new()),
        };

        let retriever = Arc::new(UrlRetriever::new(Duration::from_secs(
            config.retrieval.timeout_secs,
        )));
        let service = EdfFileService::new(retriever, store)
            .with_allowed_schemes(config.retrieval.allowed_schemes.iter().cloned());

        let secret = config.auth.secret_key.clone().unwrap_or_default();
        Ok(Self::new(Arc::new(PresharedKeyAuth::new(secret)), service))
    }
}

/// Query parameters of the descriptor endpoint
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DescriptorParams {
    /// Pre-shared authentication key
    pub key: Option<String>,
    /// URL of the EDF file to process
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct KeyParams {
    /// Pre-shared authentication key
    pub key: Option<String>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(get_descriptor, get_metadata),
    components(schemas(StoredMetadata, EdfMetadata)),
    tags(
        (name = "EDF File Service", description = "EDF header metadata extraction")
    ),
    info(
        title = "EDF Descriptor API",
        version = "0.1.0",
        description = "Downloads EDF files by URL, decodes their header metadata and stores the result"
    )
)]
pub struct ApiDoc;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/edf/descriptor", get(get_descriptor))
        .route("/api/edf/metadata/:id", get(get_metadata))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn check_key(state: &AppState, key: Option<&str>) -> Result<(), ApiError> {
    let key = match key {
        Some(k) if !k.trim().is_empty() => k,
        _ => {
            warn!("Authentication failed: missing key");
            return Err((StatusCode::BAD_REQUEST, "Authentication key is missing.".to_string()));
        }
    };

    if !state.auth.is_valid_key(key) {
        return Err((StatusCode::FORBIDDEN, "Invalid authentication key.".to_string()));
    }
    Ok(())
}

/// Downloads the EDF file at `fileUrl` and returns its stored metadata
#[utoipa::path(
    get,
    path = "/api/edf/descriptor",
    tag = "EDF File Service",
    params(DescriptorParams),
    responses(
        (status = 200, description = "Metadata extracted and stored", body = StoredMetadata),
        (status = 400, description = "Missing key, missing or invalid file URL", body = String),
        (status = 403, description = "Invalid authentication key", body = String),
        (status = 500, description = "The file could not be retrieved, decoded or stored", body = String)
    )
)]
pub async fn get_descriptor(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DescriptorParams>,
) -> Result<Json<StoredMetadata>, ApiError> {
    info!(url = ?params.file_url, "Received request to process EDF file");

    check_key(&state, params.key.as_deref())?;

    let file_url = match params.file_url {
        Some(u) if !u.trim().is_empty() => u,
        _ => {
            warn!("Invalid request: missing file URL");
            return Err((StatusCode::BAD_REQUEST, "File URL is required.".to_string()));
        }
    };

    let service = state.service.clone();
    let url = file_url.clone();
    let result = tokio::task::spawn_blocking(move || service.process(&url)).await;

    match result {
        Ok(Ok(stored)) => {
            info!(id = stored.id, url = %file_url, "Successfully processed EDF file");
            Ok(Json(stored))
        }
        Ok(Err(ServiceError::InvalidUrl(message))) => {
            warn!(url = %file_url, "Invalid file URL provided");
            Err((StatusCode::BAD_REQUEST, message))
        }
        Ok(Err(e)) => {
            error!(url = %file_url, error = %e, "Error processing EDF file");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing EDF file.".to_string(),
            ))
        }
        Err(e) => {
            error!(url = %file_url, error = %e, "Unexpected error while processing EDF file");
            Err(unexpected_error())
        }
    }
}

/// Returns a previously stored record
#[utoipa::path(
    get,
    path = "/api/edf/metadata/{id}",
    tag = "EDF File Service",
    params(
        ("id" = u64, Path, description = "Record id returned by the descriptor endpoint"),
        KeyParams
    ),
    responses(
        (status = 200, description = "Stored metadata record", body = StoredMetadata),
        (status = 400, description = "Missing authentication key", body = String),
        (status = 403, description = "Invalid authentication key", body = String),
        (status = 404, description = "No record with this id", body = String),
        (status = 500, description = "The store could not be read", body = String)
    )
)]
pub async fn get_metadata(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(params): Query<KeyParams>,
) -> Result<Json<StoredMetadata>, ApiError> {
    check_key(&state, params.key.as_deref())?;

    // JSON lines 存储会加锁并重读文件
    let store = state.service.store().clone();
    let found = match tokio::task::spawn_blocking(move || store.find(id)).await {
        Ok(Ok(found)) => found,
        Ok(Err(e)) => {
            error!(id, error = %e, "Failed to read stored metadata");
            return Err(unexpected_error());
        }
        Err(e) => {
            error!(id, error = %e, "Unexpected error while reading stored metadata");
            return Err(unexpected_error());
        }
    };

    found
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Metadata not found.".to_string()))
}

fn unexpected_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "An unexpected error occurred.".to_string(),
    )
}
