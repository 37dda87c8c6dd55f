//! HTTP gateway server.
//!
//! Exposes the document store to external callers — LLM agents in
//! particular — via a small JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Auth | Description |
//! |--------|------|------|-------------|
//! | `POST` | `/aggregate` | `X-API-Key` | Run an aggregation pipeline |
//! | `POST` | `/schema` | — | Inferred schema + sample per collection |
//! | `GET`  | `/databases` | — | Databases and their collections |
//! | `GET`  | `/health` | — | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "pipeline must be an array of stages" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unauthorized` (401), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients and cross-origin tool calls.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::aggregate::{run_aggregate, AggregateOutcome};
use crate::catalog;
use crate::config::Config;
use crate::error::GatewayError;
use crate::schema::{cached_schema, SchemaCache, SchemaReport};
use crate::store::DocumentStore;

/// Header carrying the shared secret for `/aggregate`.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<dyn DocumentStore>,
    /// Collection → database index, built once before serving and
    /// read-only afterwards.
    index: Arc<HashMap<String, String>>,
    schema_cache: Arc<SchemaCache>,
}

/// Starts the gateway HTTP server.
///
/// Builds the collection→database index (fatal on failure — serving
/// without it would break inference silently), publishes it into shared
/// state, then binds to `[server].bind` and runs until the process is
/// terminated.
pub async fn run_server(config: &Config, store: Arc<dyn DocumentStore>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let index = Arc::new(catalog::build_collection_index(store.as_ref()).await?);
    tracing::info!(
        "collection-to-database index built with {} entries",
        index.len()
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        index,
        schema_cache: Arc::new(SchemaCache::new()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/aggregate", post(handle_aggregate))
        .route("/schema", post(handle_schema))
        .route("/databases", get(handle_databases))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("Gateway listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn unauthorized() -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized".to_string(),
        message: "Unauthorized".to_string(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Shared-secret gate. Rejected requests never reach the store.
fn require_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let provided = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    if provided == Some(state.config.server.api_key.as_str()) {
        Ok(())
    } else {
        Err(unauthorized())
    }
}

// ============ POST /aggregate ============

#[derive(Deserialize)]
struct AggregateBody {
    #[serde(default)]
    db_name: Option<String>,
    collection: String,
    pipeline: serde_json::Value,
}

/// Handler for `POST /aggregate`.
///
/// Requires the API key. Returns `{"results": [...]}`, or
/// `{"results": [], "debug": {...}}` when the pipeline's `$match` excluded
/// every document.
async fn handle_aggregate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AggregateBody>,
) -> Result<Json<AggregateOutcome>, AppError> {
    require_api_key(&state, &headers)?;

    let outcome = run_aggregate(
        state.store.as_ref(),
        &state.index,
        &state.config,
        body.db_name.as_deref(),
        &body.collection,
        &body.pipeline,
    )
    .await
    .map_err(|e| {
        if !e.is_client_error() {
            tracing::error!("aggregate on '{}' failed: {}", body.collection, e);
        }
        AppError::from(e)
    })?;

    Ok(Json(outcome))
}

// ============ POST /schema ============

#[derive(Deserialize)]
struct SchemaBody {
    #[serde(default)]
    db_name: Option<String>,
}

/// Handler for `POST /schema`.
///
/// Returns the inferred schema and one sample document per collection.
/// Falls back to the configured default database when the body names none.
async fn handle_schema(
    State(state): State<AppState>,
    Json(body): Json<SchemaBody>,
) -> Result<Json<SchemaReport>, AppError> {
    let db_name = body
        .db_name
        .or_else(|| state.config.mongodb.default_db.clone())
        .ok_or_else(|| {
            bad_request("db_name is required when mongodb.default_db is not configured")
        })?;

    let report = cached_schema(
        state.store.as_ref(),
        &state.schema_cache,
        &db_name,
        state.config.schema.sample_size,
    )
    .await
    .map_err(|e| {
        tracing::error!("schema inference for '{}' failed: {}", db_name, e);
        internal(e.to_string())
    })?;

    Ok(Json((*report).clone()))
}

// ============ GET /databases ============

/// Handler for `GET /databases`.
///
/// Returns every non-system database with its collection names — an
/// overview agents use to orient themselves before querying.
async fn handle_databases(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, Vec<String>>>, AppError> {
    let databases = catalog::list_databases(state.store.as_ref())
        .await
        .map_err(|e| {
            tracing::error!("database listing failed: {}", e);
            internal(e.to_string())
        })?;

    Ok(Json(databases))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Handler for `GET /health`. Used by load balancers and monitoring tools.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
