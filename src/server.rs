//! HTTP relay server.
//!
//! Exposes the ontology store and the chat relay over a small JSON API.
//! Every endpoint is a pass-through to the in-process operations in
//! [`crate::store`], [`crate::registry`] and [`crate::chat`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Service description and model URL |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/chat` | Chat with the model using the current ontology context |
//! | `POST` | `/load-ontology` | Upload (multipart field `file`) and load an ontology |
//! | `POST` | `/load-ontology-from-storage` | Load a file from the storage directory |
//! | `GET`  | `/ontologies` | List ontology files in the storage directory |
//! | `GET`  | `/ontology-context` | Current rendered context |
//! | `POST` | `/query-ontology` | Keyword query over the current ontology |
//! | `GET`  | `/registry` | Registered names and the active one |
//! | `POST` | `/registry/load` | Load a storage file under a name |
//! | `POST` | `/registry/activate` | Switch the active ontology (and the current context) |
//! | `GET`  | `/registry/{name}` | Describe one registered ontology |
//!
//! # Error Contract
//!
//! A load that does not take effect answers `422` with
//! `{ "error": "Failed to load ontology: <name>" }`. Malformed requests use
//! the structured form:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "message must not be empty" } }
//! ```

use axum::{
    extract::{Multipart, Path as UrlPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::chat::{ChatModel, OllamaChat};
use crate::config::Config;
use crate::loader::read_document;
use crate::registry::{OntologyInfo, OntologyRegistry};
use crate::store::OntologyStore;

/// File suffixes listed by `GET /ontologies`.
pub const LISTED_EXTENSIONS: &[&str] = &["json", "ttl", "rdf", "owl"];

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<OntologyStore>,
    registry: Arc<RwLock<OntologyRegistry>>,
    model: Arc<dyn ChatModel>,
}

impl AppState {
    pub fn new(config: Config, model: Arc<dyn ChatModel>) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(OntologyStore::new()),
            registry: Arc::new(RwLock::new(OntologyRegistry::new())),
            model,
        }
    }

    pub fn store(&self) -> &OntologyStore {
        &self.store
    }

    pub fn registry(&self) -> RwLockReadGuard<'_, OntologyRegistry> {
        self.registry.read().unwrap_or_else(|p| p.into_inner())
    }

    fn registry_mut(&self) -> RwLockWriteGuard<'_, OntologyRegistry> {
        self.registry.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Loads `path`, registers it under `name` and makes it active.
    ///
    /// The registry and the current store are updated from the same parsed
    /// document, or neither is.
    pub fn load_ontology(&self, name: &str, path: &str) -> bool {
        match read_document(path) {
            Ok(doc) => {
                let mut registry = self.registry_mut();
                registry.insert(name, doc.clone());
                registry.set_active(name);
                self.store.replace(doc);
                drop(registry);
                tracing::info!(name, path, "ontology loaded");
                true
            }
            Err(e) => {
                tracing::warn!(name, path, error = %e, "failed to load ontology");
                false
            }
        }
    }

    /// Loads `file_name` from the configured storage directory.
    pub fn load_from_storage(&self, file_name: &str) -> bool {
        match self.storage_path(file_name) {
            Some((name, path)) => self.load_ontology(&name, &path),
            None => false,
        }
    }

    /// Registers `file_name` from the storage directory under `name`.
    ///
    /// The active entry only changes when the registry was empty; the store
    /// follows it either way.
    pub fn register_from_storage(&self, name: &str, file_name: &str) -> bool {
        let Some((_, path)) = self.storage_path(file_name) else {
            return false;
        };
        let doc = match read_document(&path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(name, path = %path, error = %e, "failed to load ontology");
                return false;
            }
        };

        let mut registry = self.registry_mut();
        registry.insert(name, doc);
        self.sync_store(&registry);
        tracing::info!(name, path = %path, "ontology registered");
        true
    }

    /// Switches the active ontology and installs it as the current document.
    pub fn activate(&self, name: &str) -> bool {
        let mut registry = self.registry_mut();
        if !registry.set_active(name) {
            return false;
        }
        self.sync_store(&registry);
        true
    }

    fn sync_store(&self, registry: &OntologyRegistry) {
        let active = registry.active_name().and_then(|name| registry.get(name));
        if let Some(doc) = active {
            self.store.replace(doc.clone());
        }
    }

    /// Resolves a requested name to `(file name, path)` inside the storage
    /// directory. Directory components are dropped.
    fn storage_path(&self, file_name: &str) -> Option<(String, String)> {
        let Some(name) = plain_file_name(file_name) else {
            tracing::warn!(file_name, "rejected storage file name");
            return None;
        };
        let path = self.config.storage.ontologies_dir.join(&name);
        let path = path.to_str()?.to_string();
        Some((name, path))
    }
}

/// Builds the router with all relay endpoints.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/chat", post(handle_chat))
        .route("/load-ontology", post(handle_upload))
        .route("/load-ontology-from-storage", post(handle_load_from_storage))
        .route("/ontologies", get(handle_list_ontologies))
        .route("/ontology-context", get(handle_context))
        .route("/query-ontology", post(handle_query))
        .route("/registry", get(handle_registry))
        .route("/registry/load", post(handle_registry_load))
        .route("/registry/activate", post(handle_registry_activate))
        .route("/registry/{name}", get(handle_registry_describe))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the relay server on `[server].bind` and runs until Ctrl-C.
///
/// When `[storage].default_ontology` is set it is loaded before the listener
/// opens; a failure there is logged and the server starts empty.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let model = Arc::new(OllamaChat::new(&config.model)?);
    let state = AppState::new(config.clone(), model);

    if let Some(default) = &config.storage.default_ontology {
        if state.load_from_storage(default) {
            println!("Loaded default ontology: {}", default);
        } else {
            eprintln!("Warning: could not load default ontology: {}", default);
        }
    }

    if !state.model.is_available().await {
        tracing::warn!(url = %config.model.url, "model backend is not reachable");
    }

    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    println!("Ontology relay listening on http://{}", bind_addr);
    println!("Model backend: {} ({})", config.model.url, config.model.name);
    tracing::info!(bind = %bind_addr, model_url = %config.model.url, "relay started");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
    }
    tracing::info!("shutdown signal received");
}

/// Reduces an uploaded or requested file name to a bare final component.
fn plain_file_name(raw: &str) -> Option<String> {
    let name = Path::new(raw).file_name()?.to_str()?;
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

/// Ontology files in `dir` (non-recursive), sorted by name.
pub fn list_storage(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| LISTED_EXTENSIONS.contains(&ext))
                .unwrap_or(false)
        })
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

// ============ Error response ============

/// JSON error response body: `{ "error": { "code", "message" } }`.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (`"bad_request"`, `"not_found"`, `"internal"`).
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

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// `{message}` on success, `{error}` with 422 when the load did not take effect.
#[derive(Serialize)]
#[serde(untagged)]
enum LoadOutcome {
    Loaded { message: String },
    Failed { error: String },
}

impl IntoResponse for LoadOutcome {
    fn into_response(self) -> Response {
        let status = match self {
            LoadOutcome::Loaded { .. } => StatusCode::OK,
            LoadOutcome::Failed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, Json(self)).into_response()
    }
}

// ============ Request / response bodies ============

/// Single-field request body shared by chat, query and load-from-storage.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    /// Chat question, query term or storage file name, depending on the route.
    pub message: String,
}

/// JSON response body for `POST /chat`.
#[derive(Serialize)]
struct ChatReply {
    /// Model reply, or `Error: ...` text when the backend failed.
    response: String,
}

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"`.
    status: String,
    /// Crate version from `Cargo.toml`.
    version: String,
}

/// JSON response body for `GET /`.
#[derive(Serialize)]
struct RootResponse {
    message: String,
    /// Base URL of the model backend.
    model_url: String,
    /// Model identifier sent with chat requests.
    model: String,
    /// Endpoint key to one-line description.
    endpoints: BTreeMap<&'static str, &'static str>,
}

/// JSON response body for `GET /ontologies`.
#[derive(Serialize)]
struct OntologyList {
    /// File names in the storage directory, sorted.
    ontologies: Vec<String>,
}

/// JSON response body for `GET /ontology-context`.
#[derive(Serialize)]
struct ContextResponse {
    context: String,
}

/// JSON response body for `POST /query-ontology`.
#[derive(Serialize)]
struct QueryResponse {
    result: String,
}

/// JSON response body for `GET /registry`.
#[derive(Serialize)]
struct RegistryResponse {
    /// Registered names in registration order.
    names: Vec<String>,
    /// Active name, `null` while nothing is registered.
    active: Option<String>,
}

/// JSON request body for `POST /registry/load`.
#[derive(Debug, Deserialize)]
struct RegistryLoadRequest {
    /// Name to register the document under.
    name: String,
    /// File name inside the storage directory. Directory components are dropped.
    path: String,
}

/// JSON request body for `POST /registry/activate`.
#[derive(Debug, Deserialize)]
struct ActivateRequest {
    name: String,
}

// ============ Handlers ============

async fn handle_root(State(state): State<AppState>) -> Json<RootResponse> {
    let endpoints = BTreeMap::from([
        ("chat", "/chat - Chat with the model using ontology context"),
        ("load_ontology", "/load-ontology - Upload and load an ontology file"),
        (
            "load_ontology_from_storage",
            "/load-ontology-from-storage - Load an ontology from storage by file name",
        ),
        ("ontologies", "/ontologies - List ontologies in storage"),
        ("ontology_context", "/ontology-context - Current ontology context"),
        ("query_ontology", "/query-ontology - Keyword query over the loaded ontology"),
        ("registry", "/registry - Named ontologies and the active one"),
    ]);

    Json(RootResponse {
        message: "Ontology Harness relay".to_string(),
        model_url: state.model.base_url().to_string(),
        model: state.model.model_name().to_string(),
        endpoints,
    })
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<ChatReply>, AppError> {
    if req.message.trim().is_empty() {
        return Err(bad_request("message must not be empty"));
    }
    let context = state.store.context();
    let response = state.model.chat(&req.message, &context).await;
    Ok(Json(ChatReply { response }))
}

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<LoadOutcome, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let raw_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| bad_request("file field must carry a file name"))?;
        let name = plain_file_name(&raw_name)
            .ok_or_else(|| bad_request(format!("invalid file name: {}", raw_name)))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("failed to read upload: {}", e)))?;

        let dir = &state.config.storage.upload_dir;
        let path: PathBuf = dir.join(&name);
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| internal(format!("failed to create {}: {}", dir.display(), e)))?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| internal(format!("failed to write {}: {}", path.display(), e)))?;

        let path_str = path.to_string_lossy().to_string();
        return Ok(if state.load_ontology(&name, &path_str) {
            LoadOutcome::Loaded {
                message: format!("Ontology loaded successfully from {}", name),
            }
        } else {
            LoadOutcome::Failed {
                error: format!("Failed to load ontology: {}", name),
            }
        });
    }

    Err(bad_request("multipart field 'file' is required"))
}

async fn handle_load_from_storage(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> LoadOutcome {
    if state.load_from_storage(&req.message) {
        LoadOutcome::Loaded {
            message: format!("Ontology loaded successfully from storage: {}", req.message),
        }
    } else {
        LoadOutcome::Failed {
            error: format!("Failed to load ontology: {}", req.message),
        }
    }
}

async fn handle_list_ontologies(State(state): State<AppState>) -> Json<OntologyList> {
    Json(OntologyList {
        ontologies: list_storage(&state.config.storage.ontologies_dir),
    })
}

async fn handle_context(State(state): State<AppState>) -> Json<ContextResponse> {
    Json(ContextResponse {
        context: state.store.context(),
    })
}

async fn handle_query(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Json<QueryResponse> {
    Json(QueryResponse {
        result: state.store.query(&req.message),
    })
}

async fn handle_registry(State(state): State<AppState>) -> Json<RegistryResponse> {
    let registry = state.registry();
    Json(RegistryResponse {
        names: registry.list_names(),
        active: registry.active_name().map(str::to_string),
    })
}

async fn handle_registry_load(
    State(state): State<AppState>,
    Json(req): Json<RegistryLoadRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.name.trim().is_empty() {
        return Err(bad_request("name must not be empty"));
    }
    let loaded = state.register_from_storage(&req.name, &req.path);
    Ok(Json(serde_json::json!({ "loaded": loaded })))
}

async fn handle_registry_activate(
    State(state): State<AppState>,
    Json(req): Json<ActivateRequest>,
) -> Json<serde_json::Value> {
    let activated = state.activate(&req.name);
    Json(serde_json::json!({ "activated": activated }))
}

async fn handle_registry_describe(
    State(state): State<AppState>,
    UrlPath(name): UrlPath<String>,
) -> Result<Json<OntologyInfo>, AppError> {
    let info = state.registry().describe(&name);
    info.map(Json)
        .ok_or_else(|| not_found(format!("no ontology registered with name: {}", name)))
}
