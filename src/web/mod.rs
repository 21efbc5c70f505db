//! Web API module for LazyESP.
//!
//! A REST API for browser-based layout editors: compile a project, validate
//! it, list hardware profiles and read a generated document back.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/profiles` - List hardware profiles
//! - `POST /api/compile` - Compile a project (body: project JSON)
//! - `POST /api/validate` - Validate a project (body: project JSON)
//! - `POST /api/import` - Rebuild a project from a document

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::compiler::{CompileOutput, Compiler, ValidationError};
use crate::config::Config;
use crate::hardware::{DefaultTemplateSource, HardwareCatalog, ProfileSummary};
use crate::models::Project;
use crate::parser::import_document;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the web API.
#[derive(Clone)]
pub struct AppState {
    /// Compiler shared by all requests (immutable after load)
    compiler: Arc<Compiler>,
}

impl AppState {
    /// Creates the state from the application configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut catalog = HardwareCatalog::load()?;
        if let Some(dir) = &config.paths.hardware_dir {
            let added = catalog.load_recipes_from(dir)?;
            info!("Loaded {} recipe profile(s) from {}", added, dir.display());
        }
        let compiler = Compiler::new(catalog, Box::new(DefaultTemplateSource::from_config(config)));
        Ok(Self::with_compiler(compiler))
    }

    /// Wraps an existing compiler.
    pub fn with_compiler(compiler: Compiler) -> Self {
        Self {
            compiler: Arc::new(compiler),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Current health status (e.g., "healthy").
    pub status: String,
    /// Application version.
    pub version: String,
}

/// Profile list response.
#[derive(Debug, Serialize)]
pub struct ProfileListResponse {
    /// Available profiles.
    pub profiles: Vec<ProfileSummary>,
}

/// Validation result response.
#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    /// Whether the project is valid.
    pub valid: bool,
    /// Blocking problems.
    pub errors: Vec<ValidationError>,
    /// Non-fatal issues.
    pub warnings: Vec<String>,
}

/// Import request.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// Generated document text.
    pub document: String,
}

/// Import response.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    /// The rebuilt project.
    pub project: Project,
    /// Whether the document carried a project settings line.
    pub has_settings: bool,
    /// Annotations that could not be read back.
    pub skipped: Vec<String>,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Error message.
    pub error: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /health - Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/profiles - List hardware profiles.
async fn list_profiles(State(state): State<AppState>) -> Json<ProfileListResponse> {
    let profiles = state
        .compiler
        .catalog()
        .entries()
        .iter()
        .map(ProfileSummary::from)
        .collect();
    Json(ProfileListResponse { profiles })
}

/// POST /api/compile - Compile a project.
///
/// Compilation may fetch a hardware template, so it runs on the blocking pool.
async fn compile_project(
    State(state): State<AppState>,
    Json(project): Json<Project>,
) -> ApiResult<CompileOutput> {
    let request_id = Uuid::new_v4();
    info!(%request_id, "Compile request for '{}' ({})", project.name, project.device_model);

    let compiler = Arc::clone(&state.compiler);
    let output = tokio::task::spawn_blocking(move || compiler.compile(&project))
        .await
        .map_err(|e| {
            warn!(%request_id, "Compile task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::with_details("Compilation task failed", e.to_string())),
            )
        })?;

    info!(
        %request_id,
        "Compiled {} byte(s), {} diagnostic(s)",
        output.document.len(),
        output.diagnostics.len()
    );
    Ok(Json(output))
}

/// POST /api/validate - Validate a project.
async fn validate_project(
    State(state): State<AppState>,
    Json(project): Json<Project>,
) -> ApiResult<ValidationResponse> {
    let compiler = Arc::clone(&state.compiler);
    let report = tokio::task::spawn_blocking(move || compiler.validate(&project))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::with_details("Validation task failed", e.to_string())),
            )
        })?;

    Ok(Json(ValidationResponse {
        valid: report.is_valid(),
        warnings: report.warnings.iter().map(|w| w.message.clone()).collect(),
        errors: report.errors,
    }))
}

/// POST /api/import - Rebuild a project from a generated document.
async fn import_project(Json(request): Json<ImportRequest>) -> ApiResult<ImportResponse> {
    let imported = import_document(&request.document);
    if imported.project.pages.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError::new(
                "Document contains no pages or widget annotations",
            )),
        ));
    }
    Ok(Json(ImportResponse {
        project: imported.project,
        has_settings: imported.has_settings,
        skipped: imported.skipped,
    }))
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    // NOTE: permissive CORS; the server is meant to run next to a local editor.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/profiles", get(list_profiles))
        .route("/api/compile", post(compile_project))
        .route("/api/validate", post(validate_project))
        .route("/api/import", post(import_project))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the web server.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or the server fails to start.
pub async fn run_server(config: Config, addr: SocketAddr) -> anyhow::Result<()> {
    let state = AppState::new(&config)?;
    let app = create_router(state);

    info!("Starting LazyESP web server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
