//! Serve command implementation
//!
//! Runs a local HTTP evaluation service over the persisted repository.
//! Configs are read on every request, so a concurrent `watch` or `sync`
//! is picked up without a restart.
//!
//! # Security Notes
//! - Binds to `127.0.0.1` (localhost only)
//! - CORS is permissive for local development only

use crate::error::{CliError, CliResult};
use crate::ops::evaluate::{evaluate_persisted, Evaluation};
use crate::repository::FsRepository;
use crate::utils::config::ProjectConfig;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use controlpath_native::sync::Repository;
use controlpath_native::{ClientError, Config};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;

const DEFAULT_PORT: u16 = 8080;

/// Command options for the evaluation service
pub struct Options {
    pub repo: Option<String>,
    /// Port for web server (default: 8080)
    pub port: Option<u16>,
}

struct AppState {
    repository: FsRepository,
}

#[derive(Debug, Deserialize)]
struct EvaluateRequest {
    namespace: String,
    key: String,
    #[serde(default)]
    context: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct EvaluateResponse {
    value: serde_json::Value,
    path: Vec<usize>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn client_error(err: &ClientError) -> ApiError {
    let status = match err {
        ClientError::NotFound { .. } => StatusCode::NOT_FOUND,
        ClientError::Evaluation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ClientError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, err)
}

/// API handler: List namespaces in the repository
async fn list_namespaces(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    state
        .repository
        .list_namespaces()
        .map(Json)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))
}

/// API handler: All configs of one namespace
async fn list_configs(
    State(state): State<Arc<AppState>>,
    Path(namespace): Path<String>,
) -> Result<Json<Vec<Config>>, ApiError> {
    match state.repository.read_namespace(&namespace) {
        Ok(Some(ns)) => Ok(Json(ns.configs)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Namespace '{namespace}' not found"),
        )),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e)),
    }
}

/// API handler: Evaluate a config against a context
///
/// Unknown configs are 404; invalid contexts and rule type mismatches are 422.
async fn evaluate_config(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let context = req.context.unwrap_or_else(|| serde_json::json!({}));
    let Evaluation { value, path, .. } =
        evaluate_persisted(&state.repository, &req.namespace, &req.key, &context)
            .map_err(|e| client_error(&e))?;
    tracing::debug!(namespace = %req.namespace, key = %req.key, path = ?path, "served evaluation");
    Ok(Json(EvaluateResponse { value, path }))
}

/// Create the router
///
/// Sets up routes and middleware. CORS is permissive for local development.
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/namespaces", get(list_namespaces))
        .route("/api/configs/:namespace", get(list_configs))
        .route("/api/evaluate", post(evaluate_config))
        // CORS is permissive for local development only
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the serve command
///
/// The server runs until interrupted (Ctrl+C) and handles graceful shutdown.
pub fn run(options: &Options) -> i32 {
    match run_inner(options) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("✗ Server failed");
            eprintln!("  Error: {e}");
            1
        }
    }
}

fn run_inner(options: &Options) -> CliResult<()> {
    let config = ProjectConfig::load()?;
    let repository = FsRepository::new(config.repository(options.repo.as_deref()));

    let namespaces = repository.list_namespaces()?;
    println!("✓ Serving repository: {}", repository.root().display());
    println!("  Namespaces: {}", namespaces.len());

    let router = create_router(Arc::new(AppState { repository }));
    let port = options.port.unwrap_or(DEFAULT_PORT);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Message(format!("Failed to create runtime: {e}")))?;

    rt.block_on(async {
        let addr = format!("127.0.0.1:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| CliError::Message(format!("Failed to bind to {addr}: {e}")))?;

        println!();
        println!("Evaluation service running at http://localhost:{port}");
        println!("   Press Ctrl+C to stop");
        println!();

        let server = axum::serve(listener, router);
        let graceful = server.with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            println!("\nShutting down gracefully...");
        });

        graceful
            .await
            .map_err(|e| CliError::Message(format!("Server error: {e}")))?;

        Ok::<(), CliError>(())
    })
}
