//! HTTP chat service.
//!
//! Exposes the answer pipeline over `POST /chat`. Pipeline failures are reported in the
//! body with `"error": true`; the status code stays 200 so existing clients keep working.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{ServerSettings, Settings};
use crate::orchestrator::Orchestrator;
use crate::rag::{RagEngine, APOLOGY_MESSAGE};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state.
pub struct AppState {
    engine: Arc<RagEngine>,
    title: String,
    service_name: String,
}

impl AppState {
    /// Create the request-handling context around a ready answer pipeline.
    pub fn new(engine: Arc<RagEngine>, server: &ServerSettings) -> Self {
        Self {
            engine,
            title: server.title.clone(),
            service_name: server.service_name.clone(),
        }
    }
}

/// Build the router with CORS open to any origin.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/chat", post(chat))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Answer, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'rosana-desk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let spinner = Output::spinner("Building knowledge base...");
    let orchestrator = match Orchestrator::bootstrap(settings).await {
        Ok(orchestrator) => {
            spinner.finish_and_clear();
            orchestrator
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Startup failed: {}", e));
            return Err(e.into());
        }
    };

    for table in orchestrator.failed_tables() {
        Output::warning(&format!("Table '{}' was indexed as an empty document", table));
    }

    let state = Arc::new(AppState::new(
        orchestrator.engine(),
        &orchestrator.settings().server,
    ));
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header(&orchestrator.settings().server.title);
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Model", orchestrator.engine().model());
    Output::kv("Documents", &orchestrator.index().len().to_string());
    println!();
    println!("Endpoints:");
    Output::kv("Status", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Chat", "POST /chat");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    orchestrator.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
}

impl ChatResponse {
    fn answered(answer: String, model: &str) -> Self {
        Self {
            response: answer,
            role: "ai".to_string(),
            model: Some(model.to_string()),
            error: None,
        }
    }

    fn apology() -> Self {
        Self {
            response: APOLOGY_MESSAGE.to_string(),
            role: "ai".to_string(),
            model: None,
            error: Some(true),
        }
    }
}

#[derive(Debug, Serialize)]
struct RootResponse {
    message: String,
    status: &'static str,
    model: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model: String,
    service: String,
}

// === Handlers ===

async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        message: state.title.clone(),
        status: "online",
        model: state.engine.model().to_string(),
    })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model: state.engine.model().to_string(),
        service: state.service_name.clone(),
    })
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatResponse> {
    Json(answer(&state.engine, &req.message).await)
}

/// Run the pipeline, turning any failure into the apology body.
async fn answer(engine: &RagEngine, message: &str) -> ChatResponse {
    match engine.ask(message).await {
        Ok(response) => {
            info!("Response generated: {}", response.preview(100));
            ChatResponse::answered(response.answer, &response.model)
        }
        Err(e) => {
            error!("Failed to answer question: {}", e);
            ChatResponse::apology()
        }
    }
}
