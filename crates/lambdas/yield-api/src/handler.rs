// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Result;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::{AppState, ServiceConfig};
use crate::models::{ErrorResponse, HealthResponse};
use crate::openapi::ApiDoc;
use crate::routes::apr;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn create_handler() -> Result<Router> {
    // Load configuration from environment
    let config = ServiceConfig::from_env()?;
    tracing::info!("Using RPC endpoint {}", config.rpc_url);

    // Create application state with the chain client
    let state = Arc::new(AppState::from_config(config));

    // Create the axum application with routes
    Ok(create_app(state))
}

pub fn create_app(state: Arc<AppState>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    // Build the router
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // OpenAPI document (YAML format)
        .route("/openapi.yaml", get(openapi_yaml))
        // Swagger UI, which also serves /openapi.json
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .nest("/api", apr::routes().with_state(state))
        // Add CORS layer
        .layer(cors)
        // Add fallback for unmatched routes
        .fallback(not_found)
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy".into(), service: "yield-api".into() })
}

async fn openapi_yaml() -> impl IntoResponse {
    // Convert the generated JSON document to YAML
    match serde_yaml::to_string(&ApiDoc::openapi()) {
        Ok(yaml) => (StatusCode::OK, [(header::CONTENT_TYPE, "application/x-yaml")], yaml),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("Failed to convert to YAML: {}", err),
        ),
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": "The requested endpoint does not exist"
        })),
    )
}

/// Turn a failed calculation into a 500 response carrying the error message.
pub fn handle_error(err: anyhow::Error) -> impl IntoResponse {
    // Log the full error chain for debugging
    tracing::error!("Request failed: {:?}", err);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: "Failed to calculate APR".into(), message: err.to_string() }),
    )
}
