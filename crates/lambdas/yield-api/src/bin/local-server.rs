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

use anyhow::{Context, Result};
use std::{env, net::SocketAddr, sync::Arc};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use yield_api::config::{AppState, ServiceConfig};
use yield_api::handler::create_app;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration from environment or use defaults
    let config = ServiceConfig::from_env().context("Failed to load configuration")?;
    let port = env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()).unwrap_or(3000);

    tracing::info!("Starting local yield-api server");
    tracing::info!("RPC URL: {}", config.rpc_url);
    tracing::info!("Staking address: {}", config.apr.staking_address);
    tracing::info!("Port: {}", port);

    // Create application state with the chain client
    let state = Arc::new(AppState::from_config(config));

    // Create the axum application with routes
    let app = create_app(state);

    // Create the server address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    tracing::info!("Server listening on http://{}", addr);

    // Create the listener
    let listener =
        tokio::net::TcpListener::bind(addr).await.context("Failed to bind to address")?;

    // Run the server
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
