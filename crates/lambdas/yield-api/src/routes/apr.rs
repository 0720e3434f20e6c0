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

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use staking_yield::{calculate_apr, AprOutcome};
use std::sync::Arc;

use crate::{
    config::AppState,
    handler::handle_error,
    models::{AprCalculationResponse, ErrorResponse, NoEpochBlocksResponse},
};

/// Every APR response is computed fresh and must not be cached downstream.
pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// Create APR routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/apr-calculation", get(get_apr_calculation))
}

/// GET /api/apr-calculation
/// Samples the most recent epoch boundaries and returns the derived APR and APY
#[utoipa::path(
    get,
    path = "/api/apr-calculation",
    tag = "APR",
    responses(
        (status = 200, description = "Yield figures from the sampled epochs", body = AprCalculationResponse),
        (status = 404, description = "No epoch boundary exists yet", body = NoEpochBlocksResponse),
        (status = 500, description = "The calculation failed", body = ErrorResponse)
    )
)]
async fn get_apr_calculation(State(state): State<Arc<AppState>>) -> Response {
    let mut res = match get_apr_calculation_impl(state).await {
        Ok(AprOutcome::Calculated(calculation)) => {
            Json(AprCalculationResponse::new(&calculation, Utc::now().timestamp_millis()))
                .into_response()
        }
        Ok(AprOutcome::NoEpochBlocks { current_block }) => (
            StatusCode::NOT_FOUND,
            Json(NoEpochBlocksResponse { error: "No epoch blocks found".into(), current_block }),
        )
            .into_response(),
        Err(err) => handle_error(err).into_response(),
    };
    res.headers_mut().insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    res
}

async fn get_apr_calculation_impl(state: Arc<AppState>) -> anyhow::Result<AprOutcome> {
    tracing::debug!("Calculating APR with epoch length {}", state.config.epoch_length);

    Ok(calculate_apr(state.rpc.as_ref(), &state.config).await?)
}
