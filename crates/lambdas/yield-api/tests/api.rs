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

//! Router tests for the APR service, backed by a scripted chain node.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use staking_yield::{client::AprResponse, rpc::ETH_BLOCK_NUMBER, AprConfig};
use tower::ServiceExt;
use yield_api::{config::AppState, handler::create_app, models::HealthResponse};
use yield_test_utils::{tokens, MockChainRpc};

const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

fn app(rpc: MockChainRpc) -> Router {
    create_app(Arc::new(AppState::new(Arc::new(rpc), AprConfig::default())))
}

fn two_epoch_chain() -> MockChainRpc {
    MockChainRpc::new()
        .with_block_number(6500)
        .with_total_staked(tokens(1000))
        .with_epoch(5999, 2, tokens(100), 2000)
        .with_epoch(2999, 1, tokens(80), 1000)
}

async fn get(app: Router, uri: &str) -> (StatusCode, header::HeaderMap, Vec<u8>) {
    let response =
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, header::HeaderMap, Value) {
    let (status, headers, body) = get(app, uri).await;
    (status, headers, serde_json::from_slice(&body).unwrap())
}

fn assert_close(actual: &Value, expected: f64, tolerance: f64) {
    let actual = actual.as_f64().unwrap();
    assert!((actual - expected).abs() <= tolerance, "expected {expected} ± {tolerance}, got {actual}");
}

#[test_log::test(tokio::test)]
async fn test_apr_calculation() {
    let (status, headers, body) = get_json(app(two_epoch_chain()), "/api/apr-calculation").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CACHE_CONTROL], NO_CACHE);
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert_eq!(data["currentBlock"], 6500);
    assert_eq!(data["totalStaked"]["wei"], "1000000000000000000000");
    assert_eq!(data["totalStaked"]["eth"], 1000.0);
    assert_eq!(data["epochBlocks"], serde_json::json!([5999, 2999]));

    let averages = &data["averages"];
    assert_eq!(averages["averageRewards"], 90.0);
    assert_eq!(averages["averageEpochDuration"], 1000.0);
    assert_eq!(averages["totalEpochs"], 2);
    assert_eq!(averages["validEpochs"], 2);
    assert_close(&averages["epochsPerYear"], 31_557.6, 1e-9);
    assert_close(&averages["annualizedRewards"], 2_840_184.0, 1e-6);

    let yields = &data["yields"];
    assert_close(&yields["apr"], 284_018.4, 1e-6);
    assert_close(&yields["rewardRatePerEpoch"], 0.09, 1e-12);
    // 1.09 compounded 31557 times overflows.
    assert_eq!(yields["apy"], Value::Null);

    assert!(data["calculatedAt"].as_str().unwrap().ends_with('Z'));
    assert!(data["serverTime"].as_i64().unwrap() > 0);
}

#[test_log::test(tokio::test)]
async fn test_response_is_readable_by_yield_client() {
    let (_, _, body) = get(app(two_epoch_chain()), "/api/apr-calculation").await;

    let response: AprResponse = serde_json::from_slice(&body).unwrap();
    assert!(response.success);
    let data = response.data.unwrap();
    assert_eq!(data.current_block, Some(6500));
    assert!(data.averages.is_some());
    let yields = data.yields.unwrap();
    assert!((yields.apr - 284_018.4).abs() < 1e-6);
    assert!(yields.apy.is_infinite());
}

#[test_log::test(tokio::test)]
async fn test_query_string_is_ignored() {
    let (status, _, body) =
        get_json(app(two_epoch_chain()), "/api/apr-calculation?t=1700000000000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentBlock"], 6500);
}

#[test_log::test(tokio::test)]
async fn test_no_epoch_blocks() {
    let rpc = MockChainRpc::new().with_block_number(0).with_total_staked(tokens(1000));

    let (status, headers, body) = get_json(app(rpc), "/api/apr-calculation").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(headers[header::CACHE_CONTROL], NO_CACHE);
    assert_eq!(body, serde_json::json!({ "error": "No epoch blocks found", "currentBlock": 0 }));
}

#[test_log::test(tokio::test)]
async fn test_unreachable_node() {
    let rpc = MockChainRpc::new().fail_any(ETH_BLOCK_NUMBER, "connection refused");

    let (status, headers, body) = get_json(app(rpc), "/api/apr-calculation").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers[header::CACHE_CONTROL], NO_CACHE);
    assert_eq!(body["error"], "Failed to calculate APR");
    assert!(body["message"].as_str().unwrap().contains("connection refused"), "{body}");
}

#[test_log::test(tokio::test)]
async fn test_epoch_blocks_are_truncated() {
    // No receipts are scripted, so every sampled epoch is incomplete.
    let rpc = MockChainRpc::new().with_block_number(60_000).with_total_staked(tokens(1000));

    let (status, _, body) = get_json(app(rpc.clone()), "/api/apr-calculation").await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    let blocks: Vec<u64> = serde_json::from_value(data["epochBlocks"].clone()).unwrap();
    assert_eq!(blocks, (0..10).map(|i| 59_999 - i * 3000).collect::<Vec<_>>());
    assert_eq!(data["averages"]["totalEpochs"], 20);
    assert_eq!(data["averages"]["validEpochs"], 0);
    assert_eq!(data["yields"]["apr"], 0.0);
    assert_eq!(data["yields"]["apy"], 0.0);
}

#[test_log::test(tokio::test)]
async fn test_health_endpoint() {
    let (status, _, body) = get(app(MockChainRpc::new()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let response: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.status, "healthy");
    assert_eq!(response.service, "yield-api");
}

#[test_log::test(tokio::test)]
async fn test_openapi_yaml_endpoint() {
    let (status, headers, body) = get(app(MockChainRpc::new()), "/openapi.yaml").await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().contains("yaml"));
    let body = String::from_utf8(body).unwrap();
    assert!(body.contains("openapi:"));
    assert!(body.contains("Staking Yield API"));
}

#[test_log::test(tokio::test)]
async fn test_openapi_json_endpoint() {
    let (status, _, body) = get_json(app(MockChainRpc::new()), "/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    let paths = body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/health"));
    assert!(paths.contains_key("/api/apr-calculation"));
    assert!(body["components"]["schemas"].get("AprCalculationResponse").is_some());
}

#[test_log::test(tokio::test)]
async fn test_unknown_route() {
    let (status, _, body) = get_json(app(MockChainRpc::new()), "/v1/staking").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}
