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

use alloy::primitives::U256;
use serde_json::json;
use staking_yield::{
    calculate_apr, fetch_epoch_record,
    rpc::{ETH_BLOCK_NUMBER, ETH_CALL, PRIVILEGED_RECEIPTS_BY_HASH},
    AprConfig, AprOutcome, EpochRecord,
};
use tracing_test::traced_test;
use yield_test_utils::{
    epoch_finalised_log, epoch_moved_log, receipt, tokens, MockChainRpc,
};

fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!((actual - expected).abs() <= tolerance, "expected {expected} ± {tolerance}, got {actual}");
}

#[tokio::test]
#[traced_test]
async fn test_two_epoch_calculation() {
    let rpc = MockChainRpc::new()
        .with_block_number(6500)
        .with_total_staked(tokens(1000))
        .with_epoch(5999, 2, tokens(100), 2000)
        .with_epoch(2999, 1, tokens(80), 1000);

    let AprOutcome::Calculated(calculation) =
        calculate_apr(&rpc, &AprConfig::default()).await.unwrap()
    else {
        panic!("expected a calculation");
    };

    assert_eq!(calculation.current_block, 6500);
    assert_eq!(calculation.total_staked_tokens(), 1000.0);
    assert_eq!(calculation.epoch_blocks, vec![5999, 2999]);
    assert_eq!(calculation.averages.average_rewards, 90.0);
    assert_eq!(calculation.averages.average_epoch_duration, 1000.0);
    assert_eq!(calculation.averages.valid_epochs, 2);
    assert_close(calculation.metrics.epochs_per_year, 31_557.6, 1e-9);
    assert_close(calculation.metrics.annualized_rewards, 2_840_184.0, 1e-6);
    assert_close(calculation.metrics.apr, 284_018.4, 1e-6);
    assert!(logs_contain("Computed APR"));
}

#[tokio::test]
async fn test_genesis_has_no_epoch_blocks() {
    let rpc = MockChainRpc::new().with_block_number(0).with_total_staked(tokens(1000));

    let outcome = calculate_apr(&rpc, &AprConfig::default()).await.unwrap();
    assert!(matches!(outcome, AprOutcome::NoEpochBlocks { current_block: 0 }));
}

#[tokio::test]
async fn test_block_number_failure_is_fatal() {
    let rpc = MockChainRpc::new().fail_any(ETH_BLOCK_NUMBER, "connection refused");

    let err = calculate_apr(&rpc, &AprConfig::default()).await.unwrap_err();
    assert!(err.to_string().contains("connection refused"), "{err}");
}

#[tokio::test]
#[traced_test]
async fn test_total_staked_failure_reads_as_zero() {
    let rpc = MockChainRpc::new()
        .with_block_number(6500)
        .fail_any(ETH_CALL, "execution reverted")
        .with_epoch(5999, 2, tokens(100), 2000)
        .with_epoch(2999, 1, tokens(80), 1000);

    let AprOutcome::Calculated(calculation) =
        calculate_apr(&rpc, &AprConfig::default()).await.unwrap()
    else {
        panic!("expected a calculation");
    };

    assert_eq!(calculation.total_staked, U256::ZERO);
    // Averages are still computed, the rates are not.
    assert_eq!(calculation.averages.average_rewards, 90.0);
    assert_eq!(calculation.metrics.apr, 0.0);
    assert_eq!(calculation.metrics.apy, 0.0);
    assert!(logs_contain("assuming zero"));
}

#[tokio::test]
#[traced_test]
async fn test_failed_epoch_is_left_out() {
    // Block 5999 has no scripted receipts and no block hash to fall back on.
    let rpc = MockChainRpc::new()
        .with_block_number(9000)
        .with_total_staked(tokens(1000))
        .with_epoch(8999, 3, tokens(120), 3000)
        .with_epoch(2999, 1, tokens(60), 1000);

    let AprOutcome::Calculated(calculation) =
        calculate_apr(&rpc, &AprConfig::default()).await.unwrap()
    else {
        panic!("expected a calculation");
    };

    assert_eq!(calculation.epoch_blocks, vec![8999, 5999, 2999]);
    assert_eq!(calculation.averages.total_epochs, 3);
    assert_eq!(calculation.averages.valid_epochs, 2);
    let valid: Vec<bool> = calculation.records.iter().map(EpochRecord::is_valid).collect();
    assert_eq!(valid, vec![true, false, true]);
    assert_eq!(calculation.averages.average_rewards, 90.0);
    // Durations only pair adjacent valid records.
    assert_eq!(calculation.averages.average_epoch_duration, 2000.0);
    assert!(logs_contain("Failed to fetch receipts for epoch block 5999"));
}

#[tokio::test]
async fn test_sample_count_limits_queries() {
    let rpc = MockChainRpc::new()
        .with_block_number(30_000)
        .with_total_staked(tokens(1000))
        .with_epoch(29_999, 10, tokens(10), 10_000)
        .with_epoch(26_999, 9, tokens(10), 9_000);
    let config = AprConfig { sample_count: 2, ..AprConfig::default() };

    let AprOutcome::Calculated(calculation) = calculate_apr(&rpc, &config).await.unwrap() else {
        panic!("expected a calculation");
    };
    assert_eq!(calculation.epoch_blocks, vec![29_999, 26_999]);
    assert_eq!(calculation.averages.valid_epochs, 2);
}

#[tokio::test]
async fn test_receipts_by_hash_fallback() {
    let hash = format!("0x{}", "11".repeat(32));
    let rpc = MockChainRpc::new().with_receipts_by_hash(
        5999,
        &hash,
        json!([receipt(vec![epoch_moved_log(2, 2000), epoch_finalised_log(tokens(100), 2000)])]),
    );

    let record = fetch_epoch_record(&rpc, 5999).await;
    assert!(record.is_valid());
    assert_eq!(record.epoch_finalised.unwrap().total_rewards, tokens(100));
    assert_eq!(rpc.call_count(PRIVILEGED_RECEIPTS_BY_HASH), 1);
}

#[tokio::test]
async fn test_short_event_data_invalidates_record() {
    let rpc = MockChainRpc::new().with_receipts(
        5999,
        json!([receipt(vec![
            epoch_moved_log(2, 2000),
            json!({ "topics": [staking_yield::EPOCH_FINALISED_SIGNATURE], "data": "0x01" }),
        ])]),
    );

    let record = fetch_epoch_record(&rpc, 5999).await;
    assert!(!record.is_valid());
    assert_eq!(record.epoch_moved, None);
}
