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

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use staking_yield::{AprCalculation, REPORTED_EPOCH_BLOCKS};
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Successful APR calculation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AprCalculationResponse {
    /// Always true
    pub success: bool,
    pub data: AprCalculationData,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AprCalculationData {
    /// Chain height the calculation started from
    pub current_block: u64,

    pub total_staked: TotalStaked,

    /// Most recent sampled epoch boundary blocks, newest first
    pub epoch_blocks: Vec<u64>,

    pub averages: AprAverages,

    pub yields: AprYields,

    /// Time of the calculation (RFC 3339)
    pub calculated_at: String,

    /// Server time when the response was built, in milliseconds since the Unix epoch
    pub server_time: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TotalStaked {
    /// Total stake in wei, as a decimal string
    pub wei: String,

    /// Total stake in whole tokens
    pub eth: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AprAverages {
    /// Mean rewards per valid epoch, in tokens
    pub average_rewards: f64,

    /// Mean time between valid epoch boundaries, in seconds
    pub average_epoch_duration: f64,

    /// Number of sampled epoch boundaries
    pub total_epochs: usize,

    /// Number of sampled boundaries carrying both epoch events
    pub valid_epochs: usize,

    /// Rewards projected over a year, in tokens
    pub annualized_rewards: f64,

    pub epochs_per_year: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AprYields {
    /// Annual percentage rate
    pub apr: f64,

    /// Annual percentage yield with per-epoch compounding. Null when it overflows.
    #[schema(nullable)]
    pub apy: f64,

    pub reward_rate_per_epoch: f64,
}

/// No epoch boundary exists at or below the current block
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoEpochBlocksResponse {
    pub error: String,
    pub current_block: u64,
}

/// The calculation failed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl AprCalculationResponse {
    pub fn new(calculation: &AprCalculation, server_time: i64) -> Self {
        let metrics = &calculation.metrics;
        let averages = &calculation.averages;

        Self {
            success: true,
            data: AprCalculationData {
                current_block: calculation.current_block,
                total_staked: TotalStaked {
                    wei: calculation.total_staked.to_string(),
                    eth: calculation.total_staked_tokens(),
                },
                epoch_blocks: calculation
                    .epoch_blocks
                    .iter()
                    .take(REPORTED_EPOCH_BLOCKS)
                    .copied()
                    .collect(),
                averages: AprAverages {
                    average_rewards: averages.average_rewards,
                    average_epoch_duration: averages.average_epoch_duration,
                    total_epochs: averages.total_epochs,
                    valid_epochs: averages.valid_epochs,
                    annualized_rewards: metrics.annualized_rewards,
                    epochs_per_year: metrics.epochs_per_year,
                },
                yields: AprYields {
                    apr: metrics.apr,
                    apy: metrics.apy,
                    reward_rate_per_epoch: metrics.reward_rate_per_epoch,
                },
                calculated_at: calculation
                    .calculated_at
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
                server_time,
            },
        }
    }
}
