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

//! End-to-end APR calculation against a chain node.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};

use crate::{
    events::{fetch_epoch_records, EpochRecord},
    rpc::{self, ChainRpc, RpcError},
    sampler::sample_epoch_boundaries,
    yields::{calculate_averages, compute_yield_metrics, wei_to_tokens, EpochAverages, YieldMetrics},
    DEFAULT_STAKING_ADDRESS, EPOCH_BLOCK_INTERVAL, EPOCH_SAMPLE_COUNT,
};

#[derive(Debug, Clone)]
pub struct AprConfig {
    /// Staking contract holding the total stake
    pub staking_address: Address,
    /// Epoch length in blocks
    pub epoch_length: u64,
    /// Number of epoch boundaries to sample
    pub sample_count: usize,
}

impl Default for AprConfig {
    fn default() -> Self {
        Self {
            staking_address: DEFAULT_STAKING_ADDRESS,
            epoch_length: EPOCH_BLOCK_INTERVAL,
            sample_count: EPOCH_SAMPLE_COUNT,
        }
    }
}

/// Result of one calculation cycle
#[derive(Debug, Clone)]
pub struct AprCalculation {
    pub current_block: u64,
    /// Total stake, in wei
    pub total_staked: U256,
    /// Sampled boundary blocks, newest first
    pub epoch_blocks: Vec<u64>,
    pub records: Vec<EpochRecord>,
    pub averages: EpochAverages,
    pub metrics: YieldMetrics,
    pub calculated_at: DateTime<Utc>,
}

impl AprCalculation {
    /// Total stake, in whole tokens
    pub fn total_staked_tokens(&self) -> f64 {
        wei_to_tokens(self.total_staked)
    }
}

#[derive(Debug, Clone)]
pub enum AprOutcome {
    /// The chain has not yet produced a single epoch boundary.
    NoEpochBlocks { current_block: u64 },
    Calculated(Box<AprCalculation>),
}

/// Sample the most recent epoch boundaries and compute the yield figures from their events.
///
/// Only a failure to read the chain height is fatal. The total stake falls back to zero, and
/// blocks whose events cannot be read are left out of the averages.
pub async fn calculate_apr<R: ChainRpc + ?Sized>(
    rpc: &R,
    config: &AprConfig,
) -> Result<AprOutcome, RpcError> {
    let current_block = rpc::block_number(rpc).await?;
    let total_staked = rpc::total_staked(rpc, config.staking_address).await;

    let epoch_blocks =
        sample_epoch_boundaries(current_block, config.epoch_length, config.sample_count);
    if epoch_blocks.is_empty() {
        tracing::warn!("No epoch boundaries at or before block {current_block}");
        return Ok(AprOutcome::NoEpochBlocks { current_block });
    }
    tracing::info!(
        "Sampling {} epoch boundaries ({}..={}) at block {current_block}",
        epoch_blocks.len(),
        epoch_blocks[epoch_blocks.len() - 1],
        epoch_blocks[0],
    );

    let records = fetch_epoch_records(rpc, &epoch_blocks).await;
    let averages = calculate_averages(&records);
    let metrics = compute_yield_metrics(total_staked, &averages);
    tracing::info!(
        "Computed APR {:.4}% / APY {:.4}% from {} of {} epochs",
        metrics.apr,
        metrics.apy,
        averages.valid_epochs,
        averages.total_epochs
    );

    Ok(AprOutcome::Calculated(Box::new(AprCalculation {
        current_block,
        total_staked,
        epoch_blocks,
        records,
        averages,
        metrics,
        calculated_at: Utc::now(),
    })))
}
