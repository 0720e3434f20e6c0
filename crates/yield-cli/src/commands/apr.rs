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

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use staking_yield::{
    burn_rate, calculate_apr, real_yield, AprCalculation, AprOutcome, EPOCH_SAMPLE_COUNT,
};

use crate::{
    config::{EpochConfig, GlobalConfig},
    utils::{format_percent, format_somi},
};

/// Command to calculate the current staking APR and APY.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct AprCommand {
    /// Number of epoch boundaries to sample
    #[clap(long, default_value_t = EPOCH_SAMPLE_COUNT)]
    pub sample_count: usize,

    #[clap(flatten)]
    pub epochs: EpochConfig,

    /// Print the result as JSON
    #[clap(long)]
    pub json: bool,
}

/// Machine-readable result of [AprCommand].
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AprSummary {
    current_block: u64,
    total_staked_wei: String,
    total_staked: f64,
    epoch_blocks: usize,
    valid_epochs: usize,
    average_rewards: f64,
    average_epoch_duration: f64,
    epochs_per_year: f64,
    annualized_rewards: f64,
    apr: f64,
    apy: f64,
    reward_rate_per_epoch: f64,
    burn_rate: f64,
    real_yield: f64,
    calculated_at: String,
}

impl AprSummary {
    fn new(calculation: &AprCalculation) -> Self {
        let metrics = &calculation.metrics;
        let burn = burn_rate(metrics.annualized_rewards);
        Self {
            current_block: calculation.current_block,
            total_staked_wei: calculation.total_staked.to_string(),
            total_staked: calculation.total_staked_tokens(),
            epoch_blocks: calculation.epoch_blocks.len(),
            valid_epochs: calculation.averages.valid_epochs,
            average_rewards: calculation.averages.average_rewards,
            average_epoch_duration: calculation.averages.average_epoch_duration,
            epochs_per_year: metrics.epochs_per_year,
            annualized_rewards: metrics.annualized_rewards,
            apr: metrics.apr,
            apy: metrics.apy,
            reward_rate_per_epoch: metrics.reward_rate_per_epoch,
            burn_rate: burn,
            real_yield: real_yield(burn, metrics.apy),
            calculated_at: calculation.calculated_at.to_rfc3339(),
        }
    }
}

impl AprCommand {
    /// Run the [AprCommand] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        let rpc = global_config.chain_rpc();
        let config = self.epochs.apr_config(global_config, self.sample_count);

        let outcome = calculate_apr(&rpc, &config)
            .await
            .with_context(|| format!("failed to calculate APR using {}", global_config.rpc_url))?;
        let calculation = match outcome {
            AprOutcome::Calculated(calculation) => calculation,
            AprOutcome::NoEpochBlocks { current_block } => {
                anyhow::bail!("No epoch blocks found at or before block {current_block}")
            }
        };

        let summary = AprSummary::new(&calculation);
        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        tracing::info!("Current block: {}", summary.current_block);
        tracing::info!("Total staked: {}", format_somi(calculation.total_staked));
        tracing::info!(
            "Valid epochs: {} of {} sampled",
            summary.valid_epochs,
            summary.epoch_blocks
        );
        tracing::info!("Average rewards per epoch: {:.4} SOMI", summary.average_rewards);
        tracing::info!("Average epoch duration: {} s", summary.average_epoch_duration);
        tracing::info!("APR: {}", format_percent(summary.apr));
        tracing::info!("APY: {}", format_percent(summary.apy));
        tracing::info!("Burn rate: {}", format_percent(summary.burn_rate));
        tracing::info!("Real yield: {}", format_percent(summary.real_yield));

        Ok(())
    }
}
