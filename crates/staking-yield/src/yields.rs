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

//! Trailing epoch averages and the annualized yield figures derived from them.

use alloy::primitives::{utils::format_units, U256};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{events::EpochRecord, SECONDS_PER_YEAR, TOTAL_SUPPLY};

/// Averages over the valid records of a sample
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpochAverages {
    /// Mean finalised rewards per epoch, in whole tokens
    pub average_rewards: f64,
    /// Mean time between consecutive epoch transitions, in seconds
    pub average_epoch_duration: f64,
    /// Number of sampled records, valid or not
    pub total_epochs: usize,
    /// Number of records carrying both epoch events
    pub valid_epochs: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct YieldMetrics {
    pub average_reward_per_epoch: f64,
    pub average_epoch_duration_seconds: f64,
    pub epochs_per_year: f64,
    pub annualized_rewards: f64,
    /// Simple annual rate, in percent
    pub apr: f64,
    /// Annual rate compounded once per epoch, in percent
    pub apy: f64,
    pub reward_rate_per_epoch: f64,
}

/// The yield rates handed to presentation code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldRates {
    pub apr: f64,
    #[serde(deserialize_with = "overflowed_rate")]
    pub apy: f64,
    pub reward_rate_per_epoch: f64,
}

impl From<&YieldMetrics> for YieldRates {
    fn from(metrics: &YieldMetrics) -> Self {
        Self {
            apr: metrics.apr,
            apy: metrics.apy,
            reward_rate_per_epoch: metrics.reward_rate_per_epoch,
        }
    }
}

/// Compounding can overflow `f64`. JSON has no infinity, so an overflowed rate travels as
/// `null` and is read back as infinity.
pub(crate) fn overflowed_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}

/// Convert a wei amount (18 decimals) to whole tokens.
pub fn wei_to_tokens(wei: U256) -> f64 {
    format_units(wei, "ether").ok().and_then(|tokens| tokens.parse().ok()).unwrap_or_default()
}

fn timestamp_seconds(timestamp: U256) -> i128 {
    u64::try_from(timestamp).map(i128::from).unwrap_or(i128::from(u64::MAX))
}

/// Average rewards and epoch duration over the valid records.
///
/// `records` must be ordered newest first. Durations are taken between adjacent valid records,
/// so at least two of them are needed for a non-zero duration. Both means use integer division,
/// as the on-chain values are integers.
pub fn calculate_averages(records: &[EpochRecord]) -> EpochAverages {
    let valid: Vec<(U256, i128)> = records
        .iter()
        .filter_map(|record| match (record.epoch_moved, record.epoch_finalised) {
            (Some(moved), Some(finalised)) => {
                Some((finalised.total_rewards, timestamp_seconds(moved.timestamp)))
            }
            _ => None,
        })
        .collect();

    let mut averages = EpochAverages {
        total_epochs: records.len(),
        valid_epochs: valid.len(),
        ..Default::default()
    };
    if valid.is_empty() {
        return averages;
    }

    let total_rewards =
        valid.iter().fold(U256::ZERO, |sum, (rewards, _)| sum.saturating_add(*rewards));
    averages.average_rewards = wei_to_tokens(total_rewards / U256::from(valid.len()));

    if valid.len() > 1 {
        let total_duration: i128 = valid.windows(2).map(|pair| pair[0].1 - pair[1].1).sum();
        averages.average_epoch_duration = (total_duration / (valid.len() as i128 - 1)) as f64;
    }

    averages
}

/// Derive the annualized yield figures from the sample averages and the total stake.
///
/// Every figure that would divide by a zero stake or a zero duration is reported as zero.
pub fn compute_yield_metrics(total_staked: U256, averages: &EpochAverages) -> YieldMetrics {
    let staked_tokens = wei_to_tokens(total_staked);
    let average_rewards = averages.average_rewards;
    let duration = averages.average_epoch_duration;

    let epochs_per_year = if duration > 0.0 { SECONDS_PER_YEAR / duration } else { 0.0 };
    let annualized_rewards = average_rewards * epochs_per_year;
    let apr = if staked_tokens > 0.0 { annualized_rewards / staked_tokens * 100.0 } else { 0.0 };

    let compounding_periods = epochs_per_year.floor();
    let reward_rate_per_epoch =
        if staked_tokens > 0.0 { average_rewards / staked_tokens } else { 0.0 };
    let apy = if compounding_periods > 0.0 && reward_rate_per_epoch > 0.0 {
        ((1.0 + reward_rate_per_epoch).powf(compounding_periods) - 1.0) * 100.0
    } else {
        0.0
    };

    YieldMetrics {
        average_reward_per_epoch: average_rewards,
        average_epoch_duration_seconds: duration,
        epochs_per_year,
        annualized_rewards,
        apr,
        apy,
        reward_rate_per_epoch,
    }
}

/// Annualized rewards as a percentage of the total token supply.
pub fn burn_rate(annualized_rewards: f64) -> f64 {
    annualized_rewards / TOTAL_SUPPLY * 100.0
}

pub fn real_yield(burn_rate: f64, apy: f64) -> f64 {
    burn_rate + apy
}
