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
use chrono::DateTime;
use clap::Args;
use staking_yield::fetch_epoch_record;

use crate::{config::GlobalConfig, utils::format_somi};

/// Command to decode the epoch events of a single block.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct EpochCommand {
    /// Block to decode, normally an epoch boundary
    pub block: u64,
}

impl EpochCommand {
    /// Run the [EpochCommand] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        let record = fetch_epoch_record(&global_config.chain_rpc(), self.block).await;

        match record.epoch_moved {
            Some(moved) => tracing::info!(
                "Epoch moved: epoch {} at {}",
                moved.epoch,
                format_timestamp(moved.timestamp)
            ),
            None => tracing::info!("Epoch moved: not found"),
        }
        match record.epoch_finalised {
            Some(finalised) => tracing::info!(
                "Epoch finalised: {} rewards at {}",
                format_somi(finalised.total_rewards),
                format_timestamp(finalised.timestamp)
            ),
            None => tracing::info!("Epoch finalised: not found"),
        }

        if record.is_valid() {
            tracing::info!("Block {} is a complete epoch boundary", self.block);
        } else {
            tracing::warn!("Block {} is missing epoch events", self.block);
        }
        Ok(())
    }
}

fn format_timestamp(timestamp: U256) -> String {
    u64::try_from(timestamp)
        .ok()
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
