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
use staking_yield::{rpc, sample_epoch_boundaries, EPOCH_SAMPLE_COUNT};

use crate::config::{EpochConfig, GlobalConfig};

/// Command to list the most recent epoch boundary blocks.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct BoundariesCommand {
    /// Block to sample back from. Defaults to the current chain height.
    #[clap(long)]
    pub current_block: Option<u64>,

    /// Maximum number of boundaries to list
    #[clap(long, default_value_t = EPOCH_SAMPLE_COUNT)]
    pub count: usize,

    #[clap(flatten)]
    pub epochs: EpochConfig,
}

impl BoundariesCommand {
    /// Run the [BoundariesCommand] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        let current_block = match self.current_block {
            Some(block) => block,
            None => rpc::block_number(&global_config.chain_rpc())
                .await
                .with_context(|| format!("failed to query {}", global_config.rpc_url))?,
        };

        let blocks = sample_epoch_boundaries(current_block, self.epochs.epoch_length, self.count);
        if blocks.is_empty() {
            tracing::info!("No epoch boundaries at or before block {current_block}");
            return Ok(());
        }

        tracing::info!("{} epoch boundaries at or before block {current_block}:", blocks.len());
        for block in blocks {
            tracing::info!("  {block}");
        }
        Ok(())
    }
}
