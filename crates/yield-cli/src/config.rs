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

//! Common configuration options for commands in the yield CLI.

use alloy::primitives::Address;
use clap::Args;
use staking_yield::{
    AprConfig, HttpChainRpc, DEFAULT_RPC_URL, DEFAULT_STAKING_ADDRESS, EPOCH_BLOCK_INTERVAL,
};
use tracing::level_filters::LevelFilter;
use url::Url;

/// Common configuration options for all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalConfig {
    /// URL of the chain RPC endpoint
    #[clap(short, long, env = "RPC_URL", global = true, default_value = DEFAULT_RPC_URL)]
    pub rpc_url: Url,

    /// Staking contract holding the total stake
    #[clap(
        long,
        env = "STAKING_ADDRESS",
        global = true,
        default_value_t = DEFAULT_STAKING_ADDRESS
    )]
    pub staking_address: Address,

    /// Log level (error, warn, info, debug, trace)
    #[clap(long, env = "LOG_LEVEL", global = true, default_value = "info")]
    pub log_level: LevelFilter,
}

impl GlobalConfig {
    /// JSON-RPC client for [Self::rpc_url].
    pub fn chain_rpc(&self) -> HttpChainRpc {
        HttpChainRpc::new(self.rpc_url.clone())
    }
}

/// Epoch layout options shared by the commands that sample the chain.
#[derive(Args, Debug, Clone)]
pub struct EpochConfig {
    /// Epoch length in blocks
    #[clap(
        long,
        default_value_t = EPOCH_BLOCK_INTERVAL,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub epoch_length: u64,
}

impl EpochConfig {
    /// Calculation settings for sampling `sample_count` boundaries.
    pub fn apr_config(&self, global_config: &GlobalConfig, sample_count: usize) -> AprConfig {
        AprConfig {
            staking_address: global_config.staking_address,
            epoch_length: self.epoch_length,
            sample_count,
        }
    }
}
