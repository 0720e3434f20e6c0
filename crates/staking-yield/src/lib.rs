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

//! Staking yield computation: samples recent epoch boundaries, decodes the epoch events emitted
//! in those blocks and derives APR, APY, burn rate and real yield from them.

// Declare modules
pub mod apr;
pub mod cache;
pub mod client;
pub mod events;
pub mod rpc;
pub mod sampler;
pub mod yields;

// Re-export commonly used types
pub use apr::{calculate_apr, AprCalculation, AprConfig, AprOutcome};

pub use cache::{CacheEntry, CacheStore, Clock, FileStore, MemoryStore, SystemClock, YieldCache};

pub use client::{HttpYieldSource, YieldClient, YieldSnapshot, YieldSource};

pub use events::{
    decode_epoch_events, fetch_epoch_record, fetch_epoch_records, EpochEvents, EpochFinalised,
    EpochMoved, EpochRecord, PrivilegedReceipt, ReceiptLog,
};

pub use rpc::{ChainRpc, HttpChainRpc, RpcError};

pub use sampler::sample_epoch_boundaries;

pub use yields::{
    burn_rate, calculate_averages, compute_yield_metrics, real_yield, wei_to_tokens,
    EpochAverages, YieldMetrics, YieldRates,
};

use alloy::primitives::{address, b256, Address, B256};

/// Number of blocks in one epoch. The last block of an epoch satisfies
/// `block % EPOCH_BLOCK_INTERVAL == EPOCH_BLOCK_INTERVAL - 1`.
pub const EPOCH_BLOCK_INTERVAL: u64 = 3000;
/// Number of epoch boundaries sampled for the trailing averages
pub const EPOCH_SAMPLE_COUNT: usize = 100;
/// Number of sampled boundary blocks reported back to API consumers
pub const REPORTED_EPOCH_BLOCKS: usize = 10;

/// Topic of the event emitted when the chain advances to a new epoch: `(epoch, timestamp)`
pub const EPOCH_MOVED_SIGNATURE: B256 =
    b256!("6debf9c0b8bd7ecda40db89a2641f61251d80a576b5c5e5f06de7f1c2a65850a");
/// Topic of the event emitted when an epoch's rewards are finalised: `(totalRewards, timestamp)`
pub const EPOCH_FINALISED_SIGNATURE: B256 =
    b256!("2afb4df8a72287c619edfbbe7cb22d0fe5fa86bcaa5e9d249c264c4d9b97cd49");

/// Chain RPC endpoint used when none is configured
pub const DEFAULT_RPC_URL: &str = "https://dream-rpc.somnia.network";

/// Default staking contract queried for the total staked amount
pub const DEFAULT_STAKING_ADDRESS: Address = address!("be367d410d96e1caef68c0632251072cdf1b8250");
/// Selector of the staking contract's no-argument total-staked accessor
pub const TOTAL_STAKED_SELECTOR: &str = "0x817b1cd2";

/// Total token supply, in whole tokens
pub const TOTAL_SUPPLY: f64 = 1_000_000_000.0;
/// Seconds in a Julian year
pub const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0;
