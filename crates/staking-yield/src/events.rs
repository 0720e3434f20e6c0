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

//! Epoch event decoding and per-block receipt fetching.

use alloy::primitives::{Bytes, B256, U256};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    rpc::{self, ChainRpc, RpcError},
    EPOCH_FINALISED_SIGNATURE, EPOCH_MOVED_SIGNATURE,
};

/// Width of one ABI word in the event data
const WORD: usize = 32;

/// A privileged transaction receipt. Only the logs are of interest here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrivilegedReceipt {
    #[serde(default)]
    pub logs: Vec<ReceiptLog>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptLog {
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
}

/// Payload of the epoch-advanced event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochMoved {
    pub epoch: U256,
    pub timestamp: U256,
}

/// Payload of the epoch-finalised event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochFinalised {
    pub total_rewards: U256,
    pub timestamp: U256,
}

/// Epoch events found in one block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpochEvents {
    pub epoch_moved: Option<EpochMoved>,
    pub epoch_finalised: Option<EpochFinalised>,
}

/// One sampled epoch boundary block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochRecord {
    pub block_number: u64,
    pub epoch_moved: Option<EpochMoved>,
    pub epoch_finalised: Option<EpochFinalised>,
}

impl EpochRecord {
    /// A record for a block whose events could not be obtained.
    pub fn incomplete(block_number: u64) -> Self {
        Self { block_number, epoch_moved: None, epoch_finalised: None }
    }

    pub fn from_events(block_number: u64, events: EpochEvents) -> Self {
        Self {
            block_number,
            epoch_moved: events.epoch_moved,
            epoch_finalised: events.epoch_finalised,
        }
    }

    /// Both events were observed, so the record takes part in aggregation.
    pub fn is_valid(&self) -> bool {
        self.epoch_moved.is_some() && self.epoch_finalised.is_some()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("event {topic} carries {len} data bytes, expected at least {expected}")]
    ShortData { topic: B256, len: usize, expected: usize },
}

/// Read the two leading 32-byte words of an event's data.
fn decode_words(topic: B256, data: &[u8]) -> Result<(U256, U256), DecodeError> {
    if data.len() < 2 * WORD {
        return Err(DecodeError::ShortData { topic, len: data.len(), expected: 2 * WORD });
    }
    Ok((U256::from_be_slice(&data[..WORD]), U256::from_be_slice(&data[WORD..2 * WORD])))
}

/// Extract the epoch events from the receipts of a single block.
///
/// When an event appears more than once, the last one in receipt/log order wins.
pub fn decode_epoch_events(receipts: &[PrivilegedReceipt]) -> Result<EpochEvents, DecodeError> {
    let mut events = EpochEvents::default();
    for log in receipts.iter().flat_map(|receipt| &receipt.logs) {
        let Some(&topic) = log.topics.first() else {
            continue;
        };
        if topic == EPOCH_MOVED_SIGNATURE {
            let (epoch, timestamp) = decode_words(topic, &log.data)?;
            events.epoch_moved = Some(EpochMoved { epoch, timestamp });
        } else if topic == EPOCH_FINALISED_SIGNATURE {
            let (total_rewards, timestamp) = decode_words(topic, &log.data)?;
            events.epoch_finalised = Some(EpochFinalised { total_rewards, timestamp });
        }
    }
    Ok(events)
}

/// Receipts for a block, looked up by number first and by hash as a fallback.
async fn fetch_block_receipts<R: ChainRpc + ?Sized>(
    rpc: &R,
    block_number: u64,
) -> Result<Vec<PrivilegedReceipt>, RpcError> {
    match rpc::privileged_receipts_by_number(rpc, block_number).await {
        Ok(receipts) => Ok(receipts),
        Err(err) => {
            tracing::debug!(
                "Receipts by number failed for block {block_number}, trying by hash: {err}"
            );
            match rpc::block_hash(rpc, block_number).await? {
                Some(hash) => rpc::privileged_receipts_by_hash(rpc, hash).await,
                None => Err(err),
            }
        }
    }
}

/// Fetch and decode the epoch events of one boundary block.
///
/// This never fails. Any RPC or decoding error yields a record with both events absent.
pub async fn fetch_epoch_record<R: ChainRpc + ?Sized>(rpc: &R, block_number: u64) -> EpochRecord {
    let receipts = match fetch_block_receipts(rpc, block_number).await {
        Ok(receipts) => receipts,
        Err(err) => {
            tracing::warn!("Failed to fetch receipts for epoch block {block_number}: {err}");
            return EpochRecord::incomplete(block_number);
        }
    };

    match decode_epoch_events(&receipts) {
        Ok(events) => {
            let record = EpochRecord::from_events(block_number, events);
            if !record.is_valid() {
                tracing::debug!("Epoch block {block_number} is missing epoch events");
            }
            record
        }
        Err(err) => {
            tracing::warn!("Failed to decode epoch events in block {block_number}: {err}");
            EpochRecord::incomplete(block_number)
        }
    }
}

/// Fetch the epoch records of all `blocks` concurrently, preserving their order.
///
/// All fetches run to completion: there is no cancellation, and a failing block only affects
/// its own record.
pub async fn fetch_epoch_records<R: ChainRpc + ?Sized>(
    rpc: &R,
    blocks: &[u64],
) -> Vec<EpochRecord> {
    tracing::debug!("Fetching epoch events for {} boundary blocks", blocks.len());
    join_all(blocks.iter().map(|&block_number| fetch_epoch_record(rpc, block_number))).await
}
