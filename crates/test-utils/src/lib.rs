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

//! Test utilities for the staking yield crates.
//!
//! This crate provides a scripted [ChainRpc] implementation and builders for the receipts and
//! event logs the yield pipeline decodes.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use alloy::{
    primitives::{hex, U256},
    transports::TransportErrorKind,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use staking_yield::{
    rpc::{
        block_number_hex, ETH_BLOCK_NUMBER, ETH_CALL, ETH_GET_BLOCK_BY_NUMBER,
        PRIVILEGED_RECEIPTS_BY_HASH, PRIVILEGED_RECEIPTS_BY_NUMBER,
    },
    ChainRpc, RpcError, EPOCH_FINALISED_SIGNATURE, EPOCH_MOVED_SIGNATURE,
};

#[derive(Clone, Debug)]
enum MockResponse {
    Result(Value),
    Error(String),
}

#[derive(Default, Debug)]
struct MockState {
    /// Responses keyed by `"<method> <params>"`, or by method alone to match any params
    responses: HashMap<String, MockResponse>,
    calls: Vec<(String, Value)>,
}

/// A [ChainRpc] answering from scripted responses.
///
/// Calls without a scripted response fail like an unreachable node would. Clones share their
/// script and call log.
#[derive(Clone, Default, Debug)]
pub struct MockChainRpc {
    state: Arc<Mutex<MockState>>,
}

fn key(method: &str, params: &Value) -> String {
    format!("{method} {params}")
}

impl MockChainRpc {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(self, key: String, response: MockResponse) -> Self {
        self.state.lock().unwrap().responses.insert(key, response);
        self
    }

    /// Answer `method` called with exactly `params`.
    pub fn respond(self, method: &str, params: Value, result: Value) -> Self {
        self.script(key(method, &params), MockResponse::Result(result))
    }

    /// Answer `method` regardless of its params.
    pub fn respond_any(self, method: &str, result: Value) -> Self {
        self.script(method.to_string(), MockResponse::Result(result))
    }

    /// Fail `method` called with exactly `params`.
    pub fn fail(self, method: &str, params: Value, message: &str) -> Self {
        self.script(key(method, &params), MockResponse::Error(message.to_string()))
    }

    /// Fail `method` regardless of its params.
    pub fn fail_any(self, method: &str, message: &str) -> Self {
        self.script(method.to_string(), MockResponse::Error(message.to_string()))
    }

    pub fn with_block_number(self, block_number: u64) -> Self {
        self.respond_any(ETH_BLOCK_NUMBER, json!(block_number_hex(block_number)))
    }

    pub fn with_total_staked(self, wei: U256) -> Self {
        self.respond_any(ETH_CALL, json!(wei))
    }

    /// Serve `receipts` for the by-number receipts lookup of `block_number`.
    pub fn with_receipts(self, block_number: u64, receipts: Value) -> Self {
        self.respond(PRIVILEGED_RECEIPTS_BY_NUMBER, json!([block_number_hex(block_number)]), receipts)
    }

    /// Serve `receipts` only through the by-hash fallback for `block_number`.
    pub fn with_receipts_by_hash(self, block_number: u64, hash: &str, receipts: Value) -> Self {
        self.fail(
            PRIVILEGED_RECEIPTS_BY_NUMBER,
            json!([block_number_hex(block_number)]),
            "block not indexed by number",
        )
        .respond(
            ETH_GET_BLOCK_BY_NUMBER,
            json!([block_number_hex(block_number), false]),
            json!({ "number": block_number_hex(block_number), "hash": hash }),
        )
        .respond(PRIVILEGED_RECEIPTS_BY_HASH, json!([hash]), receipts)
    }

    /// Serve a boundary block carrying both epoch events.
    pub fn with_epoch(self, block_number: u64, epoch: u64, rewards: U256, timestamp: u64) -> Self {
        self.with_receipts(
            block_number,
            json!([receipt(vec![
                epoch_moved_log(epoch, timestamp),
                epoch_finalised_log(rewards, timestamp),
            ])]),
        )
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|(m, _)| m == method).count()
    }
}

#[async_trait]
impl ChainRpc for MockChainRpc {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let response = {
            let mut state = self.state.lock().unwrap();
            state.calls.push((method.to_string(), params.clone()));
            state
                .responses
                .get(&key(method, &params))
                .or_else(|| state.responses.get(method))
                .cloned()
        };

        match response {
            Some(MockResponse::Result(result)) => Ok(result),
            Some(MockResponse::Error(message)) => Err(TransportErrorKind::custom_str(&message).into()),
            None => Err(TransportErrorKind::custom_str(&format!(
                "no mock response for {method} {params}"
            ))
            .into()),
        }
    }
}

/// `amount` whole tokens, in wei.
pub fn tokens(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18))
}

/// Event data made of two 32-byte words.
pub fn event_data(first: U256, second: U256) -> String {
    format!("0x{}{}", hex::encode(first.to_be_bytes::<32>()), hex::encode(second.to_be_bytes::<32>()))
}

pub fn epoch_moved_log(epoch: u64, timestamp: u64) -> Value {
    json!({
        "topics": [EPOCH_MOVED_SIGNATURE],
        "data": event_data(U256::from(epoch), U256::from(timestamp)),
    })
}

pub fn epoch_finalised_log(total_rewards: U256, timestamp: u64) -> Value {
    json!({
        "topics": [EPOCH_FINALISED_SIGNATURE],
        "data": event_data(total_rewards, U256::from(timestamp)),
    })
}

/// A privileged transaction receipt holding `logs`.
pub fn receipt(logs: Vec<Value>) -> Value {
    json!({
        "transactionHash": format!("0x{}", "ab".repeat(32)),
        "status": "0x1",
        "logs": logs,
    })
}
