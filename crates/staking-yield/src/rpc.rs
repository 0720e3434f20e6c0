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

//! Thin JSON-RPC client for the chain node.
//!
//! Every call is a single request: there is no retry layer and no response caching.

use alloy::{
    primitives::{Address, B256, U256, U64},
    rpc::client::RpcClient,
    transports::TransportError,
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use crate::{events::PrivilegedReceipt, TOTAL_STAKED_SELECTOR};

pub const ETH_BLOCK_NUMBER: &str = "eth_blockNumber";
pub const ETH_CALL: &str = "eth_call";
pub const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
pub const PRIVILEGED_RECEIPTS_BY_NUMBER: &str =
    "somnia_getPrivilegedTransactionReceiptsForBlockByNumber";
pub const PRIVILEGED_RECEIPTS_BY_HASH: &str =
    "somnia_getPrivilegedTransactionReceiptsForBlockByHash";

#[derive(Error, Debug)]
pub enum RpcError {
    /// Network failure, non-success HTTP status or a JSON-RPC `error` payload.
    #[error("RPC call failed: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid {method} response: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A JSON-RPC endpoint.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Issue `method` with `params` and return the raw `result` value.
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

/// [ChainRpc] over HTTP.
#[derive(Clone)]
pub struct HttpChainRpc {
    client: RpcClient,
}

impl HttpChainRpc {
    pub fn new(url: Url) -> Self {
        Self { client: RpcClient::builder().http(url) }
    }
}

#[async_trait]
impl ChainRpc for HttpChainRpc {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        tracing::trace!("RPC {method} {params}");
        let result: Value = self.client.request(method.to_string(), params).await?;
        Ok(result)
    }
}

#[async_trait]
impl<T: ChainRpc + ?Sized> ChainRpc for std::sync::Arc<T> {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        (**self).call(method, params).await
    }
}

fn decode<T: DeserializeOwned>(method: &'static str, value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|source| RpcError::Decode { method, source })
}

/// Hex quantity encoding used for block number parameters.
pub fn block_number_hex(block_number: u64) -> String {
    format!("{block_number:#x}")
}

/// Current chain height.
pub async fn block_number<R: ChainRpc + ?Sized>(rpc: &R) -> Result<u64, RpcError> {
    let result = rpc.call(ETH_BLOCK_NUMBER, json!([])).await?;
    let height: U64 = decode(ETH_BLOCK_NUMBER, result)?;
    Ok(height.to())
}

/// Total amount staked in the staking contract, in wei.
///
/// Never fails: any error is logged and reported as zero stake.
pub async fn total_staked<R: ChainRpc + ?Sized>(rpc: &R, staking_address: Address) -> U256 {
    match try_total_staked(rpc, staking_address).await {
        Ok(amount) => amount,
        Err(err) => {
            tracing::warn!("Failed to read total staked amount, assuming zero: {err}");
            U256::ZERO
        }
    }
}

async fn try_total_staked<R: ChainRpc + ?Sized>(
    rpc: &R,
    staking_address: Address,
) -> Result<U256, RpcError> {
    let params = json!([{ "to": staking_address, "data": TOTAL_STAKED_SELECTOR }, "latest"]);
    let result = rpc.call(ETH_CALL, params).await?;
    decode(ETH_CALL, result)
}

#[derive(Deserialize)]
struct BlockHeader {
    hash: Option<B256>,
}

/// Hash of the block at `block_number`, if the node knows the block.
pub async fn block_hash<R: ChainRpc + ?Sized>(
    rpc: &R,
    block_number: u64,
) -> Result<Option<B256>, RpcError> {
    let result =
        rpc.call(ETH_GET_BLOCK_BY_NUMBER, json!([block_number_hex(block_number), false])).await?;
    let block: Option<BlockHeader> = decode(ETH_GET_BLOCK_BY_NUMBER, result)?;
    Ok(block.and_then(|b| b.hash))
}

pub async fn privileged_receipts_by_number<R: ChainRpc + ?Sized>(
    rpc: &R,
    block_number: u64,
) -> Result<Vec<PrivilegedReceipt>, RpcError> {
    let result =
        rpc.call(PRIVILEGED_RECEIPTS_BY_NUMBER, json!([block_number_hex(block_number)])).await?;
    decode(PRIVILEGED_RECEIPTS_BY_NUMBER, result)
}

pub async fn privileged_receipts_by_hash<R: ChainRpc + ?Sized>(
    rpc: &R,
    block_hash: B256,
) -> Result<Vec<PrivilegedReceipt>, RpcError> {
    let result = rpc.call(PRIVILEGED_RECEIPTS_BY_HASH, json!([block_hash])).await?;
    decode(PRIVILEGED_RECEIPTS_BY_HASH, result)
}
