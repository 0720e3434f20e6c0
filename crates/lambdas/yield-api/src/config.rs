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

use std::{env, str::FromStr, sync::Arc};

use alloy::primitives::Address;
use anyhow::{ensure, Context, Result};
use staking_yield::{AprConfig, ChainRpc, HttpChainRpc, DEFAULT_RPC_URL};
use url::Url;

const RPC_URL_VARS: &[&str] = &["RPC_URL", "SOMNIA_RPC_URL", "NEXT_PUBLIC_NEW_CHAIN_RPC_URL"];
const STAKING_ADDRESS_VARS: &[&str] = &["STAKING_ADDRESS", "NEXT_PUBLIC_STAKING_ADDRESS"];

/// Service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub rpc_url: Url,
    pub apr: AprConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from a variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let rpc_url = match first_set(&lookup, RPC_URL_VARS) {
            Some((name, value)) => {
                Url::parse(value.trim()).with_context(|| format!("Invalid {name}: {value}"))?
            }
            None => Url::parse(DEFAULT_RPC_URL).context("Invalid default RPC URL")?,
        };

        let mut apr = AprConfig::default();
        if let Some((name, value)) = first_set(&lookup, STAKING_ADDRESS_VARS) {
            apr.staking_address = Address::from_str(value.trim())
                .with_context(|| format!("Invalid {name}: {value}"))?;
        }
        if let Some((name, value)) = first_set(&lookup, &["EPOCH_LENGTH"]) {
            apr.epoch_length =
                value.trim().parse().with_context(|| format!("Invalid {name}: {value}"))?;
            ensure!(apr.epoch_length > 0, "{name} must be greater than zero");
        }
        if let Some((name, value)) = first_set(&lookup, &["EPOCH_SAMPLE_COUNT"]) {
            apr.sample_count =
                value.trim().parse().with_context(|| format!("Invalid {name}: {value}"))?;
        }

        Ok(Self { rpc_url, apr })
    }
}

/// First of `names` set to a non-empty value, with the value.
fn first_set(
    lookup: &impl Fn(&str) -> Option<String>,
    names: &[&'static str],
) -> Option<(&'static str, String)> {
    names.iter().find_map(|&name| {
        lookup(name).filter(|value| !value.trim().is_empty()).map(|value| (name, value))
    })
}

/// Shared state of the request handlers.
#[derive(Clone)]
pub struct AppState {
    pub rpc: Arc<dyn ChainRpc>,
    pub config: AprConfig,
}

impl AppState {
    pub fn new(rpc: Arc<dyn ChainRpc>, config: AprConfig) -> Self {
        Self { rpc, config }
    }

    pub fn from_config(config: ServiceConfig) -> Self {
        Self::new(Arc::new(HttpChainRpc::new(config.rpc_url)), config.apr)
    }
}
