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

//! Consumer side of the APR endpoint.
//!
//! [YieldClient] fetches the endpoint payload, derives the burn rate and real yield, and keeps
//! the result in a [YieldCache] so that repeated reads within the freshness window do not hit
//! the endpoint again.

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde::Deserialize;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    cache::{CacheEntry, CacheStore, Clock, MemoryStore, SystemClock, YieldCache},
    yields::{burn_rate, real_yield, YieldRates},
};

/// Default interval of the background refresh task
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Body of `GET /api/apr-calculation`, as far as the client needs it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AprResponse {
    #[serde(default)]
    pub success: bool,
    pub data: Option<AprResponseData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AprResponseData {
    pub current_block: Option<u64>,
    pub averages: Option<ResponseAverages>,
    pub yields: Option<YieldRates>,
    pub calculated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseAverages {
    pub annualized_rewards: f64,
    #[serde(default)]
    pub epochs_per_year: f64,
}

/// Yield figures ready for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldSnapshot {
    pub rates: YieldRates,
    pub burn_rate: f64,
    pub real_yield: f64,
    /// Milliseconds since the epoch at which the figures were computed
    pub timestamp: u64,
    /// Served from the cache rather than fetched
    pub from_cache: bool,
}

impl YieldSnapshot {
    fn cached(entry: CacheEntry) -> Self {
        Self {
            rates: entry.data,
            burn_rate: entry.burn_rate,
            real_yield: entry.real_yield,
            timestamp: entry.timestamp,
            from_cache: true,
        }
    }
}

/// Where the APR payload comes from.
#[async_trait]
pub trait YieldSource: Send + Sync {
    async fn fetch(&self) -> Result<AprResponse>;
}

#[async_trait]
impl<T: YieldSource + ?Sized> YieldSource for Arc<T> {
    async fn fetch(&self) -> Result<AprResponse> {
        (**self).fetch().await
    }
}

/// [YieldSource] fetching the payload over HTTP.
///
/// When the primary endpoint cannot be reached, the fallback endpoint is queried with a
/// cache-busting `t` parameter.
#[derive(Debug, Clone)]
pub struct HttpYieldSource {
    client: reqwest::Client,
    primary: Url,
    fallback: Option<Url>,
}

impl HttpYieldSource {
    pub fn new(primary: Url) -> Self {
        Self { client: reqwest::Client::new(), primary, fallback: None }
    }

    pub fn with_fallback(self, fallback: Url) -> Self {
        Self { fallback: Some(fallback), ..self }
    }
}

#[async_trait]
impl YieldSource for HttpYieldSource {
    async fn fetch(&self) -> Result<AprResponse> {
        let sent =
            self.client.get(self.primary.clone()).header(CACHE_CONTROL, "no-cache").send().await;
        let response = match (sent, &self.fallback) {
            (Ok(response), _) => response,
            (Err(err), None) => {
                return Err(err).with_context(|| format!("failed to reach {}", self.primary));
            }
            (Err(err), Some(fallback)) => {
                tracing::warn!("Primary yield endpoint failed, falling back to {fallback}: {err}");
                let mut url = fallback.clone();
                url.query_pairs_mut()
                    .append_pair("t", &chrono::Utc::now().timestamp_millis().to_string());
                self.client
                    .get(url)
                    .header(CACHE_CONTROL, "no-cache")
                    .header(PRAGMA, "no-cache")
                    .send()
                    .await
                    .with_context(|| format!("failed to reach {fallback}"))?
            }
        };

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP error! status: {}", status.as_u16());
        }
        response.json().await.context("failed to parse yield response")
    }
}

pub struct YieldClient<Src, S = MemoryStore, C = SystemClock> {
    source: Src,
    cache: YieldCache<S, C>,
}

impl<Src: YieldSource> YieldClient<Src> {
    /// Client with an in-memory cache.
    pub fn with_source(source: Src) -> Self {
        Self::new(source, YieldCache::default())
    }
}

impl<Src, S, C> YieldClient<Src, S, C>
where
    Src: YieldSource,
    S: CacheStore,
    C: Clock,
{
    pub fn new(source: Src, cache: YieldCache<S, C>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &YieldCache<S, C> {
        &self.cache
    }

    /// Current yield figures.
    ///
    /// Unless `force_refresh` is set, a fresh cache entry is returned without contacting the
    /// source. A failed fetch leaves the cache untouched.
    pub async fn fetch(&self, force_refresh: bool) -> Result<YieldSnapshot> {
        if !force_refresh {
            if let Some(entry) = self.cache.get() {
                tracing::debug!("Serving yield data cached at {}", entry.timestamp);
                return Ok(YieldSnapshot::cached(entry));
            }
        }

        let response = self.source.fetch().await?;
        let (rates, averages) = match response.data {
            Some(AprResponseData { yields: Some(rates), averages: Some(averages), .. })
                if response.success =>
            {
                (rates, averages)
            }
            _ => bail!("Invalid response format"),
        };

        let burn = burn_rate(averages.annualized_rewards);
        let real = real_yield(burn, rates.apy);
        let timestamp = match self.cache.put(rates, burn, real) {
            Ok(entry) => entry.timestamp,
            Err(err) => {
                tracing::warn!("Error setting yield cache: {err:?}");
                self.cache.clock().now_millis()
            }
        };

        Ok(YieldSnapshot { rates, burn_rate: burn, real_yield: real, timestamp, from_cache: false })
    }

    /// Fetch from the source, bypassing the cache.
    pub async fn refresh(&self) -> Result<YieldSnapshot> {
        self.fetch(true).await
    }
}

impl<Src, S, C> YieldClient<Src, S, C>
where
    Src: YieldSource + 'static,
    S: CacheStore + 'static,
    C: Clock + 'static,
{
    /// Refresh the figures now and then every `interval`, publishing each snapshot.
    ///
    /// Every tick goes through the cache, so the source is only contacted once the cached entry
    /// has gone stale. Failed refreshes are logged and leave the last snapshot published. The
    /// task ends when `cancel` is triggered.
    pub fn spawn_refresh_task(
        self: Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> (JoinHandle<()>, watch::Receiver<Option<YieldSnapshot>>) {
        let (tx, rx) = watch::channel(None);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => match self.fetch(false).await {
                        Ok(snapshot) => {
                            tx.send_replace(Some(snapshot));
                        }
                        Err(err) => tracing::error!("Error fetching yield data: {err:?}"),
                    },
                }
            }
            tracing::debug!("Yield refresh task stopped");
        });
        (handle, rx)
    }
}
