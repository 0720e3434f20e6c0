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

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Args;
use staking_yield::{
    client::REFRESH_INTERVAL, CacheStore, FileStore, HttpYieldSource, MemoryStore, SystemClock,
    YieldCache, YieldClient, YieldSnapshot,
};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{config::GlobalConfig, utils::format_percent};

/// Command to poll the APR endpoint and report the derived yield figures.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct WatchCommand {
    /// URL of the APR endpoint
    #[clap(long, env = "YIELD_API_URL")]
    pub api_url: Url,

    /// URL queried, with cache busting, when the primary endpoint cannot be reached
    #[clap(long, env = "YIELD_API_FALLBACK_URL")]
    pub fallback_url: Option<Url>,

    /// Directory keeping the cached figures across runs. Kept in memory if unset.
    #[clap(long)]
    pub cache_dir: Option<PathBuf>,

    /// Seconds between refreshes
    #[clap(
        long,
        default_value_t = REFRESH_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// Report once and exit
    #[clap(long)]
    pub once: bool,

    /// Ignore cached figures
    #[clap(long)]
    pub force_refresh: bool,
}

impl WatchCommand {
    /// Run the [WatchCommand] command.
    pub async fn run(&self, _global_config: &GlobalConfig) -> anyhow::Result<()> {
        let mut source = HttpYieldSource::new(self.api_url.clone());
        if let Some(fallback) = &self.fallback_url {
            source = source.with_fallback(fallback.clone());
        }

        match &self.cache_dir {
            Some(dir) => {
                let cache = YieldCache::new(FileStore::new(dir), SystemClock);
                self.watch(YieldClient::new(source, cache)).await
            }
            None => {
                let cache = YieldCache::new(MemoryStore::default(), SystemClock);
                self.watch(YieldClient::new(source, cache)).await
            }
        }
    }

    async fn watch<S: CacheStore + 'static>(
        &self,
        client: YieldClient<HttpYieldSource, S>,
    ) -> anyhow::Result<()> {
        if self.once {
            report(&client.fetch(self.force_refresh).await?);
            return Ok(());
        }
        if self.force_refresh {
            client.cache().clear()?;
        }

        let cancel = CancellationToken::new();
        let (handle, mut snapshots) = Arc::new(client)
            .spawn_refresh_task(Duration::from_secs(self.interval), cancel.clone());
        tracing::info!("Watching {} every {} s, press Ctrl-C to stop", self.api_url, self.interval);

        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(snapshot) = *snapshots.borrow_and_update() {
                        report(&snapshot);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    cancel.cancel();
                    break;
                }
            }
        }

        handle.await?;
        Ok(())
    }
}

fn report(snapshot: &YieldSnapshot) {
    tracing::info!(
        "APR {} | APY {} | burn rate {} | real yield {} ({})",
        format_percent(snapshot.rates.apr),
        format_percent(snapshot.rates.apy),
        format_percent(snapshot.burn_rate),
        format_percent(snapshot.real_yield),
        if snapshot.from_cache { "cached" } else { "fetched" }
    );
}
