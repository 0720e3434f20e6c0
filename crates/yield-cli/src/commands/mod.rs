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

//! Commands of the yield CLI.

mod apr;
mod boundaries;
mod epoch;
mod watch;

pub use apr::AprCommand;
pub use boundaries::BoundariesCommand;
pub use epoch::EpochCommand;
pub use watch::WatchCommand;

use clap::Subcommand;

use crate::config::GlobalConfig;

/// Commands for inspecting staking yields.
#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Calculate the current APR and APY from recent epochs.
    Apr(AprCommand),
    /// List the most recent epoch boundary blocks.
    Boundaries(BoundariesCommand),
    /// Decode the epoch events of a block.
    Epoch(EpochCommand),
    /// Poll the APR endpoint and report yield figures.
    Watch(WatchCommand),
}

impl Command {
    /// Run the command.
    pub async fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        match self {
            Self::Apr(cmd) => cmd.run(global_config).await,
            Self::Boundaries(cmd) => cmd.run(global_config).await,
            Self::Epoch(cmd) => cmd.run(global_config).await,
            Self::Watch(cmd) => cmd.run(global_config).await,
        }
    }
}
