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

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use yield_cli::{commands::Command, config::GlobalConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect staking reward yields", long_about = None)]
struct MainArgs {
    #[command(subcommand)]
    command: Command,

    #[clap(flatten)]
    config: GlobalConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = MainArgs::parse();

    // RUST_LOG takes precedence over --log-level. Logs go to stderr, stdout is kept for
    // command output such as `apr --json`.
    let filter = EnvFilter::builder()
        .with_default_directive(args.config.log_level.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    args.command.run(&args.config).await
}
