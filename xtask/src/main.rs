// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Developer-facing automation, invoked as `cargo xtask <command>`.

use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for datasketches-rust")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run `cargo fmt --check` across the workspace.
    Fmt,
    /// Run `cargo clippy` with the workspace's deny-list of lints.
    Clippy,
    /// Run the full workspace test suite.
    Test,
    /// Verify that the external tools this xtask shells out to are installed.
    CheckTools,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Fmt => run_cargo(&["fmt", "--all", "--check"]),
        Commands::Clippy => run_cargo(&[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ]),
        Commands::Test => run_cargo(&["test", "--workspace"]),
        Commands::CheckTools => check_tools(),
    }
}

fn workspace_root() -> anyhow::Result<PathBuf> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("xtask is not nested under a workspace root"))
}

fn run_cargo(args: &[&str]) -> anyhow::Result<()> {
    let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let status = Command::new(cargo)
        .args(args)
        .current_dir(workspace_root()?)
        .status()?;
    check_status(status, "cargo")
}

fn check_status(status: ExitStatus, what: &str) -> anyhow::Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(anyhow::anyhow!("{what} exited with {status}"))
    }
}

fn check_tools() -> anyhow::Result<()> {
    for tool in ["cargo-fmt", "cargo-clippy"] {
        match which::which(tool) {
            Ok(path) => println!("{tool}: found at {}", path.display()),
            Err(_) => println!("{tool}: NOT FOUND"),
        }
    }
    Ok(())
}
