// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use recon::args::Cli;
use recon::exit_error::ExitError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = recon::run(cli).await {
        if let Some(exit_err) = err.downcast_ref::<ExitError>() {
            eprintln!("error: {exit_err}");
            std::process::exit(exit_err.code);
        }
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
