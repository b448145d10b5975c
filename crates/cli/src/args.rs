// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line surface (spec §6): flags for target files, config path,
//! and run mode, plus the supplemented `config validate` subcommand.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Onetime,
    Automated,
}

#[derive(Parser, Debug)]
#[command(name = "recon", version, about = "Security-reconnaissance crawl/probe/monitor engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to a scan target file (one URL per line)
    #[arg(long = "scan-targets", alias = "st", value_name = "PATH")]
    pub scan_targets: Option<PathBuf>,

    /// Path to a monitor target file (one URL per line)
    #[arg(long = "monitor-targets", alias = "mt", value_name = "PATH")]
    pub monitor_targets: Option<PathBuf>,

    /// Path to the global config file (YAML or JSON)
    #[arg(long = "globalconfig", alias = "gc", value_name = "PATH")]
    pub globalconfig: Option<PathBuf>,

    /// Run mode: a single pass, or an indefinite periodic loop
    #[arg(long = "mode", short = 'm', value_enum)]
    pub mode: Option<Mode>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Config file inspection commands
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Load and validate a config file without starting anything
    Validate {
        #[arg(long = "globalconfig", alias = "gc", value_name = "PATH")]
        globalconfig: Option<PathBuf>,
    },
}
