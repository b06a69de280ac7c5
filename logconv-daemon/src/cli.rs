//! CLI argument definitions for logconv-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// logconv log conversion daemon.
///
/// Tails the configured log files, converts each `<timestamp> | <message>`
/// line into a structured record, and stores it in the configured collection.
/// Prints execution statistics on exit.
#[derive(Parser, Debug)]
#[command(name = "logconv-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to logconv.toml configuration file.
    #[arg(short, long, default_value = "/etc/logconv/logconv.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without tailing anything.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply CLI overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut logconv_core::LogconvConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
    }
}
