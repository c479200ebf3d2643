//! Configuration resolution
//!
//! Every option resolves command line > environment variable > TOML
//! config file > compiled default, so a bare `ddosmon` run works against
//! the detector's default output layout.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Command-line arguments for ddosmon
#[derive(Parser, Debug)]
#[command(name = "ddosmon")]
#[command(about = "Streaming backend for the DDoS detection dashboard")]
#[command(version)]
pub struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "DDOSMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory the detection process writes result files into
    #[arg(long, env = "DDOSMON_WATCH_DIR")]
    pub watch_dir: Option<PathBuf>,

    /// Result filename prefix
    #[arg(long, env = "DDOSMON_FILE_PREFIX")]
    pub file_prefix: Option<String>,

    /// Result filename suffix
    #[arg(long, env = "DDOSMON_FILE_SUFFIX")]
    pub file_suffix: Option<String>,

    /// Header name of the score column
    #[arg(long, env = "DDOSMON_SCORE_COLUMN")]
    pub score_column: Option<String>,

    /// Port for the metrics HTTP endpoints
    #[arg(short = 'p', long, env = "DDOSMON_HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Port for the realtime score channel
    #[arg(long, env = "DDOSMON_REALTIME_PORT")]
    pub realtime_port: Option<u16>,

    /// Network interface /network-usage reports on by default
    #[arg(long, env = "DDOSMON_INTERFACE")]
    pub interface: Option<String>,
}

/// TOML config file contents; any subset of keys may be present.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub watch_dir: Option<PathBuf>,
    pub file_prefix: Option<String>,
    pub file_suffix: Option<String>,
    pub score_column: Option<String>,
    pub http_port: Option<u16>,
    pub realtime_port: Option<u16>,
    pub interface: Option<String>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub watch_dir: PathBuf,
    pub file_prefix: String,
    pub file_suffix: String,
    pub score_column: String,
    pub http_port: u16,
    pub realtime_port: u16,
    pub interface: String,
}

impl Config {
    /// Resolve the configuration from parsed arguments.
    ///
    /// Environment variables are already folded into `args` by clap, so
    /// the remaining layering here is args > config file > default.
    pub fn resolve(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                toml::from_str::<ConfigFile>(&raw).map_err(|e| {
                    Error::Config(format!("invalid config {}: {}", path.display(), e))
                })?
            }
            None => ConfigFile::default(),
        };

        Ok(Self {
            watch_dir: args
                .watch_dir
                .or(file.watch_dir)
                .unwrap_or_else(|| PathBuf::from("./output")),
            file_prefix: args
                .file_prefix
                .or(file.file_prefix)
                .unwrap_or_else(|| "predictions-".to_string()),
            file_suffix: args
                .file_suffix
                .or(file.file_suffix)
                .unwrap_or_else(|| ".csv".to_string()),
            score_column: args
                .score_column
                .or(file.score_column)
                .unwrap_or_else(|| "DDOS%".to_string()),
            http_port: args.http_port.or(file.http_port).unwrap_or(5000),
            realtime_port: args.realtime_port.or(file.realtime_port).unwrap_or(5001),
            interface: args
                .interface
                .or(file.interface)
                .unwrap_or_else(|| "lo".to_string()),
        })
    }
}
