//! Raster alignment and cleanup command line.
//!
//! Reads and writes JSON raster documents (optionally gzip-compressed) and
//! GeoJSON polygons. Pipeline defaults come from the environment, then an
//! optional YAML config file, then per-command flags.

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use commands::Command;
use logging::{LogFormat, LogOptions};

#[derive(Parser, Debug)]
#[command(name = "raster-cli")]
#[command(about = "Collocate, sieve, vectorize, merge and flag-pack rasters")]
struct Args {
    /// YAML file with pipeline defaults
    #[arg(short, long, env = "RASTER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Console log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log level for the log file
    #[arg(long, default_value = "debug", global = true)]
    file_log_level: String,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    logging::init_logging(&LogOptions {
        level: args.log_level.clone(),
        format: args.log_format,
        file: args.log_file.clone(),
        file_level: args.file_log_level.clone(),
    })?;

    let config = config::load_config(args.config.as_deref())?;
    info!(
        command = args.command.name(),
        resampling = %config.resampling,
        sieve_min_pixels = config.sieve_min_pixels,
        sieve_connectivity = %config.sieve_connectivity,
        merge_strategy = %config.merge_strategy,
        "Starting raster-cli"
    );

    commands::run(args.command, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_sieve() {
        let args = Args::try_parse_from([
            "raster-cli",
            "--log-format",
            "json",
            "sieve",
            "-i",
            "in.json",
            "-o",
            "out.json",
            "--connectivity",
            "4",
        ])
        .unwrap();
        assert_eq!(args.log_format, LogFormat::Json);
        match args.command {
            Command::Sieve(sieve) => {
                assert_eq!(sieve.connectivity, Some(raster_pipeline::Connectivity::Four));
                assert_eq!(sieve.min_pixels, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_collocate_needs_target() {
        assert!(Args::try_parse_from(["raster-cli", "collocate", "-i", "a.json", "-o", "b.json"]).is_err());
        assert!(Args::try_parse_from([
            "raster-cli", "collocate", "-i", "a.json", "-o", "b.json", "--crs", "EPSG:32632",
        ])
        .is_ok());
    }

    #[test]
    fn test_parse_merge_inputs() {
        let args = Args::try_parse_from([
            "raster-cli", "merge", "-i", "a.json", "-i", "b.json", "-o", "m.json", "-s", "max",
        ])
        .unwrap();
        match args.command {
            Command::Merge(merge) => {
                assert_eq!(merge.inputs.len(), 2);
                assert_eq!(merge.strategy, Some(raster_pipeline::MergeStrategy::Max));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
