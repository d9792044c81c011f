//! Tracing subscriber setup.
//!
//! Console output honours `RUST_LOG` when set, else `--log-level`. An
//! optional log file gets its own level. Library targets below the pipeline
//! are capped at `info` unless `RUST_LOG` asks for more.

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Targets whose debug events drown out the pipeline's own.
const NOISY_TARGETS: &[&str] = &["projection", "raster_io"];

/// Output encoding of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogOptions {
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
    pub file_level: String,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn parse_level(level: &str) -> Result<LevelFilter> {
    level
        .parse::<LevelFilter>()
        .with_context(|| format!("Invalid log level '{}'", level))
}

/// Cap noisy targets at `info`.
pub fn reduce_verbosity(mut filter: EnvFilter) -> EnvFilter {
    for target in NOISY_TARGETS {
        if let Ok(directive) = format!("{}=info", target).parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

fn console_filter(level: LevelFilter) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => reduce_verbosity(EnvFilter::default().add_directive(level.into())),
    }
}

/// Install the global subscriber.
pub fn init_logging(options: &LogOptions) -> Result<()> {
    let console_level = parse_level(&options.level)?;
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let filter = console_filter(console_level);
    let console = fmt::layer().with_writer(std::io::stderr).with_target(true);
    layers.push(match options.format {
        LogFormat::Text => console.with_filter(filter).boxed(),
        LogFormat::Json => console.json().with_filter(filter).boxed(),
    });

    if let Some(path) = &options.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {:?}", path))?;
        let file_level = parse_level(&options.file_level)?;
        let filter = reduce_verbosity(EnvFilter::default().add_directive(file_level.into()));
        let layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true);
        layers.push(match options.format {
            LogFormat::Text => layer.with_filter(filter).boxed(),
            LogFormat::Json => layer.json().with_filter(filter).boxed(),
        });
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("WARN").unwrap(), LevelFilter::WARN);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn test_reduce_verbosity_adds_directives() {
        let filter = reduce_verbosity(EnvFilter::new("debug"));
        let rendered = filter.to_string();
        for target in NOISY_TARGETS {
            assert!(rendered.contains(&format!("{}=info", target)), "{}", rendered);
        }
    }
}
