//! CLI configuration: environment, then YAML file, then flags.

use anyhow::{Context, Result};
use raster_pipeline::{Connectivity, MergeStrategy, PipelineConfig, ResamplingMethod};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Pipeline defaults read from a YAML file. Absent keys keep the value
/// taken from the environment.
///
/// ```yaml
/// resampling: bilinear
/// sieve_min_pixels: 8
/// sieve_connectivity: 4
/// merge_strategy: max
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub resampling: Option<ResamplingMethod>,
    pub sieve_min_pixels: Option<usize>,
    pub sieve_connectivity: Option<Connectivity>,
    pub merge_strategy: Option<MergeStrategy>,
}

impl FileConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document parses as null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse config YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    /// Overlay the keys present in the file.
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(method) = self.resampling {
            config.resampling = method;
        }
        if let Some(count) = self.sieve_min_pixels {
            config.sieve_min_pixels = count;
        }
        if let Some(connectivity) = self.sieve_connectivity {
            config.sieve_connectivity = connectivity;
        }
        if let Some(strategy) = self.merge_strategy {
            config.merge_strategy = strategy;
        }
    }
}

/// Environment defaults with the optional config file applied on top.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::from_env();
    if let Some(path) = path {
        FileConfig::load(path)?.apply(&mut config);
    }
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}
