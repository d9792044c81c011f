//! Configuration for the raster pipeline.

use crate::labeling::Connectivity;
use crate::merge::MergeStrategy;
use crate::resample::ResamplingMethod;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default parameters for pipeline operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Resampling method for collocation and merging.
    pub resampling: ResamplingMethod,

    /// Regions smaller than this many pixels are sieved out.
    pub sieve_min_pixels: usize,

    /// Pixel neighbourhood for sieving (4 or 8).
    pub sieve_connectivity: Connectivity,

    /// How overlapping pixels are combined when merging.
    pub merge_strategy: MergeStrategy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resampling: ResamplingMethod::Nearest,
            sieve_min_pixels: 10,
            sieve_connectivity: Connectivity::Eight,
            merge_strategy: MergeStrategy::FirstValid,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values are logged and left at their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Override fields from a variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("RASTER_RESAMPLING") {
            match val.parse() {
                Ok(method) => self.resampling = method,
                Err(e) => warn!(value = %val, error = %e, "Ignoring RASTER_RESAMPLING"),
            }
        }

        if let Some(val) = lookup("RASTER_SIEVE_MIN_PIXELS") {
            match val.parse() {
                Ok(count) => self.sieve_min_pixels = count,
                Err(e) => warn!(value = %val, error = %e, "Ignoring RASTER_SIEVE_MIN_PIXELS"),
            }
        }

        if let Some(val) = lookup("RASTER_SIEVE_CONNECTIVITY") {
            match val.parse::<Connectivity>() {
                Ok(connectivity) => self.sieve_connectivity = connectivity,
                Err(e) => warn!(value = %val, error = %e, "Ignoring RASTER_SIEVE_CONNECTIVITY"),
            }
        }

        if let Some(val) = lookup("RASTER_MERGE_STRATEGY") {
            match val.parse() {
                Ok(strategy) => self.merge_strategy = strategy,
                Err(e) => warn!(value = %val, error = %e, "Ignoring RASTER_MERGE_STRATEGY"),
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.sieve_min_pixels == 0 {
            return Err("sieve_min_pixels must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.resampling, ResamplingMethod::Nearest);
        assert_eq!(config.sieve_min_pixels, 10);
        assert_eq!(config.sieve_connectivity, Connectivity::Eight);
        assert_eq!(config.merge_strategy, MergeStrategy::FirstValid);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = PipelineConfig {
            sieve_min_pixels: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RASTER_RESAMPLING", "bicubic"),
            ("RASTER_SIEVE_MIN_PIXELS", "25"),
            ("RASTER_SIEVE_CONNECTIVITY", "4"),
            ("RASTER_MERGE_STRATEGY", "max"),
        ]
        .into_iter()
        .collect();

        let mut config = PipelineConfig::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.resampling, ResamplingMethod::Cubic);
        assert_eq!(config.sieve_min_pixels, 25);
        assert_eq!(config.sieve_connectivity, Connectivity::Four);
        assert_eq!(config.merge_strategy, MergeStrategy::Max);
    }

    #[test]
    fn test_bad_env_values_keep_defaults() {
        let mut config = PipelineConfig::default();
        config.apply_env(|key| match key {
            "RASTER_SIEVE_CONNECTIVITY" => Some("6".to_string()),
            "RASTER_SIEVE_MIN_PIXELS" => Some("many".to_string()),
            _ => None,
        });
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_config_deserializes() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"sieve_min_pixels": 4, "sieve_connectivity": 4}"#).unwrap();
        assert_eq!(config.sieve_min_pixels, 4);
        assert_eq!(config.sieve_connectivity, Connectivity::Four);
        assert_eq!(config.resampling, ResamplingMethod::Nearest);
    }
}
