use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use super::error::Error;
use arb_graph_core::{DetectorConfig, solver::DEFAULT_EPSILON};
use common::numeric_kernel::{DEFAULT_SIGNIFICANT_DIGITS, Precision};

#[derive(Debug, Deserialize, Clone)]
pub struct GraphConfig {
    pub significant_digits: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectorSettings {
    pub epsilon: f64,
    #[serde(default)]
    pub max_passes: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProducerConfig {
    pub batch_size: usize,
    pub skip_invalid_rates: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExecutorConfig {
    pub buffer_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub graph: GraphConfig,
    pub detector: DetectorSettings,
    pub producer: ProducerConfig,
    pub executor: ExecutorConfig,
}

impl Config {
    pub fn precision(&self) -> Result<Precision, Error> {
        Ok(Precision::new(self.graph.significant_digits)?)
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            epsilon: self.detector.epsilon,
            max_passes: self.detector.max_passes,
        }
    }
}

/// Loads configuration from defaults, a TOML file, and `ARBGRAPH_*` environment variables.
///
/// An explicit `path` must exist. Without one, `crates/executor/Config.toml`
/// under the current directory is used if present.
pub fn load_config(path: Option<&Path>) -> Result<Config, Error> {
    let file = match path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::ConfigLoadError(format!(
                    "Configuration file not found at {}",
                    path.display()
                )));
            }
            File::from(path).required(true)
        }
        None => File::from(default_config_path()?.as_path()).required(false),
    };

    let s = ConfigLoader::builder()
        .set_default("graph.significant_digits", i64::from(DEFAULT_SIGNIFICANT_DIGITS))
        .and_then(|b| b.set_default("detector.epsilon", DEFAULT_EPSILON))
        .and_then(|b| b.set_default("producer.batch_size", 64i64))
        .and_then(|b| b.set_default("producer.skip_invalid_rates", false))
        .and_then(|b| b.set_default("executor.buffer_size", 16i64))
        .map_err(|e| Error::ConfigLoadError(e.to_string()))?
        .add_source(file)
        .add_source(
            Environment::with_prefix("ARBGRAPH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| Error::ConfigLoadError(e.to_string()))?;

    let app_config: Config = s
        .try_deserialize()
        .map_err(|e| Error::ConfigLoadError(format!("Failed to deserialize config: {}", e)))?;

    Ok(app_config)
}

fn default_config_path() -> Result<PathBuf, Error> {
    let base_path = env::current_dir().map_err(|e| {
        Error::ConfigLoadError(format!("Failed to determine current directory: {}", e))
    })?;

    Ok(base_path
        .join("crates")
        .join("executor")
        .join("Config.toml"))
}
