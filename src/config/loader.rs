//! Configuration Loader
//!
//! Environment-aware configuration loading. Layers compiled defaults, an optional
//! configuration file (format picked from its extension) and `PIPELINE_*`
//! environment variables, then validates the merged result.
//!
//! Environment keys use `__` between path segments, for example
//! `PIPELINE_CONCURRENCY__MAX=16` or `PIPELINE_RETRY__BASE_DELAY_MS=250`.

use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ConfigResult, ConfigurationError};
use super::PipelineConfig;

/// Default prefix for environment overrides
pub const ENV_PREFIX: &str = "PIPELINE";

/// Loaded, validated configuration plus where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: PipelineConfig,
    environment: String,
    config_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from defaults, an optional file, and `PIPELINE_*` variables
    pub fn load(config_file: Option<&Path>) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_env_prefix(config_file, ENV_PREFIX)
    }

    /// Load configuration with a custom environment prefix.
    /// Useful for tests that must not observe the process-wide `PIPELINE_*` variables.
    pub fn load_with_env_prefix(
        config_file: Option<&Path>,
        env_prefix: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();

        debug!(
            environment = %environment,
            config_file = ?config_file,
            env_prefix = env_prefix,
            "Loading pipeline configuration"
        );

        let mut builder = Config::builder().add_source(Config::try_from(&PipelineConfig::default())?);

        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(ConfigurationError::config_file_not_found(path));
            }
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let merged = builder.build()?;
        let config: PipelineConfig =
            merged
                .try_deserialize()
                .map_err(|e| ConfigurationError::ParseError {
                    source_name: config_file
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "defaults+environment".to_string()),
                    reason: e.to_string(),
                })?;

        config.validate()?;

        info!(
            environment = %environment,
            min_concurrency = config.concurrency.min,
            max_concurrency = config.concurrency.max,
            cache_capacity = config.cache.capacity,
            rate_limit_per_window = config.rate_limit.max_per_window,
            "🔧 CONFIG: Pipeline configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment,
            config_file: config_file.map(Path::to_path_buf),
        }))
    }

    /// Wrap an already constructed configuration after validating it
    pub fn from_config(config: PipelineConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: Self::detect_environment(),
            config_file: None,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Current environment from `PIPELINE_ENV`, then `APP_ENV`, defaulting to development
    pub fn detect_environment() -> String {
        env::var("PIPELINE_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }
}
