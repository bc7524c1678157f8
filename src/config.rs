//! Configuration module

use std::env;
use std::path::PathBuf;

use crate::logic::detector::DEFAULT_MODEL_PATH;
use crate::logic::model::ForestConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Persisted model file
    pub model_path: PathBuf,

    /// Expected anomaly fraction for newly created models
    pub contamination: f64,

    /// Trees per forest for newly created models
    pub n_estimators: usize,

    /// Forest seed
    pub random_state: u64,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ForestConfig::default();

        Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),

            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),

            contamination: lookup("MODEL_CONTAMINATION")
                .and_then(|c| c.parse().ok())
                .unwrap_or(defaults.contamination),

            n_estimators: lookup("MODEL_N_ESTIMATORS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.n_estimators),

            random_state: lookup("MODEL_RANDOM_STATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.random_state),

            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
        }
    }

    /// Hyperparameters used when no persisted model exists
    pub fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            n_estimators: self.n_estimators,
            contamination: self.contamination,
            random_state: self.random_state,
            ..ForestConfig::default()
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
