//! Forecast configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Explicit path (`--config` or `SPENDCAST_CONFIG`), else the override in the
//!    data dir (~/.local/share/spendcast/config/forecast.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Missing keys in an override file keep their default values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/forecast.toml");

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "SPENDCAST_CONFIG";

/// Thresholds for a training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Days of ledger history pulled for each run
    pub window_days: u32,
    /// Minimum expense records in the window
    pub min_expenses: usize,
    /// Minimum income records in the window
    pub min_incomes: usize,
    /// Minimum monthly (income, expense) pairs
    pub min_samples: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            window_days: 90,
            min_expenses: 10,
            min_incomes: 3,
            min_samples: 3,
        }
    }
}

/// Thresholds used when composing prediction insights
#[derive(Debug, Clone, PartialEq)]
pub struct InsightConfig {
    pub warning_ratio: f64,
    pub suggestion_threshold: f64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            warning_ratio: 0.8,
            suggestion_threshold: 0.3,
        }
    }
}

/// Where model artifacts are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// `model_artifacts` table in the main database
    #[default]
    Database,
    /// One JSON file per user in a directory
    Local,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "database" | "db" | "sqlite" => Ok(Self::Database),
            "local" | "file" | "filesystem" => Ok(Self::Local),
            _ => Err(format!("Unknown store backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Artifact directory for the local backend (defaults to the data dir)
    pub dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Directory used by the local backend
    pub fn artifact_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_artifact_dir)
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastConfig {
    pub training: TrainingConfig,
    pub insights: InsightConfig,
    pub store: StoreConfig,
}

impl ForecastConfig {
    /// Load config from an explicit path, `SPENDCAST_CONFIG`, the data dir
    /// override, or the embedded defaults (first match wins)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

        let content = match explicit {
            Some(path) if path.exists() => read_config(&path)?,
            Some(path) => {
                warn!(
                    path = %path.display(),
                    "Config file not found, using embedded defaults"
                );
                DEFAULT_CONFIG.to_string()
            }
            None => match default_config_path() {
                Some(path) if path.exists() => read_config(&path)?,
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        Self::from_toml(&content)
    }

    /// Parse config from TOML content, keeping defaults for missing keys
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        if let Some(training) = raw.training {
            if let Some(v) = training.window_days {
                config.training.window_days = v;
            }
            if let Some(v) = training.min_expenses {
                config.training.min_expenses = v;
            }
            if let Some(v) = training.min_incomes {
                config.training.min_incomes = v;
            }
            if let Some(v) = training.min_samples {
                config.training.min_samples = v;
            }
        }

        if let Some(insights) = raw.insights {
            if let Some(v) = insights.warning_ratio {
                config.insights.warning_ratio = v;
            }
            if let Some(v) = insights.suggestion_threshold {
                config.insights.suggestion_threshold = v;
            }
        }

        if let Some(store) = raw.store {
            if let Some(backend) = store.backend {
                config.store.backend = backend.parse().map_err(Error::Config)?;
            }
            config.store.dir = store.dir;
        }

        config.validate()?;
        debug!(?config, "Loaded forecast config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.training.window_days == 0 {
            return Err(Error::Config("training.window_days must be positive".into()));
        }
        if self.training.min_samples < 2 {
            return Err(Error::Config(
                "training.min_samples must be at least 2 to fit a line".into(),
            ));
        }
        for (name, value) in [
            ("insights.warning_ratio", self.insights.warning_ratio),
            (
                "insights.suggestion_threshold",
                self.insights.suggestion_threshold,
            ),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a non-negative number",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config {}: {}", path.display(), e))
    })
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("spendcast").join("config").join("forecast.toml"))
}

/// Default directory for the local artifact backend
pub fn default_artifact_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spendcast")
        .join("models")
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    training: Option<RawTraining>,
    insights: Option<RawInsights>,
    store: Option<RawStore>,
}

#[derive(Debug, Deserialize)]
struct RawTraining {
    window_days: Option<u32>,
    min_expenses: Option<usize>,
    min_incomes: Option<usize>,
    min_samples: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawInsights {
    warning_ratio: Option<f64>,
    suggestion_threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawStore {
    backend: Option<String>,
    dir: Option<PathBuf>,
}
