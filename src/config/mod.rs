use std::env;
use std::fmt;
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub dataset: DatasetConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let path = match env::var("APP_DATASET") {
            Ok(raw) if raw.trim().is_empty() => return Err(ConfigError::EmptyDatasetPath),
            Ok(raw) => Some(PathBuf::from(raw.trim())),
            Err(_) => None,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            dataset: DatasetConfig { path },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Where the CLI loads its assessment dataset from when no flag is given.
#[derive(Debug, Clone, Default)]
pub struct DatasetConfig {
    pub path: Option<PathBuf>,
}

impl DatasetConfig {
    /// Prefer an explicit override, falling back to the configured path.
    pub fn resolve(&self, explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        explicit
            .or_else(|| self.path.clone())
            .ok_or(ConfigError::MissingDatasetPath)
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    EmptyDatasetPath,
    MissingDatasetPath,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyDatasetPath => write!(f, "APP_DATASET must not be empty when set"),
            ConfigError::MissingDatasetPath => {
                write!(f, "no dataset given: pass --dataset or set APP_DATASET")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
