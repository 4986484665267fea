use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::hygiene::BadResultTaxonomy;

const DEFAULT_NEVERBOUNCE_URL: &str = "https://api.neverbounce.com/v4/single/check";
const DEFAULT_CHECKPOINT_PATH: &str = "neverbounce_results.csv";
const DEFAULT_BAD_RESULTS: &str = "invalid,disposable,spamtrap,unknown";

/// Distinguishes runtime behavior for different stages of the job.
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

/// Top-level configuration for one invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub database: DatabaseConfig,
    pub verifier: VerifierConfig,
    pub sweep: SweepConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let database = DatabaseConfig {
            url: non_empty_var("DATABASE_URL"),
            host: non_empty_var("DB_HOST"),
            port: parse_var("DB_PORT", 5432u16)?,
            name: non_empty_var("DB_NAME"),
            user: non_empty_var("DB_USER"),
            password: non_empty_var("DB_PASSWORD"),
        };

        let verifier = VerifierConfig {
            api_key: non_empty_var("NEVERBOUNCE_API_KEY"),
            endpoint: env::var("NEVERBOUNCE_URL")
                .unwrap_or_else(|_| DEFAULT_NEVERBOUNCE_URL.to_string()),
            timeout: Duration::from_secs(parse_var("HYGIENE_REQUEST_TIMEOUT_SECS", 10u64)?),
        };

        let sweep = SweepConfig {
            checkpoint_path: PathBuf::from(
                env::var("HYGIENE_CHECKPOINT_PATH")
                    .unwrap_or_else(|_| DEFAULT_CHECKPOINT_PATH.to_string()),
            ),
            min_interval: Duration::from_millis(parse_var("HYGIENE_MIN_INTERVAL_MS", 200u64)?),
            bad_results: BadResultTaxonomy::parse_list(
                &env::var("HYGIENE_BAD_RESULTS").unwrap_or_else(|_| DEFAULT_BAD_RESULTS.to_string()),
            ),
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            database,
            verifier,
            sweep,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Connection settings for the system of record.
///
/// `DATABASE_URL` wins; otherwise a postgres URL is assembled from the
/// individual `DB_*` parts.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: u16,
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl DatabaseConfig {
    pub fn url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let host = self.host.as_deref().ok_or(ConfigError::Missing("DB_HOST"))?;
        let name = self.name.as_deref().ok_or(ConfigError::Missing("DB_NAME"))?;
        let user = self.user.as_deref().ok_or(ConfigError::Missing("DB_USER"))?;
        let password = self
            .password
            .as_deref()
            .ok_or(ConfigError::Missing("DB_PASSWORD"))?;

        Ok(format!(
            "postgres://{user}:{password}@{host}:{port}/{name}",
            port = self.port
        ))
    }
}

// Credentials stay out of debug output.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Settings for the remote verification service.
#[derive(Clone)]
pub struct VerifierConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub timeout: Duration,
}

impl VerifierConfig {
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::Missing("NEVERBOUNCE_API_KEY"))
    }
}

impl fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Controls for the checkpointed sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub checkpoint_path: PathBuf,
    pub min_interval: Duration,
    pub bad_results: BadResultTaxonomy,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{var} must be set"),
            ConfigError::Invalid { var, value } => {
                write!(f, "{var} has an invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn non_empty_var(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(var) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
