use crate::config::ConfigError;
use crate::hygiene::{OverrideError, PersistenceError};
use crate::telemetry::TelemetryError;
use std::fmt;

/// Errors that end an invocation with a non-zero exit status.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Database(sea_orm::DbErr),
    HttpClient(reqwest::Error),
    Persistence(PersistenceError),
    Override(OverrideError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Database(err) => write!(f, "database connection error: {}", err),
            AppError::HttpClient(err) => write!(f, "http client error: {}", err),
            AppError::Persistence(err) => write!(f, "persistence error: {}", err),
            AppError::Override(err) => write!(f, "override file error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Database(err) => Some(err),
            AppError::HttpClient(err) => Some(err),
            AppError::Persistence(err) => Some(err),
            AppError::Override(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::Database(value)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        Self::HttpClient(value)
    }
}

impl From<PersistenceError> for AppError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<crate::hygiene::CheckpointError> for AppError {
    fn from(value: crate::hygiene::CheckpointError) -> Self {
        Self::Persistence(value.into())
    }
}

impl From<crate::hygiene::DirectoryError> for AppError {
    fn from(value: crate::hygiene::DirectoryError) -> Self {
        Self::Persistence(value.into())
    }
}

impl From<OverrideError> for AppError {
    fn from(value: OverrideError) -> Self {
        Self::Override(value)
    }
}
