//! Process-edge failures for the service binaries.
//!
//! Everything here surfaces before or outside the HTTP layer: rejected
//! configuration, a log pipeline that will not start, socket errors, and
//! workflow failures from offline runs such as the demo. Handler errors
//! are mapped to responses inside the router, not through this type.

use std::fmt;

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::reclassification::WorkflowError;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Workflow(WorkflowError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration rejected: {err}"),
            AppError::Telemetry(err) => write!(f, "logging setup failed: {err}"),
            AppError::Io(err) => write!(f, "socket error: {err}"),
            AppError::Workflow(err) => write!(f, "workflow run failed: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Workflow(err) => Some(err),
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

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<WorkflowError> for AppError {
    fn from(value: WorkflowError) -> Self {
        Self::Workflow(value)
    }
}
