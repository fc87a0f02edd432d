//! Log pipeline for the reclassification services.
//!
//! `RUST_LOG` always wins. Without it the configured level is applied
//! globally with hyper internals capped at `warn`, so transition logs stay
//! readable when the workflow crate runs at `debug`.

use std::fmt;

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

#[derive(Debug)]
pub enum TelemetryError {
    Directives { directives: String, source: ParseError },
    Init(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Directives { directives, .. } => {
                write!(f, "cannot parse log directives '{directives}'")
            }
            TelemetryError::Init(err) => write!(f, "tracing subscriber not installed: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Directives { source, .. } => Some(source),
            TelemetryError::Init(err) => Some(&**err),
        }
    }
}

fn default_directives(level: &str) -> String {
    format!("{level},hyper=warn")
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directives = default_directives(&config.log_level);
            EnvFilter::try_new(&directives).map_err(|source| TelemetryError::Directives {
                directives,
                source,
            })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Init)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse_as_a_filter() {
        let directives = default_directives("debug");
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
