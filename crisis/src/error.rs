use std::time::Duration;

use crate::team::Team;

/// A team's policy produced nothing usable this tick. Never fatal.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("policy for {team} timed out after {timeout:?}")]
    Timeout { team: Team, timeout: Duration },
    #[error("policy for {team} failed: {reason}")]
    Failed { team: Team, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("message is empty")]
    Empty,
    #[error("message has {chars} characters, limit is {max}")]
    TooLong { chars: usize, max: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
