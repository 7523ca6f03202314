use std::path::PathBuf;

use thiserror::Error;

use crate::types::FailureKind;

/// Failure of one stage of the assessment pipeline
///
/// The carried message is diagnostic detail for the operational log; it is
/// never returned to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssessmentError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Output parse failed: {0}")]
    Parse(String),
}

impl AssessmentError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AssessmentError::Auth(_) => FailureKind::Auth,
            AssessmentError::Inference(_) => FailureKind::Inference,
            AssessmentError::Parse(_) => FailureKind::Parse,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

pub type AssessmentResult<T> = std::result::Result<T, AssessmentError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
