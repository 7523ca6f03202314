//! Type definitions for the gateway HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use overwatch_common::{AssessmentRequest, Tier, Verdict};

/// Response header naming where the returned verdict came from
pub const VERDICT_SOURCE_HEADER: &str = "x-verdict-source";

/// Request correlation header set by the logging middleware
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Health status
    pub status: String,

    /// Gateway version
    pub version: String,

    /// Timestamp of health check
    pub timestamp: DateTime<Utc>,
}

/// Error response for requests that never reach the assessment pipeline
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Optional error code
    pub code: Option<String>,

    /// Timestamp of error
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: Some(code.to_string()),
            timestamp: Utc::now(),
        }
    }
}
