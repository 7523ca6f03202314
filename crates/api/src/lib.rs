//! # Overwatch Risk Gateway HTTP API
//!
//! Exposes the risk assessment pipeline over HTTP.
//!
//! ```text
//! ┌─────────────────────┐
//! │   REST Endpoints    │ <- /assess_risk, /health, /api-doc/openapi.json
//! ├─────────────────────┤
//! │  Logging middleware │ <- x-request-id, request/response logging
//! ├─────────────────────┤
//! │    RiskAssessor     │ <- token → prompt → inference → verdict
//! └─────────────────────┘
//! ```
//!
//! `POST /assess_risk` always answers 200 with a verdict once the body has
//! been read as an assessment request. Whether the verdict came from the
//! model or from the fallback policy is reported in `x-verdict-source`.

pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod types;

pub use server::{router, AppState, OverwatchServer};
pub use types::*;
