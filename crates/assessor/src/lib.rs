//! Risk assessment pipeline for the Overwatch gateway
//!
//! A free-text action description is classified by a hosted model:
//!
//! ```text
//! TokenProvider ─▶ build_prompt ─▶ InferenceBackend ─▶ VerdictParser
//!        │                               │                   │
//!        └────────── failure ────────────┴───────────────────┘
//!                              │
//!                        FallbackPolicy
//! ```
//!
//! [`RiskAssessor::assess`] always yields a [`Verdict`]; a failing stage is
//! replaced by the matching degraded verdict of the [`FallbackPolicy`].
//!
//! [`Verdict`]: overwatch_common::Verdict

pub mod inference;
pub mod orchestrator;
pub mod policy;
pub mod prompt;
pub mod token;
pub mod verdict;

pub use inference::{InferenceBackend, WatsonxClient};
pub use orchestrator::RiskAssessor;
pub use policy::FallbackPolicy;
pub use prompt::build_prompt;
pub use token::{AccessToken, CachingTokenProvider, IamTokenProvider, TokenProvider};
pub use verdict::{ClosingBraceRepair, NoRepair, RepairStrategy, VerdictParser};
