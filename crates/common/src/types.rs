use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Coarse-grained action category assigned to a request
///
/// The rubric sent to the model pairs each tier with a score band
/// (SAFE 0-39, WARN 40-79, BLOCK 80-100), but the tier and the score are
/// produced independently and nothing in the gateway ties them together.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Tier {
    Safe,
    Warn,
    Block,
}

/// Normalized risk judgment returned to the caller
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Risk score in the range 0-100
    #[cfg_attr(feature = "openapi", schema(minimum = 0, maximum = 100, example = 5))]
    pub risk_score: u8,

    /// Action tier
    pub tier: Tier,

    /// Short explanation of the judgment
    #[cfg_attr(feature = "openapi", schema(example = "Simple summarization task"))]
    pub reason: String,
}

impl Verdict {
    pub fn new(risk_score: u8, tier: Tier, reason: impl Into<String>) -> Self {
        Self {
            risk_score,
            tier,
            reason: reason.into(),
        }
    }
}

/// Inbound body of `POST /assess_risk`
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    /// Free-text description of the intended operation. Missing or null is
    /// treated as the empty string.
    #[serde(default, deserialize_with = "null_as_empty")]
    #[cfg_attr(feature = "openapi", schema(example = "Please summarize this document"))]
    pub action: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Pipeline stage that failed during an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// Credential exchange did not succeed
    Auth,
    /// The remote model call did not succeed
    Inference,
    /// The model output could not be interpreted as a verdict
    Parse,
}

/// Where a returned verdict came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictSource {
    Model,
    Degraded(FailureKind),
}

impl VerdictSource {
    /// Value carried in the `x-verdict-source` response header
    pub fn header_value(&self) -> &'static str {
        match self {
            VerdictSource::Model => "model",
            VerdictSource::Degraded(FailureKind::Auth) => "degraded-auth",
            VerdictSource::Degraded(FailureKind::Inference) => "degraded-inference",
            VerdictSource::Degraded(FailureKind::Parse) => "degraded-parse",
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, VerdictSource::Degraded(_))
    }
}

/// Verdict together with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub verdict: Verdict,
    pub source: VerdictSource,
}
