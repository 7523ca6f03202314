use overwatch_common::{FailureKind, Tier, Verdict};

/// Degraded verdicts substituted when a pipeline stage fails
///
/// Failures map to cautious tiers, never to SAFE. Losing the ability to
/// consult the model at all is the most severe case and blocks; trouble
/// reaching or reading the model warns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    pub auth_failure: Verdict,
    pub inference_failure: Verdict,
    pub parse_failure: Verdict,
}

impl FallbackPolicy {
    pub fn verdict_for(&self, kind: FailureKind) -> Verdict {
        match kind {
            FailureKind::Auth => self.auth_failure.clone(),
            FailureKind::Inference => self.inference_failure.clone(),
            FailureKind::Parse => self.parse_failure.clone(),
        }
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            auth_failure: Verdict::new(100, Tier::Block, "System Authentication Failed"),
            inference_failure: Verdict::new(50, Tier::Warn, "AI Service Unavailable"),
            parse_failure: Verdict::new(75, Tier::Warn, "AI Output Parse Error"),
        }
    }
}
