//! Repair, decode and validation of model output
//!
//! The inference request stops generation at the first `}`, and depending on
//! where the model's tokens fall that brace may or may not be part of the
//! returned text. Parsing therefore runs in three steps:
//!
//! 1. a [`RepairStrategy`] patches known truncation defects,
//! 2. the text is decoded as a JSON object with `risk_score`, `tier`, `reason`,
//! 3. the decoded fields are checked according to the [`ValidationMode`].
//!
//! Any failure is reported as [`AssessmentError::Parse`].

use std::borrow::Cow;
use std::str::FromStr;

use overwatch_common::{AssessmentError, AssessmentResult, Tier, ValidationMode, Verdict};
use serde::Deserialize;
use tracing::debug;

/// Patches raw model output before it is decoded
pub trait RepairStrategy: Send + Sync {
    fn repair<'a>(&self, raw: &'a str) -> Cow<'a, str>;
}

/// Appends one `}` when the trimmed text does not already end with one
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosingBraceRepair;

impl RepairStrategy for ClosingBraceRepair {
    fn repair<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        if raw.trim().ends_with('}') {
            Cow::Borrowed(raw)
        } else {
            Cow::Owned(format!("{}}}", raw))
        }
    }
}

/// Leaves the text untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRepair;

impl RepairStrategy for NoRepair {
    fn repair<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(raw)
    }
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    risk_score: i64,
    tier: String,
    reason: String,
}

pub struct VerdictParser {
    repair: Box<dyn RepairStrategy>,
    mode: ValidationMode,
}

impl VerdictParser {
    pub fn new(mode: ValidationMode) -> Self {
        Self::with_repair(ClosingBraceRepair, mode)
    }

    pub fn with_repair(repair: impl RepairStrategy + 'static, mode: ValidationMode) -> Self {
        Self {
            repair: Box::new(repair),
            mode,
        }
    }

    pub fn parse(&self, raw: &str) -> AssessmentResult<Verdict> {
        let repaired = self.repair.repair(raw);
        if let Cow::Owned(_) = repaired {
            debug!("Appended missing closing brace to model output");
        }

        let decoded: RawVerdict = serde_json::from_str(&repaired)
            .map_err(|e| AssessmentError::Parse(format!("{} in model output {:?}", e, raw)))?;

        self.validate(decoded)
    }

    fn validate(&self, decoded: RawVerdict) -> AssessmentResult<Verdict> {
        let (risk_score, tier) = match self.mode {
            ValidationMode::Strict => {
                let score = u8::try_from(decoded.risk_score)
                    .ok()
                    .filter(|score| *score <= 100)
                    .ok_or_else(|| {
                        AssessmentError::Parse(format!(
                            "risk_score {} outside 0-100",
                            decoded.risk_score
                        ))
                    })?;
                (score, parse_tier(&decoded.tier)?)
            }
            ValidationMode::Lenient => {
                // Clamped to 0..=100, so the cast cannot truncate.
                let score = decoded.risk_score.clamp(0, 100) as u8;
                let tier = parse_tier(&decoded.tier.trim().to_ascii_uppercase())?;
                (score, tier)
            }
        };

        Ok(Verdict {
            risk_score,
            tier,
            reason: decoded.reason,
        })
    }
}

impl Default for VerdictParser {
    fn default() -> Self {
        Self::new(ValidationMode::default())
    }
}

fn parse_tier(value: &str) -> AssessmentResult<Tier> {
    Tier::from_str(value).map_err(|_| AssessmentError::Parse(format!("unknown tier {:?}", value)))
}
