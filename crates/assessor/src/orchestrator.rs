//! Risk assessment pipeline
//!
//! Each call runs token → prompt → inference → parse in sequence. The only
//! state shared between calls is configuration and, when enabled, the token
//! cache.

use std::sync::Arc;

use anyhow::{Context, Result};
use overwatch_common::{Assessment, AssessmentResult, GatewayConfig, Verdict, VerdictSource};
use reqwest::Client;
use tracing::{info, instrument, warn};

use crate::inference::{InferenceBackend, WatsonxClient};
use crate::policy::FallbackPolicy;
use crate::prompt::build_prompt;
use crate::token::{CachingTokenProvider, IamTokenProvider, TokenProvider};
use crate::verdict::VerdictParser;

pub struct RiskAssessor {
    tokens: Arc<dyn TokenProvider>,
    inference: Arc<dyn InferenceBackend>,
    parser: VerdictParser,
    policy: FallbackPolicy,
}

impl RiskAssessor {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        inference: Arc<dyn InferenceBackend>,
        parser: VerdictParser,
    ) -> Self {
        Self {
            tokens,
            inference,
            parser,
            policy: FallbackPolicy::default(),
        }
    }

    /// Wire the hosted-service components described by `config`
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .context("Failed to build HTTP client")?;

        let iam = IamTokenProvider::new(client.clone(), config);
        let tokens: Arc<dyn TokenProvider> = if config.identity.cache_tokens {
            Arc::new(CachingTokenProvider::new(iam, config.identity.refresh_margin()))
        } else {
            Arc::new(iam)
        };
        let inference = Arc::new(WatsonxClient::new(client, config));
        let parser = VerdictParser::new(config.verdict.validation);

        info!(
            identity_url = %config.identity.url,
            inference_url = %config.inference.url,
            model = %config.inference.model_id,
            cache_tokens = config.identity.cache_tokens,
            validation = ?config.verdict.validation,
            "Risk assessor initialized"
        );

        Ok(Self::new(tokens, inference, parser))
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run the pipeline, surfacing the first failing stage
    pub async fn evaluate(&self, action: &str) -> AssessmentResult<Verdict> {
        let token = self.tokens.acquire_token().await?;
        let prompt = build_prompt(action);
        let raw = self.inference.infer(&token, &prompt).await?;
        self.parser.parse(&raw)
    }

    /// Run the pipeline and substitute the policy verdict on failure
    #[instrument(skip(self, action), fields(action_len = action.len()))]
    pub async fn assess_detailed(&self, action: &str) -> Assessment {
        match self.evaluate(action).await {
            Ok(verdict) => {
                info!(
                    tier = %verdict.tier,
                    risk_score = verdict.risk_score,
                    "Model verdict"
                );
                Assessment {
                    verdict,
                    source: VerdictSource::Model,
                }
            }
            Err(err) => {
                let kind = err.kind();
                let verdict = self.policy.verdict_for(kind);
                warn!(
                    failure = %kind,
                    error = %err,
                    tier = %verdict.tier,
                    risk_score = verdict.risk_score,
                    "Returning degraded verdict"
                );
                Assessment {
                    verdict,
                    source: VerdictSource::Degraded(kind),
                }
            }
        }
    }

    /// Never fails; every stage failure becomes a degraded verdict
    pub async fn assess(&self, action: &str) -> Verdict {
        self.assess_detailed(action).await.verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::AccessToken;
    use async_trait::async_trait;
    use overwatch_common::{AssessmentError, FailureKind, Tier, ValidationMode};
    use std::sync::Mutex;

    struct StaticTokens(AssessmentResult<AccessToken>);

    #[async_trait]
    impl TokenProvider for StaticTokens {
        async fn acquire_token(&self) -> AssessmentResult<AccessToken> {
            self.0.clone()
        }
    }

    /// Replies with a fixed result and records the prompts it saw
    struct ScriptedModel {
        reply: AssessmentResult<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(reply: AssessmentResult<String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InferenceBackend for ScriptedModel {
        async fn infer(&self, token: &AccessToken, prompt: &str) -> AssessmentResult<String> {
            assert_eq!(token.secret(), "tok");
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    fn ok_tokens() -> Arc<dyn TokenProvider> {
        Arc::new(StaticTokens(Ok(AccessToken::new("tok", Some(3600)))))
    }

    fn assessor(tokens: Arc<dyn TokenProvider>, model: Arc<ScriptedModel>) -> RiskAssessor {
        RiskAssessor::new(tokens, model, VerdictParser::new(ValidationMode::Strict))
    }

    #[tokio::test]
    async fn test_success_passes_model_verdict_through() {
        let model = ScriptedModel::new(Ok(
            r#"{"risk_score": 5, "tier": "SAFE", "reason": "Simple summarization task"}"#.to_string(),
        ));
        let assessor = assessor(ok_tokens(), model.clone());

        let assessment = assessor.assess_detailed("Please summarize this document").await;

        assert_eq!(
            assessment.verdict,
            Verdict::new(5, Tier::Safe, "Simple summarization task")
        );
        assert_eq!(assessment.source, VerdictSource::Model);
        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Please summarize this document"));
    }

    #[tokio::test]
    async fn test_auth_failure_blocks_without_calling_model() {
        let model = ScriptedModel::new(Ok("{}".to_string()));
        let tokens = Arc::new(StaticTokens(Err(AssessmentError::Auth("401".into()))));
        let assessor = assessor(tokens, model.clone());

        let assessment = assessor.assess_detailed("anything").await;

        assert_eq!(
            assessment.verdict,
            Verdict::new(100, Tier::Block, "System Authentication Failed")
        );
        assert_eq!(assessment.source, VerdictSource::Degraded(FailureKind::Auth));
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inference_failure_warns() {
        let model = ScriptedModel::new(Err(AssessmentError::Inference("503".into())));
        let assessor = assessor(ok_tokens(), model);

        assert_eq!(
            assessor.assess("deploy to prod").await,
            Verdict::new(50, Tier::Warn, "AI Service Unavailable")
        );
    }

    #[tokio::test]
    async fn test_parse_failure_warns() {
        let model = ScriptedModel::new(Ok("Sure! Here is my analysis".to_string()));
        let assessor = assessor(ok_tokens(), model);

        assert_eq!(
            assessor.assess("send an email").await,
            Verdict::new(75, Tier::Warn, "AI Output Parse Error")
        );
    }

    #[tokio::test]
    async fn test_evaluate_exposes_failing_stage() {
        let model = ScriptedModel::new(Ok("not json".to_string()));
        let assessor = assessor(ok_tokens(), model);

        let err = assessor.evaluate("x").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);
    }

    #[tokio::test]
    async fn test_custom_policy_is_applied() {
        let model = ScriptedModel::new(Err(AssessmentError::Inference("timeout".into())));
        let policy = FallbackPolicy {
            inference_failure: Verdict::new(90, Tier::Block, "Model offline"),
            ..FallbackPolicy::default()
        };
        let assessor = assessor(ok_tokens(), model).with_policy(policy);

        assert_eq!(
            assessor.assess("x").await,
            Verdict::new(90, Tier::Block, "Model offline")
        );
    }
}
