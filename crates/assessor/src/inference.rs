//! Text-generation client for the hosted model

use std::time::Duration;

use async_trait::async_trait;
use overwatch_common::{AssessmentError, AssessmentResult, GatewayConfig, GenerationParameters};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::token::AccessToken;

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Run the prompt and return the raw generated text
    async fn infer(&self, token: &AccessToken, prompt: &str) -> AssessmentResult<String>;
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model_id: &'a str,
    project_id: &'a str,
    input: &'a str,
    parameters: &'a GenerationParameters,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    results: Vec<GenerationResult>,
}

#[derive(Debug, Deserialize)]
struct GenerationResult {
    generated_text: String,
}

/// watsonx.ai text-generation client
#[derive(Debug, Clone)]
pub struct WatsonxClient {
    client: Client,
    url: String,
    model_id: String,
    project_id: String,
    parameters: GenerationParameters,
    timeout: Duration,
}

impl WatsonxClient {
    pub fn new(client: Client, config: &GatewayConfig) -> Self {
        Self {
            client,
            url: config.inference.url.clone(),
            model_id: config.inference.model_id.clone(),
            project_id: config.credentials.project_id.clone(),
            parameters: config.inference.parameters.clone(),
            timeout: config.inference.timeout(),
        }
    }
}

#[async_trait]
impl InferenceBackend for WatsonxClient {
    #[instrument(skip(self, token, prompt), fields(model = %self.model_id, prompt_len = prompt.len()))]
    async fn infer(&self, token: &AccessToken, prompt: &str) -> AssessmentResult<String> {
        let body = GenerationRequest {
            model_id: &self.model_id,
            project_id: &self.project_id,
            input: prompt,
            parameters: &self.parameters,
        };

        let response = self
            .client
            .post(&self.url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token.secret())
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Inference request failed");
                AssessmentError::Inference(format!("inference endpoint unreachable: {}", e))
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            warn!(status = %status, body = %body, "Inference endpoint returned an error");
            return Err(AssessmentError::Inference(format!(
                "inference endpoint returned {}",
                status
            )));
        }

        let generation: GenerationResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Inference endpoint returned an unexpected body");
            AssessmentError::Inference(format!("malformed generation response: {}", e))
        })?;

        let text = generation
            .results
            .into_iter()
            .next()
            .map(|result| result.generated_text)
            .ok_or_else(|| {
                warn!("Inference response contained no results");
                AssessmentError::Inference("generation response had no results".to_string())
            })?;

        debug!(generated_text = %text, "Model output received");
        Ok(text)
    }
}
