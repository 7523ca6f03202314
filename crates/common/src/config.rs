use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_IDENTITY_URL: &str = "https://iam.cloud.ibm.com/identity/token";
pub const DEFAULT_INFERENCE_URL: &str =
    "https://us-south.ml.cloud.ibm.com/ml/v1/text/generation?version=2023-05-29";
pub const DEFAULT_MODEL_ID: &str = "ibm/granite-3-8b-instruct";
pub const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

pub const ENV_API_KEY: &str = "IBM_API_KEY";
pub const ENV_PROJECT_ID: &str = "IBM_PROJECT_ID";
pub const ENV_IDENTITY_URL: &str = "OVERWATCH_IDENTITY_URL";
pub const ENV_INFERENCE_URL: &str = "OVERWATCH_INFERENCE_URL";
pub const ENV_MODEL_ID: &str = "OVERWATCH_MODEL_ID";

/// Process-wide gateway configuration, immutable once loaded
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub credentials: Credentials,
    pub identity: IdentityConfig,
    pub inference: InferenceConfig,
    pub verdict: VerdictConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub api_key: String,
    pub project_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Identity-token exchange endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub url: String,
    pub grant_type: String,
    pub timeout_secs: u64,
    /// Reuse tokens until shortly before they expire. Off by default, which
    /// exchanges the API key once per assessment.
    pub cache_tokens: bool,
    pub refresh_margin_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_IDENTITY_URL.to_string(),
            grant_type: APIKEY_GRANT_TYPE.to_string(),
            timeout_secs: 10,
            cache_tokens: false,
            refresh_margin_secs: 60,
        }
    }
}

impl IdentityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.refresh_margin_secs)
    }
}

/// Text-generation endpoint and model
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub url: String,
    pub model_id: String,
    pub timeout_secs: u64,
    pub parameters: GenerationParameters,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_INFERENCE_URL.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            timeout_secs: 30,
            parameters: GenerationParameters::default(),
        }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Generation parameters sent verbatim in the inference request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParameters {
    pub decoding_method: String,
    pub min_new_tokens: u32,
    pub max_new_tokens: u32,
    /// Generation halts at the closing brace of the verdict object.
    pub stop_sequences: Vec<String>,
    pub repetition_penalty: f32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            decoding_method: "greedy".to_string(),
            min_new_tokens: 1,
            max_new_tokens: 100,
            stop_sequences: vec!["}".to_string()],
            repetition_penalty: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerdictConfig {
    pub validation: ValidationMode,
}

/// How a decoded model verdict is checked before it is returned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Score must be within 0-100 and tier must be spelled exactly.
    #[default]
    Strict,
    /// Score is clamped into 0-100 and tier is matched case-insensitively.
    Lenient,
}

impl GatewayConfig {
    /// Parse a TOML document without validating or applying the environment
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load and validate a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let config = Self::read_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Load the optional config file, overlay environment variables and
    /// validate the result. Credentials normally arrive through the
    /// environment, so the file alone need not be complete.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup`; unset or empty values leave the current
    /// setting in place.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get(ENV_API_KEY) {
            self.credentials.api_key = value;
        }
        if let Some(value) = get(ENV_PROJECT_ID) {
            self.credentials.project_id = value;
        }
        if let Some(value) = get(ENV_IDENTITY_URL) {
            self.identity.url = value;
        }
        if let Some(value) = get(ENV_INFERENCE_URL) {
            self.inference.url = value;
        }
        if let Some(value) = get(ENV_MODEL_ID) {
            self.inference.model_id = value;
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.credentials.api_key.trim().is_empty() {
            return Err(ConfigError::invalid(
                "credentials.api_key",
                format!("must be set (or provide {})", ENV_API_KEY),
            ));
        }
        if self.credentials.project_id.trim().is_empty() {
            return Err(ConfigError::invalid(
                "credentials.project_id",
                format!("must be set (or provide {})", ENV_PROJECT_ID),
            ));
        }

        validate_http_url("identity.url", &self.identity.url)?;
        validate_http_url("inference.url", &self.inference.url)?;

        if self.inference.model_id.trim().is_empty() {
            return Err(ConfigError::invalid("inference.model_id", "must not be empty"));
        }
        if self.identity.timeout_secs == 0 {
            return Err(ConfigError::invalid("identity.timeout_secs", "must be greater than 0"));
        }
        if self.inference.timeout_secs == 0 {
            return Err(ConfigError::invalid("inference.timeout_secs", "must be greater than 0"));
        }

        let params = &self.inference.parameters;
        if params.max_new_tokens == 0 {
            return Err(ConfigError::invalid(
                "inference.parameters.max_new_tokens",
                "must be greater than 0",
            ));
        }
        if params.min_new_tokens > params.max_new_tokens {
            return Err(ConfigError::invalid(
                "inference.parameters.min_new_tokens",
                format!(
                    "{} exceeds max_new_tokens {}",
                    params.min_new_tokens, params.max_new_tokens
                ),
            ));
        }
        if !(params.repetition_penalty > 0.0) {
            return Err(ConfigError::invalid(
                "inference.parameters.repetition_penalty",
                format!("must be positive, got {}", params.repetition_penalty),
            ));
        }

        Ok(())
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn validate_http_url(field: &'static str, value: &str) -> ConfigResult<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::invalid(field, format!("invalid URL '{}': {}", value, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::invalid(
            field,
            format!("unsupported scheme '{}', expected http or https", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_hosted_service() {
        let config = GatewayConfig::default();
        assert_eq!(config.identity.url, DEFAULT_IDENTITY_URL);
        assert_eq!(config.inference.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.inference.parameters.stop_sequences, vec!["}".to_string()]);
        assert_eq!(config.inference.parameters.max_new_tokens, 100);
        assert_eq!(config.verdict.validation, ValidationMode::Strict);
        assert!(!config.identity.cache_tokens);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let credentials = Credentials {
            api_key: "super-secret".to_string(),
            project_id: "proj".to_string(),
        };
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("proj"));
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let mut config = GatewayConfig::default();
        config.credentials.project_id = "from-file".to_string();
        config.apply_overrides(|key| match key {
            ENV_API_KEY => Some("key".to_string()),
            ENV_PROJECT_ID => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.credentials.api_key, "key");
        assert_eq!(config.credentials.project_id, "from-file");
    }
}
