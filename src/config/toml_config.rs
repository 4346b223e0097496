use crate::core::orchestrator::{NotificationMessages, SubmitOptions};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{PostBoxError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_GRAPHQL_ENDPOINT: &str =
    "https://sevenhills.stepzen.net/api/modest-salamander/__graphql";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub graphql: GraphQlConfig,
    pub submission: Option<SubmissionConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for GraphQlConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GRAPHQL_ENDPOINT.to_string(),
            api_key: None,
            timeout_seconds: None,
            headers: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Per remote call, applied by the orchestrator.
    pub call_timeout_seconds: Option<u64>,
    pub pending_message: Option<String>,
    pub success_message: Option<String>,
    pub failure_message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PostBoxError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${STEPZEN_API_KEY})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PostBoxError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn submit_options(&self) -> SubmitOptions {
        let defaults = NotificationMessages::default();
        let submission = self.submission.clone().unwrap_or_default();

        SubmitOptions {
            call_timeout: self.call_timeout_seconds().map(Duration::from_secs),
            messages: NotificationMessages {
                pending: submission.pending_message.unwrap_or(defaults.pending),
                success: submission.success_message.unwrap_or(defaults.success),
                failure: submission.failure_message.unwrap_or(defaults.failure),
            },
        }
    }

    pub fn verbose(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|logging| logging.verbose)
            .unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|logging| logging.json)
            .unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_url("graphql.endpoint", &self.graphql.endpoint)?;

        if let Some(api_key) = &self.graphql.api_key {
            validate_non_empty_string("graphql.api_key", api_key)?;
            if api_key.contains("${") {
                return Err(PostBoxError::InvalidConfigValueError {
                    field: "graphql.api_key".to_string(),
                    value: api_key.clone(),
                    reason: "Environment variable is not set".to_string(),
                });
            }
        }

        if let Some(timeout) = self.graphql.timeout_seconds {
            validate_positive_number("graphql.timeout_seconds", timeout, 1)?;
        }

        if let Some(timeout) = self
            .submission
            .as_ref()
            .and_then(|submission| submission.call_timeout_seconds)
        {
            validate_positive_number("submission.call_timeout_seconds", timeout, 1)?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn graphql_endpoint(&self) -> &str {
        &self.graphql.endpoint
    }

    fn api_key(&self) -> Option<&str> {
        self.graphql.api_key.as_deref()
    }

    fn request_timeout_seconds(&self) -> Option<u64> {
        self.graphql.timeout_seconds
    }

    fn call_timeout_seconds(&self) -> Option<u64> {
        self.submission
            .as_ref()
            .and_then(|submission| submission.call_timeout_seconds)
    }

    fn extra_headers(&self) -> &HashMap<String, String> {
        &self.graphql.headers
    }
}
