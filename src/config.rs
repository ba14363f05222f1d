use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_REJECTION_REASON: &str = "Rejected by analysis";
pub const DEFAULT_FALLBACK_PROMPT: &str = "Improve the image.";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("PORT must be a valid port number, got {0:?}")]
    InvalidPort(String),
}

/// Settings for the upstream provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub api_base: String,
    pub vision_model: String,
    pub image_model: String,
    pub image_size: String,
}

/// Literals the orchestrator falls back to when the plan leaves a field empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDefaults {
    pub rejection_reason: String,
    pub fallback_prompt: String,
}

impl Default for PlanDefaults {
    fn default() -> Self {
        Self {
            rejection_reason: DEFAULT_REJECTION_REASON.to_string(),
            fallback_prompt: DEFAULT_FALLBACK_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub provider: ProviderConfig,
    pub defaults: PlanDefaults,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::MissingApiKey)?;
        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            provider: ProviderConfig {
                api_key,
                api_base: or("OPENAI_API_BASE", DEFAULT_API_BASE).trim_end_matches('/').to_string(),
                vision_model: or("OPENAI_VISION_MODEL", DEFAULT_VISION_MODEL),
                image_model: or("OPENAI_IMAGE_MODEL", DEFAULT_IMAGE_MODEL),
                image_size: or("OPENAI_IMAGE_SIZE", DEFAULT_IMAGE_SIZE),
            },
            defaults: PlanDefaults {
                rejection_reason: or("ENHANCE_REJECTION_REASON", DEFAULT_REJECTION_REASON),
                fallback_prompt: or("ENHANCE_FALLBACK_PROMPT", DEFAULT_FALLBACK_PROMPT),
            },
        })
    }
}
