use crate::config::ProviderConfig;
use crate::prompt::ANALYZE_INSTRUCTION;
use crate::provider::{AiProvider, ProviderError};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

const LOG_PREVIEW_CHARS: usize = 50;

// Shorten inline base64 payloads and data URIs so request/response logs stay readable.
fn truncate_base64_in_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                let shortened = match val {
                    Value::String(s) if (key == "b64_json" || key == "url") && s.len() > 100 => Some(preview(s)),
                    _ => None,
                };
                match shortened {
                    Some(s) => *val = Value::String(s),
                    None => truncate_base64_in_json(val),
                }
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_base64_in_json(val);
            }
        }
        _ => {}
    }
}

pub(crate) fn preview(s: &str) -> String {
    match s.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...[{} chars total]", &s[..cut], s.len()),
        None => s.to_string(),
    }
}

fn loggable(value: &Value) -> String {
    let mut value = value.clone();
    truncate_base64_in_json(&mut value);
    value.to_string()
}

fn sniff_image_type(b64: &str) -> &'static str {
    if b64.starts_with("iVBORw0KGgo") {
        "PNG"
    } else if b64.starts_with("/9j/") {
        "JPEG"
    } else if b64.starts_with("UklGR") {
        "WEBP"
    } else {
        "Unknown"
    }
}

/// Client for an OpenAI-compatible API (chat completions + image generations).
pub struct OpenAiClient {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self { client: Client::new(), config }
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ProviderError> {
        let url = format!("{}/{}", self.config.api_base, path);
        info!("🔗 Making request to: {}", url);
        info!("📤 Request body: {}", loggable(body));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!("❌ API Error response: {}", error_body);
            return Err(ProviderError::Status { status: status.as_u16(), body: error_body });
        }

        let parsed: Value = response.json().await.map_err(|e| ProviderError::Decode(e.to_string()))?;
        info!("📥 Raw provider response: {}", loggable(&parsed));
        Ok(parsed)
    }
}

#[async_trait]
impl AiProvider for OpenAiClient {
    async fn analyze(&self, instruction: &str, image_url: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.config.vision_model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": instruction },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": ANALYZE_INSTRUCTION },
                        { "type": "image_url", "image_url": { "url": image_url } }
                    ]
                }
            ]
        });

        let raw = self.post_json("chat/completions", &body).await?;
        let parsed: ChatResponse = serde_json::from_value(raw).map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(first_choice_content(&parsed))
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        let mut body = json!({
            "model": self.config.image_model,
            "prompt": prompt,
            "size": self.config.image_size,
            "n": 1
        });
        // gpt-image models always answer in base64 and reject this field
        if self.config.image_model.starts_with("dall-e") {
            body["response_format"] = json!("b64_json");
        }

        let raw = self.post_json("images/generations", &body).await?;
        let parsed: ImageResponse = serde_json::from_value(raw).map_err(|e| ProviderError::Decode(e.to_string()))?;

        let Some(data) = first_image_b64(&parsed) else {
            warn!("⚠️ No inline image data found in response structure");
            return Ok(None);
        };
        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| ProviderError::Decode(format!("image data is not valid base64: {e}")))?;
        info!("🖼️ Extracted {} image from API response: {}", sniff_image_type(data), preview(data));
        Ok(Some(data.to_string()))
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Message,
}

#[derive(Debug, Deserialize, Default)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
}

fn first_choice_content(resp: &ChatResponse) -> String {
    resp.choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .filter(|content| !content.is_empty())
        .unwrap_or("{}")
        .to_string()
}

fn first_image_b64(resp: &ImageResponse) -> Option<&str> {
    resp.data
        .first()
        .and_then(|d| d.b64_json.as_deref())
        .filter(|data| !data.is_empty())
}
