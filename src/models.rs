use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_ACTION: &str = "auto";

/// Inbound body of `POST /generate`.
///
/// Only `imageUrl` is required; everything else is optional display or
/// pass-through data. Field names follow the storefront widget's wire format.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EnhancementRequest {
    #[serde(rename = "imageUrl", default, deserialize_with = "image_ref")]
    pub image_url: Option<String>,
    #[serde(rename = "tipoAccion", default, deserialize_with = "lenient_text")]
    pub action: Option<String>,
    #[serde(rename = "ideaCliente", default, deserialize_with = "lenient_text")]
    pub client_idea: Option<String>,
    #[serde(default = "empty_value")]
    pub product_title: Value,
    #[serde(default, deserialize_with = "lenient_text")]
    pub product_category: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub product_style: Option<String>,
    #[serde(default = "empty_value")]
    pub product_id: Value,
    #[serde(default = "empty_value")]
    pub product_price: Value,
}

impl EnhancementRequest {
    pub fn action(&self) -> &str {
        self.action.as_deref().unwrap_or(DEFAULT_ACTION)
    }

    pub fn client_idea(&self) -> &str {
        self.client_idea.as_deref().unwrap_or_default()
    }

    pub fn product_category(&self) -> &str {
        self.product_category.as_deref().unwrap_or_default()
    }

    pub fn product_style(&self) -> &str {
        self.product_style.as_deref().unwrap_or_default()
    }

    /// Title as it should read inside the instruction prompt.
    pub fn product_title_text(&self) -> String {
        value_text(&self.product_title).unwrap_or_default()
    }
}

/// Stage-1 edit plan. Every field is optional because the model output is untrusted.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EditPlan {
    #[serde(default, deserialize_with = "truthy_flag")]
    pub valid_image: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub scene_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub edit_summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub placement_instructions: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub lighting_instructions: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub extra_improvements: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub image_prompt: Option<String>,
}

impl EditPlan {
    pub const INVALID_JSON_REASON: &'static str = "Invalid JSON";

    /// Plan used when stage-1 output cannot be parsed at all.
    pub fn malformed() -> Self {
        Self {
            valid_image: false,
            reason: Some(Self::INVALID_JSON_REASON.to_string()),
            image_prompt: Some(String::new()),
            ..Self::default()
        }
    }

    /// Parse raw stage-1 text. Never fails: unparsable text yields [`EditPlan::malformed`],
    /// and JSON that is not an object yields an empty (invalid) plan.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => Self::deserialize(value).unwrap_or_else(|_| Self::malformed()),
            Ok(_) => Self::default(),
            Err(_) => Self::malformed(),
        }
    }
}

/// Success body of `POST /generate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnhancementResult {
    pub before_img: String,
    pub after_img: String,
    pub product_title: Value,
    pub product_price: Value,
    pub product_id: Value,
    pub scene_type: String,
    pub edit_summary: String,
    pub placement_instructions: String,
    pub lighting_instructions: String,
    pub extra_improvements: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), detail: None }
    }

    pub fn with_detail(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { error: error.into(), detail: Some(detail.into()) }
    }
}

// --- Lenient decoding helpers ---

fn empty_value() -> Value {
    Value::String(String::new())
}

/// Strings as-is, other non-null scalars and containers as compact JSON text.
/// Empty strings and `null` count as absent.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_text(&value))
}

fn image_ref<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// JavaScript truthiness: the model is asked for a boolean but sometimes quotes it.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(truthy(&Value::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn request_defaults_when_fields_absent() {
        let req: EnhancementRequest = serde_json::from_value(json!({ "imageUrl": "https://x/img.jpg" })).unwrap();
        assert_eq!(req.image_url.as_deref(), Some("https://x/img.jpg"));
        assert_eq!(req.action(), "auto");
        assert_eq!(req.client_idea(), "");
        assert_eq!(req.product_id, json!(""));
        assert_eq!(req.product_price, json!(""));
        assert_eq!(req.product_title_text(), "");
    }

    #[test]
    fn request_keeps_whitespace_image_reference() {
        let req: EnhancementRequest = serde_json::from_value(json!({ "imageUrl": " " })).unwrap();
        assert_eq!(req.image_url.as_deref(), Some(" "));
    }

    #[test]
    fn request_treats_empty_or_non_string_image_as_missing() {
        for body in [json!({}), json!({ "imageUrl": "" }), json!({ "imageUrl": null }), json!({ "imageUrl": 42 })] {
            let req: EnhancementRequest = serde_json::from_value(body).unwrap();
            assert_eq!(req.image_url, None);
        }
    }

    #[test]
    fn request_accepts_numbers_in_text_and_passthrough_fields() {
        let req: EnhancementRequest = serde_json::from_value(json!({
            "imageUrl": "data:image/png;base64,AAAA",
            "tipoAccion": 3,
            "product_title": "Sofa",
            "product_id": 1234,
            "product_price": 199.5
        }))
        .unwrap();
        assert_eq!(req.action(), "3");
        assert_eq!(req.product_id, json!(1234));
        assert_eq!(req.product_price, json!(199.5));
        assert_eq!(req.product_title_text(), "Sofa");
    }

    #[test]
    fn plan_parses_full_object() {
        let plan = EditPlan::parse(
            r#"{"valid_image":true,"reason":"","scene_type":"living room","edit_summary":"add sofa",
                "placement_instructions":"left wall","lighting_instructions":"warm",
                "extra_improvements":["declutter","plant"],"image_prompt":"place sofa"}"#,
        );
        assert!(plan.valid_image);
        assert_eq!(plan.reason, None);
        assert_eq!(plan.scene_type.as_deref(), Some("living room"));
        assert_eq!(plan.extra_improvements.as_deref(), Some(r#"["declutter","plant"]"#));
        assert_eq!(plan.image_prompt.as_deref(), Some("place sofa"));
    }

    #[test]
    fn plan_from_garbage_is_malformed() {
        let plan = EditPlan::parse("Sure! Here is your JSON:");
        assert_eq!(plan, EditPlan::malformed());
        assert!(!plan.valid_image);
        assert_eq!(plan.reason.as_deref(), Some("Invalid JSON"));
    }

    #[test]
    fn plan_from_non_object_json_is_invalid_without_reason() {
        for raw in ["[]", "true", "\"ok\"", "{}"] {
            let plan = EditPlan::parse(raw);
            assert!(!plan.valid_image, "{raw}");
            assert_eq!(plan.reason, None, "{raw}");
        }
    }

    #[test]
    fn plan_validity_follows_truthiness() {
        for raw in ["true", "\"true\"", "\"yes\"", "1", "-0.5", "[]", "{}"] {
            let plan = EditPlan::parse(&format!(r#"{{"valid_image":{raw}}}"#));
            assert!(plan.valid_image, "{raw} should be valid");
        }
        for raw in ["false", "0", "0.0", "\"\"", "null"] {
            let plan = EditPlan::parse(&format!(r#"{{"valid_image":{raw}}}"#));
            assert!(!plan.valid_image, "{raw} should be invalid");
        }
        assert!(!EditPlan::parse(r#"{"scene_type":"x"}"#).valid_image);
    }

    #[test]
    fn error_body_omits_missing_detail() {
        assert_eq!(serde_json::to_value(ErrorBody::new("x")).unwrap(), json!({ "error": "x" }));
        assert_eq!(
            serde_json::to_value(ErrorBody::with_detail("x", "y")).unwrap(),
            json!({ "error": "x", "detail": "y" })
        );
    }
}
