//! Two-stage enhancement pipeline: analyze the photo, then (best-effort) synthesize
//! the edited image, then assemble the before/after payload.

use crate::config::PlanDefaults;
use crate::models::{EditPlan, EnhancementRequest, EnhancementResult};
use crate::prompt::prompt_for;
use crate::provider::{AiProvider, ProviderError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("request has no image reference")]
    MissingImageUrl,
    #[error("image rejected by analysis: {reason}")]
    Rejected { reason: String },
    #[error("analysis stage failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Result of the image-generation stage.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// Data URI of the synthesized image.
    Generated(String),
    Failed(String),
}

impl GenerationOutcome {
    fn from_provider(result: Result<Option<String>, ProviderError>) -> Self {
        match result {
            Ok(Some(b64)) => Self::Generated(png_data_uri(&b64)),
            Ok(None) => Self::Failed("no image data in response".to_string()),
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

pub fn png_data_uri(b64: &str) -> String {
    format!("data:image/png;base64,{b64}")
}

#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn AiProvider>,
    defaults: PlanDefaults,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn AiProvider>, defaults: PlanDefaults) -> Self {
        Self { provider, defaults }
    }

    pub async fn enhance(&self, request: EnhancementRequest) -> Result<EnhancementResult, EnhanceError> {
        let image_url = request.image_url.clone().ok_or(EnhanceError::MissingImageUrl)?;

        let plan = self.analyze(&request, &image_url).await?;
        if !plan.valid_image {
            let reason = plan.reason.unwrap_or_else(|| self.defaults.rejection_reason.clone());
            info!("🚫 Image rejected by analysis: {}", reason);
            return Err(EnhanceError::Rejected { reason });
        }

        let outcome = self.generate(&plan).await;
        Ok(assemble(request, image_url, plan, outcome))
    }

    async fn analyze(&self, request: &EnhancementRequest, image_url: &str) -> Result<EditPlan, ProviderError> {
        let instruction = prompt_for(request);
        info!("🎯 Analyzing image (action '{}')", request.action());
        let raw = self.provider.analyze(&instruction, image_url).await?;
        let plan = EditPlan::parse(&raw);
        if plan == EditPlan::malformed() {
            warn!("⚠️ Analysis output was not valid JSON: {}", raw);
        }
        Ok(plan)
    }

    async fn generate(&self, plan: &EditPlan) -> GenerationOutcome {
        let prompt = plan.image_prompt.as_deref().unwrap_or(&self.defaults.fallback_prompt);
        info!("🎨 Generating image with prompt: {}", prompt);
        let outcome = GenerationOutcome::from_provider(self.provider.generate_image(prompt).await);
        match &outcome {
            GenerationOutcome::Generated(_) => info!("✅ Image generated"),
            GenerationOutcome::Failed(reason) => {
                warn!("❌ Image generation failed, returning original image: {}", reason)
            }
        }
        outcome
    }
}

/// Merge request pass-through fields, plan text and the generation outcome.
pub fn assemble(
    request: EnhancementRequest,
    before_img: String,
    plan: EditPlan,
    outcome: GenerationOutcome,
) -> EnhancementResult {
    let after_img = match outcome {
        GenerationOutcome::Generated(uri) => uri,
        GenerationOutcome::Failed(_) => before_img.clone(),
    };
    EnhancementResult {
        before_img,
        after_img,
        product_title: request.product_title,
        product_price: request.product_price,
        product_id: request.product_id,
        scene_type: plan.scene_type.unwrap_or_default(),
        edit_summary: plan.edit_summary.unwrap_or_default(),
        placement_instructions: plan.placement_instructions.unwrap_or_default(),
        lighting_instructions: plan.lighting_instructions.unwrap_or_default(),
        extra_improvements: plan.extra_improvements.unwrap_or_default(),
    }
}
