use crate::models::EnhancementRequest;

/// User-turn text sent next to the image in stage 1.
pub const ANALYZE_INSTRUCTION: &str = "Analyze this image and return the requested JSON.";

/// Values interpolated into the instruction block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptInput<'a> {
    pub action: &'a str,
    pub client_idea: &'a str,
    pub product_title: &'a str,
    pub product_category: &'a str,
    pub product_style: &'a str,
}

/// Build the stage-1 system instruction.
///
/// Values are interpolated verbatim, without escaping.
pub fn build_prompt(input: PromptInput<'_>) -> String {
    let PromptInput { action, client_idea, product_title, product_category, product_style } = input;
    format!(
        r#"
You are an art director and interior designer specialized in photorealistic visualizations.

Your task:
Analyze the user's image and return a JSON object with detailed instructions on how to integrate the product.

Respond strictly in JSON with this structure:

{{
  "valid_image": true/false,
  "reason": "",
  "scene_type": "",
  "edit_summary": "",
  "placement_instructions": "",
  "lighting_instructions": "",
  "extra_improvements": "",
  "image_prompt": ""
}}

User data:
- actionType: {action}
- clientIdea: {client_idea}
- productTitle: {product_title}
- productCategory: {product_category}
- productStyle: {product_style}
"#
    )
}

/// Convenience wrapper pulling the prompt fields out of a request.
pub fn prompt_for(request: &EnhancementRequest) -> String {
    let title = request.product_title_text();
    build_prompt(PromptInput {
        action: request.action(),
        client_idea: request.client_idea(),
        product_title: &title,
        product_category: request.product_category(),
        product_style: request.product_style(),
    })
}
