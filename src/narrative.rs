//! Two-stage marketing narrative generation.
//!
//! Stage one describes the uploaded product photos, stage two writes the
//! voice-over script from that description. Stage two degrades in steps:
//! rich prompt, then a shorter stricter prompt, then a static narrative.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::credentials::Credential;
use crate::encoder::{encode, SourceAsset};
use crate::error::{GenerationError, Result};
use crate::gemini::{ClientFactory, ContentRequest, GeminiResponse, GenerationControls, GenerativeBackend};
use crate::models::{Narrative, NarrativeLength, NarrativeOptions, NarrativeTone};
use crate::presets::find_voice_over_style;
use crate::prompt::PromptPart;

pub const MAX_NARRATIVE_IMAGES: usize = 5;

pub const FALLBACK_NARRATIVE: &str = "Discover a product designed to fit seamlessly into your everyday life. \
Thoughtfully crafted with quality materials and attention to detail, it brings together comfort, style and reliability. \
Whether at home, at work or on the go, it is made to be enjoyed every day. Try it today and feel the difference for yourself.";

const ANALYSIS_INSTRUCTION: &str = "Analyze the product shown in these images for a marketing copywriter. \
Describe the product type, materials, colors, notable design details, likely use cases and the overall mood it conveys. \
Answer in one concise paragraph of plain text.";

impl NarrativeLength {
    fn word_range(self) -> (usize, usize) {
        match self {
            NarrativeLength::Short => (50, 100),
            NarrativeLength::Medium => (100, 200),
            NarrativeLength::Long => (200, 300),
        }
    }

    fn max_output_tokens(self) -> u32 {
        match self {
            NarrativeLength::Short => 300,
            NarrativeLength::Medium => 600,
            NarrativeLength::Long => 900,
        }
    }
}

impl NarrativeTone {
    fn describe(self) -> &'static str {
        match self {
            NarrativeTone::Friendly => "warm and friendly",
            NarrativeTone::Professional => "polished and professional",
            NarrativeTone::Casual => "relaxed and conversational",
            NarrativeTone::Luxury => "elegant and exclusive",
        }
    }
}

/// Style direction for stage two: a catalogue style when `style_id` is set, otherwise the free-text prompt.
pub fn style_direction(options: &NarrativeOptions) -> Result<String> {
    if let Some(id) = options.style_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        return find_voice_over_style(id)
            .map(|s| s.prompt.to_string())
            .ok_or_else(|| GenerationError::InvalidRequest(format!("unknown voice-over style '{}'", id)));
    }
    let prompt = options.style_prompt.trim();
    if prompt.is_empty() {
        return Err(GenerationError::InvalidRequest("a narrative style is required".into()));
    }
    Ok(prompt.to_string())
}

pub fn rich_prompt(description: &str, style: &str, options: &NarrativeOptions) -> String {
    let (min, max) = options.length.word_range();
    let custom = options
        .custom_prompt
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| format!(" Additional direction: {}.", c))
        .unwrap_or_default();
    format!(
        "You are an experienced advertising copywriter. {}. \
Write a voice-over narrative of {}-{} words for {} in a {} tone, based on this product description: {}.{} \
Use flowing spoken sentences only: no headings, no bullet points, no stage directions, no quotation marks.",
        style,
        min,
        max,
        options.target_audience.trim(),
        options.tone.describe(),
        description.trim(),
        custom,
    )
}

pub fn simplified_prompt(description: &str, options: &NarrativeOptions) -> String {
    format!(
        "Write a short product voice-over of at most 60 words in a {} tone. Product: {}. Plain sentences only.",
        options.tone.describe(),
        description.trim(),
    )
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Text of a stage-two response, or `None` when it is missing, cut off by the
/// token limit, or too short to be a narrative.
fn usable_text(response: &GeminiResponse, min_words: usize) -> Option<String> {
    if response.finish_reason() == Some("MAX_TOKENS") {
        return None;
    }
    response.text().filter(|t| word_count(t) >= min_words)
}

pub struct NarrativeGenerator {
    factory: Arc<dyn ClientFactory>,
    model: String,
}

impl NarrativeGenerator {
    pub fn new(factory: Arc<dyn ClientFactory>, model: impl Into<String>) -> Self {
        Self { factory, model: model.into() }
    }

    pub async fn generate(&self, credential: Option<&Credential>, images: &[SourceAsset], options: &NarrativeOptions) -> Result<Narrative> {
        let credential = credential.ok_or(GenerationError::MissingCredential)?;
        if images.is_empty() || images.len() > MAX_NARRATIVE_IMAGES {
            return Err(GenerationError::InvalidRequest(format!(
                "upload between 1 and {} product images",
                MAX_NARRATIVE_IMAGES
            )));
        }
        let style = style_direction(options)?;

        let mut parts = images
            .iter()
            .map(|img| encode(img).map(PromptPart::Image))
            .collect::<Result<Vec<_>>>()?;
        parts.push(PromptPart::Text(ANALYSIS_INSTRUCTION.to_string()));

        let client = self.factory.client(credential);
        info!("🔎 Analyzing {} product image(s)", images.len());
        let description = self.analyze(client.as_ref(), &parts).await?;
        info!("✅ Analysis complete ({} chars)", description.len());

        let (text, fallback) = self.write_narrative(client.as_ref(), &description, &style, options).await?;
        Ok(Narrative { id: Uuid::new_v4(), description, text, fallback, created_at: Utc::now() })
    }

    async fn analyze(&self, client: &dyn GenerativeBackend, parts: &[PromptPart]) -> Result<String> {
        let request = ContentRequest::from_parts(
            parts,
            Some(GenerationControls { temperature: Some(0.4), max_output_tokens: Some(512), ..Default::default() }),
        );
        let response = client.generate_content(&self.model, &request).await.map_err(|e| {
            error!("❌ Image analysis failed: {}", e);
            GenerationError::from(e)
        })?;
        response
            .text()
            .ok_or_else(|| GenerationError::MalformedUpstreamResponse("image analysis returned no text".into()))
    }

    async fn write_narrative(
        &self,
        client: &dyn GenerativeBackend,
        description: &str,
        style: &str,
        options: &NarrativeOptions,
    ) -> Result<(String, bool)> {
        let (min, _) = options.length.word_range();
        let attempts = [
            (
                "rich",
                rich_prompt(description, style, options),
                GenerationControls {
                    temperature: Some(0.8),
                    top_k: Some(40),
                    top_p: Some(0.95),
                    max_output_tokens: Some(options.length.max_output_tokens()),
                    ..Default::default()
                },
                min / 2,
            ),
            (
                "simplified",
                simplified_prompt(description, options),
                GenerationControls {
                    temperature: Some(0.6),
                    top_k: Some(40),
                    top_p: Some(0.9),
                    max_output_tokens: Some(200),
                    ..Default::default()
                },
                15,
            ),
        ];

        for (label, prompt, controls, min_words) in attempts {
            match client.generate_content(&self.model, &ContentRequest::text(&prompt, controls)).await {
                Ok(response) => match usable_text(&response, min_words) {
                    Some(text) => {
                        info!("✅ Narrative generated with {} prompt ({} words)", label, word_count(&text));
                        return Ok((text, false));
                    }
                    None => warn!(
                        "⚠️ {} narrative unusable (finish_reason={:?}), degrading",
                        label,
                        response.finish_reason()
                    ),
                },
                Err(err) if err.is_credential_rejection() => return Err(GenerationError::InvalidCredential),
                Err(err) => warn!("⚠️ {} narrative request failed: {}", label, err),
            }
        }

        warn!("🔄 Falling back to static narrative");
        Ok((FALLBACK_NARRATIVE.to_string(), true))
    }
}
