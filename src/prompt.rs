//! Prompt construction for every generation mode.
//!
//! One [`PromptBuilder`] is prepared per orchestrator call and asked for a
//! [`PromptPlan`] per variant. The plan holds the ordered parts sent upstream:
//! subject/face image first when present, product image second, instruction
//! text last.

use crate::encoder::EncodedAsset;
use crate::error::{GenerationError, Result};
use crate::models::{
    FaceQuality, Gender, GenerationMode, GenerationRequest, ProfileOptions, ProfileStyle, QualityFlags,
    ShotType, StyleDescriptor,
};
use crate::presets::{feature_strategy, find_preset, variation_focus, FeatureStrategy, FEATURE_STRATEGIES};

/// Characters of prompt text kept on an asset for display.
pub const PROMPT_ECHO_CHARS: usize = 200;

pub const IDENTITY_SOURCE_CLAUSE: &str = "Take the person's identity exclusively from the first input image. \
Take the clothing and product details exclusively from the second input image. \
If the second image also shows a person, completely ignore that person's face, hair and body: they must not appear in the result.";

pub const FACE_PRESERVATION_CLAUSE: &str = "It is absolutely critical that you DO NOT change the model's face, facial features, or identity in any way. \
The face in the output image must be identical to the face in the first input image.";

#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Image(EncodedAsset),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptPlan {
    pub variant: usize,
    pub parts: Vec<PromptPart>,
    pub text: String,
}

impl PromptPlan {
    pub fn echo(&self) -> String {
        truncate_chars(&self.text, PROMPT_ECHO_CHARS)
    }
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Which template a call uses. Chosen once per call from the mode and the uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    CompositeSubject,
    ProductScene,
    Portrait,
}

impl Grammar {
    pub fn select(mode: GenerationMode, has_secondary: bool) -> Self {
        match mode {
            GenerationMode::ProfilePicture => Grammar::Portrait,
            m if m.needs_subject() && has_secondary => Grammar::CompositeSubject,
            _ => Grammar::ProductScene,
        }
    }
}

/// Normalises any style descriptor into one setting string.
///
/// Product-category modes wrap the setting in their own theme and lighting
/// and use their first preset when no style is given.
pub fn setting_description(mode: GenerationMode, style: Option<&StyleDescriptor>) -> Result<String> {
    let strategy = feature_strategy(mode);
    let scene = match style {
        Some(StyleDescriptor::ThemeLighting { theme, lighting }) => {
            return Ok(format!("a \"{}\" photoshoot with \"{}\" lighting", theme.trim(), lighting.trim()));
        }
        Some(StyleDescriptor::Preset { id }) => find_preset(mode, id)
            .map(|p| format!("{} ({})", p.prompt, p.name))
            .ok_or_else(|| GenerationError::InvalidRequest(format!("unknown style preset '{}'", id)))?,
        Some(StyleDescriptor::Custom { name, prompt }) => {
            if prompt.trim().is_empty() {
                return Err(GenerationError::InvalidRequest("custom style prompt is empty".into()));
            }
            format!("{} ({})", prompt.trim(), name.trim())
        }
        None => strategy
            .filter(|f| f.theme.is_some())
            .and_then(|f| f.presets.first())
            .map(|p| format!("{} ({})", p.prompt, p.name))
            .ok_or_else(|| GenerationError::InvalidRequest("a style is required for this mode".into()))?,
    };
    match strategy {
        Some(FeatureStrategy { theme: Some(theme), lighting: Some(lighting), .. }) => {
            Ok(format!("a \"{}\" photoshoot with \"{}\" lighting, featuring: {}", theme, lighting, scene))
        }
        _ => Ok(scene),
    }
}

pub struct PromptBuilder<'a> {
    mode: GenerationMode,
    grammar: Grammar,
    setting: String,
    strategy: &'static FeatureStrategy,
    quality: QualityFlags,
    profile: ProfileOptions,
    total: usize,
    primary: &'a EncodedAsset,
    secondary: Option<&'a EncodedAsset>,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(
        request: &GenerationRequest,
        total: usize,
        primary: &'a EncodedAsset,
        secondary: Option<&'a EncodedAsset>,
    ) -> Result<Self> {
        Ok(Self {
            mode: request.mode,
            grammar: Grammar::select(request.mode, secondary.is_some()),
            setting: setting_description(request.mode, request.style.as_ref())?,
            strategy: feature_strategy(request.mode).unwrap_or(&FEATURE_STRATEGIES[0]),
            quality: request.quality,
            profile: request.profile.unwrap_or_default(),
            total,
            primary,
            secondary,
        })
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    pub fn build(&self, variant: usize) -> PromptPlan {
        let text = match self.grammar {
            Grammar::CompositeSubject => self.composite_text(variant),
            Grammar::ProductScene => self.product_text(variant),
            Grammar::Portrait => self.portrait_text(variant),
        };

        let mut parts = Vec::with_capacity(3);
        if let (Grammar::CompositeSubject, Some(face)) = (self.grammar, self.secondary) {
            parts.push(PromptPart::Image(face.clone()));
        }
        parts.push(PromptPart::Image(self.primary.clone()));
        parts.push(PromptPart::Text(text.clone()));

        PromptPlan { variant, parts, text }
    }

    fn composite_text(&self, variant: usize) -> String {
        let mut sentences = vec![
            format!("Variation {}/{}.", variant, self.total),
            self.strategy.role.to_string(),
            IDENTITY_SOURCE_CLAUSE.to_string(),
        ];
        if self.quality.face_consistency {
            sentences.push(FACE_PRESERVATION_CLAUSE.to_string());
        }
        sentences.push(face_detail(self.quality.face_quality).to_string());
        sentences.push(format!(
            "Equally important, the product from the second image ({}) must remain completely unchanged. Do not alter its color, shape, texture, or any specific details.",
            self.strategy.product_noun
        ));
        sentences.push(format!("The new scene is {}.", self.setting));
        sentences.push(variation_focus(self.mode, variant).to_string());
        sentences.push("Pose the model naturally and dynamically.".to_string());
        sentences.join(" ")
    }

    fn product_text(&self, variant: usize) -> String {
        format!(
            "Variation {}/{}. Act as a professional product photographer. Create a stunning, high-resolution B-roll shot of the product in the image. \
It is crucial that the product itself remains identical to the one in the uploaded image. Do not change its color, design, logos, or any details. \
Your job is to showcase this exact product in a new, creative photographic setting: {}. {} \
Emphasize a cinematic feel with dynamic composition and a shallow depth of field to make the product stand out. The final image must look like a professional advertisement.",
            variant,
            self.total,
            self.setting,
            variation_focus(self.mode, variant),
        )
    }

    fn portrait_text(&self, variant: usize) -> String {
        let gender = match self.profile.gender {
            Gender::Female => "woman",
            Gender::Male => "man",
        };
        format!(
            "Variation {}/{}. Act as a professional portrait photographer. Create a polished profile picture of the {} in the uploaded image. \
The person's face, facial features, and identity must remain identical to the uploaded photo. \
Framing: {}. Style: {}. Setting: {}. {}",
            variant,
            self.total,
            gender,
            shot_framing(self.profile.shot_type, variant),
            profile_style(self.profile.style, variant),
            self.setting,
            variation_focus(self.mode, variant),
        )
    }
}

fn face_detail(quality: FaceQuality) -> &'static str {
    match quality {
        FaceQuality::High => "Render the face with maximum sharpness and fine skin detail.",
        FaceQuality::Medium => "Render the face with clear, natural detail.",
        FaceQuality::Balanced => "Balance facial detail with the overall scene rendering.",
    }
}

fn shot_framing(shot: ShotType, variant: usize) -> &'static str {
    const CYCLE: [ShotType; 3] = [ShotType::Face, ShotType::UpperBody, ShotType::FullBody];
    let resolved = match shot {
        ShotType::Random => CYCLE[variant.saturating_sub(1) % CYCLE.len()],
        fixed => fixed,
    };
    match resolved {
        ShotType::Face => "tight head-and-shoulders close-up",
        ShotType::FullBody => "full-body shot, head to toe",
        _ => "upper-body shot from the waist up",
    }
}

fn profile_style(style: ProfileStyle, variant: usize) -> &'static str {
    const CYCLE: [ProfileStyle; 3] = [ProfileStyle::Professional, ProfileStyle::Casual, ProfileStyle::HighFashion];
    let resolved = match style {
        ProfileStyle::MixedStyles => CYCLE[variant.saturating_sub(1) % CYCLE.len()],
        fixed => fixed,
    };
    match resolved {
        ProfileStyle::Casual => "casual and relaxed, everyday clothing",
        ProfileStyle::HighFashion => "high-fashion editorial with bold styling",
        _ => "professional corporate headshot look",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::SourceAsset;
    use pretty_assertions::assert_eq;

    fn asset(tag: &str) -> EncodedAsset {
        EncodedAsset { mime_type: "image/png".into(), data: tag.into() }
    }

    fn request(mode: GenerationMode, face_consistency: bool) -> GenerationRequest {
        GenerationRequest {
            mode,
            primary_asset: SourceAsset::new(vec![1u8], Some("image/png".into())),
            secondary_asset: None,
            style: Some(StyleDescriptor::ThemeLighting { theme: "Streetwear Drop".into(), lighting: "Neon Backlit Glow".into() }),
            variant_count: 3,
            quality: QualityFlags { face_consistency, face_quality: FaceQuality::High },
            profile: None,
        }
    }

    #[test]
    fn composite_orders_face_then_product_then_text() {
        let (product, face) = (asset("product"), asset("face"));
        let req = request(GenerationMode::Lookbook, true);
        let builder = PromptBuilder::new(&req, 3, &product, Some(&face)).unwrap();
        assert_eq!(builder.grammar(), Grammar::CompositeSubject);

        let plan = builder.build(2);
        assert_eq!(plan.parts.len(), 3);
        assert_eq!(plan.parts[0], PromptPart::Image(face.clone()));
        assert_eq!(plan.parts[1], PromptPart::Image(product.clone()));
        assert!(matches!(&plan.parts[2], PromptPart::Text(t) if t == &plan.text));
        assert!(plan.text.starts_with("Variation 2/3."));
        assert!(plan.text.contains(IDENTITY_SOURCE_CLAUSE));
        assert!(plan.text.contains("\"Streetwear Drop\" photoshoot with \"Neon Backlit Glow\" lighting"));
    }

    #[test]
    fn face_clause_follows_consistency_flag() {
        let (product, face) = (asset("product"), asset("face"));
        let on = request(GenerationMode::Lookbook, true);
        let off = request(GenerationMode::Lookbook, false);

        let with = PromptBuilder::new(&on, 1, &product, Some(&face)).unwrap().build(1);
        let without = PromptBuilder::new(&off, 1, &product, Some(&face)).unwrap().build(1);
        assert!(with.text.contains(FACE_PRESERVATION_CLAUSE));
        assert!(!without.text.contains(FACE_PRESERVATION_CLAUSE));
        assert!(without.text.contains(IDENTITY_SOURCE_CLAUSE));
    }

    #[test]
    fn lookbook_without_face_falls_back_to_product_scene() {
        let product = asset("product");
        let req = request(GenerationMode::Lookbook, true);
        let plan = PromptBuilder::new(&req, 6, &product, None).unwrap().build(6);
        assert_eq!(plan.parts.len(), 2);
        assert!(!plan.text.contains(IDENTITY_SOURCE_CLAUSE));
        assert!(plan.text.contains("Variation 6/6."));
    }

    #[test]
    fn preset_and_theme_normalise_to_a_setting() {
        let preset = setting_description(GenerationMode::Broll, Some(&StyleDescriptor::Preset { id: "calm-water".into() })).unwrap();
        assert!(preset.starts_with("Shallow water surface"));
        let unknown = setting_description(GenerationMode::Broll, Some(&StyleDescriptor::Preset { id: "nope".into() }));
        assert!(matches!(unknown, Err(GenerationError::InvalidRequest(_))));
        let custom = setting_description(
            GenerationMode::Lookbook,
            Some(&StyleDescriptor::Custom { name: "Vintage".into(), prompt: "Vintage retro theme".into() }),
        )
        .unwrap();
        assert_eq!(custom, "Vintage retro theme (Vintage)");
    }

    #[test]
    fn echo_is_cosmetic_truncation() {
        let product = asset("product");
        let req = request(GenerationMode::Broll, true);
        let plan = PromptBuilder::new(&req, 3, &product, None).unwrap().build(1);
        assert!(plan.text.chars().count() > PROMPT_ECHO_CHARS);
        assert_eq!(plan.echo().chars().count(), PROMPT_ECHO_CHARS);
        assert!(plan.text.starts_with(&plan.echo()));
        assert!(matches!(plan.parts.last(), Some(PromptPart::Text(t)) if t.chars().count() > PROMPT_ECHO_CHARS));
    }

    #[test]
    fn random_portrait_options_cycle_by_variant() {
        let photo = asset("me");
        let mut req = request(GenerationMode::ProfilePicture, true);
        req.profile = Some(ProfileOptions { gender: Gender::Male, shot_type: ShotType::Random, style: ProfileStyle::MixedStyles });
        let builder = PromptBuilder::new(&req, 4, &photo, None).unwrap();
        assert_eq!(builder.grammar(), Grammar::Portrait);

        let first = builder.build(1).text;
        let second = builder.build(2).text;
        assert!(first.contains("close-up") && first.contains("corporate"));
        assert!(second.contains("upper-body") && second.contains("casual"));
        let fourth = builder.build(4).text;
        assert!(fourth.contains("close-up") && fourth.contains("corporate"));
    }

    #[test]
    fn category_mode_uses_its_own_strategy() {
        let (product, face) = (asset("serum"), asset("face"));
        let mut req = request(GenerationMode::SkincareApplication, true);
        req.style = Some(StyleDescriptor::Preset { id: "eye-care".into() });
        let builder = PromptBuilder::new(&req, 2, &product, Some(&face)).unwrap();
        assert_eq!(builder.grammar(), Grammar::CompositeSubject);

        let plan = builder.build(1);
        assert_eq!(plan.parts[0], PromptPart::Image(face.clone()));
        assert!(plan.text.contains("beauty campaign photographer"));
        assert!(plan.text.contains("(the skincare product and its packaging)"));
        assert!(plan.text.contains("\"Skincare Application\" photoshoot with \"Natural Soft Lighting\" lighting, featuring: Model applying eye cream"));
        assert!(plan.text.contains(IDENTITY_SOURCE_CLAUSE));
    }

    #[test]
    fn category_mode_defaults_to_first_preset() {
        let setting = setting_description(GenerationMode::MotorcycleProducts, None).unwrap();
        assert!(setting.ends_with("Model riding motorcycle in urban city setting with modern backdrop (Urban Riding)"));
        let missing = setting_description(GenerationMode::Broll, None);
        assert!(matches!(missing, Err(GenerationError::InvalidRequest(_))));
        let lookbook = setting_description(GenerationMode::Lookbook, None);
        assert!(matches!(lookbook, Err(GenerationError::InvalidRequest(_))));
    }
}
