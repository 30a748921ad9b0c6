use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::encoder::SourceAsset;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Lookbook,
    Broll,
    ProfilePicture,
    VirtualTryOn,
    SkincareApplication,
    HouseholdProducts,
    MotorcycleProducts,
    CustomizeTheme,
}

impl GenerationMode {
    /// Whether the mode merges a separate subject/face photo with the product.
    pub fn needs_subject(self) -> bool {
        !matches!(self, GenerationMode::Broll | GenerationMode::ProfilePicture)
    }
}

/// Where the scene comes from: a free-text theme + lighting pair, a catalogue preset, or an ad-hoc preset.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StyleDescriptor {
    ThemeLighting { theme: String, lighting: String },
    Preset { id: String },
    Custom { name: String, prompt: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FaceQuality {
    #[default]
    High,
    Medium,
    Balanced,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct QualityFlags {
    #[serde(default = "default_true")]
    pub face_consistency: bool,
    #[serde(default)]
    pub face_quality: FaceQuality,
}

fn default_true() -> bool { true }

impl Default for QualityFlags {
    fn default() -> Self {
        Self { face_consistency: true, face_quality: FaceQuality::High }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender { Female, Male }

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShotType { Face, UpperBody, FullBody, Random }

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStyle { MixedStyles, Professional, Casual, HighFashion }

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ProfileOptions {
    pub gender: Gender,
    pub shot_type: ShotType,
    pub style: ProfileStyle,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self { gender: Gender::Female, shot_type: ShotType::UpperBody, style: ProfileStyle::MixedStyles }
    }
}

/// JSON part of a generation upload; the images travel as separate multipart fields.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationOptions {
    pub mode: GenerationMode,
    /// Optional for the product-category modes, which default to their first preset.
    #[serde(default)]
    pub style: Option<StyleDescriptor>,
    #[serde(default)]
    pub variant_count: Option<usize>,
    #[serde(default)]
    pub quality: QualityFlags,
    #[serde(default)]
    pub profile: Option<ProfileOptions>,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    pub primary_asset: SourceAsset,
    pub secondary_asset: Option<SourceAsset>,
    pub style: Option<StyleDescriptor>,
    pub variant_count: usize,
    pub quality: QualityFlags,
    pub profile: Option<ProfileOptions>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VideoState {
    #[default]
    Idle,
    Pending,
    Completed { data: String },
    Failed { message: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneratedAsset {
    pub id: String,
    pub variant: usize,
    /// `data:` URL of the produced image.
    pub image_data: String,
    /// First characters of the prompt sent upstream, for display only.
    pub prompt_echo: String,
    pub favorite: bool,
    #[serde(default)]
    pub video: VideoState,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenerationBatch {
    pub id: Uuid,
    pub mode: GenerationMode,
    pub assets: Vec<GeneratedAsset>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeLength {
    Short,
    #[default]
    Medium,
    Long,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeTone {
    #[default]
    Friendly,
    Professional,
    Casual,
    Luxury,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NarrativeOptions {
    /// Id from the voice-over style catalogue; wins over `style_prompt`.
    #[serde(default)]
    pub style_id: Option<String>,
    #[serde(default)]
    pub style_prompt: String,
    #[serde(default)]
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub length: NarrativeLength,
    #[serde(default = "default_audience")]
    pub target_audience: String,
    #[serde(default)]
    pub tone: NarrativeTone,
}

fn default_audience() -> String { "general audience".to_string() }

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Narrative {
    pub id: Uuid,
    pub description: String,
    pub text: String,
    /// True when both model attempts failed and the static narrative was used.
    pub fallback: bool,
    pub created_at: DateTime<Utc>,
}
