use std::{env, str::FromStr, time::Duration};
use tracing::warn;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub port: u16,
    pub default_api_key: Option<String>,
    pub api_base: String,
    pub http_timeout: Duration,
    pub models: ModelConfig,
    pub generation: GenerationConfig,
    pub video: VideoConfig,
    pub history_limit: usize,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub image: String,
    pub text: String,
    pub video: String,
}

/// Fan-out and retry limits for one orchestrator call.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub max_variants: usize,
    pub default_variants: usize,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct VideoConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            image: "gemini-2.5-flash-image-preview".to_string(),
            text: "gemini-1.5-flash".to_string(),
            video: "veo-2.0-generate-001".to_string(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_variants: 20,
            default_variants: 6,
            max_attempts: 2,
            retry_backoff: Duration::from_millis(750),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            timeout: Duration::from_secs(600),
        }
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            default_api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            http_timeout: Duration::from_secs(120),
            models: ModelConfig::default(),
            generation: GenerationConfig::default(),
            video: VideoConfig::default(),
            history_limit: 10,
        }
    }
}

impl StudioConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let generation = GenerationConfig {
            max_variants: parse_var("STUDIO_MAX_VARIANTS", defaults.generation.max_variants).max(1),
            default_variants: parse_var("STUDIO_DEFAULT_VARIANTS", defaults.generation.default_variants),
            max_attempts: parse_var("STUDIO_MAX_ATTEMPTS", defaults.generation.max_attempts).max(1),
            retry_backoff: Duration::from_millis(parse_var(
                "STUDIO_RETRY_BACKOFF_MS",
                defaults.generation.retry_backoff.as_millis() as u64,
            )),
        };
        let video = VideoConfig {
            poll_interval: Duration::from_secs(parse_var(
                "STUDIO_VIDEO_POLL_SECS",
                defaults.video.poll_interval.as_secs(),
            )),
            timeout: Duration::from_secs(parse_var(
                "STUDIO_VIDEO_TIMEOUT_SECS",
                defaults.video.timeout.as_secs(),
            )),
        };

        Self {
            port: parse_var("PORT", defaults.port),
            default_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            api_base: env::var("GEMINI_API_BASE").unwrap_or(defaults.api_base),
            http_timeout: Duration::from_secs(parse_var(
                "STUDIO_HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )),
            models: ModelConfig {
                image: env::var("STUDIO_IMAGE_MODEL").unwrap_or(defaults.models.image),
                text: env::var("STUDIO_TEXT_MODEL").unwrap_or(defaults.models.text),
                video: env::var("STUDIO_VIDEO_MODEL").unwrap_or(defaults.models.video),
            },
            generation,
            video,
            history_limit: parse_var("STUDIO_HISTORY_LIMIT", defaults.history_limit),
        }
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("⚠️ Ignoring unparseable {}={:?}, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
