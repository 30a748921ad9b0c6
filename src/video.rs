use base64::Engine;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::VideoConfig;
use crate::credentials::Credential;
use crate::encoder::EncodedAsset;
use crate::error::{GenerationError, Result};
use crate::gemini::{ClientFactory, GenerativeBackend, Operation, VideoRequest};

pub fn video_prompt(prompt_echo: &str) -> String {
    format!(
        "Create a video from this exact image by adding natural motion. Keep the exact same appearance, face, product, and composition - do not change anything visually. \
Only add subtle, appropriate motion such as: walking forward, camera pan, product rotation, or gentle movement that fits the scene. Maintain the same framing and distance. \
Create a dynamic, short video clip based on this image. Emphasize a 9:16 vertical aspect ratio, suitable for social media stories. Original prompt for context: {}",
        prompt_echo
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedVideo {
    pub data_url: String,
    /// Polls that reported the job still running.
    pub pending_polls: u32,
}

/// Turns one gallery image into a short clip through a long-running video job.
pub struct VideoProcessor {
    factory: Arc<dyn ClientFactory>,
    model: String,
    config: VideoConfig,
}

impl VideoProcessor {
    pub fn new(factory: Arc<dyn ClientFactory>, model: impl Into<String>, config: VideoConfig) -> Self {
        Self { factory, model: model.into(), config }
    }

    pub async fn render(&self, credential: Option<&Credential>, image_data_url: &str, prompt_echo: &str) -> Result<RenderedVideo> {
        let credential = credential.ok_or(GenerationError::MissingCredential)?;
        let source = EncodedAsset::from_data_url(image_data_url)?;
        let client = self.factory.client(credential);

        let request = VideoRequest::new(video_prompt(prompt_echo), &source);
        let started = client.start_video(&self.model, &request).await?;
        if started.name.is_empty() && !started.done {
            return Err(GenerationError::MalformedUpstreamResponse("video job returned no operation name".into()));
        }

        let (operation, pending_polls) = tokio::time::timeout(self.config.timeout, self.wait(client.as_ref(), started))
            .await
            .map_err(|_| {
                error!("⏱️ Video generation exceeded {:?}", self.config.timeout);
                GenerationError::Timeout(self.config.timeout)
            })??;

        if let Some(err) = operation.error {
            error!("❌ Video generation failed (code {:?}): {}", err.code, err.message);
            return Err(GenerationError::JobFailed(format!("Video generation failed: {}", err.message)));
        }
        let uri = operation.video_uri().ok_or_else(|| {
            GenerationError::MalformedUpstreamResponse("Video generation finished but no download link was found.".into())
        })?;

        let media = client.download(&uri).await?;
        let data = base64::engine::general_purpose::STANDARD.encode(&media.bytes);
        info!("🎬 Video ready after {} pending polls ({} bytes)", pending_polls, media.bytes.len());
        Ok(RenderedVideo { data_url: format!("data:{};base64,{}", media.mime_type, data), pending_polls })
    }

    async fn wait(&self, client: &dyn GenerativeBackend, mut operation: Operation) -> Result<(Operation, u32)> {
        let name = operation.name.clone();
        let mut pending_polls = 0;
        while !operation.done {
            info!("Video generation in progress, checking again in {:?}...", self.config.poll_interval);
            tokio::time::sleep(self.config.poll_interval).await;
            operation = client.poll_operation(&name).await?;
            if !operation.done {
                pending_polls += 1;
            }
        }
        Ok((operation, pending_polls))
    }
}
