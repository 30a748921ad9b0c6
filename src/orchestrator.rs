//! Fan-out of one generation request into independent variant calls.
//!
//! Every variant is its own remote call. Transient failures only cost that
//! variant; a credential rejection anywhere fails the whole batch because
//! every other call with the same key is bound to fail the same way.

use chrono::Utc;
use futures::future::join_all;
use rand::Rng;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::GenerationConfig;
use crate::credentials::Credential;
use crate::encoder::{encode, EncodedAsset};
use crate::error::{GenerationError, Result};
use crate::gemini::{ClientFactory, ContentRequest, GenerationControls, GenerativeBackend};
use crate::models::{GeneratedAsset, GenerationBatch, GenerationRequest, VideoState};
use crate::prompt::{PromptBuilder, PromptPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transient,
    InvalidCredential,
}

/// Per-variant bookkeeping, dropped when the call returns.
#[derive(Debug, Default)]
struct RetryState {
    attempts: u32,
    last_failure: Option<FailureKind>,
}

#[derive(Debug)]
enum VariantOutcome {
    Produced(GeneratedAsset),
    Failed { kind: FailureKind, attempts: u32, reason: String },
}

pub struct Orchestrator {
    factory: Arc<dyn ClientFactory>,
    image_model: String,
    config: GenerationConfig,
}

impl Orchestrator {
    pub fn new(factory: Arc<dyn ClientFactory>, image_model: impl Into<String>, config: GenerationConfig) -> Self {
        Self { factory, image_model: image_model.into(), config }
    }

    /// Requested count (or the default) clamped to `[1, max_variants]`.
    pub fn variant_count(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.config.default_variants)
            .clamp(1, self.config.max_variants.max(1))
    }

    pub async fn generate(&self, credential: Option<&Credential>, request: &GenerationRequest) -> Result<GenerationBatch> {
        let credential = credential.ok_or(GenerationError::MissingCredential)?;

        if request.mode.needs_subject() && request.secondary_asset.is_none() {
            return Err(GenerationError::InvalidRequest(
                "this mode needs both a model photo and a product photo".into(),
            ));
        }

        let total = self.variant_count(Some(request.variant_count));
        let primary = encode(&request.primary_asset)?;
        let secondary: Option<EncodedAsset> = match &request.secondary_asset {
            Some(asset) if request.mode.needs_subject() => Some(encode(asset)?),
            _ => None,
        };
        let builder = PromptBuilder::new(request, total, &primary, secondary.as_ref())?;
        let client = self.factory.client(credential);
        let batch_id = Uuid::new_v4();

        info!(
            "🚀 Generating {} variants (mode={:?}, grammar={:?}, key={})",
            total, request.mode, builder.grammar(), credential.preview()
        );

        let calls = (1..=total).map(|variant| {
            let plan = builder.build(variant);
            self.run_variant(client.as_ref(), plan, batch_id)
        });
        let outcomes = join_all(calls).await;

        let assets = aggregate(outcomes)?;
        info!("✅ Batch {} finished with {}/{} variants", batch_id, assets.len(), total);
        Ok(GenerationBatch { id: batch_id, mode: request.mode, assets, created_at: Utc::now() })
    }

    async fn run_variant(&self, client: &dyn GenerativeBackend, plan: PromptPlan, batch_id: Uuid) -> (usize, VariantOutcome) {
        let variant = plan.variant;
        let request = ContentRequest::from_parts(
            &plan.parts,
            Some(GenerationControls {
                response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
                ..Default::default()
            }),
        );
        let mut state = RetryState::default();
        let max_attempts = self.config.max_attempts.max(1);

        loop {
            state.attempts += 1;
            let reason = match client.generate_content(&self.image_model, &request).await {
                Ok(response) => match response.first_image() {
                    Some(image) => {
                        let asset = GeneratedAsset {
                            id: format!("{}-{}", batch_id, variant),
                            variant,
                            image_data: image.to_data_url(),
                            prompt_echo: plan.echo(),
                            favorite: false,
                            video: VideoState::Idle,
                        };
                        return (variant, VariantOutcome::Produced(asset));
                    }
                    None => "no image data in response".to_string(),
                },
                Err(err) if err.is_credential_rejection() => {
                    error!("❌ Variant {} rejected: credential error: {}", variant, err);
                    state.last_failure = Some(FailureKind::InvalidCredential);
                    return (
                        variant,
                        VariantOutcome::Failed { kind: FailureKind::InvalidCredential, attempts: state.attempts, reason: err.to_string() },
                    );
                }
                Err(err) => err.to_string(),
            };

            state.last_failure = Some(FailureKind::Transient);
            if state.attempts >= max_attempts {
                warn!("⚠️ Variant {} gave up after {} attempts: {}", variant, state.attempts, reason);
                let kind = state.last_failure.unwrap_or(FailureKind::Transient);
                return (variant, VariantOutcome::Failed { kind, attempts: state.attempts, reason });
            }

            let delay = backoff_delay(self.config.retry_backoff, state.attempts);
            warn!("🔄 Variant {} attempt {} failed ({}), retrying in {:?}", variant, state.attempts, reason, delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// `base * 2^(attempt-1)` plus up to 25% jitter.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    let exp = base.saturating_mul(1u32 << attempt.saturating_sub(1).min(6));
    let jitter_ms = rand::thread_rng().gen_range(0..=exp.as_millis() as u64 / 4);
    exp + Duration::from_millis(jitter_ms)
}

fn aggregate(mut outcomes: Vec<(usize, VariantOutcome)>) -> Result<Vec<GeneratedAsset>> {
    let credential_failures = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, VariantOutcome::Failed { kind: FailureKind::InvalidCredential, .. }))
        .count();
    if credential_failures > 0 {
        error!("❌ {} variant(s) reported an invalid API key, failing the batch", credential_failures);
        return Err(GenerationError::InvalidCredential);
    }

    outcomes.sort_by_key(|(variant, _)| *variant);
    let assets: Vec<GeneratedAsset> = outcomes
        .into_iter()
        .filter_map(|(variant, outcome)| match outcome {
            VariantOutcome::Produced(asset) => Some(asset),
            VariantOutcome::Failed { attempts, reason, .. } => {
                info!("Variant {} produced nothing after {} attempt(s): {}", variant, attempts, reason);
                None
            }
        })
        .collect();

    if assets.is_empty() {
        return Err(GenerationError::EmptyResult);
    }
    Ok(assets)
}
