use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use parking_lot::RwLock;
use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::{
    config::StudioConfig,
    credentials::{Credential, CredentialProvider},
    encoder::SourceAsset,
    error::{ErrorDetail, ErrorResponse, GenerationError},
    gallery::{Gallery, GalleryView},
    gemini::ClientFactory,
    models::{GeneratedAsset, GenerationOptions, GenerationRequest, Narrative, NarrativeOptions, VideoState},
    narrative::NarrativeGenerator,
    orchestrator::Orchestrator,
    presets::{catalogue, Catalogue},
    video::VideoProcessor,
};

pub const API_KEY_HEADER: &str = "x-api-key";
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<HashMap<Uuid, Gallery>>>,
    pub credentials: Arc<CredentialProvider>,
    pub orchestrator: Arc<Orchestrator>,
    pub video: Arc<VideoProcessor>,
    pub narratives: Arc<NarrativeGenerator>,
    pub history_limit: usize,
}

impl AppState {
    pub fn new(config: &StudioConfig, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            store: Arc::default(),
            credentials: Arc::new(CredentialProvider::new(config.default_api_key.clone())),
            orchestrator: Arc::new(Orchestrator::new(factory.clone(), config.models.image.clone(), config.generation.clone())),
            video: Arc::new(VideoProcessor::new(factory.clone(), config.models.video.clone(), config.video.clone())),
            narratives: Arc::new(NarrativeGenerator::new(factory, config.models.text.clone())),
            history_limit: config.history_limit,
        }
    }

    fn credential(&self, headers: &HeaderMap) -> Option<Credential> {
        self.credentials.resolve(headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/presets", get(presets))
        .route("/api/galleries", post(create_gallery))
        .route("/api/galleries/:id", get(get_gallery))
        .route("/api/galleries/:id/favorites", get(get_favorites))
        .route("/api/galleries/:id/generate", post(generate_batch))
        .route("/api/galleries/:id/more", post(generate_more))
        .route("/api/galleries/:id/assets/:asset_id/favorite", post(toggle_favorite))
        .route("/api/galleries/:id/assets/:asset_id", delete(remove_asset))
        .route("/api/galleries/:id/assets/:asset_id/video", post(start_video))
        .route("/api/galleries/:id/history/:index/restore", post(restore_batch))
        .route("/api/narratives", post(generate_narrative))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

pub enum ApiError {
    NotFound(&'static str),
    Generation(GenerationError),
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        ApiError::Generation(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(what) => {
                let body = ErrorResponse {
                    error: ErrorDetail {
                        message: format!("{} not found", what),
                        r#type: "not_found_error".into(),
                        code: "not_found".into(),
                    },
                };
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
            ApiError::Generation(err) => {
                tracing::warn!(code = err.code(), "⚠️ Request failed: {}", err);
                err.into_response()
            }
        }
    }
}

fn invalid(msg: impl Into<String>) -> ApiError {
    ApiError::Generation(GenerationError::InvalidRequest(msg.into()))
}

#[derive(Default)]
struct Upload {
    files: HashMap<String, Vec<SourceAsset>>,
    options: Option<String>,
}

impl Upload {
    fn take_first(&mut self, names: &[&str]) -> Option<SourceAsset> {
        names.iter().find_map(|n| self.files.get_mut(*n).filter(|v| !v.is_empty()).map(|v| v.remove(0)))
    }

    fn options<T: serde::de::DeserializeOwned>(&self) -> Result<T, ApiError> {
        let raw = self.options.as_deref().ok_or_else(|| invalid("missing 'options' field"))?;
        serde_json::from_str(raw).map_err(|e| invalid(format!("bad options: {}", e)))
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut upload = Upload::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| invalid(e.to_string()))? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "options" {
            upload.options = Some(field.text().await.map_err(|e| invalid(e.to_string()))?);
            continue;
        }
        let mime = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| invalid(e.to_string()))?;
        upload.files.entry(name).or_default().push(SourceAsset::new(bytes, mime));
    }
    Ok(upload)
}

fn generation_request(state: &AppState, mut upload: Upload) -> Result<GenerationRequest, ApiError> {
    let options: GenerationOptions = upload.options()?;
    let primary_asset = upload
        .take_first(&["product", "photo"])
        .ok_or_else(|| invalid("a product image is required"))?;
    Ok(GenerationRequest {
        mode: options.mode,
        primary_asset,
        secondary_asset: upload.take_first(&["model"]),
        style: options.style,
        variant_count: state.orchestrator.variant_count(options.variant_count),
        quality: options.quality,
        profile: options.profile,
    })
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn presets() -> Json<Catalogue> {
    Json(catalogue())
}

pub async fn create_gallery(State(state): State<AppState>) -> (StatusCode, Json<GalleryView>) {
    let id = Uuid::new_v4();
    let gallery = Gallery::new(state.history_limit);
    let view = gallery.view(id);
    state.store.write().insert(id, gallery);
    tracing::info!("🖼️ Created gallery {}", id);
    (StatusCode::CREATED, Json(view))
}

pub async fn get_gallery(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<GalleryView>, ApiError> {
    let store = state.store.read();
    let gallery = store.get(&id).ok_or(ApiError::NotFound("gallery"))?;
    Ok(Json(gallery.view(id)))
}

pub async fn get_favorites(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<Vec<GeneratedAsset>>, ApiError> {
    let store = state.store.read();
    let gallery = store.get(&id).ok_or(ApiError::NotFound("gallery"))?;
    Ok(Json(gallery.favorites().into_iter().cloned().collect()))
}

pub async fn generate_batch(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<GalleryView>, ApiError> {
    let request = generation_request(&state, read_upload(multipart).await?)?;
    let ticket = {
        let mut store = state.store.write();
        store.get_mut(&id).ok_or(ApiError::NotFound("gallery"))?.begin_generation()
    };

    let credential = state.credential(&headers);
    let batch = state.orchestrator.generate(credential.as_ref(), &request).await?;

    let mut store = state.store.write();
    let gallery = store.get_mut(&id).ok_or(ApiError::NotFound("gallery"))?;
    if !gallery.commit_batch(ticket, batch) {
        tracing::warn!("⚠️ Dropping stale batch for gallery {}", id);
    }
    Ok(Json(gallery.view(id)))
}

pub async fn generate_more(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<GalleryView>, ApiError> {
    let request = generation_request(&state, read_upload(multipart).await?)?;
    let ticket = {
        let store = state.store.read();
        store.get(&id).ok_or(ApiError::NotFound("gallery"))?.current_ticket()
    };

    let credential = state.credential(&headers);
    let batch = state.orchestrator.generate(credential.as_ref(), &request).await?;

    let mut store = state.store.write();
    let gallery = store.get_mut(&id).ok_or(ApiError::NotFound("gallery"))?;
    if !gallery.commit_more(ticket, batch) {
        tracing::warn!("⚠️ Dropping stale 'more' results for gallery {}", id);
    }
    Ok(Json(gallery.view(id)))
}

pub async fn toggle_favorite(
    Path((id, asset_id)): Path<(Uuid, String)>,
    State(state): State<AppState>,
) -> Result<Json<GalleryView>, ApiError> {
    let mut store = state.store.write();
    let gallery = store.get_mut(&id).ok_or(ApiError::NotFound("gallery"))?;
    gallery.toggle_favorite(&asset_id);
    Ok(Json(gallery.view(id)))
}

pub async fn remove_asset(
    Path((id, asset_id)): Path<(Uuid, String)>,
    State(state): State<AppState>,
) -> Result<Json<GalleryView>, ApiError> {
    let mut store = state.store.write();
    let gallery = store.get_mut(&id).ok_or(ApiError::NotFound("gallery"))?;
    gallery.remove(&asset_id);
    Ok(Json(gallery.view(id)))
}

pub async fn restore_batch(
    Path((id, index)): Path<(Uuid, usize)>,
    State(state): State<AppState>,
) -> Result<Json<GalleryView>, ApiError> {
    let mut store = state.store.write();
    let gallery = store.get_mut(&id).ok_or(ApiError::NotFound("gallery"))?;
    gallery.restore_batch(index);
    Ok(Json(gallery.view(id)))
}

pub async fn start_video(
    Path((id, asset_id)): Path<(Uuid, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<VideoState>), ApiError> {
    let credential = state.credential(&headers).ok_or(GenerationError::MissingCredential)?;
    let (image, echo) = {
        let mut store = state.store.write();
        let gallery = store.get_mut(&id).ok_or(ApiError::NotFound("gallery"))?;
        let asset = gallery.asset(&asset_id).ok_or(ApiError::NotFound("asset"))?;
        let source = (asset.image_data.clone(), asset.prompt_echo.clone());
        if !gallery.begin_video(&asset_id) {
            tracing::info!("Video for {} already pending", asset_id);
            return Ok((StatusCode::ACCEPTED, Json(VideoState::Pending)));
        }
        source
    };

    tracing::info!("🎬 Starting video for asset {}", asset_id);
    let worker = state.clone();
    tokio::spawn(async move {
        let result = worker.video.render(Some(&credential), &image, &echo).await.map(|v| v.data_url);
        if let Err(e) = &result {
            tracing::error!(code = e.code(), "❌ Video for {} failed: {}", asset_id, e);
        }
        if let Some(gallery) = worker.store.write().get_mut(&id) {
            gallery.finish_video(&asset_id, result);
        }
    });

    Ok((StatusCode::ACCEPTED, Json(VideoState::Pending)))
}

pub async fn generate_narrative(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<Narrative>, ApiError> {
    let mut upload = read_upload(multipart).await?;
    let options: NarrativeOptions = upload.options()?;
    let images = upload.files.remove("images").unwrap_or_default();

    let credential = state.credential(&headers);
    let narrative = state.narratives.generate(credential.as_ref(), &images, &options).await?;
    Ok(Json(narrative))
}
