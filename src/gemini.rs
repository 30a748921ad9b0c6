use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::credentials::Credential;
use crate::encoder::EncodedAsset;
use crate::error::GenerationError;
use crate::prompt::PromptPart;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeminiError {
    #[error("HTTP error: {0}")] Http(String),
    #[error("status={status} body={body}")] Status { status: u16, body: String },
    #[error("Decode error: {0}")] Decode(String),
}

const CREDENTIAL_SIGNALS: &[&str] = &[
    "API_KEY_INVALID",
    "API key not valid",
    "API key expired",
    "API_KEY_SERVICE_BLOCKED",
    "UNAUTHENTICATED",
];

impl GeminiError {
    /// True when the error says the key itself is bad, as opposed to a service hiccup.
    pub fn is_credential_rejection(&self) -> bool {
        match self {
            GeminiError::Status { status, body } => {
                *status == 401 || *status == 403 || CREDENTIAL_SIGNALS.iter().any(|s| body.contains(s))
            }
            GeminiError::Http(msg) => CREDENTIAL_SIGNALS.iter().any(|s| msg.contains(s)),
            GeminiError::Decode(_) => false,
        }
    }
}

impl From<GeminiError> for GenerationError {
    fn from(err: GeminiError) -> Self {
        if err.is_credential_rejection() {
            return GenerationError::InvalidCredential;
        }
        match err {
            GeminiError::Decode(msg) => GenerationError::MalformedUpstreamResponse(msg),
            other => GenerationError::Transient(other.to_string()),
        }
    }
}

// Shortens base64 payloads in JSON so request/response bodies stay readable in logs
fn truncate_base64_in_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if key == "data" || key == "bytesBase64Encoded" {
                    if let Value::String(s) = val {
                        if s.len() > 100 && s.is_ascii() {
                            *val = Value::String(format!("{}...[truncated {} chars]", &s[..50], s.len() - 50));
                        }
                    }
                } else {
                    truncate_base64_in_json(val);
                }
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_base64_in_json(val);
            }
        }
        _ => {}
    }
}

fn loggable<T: Serialize>(body: &T) -> String {
    match serde_json::to_value(body) {
        Ok(mut value) => {
            truncate_base64_in_json(&mut value);
            value.to_string()
        }
        Err(_) => "<unserializable>".to_string(),
    }
}

// --- Request types ---

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub contents: Vec<RequestContent>,
    pub generation_config: Option<GenerationControls>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RequestContent {
    pub parts: Vec<WirePart>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum WirePart {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text { text: String },
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationControls {
    pub response_modalities: Option<Vec<String>>,
    pub temperature: Option<f32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub candidate_count: Option<u32>,
}

impl ContentRequest {
    pub fn from_parts(parts: &[PromptPart], generation_config: Option<GenerationControls>) -> Self {
        let parts = parts
            .iter()
            .map(|p| match p {
                PromptPart::Image(asset) => WirePart::Inline { inline_data: InlineData::from(asset) },
                PromptPart::Text(text) => WirePart::Text { text: text.clone() },
            })
            .collect();
        Self { contents: vec![RequestContent { parts }], generation_config }
    }

    pub fn text(prompt: &str, generation_config: GenerationControls) -> Self {
        Self::from_parts(&[PromptPart::Text(prompt.to_string())], Some(generation_config))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VideoRequest {
    pub instances: Vec<VideoInstance>,
    pub parameters: VideoParameters,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VideoInstance {
    pub prompt: String,
    pub image: VideoImage,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters {
    pub sample_count: u32,
}

impl VideoRequest {
    pub fn new(prompt: String, image: &EncodedAsset) -> Self {
        Self {
            instances: vec![VideoInstance {
                prompt,
                image: VideoImage { bytes_base64_encoded: image.data.clone(), mime_type: image.mime_type.clone() },
            }],
            parameters: VideoParameters { sample_count: 1 },
        }
    }
}

// --- Response parsing ---

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default, alias = "finish_reason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineData,
    },
    Text { text: String },
    #[allow(dead_code)]
    Other(Value),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InlineData {
    #[serde(rename = "mimeType", alias = "mime_type")]
    pub mime_type: String,
    pub data: String,
}

impl From<&EncodedAsset> for InlineData {
    fn from(asset: &EncodedAsset) -> Self {
        Self { mime_type: asset.mime_type.clone(), data: asset.data.clone() }
    }
}

impl InlineData {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

impl GeminiResponse {
    pub fn from_value(value: Value) -> Result<Self, GeminiError> {
        serde_json::from_value(value).map_err(|e| GeminiError::Decode(e.to_string()))
    }

    pub fn first_image(&self) -> Option<&InlineData> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| match p {
                Part::Inline { inline_data } if !inline_data.data.is_empty() => Some(inline_data),
                _ => None,
            })
    }

    /// Text of the response, tried in order: first candidate's content parts,
    /// a flat top-level `text`, the first candidate's own `text`/`output`, then
    /// the content parts of any later candidate.
    pub fn text(&self) -> Option<String> {
        fn parts_text(candidate: &Candidate) -> Option<String> {
            let joined: String = candidate
                .content
                .as_ref()?
                .parts
                .iter()
                .filter_map(|p| match p {
                    Part::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect();
            non_empty(&joined)
        }

        let first = self.candidates.first();
        first
            .and_then(parts_text)
            .or_else(|| self.text.as_deref().and_then(non_empty))
            .or_else(|| first.and_then(|c| c.text.as_deref().or(c.output.as_deref())).and_then(non_empty))
            .or_else(|| self.candidates.iter().skip(1).find_map(parts_text))
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates.first().and_then(|c| c.finish_reason.as_deref())
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub response: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

impl Operation {
    pub fn video_uri(&self) -> Option<String> {
        let response = self.response.as_ref()?;
        let candidates = [
            response.pointer("/generateVideoResponse/generatedSamples/0/video/uri"),
            response.pointer("/generatedVideos/0/video/uri"),
            response.pointer("/videos/0/uri"),
        ];
        candidates
            .into_iter()
            .flatten()
            .find_map(|v| v.as_str().and_then(non_empty))
    }
}

#[derive(Debug, Clone)]
pub struct DownloadedMedia {
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Remote calls the orchestrator and post-processors rely on.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate_content(&self, model: &str, request: &ContentRequest) -> Result<GeminiResponse, GeminiError>;
    async fn start_video(&self, model: &str, request: &VideoRequest) -> Result<Operation, GeminiError>;
    async fn poll_operation(&self, name: &str) -> Result<Operation, GeminiError>;
    async fn download(&self, uri: &str) -> Result<DownloadedMedia, GeminiError>;
}

/// Hands out a backend bound to one credential.
pub trait ClientFactory: Send + Sync {
    fn client(&self, credential: &Credential) -> Arc<dyn GenerativeBackend>;
}

pub struct GeminiClient {
    client: Client,
    api_key: Credential,
    base_url: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: Credential, base_url: impl Into<String>) -> Self {
        Self { client, api_key, base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    fn masked(&self, url: &str) -> String {
        url.replace(self.api_key.expose(), "***")
    }

    /// Transport errors quote the request URL, which carries the key.
    fn transport(&self, e: reqwest::Error) -> GeminiError {
        GeminiError::Http(self.masked(&e.without_url().to_string()))
    }

    fn with_key(&self, url: &str) -> String {
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{}{}key={}", url, sep, self.api_key.expose())
    }

    async fn post_json<B: Serialize + Sync, T: for<'de> Deserialize<'de>>(&self, url: &str, body: &B) -> Result<T, GeminiError> {
        info!("🔗 Making request to: {}", self.masked(url));
        debug!("📤 Request body: {}", loggable(body));

        let response = self.client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.decode(response).await
    }

    async fn decode<T: for<'de> Deserialize<'de>>(&self, response: reqwest::Response) -> Result<T, GeminiError> {
        let status = response.status();
        info!("📥 Response status: {}", status);
        let response_text = response.text().await.map_err(|e| self.transport(e))?;

        if !status.is_success() {
            let body = self.masked(&response_text);
            error!("❌ API Error response: {}", body);
            return Err(GeminiError::Status { status: status.as_u16(), body });
        }

        let mut value: Value = serde_json::from_str(&response_text)
            .map_err(|e| GeminiError::Decode(format!("parse error: {}", e)))?;
        let parsed = serde_json::from_value(value.clone()).map_err(|e| GeminiError::Decode(e.to_string()));
        truncate_base64_in_json(&mut value);
        debug!("📥 Raw Gemini API response: {}", value);
        parsed
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate_content(&self, model: &str, request: &ContentRequest) -> Result<GeminiResponse, GeminiError> {
        let url = self.with_key(&format!("{}/models/{}:generateContent", self.base_url, model));
        self.post_json(&url, request).await
    }

    async fn start_video(&self, model: &str, request: &VideoRequest) -> Result<Operation, GeminiError> {
        let url = self.with_key(&format!("{}/models/{}:predictLongRunning", self.base_url, model));
        let operation: Operation = self.post_json(&url, request).await?;
        info!("🎬 Video operation started: {}", operation.name);
        Ok(operation)
    }

    async fn poll_operation(&self, name: &str) -> Result<Operation, GeminiError> {
        let url = self.with_key(&format!("{}/{}", self.base_url, name.trim_start_matches('/')));
        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.decode(response).await
    }

    async fn download(&self, uri: &str) -> Result<DownloadedMedia, GeminiError> {
        let url = self.with_key(uri);
        info!("⬇️ Downloading media from: {}", self.masked(&url));
        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ Failed to download the generated media. Status: {}", status);
            return Err(GeminiError::Status { status: status.as_u16(), body });
        }
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty() && v != "application/octet-stream")
            .unwrap_or_else(|| "video/mp4".to_string());
        let bytes = response.bytes().await.map_err(|e| self.transport(e))?;
        info!("✅ Downloaded {} bytes ({})", bytes.len(), mime_type);
        Ok(DownloadedMedia { mime_type, bytes })
    }
}

/// Builds one [`GeminiClient`] per credential over a shared connection pool.
#[derive(Clone)]
pub struct GeminiClientFactory {
    http: Client,
    base_url: String,
}

impl GeminiClientFactory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GeminiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeminiError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http, base_url: base_url.into() })
    }
}

impl ClientFactory for GeminiClientFactory {
    fn client(&self, credential: &Credential) -> Arc<dyn GenerativeBackend> {
        Arc::new(GeminiClient::new(self.http.clone(), credential.clone(), self.base_url.clone()))
    }
}
