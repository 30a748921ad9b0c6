//! In-memory stand-ins for the Gemini backend used across module tests.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::credentials::Credential;
use crate::gemini::{
    ClientFactory, ContentRequest, DownloadedMedia, GeminiError, GeminiResponse, GenerativeBackend, Operation,
    VideoRequest, WirePart,
};

type ContentScript = dyn Fn(&str, &ContentRequest) -> Result<GeminiResponse, GeminiError> + Send + Sync;
type LatencyScript = dyn Fn(&ContentRequest) -> Duration + Send + Sync;

pub struct FakeBackend {
    content: Box<ContentScript>,
    latency: Box<LatencyScript>,
    operations: Mutex<VecDeque<Result<Operation, GeminiError>>>,
    pub content_calls: AtomicUsize,
    pub video_starts: AtomicUsize,
    pub polls: AtomicUsize,
    pub downloads: Mutex<Vec<String>>,
    pub requests: Mutex<Vec<(String, ContentRequest)>>,
    pub video_requests: Mutex<Vec<VideoRequest>>,
}

impl FakeBackend {
    pub fn new(content: impl Fn(&str, &ContentRequest) -> Result<GeminiResponse, GeminiError> + Send + Sync + 'static) -> Self {
        Self {
            content: Box::new(content),
            latency: Box::new(|_| Duration::ZERO),
            operations: Mutex::new(VecDeque::new()),
            content_calls: AtomicUsize::new(0),
            video_starts: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            downloads: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            video_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: impl Fn(&ContentRequest) -> Duration + Send + Sync + 'static) -> Self {
        self.latency = Box::new(latency);
        self
    }

    /// Poll results handed out in order; once exhausted every poll reports still running.
    pub fn with_operations(self, operations: Vec<Result<Operation, GeminiError>>) -> Self {
        *self.operations.lock() = operations.into();
        self
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeBackend for FakeBackend {
    async fn generate_content(&self, model: &str, request: &ContentRequest) -> Result<GeminiResponse, GeminiError> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((model.to_string(), request.clone()));
        let delay = (self.latency)(request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        (self.content)(model, request)
    }

    async fn start_video(&self, _model: &str, request: &VideoRequest) -> Result<Operation, GeminiError> {
        self.video_starts.fetch_add(1, Ordering::SeqCst);
        self.video_requests.lock().push(request.clone());
        Ok(pending_operation())
    }

    async fn poll_operation(&self, _name: &str) -> Result<Operation, GeminiError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.operations.lock().pop_front().unwrap_or_else(|| Ok(pending_operation()))
    }

    async fn download(&self, uri: &str) -> Result<DownloadedMedia, GeminiError> {
        self.downloads.lock().push(uri.to_string());
        Ok(DownloadedMedia { mime_type: "video/mp4".into(), bytes: Bytes::from_static(&[0, 1, 2]) })
    }
}

pub struct FakeFactory {
    backend: Arc<FakeBackend>,
    pub clients: AtomicUsize,
    pub keys: Mutex<Vec<String>>,
}

impl FakeFactory {
    pub fn new(backend: Arc<FakeBackend>) -> Self {
        Self { backend, clients: AtomicUsize::new(0), keys: Mutex::new(Vec::new()) }
    }
}

impl ClientFactory for FakeFactory {
    fn client(&self, credential: &Credential) -> Arc<dyn GenerativeBackend> {
        self.clients.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().push(credential.expose().to_string());
        self.backend.clone()
    }
}

pub fn pending_operation() -> Operation {
    Operation { name: "operations/fake".into(), done: false, ..Default::default() }
}

pub fn completed_operation(uri: &str) -> Operation {
    serde_json::from_value(json!({
        "name": "operations/fake",
        "done": true,
        "response": {"generateVideoResponse": {"generatedSamples": [{"video": {"uri": uri}}]}}
    }))
    .unwrap()
}

pub fn image_response(data: &str) -> GeminiResponse {
    GeminiResponse::from_value(json!({
        "candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": data}}]}}]
    }))
    .unwrap()
}

pub fn text_response(text: &str, finish_reason: &str) -> GeminiResponse {
    GeminiResponse::from_value(json!({
        "candidates": [{"content": {"parts": [{"text": text}]}, "finishReason": finish_reason}]
    }))
    .unwrap()
}

pub fn prompt_text(request: &ContentRequest) -> String {
    request
        .contents
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| match p {
            WirePart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

/// Variant index parsed from the "Variation i/n." marker.
pub fn variant_of(request: &ContentRequest) -> usize {
    let text = prompt_text(request);
    text.strip_prefix("Variation ")
        .and_then(|rest| rest.split('/').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

pub fn credential_rejected() -> GeminiError {
    GeminiError::Status { status: 400, body: r#"{"error":{"message":"API key not valid","details":[{"reason":"API_KEY_INVALID"}]}}"#.into() }
}

pub fn overloaded() -> GeminiError {
    GeminiError::Status { status: 503, body: r#"{"error":{"status":"UNAVAILABLE"}}"#.into() }
}

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
