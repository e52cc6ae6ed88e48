//! Client for a Gradio-hosted image-generation Space.
//!
//! Gradio's call API takes two requests: a POST that enqueues the job and
//! returns an event id, then a GET on that event id that streams SSE lines
//! until the result tuple arrives.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::backend::ImageBackend;
use crate::normalize;
use crate::types::ImageHandle;
use crate::{PictorError, Result};

pub const SPACE_ID: &str = "Nech-C/waiNSFWIllustrious_v140";

// Image generation can take tens of seconds on a cold Space.
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

// Fixed parameters of the /infer endpoint. The seed is vestigial: the Space
// ignores it whenever randomize-seed is set, and we always set it.
const MODEL: &str = "v140";
const QUALITY_PROMPT: &str = "masterpiece, best quality, fine details";
const NEGATIVE_PROMPT: &str = "blurry, low quality, watermark, monochrome, text";
const SEED: u64 = 0;
const RANDOMIZE_SEED: bool = true;
const WIDTH: u32 = 1024;
const HEIGHT: u32 = 1024;
const GUIDANCE_SCALE: u32 = 6;
const INFERENCE_STEPS: u32 = 30;
const IMAGE_COUNT: u32 = 1;
const USE_QUALITY: bool = true;

/// Derive the `*.hf.space` origin a Space is served from.
pub(crate) fn space_url(space_id: &str) -> String {
    let subdomain: String = space_id
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '-',
        })
        .collect();
    format!("https://{subdomain}.hf.space")
}

fn default_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[derive(Clone, Debug)]
pub struct GradioClient {
    http: reqwest::Client,
    space_id: String,
    base_url: String,
    token: Option<String>,
}

impl GradioClient {
    pub fn new(space_id: impl Into<String>) -> Self {
        let space_id = space_id.into();
        let base_url = space_url(&space_id);
        Self {
            http: default_http_client(),
            space_id,
            base_url,
            token: None,
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Validate reachability (and the credential, if any) against the
    /// Space's API info endpoint.
    ///
    /// A failing authenticated probe is retried anonymously before giving
    /// up, so a bad or unsupported token degrades access instead of
    /// blocking startup.
    pub async fn connect(self) -> Result<Self> {
        match self.probe().await {
            Ok(()) => {
                info!(
                    space = %self.space_id,
                    authenticated = self.token.is_some(),
                    "connected to Space"
                );
                Ok(self)
            }
            Err(err) if self.token.is_some() => {
                warn!(space = %self.space_id, error = %err, "authenticated probe failed, retrying anonymously");
                let anonymous = Self {
                    token: None,
                    ..self
                };
                anonymous.probe().await?;
                info!(space = %anonymous.space_id, "connected to Space anonymously");
                Ok(anonymous)
            }
            Err(err) => Err(err),
        }
    }

    async fn probe(&self) -> Result<()> {
        let url = format!("{}/gradio_api/info", self.base_url);
        let response = self.apply_auth(self.http.get(url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PictorError::Api { status, body });
        }
        Ok(())
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.as_deref() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn call_endpoint(&self, suffix: &str) -> String {
        format!("{}/gradio_api/call/infer{suffix}", self.base_url)
    }

    async fn event_request(&self, prompt: &str) -> Result<String> {
        let body = json!({ "data": infer_params(prompt) });
        let response = self
            .apply_auth(self.http.post(self.call_endpoint("")))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PictorError::Api { status, body });
        }

        let parsed = response.json::<Value>().await?;
        parsed["event_id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                PictorError::InvalidResponse("event_id missing from call response".to_string())
            })
    }

    async fn stream_result(&self, event_id: &str) -> Result<Value> {
        let url = self.call_endpoint(&format!("/{event_id}"));
        let response = self.apply_auth(self.http.get(url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PictorError::Api { status, body });
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut last_event = None::<String>;
        let mut payload = None::<Value>;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            // SSE lines can straddle chunk boundaries.
            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim_end_matches('\r').to_string();
                buffer.drain(..=newline);

                if let Some(event) = line.strip_prefix("event:") {
                    last_event = Some(event.trim().to_string());
                } else if let Some(data) = line.strip_prefix("data:") {
                    let data = data.trim();
                    if last_event.as_deref() == Some("error") {
                        return Err(PictorError::InvalidResponse(format!(
                            "Space reported an error: {data}"
                        )));
                    }
                    if let Ok(value) = serde_json::from_str::<Value>(data) {
                        debug!(event = last_event.as_deref().unwrap_or(""), "received event payload");
                        payload = Some(value);
                    }
                }
            }
        }

        payload.ok_or_else(|| {
            PictorError::InvalidResponse("event stream ended without a result".to_string())
        })
    }
}

fn infer_params(prompt: &str) -> Value {
    json!([
        MODEL,
        prompt,
        QUALITY_PROMPT,
        NEGATIVE_PROMPT,
        SEED,
        RANDOMIZE_SEED,
        WIDTH,
        HEIGHT,
        GUIDANCE_SCALE,
        INFERENCE_STEPS,
        IMAGE_COUNT,
        USE_QUALITY,
    ])
}

#[async_trait]
impl ImageBackend for GradioClient {
    fn space_id(&self) -> &str {
        &self.space_id
    }

    async fn infer(&self, prompt: &str) -> Result<ImageHandle> {
        let event_id = self.event_request(prompt).await?;
        debug!(event_id = %event_id, "polling event stream");
        let result = self.stream_result(&event_id).await?;

        // Result tuple: (image, original_size, seed, history). Only the
        // image matters here.
        let image = result.get(0).unwrap_or(&Value::Null);
        normalize::classify(image)
    }
}
