//! Single-call client for the vision chat-completions endpoint.
//!
//! Builds one request per image (fixed instructional prompt + embedded data URI),
//! submits it, and extracts a normalized one-sentence caption. Failures are
//! classified as rate-limited or not; retries live a layer above in
//! [`crate::retry::RetryPolicy`].

use serde::Deserialize;

use crate::config::ApiConfig;
use crate::error::{ReportError, Result};
use crate::http::HttpClient;
use crate::image::ImageInput;

/// Instructional prompt submitted with every image.
pub const ASSESSMENT_PROMPT: &str = "As a civil engineer, I have some photos and would like to \
    classify them into different categories before starting a project. Find if it contains any \
    visible cracks, peeling paint, possible water damage, visual discoloration, honeycombing, \
    spalling or any other possible damage. If nothing, then just mention a statement about the \
    image. Sound it technical and to the point.";

/// Relevant subset of a chat-completions response body.
#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Client wrapping a single assessment call for one image.
pub struct AssessmentClient<H: HttpClient> {
    http: H,
    config: ApiConfig,
}

impl<H: HttpClient> AssessmentClient<H> {
    pub fn new(http: H, config: ApiConfig) -> Self {
        Self { http, config }
    }

    /// Submit one image with the fixed prompt and return its normalized caption.
    ///
    /// # Errors
    /// - [`ReportError::RateLimited`] when the upstream returns 429
    /// - [`ReportError::Api`] for any other non-success response or an empty caption
    /// - [`ReportError::Json`] for a malformed response body
    /// - [`ReportError::Http`] / [`ReportError::Io`] for transport and file reads
    #[tracing::instrument(skip(self), fields(image = %image, model = %self.config.model))]
    pub async fn assess(&self, image: &ImageInput) -> Result<String> {
        let body = self.build_request_body(image)?;
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let response = self
            .http
            .execute(&self.config.endpoint, api_key, body, self.config.timeout)
            .await?;

        match response.status {
            200..=299 => {
                let completion: ChatCompletion = serde_json::from_str(&response.body)?;
                let content = completion
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .unwrap_or_default();

                let caption = normalize_caption(&content);
                if caption.is_empty() {
                    return Err(ReportError::Api("empty caption in response".to_string()));
                }

                tracing::debug!(caption_len = caption.len(), "Received assessment");
                Ok(caption)
            }
            429 => {
                tracing::warn!("Upstream rate limit hit");
                Err(ReportError::RateLimited(truncate(&response.body, 200)))
            }
            status => Err(ReportError::Api(format!(
                "upstream returned status {}: {}",
                status,
                truncate(&response.body, 200)
            ))),
        }
    }

    /// Build the JSON body for one assessment request.
    fn build_request_body(&self, image: &ImageInput) -> Result<String> {
        let data_uri = image.data_uri()?;
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        {"type": "text", "text": ASSESSMENT_PROMPT},
                        {"type": "image_url", "image_url": {"url": data_uri}},
                    ],
                }
            ],
            "max_tokens": self.config.max_output_tokens,
        });
        Ok(body.to_string())
    }
}

/// Normalize a raw model response into a sentence-cased, period-terminated caption.
///
/// Downstream rendering assumes every caption starts with an uppercase letter and
/// ends with exactly one period, so this is applied to every successful response.
pub fn normalize_caption(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut caption = String::with_capacity(trimmed.len() + 1);
    let mut chars = trimmed.chars();
    if let Some(first) = chars.next() {
        caption.extend(first.to_uppercase());
        caption.push_str(chars.as_str());
    }

    while caption.ends_with('.') {
        caption.pop();
    }
    caption.push('.');
    caption
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
