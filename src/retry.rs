//! Bounded-backoff wrapper isolating per-image remote-call failures.
//!
//! The policy classifies each failed attempt: rate limits sleep and retry with an
//! exponentially growing delay, anything else gives up immediately. Either way the
//! caller always gets a usable caption back, so one bad image can never abort the
//! rest of a batch.

use std::time::Duration;

use crate::client::AssessmentClient;
use crate::config::RetryConfig;
use crate::error::ReportError;
use crate::http::HttpClient;
use crate::image::ImageInput;

/// The outcome of submitting one image to the remote capability.
///
/// Produced exactly once per image. `caption` is always a non-empty, sentence-cased,
/// period-terminated string: on failure it is a fallback sentence embedding the
/// error detail, so the document always has one caption per image slot.
#[derive(Debug, Clone)]
pub struct AssessmentResult {
    pub caption: String,
    pub success: bool,
    pub error_detail: Option<String>,
}

impl AssessmentResult {
    fn succeeded(caption: String) -> Self {
        Self {
            caption,
            success: true,
            error_detail: None,
        }
    }

    fn fallback(caption: String, detail: String) -> Self {
        Self {
            caption,
            success: false,
            error_detail: Some(detail),
        }
    }
}

/// States of one image's retry loop.
#[derive(Debug)]
enum AttemptState {
    /// About to make attempt `attempt` (1-based) after waiting `delay` on the
    /// previous rate limit
    Attempting { attempt: u32, delay: Duration },
    /// Sleeping out a rate limit before attempt `next_attempt`
    Backoff {
        next_attempt: u32,
        delay: Duration,
        detail: String,
    },
    /// Terminal: upstream produced a caption
    Succeeded { caption: String },
    /// Terminal: gave up, caller gets a fallback caption
    GaveUp { detail: String, rate_limited: bool },
}

/// Bounded retry policy with exponential backoff for rate-limited calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Assess one image, retrying rate-limited attempts up to the configured cap.
    ///
    /// Never returns an error: exhausted retries and non-retryable failures both
    /// degrade to a fallback caption.
    #[tracing::instrument(skip(self, client), fields(image = %image))]
    pub async fn assess<H: HttpClient>(
        &self,
        client: &AssessmentClient<H>,
        image: &ImageInput,
    ) -> AssessmentResult {
        let mut state = AttemptState::Attempting {
            attempt: 1,
            delay: self.config.initial_delay,
        };

        loop {
            state = match state {
                AttemptState::Attempting { attempt, delay } => match client.assess(image).await {
                    Ok(caption) => AttemptState::Succeeded { caption },
                    Err(ReportError::RateLimited(detail)) => {
                        if attempt >= self.config.max_attempts {
                            tracing::warn!(
                                attempt,
                                max_attempts = self.config.max_attempts,
                                "Rate limit retries exhausted"
                            );
                            AttemptState::GaveUp {
                                detail,
                                rate_limited: true,
                            }
                        } else {
                            AttemptState::Backoff {
                                next_attempt: attempt + 1,
                                delay,
                                detail,
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(attempt, error = %e, "Assessment failed, not retrying");
                        AttemptState::GaveUp {
                            detail: e.to_string(),
                            rate_limited: false,
                        }
                    }
                },
                AttemptState::Backoff {
                    next_attempt,
                    delay,
                    detail,
                } => {
                    tracing::info!(
                        next_attempt,
                        delay_secs = delay.as_secs_f64(),
                        detail = %detail,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    AttemptState::Attempting {
                        attempt: next_attempt,
                        delay: delay * self.config.backoff_multiplier,
                    }
                }
                AttemptState::Succeeded { caption } => {
                    return AssessmentResult::succeeded(caption);
                }
                AttemptState::GaveUp {
                    detail,
                    rate_limited,
                } => {
                    let caption = if rate_limited {
                        format!(
                            "Assessment unavailable: rate limited by the service after {} attempts.",
                            self.config.max_attempts
                        )
                    } else {
                        fallback_caption(&detail)
                    };
                    return AssessmentResult::fallback(caption, detail);
                }
            };
        }
    }
}

/// Build a fallback caption embedding the error detail, normalized like any other
/// caption (uppercase start, single trailing period).
fn fallback_caption(detail: &str) -> String {
    let detail = detail.trim().trim_end_matches('.');
    if detail.is_empty() {
        "Assessment unavailable: the image could not be analyzed.".to_string()
    } else {
        format!("Assessment unavailable: {}.", detail)
    }
}
