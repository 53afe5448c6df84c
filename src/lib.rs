//! Batch image assessment and report generation for pre-construction surveys.
//!
//! This crate takes an ordered list of site photographs, submits each one with a
//! fixed damage-classification prompt to an OpenAI-compatible vision endpoint, and
//! assembles the captions into a paginated `.docx` report, two entries per page
//! with a logo header. Along the way it:
//! - retries rate-limited calls with exponential backoff, isolating failures per
//!   image so one bad photo never aborts a batch
//! - accumulates an advisory cost estimate from the model's own tokenizer and
//!   configured per-1K-token rates
//!
//! # Example
//! ```ignore
//! use precon::{AssessmentClient, CostEstimator, DocxRenderer, ReportBuilder,
//!              ReqwestHttpClient, RetryPolicy, RunId};
//!
//! let client = AssessmentClient::new(ReqwestHttpClient::new(), config.api.clone());
//! let estimator = CostEstimator::for_model(&config.api.model, &config.pricing)?;
//! let builder = ReportBuilder::new(
//!     client,
//!     RetryPolicy::new(config.retry.clone()),
//!     estimator,
//!     config.report.clone(),
//! );
//! let session = precon::auth::authenticate(&config.auth, &user, &pass)?;
//! let result = builder.run(&session, run_id, &images, renderer).await?;
//! println!("{} -> {}", result.total_cost, result.artifact_path.display());
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod cost;
pub mod error;
pub mod http;
pub mod image;
pub mod render;
pub mod report;
pub mod retry;

// Re-export commonly used types
pub use auth::{authenticate, Session};
pub use client::{AssessmentClient, ASSESSMENT_PROMPT};
pub use config::{Args, Config};
pub use cost::{CostEstimator, CostLedger};
pub use error::{ReportError, Result};
pub use http::{HttpClient, HttpResponse, MockHttpClient, ReqwestHttpClient};
pub use image::{partition_inputs, ImageFormat, ImageInput, RejectedInput};
pub use render::{DocumentRenderer, DocxRenderer, RecordingRenderer};
pub use report::{BatchRunResult, ReportBuilder, ReportEntry, RunId};
pub use retry::{AssessmentResult, RetryPolicy};
