//! Batch report builder: the pipeline orchestrator.
//!
//! Drives the whole run: per image (strictly sequential, input order) it obtains a
//! caption through the retry policy, accounts the call's estimated cost, appends an
//! entry to the renderer, and inserts a page break after every full page. Renderer
//! failures are fatal; everything per-image degrades to fallback captions instead.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::auth::Session;
use crate::client::{AssessmentClient, ASSESSMENT_PROMPT};
use crate::config::ReportConfig;
use crate::cost::{CostEstimator, CostLedger};
use crate::error::Result;
use crate::http::HttpClient;
use crate::image::ImageInput;
use crate::render::DocumentRenderer;
use crate::retry::RetryPolicy;

/// A unique identifier for one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Convert to a short, readable string format.
    pub fn to_short_string(&self) -> String {
        let hex = self.0.simple().to_string();
        format!("run_{}", &hex[..8])
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_short_string())
    }
}

/// One rendered unit in the output document.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    /// 1-based position in the document, matching input order
    pub index: usize,
    pub image: ImageInput,
    /// Normalized caption (or fallback sentence); never empty
    pub caption: String,
    /// Whether the caption came from a successful assessment
    pub success: bool,
}

/// Summary of one completed batch run.
#[derive(Debug, Clone)]
pub struct BatchRunResult {
    pub run_id: RunId,
    /// Final cost ledger snapshot, 6-decimal currency units
    pub total_cost: Decimal,
    /// Where the finished document was written
    pub artifact_path: PathBuf,
    /// Number of entries in the document (== number of valid input images)
    pub entries: usize,
    /// Entries whose caption is a fallback rather than an assessment
    pub failures: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Orchestrates one batch of images into a rendered report.
pub struct ReportBuilder<H: HttpClient> {
    client: AssessmentClient<H>,
    retry: RetryPolicy,
    estimator: CostEstimator,
    config: ReportConfig,
}

impl<H: HttpClient> ReportBuilder<H> {
    pub fn new(
        client: AssessmentClient<H>,
        retry: RetryPolicy,
        estimator: CostEstimator,
        config: ReportConfig,
    ) -> Self {
        Self {
            client,
            retry,
            estimator,
            config,
        }
    }

    /// Process `images` in order into the given renderer.
    ///
    /// Requires an authenticated [`Session`]; the caller performs the credential
    /// check before any upstream call is made. The `run_id` is the same one the
    /// renderer was created with, so the artifact name and the summary correlate.
    /// Each run starts a fresh ledger and a fresh document: re-running the same
    /// input re-derives both.
    #[tracing::instrument(skip_all, fields(run_id = %run_id, user = %session.username, images = images.len()))]
    pub async fn run<R: DocumentRenderer>(
        &self,
        session: &Session,
        run_id: RunId,
        images: &[ImageInput],
        mut renderer: R,
    ) -> Result<BatchRunResult> {
        let started_at = Utc::now();
        let mut ledger = CostLedger::new();
        let mut failures = 0usize;
        let total = images.len();

        for (idx, image) in images.iter().enumerate() {
            let index = idx + 1;
            tracing::info!(index, total, image = %image, "Assessing image");

            let result = self.retry.assess(&self.client, image).await;

            if result.success {
                let cost = self.estimator.estimate(ASSESSMENT_PROMPT, &result.caption);
                ledger.add(cost);
                tracing::debug!(index, %cost, "Accumulated call cost");
            } else {
                // Fallback captions contribute zero cost
                failures += 1;
                tracing::warn!(
                    index,
                    detail = result.error_detail.as_deref().unwrap_or(""),
                    "Image degraded to fallback caption"
                );
            }

            renderer.add_entry(&ReportEntry {
                index,
                image: image.clone(),
                caption: result.caption,
                success: result.success,
            })?;

            // Hard break after every full page; an odd trailing entry stays unpaired
            if index % self.config.entries_per_page == 0 {
                renderer.page_break()?;
            }
        }

        let artifact_path = renderer.finalize()?;
        let total_cost = ledger.total();
        let completed_at = Utc::now();

        tracing::info!(
            entries = total,
            failures,
            %total_cost,
            artifact = %artifact_path.display(),
            "Batch run complete"
        );

        Ok(BatchRunResult {
            run_id,
            total_cost,
            artifact_path,
            entries: total,
            failures,
            started_at,
            completed_at,
        })
    }
}
