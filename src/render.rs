//! Document rendering boundary.
//!
//! The pipeline talks to a [`DocumentRenderer`] so the orchestration logic is
//! testable without writing real files. [`DocxRenderer`] is the production
//! implementation; [`RecordingRenderer`] records the call sequence for tests.

use docx_rs::{AlignmentType, BreakType, Docx, Header, Paragraph, Pic, Run};
use std::path::PathBuf;

use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::report::{ReportEntry, RunId};

/// EMUs (English Metric Units) per millimetre, the unit OOXML sizes pictures in.
const EMU_PER_MM: u32 = 36_000;
/// EMUs per pixel at 96 DPI, used when declaring nominal pixel dimensions.
const EMU_PER_PX: u32 = 9_525;

/// Build a picture at a fixed physical size without decoding the image bytes.
fn sized_pic(bytes: Vec<u8>, width_mm: u32, height_mm: u32) -> Pic {
    let (w_emu, h_emu) = (width_mm * EMU_PER_MM, height_mm * EMU_PER_MM);
    Pic::new_with_dimensions(bytes, w_emu / EMU_PER_PX, h_emu / EMU_PER_PX).size(w_emu, h_emu)
}

/// Consumer of the structured entries produced by a batch run.
///
/// Calls arrive strictly in document order: entries interleaved with page breaks,
/// then a single `finalize` that persists the artifact.
pub trait DocumentRenderer {
    /// Append one entry (index label, image, caption) to the document.
    fn add_entry(&mut self, entry: &ReportEntry) -> Result<()>;

    /// Insert a hard page break after the current entry.
    fn page_break(&mut self) -> Result<()>;

    /// Persist the document and return the artifact path.
    fn finalize(self) -> Result<PathBuf>
    where
        Self: Sized;
}

/// Production renderer producing a `.docx` artifact.
///
/// The logo is loaded from the configured asset path and placed in the page
/// header, so it repeats on every page without being embedded in code.
pub struct DocxRenderer {
    paragraphs: Vec<Paragraph>,
    logo: Vec<u8>,
    config: ReportConfig,
    output_path: PathBuf,
}

impl DocxRenderer {
    /// Create a renderer for one run, loading the header logo eagerly so a bad
    /// asset path fails before any API call is made.
    pub fn new(config: &ReportConfig, run_id: &RunId) -> Result<Self> {
        let logo = std::fs::read(&config.logo_path).map_err(|e| {
            ReportError::Render(format!(
                "cannot read logo asset '{}': {}",
                config.logo_path.display(),
                e
            ))
        })?;

        let output_path = config
            .output_dir
            .join(format!("precon_report_{}.docx", run_id));

        Ok(Self {
            paragraphs: Vec::new(),
            logo,
            config: config.clone(),
            output_path,
        })
    }

    fn centered_text(text: String) -> Paragraph {
        Paragraph::new()
            .add_run(Run::new().add_text(text))
            .align(AlignmentType::Center)
    }
}

impl DocumentRenderer for DocxRenderer {
    fn add_entry(&mut self, entry: &ReportEntry) -> Result<()> {
        let image_bytes = entry.image.bytes().map_err(|e| {
            ReportError::Render(format!("cannot read image '{}': {}", entry.image, e))
        })?;

        let pic = sized_pic(
            image_bytes,
            self.config.image_width_mm,
            self.config.image_height_mm,
        );

        self.paragraphs
            .push(Self::centered_text(format!("Image No.: {}", entry.index)));
        self.paragraphs.push(
            Paragraph::new()
                .add_run(Run::new().add_image(pic))
                .align(AlignmentType::Center),
        );
        self.paragraphs
            .push(Self::centered_text(format!("Assessment: {}", entry.caption)));
        // Spacer between entries
        self.paragraphs.push(Paragraph::new());

        Ok(())
    }

    fn page_break(&mut self) -> Result<()> {
        self.paragraphs
            .push(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(path = %self.output_path.display()))]
    fn finalize(self) -> Result<PathBuf> {
        let logo_size = self.config.logo_size_mm;
        let header = Header::new().add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_image(sized_pic(self.logo, logo_size, logo_size)))
                .align(AlignmentType::Center),
        );

        let mut docx = Docx::new().header(header);
        for paragraph in self.paragraphs {
            docx = docx.add_paragraph(paragraph);
        }

        let file = std::fs::File::create(&self.output_path).map_err(|e| {
            ReportError::Render(format!(
                "cannot create artifact '{}': {}",
                self.output_path.display(),
                e
            ))
        })?;

        docx.build().pack(file).map_err(|e| {
            ReportError::Render(format!(
                "cannot write artifact '{}': {}",
                self.output_path.display(),
                e
            ))
        })?;

        tracing::info!("Report artifact written");
        Ok(self.output_path)
    }
}

// ============================================================================
// Test/Recording Implementation
// ============================================================================

use parking_lot::Mutex;
use std::sync::Arc;

/// One observed renderer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    Entry {
        index: usize,
        caption: String,
        success: bool,
    },
    PageBreak,
    Finalized,
}

/// Renderer that records the call sequence instead of producing a document.
///
/// Clone it before handing it to the pipeline; the clone shares the event log.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    events: Arc<Mutex<Vec<RenderEvent>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().clone()
    }

    /// Entries recorded so far, in order.
    pub fn entries(&self) -> Vec<RenderEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, RenderEvent::Entry { .. }))
            .cloned()
            .collect()
    }

    /// Number of page breaks recorded so far.
    pub fn page_break_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, RenderEvent::PageBreak))
            .count()
    }
}

impl DocumentRenderer for RecordingRenderer {
    fn add_entry(&mut self, entry: &ReportEntry) -> Result<()> {
        self.events.lock().push(RenderEvent::Entry {
            index: entry.index,
            caption: entry.caption.clone(),
            success: entry.success,
        });
        Ok(())
    }

    fn page_break(&mut self) -> Result<()> {
        self.events.lock().push(RenderEvent::PageBreak);
        Ok(())
    }

    fn finalize(self) -> Result<PathBuf> {
        self.events.lock().push(RenderEvent::Finalized);
        Ok(PathBuf::from("recording.docx"))
    }
}
