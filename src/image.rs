//! Image inputs for the assessment pipeline.
//!
//! An [`ImageInput`] is a validated reference to an uploaded photograph. Only
//! jpg/jpeg/png files are accepted (case-insensitive); anything else is rejected
//! per file with a diagnostic rather than aborting the batch.

use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Resolve a file extension (without the dot) into a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// MIME type used in the data URI submitted upstream.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// One uploaded photograph to be assessed and included in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    path: PathBuf,
    format: ImageFormat,
}

impl ImageInput {
    /// Validate a file path as an acceptable image input.
    ///
    /// Only the declared extension is checked here; the file is read lazily when
    /// the pipeline encodes or renders it.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ReportError::InvalidInput {
                path: path.display().to_string(),
                reason: "missing file extension".to_string(),
            })?;

        let format = ImageFormat::from_extension(ext).ok_or_else(|| ReportError::InvalidInput {
            path: path.display().to_string(),
            reason: format!("unsupported extension '.{}', only .jpg/.jpeg/.png allowed", ext),
        })?;

        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Read the image file into memory.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }

    /// Read the image file and return a base64 data URI embeddable in a request.
    pub fn data_uri(&self) -> Result<String> {
        let bytes = self.bytes()?;
        Ok(format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            STANDARD.encode(bytes)
        ))
    }
}

impl std::fmt::Display for ImageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// An input file that failed validation, with the reason it was rejected.
#[derive(Debug)]
pub struct RejectedInput {
    pub path: PathBuf,
    pub error: ReportError,
}

/// Split candidate paths into valid image inputs and per-file rejections.
///
/// Input order is preserved for the accepted files; rejections carry the
/// diagnostic to surface to the caller.
pub fn partition_inputs(paths: impl IntoIterator<Item = PathBuf>) -> (Vec<ImageInput>, Vec<RejectedInput>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for path in paths {
        match ImageInput::from_path(path.clone()) {
            Ok(input) => accepted.push(input),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Rejected input file");
                rejected.push(RejectedInput { path, error });
            }
        }
    }

    (accepted, rejected)
}
