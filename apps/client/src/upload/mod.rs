//! Upload step — file selection, client-side checks and the one-at-a-time parse submission.

use std::path::Path;

use tracing::{info, warn};

use crate::api_client::ResumeBackend;
use crate::errors::AppError;
use crate::models::{ParseResponse, Schema};

/// Advisory upload limit. Shown to the user; the backend is the authority.
pub const ADVISORY_LIMIT_BYTES: u64 = 20 * 1024 * 1024;
pub const INVALID_FILE_MESSAGE: &str = "Please select a valid PDF file.";
pub const SUBMITTING_STAGE: &str = "Reading your resume…";

/// A resume read from disk, ready to be sent as the `pdf` multipart part.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PdfFile {
    /// Rejects non-PDF names before touching the filesystem.
    pub async fn load(path: &Path) -> Result<Self, AppError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| is_pdf_name(n))
            .ok_or_else(|| AppError::Validation(INVALID_FILE_MESSAGE.to_string()))?
            .to_string();

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::Validation(format!("Could not read {}: {e}", path.display()))
        })?;

        Ok(Self { file_name, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn exceeds_advisory_limit(&self) -> bool {
        self.size() > ADVISORY_LIMIT_BYTES
    }
}

pub fn is_pdf_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Submitting,
}

/// View model for the upload step.
pub struct UploadStep {
    schema: Schema,
    file: Option<PdfFile>,
    state: UploadState,
    error: Option<String>,
}

impl UploadStep {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            file: None,
            state: UploadState::Idle,
            error: None,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Applies a selection attempt. An invalid candidate leaves the previous file in place.
    pub fn select(&mut self, candidate: Result<PdfFile, AppError>) {
        match candidate {
            Ok(file) => {
                if file.exceeds_advisory_limit() {
                    warn!(
                        "{} is {}, above the advisory limit",
                        file.file_name,
                        format_file_size(file.size())
                    );
                }
                self.error = None;
                self.file = Some(file);
            }
            Err(e) => self.error = Some(e.user_message()),
        }
    }

    /// One-line summary of the chosen file, with the advisory note when it applies.
    pub fn file_summary(&self) -> Option<String> {
        self.file.as_ref().map(|f| {
            let mut line = format!("{} ({})", f.file_name, format_file_size(f.size()));
            if f.exceeds_advisory_limit() {
                line.push_str(" — larger than 20 MB, the server may reject it");
            }
            line
        })
    }

    pub fn can_submit(&self) -> bool {
        self.file.is_some() && self.state == UploadState::Idle
    }

    /// Sends the chosen file. Returns the parse result only on full success; on failure
    /// the banner is set and the step is back in `Idle` for a retry.
    pub async fn submit(&mut self, backend: &dyn ResumeBackend) -> Option<ParseResponse> {
        if !self.can_submit() {
            return None;
        }
        let file = self.file.as_ref()?;

        self.state = UploadState::Submitting;
        self.error = None;
        let outcome = backend.parse_resume(file, &self.schema).await;
        self.state = UploadState::Idle;

        match outcome {
            Ok(parsed) => {
                info!("Parsed resume, session {}", parsed.session_id);
                Some(parsed)
            }
            Err(e) => {
                self.error = Some(e.user_message());
                None
            }
        }
    }
}
