//! Flow Coordinator — schema chosen → file uploaded → results shown.
//!
//! Each step owns its view model, so leaving a step drops its state the same way
//! unmounting a view would.

pub mod terminal;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::catalog::SchemaSelector;
use crate::chat::ChatSession;
use crate::errors::AppError;
use crate::models::{ExtractionResult, ParseResponse, Schema};
use crate::render::{render, FieldNode};
use crate::store::{self, ResultStore};
use crate::upload::UploadStep;

pub const STEP_LABELS: [&str; 3] = ["Pick a Template", "Upload Resume", "See Results"];

pub enum Step {
    SelectSchema(SchemaSelector),
    Upload(UploadStep),
    Results(ResultsView),
}

/// Everything the results step shows: the rendered tree and the conversation.
pub struct ResultsView {
    pub schema: Schema,
    pub data: ExtractionResult,
    pub tree: FieldNode,
    pub chat: ChatSession,
}

impl ResultsView {
    pub fn new(schema: Schema, parsed: ParseResponse) -> Self {
        Self {
            tree: render(&parsed.json_data, 0),
            chat: ChatSession::new(parsed.session_id),
            schema,
            data: parsed.json_data,
        }
    }

    /// Canonical JSON as text, for copying.
    pub fn copy_text(&self) -> Result<String, AppError> {
        let bytes = store::export_json(&self.data)?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(e.into()))
    }

    pub fn download(&self, dir: &Path) -> Result<PathBuf, AppError> {
        store::download(dir, &self.schema.id, &self.data)
    }
}

pub struct Flow {
    step: Step,
    store: ResultStore,
}

impl Flow {
    pub fn new(store: ResultStore) -> Self {
        Self {
            step: Step::SelectSchema(SchemaSelector::new()),
            store,
        }
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn step_mut(&mut self) -> &mut Step {
        &mut self.step
    }

    /// 1-based step number.
    pub fn step_number(&self) -> usize {
        match self.step {
            Step::SelectSchema(_) => 1,
            Step::Upload(_) => 2,
            Step::Results(_) => 3,
        }
    }

    /// Step 1 → 2 with a finalized schema.
    pub fn schema_chosen(&mut self, schema: Schema) -> bool {
        if !matches!(self.step, Step::SelectSchema(_)) {
            warn!("Schema chosen outside the selection step; ignoring");
            return false;
        }
        info!("Schema selected: {}", schema.id);
        self.step = Step::Upload(UploadStep::new(schema));
        true
    }

    /// Step 2 → 1. The catalog is fetched again, as on first entry.
    pub fn back(&mut self) -> bool {
        if !matches!(self.step, Step::Upload(_)) {
            return false;
        }
        self.step = Step::SelectSchema(SchemaSelector::new());
        true
    }

    /// Step 2 → 3. Runs the persistence hook exactly once for the new result.
    pub fn upload_complete(&mut self, parsed: ParseResponse) -> bool {
        let schema = match &self.step {
            Step::Upload(upload) => upload.schema().clone(),
            _ => {
                warn!("Parse result arrived outside the upload step; ignoring");
                return false;
            }
        };

        self.store
            .on_new_result(&parsed.session_id, &parsed.json_data, &schema);
        self.step = Step::Results(ResultsView::new(schema, parsed));
        true
    }

    /// Any step → 1, dropping schema, session and result.
    pub fn start_over(&mut self) {
        self.step = Step::SelectSchema(SchemaSelector::new());
    }
}

/// `✓ Pick a Template ── ● 2 Upload Resume ── ○ 3 See Results`
pub fn step_indicator(current: usize) -> String {
    STEP_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let num = i + 1;
            if num < current {
                format!("✓ {label}")
            } else if num == current {
                format!("● {num} {label}")
            } else {
                format!("○ {num} {label}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ── ")
}
