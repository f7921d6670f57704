//! Schema selection step — the backend catalog, the custom sentinel and the tag builder.

use tracing::{info, warn};

use crate::api_client::ResumeBackend;
use crate::errors::AppError;
use crate::models::{Schema, CUSTOM_SCHEMA_ID};
use crate::tags::TagBuilder;

pub const CATALOG_ERROR: &str = "Could not load schema options. Make sure the backend is running.";
pub const MISSING_FIELDS_HINT: &str = "Please add at least one field to continue.";
pub const NOTHING_SELECTED: &str = "Pick a template to continue.";

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogState {
    Loading,
    Ready(Vec<Schema>),
    /// Persistent banner; nothing can be selected and nothing retries on its own.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SchemaSelector {
    catalog: CatalogState,
    selected: Option<usize>,
    tags: TagBuilder,
}

impl Default for SchemaSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaSelector {
    pub fn new() -> Self {
        Self {
            catalog: CatalogState::Loading,
            selected: None,
            tags: TagBuilder::new(),
        }
    }

    /// Fetches the catalog and appends the custom sentinel after the backend schemas.
    pub async fn load(&mut self, backend: &dyn ResumeBackend) {
        self.catalog = match backend.schema_options().await {
            Ok(mut schemas) => {
                schemas.retain(|s| {
                    let reserved = s.id == CUSTOM_SCHEMA_ID;
                    if reserved {
                        warn!("Backend schema '{}' uses the reserved id; dropping it", s.label);
                    }
                    !reserved
                });
                info!("Schema catalog loaded ({} options)", schemas.len());
                schemas.push(Schema::custom_placeholder());
                CatalogState::Ready(schemas)
            }
            Err(e) => {
                warn!("Schema catalog failed to load: {e}");
                CatalogState::Failed(CATALOG_ERROR.to_string())
            }
        };
        self.selected = None;
    }

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn schemas(&self) -> &[Schema] {
        match &self.catalog {
            CatalogState::Ready(schemas) => schemas,
            _ => &[],
        }
    }

    /// Selects by position in the catalog. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.schemas().len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    pub fn select_id(&mut self, id: &str) -> bool {
        match self.schemas().iter().position(|s| s.id == id) {
            Some(index) => self.select(index),
            None => false,
        }
    }

    pub fn selected(&self) -> Option<&Schema> {
        self.selected.and_then(|i| self.schemas().get(i))
    }

    pub fn custom_selected(&self) -> bool {
        self.selected().is_some_and(Schema::is_custom)
    }

    pub fn tags(&self) -> &TagBuilder {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagBuilder {
        &mut self.tags
    }

    pub fn can_continue(&self) -> bool {
        match self.selected() {
            Some(schema) if schema.is_custom() => self.tags.is_valid(),
            Some(_) => true,
            None => false,
        }
    }

    /// Builds the schema the rest of the flow will use.
    pub fn finalize(&self) -> Result<Schema, AppError> {
        let Some(schema) = self.selected() else {
            return Err(AppError::Validation(NOTHING_SELECTED.to_string()));
        };
        if !self.can_continue() {
            return Err(AppError::Validation(MISSING_FIELDS_HINT.to_string()));
        }
        if schema.is_custom() {
            Ok(Schema::custom(self.tags.tokens().to_vec()))
        } else {
            Ok(schema.clone())
        }
    }
}
