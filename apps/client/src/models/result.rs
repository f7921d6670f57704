use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend-defined extraction output. Object key order is the backend's field order
/// (`serde_json` is built with `preserve_order`).
pub type ExtractionResult = Value;

#[derive(Debug, Clone, Deserialize)]
pub struct ParseResponse {
    pub session_id: String,
    pub json_data: ExtractionResult,
}

/// The single record kept in client-side storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    pub saved_at: DateTime<Utc>,
    /// Label of the schema the result was extracted with.
    #[serde(alias = "schema")]
    pub schema_label: String,
    pub session_id: String,
    pub data: ExtractionResult,
}
