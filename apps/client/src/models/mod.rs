pub mod chat;
pub mod result;
pub mod schema;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, Role};
pub use result::{ExtractionResult, ParseResponse, PersistedRecord};
pub use schema::{Schema, SchemaCatalogResponse, CUSTOM_SCHEMA_ID};
