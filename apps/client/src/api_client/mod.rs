/// API Client — the single point of entry for all backend calls.
///
/// ARCHITECTURAL RULE: No other module may issue HTTP requests.
/// Views and controllers depend on the `ResumeBackend` trait, never on `reqwest`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::{ChatRequest, ChatResponse, ParseResponse, Schema, SchemaCatalogResponse};
use crate::upload::PdfFile;

const SCHEMA_OPTIONS_PATH: &str = "/api/schema-options";
const PARSE_RESUME_PATH: &str = "/api/parse-resume";
const CHAT_PATH: &str = "/api/chat";

/// The three backend operations the client depends on.
/// Carried as `Arc<dyn ResumeBackend>` so tests can swap in a scripted backend.
#[async_trait]
pub trait ResumeBackend: Send + Sync {
    async fn schema_options(&self) -> Result<Vec<Schema>, AppError>;

    async fn parse_resume(&self, pdf: &PdfFile, schema: &Schema)
        -> Result<ParseResponse, AppError>;

    async fn chat(&self, session_id: &str, message: &str) -> Result<ChatResponse, AppError>;
}

/// FastAPI error envelope. `detail` is a string for handled errors and a list
/// for request validation failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Value,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// The timeout bounds every request, so a hung backend settles as a failure.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Reads the body and either decodes it or converts it into `AppError::Backend`.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Backend returned {}: {}", status, body);
            return Err(AppError::Backend {
                status: status.as_u16(),
                detail: extract_detail(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ResumeBackend for ApiClient {
    async fn schema_options(&self) -> Result<Vec<Schema>, AppError> {
        let response = self.client.get(self.url(SCHEMA_OPTIONS_PATH)).send().await?;
        let catalog: SchemaCatalogResponse = Self::decode(response).await?;
        debug!("Loaded {} schema options", catalog.schemas.len());
        Ok(catalog.schemas)
    }

    async fn parse_resume(
        &self,
        pdf: &PdfFile,
        schema: &Schema,
    ) -> Result<ParseResponse, AppError> {
        let part = Part::bytes(pdf.bytes.clone())
            .file_name(pdf.file_name.clone())
            .mime_str("application/pdf")?;

        let mut form = Form::new()
            .part("pdf", part)
            .text("schema_id", schema.id.clone());
        if let Some(custom_fields) = schema.custom_fields_param() {
            form = form.text("custom_fields", custom_fields);
        }

        debug!(
            "Submitting {} ({} bytes) with schema '{}'",
            pdf.file_name,
            pdf.bytes.len(),
            schema.id
        );

        let response = self
            .client
            .post(self.url(PARSE_RESUME_PATH))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn chat(&self, session_id: &str, message: &str) -> Result<ChatResponse, AppError> {
        let response = self
            .client
            .post(self.url(CHAT_PATH))
            .json(&ChatRequest {
                message,
                session_id,
            })
            .send()
            .await?;
        Self::decode(response).await
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok()?;
    match parsed.detail {
        Value::String(s) => Some(s),
        Value::Null => None,
        // Validation errors: a list of objects each carrying a `msg`
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        other => Some(other.to_string()),
    }
}
