use thiserror::Error;

/// Message shown when a backend failure carries no usable detail.
pub const GENERIC_ERROR: &str = "An error occurred.";

/// Application-level error type.
/// Every backend-facing failure is turned into user-visible text via `user_message`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Backend error (status {status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Backend { status: u16, detail: Option<String> },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Text for the dismissable banner. Validation messages and backend details are
    /// shown verbatim; everything else is logged and summarised.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Backend {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            AppError::Backend { status, .. } => {
                tracing::warn!("Backend returned {status} without detail");
                GENERIC_ERROR.to_string()
            }
            AppError::Transport(e) => {
                tracing::error!("Transport error: {e}");
                e.to_string()
            }
            AppError::Decode(e) => {
                tracing::error!("Could not decode backend response: {e}");
                GENERIC_ERROR.to_string()
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                format!("Could not write file: {e}")
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                GENERIC_ERROR.to_string()
            }
        }
    }
}
