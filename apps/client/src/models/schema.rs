use serde::{Deserialize, Serialize};

/// Reserved schema id for a user-defined field list.
pub const CUSTOM_SCHEMA_ID: &str = "custom";

/// An extraction template. Backend schemas arrive without `custom_fields`;
/// the custom schema carries its fields twice, as the backend expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub id: String,
    pub label: String,
    pub description: String,
    pub icon: String,
    pub fields: Vec<String>,
    #[serde(default, rename = "customFields", skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaCatalogResponse {
    pub schemas: Vec<Schema>,
}

impl Schema {
    /// The placeholder shown in the catalog before the user has added any fields.
    pub fn custom_placeholder() -> Self {
        Self {
            id: CUSTOM_SCHEMA_ID.to_string(),
            label: "Custom Fields".to_string(),
            description:
                "Tell us exactly which information to pull — great for custom use cases."
                    .to_string(),
            icon: "🖊️".to_string(),
            fields: Vec::new(),
            custom_fields: None,
        }
    }

    /// Finalizes the custom schema from a set of normalized tokens.
    pub fn custom(tokens: Vec<String>) -> Self {
        Self {
            fields: tokens.clone(),
            custom_fields: Some(tokens),
            ..Self::custom_placeholder()
        }
    }

    pub fn is_custom(&self) -> bool {
        self.id == CUSTOM_SCHEMA_ID
    }

    /// Comma-joined custom fields for the parse request, if any.
    pub fn custom_fields_param(&self) -> Option<String> {
        match &self.custom_fields {
            Some(fields) if self.is_custom() && !fields.is_empty() => Some(fields.join(",")),
            _ => None,
        }
    }

    /// Field names as shown to the user (underscores become spaces).
    pub fn display_fields(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.replace('_', " ")).collect()
    }
}
