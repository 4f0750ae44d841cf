//! Client error types
//!
//! Every failure of a backend call surfaces as one [`ApiError`].

use serde::Deserialize;
use thiserror::Error;

/// A message the backend attributed to a specific form field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldMessage {
    pub field: String,
    pub message: String,
}

/// Errors that can occur when talking to the backend
#[derive(Error, Debug)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, timeout...)
    #[error("Connection error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Non-2xx response carrying `message` and/or field-tagged `errors`
    #[error("Backend error {status}: {}", .messages.join("; "))]
    Backend {
        status: u16,
        messages: Vec<String>,
        fields: Vec<FieldMessage>,
    },

    /// Non-2xx response without a recognisable message
    #[error("Request failed with status {status}")]
    Unstructured { status: u16, body: String },

    /// 2xx response whose body does not match the expected shape
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The request could not be built (unreadable upload, bad header...)
    #[error("Invalid request: {0}")]
    Request(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageField {
    One(String),
    Many(Vec<serde_json::Value>),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<MessageField>,
    #[serde(default, deserialize_with = "tagged_errors")]
    errors: Vec<FieldMessage>,
}

/// Keep the `{field, message}` entries of an `errors` array; any other shape
/// yields no field messages.
fn tagged_errors<'de, D>(deserializer: D) -> Result<Vec<FieldMessage>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

impl ApiError {
    /// Classify a non-2xx response body
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).ok();

        let (messages, fields) = match parsed {
            Some(body) => {
                let messages = match body.message {
                    Some(MessageField::One(message)) => vec![message],
                    Some(MessageField::Many(items)) => items
                        .into_iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                    Some(MessageField::Other(_)) | None => Vec::new(),
                };
                (messages, body.errors)
            }
            None => (Vec::new(), Vec::new()),
        };

        if messages.is_empty() && fields.is_empty() {
            ApiError::Unstructured {
                status,
                body: body.to_string(),
            }
        } else {
            ApiError::Backend {
                status,
                messages,
                fields,
            }
        }
    }

    /// HTTP status, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } | ApiError::Unstructured { status, .. } => {
                Some(*status)
            }
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) | ApiError::Request(_) => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Messages the backend sent, if any
    pub fn messages(&self) -> &[String] {
        match self {
            ApiError::Backend { messages, .. } => messages,
            _ => &[],
        }
    }

    /// Field-tagged messages the backend sent, if any
    pub fn field_messages(&self) -> &[FieldMessage] {
        match self {
            ApiError::Backend { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Text suitable for a general error banner
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(_) => "Connection error".to_string(),
            ApiError::Backend { messages, fields, .. } => messages
                .first()
                .or_else(|| fields.first().map(|f| &f.message))
                .cloned()
                .unwrap_or_else(|| "Something went wrong".to_string()),
            ApiError::Unstructured { .. } | ApiError::Decode(_) | ApiError::Request(_) => {
                "Something went wrong".to_string()
            }
        }
    }
}

/// Result type for client operations
pub type ApiResult<T> = Result<T, ApiError>;
