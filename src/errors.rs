// Error types and error handling module
// This file defines the client error taxonomy: field validation failures that never
// reach the network, transport failures, and logical failures reported by the backend
//
// Numan Thabit 2025 Nov

use crate::validation::ValidationErrors;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("validation error: {0}")]
    Validation(ValidationErrors),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    /// The backend answered with an `ERROR` envelope, whatever the HTTP status was.
    #[error("api error: {message}")]
    Api {
        message: String,
        field_errors: BTreeMap<String, String>,
    },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn api(message: impl Into<String>) -> Self {
        ClientError::Api {
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    /// Field-level messages carried by the failure, either from local validation
    /// or from the backend's own request validation.
    pub fn field_messages(&self) -> BTreeMap<String, String> {
        match self {
            ClientError::Validation(errors) => errors.first_messages(),
            ClientError::Api { field_errors, .. } => field_errors.clone(),
            _ => BTreeMap::new(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        ClientError::Validation(errors)
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}
