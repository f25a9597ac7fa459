// Response envelope shared by every backend endpoint
// Transport success and logical success are separate: a 200 response can still carry
// an ERROR status, and callers must go through `into_data` to see it
//
// Numan Thabit 2025 Nov

use crate::errors::ClientError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_ERROR_MESSAGE: &str = "Erro ao processar a requisição";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: Option<T>,
    pub status: EnvelopeStatus,
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            status: EnvelopeStatus::Success,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            status: EnvelopeStatus::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }

    /// Payload of a SUCCESS envelope (possibly null); an ERROR envelope is a failure.
    pub fn into_data(self) -> Result<Option<T>, ClientError> {
        match self.status {
            EnvelopeStatus::Success => Ok(self.data),
            EnvelopeStatus::Error => Err(ClientError::api(
                self.message
                    .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
            )),
        }
    }
}

/// Turn an ERROR envelope body from a non-2xx response into `ClientError::Api`.
/// The backend puts a field → message map in `data` when request validation failed.
pub(crate) fn error_from_body(body: &[u8]) -> Option<ClientError> {
    let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_slice(body).ok()?;
    if envelope.is_success() {
        return None;
    }
    let field_errors = envelope
        .data
        .as_ref()
        .and_then(|data| data.as_object())
        .map(|fields| {
            fields
                .iter()
                .filter_map(|(field, message)| {
                    message.as_str().map(|m| (field.clone(), m.to_string()))
                })
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();
    Some(ClientError::Api {
        message: envelope
            .message
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
        field_errors,
    })
}
