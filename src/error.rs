use crate::io_struct::{not_found_payload, wrong_history_payload};
use crate::server::json_response;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::{Value, json};

/// Synthetic status reported when an outbound call exceeds its timeout.
pub const TIMEOUT_STATUS: u16 = 504;
/// Synthetic status reported when the upstream cannot be reached.
pub const UNAVAILABLE_STATUS: u16 = 502;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("route not found")]
    RouteNotFound { models: Vec<String> },

    #[error("malformed request: {reason}")]
    MalformedRequest { reason: String },

    #[error("upstream returned an empty reply (status {status})")]
    UpstreamFailure { status: u16, body: String },

    #[error("upstream reply could not be decoded (status {status}): {detail}")]
    UpstreamDecodeFailure {
        status: u16,
        body: String,
        detail: String,
    },

    #[error("upstream request timed out")]
    UpstreamTimeout,

    #[error("upstream unavailable: {reason}")]
    UpstreamUnavailable { reason: String },
}

impl RelayError {
    /// Classify a reqwest transport error.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RelayError::UpstreamTimeout
        } else {
            RelayError::UpstreamUnavailable {
                reason: err.to_string(),
            }
        }
    }

    /// Status code carried in the JSON payload.
    pub fn status(&self) -> u16 {
        match self {
            RelayError::RouteNotFound { .. } => 404,
            RelayError::MalformedRequest { .. } => 403,
            RelayError::UpstreamFailure { status, .. } => *status,
            RelayError::UpstreamDecodeFailure { status, .. } => *status,
            RelayError::UpstreamTimeout => TIMEOUT_STATUS,
            RelayError::UpstreamUnavailable { .. } => UNAVAILABLE_STATUS,
        }
    }

    pub fn to_payload(&self) -> Value {
        match self {
            RelayError::RouteNotFound { models } => not_found_payload(models),
            RelayError::MalformedRequest { .. } => wrong_history_payload(),
            RelayError::UpstreamFailure { status, body } => json!({
                "action": "error",
                "status": status,
                "response": body,
            }),
            RelayError::UpstreamDecodeFailure {
                status,
                body,
                detail,
            } => json!({
                "action": "error",
                "status": status,
                "response": body,
                "detail": detail,
            }),
            RelayError::UpstreamTimeout | RelayError::UpstreamUnavailable { .. } => json!({
                "action": "error",
                "status": self.status(),
                "response": self.to_string(),
            }),
        }
    }
}

// Callers read the logical status from the payload; the transport status is always 200.
impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        StatusCode::OK
    }

    fn error_response(&self) -> HttpResponse {
        json_response(&self.to_payload())
    }
}
