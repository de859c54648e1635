use crate::ActionKind;
use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = ResolutionError> = core::result::Result<T, E>;

/// The intent service produced output that does not satisfy the action schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("action payload is not a JSON object")]
    NotAnObject,
    #[error("action is missing \"kind\"")]
    MissingKind,
    #[error("action is missing a non-empty \"verbalResponse\"")]
    MissingVerbalResponse,
    #[error("\"params\" must be an object")]
    ParamsNotObject,
    #[error("{kind}: missing required param \"{param}\"")]
    MissingParam {
        kind: ActionKind,
        param: &'static str,
    },
    #[error("{kind}: invalid \"{param}\": {reason}")]
    InvalidParam {
        kind: ActionKind,
        param: &'static str,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("intent service unreachable: {0}")]
    Network(String),
    #[error("intent service returned HTTP {0}")]
    Status(u16),
    #[error("intent service timed out after {0:?}")]
    Timeout(Duration),
    #[error("intent service returned malformed output: {0}")]
    Malformed(String),
    #[error("invalid action: {0}")]
    Schema(#[from] SchemaError),
    #[error("intent service misconfigured: {0}")]
    Config(String),
}

impl ResolutionError {
    /// Short description safe to show in the terminal: no payloads, URLs or
    /// credentials.
    pub fn sanitized(&self) -> String {
        match self {
            ResolutionError::Network(_) => "Could not reach the intent service.".to_string(),
            ResolutionError::Status(code) => format!("Intent service error (HTTP {}).", code),
            ResolutionError::Timeout(after) if after.subsec_millis() != 0 => {
                format!("Intent service timed out after {} ms.", after.as_millis())
            }
            ResolutionError::Timeout(after) => {
                format!("Intent service timed out after {}s.", after.as_secs())
            }
            ResolutionError::Malformed(_) => {
                "Intent service returned an unreadable response.".to_string()
            }
            ResolutionError::Schema(err) => format!("Intent service returned an invalid action ({}).", err),
            ResolutionError::Config(_) => "Intent service is not configured.".to_string(),
        }
    }
}
