//! Generation service boundary.
//!
//! Defines the interface the prioritization flow uses to reach an external
//! language model, plus the failure taxonomy for the call itself.

use crate::prioritize::request::PrioritizationRequest;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type GenerationResult<T> = Result<T, GenerationError>;

/// The external call failed before returning a usable payload.
///
/// Terminal for the current request; the flow never retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    Authentication { message: String },
    ModelNotFound { model: String },
    /// Quota or rate limit exhausted.
    RateLimited { message: String },
    InvalidRequest { message: String },
    Server { status: u16, message: String },
    Timeout { message: String },
    Network { message: String },
    /// Transport succeeded but the envelope carried no model output.
    EmptyResponse,
    Other { message: String },
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication { message } => {
                write!(f, "generation authentication failed: {message}")
            }
            Self::ModelNotFound { model } => write!(f, "generation model not found: {model}"),
            Self::RateLimited { message } => write!(f, "generation quota exceeded: {message}"),
            Self::InvalidRequest { message } => write!(f, "generation request rejected: {message}"),
            Self::Server { status, message } => {
                write!(f, "generation service error (HTTP {status}): {message}")
            }
            Self::Timeout { message } => write!(f, "generation request timed out: {message}"),
            Self::Network { message } => write!(f, "generation service unreachable: {message}"),
            Self::EmptyResponse => write!(f, "generation service returned no output"),
            Self::Other { message } => write!(f, "generation failed: {message}"),
        }
    }
}

impl Error for GenerationError {}

/// External text generation service.
///
/// Implementations send the rendered prompt in one call and return the raw,
/// unvalidated model output as a single complete message.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Provider name for diagnostics.
    fn name(&self) -> &str;

    async fn generate(&self, request: &PrioritizationRequest) -> GenerationResult<String>;
}

/// Maps an HTTP error status to a generation failure.
pub fn parse_http_error(status: u16, body: &str, model: &str) -> GenerationError {
    match status {
        401 => GenerationError::Authentication {
            message: "invalid API key".to_string(),
        },
        403 => GenerationError::Authentication {
            message: "access denied".to_string(),
        },
        404 => GenerationError::ModelNotFound {
            model: model.to_string(),
        },
        429 => GenerationError::RateLimited {
            message: body.to_string(),
        },
        400 => GenerationError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => GenerationError::Server {
            status,
            message: body.to_string(),
        },
        _ => GenerationError::Other {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_http_error, GenerationError};

    #[test]
    fn parse_http_error_maps_known_statuses() {
        assert!(matches!(
            parse_http_error(401, "", "m"),
            GenerationError::Authentication { .. }
        ));
        assert!(matches!(
            parse_http_error(429, "quota", "m"),
            GenerationError::RateLimited { message } if message == "quota"
        ));
        assert!(matches!(
            parse_http_error(404, "", "gpt-x"),
            GenerationError::ModelNotFound { model } if model == "gpt-x"
        ));
        assert!(matches!(
            parse_http_error(503, "down", "m"),
            GenerationError::Server { status: 503, .. }
        ));
        assert!(matches!(
            parse_http_error(418, "teapot", "m"),
            GenerationError::Other { .. }
        ));
    }
}
