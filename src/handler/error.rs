//! Dispatch failures
//!
//! Every failure ends the request with exactly one structured error response.

use hyper::StatusCode;
use thiserror::Error;

use super::endpoint::Endpoint;
use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No Authorization header found in request")]
    MissingAuthHeader,

    #[error("{0}")]
    AuthenticationFailed(AuthError),

    #[error("Invalid BIRD endpoint")]
    InvalidEndpoint(String),

    #[error("Resource for endpoint {endpoint} is unavailable")]
    ArtifactUnavailable {
        endpoint: Endpoint,
        #[source]
        source: std::io::Error,
    },
}

impl DispatchError {
    /// Failure kind rendered as the `class` attribute
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingAuthHeader => "MissingAuthHeader",
            Self::AuthenticationFailed(_) => "AuthenticationFailed",
            Self::InvalidEndpoint(_) => "InvalidEndpoint",
            Self::ArtifactUnavailable { .. } => "ArtifactUnavailable",
        }
    }

    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingAuthHeader => "noauthheader",
            Self::AuthenticationFailed(err) => err.error_code(),
            Self::InvalidEndpoint(_) => "invalidendpoint",
            Self::ArtifactUnavailable { .. } => "artifactunavailable",
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingAuthHeader | Self::AuthenticationFailed(_) => StatusCode::FORBIDDEN,
            Self::InvalidEndpoint(_) => StatusCode::BAD_REQUEST,
            Self::ArtifactUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Diagnostic detail, rendered only in debug mode
    pub fn debug_info(&self) -> Option<String> {
        match self {
            Self::MissingAuthHeader => None,
            Self::AuthenticationFailed(err) => err.debug_info(),
            Self::InvalidEndpoint(value) => Some(format!(
                "requested '{value}', supported endpoints: {}",
                Endpoint::ALL.map(Endpoint::as_str).join(", ")
            )),
            Self::ArtifactUnavailable { endpoint, source } => {
                Some(format!("{}: {source}", endpoint.artifact_name()))
            }
        }
    }
}

impl From<AuthError> for DispatchError {
    fn from(err: AuthError) -> Self {
        Self::AuthenticationFailed(err)
    }
}
