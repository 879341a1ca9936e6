//! Error types for credential extraction, outbound credentials and TLS setup

use std::path::PathBuf;
use thiserror::Error;
use tonic::Status;

/// Errors raised while moving OAuth credentials between metadata and callers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OAuthError {
    /// The `basic` payload is not base64, not UTF-8, or has no `:` separator.
    #[error("Basic auth invalid")]
    MalformedBasicAuth,

    /// Credentials that need an encrypted channel were used on a plaintext one.
    #[error("credentials require transport level security")]
    InsecureTransport,

    /// A rendered `authorization` value cannot be carried as ASCII metadata.
    #[error("authorization value is not valid ASCII metadata")]
    InvalidHeaderValue,
}

impl From<OAuthError> for Status {
    fn from(err: OAuthError) -> Self {
        Status::unauthenticated(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors raised while loading TLS material for gRPC channels
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("environment variable {var_name} is not set: {hint}")]
    MissingEnvVar { var_name: String, hint: String },

    #[error("failed to read certificate file {path:?}: {source}")]
    CertificateReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type TlsResult<T> = std::result::Result<T, TlsError>;
