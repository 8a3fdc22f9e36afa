use crate::acl::AclError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Blank identification fields, blank credentials, or a path that cannot be derived
    #[error("{message}")]
    InvalidRequest { message: String },

    /// Document content is not valid standard Base64
    #[error("Document content is not valid Base64")]
    InvalidContent {
        #[source]
        source: base64::DecodeError,
    },

    /// File or directory does not exist
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// The ACL service denied access, or the API key is not valid
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// The ACL service could not be reached before the retry deadline
    #[error("Access control service unavailable after {attempts} attempts")]
    UpstreamUnavailable {
        attempts: u32,
        #[source]
        source: AclError,
    },

    /// Unexpected filesystem error, distinct from a missing file
    #[error("Failed to {operation} {}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest { message: message.into() }
    }

    /// Classifies a filesystem error, keeping a missing file apart from every other failure.
    pub fn from_io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound {
                resource: path.display().to_string(),
            }
        } else {
            Error::Io { operation, path, source }
        }
    }

    /// Whether the error was caused by the caller's input rather than by the system
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Error::InvalidRequest { .. } | Error::InvalidContent { .. })
    }

    /// An unreachable ACL service means access could not be granted, never a server fault.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidRequest { .. } | Error::InvalidContent { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Unauthorized { .. } | Error::UpstreamUnavailable { .. } => StatusCode::UNAUTHORIZED,
            Error::Io { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log the full error details, at a level matching its severity.
    fn log(&self, context: &str) {
        match self {
            Error::Io { .. } | Error::Other(_) => {
                tracing::error!(status = %self.status_code(), "{context}: {}", render_chain(self));
            }
            Error::UpstreamUnavailable { .. } => {
                tracing::warn!(status = %self.status_code(), "{context}: {}", render_chain(self));
            }
            Error::Unauthorized { .. } => {
                tracing::info!(status = %self.status_code(), "{context}: {}", self);
            }
            Error::InvalidRequest { .. } | Error::InvalidContent { .. } | Error::NotFound { .. } => {
                tracing::debug!(status = %self.status_code(), "{context}: {}", self);
            }
        }
    }
}

fn render_chain(error: &Error) -> String {
    let mut rendered = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// Rejection for document reads.
///
/// Every failure is collapsed into an empty 404 so callers cannot tell a denied request from a
/// missing document.
#[derive(Debug)]
pub struct ReadRejection(pub Error);

impl From<Error> for ReadRejection {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for ReadRejection {
    fn into_response(self) -> Response {
        self.0.log("Document file access error");
        StatusCode::NOT_FOUND.into_response()
    }
}

/// Rejection for document writes and removals: 400 with a `false` JSON body.
#[derive(Debug)]
pub struct WriteRejection(pub Error);

impl From<Error> for WriteRejection {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for WriteRejection {
    fn into_response(self) -> Response {
        self.0.log("Document write/delete error");
        (StatusCode::BAD_REQUEST, Json(false)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
