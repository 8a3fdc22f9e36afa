//! Delegation to the external Access Control (ACL) service.
//!
//! Every document read is authorized by asking the ACL service which document the caller's
//! token grants access to. Writes and removals are authorized by an application API key,
//! validated by the same service and remembered in a single-slot cache.
//!
//! ```text
//! read:   token ──► AccessVerifier::verify ──► AccessDescriptor ──► DocumentStore::read
//!                        │
//!                        └─ retry_until_deadline(AclClient::document_access)
//!
//! write:  api key ──► ApiKeyCache::check_or_set ──► DocumentStore::write / remove
//!                        │ (cache miss)
//!                        └─ AccessVerifier::validate_key
//!                             └─ retry_until_deadline(AclClient::validate_api_key)
//! ```
//!
//! Failures of a single call (transport errors, timeouts, non-2xx statuses, undecodable
//! bodies) are retried with exponential backoff until an absolute deadline. A well-formed
//! answer that denies access is final and never retried.

pub mod client;
pub mod key_cache;
pub mod retry;
pub mod verifier;

pub use client::{AccessTarget, AclClient, ReqwestAclClient};
pub use key_cache::ApiKeyCache;
pub use verifier::AccessVerifier;

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// Failure of a single ACL call. Every variant is treated as transient and retried.
#[derive(Error, Debug)]
pub enum AclError {
    /// Connection, TLS or timeout error from the HTTP client
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-2xx status
    #[error("Access control service returned {status} for {url}: {body}")]
    Status { url: Url, status: StatusCode, body: String },

    /// The 2xx body could not be decoded
    #[error("Failed to decode access control response from {url}")]
    Decode {
        url: Url,
        #[source]
        source: serde_json::Error,
    },

    /// Request URL could not be built from the configured base URL
    #[error("Invalid access control URL: {0}")]
    Url(#[from] url::ParseError),

    /// The attempt was cut off because the retry deadline passed
    #[error("Attempt abandoned at the retry deadline")]
    DeadlineExceeded,
}
