//! Credential header extractors.
//!
//! A missing (or non-UTF-8) header is rejected with an empty 400 before the handler runs. A
//! header that is present but blank is passed through and rejected by the ACL layer, so it ends
//! in the handler's own failure response.

use crate::acl::client::{API_KEY_HEADER, TOKEN_HEADER};
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

/// The end user's signed token, from the `Token` header
#[derive(Debug, Clone)]
pub struct Token(pub String);

/// The calling application's key, from the `ApiKey` header
#[derive(Debug, Clone)]
pub struct ApiKey(pub String);

#[derive(Debug)]
pub struct MissingHeader(&'static str);

impl IntoResponse for MissingHeader {
    fn into_response(self) -> Response {
        tracing::debug!(header = self.0, "Rejecting request without credential header");
        StatusCode::BAD_REQUEST.into_response()
    }
}

fn required_header(parts: &Parts, name: &'static str) -> Result<String, MissingHeader> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or(MissingHeader(name))
}

impl<S: Send + Sync> FromRequestParts<S> for Token {
    type Rejection = MissingHeader;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        required_header(parts, TOKEN_HEADER).map(Token)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ApiKey {
    type Rejection = MissingHeader;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        required_header(parts, API_KEY_HEADER).map(ApiKey)
    }
}
