//! Single-attempt calls to the ACL service.

use crate::acl::AclError;
use crate::types::{AccessDescriptor, ApplicationAuth, DocumentCategory};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Header carrying the end user's signed token
pub const TOKEN_HEADER: &str = "Token";

/// Header carrying the calling application's API key
pub const API_KEY_HEADER: &str = "ApiKey";

/// The resource an access lookup is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTarget {
    UserDocument(i64),
    Attachment(i64),
    /// The caller's own performance report, identified by the token alone
    PerformanceResult,
}

impl AccessTarget {
    pub fn category(self) -> DocumentCategory {
        match self {
            Self::UserDocument(_) => DocumentCategory::UserDocument,
            Self::Attachment(_) => DocumentCategory::Attachment,
            Self::PerformanceResult => DocumentCategory::PerformanceResult,
        }
    }

    fn path(self) -> String {
        match self {
            Self::UserDocument(id) => format!("document-access/document/{id}"),
            Self::Attachment(id) => format!("document-access/attachment/{id}"),
            Self::PerformanceResult => "document-access/performance-document".to_string(),
        }
    }
}

/// A trait for talking to the ACL service. Implementations make exactly one attempt per call;
/// retrying is the caller's concern, see [`crate::acl::AccessVerifier`].
#[async_trait]
pub trait AclClient: Send + Sync {
    /// Look up which document the token's user may access. Empty fields mean access is denied.
    async fn document_access(&self, token: &str, target: AccessTarget) -> Result<AccessDescriptor, AclError>;

    /// Check whether an application API key is valid.
    async fn validate_api_key(&self, api_key: &str) -> Result<ApplicationAuth, AclError>;
}

/// The concrete implementation of `AclClient`, over HTTP.
pub struct ReqwestAclClient {
    client: Client,
    base_url: Url,
}

impl ReqwestAclClient {
    pub fn new(base_url: Url, request_timeout: Duration) -> Result<Self, AclError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url: ensure_slash(&base_url),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, header: &'static str, credential: &str) -> Result<T, AclError> {
        let url = self.base_url.join(path)?;
        debug!(%url, "Calling access control service");

        let response = self.client.get(url.clone()).header(header, credential).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AclError::Status { url, status, body });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| AclError::Decode { url, source })
    }
}

/// Makes sure a url has a trailing slash, so `join` appends instead of replacing the last segment.
fn ensure_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        url.clone()
    } else {
        let mut new_url = url.clone();
        let path = format!("{}/", new_url.path());
        new_url.set_path(&path);
        new_url
    }
}

#[async_trait]
impl AclClient for ReqwestAclClient {
    async fn document_access(&self, token: &str, target: AccessTarget) -> Result<AccessDescriptor, AclError> {
        self.get(&target.path(), TOKEN_HEADER, token).await
    }

    async fn validate_api_key(&self, api_key: &str) -> Result<ApplicationAuth, AclError> {
        self.get("document-access/key", API_KEY_HEADER, api_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::install_crypto_provider;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ReqwestAclClient {
        install_crypto_provider();
        let base = format!("{}/api", server.uri()).parse().unwrap();
        ReqwestAclClient::new(base, Duration::from_millis(500)).unwrap()
    }

    #[test]
    fn test_ensure_slash() {
        let url: Url = "http://acl:8080/api".parse().unwrap();
        assert_eq!(ensure_slash(&url).as_str(), "http://acl:8080/api/");
        let url: Url = "http://acl:8080/api/".parse().unwrap();
        assert_eq!(ensure_slash(&url).as_str(), "http://acl:8080/api/");
    }

    #[tokio::test]
    async fn test_document_access_paths_and_token_header() {
        let server = MockServer::start().await;
        for (route, target) in [
            ("/api/document-access/document/1", AccessTarget::UserDocument(1)),
            ("/api/document-access/attachment/7", AccessTarget::Attachment(7)),
            ("/api/document-access/performance-document", AccessTarget::PerformanceResult),
        ] {
            Mock::given(method("GET"))
                .and(path(route))
                .and(header(TOKEN_HEADER, "test-token"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "organizationId": "FAKE",
                    "userId": "1267890",
                    "fileName": format!("{:?}", target.category()),
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client_for(&server).await;
        let access = client.document_access("test-token", AccessTarget::UserDocument(1)).await.unwrap();
        assert_eq!(access, AccessDescriptor::new("FAKE", "1267890", "UserDocument"));
        let access = client.document_access("test-token", AccessTarget::Attachment(7)).await.unwrap();
        assert_eq!(access.file_name, "Attachment");
        let access = client.document_access("test-token", AccessTarget::PerformanceResult).await.unwrap();
        assert_eq!(access.file_name, "PerformanceResult");
    }

    #[tokio::test]
    async fn test_validate_api_key_bare_boolean() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/document-access/key"))
            .and(header(API_KEY_HEADER, "apikey"))
            .respond_with(ResponseTemplate::new(200).set_body_json(true))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/document-access/key"))
            .and(header(API_KEY_HEADER, "invalid-apikey"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "authorized": false })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.validate_api_key("apikey").await.unwrap().authorized);
        assert!(!client.validate_api_key("invalid-apikey").await.unwrap().authorized);
    }

    #[tokio::test]
    async fn test_server_error_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.validate_api_key("apikey").await.unwrap_err();
        assert!(matches!(err, AclError::Status { status, .. } if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.document_access("t", AccessTarget::PerformanceResult).await.unwrap_err();
        assert!(matches!(err, AclError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(true).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.validate_api_key("apikey").await.unwrap_err();
        assert!(matches!(err, AclError::Transport(ref e) if e.is_timeout()));
    }
}
