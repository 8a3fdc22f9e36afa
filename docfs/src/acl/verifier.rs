use crate::acl::client::{AccessTarget, AclClient};
use crate::acl::retry::retry_until_deadline;
use crate::config::RetryConfig;
use crate::errors::{Error, Result};
use crate::types::{AccessDescriptor, ApplicationAuth, is_blank};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Resolves tokens and API keys through the ACL service, retrying transient failures.
///
/// Concurrent calls for the same token or key are not coalesced; each makes its own remote
/// calls.
#[derive(Clone)]
pub struct AccessVerifier {
    client: Arc<dyn AclClient>,
    retry: RetryConfig,
}

impl AccessVerifier {
    pub fn new(client: Arc<dyn AclClient>, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    /// Returns the descriptor of the document the token grants access to.
    ///
    /// A descriptor missing any field its category needs is a denial and fails with
    /// `Unauthorized` without retrying.
    #[instrument(skip_all, fields(target = ?target))]
    pub async fn verify(&self, token: &str, target: AccessTarget) -> Result<AccessDescriptor> {
        if is_blank(token) {
            return Err(Error::invalid_request("Token must be set"));
        }

        let access = retry_until_deadline(&self.retry, "document access lookup", || self.client.document_access(token, target)).await?;

        let category = target.category();
        if let Some(field) = category.missing_read_field(&access.organization_id, &access.user_id, &access.file_name) {
            debug!(%category, field, "Access control service denied access");
            return Err(Error::Unauthorized {
                reason: format!("no {category} access granted for this token"),
            });
        }
        Ok(access)
    }

    /// Token-only lookup, for the caller's own performance report.
    pub async fn verify_token(&self, token: &str) -> Result<AccessDescriptor> {
        self.verify(token, AccessTarget::PerformanceResult).await
    }

    /// Validates an application API key. The answer is returned as-is, `authorized: false` is
    /// not an error here.
    #[instrument(skip_all)]
    pub async fn validate_key(&self, api_key: &str) -> Result<ApplicationAuth> {
        if is_blank(api_key) {
            return Err(Error::invalid_request("ApiKey must be set"));
        }
        retry_until_deadline(&self.retry, "api key validation", || self.client.validate_api_key(api_key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::ReqwestAclClient;
    use crate::test_utils::{FakeAclClient, install_crypto_provider, test_retry_config};
    use std::time::{Duration, Instant};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn verifier_for(server: &MockServer, retry: RetryConfig) -> AccessVerifier {
        install_crypto_provider();
        let client = ReqwestAclClient::new(server.uri().parse().unwrap(), Duration::from_millis(300)).unwrap();
        AccessVerifier::new(Arc::new(client), retry)
    }

    #[tokio::test]
    async fn test_verify_returns_descriptor() {
        let fake = Arc::new(FakeAclClient::granting(AccessDescriptor::new("FAKE", "1267890", "document.pdf")));
        let verifier = AccessVerifier::new(fake.clone(), test_retry_config());

        let access = verifier.verify("test-token", AccessTarget::UserDocument(1)).await.unwrap();
        assert_eq!(access.file_name, "document.pdf");
        assert_eq!(fake.access_calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_token_makes_no_remote_call() {
        let fake = Arc::new(FakeAclClient::granting(AccessDescriptor::new("FAKE", "1267890", "document.pdf")));
        let verifier = AccessVerifier::new(fake.clone(), test_retry_config());

        let result = verifier.verify("  ", AccessTarget::UserDocument(1)).await;
        assert!(matches!(result, Err(Error::InvalidRequest { .. })));
        assert_eq!(fake.access_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_descriptor_is_denied_without_retry() {
        let fake = Arc::new(FakeAclClient::granting(AccessDescriptor::default()));
        let verifier = AccessVerifier::new(fake.clone(), test_retry_config());

        let result = verifier.verify("invalid-token", AccessTarget::Attachment(3)).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        assert_eq!(fake.access_calls(), 1);
    }

    #[tokio::test]
    async fn test_performance_result_needs_no_file_name() {
        let fake = Arc::new(FakeAclClient::granting(AccessDescriptor::new("FAKE", "1267890", "")));
        let verifier = AccessVerifier::new(fake, test_retry_config());

        let access = verifier.verify_token("test-token").await.unwrap();
        assert_eq!(access.user_id, "1267890");
    }

    #[tokio::test]
    async fn test_user_document_without_file_name_is_denied() {
        let fake = Arc::new(FakeAclClient::granting(AccessDescriptor::new("FAKE", "1267890", "")));
        let verifier = AccessVerifier::new(fake, test_retry_config());

        let result = verifier.verify("test-token", AccessTarget::UserDocument(1)).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_attachment_without_user_is_denied_without_retry() {
        let fake = Arc::new(FakeAclClient::granting(AccessDescriptor::new("FAKE", "", "handbook.pdf")));
        let verifier = AccessVerifier::new(fake.clone(), test_retry_config());

        let result = verifier.verify("test-token", AccessTarget::Attachment(3)).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        assert_eq!(fake.access_calls(), 1);
    }

    #[tokio::test]
    async fn test_validate_key_returns_denial_as_value() {
        let fake = Arc::new(FakeAclClient::with_keys(&["apikey"]));
        let verifier = AccessVerifier::new(fake.clone(), test_retry_config());

        assert!(verifier.validate_key("apikey").await.unwrap().authorized);
        assert!(!verifier.validate_key("other").await.unwrap().authorized);
        assert_eq!(fake.key_calls(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_server_errors_are_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/document-access/document/1"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/document-access/document/1"))
            .and(header("Token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "organizationId": "FAKE",
                "userId": "1267890",
                "fileName": "document.pdf"
            })))
            .with_priority(2)
            .mount(&server)
            .await;

        let verifier = verifier_for(&server, test_retry_config()).await;
        let access = verifier.verify("test-token", AccessTarget::UserDocument(1)).await.unwrap();
        assert_eq!(access, AccessDescriptor::new("FAKE", "1267890", "document.pdf"));
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[test_log::test(tokio::test)]
    async fn test_null_fields_are_a_denial_not_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/document-access/attachment/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "organizationId": "FAKE",
                "userId": null,
                "fileName": null
            })))
            .mount(&server)
            .await;

        let verifier = verifier_for(&server, test_retry_config()).await;
        let result = verifier.verify("test-token", AccessTarget::Attachment(3)).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_continuous_failure_gives_up_at_deadline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(150)))
            .mount(&server)
            .await;

        let retry = RetryConfig {
            initial_backoff: Duration::from_millis(20),
            max_backoff: Duration::from_millis(100),
            expiration: Duration::from_millis(600),
        };
        let verifier = verifier_for(&server, retry).await;

        let started = Instant::now();
        let result = verifier.verify("test-token", AccessTarget::UserDocument(4)).await;
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(Error::UpstreamUnavailable { .. })));
        assert!(elapsed < Duration::from_millis(1000), "took {elapsed:?}");
        assert!(server.received_requests().await.unwrap().len() >= 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_unresponsive_service_is_bounded_by_deadline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(true).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        install_crypto_provider();
        // Per-request timeout longer than the whole retry budget.
        let client = ReqwestAclClient::new(server.uri().parse().unwrap(), Duration::from_secs(10)).unwrap();
        let retry = RetryConfig {
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_millis(50),
            expiration: Duration::from_millis(300),
        };
        let verifier = AccessVerifier::new(Arc::new(client), retry);

        let started = Instant::now();
        let result = verifier.validate_key("delayed-apikey").await;
        assert!(matches!(result, Err(Error::UpstreamUnavailable { .. })));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
