//! Test utilities: an in-process ACL fake, small retry budgets and a ready-made application.

use crate::acl::{AccessTarget, AclClient, AclError};
use crate::config::{AclConfig, Config, RetryConfig, StorageConfig};
use crate::types::{AccessDescriptor, ApplicationAuth};
use async_trait::async_trait;
use axum_test::TestServer;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

pub use crate::install_crypto_provider;

/// Retry budget small enough to keep failing tests fast.
pub fn test_retry_config() -> RetryConfig {
    RetryConfig {
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(50),
        expiration: Duration::from_millis(200),
    }
}

/// Configuration with every storage root under `dir` and the ACL service at `acl_url`.
pub fn create_test_config(dir: &Path, acl_url: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        storage: StorageConfig {
            user_documents: dir.join("user"),
            attachments: dir.join("attachment"),
            performance_results: dir.join("performance"),
            max_blocking_operations: 4,
        },
        acl: AclConfig {
            url: Url::parse(acl_url).expect("test ACL url is valid"),
            request_timeout: Duration::from_millis(500),
            retry: test_retry_config(),
        },
        enable_otel_export: false,
    }
}

pub async fn create_test_app(dir: &Path, acl_url: &str) -> TestServer {
    install_crypto_provider();
    let app = crate::Application::new(create_test_config(dir, acl_url))
        .await
        .expect("Failed to create application");
    app.into_test_server()
}

enum Behaviour {
    Answer {
        access: AccessDescriptor,
        keys: HashSet<String>,
    },
    Unavailable,
}

/// In-process [`AclClient`] with call counters.
pub struct FakeAclClient {
    behaviour: Behaviour,
    access_calls: AtomicUsize,
    key_calls: AtomicUsize,
}

impl FakeAclClient {
    fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            access_calls: AtomicUsize::new(0),
            key_calls: AtomicUsize::new(0),
        }
    }

    /// Answers every token with `access` and rejects every API key.
    pub fn granting(access: AccessDescriptor) -> Self {
        Self::new(Behaviour::Answer {
            access,
            keys: HashSet::new(),
        })
    }

    /// Accepts exactly `keys` and denies every token.
    pub fn with_keys(keys: &[&str]) -> Self {
        Self::new(Behaviour::Answer {
            access: AccessDescriptor::default(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        })
    }

    /// Fails every call as if the service were down.
    pub fn unavailable() -> Self {
        Self::new(Behaviour::Unavailable)
    }

    pub fn access_calls(&self) -> usize {
        self.access_calls.load(Ordering::SeqCst)
    }

    pub fn key_calls(&self) -> usize {
        self.key_calls.load(Ordering::SeqCst)
    }

    fn down() -> AclError {
        AclError::Status {
            url: Url::parse("http://acl.invalid/").expect("static url is valid"),
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: String::new(),
        }
    }
}

#[async_trait]
impl AclClient for FakeAclClient {
    async fn document_access(&self, _token: &str, _target: AccessTarget) -> Result<AccessDescriptor, AclError> {
        self.access_calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Answer { access, .. } => Ok(access.clone()),
            Behaviour::Unavailable => Err(Self::down()),
        }
    }

    async fn validate_api_key(&self, api_key: &str) -> Result<ApplicationAuth, AclError> {
        self.key_calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Answer { keys, .. } => Ok(ApplicationAuth {
                authorized: keys.contains(api_key),
            }),
            Behaviour::Unavailable => Err(Self::down()),
        }
    }
}
