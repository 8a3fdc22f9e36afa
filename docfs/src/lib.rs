//! # docfs: per-tenant document server
//!
//! `docfs` stores and serves per-tenant documents on a local filesystem. It never decides who may
//! see what: every read is authorized by asking an external Access Control (ACL) service which
//! document the caller's token grants, and every write is authorized by an application API key
//! validated by the same service.
//!
//! ## Architecture
//!
//! - [`storage`]: category-specific path resolution over an asynchronous filesystem abstraction
//! - [`acl`]: the ACL client, deadline-bounded retries and the single-slot API key cache
//! - [`api`]: the REST surface, a thin layer over the two modules above
//!
//! Three document categories exist, each with its own root directory and path layout:
//!
//! | Category           | Path                                    |
//! |--------------------|-----------------------------------------|
//! | user document      | `root/org/userId[5..]/fileName`         |
//! | attachment         | `root/org/fileName`                     |
//! | performance result | `root/org/userId`                       |
//!
//! Organization and user ids are lower-cased; file names are kept as given.
//!
//! ## Getting Started
//!
//! ```bash
//! cargo run -- -f config.yaml
//! ```
//!
//! See [`config`] for the configuration options and their environment variable overrides.
//!
//! ## Testing
//!
//! Tests run against temporary directories and a [wiremock](https://docs.rs/wiremock) ACL
//! service, no external services are needed:
//!
//! ```bash
//! cargo test
//! ```

pub mod acl;
pub mod api;
pub mod config;
pub mod errors;
pub mod storage;
pub mod telemetry;
#[cfg(test)]
mod test_utils;
pub mod types;

use crate::acl::{AccessVerifier, ApiKeyCache, ReqwestAclClient};
use crate::storage::{DocumentStores, LocalFileStore};
use axum::{
    Router,
    routing::{delete, get, post},
};
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};

/// Application state shared across all request handlers.
///
/// Everything in here is built once by [`Application::new`]. The key cache sits behind an `Arc`
/// so every clone of the state sees the same slot.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .documents(documents)
///     .verifier(verifier)
///     .key_cache(Arc::new(key_cache))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub documents: DocumentStores,
    pub verifier: AccessVerifier,
    pub key_cache: Arc<ApiKeyCache>,
}

/// Install the process-wide rustls crypto provider.
///
/// The HTTP client is built without a bundled provider, so this must run before the first
/// [`ReqwestAclClient`] is created. Calling it again is a no-op.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Wire up the storage and ACL layers described by `config`.
pub fn build_state(config: Config) -> anyhow::Result<AppState> {
    let files = Arc::new(LocalFileStore::new(config.storage.max_blocking_operations));
    let documents = DocumentStores::new(
        &config.storage.user_documents,
        &config.storage.attachments,
        &config.storage.performance_results,
        files,
    );

    let client = ReqwestAclClient::new(config.acl.url.clone(), config.acl.request_timeout)?;
    let verifier = AccessVerifier::new(Arc::new(client), config.acl.retry.clone());
    let key_cache = Arc::new(ApiKeyCache::new(verifier.clone()));

    Ok(AppState::builder()
        .config(config)
        .documents(documents)
        .verifier(verifier)
        .key_cache(key_cache)
        .build())
}

/// Build the application router with every route and middleware layer.
pub fn build_router(state: AppState) -> Router {
    use api::handlers::{documents, store};

    let api_routes = Router::new()
        .route("/document", post(store::create_user_document))
        .route("/document/{document_id}", get(documents::get_user_document))
        .route("/document/{organization_id}/{user_id}/{file_name}", delete(store::remove_user_document))
        .route("/attachment", post(store::create_attachment))
        .route("/attachment/{attachment_id}", get(documents::get_attachment))
        .route("/attachment/{organization_id}/{file_name}", delete(store::remove_attachment))
        .route("/performance", get(documents::get_performance_result));

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application: the router plus the configuration it was built from.
///
/// 1. **Create**: [`Application::new`] builds the stores, the ACL client and the key cache
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish and telemetry
///    is flushed
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting docfs with configuration: {:#?}", config);

        let state = build_state(config.clone())?;
        let router = build_router(state);

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "docfs listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
