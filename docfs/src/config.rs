//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `DOCFS_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `DOCFS_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `DOCFS_ACL__RETRY__EXPIRATION=5s` sets the `acl.retry.expiration` field.
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 3000
//! storage:
//!   user_documents: /var/lib/docfs/user
//!   attachments: /var/lib/docfs/attachment
//!   performance_results: /var/lib/docfs/performance
//!   max_blocking_operations: 16
//! acl:
//!   url: http://acl.internal:8080/api
//!   request_timeout: 1s
//!   retry:
//!     initial_backoff: 200ms
//!     max_backoff: 1s
//!     expiration: 2s
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "DOCFS_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Document root directories and filesystem worker pool
    pub storage: StorageConfig,
    /// Access control service client
    pub acl: AclConfig,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// One root directory per document category.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub user_documents: PathBuf,
    pub attachments: PathBuf,
    pub performance_results: PathBuf,
    /// Maximum number of filesystem syscalls running at once on the blocking pool
    pub max_blocking_operations: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AclConfig {
    /// Base URL of the ACL service; `document-access/...` paths are resolved against it
    pub url: Url,
    /// Timeout of a single HTTP request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub retry: RetryConfig,
}

/// Exponential backoff for ACL calls, bounded by an absolute deadline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Wait before the first retry
    #[serde(with = "humantime_serde")]
    pub initial_backoff: Duration,
    /// Upper bound for a single wait between retries
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
    /// Time after the first attempt at which retrying gives up
    #[serde(with = "humantime_serde")]
    pub expiration: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            storage: StorageConfig::default(),
            acl: AclConfig::default(),
            enable_otel_export: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            user_documents: PathBuf::from("./data/user"),
            attachments: PathBuf::from("./data/attachment"),
            performance_results: PathBuf::from("./data/performance"),
            max_blocking_operations: 16,
        }
    }
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            url: Url::parse("http://localhost:8081/").expect("default ACL url is valid"),
            request_timeout: Duration::from_secs(1),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(1),
            expiration: Duration::from_secs(2),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables override specific values; DOCFS_CONFIG only names the file
            .merge(Env::prefixed("DOCFS_").ignore(&["CONFIG"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.storage.max_blocking_operations == 0 {
            return Err(Error::invalid_request(
                "Config validation: storage.max_blocking_operations must be greater than zero",
            ));
        }

        let retry = &self.acl.retry;
        if retry.expiration.is_zero() {
            return Err(Error::invalid_request("Config validation: acl.retry.expiration must be greater than zero"));
        }
        if retry.initial_backoff.is_zero() {
            return Err(Error::invalid_request(
                "Config validation: acl.retry.initial_backoff must be greater than zero",
            ));
        }
        if retry.initial_backoff > retry.expiration {
            return Err(Error::invalid_request(format!(
                "Config validation: acl.retry.initial_backoff ({:?}) is longer than acl.retry.expiration ({:?}), no retry would ever run",
                retry.initial_backoff, retry.expiration
            )));
        }
        if retry.max_backoff < retry.initial_backoff {
            return Err(Error::invalid_request(
                "Config validation: acl.retry.max_backoff must not be shorter than acl.retry.initial_backoff",
            ));
        }

        Ok(())
    }
}
