//! Client configuration

use crate::{Result, UploadcareError};
use std::time::Duration;

/// REST API root
pub const DEFAULT_API_BASE: &str = "https://api.uploadcare.com";
/// Upload API root
pub const DEFAULT_UPLOAD_BASE: &str = "https://upload.uploadcare.com";
/// CDN root
pub const DEFAULT_CDN_BASE: &str = "https://ucarecdn.com";

/// How REST API requests are authenticated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthScheme {
    /// HMAC-SHA1 request signature (secret key never leaves the process)
    #[default]
    Signed,
    /// Public and secret key sent in plain text
    Simple,
}

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Project public key
    pub public_key: String,
    /// Project secret key, required for the REST API
    pub secret_key: Option<String>,
    /// REST API authentication scheme
    pub auth: AuthScheme,
    /// REST API base URL
    pub api_base: String,
    /// Upload API base URL
    pub upload_base: String,
    /// CDN base URL
    pub cdn_base: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent prefix, the public key is appended per request
    pub user_agent: String,
    /// Maximum retry attempts for throttled or transient failures
    pub max_retries: u32,
    /// First retry delay, doubled on every attempt
    pub retry_base_delay: Duration,
    /// Upper bound for a single retry delay
    pub max_retry_delay: Duration,
    /// Idle pooled connections kept per host
    pub pool_max_idle_per_host: usize,
    /// Files larger than this go through multipart upload (bytes)
    pub multipart_threshold: u64,
    /// Multipart chunk size (bytes)
    pub multipart_chunk_size: u64,
    /// Delay between URL upload status checks
    pub url_poll_interval: Duration,
    /// Give up on a URL upload after this long
    pub url_poll_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            public_key: String::new(),
            secret_key: None,
            auth: AuthScheme::Signed,
            api_base: DEFAULT_API_BASE.to_string(),
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
            cdn_base: DEFAULT_CDN_BASE.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("rust-uploadcare/{}", env!("CARGO_PKG_VERSION")),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            max_retry_delay: Duration::from_secs(10),
            pool_max_idle_per_host: 20,
            multipart_threshold: 10 * 1024 * 1024, // 10 MiB
            multipart_chunk_size: 5 * 1024 * 1024, // 5 MiB
            url_poll_interval: Duration::from_millis(500),
            url_poll_timeout: Duration::from_secs(5 * 60),
        }
    }
}

impl ClientConfig {
    /// Create a new config with the given public key
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            ..Default::default()
        }
    }

    /// Config for the public demo project
    pub fn demo() -> Self {
        Self::new("demopublickey").with_secret("demosecretkey")
    }

    /// Demo project config without a secret key (Upload API only)
    pub fn demo_upload_only() -> Self {
        Self::new("demopublickey")
    }

    /// Build a config from `UPLOADCARE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let public_key = std::env::var("UPLOADCARE_PUBLIC_KEY")
            .map_err(|_| UploadcareError::Config("UPLOADCARE_PUBLIC_KEY is not set".to_string()))?;

        let mut config = Self::new(public_key);
        if let Ok(secret) = std::env::var("UPLOADCARE_SECRET_KEY") {
            config = config.with_secret(secret);
        }
        if let Ok(base) = std::env::var("UPLOADCARE_API_BASE") {
            config = config.with_api_base(base);
        }
        if let Ok(base) = std::env::var("UPLOADCARE_UPLOAD_BASE") {
            config = config.with_upload_base(base);
        }
        if let Ok(base) = std::env::var("UPLOADCARE_CDN_BASE") {
            config = config.with_cdn_base(base);
        }
        if let Ok(flag) = std::env::var("UPLOADCARE_SIMPLE_AUTH") {
            if matches!(flag.as_str(), "1" | "true" | "yes") {
                config = config.with_simple_auth();
            }
        }
        Ok(config)
    }

    /// Set the secret key
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret_key = Some(secret.into());
        self
    }

    /// Use simple authentication instead of request signatures
    pub fn with_simple_auth(mut self) -> Self {
        self.auth = AuthScheme::Simple;
        self
    }

    /// Override the REST API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = trim_base(base.into());
        self
    }

    /// Override the Upload API base URL
    pub fn with_upload_base(mut self, base: impl Into<String>) -> Self {
        self.upload_base = trim_base(base.into());
        self
    }

    /// Override the CDN base URL
    pub fn with_cdn_base(mut self, base: impl Into<String>) -> Self {
        self.cdn_base = trim_base(base.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Whether REST API calls can be authenticated
    pub fn has_secret(&self) -> bool {
        self.secret_key.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Reject configurations that can never make a request
    pub fn validate(&self) -> Result<()> {
        if self.public_key.is_empty() {
            return Err(UploadcareError::Config("public key is empty".to_string()));
        }
        if self.multipart_chunk_size == 0 {
            return Err(UploadcareError::Config("multipart chunk size must be positive".to_string()));
        }
        Ok(())
    }
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}
