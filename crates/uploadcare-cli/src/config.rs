//! Connection settings shared by every subcommand

use clap::Args;
use std::time::Duration;
use uploadcare_client::{ClientConfig, DEFAULT_API_BASE, DEFAULT_CDN_BASE, DEFAULT_UPLOAD_BASE};

/// Project keys and endpoints, from flags or `UPLOADCARE_*` variables
#[derive(Args, Clone, Debug)]
pub struct Connection {
    /// Project public key
    #[arg(long, env = "UPLOADCARE_PUBLIC_KEY", default_value = "demopublickey")]
    pub public_key: String,

    /// Project secret key, needed for everything except uploads
    #[arg(long, env = "UPLOADCARE_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Send the secret key as is instead of signing requests
    #[arg(long, env = "UPLOADCARE_SIMPLE_AUTH")]
    pub simple_auth: bool,

    /// REST API base URL
    #[arg(long, env = "UPLOADCARE_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Upload API base URL
    #[arg(long, env = "UPLOADCARE_UPLOAD_BASE", default_value = DEFAULT_UPLOAD_BASE)]
    pub upload_base: String,

    /// CDN base URL
    #[arg(long, env = "UPLOADCARE_CDN_BASE", default_value = DEFAULT_CDN_BASE)]
    pub cdn_base: String,

    /// Request timeout in seconds
    #[arg(long, env = "UPLOADCARE_TIMEOUT", default_value = "30")]
    pub timeout: u64,

    /// Retries for throttled or failed requests
    #[arg(long, env = "UPLOADCARE_MAX_RETRIES", default_value = "3")]
    pub max_retries: u32,
}

impl Connection {
    /// Build the client configuration
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.public_key.as_str())
            .with_api_base(self.api_base.as_str())
            .with_upload_base(self.upload_base.as_str())
            .with_cdn_base(self.cdn_base.as_str())
            .with_timeout(Duration::from_secs(self.timeout))
            .with_max_retries(self.max_retries);
        if let Some(secret) = self.secret_key.as_deref().filter(|s| !s.is_empty()) {
            config = config.with_secret(secret);
        }
        if self.simple_auth {
            config = config.with_simple_auth();
        }
        config
    }
}
