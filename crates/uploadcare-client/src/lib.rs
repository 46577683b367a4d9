//! # Uploadcare Client SDK
//!
//! An async client for the Uploadcare REST API, Upload API and CDN.
//!
//! ## Features
//!
//! - **REST API**: project info, files, groups, copies and webhooks with
//!   signed (HMAC-SHA1) or simple authentication
//! - **Uploads**: direct and multipart file uploads, uploads from URLs
//! - **Listings**: lazily paginated file and group streams
//! - **CDN**: image transformation paths with argument checks
//! - **Resilience**: pooled connections, retries on throttling and
//!   transient failures
//!
//! ## Example
//!
//! ```rust,ignore
//! use uploadcare_client::{ClientConfig, UploadcareClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = UploadcareClient::new(
//!         ClientConfig::new("your-public-key").with_secret("your-secret-key"),
//!     )?;
//!
//!     // Project info
//!     let project = client.get_project().await?;
//!     println!("Project: {}", project.name);
//!
//!     // Upload a file and store it
//!     let file = client.upload_file("olympia.jpg").await?;
//!     client.store_file(&file.uuid).await?;
//!
//!     // Resized CDN URL
//!     let url = file.cdn_path().resize_width(400).url(client.urls())?;
//!     println!("{}", url);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cdn;
mod client;
mod config;
mod error;
pub mod query;
pub mod transport;
mod types;
pub mod upload;
mod urls;

pub use cdn::{CdnPathBuilder, ImageFormat, ImageQuality};
pub use client::{UploadcareClient, MAX_BATCH_SIZE};
pub use config::{AuthScheme, ClientConfig, DEFAULT_API_BASE, DEFAULT_CDN_BASE, DEFAULT_UPLOAD_BASE};
pub use error::{Result, UploadcareError};
pub use query::{FilesQuery, GroupsQuery, Order, MAX_PAGE_SIZE};
pub use types::*;
pub use upload::{
    FileUploader, ProgressCallback, StoreMode, UploadProgress, UploadSource, Uploader, UrlUploader,
};
pub use urls::Urls;
