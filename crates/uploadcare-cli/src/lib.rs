//! # Uploadcare CLI
//!
//! Command line access to an Uploadcare project: project info, file and
//! group listings, uploads, storage management, webhooks and CDN URLs.
//!
//! Keys and endpoints come from flags, `UPLOADCARE_*` environment variables
//! or a `.env` file.

pub mod commands;
pub mod config;

pub use commands::{run, Cli, Command};
pub use config::Connection;
