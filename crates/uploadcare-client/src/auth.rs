//! Request signing for the REST API
//!
//! Signed requests carry `Authorization: Uploadcare <pub>:<signature>`, where
//! the signature is an HMAC-SHA1 (keyed with the project secret) over:
//!
//! ```text
//! METHOD
//! MD5(body)
//! Content-Type
//! Date
//! /path/?query
//! ```

use crate::{AuthScheme, ClientConfig, Result, UploadcareError};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;

/// Content type every REST request is signed with
pub const JSON_CONTENT_TYPE: &str = "application/json";

type HmacSha1 = Hmac<Sha1>;

/// Hex MD5 of a request body
pub fn content_md5(body: &[u8]) -> String {
    hex::encode(Md5::digest(body))
}

/// `Date` header format, always GMT
pub fn rfc2822(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

/// Timestamp format used by listing filters
pub fn iso8601(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Compute the hex HMAC-SHA1 request signature
pub fn make_signature(
    secret: &str,
    method: &str,
    body_md5: &str,
    content_type: &str,
    date: &str,
    path_and_query: &str,
) -> Result<String> {
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}\n{}",
        method, body_md5, content_type, date, path_and_query
    );

    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| UploadcareError::Config(format!("unusable secret key: {}", e)))?;
    mac.update(string_to_sign.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build the `Authorization` header value for a REST request
pub fn authorization_header(
    config: &ClientConfig,
    method: &str,
    body_md5: &str,
    date: &str,
    path_and_query: &str,
) -> Result<String> {
    let secret = config
        .secret_key
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            UploadcareError::Authentication("secret key is required for this request".to_string())
        })?;

    match config.auth {
        AuthScheme::Simple => Ok(format!("Uploadcare.Simple {}:{}", config.public_key, secret)),
        AuthScheme::Signed => {
            let signature = make_signature(
                secret,
                method,
                body_md5,
                JSON_CONTENT_TYPE,
                date,
                path_and_query,
            )?;
            Ok(format!("Uploadcare {}:{}", config.public_key, signature))
        }
    }
}
