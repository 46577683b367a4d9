//! HTTP transport: pooled connections, API headers, retries and status mapping
//!
//! Every request body is kept in a replayable form (JSON bytes, text fields,
//! file paths) so the same [`ApiRequest`] can be sent again after a throttled
//! or transient failure. Multipart forms are rebuilt per attempt and REST
//! requests are re-signed with a fresh `Date`.

use crate::{
    auth::{self, JSON_CONTENT_TYPE},
    ClientConfig, Result, UploadcareError,
};
use bytes::Bytes;
use chrono::Utc;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    multipart::{Form, Part},
    Client, Method, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// REST API version negotiated through `Accept`
pub const API_ACCEPT: &str = "application/vnd.uploadcare-v0.6+json";

/// A file attached to a multipart form
#[derive(Clone, Debug)]
pub struct FilePart {
    /// Form field name
    pub field: String,
    /// File name reported to the server
    pub filename: String,
    pub content_type: String,
    pub content: PartContent,
}

/// Where a file part's bytes come from
#[derive(Clone, Debug)]
pub enum PartContent {
    /// In-memory data
    Bytes(Bytes),
    /// Streamed from disk, reopened on every attempt
    Path { path: PathBuf, size: u64 },
}

/// Text fields plus an optional file for multipart/form-data
#[derive(Clone, Debug, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    file: Option<FilePart>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.file = Some(part);
        self
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Look up the first text field with this name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    async fn to_form(&self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }

        if let Some(file) = &self.file {
            let part = match &file.content {
                PartContent::Bytes(data) => Part::stream_with_length(data.clone(), data.len() as u64),
                PartContent::Path { path, size } => {
                    let handle = tokio::fs::File::open(path).await?;
                    Part::stream_with_length(handle, *size)
                }
            };
            let part = part
                .file_name(file.filename.clone())
                .mime_str(&file.content_type)?;
            form = form.part(file.field.clone(), part);
        }

        Ok(form)
    }
}

/// Request payload
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized JSON document
    Json(Bytes),
    /// multipart/form-data
    Form(FormData),
    /// Raw bytes with an explicit content type
    Raw { data: Bytes, content_type: String },
}

/// A request described as data, sent by [`Transport`]
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub body: RequestBody,
    /// Attach REST API headers and authorization
    pub api_headers: bool,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: RequestBody::Empty,
            api_headers: false,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: Url) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Mark as a REST API call (signed, versioned)
    pub fn rest(mut self) -> Self {
        self.api_headers = true;
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(Bytes::from(serde_json::to_vec(body)?));
        Ok(self)
    }

    pub fn form(mut self, form: FormData) -> Self {
        self.body = RequestBody::Form(form);
        self
    }

    pub fn raw(mut self, data: Bytes, content_type: impl Into<String>) -> Self {
        self.body = RequestBody::Raw {
            data,
            content_type: content_type.into(),
        };
        self
    }

    /// Path plus query as signed by the REST API
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }

    fn body_md5(&self) -> String {
        match &self.body {
            RequestBody::Json(data) => auth::content_md5(data),
            RequestBody::Raw { data, .. } => auth::content_md5(data),
            RequestBody::Empty | RequestBody::Form(_) => auth::content_md5(b""),
        }
    }
}

/// Sends [`ApiRequest`]s over a pooled connection
#[derive(Clone, Debug)]
pub struct Transport {
    config: ClientConfig,
    http: Client,
}

impl Transport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&user_agent(&config))
                .map_err(|e| UploadcareError::Config(format!("invalid user agent: {}", e)))?,
        );

        let http = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .default_headers(headers)
            .build()
            .map_err(UploadcareError::Http)?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send the request and decode the JSON response
    pub async fn query<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let response = self.execute(request).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Send the request, ignoring the response body
    pub async fn command(&self, request: &ApiRequest) -> Result<()> {
        self.execute(request).await?;
        Ok(())
    }

    /// Send with retries; returns the successful response
    pub async fn execute(&self, request: &ApiRequest) -> Result<Response> {
        let mut attempt = 0u32;
        loop {
            match self.send_once(request).await {
                Ok(response) => return Ok(response),
                Err(failure) if failure.error.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.retry_delay(&failure, attempt);
                    attempt += 1;
                    warn!(
                        "{} {} failed ({}), retry {}/{} in {:?}",
                        request.method, request.url, failure.error, attempt, self.config.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    async fn send_once(&self, request: &ApiRequest) -> std::result::Result<Response, Failure> {
        let builder = self.build(request).await?;

        debug!("Sending {} request to {}", request.method, request.url);
        let response = builder.send().await.map_err(UploadcareError::Http)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await.unwrap_or_default();

        debug!("{} {} returned {}: {}", request.method, request.url, status, body);
        let error = match UploadcareError::from_status(status.as_u16(), body) {
            UploadcareError::Throttled { .. } => UploadcareError::Throttled { retry_after },
            err => err,
        };
        Err(Failure { error, retry_after })
    }

    async fn build(&self, request: &ApiRequest) -> Result<RequestBuilder> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone());

        if request.api_headers {
            let date = auth::rfc2822(Utc::now());
            let authorization = auth::authorization_header(
                &self.config,
                request.method.as_str(),
                &request.body_md5(),
                &date,
                &request.path_and_query(),
            )?;
            builder = builder
                .header(header::ACCEPT, API_ACCEPT)
                .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
                .header(header::DATE, date)
                .header(header::AUTHORIZATION, authorization);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            // REST requests already carry the JSON content type
            RequestBody::Json(data) if request.api_headers => builder.body(data.clone()),
            RequestBody::Json(data) => builder
                .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(data.clone()),
            RequestBody::Form(form) => builder.multipart(form.to_form().await?),
            RequestBody::Raw { data, content_type } => builder
                .header(header::CONTENT_TYPE, content_type.as_str())
                .body(data.clone()),
        };

        Ok(builder)
    }

    /// `Retry-After` as sent by the server; computed backoff otherwise
    fn retry_delay(&self, failure: &Failure, attempt: u32) -> Duration {
        match failure.retry_after {
            Some(delay) => delay,
            None => backoff(self.config.retry_base_delay, self.config.max_retry_delay, attempt),
        }
    }
}

/// A failed attempt together with the server's `Retry-After`, if any
#[derive(Debug)]
struct Failure {
    error: UploadcareError,
    retry_after: Option<Duration>,
}

impl From<UploadcareError> for Failure {
    fn from(error: UploadcareError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

/// `base * 2^attempt`, capped at `max`
pub fn backoff(base: Duration, max: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    base.checked_mul(factor).unwrap_or(max).min(max)
}

fn user_agent(config: &ClientConfig) -> String {
    format!("{}/{}", config.user_agent, config.public_key)
}
