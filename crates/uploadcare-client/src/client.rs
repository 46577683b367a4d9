//! Main client implementation

use crate::{
    query::{FilesQuery, GroupsQuery},
    transport::{ApiRequest, FormData, Transport},
    types::*,
    upload::{FileUploader, UploadSource, Uploader, UrlUploader},
    ClientConfig, Result, UploadcareError, Urls,
};
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::{debug, instrument};

/// Most ids the REST API accepts in one batch store/delete call
pub const MAX_BATCH_SIZE: usize = 100;

/// Uploadcare API client
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Clone, Debug)]
pub struct UploadcareClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    transport: Transport,
    urls: Urls,
}

impl UploadcareClient {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let urls = Urls::new(&config);
        let transport = Transport::new(config)?;
        Ok(Self {
            inner: Arc::new(Inner { transport, urls }),
        })
    }

    /// Client for the public demo project
    pub fn demo() -> Result<Self> {
        Self::new(ClientConfig::demo())
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.transport.config()
    }

    pub fn urls(&self) -> &Urls {
        &self.inner.urls
    }

    pub fn transport(&self) -> &Transport {
        &self.inner.transport
    }

    pub fn public_key(&self) -> &str {
        &self.config().public_key
    }

    // ==================== Project ====================

    /// Project name, public key and collaborators
    #[instrument(skip(self))]
    pub async fn get_project(&self) -> Result<ProjectInfo> {
        self.rest_query(ApiRequest::get(self.urls().project()?)).await
    }

    // ==================== Files ====================

    /// File metadata via the REST API
    #[instrument(skip(self))]
    pub async fn get_file(&self, file_id: &str) -> Result<FileInfo> {
        self.rest_query(ApiRequest::get(self.urls().file(file_id)?)).await
    }

    /// File metadata with extra fields, e.g. `rekognition_info`
    #[instrument(skip(self))]
    pub async fn get_file_with_fields(&self, file_id: &str, fields: &str) -> Result<FileInfo> {
        let url = self.urls().file_with_fields(file_id, fields)?;
        self.rest_query(ApiRequest::get(url)).await
    }

    #[instrument(skip(self))]
    pub async fn get_file_with_rekognition_info(&self, file_id: &str) -> Result<FileInfo> {
        self.get_file_with_fields(file_id, "rekognition_info").await
    }

    /// File metadata via the Upload API; only needs the public key
    #[instrument(skip(self))]
    pub async fn get_uploaded_file(&self, file_id: &str) -> Result<FileInfo> {
        let url = self.urls().upload_file_info(self.public_key(), file_id)?;
        self.transport().query(&ApiRequest::get(url)).await
    }

    /// Start a file listing
    pub fn files(&self) -> FilesQuery {
        FilesQuery::new(self.clone())
    }

    /// Mark a file as stored so it is not purged
    #[instrument(skip(self))]
    pub async fn store_file(&self, file_id: &str) -> Result<()> {
        self.rest_command(ApiRequest::put(self.urls().file_storage(file_id)?))
            .await
    }

    /// Mark a file as deleted
    #[instrument(skip(self))]
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.rest_command(ApiRequest::delete(self.urls().file(file_id)?))
            .await
    }

    /// Store many files, [`MAX_BATCH_SIZE`] per request
    #[instrument(skip(self, file_ids), fields(count = file_ids.len()))]
    pub async fn store_files<S: AsRef<str>>(&self, file_ids: &[S]) -> Result<()> {
        self.batch(file_ids, ApiRequest::put).await
    }

    /// Delete many files, [`MAX_BATCH_SIZE`] per request
    #[instrument(skip(self, file_ids), fields(count = file_ids.len()))]
    pub async fn delete_files<S: AsRef<str>>(&self, file_ids: &[S]) -> Result<()> {
        self.batch(file_ids, ApiRequest::delete).await
    }

    // ==================== Copies ====================

    /// Copy a file (or a CDN path of it) within the default storage
    #[instrument(skip(self))]
    pub async fn copy_file_local(
        &self,
        source: &str,
        store: bool,
        make_public: bool,
    ) -> Result<CopyResult> {
        let options = CopyOptions {
            source: source.to_string(),
            store: Some(store),
            make_public: Some(make_public),
            ..Default::default()
        };
        let request = ApiRequest::post(self.urls().files_local_copy()?).json(&options)?;
        self.rest_query(request).await
    }

    /// Copy a file to a custom storage attached to the project
    #[instrument(skip(self))]
    pub async fn copy_file_remote(
        &self,
        source: &str,
        target: &str,
        make_public: bool,
        pattern: Option<&str>,
    ) -> Result<CopyResult> {
        let options = CopyOptions {
            source: source.to_string(),
            target: Some(target.to_string()),
            make_public: Some(make_public),
            pattern: pattern.map(str::to_string),
            ..Default::default()
        };
        let request = ApiRequest::post(self.urls().files_remote_copy()?).json(&options)?;
        self.rest_query(request).await
    }

    // ==================== Groups ====================

    #[instrument(skip(self))]
    pub async fn get_group(&self, group_id: &str) -> Result<GroupInfo> {
        self.rest_query(ApiRequest::get(self.urls().group(group_id)?)).await
    }

    /// Group info via the Upload API; only needs the public key
    #[instrument(skip(self))]
    pub async fn get_uploaded_group(&self, group_id: &str) -> Result<GroupInfo> {
        let url = self.urls().upload_group_info(self.public_key(), group_id)?;
        self.transport().query(&ApiRequest::get(url)).await
    }

    /// Start a group listing
    pub fn groups(&self) -> GroupsQuery {
        GroupsQuery::new(self.clone())
    }

    /// Store every file of a group
    #[instrument(skip(self))]
    pub async fn store_group(&self, group_id: &str) -> Result<()> {
        self.rest_command(ApiRequest::put(self.urls().group_storage(group_id)?))
            .await
    }

    /// Join uploaded files into a new group
    #[instrument(skip(self, file_ids, options), fields(count = file_ids.len()))]
    pub async fn create_group<S: AsRef<str>>(
        &self,
        file_ids: &[S],
        options: GroupOptions,
    ) -> Result<GroupInfo> {
        if file_ids.is_empty() {
            return Err(UploadcareError::InvalidArgument(
                "a group needs at least one file".to_string(),
            ));
        }

        let mut form = FormData::new().text("pub_key", self.public_key());
        if let Some(callback) = &options.callback {
            form = form.text("callback", callback.as_str());
        }
        if let Some((signature, expire)) = options.signature_pair() {
            form = form.text("signature", signature).text("expire", expire);
        }
        for (i, file_id) in file_ids.iter().enumerate() {
            form = form.text(format!("files[{}]", i), file_id.as_ref());
        }

        let request = ApiRequest::post(self.urls().upload_group()?).form(form);
        self.transport().query(&request).await
    }

    // ==================== Webhooks ====================

    #[instrument(skip(self))]
    pub async fn list_webhooks(&self) -> Result<Vec<WebhookInfo>> {
        self.rest_query(ApiRequest::get(self.urls().webhooks()?)).await
    }

    /// Subscribe `target_url` to `event`, e.g. [`EVENT_FILE_UPLOADED`]
    #[instrument(skip(self))]
    pub async fn create_webhook(
        &self,
        target_url: &str,
        event: &str,
        is_active: bool,
    ) -> Result<WebhookInfo> {
        let options = WebhookOptions::new()
            .with_target_url(target_url)
            .with_event(event)
            .with_active(is_active);
        let request = ApiRequest::post(self.urls().webhooks()?).json(&options)?;
        self.rest_query(request).await
    }

    /// Change a webhook; fields left as `None` keep their value
    #[instrument(skip(self))]
    pub async fn update_webhook(
        &self,
        webhook_id: u64,
        options: WebhookOptions,
    ) -> Result<WebhookInfo> {
        let request = ApiRequest::put(self.urls().webhook(webhook_id)?).json(&options)?;
        self.rest_query(request).await
    }

    /// Unsubscribe and delete the webhook pointing at `target_url`
    #[instrument(skip(self))]
    pub async fn delete_webhook(&self, target_url: &str) -> Result<()> {
        let body = WebhookOptions::new().with_target_url(target_url);
        let request = ApiRequest::delete(self.urls().webhook_unsubscribe()?).json(&body)?;
        self.rest_command(request).await
    }

    // ==================== Uploads ====================

    /// Uploader for any source, for callers that need store or progress options
    pub fn file_uploader(&self, source: UploadSource) -> FileUploader {
        FileUploader::new(self.clone(), source)
    }

    /// Uploader fetching `source_url` on the server side
    pub fn url_uploader(&self, source_url: impl Into<String>) -> UrlUploader {
        UrlUploader::new(self.clone(), source_url)
    }

    /// Upload a local file
    #[instrument(skip(self, path))]
    pub async fn upload_file(&self, path: impl Into<PathBuf>) -> Result<FileInfo> {
        self.file_uploader(UploadSource::Path(path.into()))
            .upload()
            .await
    }

    /// Upload in-memory data under `filename`
    #[instrument(skip(self, data, filename))]
    pub async fn upload_bytes(
        &self,
        data: impl Into<Bytes>,
        filename: impl Into<String>,
    ) -> Result<FileInfo> {
        let source = UploadSource::Bytes {
            data: data.into(),
            filename: filename.into(),
        };
        self.file_uploader(source).upload().await
    }

    /// Upload everything `reader` yields under `filename`
    #[instrument(skip(self, reader, filename))]
    pub async fn upload_reader<R>(&self, reader: R, filename: impl Into<String>) -> Result<FileInfo>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let source = UploadSource::reader(reader, filename);
        self.file_uploader(source).upload().await
    }

    /// Let Uploadcare fetch a public URL and wait until the file is ready
    #[instrument(skip(self))]
    pub async fn upload_from_url(&self, source_url: &str) -> Result<FileInfo> {
        self.url_uploader(source_url).upload().await
    }

    // ==================== Internal ====================

    async fn rest_query<T: serde::de::DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.require_secret()?;
        self.transport().query(&request.rest()).await
    }

    async fn rest_command(&self, request: ApiRequest) -> Result<()> {
        self.require_secret()?;
        self.transport().command(&request.rest()).await
    }

    async fn batch<S, F>(&self, file_ids: &[S], method: F) -> Result<()>
    where
        S: AsRef<str>,
        F: Fn(url::Url) -> ApiRequest,
    {
        if file_ids.is_empty() {
            return Ok(());
        }
        self.require_secret()?;

        let url = self.urls().files_storage()?;
        for chunk in file_ids.chunks(MAX_BATCH_SIZE) {
            let ids: Vec<&str> = chunk.iter().map(AsRef::as_ref).collect();
            debug!("Batch of {} files", ids.len());
            let request = method(url.clone()).json(&ids)?;
            self.rest_command(request).await?;
        }
        Ok(())
    }

    fn require_secret(&self) -> Result<()> {
        if self.config().has_secret() {
            Ok(())
        } else {
            Err(UploadcareError::Authentication(
                "the REST API requires a secret key".to_string(),
            ))
        }
    }
}
