//! File and URL uploads through the Upload API
//!
//! Small files go in a single form post to `/base/`. Files above
//! [`ClientConfig::multipart_threshold`](crate::ClientConfig) are split into
//! chunks and PUT to the presigned part URLs handed out by
//! `/multipart/start/`, one after another.

use crate::{
    transport::{ApiRequest, FilePart, FormData, PartContent},
    types::{FileInfo, FromUrlResponse, FromUrlStatus, MultipartStartResponse, UploadBaseResponse},
    Result, UploadcareClient, UploadcareError,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::{NamedTempFile, TempPath};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, instrument};
use url::Url;

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(UploadProgress) + Send + Sync>;

/// Upload progress information
#[derive(Clone, Debug)]
pub struct UploadProgress {
    /// Bytes uploaded so far
    pub bytes_uploaded: u64,
    /// Total bytes to upload
    pub total_bytes: u64,
    /// Current part number (1-based)
    pub current_part: u32,
    /// Total number of parts
    pub total_parts: u32,
}

impl UploadProgress {
    /// Get percentage complete
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        (self.bytes_uploaded as f64 / self.total_bytes as f64) * 100.0
    }
}

/// What happens to an uploaded file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreMode {
    /// Follow the project setting
    #[default]
    Auto,
    /// Store permanently
    Store,
    /// Leave unstored; purged after 24 hours
    DoNotStore,
}

impl StoreMode {
    /// Value of the `UPLOADCARE_STORE` / `store` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Store => "1",
            Self::DoNotStore => "0",
        }
    }
}

impl From<bool> for StoreMode {
    fn from(store: bool) -> Self {
        if store {
            Self::Store
        } else {
            Self::DoNotStore
        }
    }
}

/// Data to upload
pub enum UploadSource {
    /// A file on disk, streamed
    Path(PathBuf),
    /// In-memory data
    Bytes { data: Bytes, filename: String },
    /// Any async reader; spooled to a temporary file first so its size is known
    Reader {
        reader: Box<dyn AsyncRead + Send + Unpin>,
        filename: String,
    },
}

impl UploadSource {
    pub fn reader<R>(reader: R, filename: impl Into<String>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self::Reader {
            reader: Box::new(reader),
            filename: filename.into(),
        }
    }

    /// Resolve name, size and content type
    async fn prepare(self) -> Result<Prepared> {
        match self {
            Self::Path(path) => {
                let size = tokio::fs::metadata(&path).await?.len();
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "file".to_string());
                Ok(Prepared::new(name, size, PartContent::Path { path, size }, None))
            }
            Self::Bytes { data, filename } => {
                let size = data.len() as u64;
                Ok(Prepared::new(filename, size, PartContent::Bytes(data), None))
            }
            Self::Reader {
                mut reader,
                filename,
            } => {
                let (file, temp_path) = NamedTempFile::new()?.into_parts();
                let mut file = tokio::fs::File::from_std(file);
                let size = tokio::io::copy(&mut reader, &mut file).await?;
                file.flush().await?;
                debug!("Spooled {} bytes of {} to {:?}", size, filename, temp_path);

                let content = PartContent::Path {
                    path: temp_path.to_path_buf(),
                    size,
                };
                Ok(Prepared::new(filename, size, content, Some(temp_path)))
            }
        }
    }
}

impl fmt::Debug for UploadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes { data, filename } => f
                .debug_struct("Bytes")
                .field("len", &data.len())
                .field("filename", filename)
                .finish(),
            Self::Reader { filename, .. } => f
                .debug_struct("Reader")
                .field("filename", filename)
                .finish_non_exhaustive(),
        }
    }
}

/// A source ready to send
struct Prepared {
    name: String,
    size: u64,
    content_type: String,
    content: PartContent,
    // Deletes the spool file on drop
    _spool: Option<TempPath>,
}

impl Prepared {
    fn new(name: String, size: u64, content: PartContent, spool: Option<TempPath>) -> Self {
        let content_type = content_type_for(&name);
        Self {
            name,
            size,
            content_type,
            content,
            _spool: spool,
        }
    }
}

/// MIME type guessed from the file name
pub fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Number of chunks needed for `size` bytes
pub fn part_count(size: u64, chunk_size: u64) -> u64 {
    size.div_ceil(chunk_size.max(1))
}

/// Something that produces an uploaded file
#[async_trait]
pub trait Uploader {
    /// Upload and return the stored file's metadata
    async fn upload(self) -> Result<FileInfo>;
}

/// Uploads local data, choosing direct or multipart upload by size
pub struct FileUploader {
    source: UploadSource,
    sender: Sender,
}

/// Everything but the source, shared across awaits while uploading
struct Sender {
    client: UploadcareClient,
    store: StoreMode,
    signature: Option<(String, String)>,
    progress: Option<ProgressCallback>,
}

impl FileUploader {
    pub fn new(client: UploadcareClient, source: UploadSource) -> Self {
        Self {
            source,
            sender: Sender {
                client,
                store: StoreMode::Auto,
                signature: None,
                progress: None,
            },
        }
    }

    pub fn store(mut self, store: StoreMode) -> Self {
        self.sender.store = store;
        self
    }

    /// Signed upload; ignored unless both values are non-empty
    pub fn signed_upload(mut self, signature: impl Into<String>, expire: impl Into<String>) -> Self {
        let (signature, expire) = (signature.into(), expire.into());
        self.sender.signature = if signature.is_empty() || expire.is_empty() {
            None
        } else {
            Some((signature, expire))
        };
        self
    }

    /// Called after every uploaded part
    pub fn progress(mut self, callback: impl Fn(UploadProgress) + Send + Sync + 'static) -> Self {
        self.sender.progress = Some(Box::new(callback));
        self
    }
}

impl Sender {
    fn base_form(&self) -> FormData {
        let mut form = FormData::new()
            .text("UPLOADCARE_PUB_KEY", self.client.public_key())
            .text("UPLOADCARE_STORE", self.store.as_str());
        if let Some((signature, expire)) = &self.signature {
            form = form
                .text("signature", signature.as_str())
                .text("expire", expire.as_str());
        }
        form
    }

    fn report(&self, progress: UploadProgress) {
        if let Some(cb) = &self.progress {
            cb(progress);
        }
    }

    async fn direct_upload(&self, prepared: &Prepared) -> Result<String> {
        let form = self.base_form().file(FilePart {
            field: "file".to_string(),
            filename: prepared.name.clone(),
            content_type: prepared.content_type.clone(),
            content: prepared.content.clone(),
        });

        let request = ApiRequest::post(self.client.urls().upload_base()?).form(form);
        let response: UploadBaseResponse = self.client.transport().query(&request).await?;

        self.report(UploadProgress {
            bytes_uploaded: prepared.size,
            total_bytes: prepared.size,
            current_part: 1,
            total_parts: 1,
        });
        Ok(response.file)
    }

    async fn multipart_upload(&self, prepared: &Prepared) -> Result<String> {
        let transport = self.client.transport();
        let urls = self.client.urls();
        let chunk_size = self.client.config().multipart_chunk_size;

        let form = self
            .base_form()
            .text("filename", prepared.name.as_str())
            .text("size", prepared.size.to_string())
            .text("content_type", prepared.content_type.as_str());
        let start: MultipartStartResponse = transport
            .query(&ApiRequest::post(urls.multipart_start()?).form(form))
            .await?;

        let total_parts = part_count(prepared.size, chunk_size);
        if total_parts > start.parts.len() as u64 {
            return Err(UploadcareError::UploadFailed(format!(
                "{} chunks but only {} part URLs",
                total_parts,
                start.parts.len()
            )));
        }
        debug!("Multipart upload {} in {} parts", start.uuid, total_parts);

        let mut chunks = ChunkReader::open(&prepared.content, chunk_size).await?;
        let mut bytes_uploaded = 0u64;
        let mut part_number = 0u32;
        while let Some(chunk) = chunks.next().await? {
            let part_url = start.parts.get(part_number as usize).ok_or_else(|| {
                UploadcareError::UploadFailed(format!("no URL for part {}", part_number + 1))
            })?;
            let part_url = Url::parse(part_url)?;
            let len = chunk.len() as u64;
            let request = ApiRequest::put(part_url).raw(chunk, prepared.content_type.as_str());
            transport.command(&request).await?;

            bytes_uploaded += len;
            part_number += 1;
            self.report(UploadProgress {
                bytes_uploaded,
                total_bytes: prepared.size,
                current_part: part_number,
                total_parts: total_parts as u32,
            });
        }

        let form = FormData::new()
            .text("UPLOADCARE_PUB_KEY", self.client.public_key())
            .text("uuid", start.uuid.as_str());
        transport
            .command(&ApiRequest::post(urls.multipart_complete()?).form(form))
            .await?;

        Ok(start.uuid)
    }
}

impl fmt::Debug for FileUploader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUploader")
            .field("source", &self.source)
            .field("store", &self.sender.store)
            .field("signed", &self.sender.signature.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Uploader for FileUploader {
    #[instrument(skip(self))]
    async fn upload(self) -> Result<FileInfo> {
        let Self { source, sender } = self;
        debug!("Uploading {:?}", source);
        let prepared = source.prepare().await?;

        let file_id = if prepared.size > sender.client.config().multipart_threshold {
            sender.multipart_upload(&prepared).await?
        } else {
            sender.direct_upload(&prepared).await?
        };
        drop(prepared);

        file_info(&sender.client, &file_id).await
    }
}

/// Reads a part's content one chunk at a time
enum ChunkReader {
    Bytes { data: Bytes, chunk_size: usize },
    File { file: tokio::fs::File, chunk_size: u64 },
}

impl ChunkReader {
    async fn open(content: &PartContent, chunk_size: u64) -> Result<Self> {
        Ok(match content {
            PartContent::Bytes(data) => Self::Bytes {
                data: data.clone(),
                chunk_size: chunk_size as usize,
            },
            PartContent::Path { path, .. } => Self::File {
                file: tokio::fs::File::open(path).await?,
                chunk_size,
            },
        })
    }

    async fn next(&mut self) -> Result<Option<Bytes>> {
        match self {
            Self::Bytes { data, chunk_size } => {
                if data.is_empty() {
                    return Ok(None);
                }
                let len = (*chunk_size).min(data.len());
                Ok(Some(data.split_to(len)))
            }
            Self::File { file, chunk_size } => {
                let mut buf = Vec::with_capacity(*chunk_size as usize);
                (&mut *file).take(*chunk_size).read_to_end(&mut buf).await?;
                if buf.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Bytes::from(buf)))
                }
            }
        }
    }
}

/// Uploads a file Uploadcare downloads from a public URL
#[derive(Debug)]
pub struct UrlUploader {
    client: UploadcareClient,
    source_url: String,
    store: StoreMode,
    poll_interval: Duration,
    timeout: Duration,
}

impl UrlUploader {
    pub fn new(client: UploadcareClient, source_url: impl Into<String>) -> Self {
        let poll_interval = client.config().url_poll_interval;
        let timeout = client.config().url_poll_timeout;
        Self {
            client,
            source_url: source_url.into(),
            store: StoreMode::Auto,
            poll_interval,
            timeout,
        }
    }

    pub fn store(mut self, store: StoreMode) -> Self {
        self.store = store;
        self
    }

    /// Delay between status checks
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Give up after this long
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Uploader for UrlUploader {
    #[instrument(skip(self))]
    async fn upload(self) -> Result<FileInfo> {
        debug!("Uploading from {}", self.source_url);
        let transport = self.client.transport();
        let urls = self.client.urls();

        let url = urls.from_url(&self.source_url, self.client.public_key(), self.store.as_str())?;
        let FromUrlResponse { token } = transport.query(&ApiRequest::get(url)).await?;
        let status_url = urls.from_url_status(&token)?;

        let deadline = tokio::time::Instant::now() + self.timeout;
        loop {
            tokio::time::sleep(self.poll_interval).await;

            let status: FromUrlStatus = transport.query(&ApiRequest::get(status_url.clone())).await?;
            match status {
                FromUrlStatus::Success { file_id } => return file_info(&self.client, &file_id).await,
                FromUrlStatus::Error { error } | FromUrlStatus::Failed { error } => {
                    return Err(UploadcareError::UploadFailed(if error.is_empty() {
                        format!("upload from {} failed", self.source_url)
                    } else {
                        error
                    }));
                }
                FromUrlStatus::Progress { done, total } => {
                    debug!("Token {}: {}/{} bytes", token, done, total);
                }
                FromUrlStatus::Waiting | FromUrlStatus::Unknown => {
                    debug!("Token {}: waiting", token);
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(UploadcareError::Timeout(format!(
                    "upload from {} not finished after {:?}",
                    self.source_url, self.timeout
                )));
            }
        }
    }
}

/// Full metadata with a secret key, public metadata without
async fn file_info(client: &UploadcareClient, file_id: &str) -> Result<FileInfo> {
    if client.config().has_secret() {
        client.get_file(file_id).await
    } else {
        client.get_uploaded_file(file_id).await
    }
}
