//! Endpoint URLs for the REST API, Upload API and CDN

use crate::{ClientConfig, Result};
use url::Url;

/// URL factory bound to the configured base URLs
#[derive(Clone, Debug)]
pub struct Urls {
    api_base: String,
    upload_base: String,
    cdn_base: String,
}

impl Urls {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            upload_base: config.upload_base.trim_end_matches('/').to_string(),
            cdn_base: config.cdn_base.trim_end_matches('/').to_string(),
        }
    }

    // ==================== REST API ====================

    pub fn project(&self) -> Result<Url> {
        self.api("/project/")
    }

    pub fn files(&self) -> Result<Url> {
        self.api("/files/")
    }

    pub fn file(&self, file_id: &str) -> Result<Url> {
        self.api(&format!("/files/{}/", file_id))
    }

    /// File resource with extra fields, e.g. `rekognition_info`
    pub fn file_with_fields(&self, file_id: &str, fields: &str) -> Result<Url> {
        let mut url = self.file(file_id)?;
        url.query_pairs_mut().append_pair("add_fields", fields);
        Ok(url)
    }

    pub fn file_storage(&self, file_id: &str) -> Result<Url> {
        self.api(&format!("/files/{}/storage/", file_id))
    }

    /// Batch store/delete endpoint
    pub fn files_storage(&self) -> Result<Url> {
        self.api("/files/storage/")
    }

    pub fn files_local_copy(&self) -> Result<Url> {
        self.api("/files/local_copy/")
    }

    pub fn files_remote_copy(&self) -> Result<Url> {
        self.api("/files/remote_copy/")
    }

    pub fn groups(&self) -> Result<Url> {
        self.api("/groups/")
    }

    pub fn group(&self, group_id: &str) -> Result<Url> {
        self.api(&format!("/groups/{}/", group_id))
    }

    pub fn group_storage(&self, group_id: &str) -> Result<Url> {
        self.api(&format!("/groups/{}/storage/", group_id))
    }

    pub fn webhooks(&self) -> Result<Url> {
        self.api("/webhooks/")
    }

    pub fn webhook(&self, webhook_id: u64) -> Result<Url> {
        self.api(&format!("/webhooks/{}/", webhook_id))
    }

    pub fn webhook_unsubscribe(&self) -> Result<Url> {
        self.api("/webhooks/unsubscribe/")
    }

    // ==================== Upload API ====================

    /// Direct upload endpoint
    pub fn upload_base(&self) -> Result<Url> {
        self.upload("/base/")
    }

    pub fn multipart_start(&self) -> Result<Url> {
        self.upload("/multipart/start/")
    }

    pub fn multipart_complete(&self) -> Result<Url> {
        self.upload("/multipart/complete/")
    }

    pub fn from_url(&self, source_url: &str, pub_key: &str, store: &str) -> Result<Url> {
        let mut url = self.upload("/from_url/")?;
        url.query_pairs_mut()
            .append_pair("source_url", source_url)
            .append_pair("pub_key", pub_key)
            .append_pair("store", store);
        Ok(url)
    }

    pub fn from_url_status(&self, token: &str) -> Result<Url> {
        let mut url = self.upload("/from_url/status/")?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }

    /// Public file info, no secret key needed
    pub fn upload_file_info(&self, pub_key: &str, file_id: &str) -> Result<Url> {
        let mut url = self.upload("/info/")?;
        url.query_pairs_mut()
            .append_pair("pub_key", pub_key)
            .append_pair("file_id", file_id);
        Ok(url)
    }

    /// Public group info, no secret key needed
    pub fn upload_group_info(&self, pub_key: &str, group_id: &str) -> Result<Url> {
        let mut url = self.upload("/group/info/")?;
        url.query_pairs_mut()
            .append_pair("pub_key", pub_key)
            .append_pair("group_id", group_id);
        Ok(url)
    }

    /// Group creation endpoint
    pub fn upload_group(&self) -> Result<Url> {
        self.upload("/group/")
    }

    // ==================== CDN ====================

    /// Full CDN URL for a path produced by [`crate::CdnPathBuilder`]
    pub fn cdn(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", self.cdn_base, path))?)
    }

    fn api(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", self.api_base, path))?)
    }

    fn upload(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", self.upload_base, path))?)
    }
}
