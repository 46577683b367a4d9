//! Paginated listings of files and groups

use crate::{
    auth::iso8601,
    transport::ApiRequest,
    types::{FileInfo, GroupInfo, Page},
    Result, UploadcareClient, UploadcareError,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use url::Url;

/// Largest `limit` the REST API accepts for one page
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Listing order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    UploadTimeAsc,
    UploadTimeDesc,
    SizeAsc,
    SizeDesc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UploadTimeAsc => "datetime_uploaded",
            Self::UploadTimeDesc => "-datetime_uploaded",
            Self::SizeAsc => "size",
            Self::SizeDesc => "-size",
        }
    }
}

/// File listing request builder
///
/// Setting a parameter twice keeps the last value.
#[derive(Clone, Debug)]
pub struct FilesQuery {
    client: UploadcareClient,
    params: BTreeMap<&'static str, String>,
}

impl FilesQuery {
    pub(crate) fn new(client: UploadcareClient) -> Self {
        Self {
            client,
            params: BTreeMap::new(),
        }
    }

    /// Only removed (`true`) or only live (`false`) files
    pub fn removed(mut self, removed: bool) -> Self {
        self.params.insert("removed", removed.to_string());
        self
    }

    /// Only stored (`true`) or only unstored (`false`) files
    pub fn stored(mut self, stored: bool) -> Self {
        self.params.insert("stored", stored.to_string());
        self
    }

    /// Files uploaded at or after `date`, oldest first
    pub fn from_date(self, date: DateTime<Utc>) -> Self {
        self.bound(Order::UploadTimeAsc, iso8601(date))
    }

    /// Files of at least `size` bytes, smallest first
    pub fn from_size(self, size: u64) -> Self {
        self.bound(Order::SizeAsc, size.to_string())
    }

    /// Files uploaded at or before `date`, newest first
    pub fn to_date(self, date: DateTime<Utc>) -> Self {
        self.bound(Order::UploadTimeDesc, iso8601(date))
    }

    /// Files of at most `size` bytes, largest first
    pub fn to_size(self, size: u64) -> Self {
        self.bound(Order::SizeDesc, size.to_string())
    }

    /// Sort order; clears any `from`/`to` bound
    pub fn ordering(mut self, order: Order) -> Self {
        self.params.insert("ordering", order.as_str().to_string());
        self.params.remove("from");
        self
    }

    /// Extra fields in each result, e.g. `rekognition_info`
    pub fn add_fields(mut self, fields: impl Into<String>) -> Self {
        self.params.insert("add_fields", fields.into());
        self
    }

    /// Page size
    pub fn limit(mut self, limit: u32) -> Self {
        self.params.insert("limit", limit.to_string());
        self
    }

    /// First page URL with all parameters applied
    pub fn url(&self) -> Result<Url> {
        Ok(with_params(self.client.urls().files()?, &self.params))
    }

    /// Lazily walk every page
    pub fn stream(self) -> BoxStream<'static, Result<FileInfo>> {
        let first = self.url();
        paginate(self.client, first)
    }

    /// Fetch every page into memory
    pub async fn collect(self) -> Result<Vec<FileInfo>> {
        self.stream().try_collect().await
    }

    // The API expresses both bounds as `from` with a directional ordering
    fn bound(mut self, order: Order, value: String) -> Self {
        self.params.insert("ordering", order.as_str().to_string());
        self.params.insert("from", value);
        self
    }
}

/// Group listing request builder
#[derive(Clone, Debug)]
pub struct GroupsQuery {
    client: UploadcareClient,
    params: BTreeMap<&'static str, String>,
}

impl GroupsQuery {
    pub(crate) fn new(client: UploadcareClient) -> Self {
        Self {
            client,
            params: BTreeMap::new(),
        }
    }

    /// Groups created at or after `date`
    pub fn from_date(mut self, date: DateTime<Utc>) -> Self {
        self.params.insert("from", iso8601(date));
        self
    }

    pub fn ordering(mut self, order: Order) -> Self {
        self.params.insert("ordering", order.as_str().to_string());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.params.insert("limit", limit.to_string());
        self
    }

    pub fn url(&self) -> Result<Url> {
        Ok(with_params(self.client.urls().groups()?, &self.params))
    }

    pub fn stream(self) -> BoxStream<'static, Result<GroupInfo>> {
        let first = self.url();
        paginate(self.client, first)
    }

    pub async fn collect(self) -> Result<Vec<GroupInfo>> {
        self.stream().try_collect().await
    }
}

fn with_params(mut url: Url, params: &BTreeMap<&'static str, String>) -> Url {
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in params {
            pairs.append_pair(name, value);
        }
    }
    url
}

enum Cursor {
    First(Result<Url>),
    Next(Url),
    End,
}

/// Stream items across pages, following `next` until it is absent
pub(crate) fn paginate<T>(client: UploadcareClient, first: Result<Url>) -> BoxStream<'static, Result<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    stream::try_unfold(Cursor::First(first), move |cursor| {
        fetch_page::<T>(client.clone(), cursor)
    })
    .map_ok(|items| stream::iter(items.into_iter().map(Ok::<T, UploadcareError>)))
    .try_flatten()
    .boxed()
}

async fn fetch_page<T: DeserializeOwned>(
    client: UploadcareClient,
    cursor: Cursor,
) -> Result<Option<(Vec<T>, Cursor)>> {
    let url = match cursor {
        Cursor::First(url) => url?,
        Cursor::Next(url) => url,
        Cursor::End => return Ok(None),
    };

    let page: Page<T> = client.transport().query(&ApiRequest::get(url).rest()).await?;
    let next = match page.next.as_deref() {
        Some(next) => Cursor::Next(Url::parse(next)?),
        None => Cursor::End,
    };
    Ok(Some((page.results, next)))
}
