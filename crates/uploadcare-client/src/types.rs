//! Request and response payloads
//!
//! Field names follow the wire format (snake_case). Unknown fields are ignored
//! so newer API responses keep decoding.

use crate::cdn::CdnPathBuilder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==================== Files ====================

/// A file resource
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInfo {
    /// File UUID
    pub uuid: String,
    /// REST API URL of the resource
    pub url: Option<String>,
    /// Size in bytes
    pub size: u64,
    /// How the file got into the project
    pub source: Option<String>,
    /// Whether the file is available on the CDN
    pub is_ready: bool,
    /// Whether the file is an image
    pub is_image: bool,
    /// MIME type
    pub mime_type: Option<String>,
    /// Name the file was uploaded with
    pub original_filename: Option<String>,
    /// CDN URL of the original file
    pub original_file_url: Option<String>,
    pub datetime_uploaded: Option<DateTime<Utc>>,
    pub datetime_stored: Option<DateTime<Utc>>,
    pub datetime_removed: Option<DateTime<Utc>>,
    pub image_info: Option<ImageInfo>,
    pub video_info: Option<VideoInfo>,
    /// Recognised labels and their confidence
    pub rekognition_info: Option<HashMap<String, f32>>,
    /// Derived variations (name → UUID)
    pub variations: Option<HashMap<String, String>>,
}

impl FileInfo {
    /// The file has been stored permanently
    pub fn is_stored(&self) -> bool {
        self.datetime_stored.is_some()
    }

    /// The file has been deleted
    pub fn is_removed(&self) -> bool {
        self.datetime_removed.is_some()
    }

    /// Start a CDN transformation path for this file
    pub fn cdn_path(&self) -> CdnPathBuilder {
        CdnPathBuilder::new(&self.uuid)
    }
}

/// Image metadata
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: Option<String>,
    /// Raw EXIF orientation code
    pub orientation: Option<u8>,
    /// Horizontal and optional vertical resolution
    pub dpi: Option<Vec<u32>>,
    pub datetime_original: Option<String>,
    pub geo_location: Option<GeoLocation>,
    pub color_mode: Option<ColorMode>,
}

impl ImageInfo {
    pub fn orientation(&self) -> Orientation {
        Orientation::from_exif(self.orientation)
    }

    pub fn x_resolution(&self) -> Option<u32> {
        self.dpi.as_ref().and_then(|dpi| dpi.first().copied())
    }

    /// Falls back to the horizontal resolution when only one value is known
    pub fn y_resolution(&self) -> Option<u32> {
        match self.dpi.as_deref() {
            Some([_, y, ..]) => Some(*y),
            _ => self.x_resolution(),
        }
    }
}

/// GPS position embedded in an image
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// EXIF orientation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Unknown,
    Normal,
    Flipped,
    Normal180,
    Flipped180,
    Flipped90,
    Normal270,
    Flipped270,
    Normal90,
}

impl Orientation {
    pub fn from_exif(code: Option<u8>) -> Self {
        match code {
            Some(1) => Self::Normal,
            Some(2) => Self::Flipped,
            Some(3) => Self::Normal180,
            Some(4) => Self::Flipped180,
            Some(5) => Self::Flipped90,
            Some(6) => Self::Normal270,
            Some(7) => Self::Flipped270,
            Some(8) => Self::Normal90,
            _ => Self::Unknown,
        }
    }

    pub fn exif_code(&self) -> Option<u8> {
        match self {
            Self::Unknown => None,
            Self::Normal => Some(1),
            Self::Flipped => Some(2),
            Self::Normal180 => Some(3),
            Self::Flipped180 => Some(4),
            Self::Flipped90 => Some(5),
            Self::Normal270 => Some(6),
            Self::Flipped270 => Some(7),
            Self::Normal90 => Some(8),
        }
    }
}

/// Image colour mode
///
/// Modes this client does not know keep the server's spelling in `Unknown`.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColorMode {
    RGB,
    RGBA,
    RGBa,
    RGBX,
    L,
    LA,
    La,
    P,
    PA,
    CMYK,
    YCbCr,
    HSV,
    LAB,
    Unknown(String),
}

impl ColorMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::RGB => "RGB",
            Self::RGBA => "RGBA",
            Self::RGBa => "RGBa",
            Self::RGBX => "RGBX",
            Self::L => "L",
            Self::LA => "LA",
            Self::La => "La",
            Self::P => "P",
            Self::PA => "PA",
            Self::CMYK => "CMYK",
            Self::YCbCr => "YCbCr",
            Self::HSV => "HSV",
            Self::LAB => "LAB",
            Self::Unknown(mode) => mode,
        }
    }
}

impl From<String> for ColorMode {
    fn from(mode: String) -> Self {
        match mode.as_str() {
            "RGB" => Self::RGB,
            "RGBA" => Self::RGBA,
            "RGBa" => Self::RGBa,
            "RGBX" => Self::RGBX,
            "L" => Self::L,
            "LA" => Self::LA,
            "La" => Self::La,
            "P" => Self::P,
            "PA" => Self::PA,
            "CMYK" => Self::CMYK,
            "YCbCr" => Self::YCbCr,
            "HSV" => Self::HSV,
            "LAB" => Self::LAB,
            _ => Self::Unknown(mode),
        }
    }
}

impl From<ColorMode> for String {
    fn from(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Unknown(mode) => mode,
            known => known.as_str().to_string(),
        }
    }
}

/// Video metadata
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoInfo {
    /// Duration in milliseconds
    pub duration: Option<u64>,
    pub format: Option<String>,
    pub bitrate: Option<u64>,
    pub audio: Option<AudioStream>,
    pub video: Option<VideoStream>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioStream {
    pub bitrate: Option<u64>,
    pub codec: Option<String>,
    pub sample_rate: Option<u64>,
    pub channels: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoStream {
    pub height: u32,
    pub width: u32,
    pub frame_rate: Option<f64>,
    pub bitrate: Option<u64>,
    pub codec: Option<String>,
}

// ==================== Groups ====================

/// A file group
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupInfo {
    /// Group id, `<uuid>~<count>`
    pub id: String,
    pub url: Option<String>,
    pub datetime_created: Option<DateTime<Utc>>,
    pub datetime_stored: Option<DateTime<Utc>>,
    pub files_count: u32,
    pub cdn_url: Option<String>,
    /// Member files; removed files show up as `None`
    pub files: Vec<Option<FileInfo>>,
}

impl GroupInfo {
    pub fn is_stored(&self) -> bool {
        self.datetime_stored.is_some()
    }
}

/// Group creation parameters for the Upload API
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupOptions {
    /// JSONP callback name
    pub callback: Option<String>,
    /// Signed upload signature, sent only together with `expire`
    pub signature: Option<String>,
    /// Unix time until which `signature` is valid
    pub expire: Option<String>,
}

impl GroupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = Some(callback.into());
        self
    }

    pub fn signed(mut self, signature: impl Into<String>, expire: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self.expire = Some(expire.into());
        self
    }

    /// Signature and expiry, if both are present and non-empty
    pub fn signature_pair(&self) -> Option<(&str, &str)> {
        match (self.signature.as_deref(), self.expire.as_deref()) {
            (Some(signature), Some(expire)) if !signature.is_empty() && !expire.is_empty() => {
                Some((signature, expire))
            }
            _ => None,
        }
    }
}

// ==================== Project ====================

/// Project information
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInfo {
    pub name: String,
    pub pub_key: String,
    pub collaborators: Vec<Collaborator>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collaborator {
    pub name: String,
    pub email: String,
}

// ==================== Webhooks ====================

/// A webhook subscription
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookInfo {
    pub id: u64,
    pub event: String,
    pub target_url: String,
    pub project: u64,
    pub is_active: bool,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// Event fired when a file finishes uploading
pub const EVENT_FILE_UPLOADED: &str = "file.uploaded";

/// Webhook create/update payload; `None` fields are left unchanged
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl WebhookOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_url(mut self, target_url: impl Into<String>) -> Self {
        self.target_url = Some(target_url.into());
        self
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }
}

// ==================== Copies ====================

/// Copy request payload
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CopyOptions {
    /// Source file UUID or CDN URL
    pub source: String,
    /// Custom storage name for remote copies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_public: Option<bool>,
    /// Naming pattern for remote copies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Result of a copy call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "result", rename_all = "lowercase")]
pub enum CopyResult {
    /// Local copy: a new file in the project
    File(FileInfo),
    /// Remote copy: URL in the custom storage
    Url(String),
}

impl CopyResult {
    pub fn file(&self) -> Option<&FileInfo> {
        match self {
            Self::File(info) => Some(info),
            Self::Url(_) => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::File(_) => None,
            Self::Url(url) => Some(url),
        }
    }
}

// ==================== Pagination ====================

/// One page of a listing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub per_page: u64,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }
}

// ==================== Upload API ====================

/// Response of a direct upload
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UploadBaseResponse {
    /// UUID of the uploaded file
    pub file: String,
}

/// Response of a multipart upload start
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MultipartStartResponse {
    pub uuid: String,
    /// Presigned URLs, one per chunk
    pub parts: Vec<String>,
}

/// Response of a URL upload request
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FromUrlResponse {
    pub token: String,
}

/// URL upload status
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FromUrlStatus {
    Success {
        #[serde(alias = "uuid")]
        file_id: String,
    },
    Progress {
        #[serde(default)]
        done: u64,
        #[serde(default)]
        total: u64,
    },
    Waiting,
    Error {
        #[serde(default)]
        error: String,
    },
    Failed {
        #[serde(default)]
        error: String,
    },
    /// Any status this client does not track; polling continues
    #[serde(other)]
    Unknown,
}
