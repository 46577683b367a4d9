//! CDN path builder for image transformations
//!
//! Operations are appended in call order as `/-/<operation>` segments. Range
//! checks do not interrupt chaining: the first violation is remembered and
//! reported by [`CdnPathBuilder::build`].

use crate::{Result, UploadcareError, Urls};
use url::Url;

/// Largest accepted dimension (pixels)
pub const MAX_DIMENSION: u32 = 2048;
/// When two dimensions are given, at least one must not exceed this
pub const MAX_SQUARE_SIDE: u32 = 634;

/// Output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Auto,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Auto => "auto",
        }
    }
}

/// Compression quality
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageQuality {
    Normal,
    Better,
    Best,
    Lighter,
    Lightest,
}

impl ImageQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Better => "better",
            Self::Best => "best",
            Self::Lighter => "lighter",
            Self::Lightest => "lightest",
        }
    }
}

/// Builds `/<file id>/-/op/-/op/` paths
#[derive(Clone, Debug)]
pub struct CdnPathBuilder {
    path: String,
    error: Option<String>,
}

impl CdnPathBuilder {
    pub fn new(file_id: &str) -> Self {
        Self {
            path: format!("/{}", file_id),
            error: None,
        }
    }

    /// Top-left aligned crop
    pub fn crop(self, width: u32, height: u32) -> Self {
        self.dimensions(width, height)
            .op(format!("crop/{}x{}", width, height))
    }

    /// Center aligned crop
    pub fn crop_center(self, width: u32, height: u32) -> Self {
        self.dimensions(width, height)
            .op(format!("crop/{}x{}/center", width, height))
    }

    /// Top-left aligned crop filling the background with `color`
    pub fn crop_color(self, width: u32, height: u32, color: [u8; 3]) -> Self {
        self.dimensions(width, height)
            .op(format!("crop/{}x{}/{}", width, height, hex::encode(color)))
    }

    /// Center aligned crop filling the background with `color`
    pub fn crop_center_color(self, width: u32, height: u32, color: [u8; 3]) -> Self {
        self.dimensions(width, height)
            .op(format!("crop/{}x{}/center/{}", width, height, hex::encode(color)))
    }

    pub fn resize(self, width: u32, height: u32) -> Self {
        self.dimensions(width, height)
            .op(format!("resize/{}x{}", width, height))
    }

    /// Resize keeping the aspect ratio
    pub fn resize_width(self, width: u32) -> Self {
        self.dimension(width).op(format!("resize/{}x", width))
    }

    /// Resize keeping the aspect ratio
    pub fn resize_height(self, height: u32) -> Self {
        self.dimension(height).op(format!("resize/x{}", height))
    }

    /// Scale until one side fits, then crop the bottom/right overflow
    pub fn scale_crop(self, width: u32, height: u32) -> Self {
        self.dimensions(width, height)
            .op(format!("scale_crop/{}x{}", width, height))
    }

    /// Scale until one side fits, center, then crop the overflow
    pub fn scale_crop_center(self, width: u32, height: u32) -> Self {
        self.dimensions(width, height)
            .op(format!("scale_crop/{}x{}/center", width, height))
    }

    /// Downscale to fit into the box, never upscale
    pub fn preview(self, width: u32, height: u32) -> Self {
        self.dimension(width)
            .dimension(height)
            .op(format!("preview/{}x{}", width, height))
    }

    pub fn flip(self) -> Self {
        self.op("flip".to_string())
    }

    pub fn grayscale(self) -> Self {
        self.op("grayscale".to_string())
    }

    pub fn invert(self) -> Self {
        self.op("invert".to_string())
    }

    pub fn mirror(self) -> Self {
        self.op("mirror".to_string())
    }

    /// Blur with the default strength
    pub fn blur(self) -> Self {
        self.op("blur".to_string())
    }

    /// Blur, strength in 10..=5000
    pub fn blur_strength(self, strength: u32) -> Self {
        self.range("blur strength", strength, 10, 5000)
            .op(format!("blur/{}", strength))
    }

    /// Sharpen with the default strength
    pub fn sharp(self) -> Self {
        self.op("sharp".to_string())
    }

    /// Sharpen, strength in 0..=20
    pub fn sharp_strength(self, strength: u32) -> Self {
        self.range("sharp strength", strength, 0, 20)
            .op(format!("sharp/{}", strength))
    }

    pub fn format(self, format: ImageFormat) -> Self {
        self.op(format!("format/{}", format.as_str()))
    }

    pub fn quality(self, quality: ImageQuality) -> Self {
        self.op(format!("quality/{}", quality.as_str()))
    }

    /// Face detection metadata instead of an image
    pub fn detect_faces(mut self) -> Self {
        self.path.push_str("/detect_faces");
        self
    }

    /// Finish the path, e.g. `/<id>/-/resize/100x/`
    pub fn build(self) -> Result<String> {
        match self.error {
            Some(message) => Err(UploadcareError::InvalidArgument(message)),
            None => Ok(format!("{}/", self.path)),
        }
    }

    /// Finish the path and resolve it against the CDN base
    pub fn url(self, urls: &Urls) -> Result<Url> {
        let path = self.build()?;
        urls.cdn(&path)
    }

    fn op(mut self, operation: String) -> Self {
        self.path.push_str("/-/");
        self.path.push_str(&operation);
        self
    }

    fn dimension(self, dim: u32) -> Self {
        if !(1..=MAX_DIMENSION).contains(&dim) {
            return self.fail(format!("dimensions must be in the range 1-{}", MAX_DIMENSION));
        }
        self
    }

    fn dimensions(self, width: u32, height: u32) -> Self {
        let checked = self.dimension(width).dimension(height);
        if width > MAX_SQUARE_SIDE && height > MAX_SQUARE_SIDE {
            return checked.fail(format!(
                "at least one dimension must not exceed {}",
                MAX_SQUARE_SIDE
            ));
        }
        checked
    }

    fn range(self, what: &str, value: u32, min: u32, max: u32) -> Self {
        if !(min..=max).contains(&value) {
            return self.fail(format!("{} must be in the range {}-{}", what, min, max));
        }
        self
    }

    fn fail(mut self, message: String) -> Self {
        self.error.get_or_insert(message);
        self
    }
}
