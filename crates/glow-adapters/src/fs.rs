//! Filesystem adapter for loading and encoding photos.

use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use glow_core::{EncodedImage, ImageCodec, ImageRef};
use image::codecs::jpeg::JpegEncoder;
use image::GenericImageView;
use tracing::debug;

/// Supported image extensions.
const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Default bound for the longer side of an uploaded photo.
pub const DEFAULT_MAX_SIDE: u32 = 1024;

/// Default JPEG quality for uploads.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Encodes photos from disk (or inline `data:` URIs) as base64 JPEG.
///
/// Photos larger than the configured bound are downscaled, keeping the
/// aspect ratio, before encoding.
#[derive(Debug, Clone)]
pub struct FsImageCodec {
    max_side: u32,
    quality: u8,
}

impl Default for FsImageCodec {
    fn default() -> Self {
        Self {
            max_side: DEFAULT_MAX_SIDE,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl FsImageCodec {
    /// Creates a codec with the default size bound and quality.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bound for the longer side in pixels.
    #[must_use]
    pub const fn with_max_side(mut self, max_side: u32) -> Self {
        self.max_side = max_side;
        self
    }

    /// Sets the JPEG quality (1-100).
    #[must_use]
    pub const fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    fn encode_file(&self, path: &Path) -> Result<EncodedImage> {
        if !is_supported_image(path) {
            bail!("Unsupported file type: {}", path.display());
        }
        let mut image = image::open(path)
            .with_context(|| format!("Failed to open image: {}", path.display()))?;

        let (width, height) = image.dimensions();
        if width.max(height) > self.max_side {
            image = image.thumbnail(self.max_side, self.max_side);
            debug!(
                "Downscaled {} from {width}x{height} to {}x{}",
                path.display(),
                image.width(),
                image.height()
            );
        }

        let mut buf = Vec::new();
        image
            .to_rgb8()
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, self.quality))
            .with_context(|| format!("Failed to encode image: {}", path.display()))?;

        Ok(EncodedImage {
            base64: STANDARD.encode(&buf),
            mime_type: "image/jpeg".to_string(),
        })
    }
}

impl ImageCodec for FsImageCodec {
    fn encode(&self, image: &ImageRef) -> Result<EncodedImage> {
        match image.as_str().strip_prefix("data:") {
            Some(uri) => decode_data_uri(uri),
            None => self.encode_file(Path::new(image.as_str())),
        }
    }
}

/// Accepts `<mime>;base64,<payload>` as-is after checking the payload decodes.
fn decode_data_uri(uri: &str) -> Result<EncodedImage> {
    let Some((header, payload)) = uri.split_once(',') else {
        bail!("Malformed data URI: missing ','");
    };
    let Some(mime_type) = header.strip_suffix(";base64") else {
        bail!("Unsupported data URI encoding: {header}");
    };
    if !mime_type.starts_with("image/") {
        bail!("Data URI is not an image: {mime_type}");
    }
    STANDARD
        .decode(payload)
        .context("Data URI payload is not valid base64")?;

    Ok(EncodedImage {
        base64: payload.to_string(),
        mime_type: mime_type.to_string(),
    })
}

/// Checks if a path has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| RASTER_EXTENSIONS.contains(&e.as_str()))
}
