//! Image codec port for turning photo references into upload payloads.

use crate::domain::{EncodedImage, ImageRef};

/// Port for encoding a photo for transport.
pub trait ImageCodec: Send + Sync {
    /// Loads and encodes the referenced photo.
    ///
    /// # Errors
    ///
    /// Returns an error if the photo cannot be read or encoded.
    fn encode(&self, image: &ImageRef) -> anyhow::Result<EncodedImage>;
}
