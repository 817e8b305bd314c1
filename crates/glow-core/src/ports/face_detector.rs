//! Face detection port.

use async_trait::async_trait;

use crate::domain::{Angle, EncodedImage, FaceDetection, ServiceError};

/// Port for the external face-detection service.
///
/// Implementations make exactly one outbound call per invocation and never
/// retry; the pipeline owns retry and timeout policy.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Detects the most prominent face in `image`.
    ///
    /// Returns `Ok(None)` when the service answered but found no face.
    ///
    /// # Errors
    ///
    /// Returns a transient or permanent [`ServiceError`] if the call failed.
    async fn detect(
        &self,
        angle: Angle,
        image: &EncodedImage,
    ) -> Result<Option<FaceDetection>, ServiceError>;
}
