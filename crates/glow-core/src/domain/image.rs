//! Image references and the per-run image set.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque reference to a user photo (file path, URI or `data:` URI).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Creates a new image reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Capture angle of a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Angle {
    /// Frontal view. Mandatory.
    Front,
    /// Left profile.
    Left,
    /// Right profile.
    Right,
}

impl Angle {
    /// Returns true for the left and right profile angles.
    #[must_use]
    pub const fn is_profile(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Lowercase name used in logs and prompts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The photos submitted for one analysis run.
///
/// The front photo is always present; profiles are optional.
#[derive(Debug, Clone)]
pub struct ImageSet {
    front: ImageRef,
    left: Option<ImageRef>,
    right: Option<ImageRef>,
}

impl ImageSet {
    /// Creates a front-only image set.
    #[must_use]
    pub fn front(front: impl Into<ImageRef>) -> Self {
        Self {
            front: front.into(),
            left: None,
            right: None,
        }
    }

    /// Adds a left profile photo.
    #[must_use]
    pub fn with_left(mut self, left: impl Into<ImageRef>) -> Self {
        self.left = Some(left.into());
        self
    }

    /// Adds a right profile photo.
    #[must_use]
    pub fn with_right(mut self, right: impl Into<ImageRef>) -> Self {
        self.right = Some(right.into());
        self
    }

    /// The mandatory front photo.
    #[must_use]
    pub const fn front_ref(&self) -> &ImageRef {
        &self.front
    }

    /// Returns the profile photos that were supplied, left first.
    pub fn profiles(&self) -> impl Iterator<Item = (Angle, &ImageRef)> {
        [(Angle::Left, &self.left), (Angle::Right, &self.right)]
            .into_iter()
            .filter_map(|(angle, r)| r.as_ref().map(|r| (angle, r)))
    }

    /// True when at least one profile photo was supplied.
    #[must_use]
    pub const fn is_multi_angle(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A transport-ready encoded photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Base64 payload (standard alphabet, no data-URI prefix).
    pub base64: String,
    /// MIME type of the encoded bytes.
    pub mime_type: String,
}

impl EncodedImage {
    /// Renders the payload as a `data:` URI.
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}
