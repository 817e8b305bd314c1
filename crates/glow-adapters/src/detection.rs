//! Face detection over a Vision-style `images:annotate` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use glow_core::domain::{
    BoundingBox, DominantColor, Landmark, LandmarkKind, Likelihood, Pose,
};
use glow_core::{Angle, EncodedImage, FaceDetection, FaceDetector, ServiceError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http;

/// Public Vision API base URL.
pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com";

/// Connection settings for the detection service.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Base URL; `/v1/images:annotate` is appended.
    pub endpoint: String,
    /// API key sent as the `key` query parameter.
    pub api_key: String,
    /// Transport timeout for one call.
    pub timeout: Duration,
}

impl DetectionConfig {
    /// Settings for the public endpoint with a 15 s timeout.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// [`FaceDetector`] backed by the Vision annotate API.
///
/// Requests face detection (most prominent face only) together with image
/// properties for the dominant colors. Makes one call per invocation.
#[derive(Debug)]
pub struct VisionFaceDetector {
    client: reqwest::Client,
    config: DetectionConfig,
}

impl VisionFaceDetector {
    /// Creates a detector for `config`.
    #[must_use]
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            client: http::client(config.timeout),
            config,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/images:annotate",
            self.config.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl FaceDetector for VisionFaceDetector {
    async fn detect(
        &self,
        angle: Angle,
        image: &EncodedImage,
    ) -> Result<Option<FaceDetection>, ServiceError> {
        let key = http::require_key(&self.config.api_key, "face detection")?;
        let body = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: WireImage {
                    content: &image.base64,
                },
                features: vec![
                    Feature {
                        kind: "FACE_DETECTION",
                        max_results: 1,
                    },
                    Feature {
                        kind: "IMAGE_PROPERTIES",
                        max_results: 1,
                    },
                ],
            }],
        };

        let request = self.client.post(self.url()).query(&[("key", key)]);
        let response: AnnotateResponse = http::post_json(request, &body, "face detection").await?;

        let Some(annotated) = response.responses.into_iter().next() else {
            return Err(ServiceError::permanent("face detection returned no responses"));
        };
        if let Some(status) = annotated.error {
            return Err(ServiceError::permanent(format!(
                "face detection error {}: {}",
                status.code, status.message
            )));
        }

        let colors = annotated
            .image_properties_annotation
            .map(|p| p.dominant_colors.colors)
            .unwrap_or_default();
        let detection = annotated
            .face_annotations
            .into_iter()
            .next()
            .map(|face| face.into_detection(angle, &colors));

        match &detection {
            Some(d) => debug!("{angle}: face with confidence {:.2}", d.confidence),
            None => debug!("{angle}: no face found"),
        }
        Ok(detection)
    }
}

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<AnnotateImageRequest<'a>>,
}

#[derive(Serialize)]
struct AnnotateImageRequest<'a> {
    image: WireImage<'a>,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct WireImage<'a> {
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    face_annotations: Vec<FaceAnnotation>,
    image_properties_annotation: Option<ImageProperties>,
    error: Option<WireStatus>,
}

#[derive(Deserialize)]
struct WireStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaceAnnotation {
    bounding_poly: Option<BoundingPoly>,
    #[serde(default)]
    landmarks: Vec<WireLandmark>,
    #[serde(default)]
    roll_angle: f64,
    #[serde(default)]
    pan_angle: f64,
    #[serde(default)]
    tilt_angle: f64,
    #[serde(default)]
    detection_confidence: f64,
    #[serde(default)]
    under_exposed_likelihood: String,
    #[serde(default)]
    blurred_likelihood: String,
}

#[derive(Deserialize)]
struct BoundingPoly {
    #[serde(default)]
    vertices: Vec<Vertex>,
}

#[derive(Deserialize)]
struct Vertex {
    #[serde(default)]
    x: u32,
    #[serde(default)]
    y: u32,
}

#[derive(Deserialize)]
struct WireLandmark {
    #[serde(rename = "type")]
    kind: String,
    position: Position,
}

#[derive(Deserialize)]
struct Position {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageProperties {
    dominant_colors: DominantColors,
}

#[derive(Deserialize)]
struct DominantColors {
    #[serde(default)]
    colors: Vec<ColorInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColorInfo {
    color: WireColor,
    #[serde(default)]
    pixel_fraction: f64,
}

#[derive(Deserialize)]
struct WireColor {
    #[serde(default)]
    red: f64,
    #[serde(default)]
    green: f64,
    #[serde(default)]
    blue: f64,
}

impl FaceAnnotation {
    fn into_detection(self, angle: Angle, colors: &[ColorInfo]) -> FaceDetection {
        FaceDetection {
            angle,
            confidence: self.detection_confidence.clamp(0.0, 1.0),
            landmarks: self
                .landmarks
                .into_iter()
                .map(|l| Landmark {
                    kind: landmark_kind(&l.kind),
                    x: l.position.x,
                    y: l.position.y,
                })
                .collect(),
            pose: Pose {
                roll: self.roll_angle,
                pan: self.pan_angle,
                tilt: self.tilt_angle,
            },
            bounding_box: self
                .bounding_poly
                .map(|p| bounding_box(&p.vertices))
                .unwrap_or_default(),
            exposure: likelihood(&self.under_exposed_likelihood),
            blur: likelihood(&self.blurred_likelihood),
            dominant_colors: colors
                .iter()
                .map(|c| DominantColor {
                    rgb: [channel(c.color.red), channel(c.color.green), channel(c.color.blue)],
                    pixel_fraction: c.pixel_fraction,
                })
                .collect(),
        }
    }
}

fn bounding_box(vertices: &[Vertex]) -> BoundingBox {
    let xs = vertices.iter().map(|v| v.x);
    let ys = vertices.iter().map(|v| v.y);
    let (Some(min_x), Some(max_x)) = (xs.clone().min(), xs.max()) else {
        return BoundingBox::default();
    };
    let (Some(min_y), Some(max_y)) = (ys.clone().min(), ys.max()) else {
        return BoundingBox::default();
    };
    BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

fn landmark_kind(kind: &str) -> LandmarkKind {
    match kind {
        "LEFT_EYE" => LandmarkKind::LeftEye,
        "RIGHT_EYE" => LandmarkKind::RightEye,
        "MIDPOINT_BETWEEN_EYES" => LandmarkKind::MidpointBetweenEyes,
        "NOSE_TIP" => LandmarkKind::NoseTip,
        "MOUTH_LEFT" => LandmarkKind::MouthLeft,
        "MOUTH_RIGHT" => LandmarkKind::MouthRight,
        "MOUTH_CENTER" => LandmarkKind::MouthCenter,
        "LEFT_EAR_TRAGION" => LandmarkKind::LeftEarTragion,
        "RIGHT_EAR_TRAGION" => LandmarkKind::RightEarTragion,
        "CHIN_GNATHION" => LandmarkKind::ChinGnathion,
        "FOREHEAD_GLABELLA" => LandmarkKind::ForeheadGlabella,
        _ => LandmarkKind::Other,
    }
}

fn likelihood(value: &str) -> Likelihood {
    match value {
        "VERY_UNLIKELY" => Likelihood::VeryUnlikely,
        "UNLIKELY" => Likelihood::Unlikely,
        "POSSIBLE" => Likelihood::Possible,
        "LIKELY" => Likelihood::Likely,
        "VERY_LIKELY" => Likelihood::VeryLikely,
        _ => Likelihood::Unknown,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
