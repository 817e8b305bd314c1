//! Analysis pipeline orchestrating detection, validation, assessment and
//! synthesis for one image set.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, Either};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{
    AnalysisError, AnalysisResult, Angle, AssessmentOutcome, EncodedImage, FaceDetection,
    ImageSet, ParseError, ServiceError, ValidationVerdict,
};
use crate::modules::{
    AssessmentRequestBuilder, DeterministicFallbackGenerator, FaceValidationGate,
    GenerativeAssessmentClient, ResponseSanitizer, ScoreSynthesizer, SynthesisInput,
};
use crate::ports::{FaceDetector, ImageCodec, ProgressEvent, ProgressSink};
use crate::retry::RetryPolicy;

/// Default bound for a single detection call.
const DETECTION_TIMEOUT: Duration = Duration::from_secs(15);

type Detected = Result<Option<FaceDetection>, ServiceError>;

/// Why the generative path was abandoned.
#[derive(Debug, Error)]
enum AssessmentFailure {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Detections that survived the gate.
struct Accepted {
    front: FaceDetection,
    profiles: Vec<FaceDetection>,
}

/// Runs the full analysis for one image set.
///
/// Holds no per-run state; one pipeline can serve any number of sequential or
/// concurrent runs.
pub struct AnalysisPipeline {
    codec: Arc<dyn ImageCodec>,
    detector: Arc<dyn FaceDetector>,
    gate: FaceValidationGate,
    generative: GenerativeAssessmentClient,
    detection_retry: RetryPolicy,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl AnalysisPipeline {
    /// Creates a pipeline with the default gate and a single 15 s detection
    /// attempt per angle.
    #[must_use]
    pub fn new(
        codec: Arc<dyn ImageCodec>,
        detector: Arc<dyn FaceDetector>,
        generative: GenerativeAssessmentClient,
    ) -> Self {
        Self {
            codec,
            detector,
            gate: FaceValidationGate::default(),
            generative,
            detection_retry: RetryPolicy::single(DETECTION_TIMEOUT),
            progress: None,
        }
    }

    /// Replaces the validation gate.
    #[must_use]
    pub fn with_gate(mut self, gate: FaceValidationGate) -> Self {
        self.gate = gate;
        self
    }

    /// Replaces the retry policy wrapped around each detection call.
    #[must_use]
    pub fn with_detection_retry(mut self, retry: RetryPolicy) -> Self {
        self.detection_retry = retry;
        self
    }

    /// Attaches a progress sink.
    #[must_use]
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Analyzes `images`.
    ///
    /// Once the front photo passes validation a result is always produced:
    /// any generative or parsing failure falls back to the deterministic
    /// assessment.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::FaceNotDetected`] if the front photo fails the gate
    /// - [`AnalysisError::InvalidImage`] if the front photo cannot be encoded
    /// - [`AnalysisError::AnalysisUnavailable`] if front detection fails
    /// - [`AnalysisError::Cancelled`] if `cancel` fires
    pub async fn analyze(
        &self,
        images: &ImageSet,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError> {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        info!("Analyzing {}", images.front_ref());

        let front_image =
            self.codec
                .encode(images.front_ref())
                .map_err(|e| AnalysisError::InvalidImage {
                    angle: Angle::Front,
                    reason: format!("{e:#}"),
                })?;
        let profile_images: Vec<(Angle, EncodedImage)> = images
            .profiles()
            .filter_map(|(angle, image)| match self.codec.encode(image) {
                Ok(encoded) => Some((angle, encoded)),
                Err(e) => {
                    warn!("Dropping {angle} photo: {e:#}");
                    None
                }
            })
            .collect();

        let accepted = self.detect_and_validate(&front_image, &profile_images, cancel).await?;
        let multi_angle = !accepted.profiles.is_empty();

        let outcome = self
            .assess(images.front_ref().as_str(), front_image, &accepted, cancel)
            .await?;
        self.emit(ProgressEvent::AssessmentCompleted {
            source: outcome.source.clone(),
        });

        let timestamp = iso_timestamp();
        let image_uri = images.front_ref().to_string();
        let result = ScoreSynthesizer::synthesize(&SynthesisInput {
            front: &accepted.front,
            profiles: &accepted.profiles,
            outcome: &outcome,
            image_uri: &image_uri,
            timestamp: &timestamp,
        });
        self.emit(ProgressEvent::SynthesisCompleted {
            overall_score: result.overall_score,
        });

        info!(
            "Glow score {} ({}), multi-angle: {multi_angle}, accuracy: {:?}",
            result.overall_score, result.rating, result.dermatology_insights.analysis_accuracy
        );
        Ok(result)
    }

    /// Runs detection and the gate without any assessment.
    ///
    /// Returns one verdict per supplied angle, front first. Profiles whose
    /// detection call failed are reported as having no face.
    ///
    /// # Errors
    ///
    /// Same as [`Self::analyze`], except that a failing front photo yields a
    /// verdict instead of [`AnalysisError::FaceNotDetected`].
    pub async fn validate(
        &self,
        images: &ImageSet,
        cancel: &CancellationToken,
    ) -> Result<Vec<ValidationVerdict>, AnalysisError> {
        let mut verdicts = Vec::new();
        let angles = std::iter::once((Angle::Front, images.front_ref())).chain(images.profiles());

        for (angle, image) in angles {
            let encoded = match self.codec.encode(image) {
                Ok(encoded) => encoded,
                Err(e) if angle.is_profile() => {
                    warn!("Skipping {angle} photo: {e:#}");
                    continue;
                }
                Err(e) => {
                    return Err(AnalysisError::InvalidImage {
                        angle,
                        reason: format!("{e:#}"),
                    })
                }
            };
            let detection = match self.detect(angle, &encoded, cancel).await {
                Ok(detection) => detection,
                Err(ServiceError::Cancelled) => return Err(AnalysisError::Cancelled),
                Err(e) if angle.is_profile() => {
                    warn!("{angle} detection failed: {e}");
                    None
                }
                Err(e) => return Err(AnalysisError::AnalysisUnavailable(e)),
            };
            verdicts.push(self.gate.evaluate(angle, detection.as_ref()));
        }
        Ok(verdicts)
    }

    async fn detect(
        &self,
        angle: Angle,
        image: &EncodedImage,
        cancel: &CancellationToken,
    ) -> Detected {
        let label = format!("{angle} face detection");
        self.detection_retry
            .run(&label, cancel, |_| self.detector.detect(angle, image))
            .await
    }

    /// Detects every angle concurrently and applies the gate.
    ///
    /// When the front call settles first and fails the gate, pending profile
    /// calls are dropped.
    async fn detect_and_validate(
        &self,
        front_image: &EncodedImage,
        profile_images: &[(Angle, EncodedImage)],
        cancel: &CancellationToken,
    ) -> Result<Accepted, AnalysisError> {
        let front_call = self.detect(Angle::Front, front_image, cancel);
        let profile_calls = future::join_all(
            profile_images
                .iter()
                .map(|(angle, image)| async move { (*angle, self.detect(*angle, image, cancel).await) }),
        );
        tokio::pin!(front_call);
        tokio::pin!(profile_calls);

        let (front, profiles) = match future::select(front_call, profile_calls).await {
            Either::Left((front, pending_profiles)) => {
                let front = self.accept_front(front)?;
                (front, pending_profiles.await)
            }
            Either::Right((profiles, pending_front)) => {
                let front = self.accept_front(pending_front.await)?;
                (front, profiles)
            }
        };

        let mut detected = vec![Angle::Front];
        let mut accepted = Vec::new();
        let mut dropped = Vec::new();
        for (angle, outcome) in profiles {
            let detection = match outcome {
                Ok(detection) => detection,
                Err(ServiceError::Cancelled) => return Err(AnalysisError::Cancelled),
                Err(e) => {
                    warn!("Dropping {angle} photo, detection failed: {e}");
                    continue;
                }
            };
            if detection.is_some() {
                detected.push(angle);
            }
            let verdict = self.gate.evaluate(angle, detection.as_ref());
            match detection {
                Some(detection) if verdict.passed() => accepted.push(detection),
                _ => {
                    warn!("Dropping {angle} photo: {verdict}");
                    dropped.push(verdict);
                }
            }
        }

        self.emit(ProgressEvent::DetectionCompleted { angles: detected });
        self.emit(ProgressEvent::ValidationPassed {
            accepted: std::iter::once(Angle::Front)
                .chain(accepted.iter().map(|d| d.angle))
                .collect(),
            dropped,
        });

        Ok(Accepted {
            front,
            profiles: accepted,
        })
    }

    fn accept_front(&self, detected: Detected) -> Result<FaceDetection, AnalysisError> {
        match detected {
            Ok(detection) => self.gate.require_front(detection),
            Err(ServiceError::Cancelled) => Err(AnalysisError::Cancelled),
            Err(e) => {
                warn!("Front detection failed: {e}");
                Err(AnalysisError::AnalysisUnavailable(e))
            }
        }
    }

    /// Generative assessment, or the deterministic fallback on any failure
    /// other than cancellation.
    async fn assess(
        &self,
        image_id: &str,
        front_image: EncodedImage,
        accepted: &Accepted,
        cancel: &CancellationToken,
    ) -> Result<AssessmentOutcome, AnalysisError> {
        match self.generative_assessment(front_image, accepted, cancel).await {
            Ok(outcome) => Ok(outcome),
            Err(AssessmentFailure::Service(ServiceError::Cancelled)) => Err(AnalysisError::Cancelled),
            Err(_) if cancel.is_cancelled() => Err(AnalysisError::Cancelled),
            Err(failure) => {
                warn!("Generative assessment failed, using fallback: {failure}");
                let assessment = DeterministicFallbackGenerator::generate(image_id, Some(&accepted.front));
                Ok(AssessmentOutcome::fallback(assessment, failure.to_string()))
            }
        }
    }

    async fn generative_assessment(
        &self,
        front_image: EncodedImage,
        accepted: &Accepted,
        cancel: &CancellationToken,
    ) -> Result<AssessmentOutcome, AssessmentFailure> {
        let detections: Vec<FaceDetection> = std::iter::once(&accepted.front)
            .chain(&accepted.profiles)
            .cloned()
            .collect();
        let mut prompt =
            AssessmentRequestBuilder::build(&detections, !accepted.profiles.is_empty());
        prompt.image = Some(front_image);

        let completion = self.generative.request(&prompt, cancel).await?;
        let (assessment, stage) = ResponseSanitizer::sanitize_with_stage(&completion.text)?;
        debug!("Assessment from {} parsed ({stage})", completion.provider);
        Ok(AssessmentOutcome::generative(assessment, completion.provider))
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(sink) = &self.progress {
            sink.on_event(event);
        }
    }
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
