//! Mock implementations of core port traits.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use glow_core::domain::{
    AnalysisResult, Angle, AssessmentPrompt, AssessmentSource, EncodedImage, FaceDetection,
    HistoryEntry, ImageRef, ServiceError,
};
use glow_core::ports::{
    AssessmentProvider, FaceDetector, HistoryStore, ImageCodec, ProgressEvent, ProgressSink,
    ResultOutput,
};

/// Mock implementation of `ImageCodec`.
///
/// Encodes the reference text itself, and fails for references marked
/// unreadable.
#[derive(Default)]
pub struct MockImageCodec {
    unreadable: HashSet<String>,
    encoded: Mutex<Vec<String>>,
}

impl MockImageCodec {
    /// Creates a codec that accepts every reference.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a reference as unreadable.
    #[must_use]
    pub fn unreadable(mut self, reference: &str) -> Self {
        self.unreadable.insert(reference.to_string());
        self
    }

    /// References encoded so far, in call order.
    #[must_use]
    pub fn encoded(&self) -> Vec<String> {
        self.encoded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ImageCodec for MockImageCodec {
    fn encode(&self, image: &ImageRef) -> anyhow::Result<EncodedImage> {
        if self.unreadable.contains(image.as_str()) {
            anyhow::bail!("cannot decode {image}");
        }
        self.encoded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(image.to_string());
        Ok(EncodedImage {
            base64: image.as_str().to_string(),
            mime_type: "image/jpeg".into(),
        })
    }
}

type DetectionReply = Result<Option<FaceDetection>, ServiceError>;

/// Mock implementation of `FaceDetector`.
///
/// Replies per angle, optionally after a delay, and counts calls. Angles
/// without a reply get `Ok(None)`.
#[derive(Default)]
pub struct MockFaceDetector {
    replies: HashMap<Angle, DetectionReply>,
    delays: HashMap<Angle, Duration>,
    calls: Mutex<Vec<Angle>>,
    completed: Mutex<Vec<Angle>>,
}

impl MockFaceDetector {
    /// Creates a detector that finds no face anywhere.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies with `detection` for its own angle.
    #[must_use]
    pub fn with_face(mut self, detection: FaceDetection) -> Self {
        self.replies.insert(detection.angle, Ok(Some(detection)));
        self
    }

    /// Replies with a service error for `angle`.
    #[must_use]
    pub fn with_error(mut self, angle: Angle, error: ServiceError) -> Self {
        self.replies.insert(angle, Err(error));
        self
    }

    /// Delays the reply for `angle`.
    #[must_use]
    pub fn with_delay(mut self, angle: Angle, delay: Duration) -> Self {
        self.delays.insert(angle, delay);
        self
    }

    /// Total number of detection calls started.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Angles whose call ran to completion.
    #[must_use]
    pub fn completed(&self) -> Vec<Angle> {
        self.completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl FaceDetector for MockFaceDetector {
    async fn detect(&self, angle: Angle, _image: &EncodedImage) -> DetectionReply {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(angle);
        if let Some(delay) = self.delays.get(&angle) {
            tokio::time::sleep(*delay).await;
        }
        self.completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(angle);
        self.replies.get(&angle).cloned().unwrap_or(Ok(None))
    }
}

/// Scripted generative provider.
///
/// Replays queued replies in order, then repeats the steady reply (if any)
/// forever. Records every prompt it receives.
pub struct ScriptedProvider {
    name: String,
    script: Mutex<VecDeque<Result<String, ServiceError>>>,
    steady: Option<Result<String, ServiceError>>,
    prompts: Mutex<Vec<AssessmentPrompt>>,
}

impl ScriptedProvider {
    /// Creates a provider with an empty script.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(VecDeque::new()),
            steady: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A provider that always answers `text`.
    #[must_use]
    pub fn always(name: &str, text: &str) -> Self {
        Self::new(name).steady(Ok(text.to_string()))
    }

    /// A provider that always fails with HTTP `status`.
    #[must_use]
    pub fn failing(name: &str, status: u16) -> Self {
        Self::new(name).steady(Err(ServiceError::from_status(status, "scripted failure")))
    }

    /// Queues a failure with HTTP `status`.
    #[must_use]
    pub fn then_status(self, status: u16) -> Self {
        self.push(Err(ServiceError::from_status(status, "scripted failure")))
    }

    /// Queues a successful answer.
    #[must_use]
    pub fn then_text(self, text: &str) -> Self {
        self.push(Ok(text.to_string()))
    }

    /// Sets the reply used once the script is exhausted.
    #[must_use]
    pub fn steady(mut self, reply: Result<String, ServiceError>) -> Self {
        self.steady = Some(reply);
        self
    }

    fn push(self, reply: Result<String, ServiceError>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
        self
    }

    /// Number of completion requests received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }

    /// Prompts received so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<AssessmentPrompt> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AssessmentProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &AssessmentPrompt) -> Result<String, ServiceError> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.clone());
        let queued = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        queued
            .or_else(|| self.steady.clone())
            .unwrap_or_else(|| Err(ServiceError::permanent("script exhausted")))
    }
}

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures results for later assertions.
#[derive(Default)]
pub struct MockResultOutput {
    results: Arc<Mutex<Vec<AnalysisResult>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured results.
    #[must_use]
    pub fn results(&self) -> Vec<AnalysisResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultOutput for MockResultOutput {
    fn write(&self, result: &AnalysisResult) -> anyhow::Result<()> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Ok(mut c) = self.flush_count.lock() {
            *c += 1;
        }
        Ok(())
    }
}

/// Mock implementation of `HistoryStore`.
#[derive(Default)]
pub struct MockHistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl MockHistoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HistoryStore for MockHistoryStore {
    fn record(&self, entry: &HistoryEntry) -> anyhow::Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
#[derive(Default)]
pub struct MockProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the source reported by the `AssessmentCompleted` event, if any.
    #[must_use]
    pub fn assessment_source(&self) -> Option<AssessmentSource> {
        self.events().into_iter().find_map(|e| match e {
            ProgressEvent::AssessmentCompleted { source } => Some(source),
            _ => None,
        })
    }

    /// Returns whether a `SynthesisCompleted` event was received.
    #[must_use]
    pub fn has_synthesized(&self) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, ProgressEvent::SynthesisCompleted { .. }))
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
