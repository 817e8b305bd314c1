//! Glow Score Adapters - External adapters for glow-score.
//!
//! This crate provides adapters for:
//! - Filesystem and `data:` URI photo encoding
//! - Face detection over the Vision annotate API
//! - Generative assessment providers
//! - JSON Lines analysis history

pub mod detection;
pub mod fs;
pub mod generative;
pub mod history;
mod http;

pub use detection::{DetectionConfig, VisionFaceDetector, DEFAULT_VISION_ENDPOINT};
pub use fs::FsImageCodec;
pub use generative::{ChatCompletionsProvider, MessagesProvider, ProviderConfig};
pub use history::JsonlHistoryStore;
