//! Configuration file support for glow-score.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/glow-score/config.toml` (lowest priority)
//! - Project-local: `.glow-score.toml` (searched up directory tree)
//! - Environment: API keys from `GLOW_*_API_KEY`
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

/// Environment variable holding the detection service key.
pub const DETECTION_KEY_ENV: &str = "GLOW_DETECTION_API_KEY";
/// Environment variable holding the primary provider key.
pub const PRIMARY_KEY_ENV: &str = "GLOW_PRIMARY_API_KEY";
/// Environment variable holding the alternate provider key.
pub const ALTERNATE_KEY_ENV: &str = "GLOW_ALTERNATE_API_KEY";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Face detection service.
    pub detection: ServiceConfig,
    /// Vision-capable generative provider, tried first.
    pub primary: ServiceConfig,
    /// Text-only generative provider.
    pub alternate: ServiceConfig,
    /// Validation gate thresholds.
    pub gate: GateSettings,
    /// Retry and provider ordering.
    pub assessment: AssessmentSettings,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// Connection settings for one external service.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Endpoint URL (base URL for detection, full URL for providers).
    pub endpoint: Option<String>,
    /// API key. Prefer the environment variable over storing keys in files.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: Option<String>,
    /// Per-call timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Completion length cap.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

/// Validation gate thresholds.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    /// Minimum front detection confidence (0.0-1.0).
    pub min_front_confidence: Option<f64>,
    /// Minimum profile detection confidence (0.0-1.0).
    pub min_profile_confidence: Option<f64>,
    /// Minimum face size in pixels for the front photo.
    pub min_face_size: Option<u32>,
}

/// Generative assessment settings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AssessmentSettings {
    /// Attempts per provider.
    pub max_attempts: Option<u32>,
    /// Provider names in the order they are tried.
    pub provider_order: Option<Vec<String>>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
    /// JSON Lines history file.
    pub history: Option<PathBuf>,
}

impl ServiceConfig {
    fn merge(&mut self, other: Self) {
        self.endpoint = other.endpoint.or_else(|| self.endpoint.take());
        self.api_key = other.api_key.or_else(|| self.api_key.take());
        self.model = other.model.or_else(|| self.model.take());
        self.timeout_secs = other.timeout_secs.or(self.timeout_secs);
        self.max_tokens = other.max_tokens.or(self.max_tokens);
        self.temperature = other.temperature.or(self.temperature);
    }
}

impl AppConfig {
    /// Load configuration from XDG and project-local files, then the
    /// environment.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/glow-score/config.toml`
    /// 2. Project-local: `.glow-score.toml` (searched up from cwd)
    /// 3. `GLOW_*_API_KEY` environment variables
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load XDG config (lowest priority)
        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        // Load project-local config (higher priority, merged)
        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        config.apply_env(|name| std::env::var(name).ok());

        // Validate merged config
        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Overrides API keys with non-empty values from `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (name, service) in [
            (DETECTION_KEY_ENV, &mut self.detection),
            (PRIMARY_KEY_ENV, &mut self.primary),
            (ALTERNATE_KEY_ENV, &mut self.alternate),
        ] {
            if let Some(key) = lookup(name).filter(|k| !k.trim().is_empty()) {
                debug!("Using API key from {name}");
                service.api_key = Some(key);
            }
        }
    }

    /// Validate configuration values are within acceptable ranges.
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("gate.min_front_confidence", self.gate.min_front_confidence),
            ("gate.min_profile_confidence", self.gate.min_profile_confidence),
        ] {
            if let Some(t) = value {
                if !(0.0..=1.0).contains(&t) {
                    return Err(format!("{name} must be 0.0-1.0, got {t}"));
                }
            }
        }

        for (name, service) in [
            ("detection", &self.detection),
            ("primary", &self.primary),
            ("alternate", &self.alternate),
        ] {
            if service.timeout_secs == Some(0) {
                return Err(format!("{name}.timeout_secs must be positive"));
            }
            if let Some(t) = service.temperature {
                if !(0.0..=2.0).contains(&t) {
                    return Err(format!("{name}.temperature must be 0.0-2.0, got {t}"));
                }
            }
        }

        if self.assessment.max_attempts == Some(0) {
            return Err("assessment.max_attempts must be at least 1".to_string());
        }
        if let Some(order) = &self.assessment.provider_order {
            if let Some(unknown) = order
                .iter()
                .find(|n| n.as_str() != "primary" && n.as_str() != "alternate")
            {
                return Err(format!(
                    "assessment.provider_order accepts 'primary' and 'alternate', got '{unknown}'"
                ));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        self.detection.merge(other.detection);
        self.primary.merge(other.primary);
        self.alternate.merge(other.alternate);

        // Gate
        self.gate.min_front_confidence = other
            .gate
            .min_front_confidence
            .or(self.gate.min_front_confidence);
        self.gate.min_profile_confidence = other
            .gate
            .min_profile_confidence
            .or(self.gate.min_profile_confidence);
        self.gate.min_face_size = other.gate.min_face_size.or(self.gate.min_face_size);

        // Assessment
        self.assessment.max_attempts = other
            .assessment
            .max_attempts
            .or(self.assessment.max_attempts);
        self.assessment.provider_order = other
            .assessment
            .provider_order
            .or_else(|| self.assessment.provider_order.take());

        // Output
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
        self.output.history = other.output.history.or_else(|| self.output.history.take());
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("glow-score").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.glow-score.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".glow-score.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
