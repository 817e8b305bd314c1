//! Shared helpers for CLI integration tests.

#![allow(dead_code, clippy::unwrap_used, deprecated)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use glow_test_support::{assessment_json, SyntheticImageBuilder};
use serde_json::json;

/// Isolated working directory with its own HOME and XDG config root.
pub struct Workspace {
    pub dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a skin-toned JPEG and returns its path.
    pub fn photo(&self, name: &str) -> PathBuf {
        let path = self.path().join(name);
        SyntheticImageBuilder::write_skin_tone(&path, 320, 320).unwrap();
        path
    }

    /// Writes `.glow-score.toml` in the working directory.
    pub fn project_config(&self, toml: &str) {
        std::fs::write(self.path().join(".glow-score.toml"), toml).unwrap();
    }

    /// Writes the XDG config file.
    pub fn xdg_config(&self, toml: &str) {
        let dir = self.path().join(".config/glow-score");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), toml).unwrap();
    }

    /// The binary, isolated from the user's config and keys.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("glow-score").unwrap();
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env("GLOW_DETECTION_API_KEY", "detection-key")
            .env("GLOW_PRIMARY_API_KEY", "primary-key")
            .env("GLOW_ALTERNATE_API_KEY", "alternate-key");
        cmd
    }
}

/// Vision annotate answer with one well-framed face.
pub fn face_response(confidence: f64) -> String {
    let landmark = |kind: &str, x: f64, y: f64| json!({"type": kind, "position": {"x": x, "y": y, "z": 0.0}});
    json!({
        "responses": [{
            "faceAnnotations": [{
                "boundingPoly": {"vertices": [
                    {"x": 40, "y": 30}, {"x": 280, "y": 30},
                    {"x": 280, "y": 300}, {"x": 40, "y": 300}
                ]},
                "landmarks": [
                    landmark("LEFT_EYE", 120.0, 130.0),
                    landmark("RIGHT_EYE", 200.0, 130.0),
                    landmark("MIDPOINT_BETWEEN_EYES", 160.0, 130.0),
                    landmark("NOSE_TIP", 160.0, 180.0),
                    landmark("MOUTH_LEFT", 130.0, 230.0),
                    landmark("MOUTH_RIGHT", 190.0, 230.0)
                ],
                "rollAngle": 1.0,
                "panAngle": 2.0,
                "tiltAngle": -1.0,
                "detectionConfidence": confidence,
                "underExposedLikelihood": "VERY_UNLIKELY",
                "blurredLikelihood": "VERY_UNLIKELY"
            }],
            "imagePropertiesAnnotation": {"dominantColors": {"colors": [
                {"color": {"red": 214, "green": 168, "blue": 140}, "score": 0.5, "pixelFraction": 0.45}
            ]}}
        }]
    })
    .to_string()
}

/// Vision annotate answer without any face.
pub const NO_FACE_RESPONSE: &str = r#"{"responses": [{}]}"#;

/// Primary provider answer wrapping a well-formed assessment.
pub fn primary_response(overall_score: u8) -> String {
    json!({"result": {"response": assessment_json(overall_score)}, "success": true}).to_string()
}

/// Alternate provider answer wrapping a well-formed assessment.
pub fn alternate_response(overall_score: u8) -> String {
    json!({"choices": [{"message": {"role": "assistant", "content": assessment_json(overall_score)}}]})
        .to_string()
}

/// Mock detection endpoint answering `hits` calls with `body`.
pub fn mock_detection(server: &mut mockito::Server, body: &str, hits: usize) -> mockito::Mock {
    server
        .mock("POST", "/v1/images:annotate")
        .match_query(mockito::Matcher::UrlEncoded(
            "key".into(),
            "detection-key".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create()
}
