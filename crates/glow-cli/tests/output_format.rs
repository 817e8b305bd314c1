//! Output format validation tests.
//!
//! Tests JSON output correctness and required field presence.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use common::{face_response, mock_detection, primary_response, Workspace};
use serde_json::Value;

/// Runs a successful front-only analysis and returns stdout.
fn analyze(ws: &Workspace, front: &str, extra: &[&str]) -> String {
    let mut server = mockito::Server::new();
    mock_detection(&mut server, &face_response(0.95), 1);
    server
        .mock("POST", "/primary")
        .with_status(200)
        .with_body(primary_response(91))
        .create();

    let output = ws
        .command()
        .arg(front)
        .arg("--detection-endpoint")
        .arg(server.url())
        .arg("--primary-endpoint")
        .arg(format!("{}/primary", server.url()))
        .args(extra)
        .output()
        .unwrap();
    assert_eq!(
        output.status.code(),
        Some(0),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_result_has_required_fields() {
    let ws = Workspace::new();
    let front = ws.photo("front.jpg");
    let stdout = analyze(&ws, front.to_str().unwrap(), &[]);
    let result: Value = serde_json::from_str(&stdout).unwrap();

    for field in [
        "overallScore",
        "rating",
        "detailedScores",
        "dermatologyInsights",
        "personalizedTips",
        "confidence",
        "timestamp",
        "imageUri",
    ] {
        assert!(result.get(field).is_some(), "missing field {field}");
    }

    for field in [
        "skinType",
        "skinTone",
        "acneRisk",
        "skinHealth",
        "concerns",
        "agingSigns",
        "analysisAccuracy",
        "multiAngle",
    ] {
        assert!(
            result["dermatologyInsights"].get(field).is_some(),
            "missing insight {field}"
        );
    }
}

#[test]
fn test_detailed_scores_in_range() {
    let ws = Workspace::new();
    let front = ws.photo("front.jpg");
    let stdout = analyze(&ws, front.to_str().unwrap(), &[]);
    let result: Value = serde_json::from_str(&stdout).unwrap();

    let scores = result["detailedScores"].as_object().unwrap();
    assert_eq!(scores.len(), 8);
    for (name, score) in scores {
        let score = score.as_u64().unwrap();
        assert!((60..=98).contains(&score), "{name} = {score}");
    }
    let confidence = result["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
    assert!(!result["personalizedTips"].as_array().unwrap().is_empty());
}

#[test]
fn test_rating_matches_score_band() {
    let ws = Workspace::new();
    let front = ws.photo("front.jpg");
    let stdout = analyze(&ws, front.to_str().unwrap(), &[]);
    let result: Value = serde_json::from_str(&stdout).unwrap();

    let score = result["overallScore"].as_u64().unwrap();
    let expected = match score {
        90.. => "Outstanding",
        85..=89 => "Amazing",
        80..=84 => "Excellent",
        75..=79 => "Great",
        70..=74 => "Very Good",
        60..=69 => "Good",
        _ => "Fair",
    };
    assert_eq!(result["rating"], expected);
}

#[test]
fn test_compact_output_is_one_line() {
    let ws = Workspace::new();
    let front = ws.photo("front.jpg");
    let stdout = analyze(&ws, front.to_str().unwrap(), &[]);

    let lines: Vec<_> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 1);
}

#[test]
fn test_pretty_output() {
    let ws = Workspace::new();
    let front = ws.photo("front.jpg");
    let stdout = analyze(&ws, front.to_str().unwrap(), &["--pretty"]);

    assert!(stdout.lines().count() > 1);
    assert!(stdout.contains("  \"overallScore\""));
    let _: Value = serde_json::from_str(&stdout).unwrap();
}

#[test]
fn test_timestamp_is_rfc3339() {
    let ws = Workspace::new();
    let front = ws.photo("front.jpg");
    let stdout = analyze(&ws, front.to_str().unwrap(), &[]);
    let result: Value = serde_json::from_str(&stdout).unwrap();

    let ts = result["timestamp"].as_str().unwrap();
    assert!(ts.contains('T'), "{ts}");
    assert!(ts.ends_with('Z'), "{ts}");
}

#[test]
fn test_data_uri_front_photo() {
    let ws = Workspace::new();
    let front = ws.photo("front.jpg");
    let uri = format!(
        "data:image/jpeg;base64,{}",
        STANDARD.encode(std::fs::read(&front).unwrap())
    );

    let stdout = analyze(&ws, &uri, &[]);
    let result: Value = serde_json::from_str(&stdout).unwrap();
    assert!(result["imageUri"]
        .as_str()
        .unwrap()
        .starts_with("data:image/jpeg;base64,"));
}
