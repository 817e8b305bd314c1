//! HTTP adapter tests against a local mock server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use glow_adapters::{
    ChatCompletionsProvider, DetectionConfig, JsonlHistoryStore, MessagesProvider,
    ProviderConfig, VisionFaceDetector,
};
use glow_core::domain::{LandmarkKind, Likelihood};
use glow_core::{
    AnalysisAccuracy, Angle, AssessmentPrompt, AssessmentProvider, EncodedImage, FaceDetector,
    HistoryEntry, HistoryStore, Rating, ServiceError,
};
use mockito::Matcher;
use serde_json::json;

fn image() -> EncodedImage {
    EncodedImage {
        base64: "QUJD".into(),
        mime_type: "image/jpeg".into(),
    }
}

fn prompt(with_image: bool) -> AssessmentPrompt {
    AssessmentPrompt {
        system: "Return JSON.".into(),
        user: "Analysis mode: single-angle (front)".into(),
        image: with_image.then(image),
    }
}

fn detector(url: &str) -> VisionFaceDetector {
    VisionFaceDetector::new(DetectionConfig {
        endpoint: url.to_string(),
        api_key: "vision-key".into(),
        timeout: Duration::from_secs(5),
    })
}

#[tokio::test]
async fn test_detection_maps_annotation() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/images:annotate")
        .match_query(Matcher::UrlEncoded("key".into(), "vision-key".into()))
        .match_body(Matcher::PartialJson(json!({
            "requests": [{
                "image": {"content": "QUJD"},
                "features": [{"type": "FACE_DETECTION"}, {"type": "IMAGE_PROPERTIES"}]
            }]
        })))
        .with_status(200)
        .with_body(
            json!({
                "responses": [{
                    "faceAnnotations": [{
                        "boundingPoly": {"vertices": [
                            {"x": 40, "y": 30}, {"x": 240, "y": 30},
                            {"x": 240, "y": 280}, {"x": 40, "y": 280}
                        ]},
                        "landmarks": [
                            {"type": "LEFT_EYE", "position": {"x": 100.5, "y": 120.0, "z": 0.1}},
                            {"type": "RIGHT_EYE", "position": {"x": 180.0, "y": 121.0, "z": 0.2}},
                            {"type": "NOSE_TIP", "position": {"x": 140.0, "y": 170.0, "z": -9.0}}
                        ],
                        "rollAngle": 1.5,
                        "panAngle": -3.0,
                        "tiltAngle": 2.0,
                        "detectionConfidence": 0.97,
                        "underExposedLikelihood": "VERY_UNLIKELY",
                        "blurredLikelihood": "UNLIKELY"
                    }],
                    "imagePropertiesAnnotation": {"dominantColors": {"colors": [
                        {"color": {"red": 210, "green": 170, "blue": 140}, "score": 0.4, "pixelFraction": 0.35}
                    ]}}
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let detection = detector(&server.url())
        .detect(Angle::Front, &image())
        .await
        .unwrap()
        .expect("face expected");

    mock.assert_async().await;
    assert_eq!(detection.angle, Angle::Front);
    assert!((detection.confidence - 0.97).abs() < 1e-9);
    assert_eq!(detection.bounding_box.width, 200);
    assert_eq!(detection.bounding_box.height, 250);
    assert!(detection.has_landmark(LandmarkKind::NoseTip));
    assert_eq!(detection.landmark(LandmarkKind::LeftEye), Some((100.5, 120.0)));
    assert!((detection.pose.pan + 3.0).abs() < 1e-9);
    assert_eq!(detection.exposure, Likelihood::VeryUnlikely);
    assert_eq!(detection.blur, Likelihood::Unlikely);
    assert_eq!(detection.dominant_colors[0].rgb, [210, 170, 140]);
}

#[tokio::test]
async fn test_detection_without_face_is_none() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/images:annotate")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"responses": [{}]}"#)
        .create_async()
        .await;

    let detection = detector(&server.url())
        .detect(Angle::Left, &image())
        .await
        .unwrap();
    assert!(detection.is_none());
}

#[tokio::test]
async fn test_detection_status_classification() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/images:annotate")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("overloaded")
        .create_async()
        .await;

    let err = detector(&server.url())
        .detect(Angle::Front, &image())
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.status(), Some(503));

    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/images:annotate")
        .match_query(Matcher::Any)
        .with_status(403)
        .create_async()
        .await;

    let err = detector(&server.url())
        .detect(Angle::Front, &image())
        .await
        .unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_detection_per_image_error_is_permanent() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/images:annotate")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"responses": [{"error": {"code": 3, "message": "Bad image data."}}]}"#)
        .create_async()
        .await;

    let err = detector(&server.url())
        .detect(Angle::Front, &image())
        .await
        .unwrap_err();
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("Bad image data."));
}

#[tokio::test]
async fn test_missing_key_never_calls_out() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let detector = VisionFaceDetector::new(DetectionConfig {
        endpoint: server.url(),
        api_key: String::new(),
        timeout: Duration::from_secs(5),
    });
    let err = detector.detect(Angle::Front, &image()).await.unwrap_err();

    assert!(matches!(err, ServiceError::Permanent { .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_messages_provider_sends_image() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ai/run/vision")
        .match_header("authorization", "Bearer primary-key")
        .match_body(Matcher::PartialJson(json!({
            "messages": [
                {"role": "system", "content": "Return JSON."},
                {"role": "user", "content": [
                    {"type": "text", "text": "Analysis mode: single-angle (front)"},
                    {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,QUJD"}}
                ]}
            ]
        })))
        .with_status(200)
        .with_body(r#"{"result": {"response": "{\"confidence\": 0.9}"}, "success": true, "errors": []}"#)
        .create_async()
        .await;

    let provider = MessagesProvider::new(ProviderConfig::new(
        "primary",
        format!("{}/ai/run/vision", server.url()),
        "primary-key",
    ));
    let text = provider.complete(&prompt(true)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(provider.name(), "primary");
    assert_eq!(text, r#"{"confidence": 0.9}"#);
}

#[tokio::test]
async fn test_messages_provider_without_result_is_permanent() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/run")
        .with_status(200)
        .with_body(r#"{"success": false, "errors": [{"message": "model unavailable"}]}"#)
        .create_async()
        .await;

    let provider = MessagesProvider::new(ProviderConfig::new(
        "primary",
        format!("{}/run", server.url()),
        "k",
    ));
    let err = provider.complete(&prompt(false)).await.unwrap_err();
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("model unavailable"));
}

#[tokio::test]
async fn test_chat_completions_provider() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer alt-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "glow-large",
            "messages": [
                {"role": "system", "content": "Return JSON."},
                {"role": "user", "content": "Analysis mode: single-angle (front)"}
            ],
            "max_tokens": 2048
        })))
        .with_status(200)
        .with_body(r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "{}"}}]}"#)
        .create_async()
        .await;

    let provider = ChatCompletionsProvider::new(
        ProviderConfig::new(
            "alternate",
            format!("{}/v1/chat/completions", server.url()),
            "alt-key",
        )
        .with_model("glow-large"),
    );
    // text-only: the image is dropped
    let text = provider.complete(&prompt(true)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(text, "{}");
}

#[tokio::test]
async fn test_chat_completions_rate_limit_is_transient() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let provider = ChatCompletionsProvider::new(ProviderConfig::new(
        "alternate",
        format!("{}/v1/chat/completions", server.url()),
        "alt-key",
    ));
    let err = provider.complete(&prompt(false)).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(err.to_string().contains("slow down"));
}

#[tokio::test]
async fn test_chat_completions_empty_choices() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices": []}"#)
        .create_async()
        .await;

    let provider = ChatCompletionsProvider::new(ProviderConfig::new(
        "alternate",
        format!("{}/v1/chat/completions", server.url()),
        "alt-key",
    ));
    let err = provider.complete(&prompt(false)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Permanent { .. }));
}

#[test]
fn test_history_appends_lines() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = JsonlHistoryStore::new(dir.path().join("nested/history.jsonl"));
    assert!(store.load().unwrap().is_empty());

    let entry = HistoryEntry {
        overall_score: 87,
        rating: Rating::from_score(87),
        detailed_scores: serde_json::from_value(json!({
            "facialSymmetry": 82, "skinGlow": 85, "skinClarity": 86, "hydration": 78,
            "texture": 84, "evenTone": 83, "poreRefinement": 78, "skinHealth": 81
        }))
        .unwrap(),
        confidence: 0.85,
        analysis_accuracy: AnalysisAccuracy::Standard,
        timestamp: "2024-05-01T12:00:00Z".into(),
    };
    store.record(&entry).unwrap();
    store.record(&entry).unwrap();

    let content = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(!content.contains("imageUri"));
    assert_eq!(store.load().unwrap(), vec![entry.clone(), entry]);
}
