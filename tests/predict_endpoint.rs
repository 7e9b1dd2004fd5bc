//! Router-level tests for the /predict endpoint.
//!
//! A stub detector stands in for the ONNX model so these run without weights
//! on disk. Requests go through the real router, multipart parsing, image
//! decoding, verdict evaluation, and response serialization.

use std::io::Cursor;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use image::DynamicImage;
use serde_json::{json, Value};
use tower::ServiceExt;

use tb_screen_node::api::{build_router, AppState};
use tb_screen_node::vision::{DetectError, Detection, Detector};

struct StubDetector {
    detections: Vec<Detection>,
    fail_with: Option<String>,
}

impl StubDetector {
    fn returning(detections: Vec<Detection>) -> Arc<Self> {
        Arc::new(Self {
            detections,
            fail_with: None,
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            detections: vec![],
            fail_with: Some(message.to_string()),
        })
    }
}

impl Detector for StubDetector {
    fn infer(&self, _image: &DynamicImage) -> Result<Vec<Detection>, DetectError> {
        match &self.fail_with {
            Some(message) => Err(DetectError::Inference(message.clone())),
            None => Ok(self.detections.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

fn det(label: &str, confidence: f32, bbox: [f32; 4]) -> Detection {
    Detection {
        class_id: 0,
        label: label.to_string(),
        confidence,
        bbox,
    }
}

fn app(detector: Arc<StubDetector>) -> axum::Router {
    build_router(AppState { detector })
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([30, 30, 30]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

const BOUNDARY: &str = "predict-test-boundary";

fn multipart_body(payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"scan.png\"\r\n\
             Content-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn predict_request(payload: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(payload)))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn positive_detection_returns_rounded_verdict() {
    let detector = StubDetector::returning(vec![det(
        "tuberculosis",
        0.92,
        [1.004, 2.006, 3.001, 4.009],
    )]);

    let response = app(detector).oneshot(predict_request(&png_bytes())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(
        body,
        json!({
            "status": "success",
            "result": "has tuberculosis",
            "confidence": 0.92,
            "bbox": [1.0, 2.01, 3.0, 4.01],
        })
    );
}

#[tokio::test]
async fn no_detections_reports_zero_confidence() {
    let response = app(StubDetector::returning(vec![]))
        .oneshot(predict_request(&png_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["result"], "no tuberculosis");
    assert_eq!(body["confidence"], json!(0.0));
    assert_eq!(body["bbox"], Value::Null);
}

#[tokio::test]
async fn no_match_reports_last_seen_confidence() {
    let detector = StubDetector::returning(vec![
        det("normal", 0.9, [0.0, 0.0, 1.0, 1.0]),
        det("normal", 0.47, [0.0, 0.0, 1.0, 1.0]),
    ]);

    let response = app(detector).oneshot(predict_request(&png_bytes())).await.unwrap();
    let body = response_json(response).await;

    assert_eq!(body["result"], "no tuberculosis");
    assert_eq!(body["confidence"], json!(0.47));
    assert_eq!(body["bbox"], Value::Null);
}

#[tokio::test]
async fn first_qualifying_match_wins() {
    let detector = StubDetector::returning(vec![
        det("tuberculosis", 0.3, [9.0, 9.0, 9.0, 9.0]),
        det("tuberculosis", 0.6, [1.0, 2.0, 3.0, 4.0]),
        det("tuberculosis", 0.99, [5.0, 5.0, 6.0, 6.0]),
    ]);

    let response = app(detector).oneshot(predict_request(&png_bytes())).await.unwrap();
    let body = response_json(response).await;

    assert_eq!(body["result"], "has tuberculosis");
    assert_eq!(body["confidence"], json!(0.6));
    assert_eq!(body["bbox"], json!([1.0, 2.0, 3.0, 4.0]));
}

#[tokio::test]
async fn malformed_upload_returns_error_with_http_200() {
    let response = app(StubDetector::returning(vec![]))
        .oneshot(predict_request(b"these bytes are not an image"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("unsupported image format"));
}

#[tokio::test]
async fn missing_file_field_returns_error() {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"comment\"\r\n\r\n\
             hello\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app(StubDetector::returning(vec![]))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "no file field in multipart body");
}

#[tokio::test]
async fn detector_failure_returns_error_envelope() {
    let response = app(StubDetector::failing("tensor shape mismatch"))
        .oneshot(predict_request(&png_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "inference failed: tensor shape mismatch");
}

#[tokio::test]
async fn identical_uploads_yield_identical_responses() {
    let detector = StubDetector::returning(vec![det(
        "tuberculosis",
        0.87,
        [10.0, 20.0, 30.0, 40.0],
    )]);
    let payload = png_bytes();

    let first = app(detector.clone())
        .oneshot(predict_request(&payload))
        .await
        .unwrap();
    let second = app(detector)
        .oneshot(predict_request(&payload))
        .await
        .unwrap();

    assert_eq!(response_json(first).await, response_json(second).await);
}

#[tokio::test]
async fn health_reports_model_name() {
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app(StubDetector::returning(vec![]))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body, json!({"status": "ok", "model": "stub"}));
}
