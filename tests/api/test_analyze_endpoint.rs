// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /analyze over the full router
//!
//! Requests are driven through `tower::ServiceExt::oneshot`, so nothing
//! binds a socket. Models are scripted fakes.

use crate::common::{handle, png_bytes, FailingModel, FailingStore, FakeClassifier};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use orthoai_xray_node::{
    api::{build_router, AppState, ErrorResponse},
    storage::LocalImageStore,
    vision::{AnalysisResult, ModelRegistry, ModelRole, XrayPipeline},
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "orthoai-test-boundary";

async fn test_app(registry: ModelRegistry, max_upload_bytes: usize) -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalImageStore::new(dir.path()).await.unwrap();
    let pipeline = XrayPipeline::new(Arc::new(registry), Arc::new(store));
    let app = build_router(AppState::new(pipeline), dir.path(), max_upload_bytes);
    (app, dir)
}

fn failing_store_app() -> Router {
    let pipeline = XrayPipeline::new(Arc::new(opg_registry()), Arc::new(FailingStore));
    build_router(
        AppState::new(pipeline),
        std::path::Path::new("/nonexistent/uploads"),
        1024 * 1024,
    )
}

fn opg_registry() -> ModelRegistry {
    ModelRegistry::empty().with_model(ModelRole::Classifier, handle(FakeClassifier::predicting("OPG")))
}

/// Build a multipart/form-data body with a single file part
fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn analyze_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[cfg(test)]
mod analyze_success_tests {
    use super::*;

    #[tokio::test]
    async fn test_analyze_returns_client_shape() {
        let (app, _dir) = test_app(opg_registry(), 1024 * 1024).await;

        let response = app
            .oneshot(analyze_request(multipart_body("file", "opg.png", &png_bytes(16, 16))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["type"], "OPG");
        assert!(json["imageId"].is_string());
        assert!(json["imageUrl"].as_str().unwrap().starts_with("/uploads/"));

        let issues = json["issues"].as_array().unwrap();
        assert_eq!(issues.len(), 2);
        for issue in issues {
            for key in ["id", "label", "confidence", "x", "y", "width", "height", "color"] {
                assert!(issue.get(key).is_some(), "missing {}", key);
            }
        }
    }

    #[tokio::test]
    async fn test_stored_upload_is_served() {
        let (app, _dir) = test_app(opg_registry(), 1024 * 1024).await;
        let image = png_bytes(12, 12);

        let response = app
            .clone()
            .oneshot(analyze_request(multipart_body("file", "scan.png", &image)))
            .await
            .unwrap();
        let result: AnalysisResult = serde_json::from_value(body_json(response).await).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(&result.image_url)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let served = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(served.as_ref(), image.as_slice());
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let (app, _dir) = test_app(opg_registry(), 1024 * 1024).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/analyze")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }
}

#[cfg(test)]
mod analyze_error_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_field_is_400() {
        let (app, _dir) = test_app(opg_registry(), 1024 * 1024).await;

        let response = app
            .oneshot(analyze_request(multipart_body("image", "opg.png", &png_bytes(8, 8))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error: ErrorResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(error.error_type, "validation_error");
    }

    #[tokio::test]
    async fn test_empty_file_is_400() {
        let (app, _dir) = test_app(opg_registry(), 1024 * 1024).await;

        let response = app
            .oneshot(analyze_request(multipart_body("file", "opg.png", &[])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_no_classifier_is_500_without_result() {
        let (app, _dir) = test_app(ModelRegistry::empty(), 1024 * 1024).await;

        let response = app
            .oneshot(analyze_request(multipart_body("file", "opg.png", &png_bytes(8, 8))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error_type"], "model_unavailable");
        assert!(json.get("issues").is_none());
    }

    #[tokio::test]
    async fn test_inference_failure_is_500() {
        let registry =
            ModelRegistry::empty().with_model(ModelRole::Classifier, handle(FailingModel));
        let (app, _dir) = test_app(registry, 1024 * 1024).await;

        let response = app
            .oneshot(analyze_request(multipart_body("file", "opg.png", &png_bytes(8, 8))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error_type"], "inference_failure");
    }

    #[tokio::test]
    async fn test_storage_failure_is_500() {
        let response = failing_store_app()
            .oneshot(analyze_request(multipart_body("file", "opg.png", &png_bytes(8, 8))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error_type"], "storage_failure");
        assert!(json.get("imageId").is_none());
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let (app, _dir) = test_app(opg_registry(), 256).await;

        let response = app
            .oneshot(analyze_request(multipart_body("file", "big.png", &vec![7u8; 4096])))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }
}
