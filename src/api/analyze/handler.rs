// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use tracing::{debug, warn};

use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::AnalysisResult;

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// POST /analyze - Classify a dental X-ray and detect findings
///
/// # Request
/// `multipart/form-data` with the image in a `file` field. The part's
/// filename is only used to pick the stored file's extension.
///
/// # Response
/// - `imageId`: Identifier of the stored upload
/// - `imageUrl`: Where the stored upload can be fetched
/// - `type`: Radiograph type (OPG, Periapical, Bitewing)
/// - `issues`: Findings with top-left boxes in image pixels
///
/// # Errors
/// - 400 Bad Request: Malformed multipart body or no `file` field
/// - 500 Internal Server Error: Any pipeline failure (no partial results)
pub async fn analyze_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(|| ApiError::ValidationError {
        field: FILE_FIELD.to_string(),
        message: "file is required".to_string(),
    })?;

    if bytes.is_empty() {
        return Err(ApiError::ValidationError {
            field: FILE_FIELD.to_string(),
            message: "file is empty".to_string(),
        });
    }

    debug!("Analyze request: {} ({} bytes)", filename, bytes.len());

    let result = state
        .pipeline
        .analyze(&bytes, &filename)
        .await
        .map_err(|e| {
            warn!("Error: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(result))
}
