//! POST /predict - screen an uploaded image.

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::api::errors::PredictError;
use crate::api::http_server::AppState;
use crate::screening::{self, Verdict};
use crate::vision::decode_image_bytes;

use super::response::PredictResponse;

/// Accepts a multipart form with a single file field containing image bytes
/// and returns the screening verdict.
///
/// Errors anywhere in the decode/infer/evaluate chain are reported inside
/// the JSON envelope with HTTP 200; existing clients switch on the `status`
/// field, not the status code.
pub async fn predict_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Json<PredictResponse> {
    match run_predict(&state, multipart).await {
        Ok(verdict) => {
            info!(
                "Screening verdict: detected={} confidence={:.4}",
                verdict.detected, verdict.confidence
            );
            Json(PredictResponse::from_verdict(&verdict))
        }
        Err(e) => {
            warn!("Predict request failed: {}", e);
            Json(PredictResponse::Error {
                message: e.to_string(),
            })
        }
    }
}

async fn run_predict(state: &AppState, multipart: Multipart) -> Result<Verdict, PredictError> {
    let bytes = read_upload(multipart).await?;

    let (image, image_info) = decode_image_bytes(&bytes)?;
    debug!(
        "Decoded upload: {}x{} {:?}, {} bytes",
        image_info.width, image_info.height, image_info.format, image_info.size_bytes
    );

    let detections = state.detector.infer(&image)?;
    debug!("Model returned {} detections", detections.len());

    Ok(screening::evaluate(&detections))
}

/// Pulls the uploaded file out of the multipart body.
///
/// The first field carrying a filename wins; a field literally named `file`
/// is accepted even without one.
async fn read_upload(mut multipart: Multipart) -> Result<Bytes, PredictError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PredictError::Upload(e.to_string()))?
    {
        if field.file_name().is_some() || field.name() == Some("file") {
            return field
                .bytes()
                .await
                .map_err(|e| PredictError::Upload(e.to_string()));
        }
    }

    Err(PredictError::MissingFile)
}
