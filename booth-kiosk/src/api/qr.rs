//! On-demand QR retrieval

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::registry::QrRequest;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct QrResponse {
    pub success: bool,
    pub qr_b64: String,
    pub qr_url: String,
}

/// GET /api/generate-qr/:hash
///
/// Returns the stored QR image, generating it first if the background job has
/// not finished or previously failed.
pub async fn generate_qr(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> ApiResult<Json<QrResponse>> {
    // Lock released before encoding
    let request = state.registry.read().await.qr_request(&hash)?;

    let (qr_b64, qr_url) = match request {
        QrRequest::Ready { qr_b64, qr_url } => (qr_b64, qr_url),
        QrRequest::Pending(job) => {
            let qr_b64 = state
                .qr
                .fulfil(&state.registry, &job)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("session {}", hash)))?;
            (qr_b64, job.url)
        }
    };

    Ok(Json(QrResponse {
        success: true,
        qr_b64,
        qr_url,
    }))
}
