//! Session query and command endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::qr::spawn_qr_job;
use crate::registry::{self, SessionRecord};
use crate::AppState;

/// GET /api/photos
///
/// Gallery feed: sessions with a usable final image, newest first.
pub async fn list_photos(State(state): State<AppState>) -> Json<Vec<SessionRecord>> {
    Json(state.registry.read().await.list_valid())
}

/// GET /api/session/:hash
pub async fn get_session(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> ApiResult<Json<SessionRecord>> {
    let registry = state.registry.read().await;
    Ok(Json(registry.get(&hash)?.clone()))
}

/// POST /api/create-session body
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub folder_name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub success: bool,
    pub hash: String,
    pub qr_url: String,
}

/// POST /api/create-session
///
/// QR generation starts in the background; the response does not wait for it.
/// Unreadable bodies get the same JSON error envelope as missing fields.
pub async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> ApiResult<Json<CreateSessionResponse>> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let (Some(folder_name), Some(session_id)) = (request.folder_name, request.session_id) else {
        return Err(ApiError::BadRequest(
            "folder_name and session_id are required".to_string(),
        ));
    };

    let job = state
        .registry
        .write()
        .await
        .create_explicit(&folder_name, &session_id)?;

    let response = CreateSessionResponse {
        success: true,
        hash: job.hash.clone(),
        qr_url: job.url.clone(),
    };
    spawn_qr_job(state.registry.clone(), state.qr.clone(), job);
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct DeleteSessionResponse {
    pub success: bool,
    pub message: String,
    pub errors: Vec<String>,
}

/// DELETE /api/delete-session/:hash?auth=<password>
///
/// `success` is false when some files could not be removed; the session is
/// gone from the registry either way.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> ApiResult<Json<DeleteSessionResponse>> {
    let report = registry::delete_session(&state.registry, &state.layout, &hash).await?;
    info!(hash = %hash, "{}", report.message());

    Ok(Json(DeleteSessionResponse {
        success: !report.is_partial_failure(),
        message: report.message(),
        errors: report.errors,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PhotoQuery {
    pub token: Option<String>,
}

/// Data behind the mobile result page
#[derive(Debug, Serialize)]
pub struct PhotoDetails {
    pub hash: String,
    pub final_img: Option<String>,
    pub qr_b64: Option<String>,
    pub created_at: f64,
    /// `created_at` rendered as `YYYY-MM-DD HH:MM:SS` UTC
    pub date: String,
}

/// GET /api/photo/:hash?token=<access token>
///
/// Sessions without an access token (created from output files) are never
/// viewable here.
pub async fn photo_details(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    Query(query): Query<PhotoQuery>,
) -> ApiResult<Json<PhotoDetails>> {
    let registry = state.registry.read().await;
    let record = registry.get(&hash)?;

    let authorized = match (&record.access_token, &query.token) {
        (Some(expected), Some(provided)) => expected == provided,
        _ => false,
    };
    if !authorized {
        return Err(ApiError::Forbidden("invalid access token".to_string()));
    }

    Ok(Json(PhotoDetails {
        hash: record.hash.clone(),
        final_img: record.final_img.clone(),
        qr_b64: record.qr_b64.clone(),
        created_at: record.created_at,
        date: format_timestamp(record.created_at),
    }))
}

fn format_timestamp(seconds: f64) -> String {
    DateTime::from_timestamp_millis((seconds * 1000.0) as i64)
        .map(|stamp| stamp.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
