//! Gallery fallback and promotion endpoints

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use std::io::ErrorKind;
use std::time::SystemTime;
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /output-list
///
/// `.png` names in the output directory, most recently modified first. A
/// missing directory yields an empty list.
pub async fn output_list(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let mut reader = match tokio::fs::read_dir(&state.layout.output_dir).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Json(Vec::new())),
        Err(e) => return Err(ApiError::Internal(format!("Cannot read output directory: {}", e))),
    };

    let mut files: Vec<(SystemTime, String)> = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| ApiError::Internal(format!("Cannot read output directory: {}", e)))?
    {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.ends_with(".png") {
            continue;
        }
        // Vanished between listing and stat
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((modified, name));
    }

    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    Ok(Json(files.into_iter().map(|(_, name)| name).collect()))
}

/// GET /promo/random
///
/// Redirects (303) to the final image of a random session.
pub async fn promo_random(State(state): State<AppState>) -> ApiResult<Response> {
    let registry = state.registry.read().await;
    let final_img = registry
        .random_final()
        .and_then(|record| record.final_img.as_deref())
        .ok_or_else(|| ApiError::NotFound("no photos yet".to_string()))?;

    Ok(Redirect::to(&location_for(final_img)?).into_response())
}

/// Absolute URL path for a root-relative storage path, one encoded segment per
/// path component
fn location_for(relative: &str) -> ApiResult<String> {
    let mut url = Url::parse("http://localhost/")
        .map_err(|e| ApiError::Internal(format!("Invalid redirect base: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::Internal("Redirect base cannot hold a path".to_string()))?
        .clear()
        .extend(relative.split('/').filter(|part| !part.is_empty()));
    Ok(url.path().to_string())
}
