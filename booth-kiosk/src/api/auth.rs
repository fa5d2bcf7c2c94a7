//! Admin authentication middleware
//!
//! Admin routes carry the password as `?auth=<password>`. With no password
//! configured the admin surface is disabled and every request is refused.

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use booth_common::auth::{check_admin_password, AdminAuth};
use serde::Deserialize;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    auth: Option<String>,
}

/// Authentication middleware
///
/// Applied to admin routes only.
pub async fn admin_middleware(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match check_admin_password(state.admin_password.as_deref(), query.auth.as_deref()) {
        AdminAuth::Granted => Ok(next.run(request).await),
        AdminAuth::Denied => {
            warn!(path = %request.uri().path(), "Admin request rejected");
            Err(ApiError::Unauthorized("invalid admin credential".to_string()))
        }
        AdminAuth::Disabled => Err(ApiError::Unauthorized(
            "admin endpoints are disabled".to_string(),
        )),
    }
}
