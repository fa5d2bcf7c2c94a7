//! booth-kiosk library - photo-booth session service
//!
//! Watches the kiosk's storage tree, keeps the in-memory session registry in
//! step with it, and serves the gallery, QR and admin HTTP API.

use axum::http::{header, HeaderValue};
use axum::Router;
use booth_common::StorageLayout;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod error;
pub mod qr;
pub mod reconciler;
pub mod registry;

pub use error::{ApiError, ApiResult};

use api::ApiRateLimiter;
use qr::QrService;
use registry::SharedRegistry;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: SharedRegistry,
    pub layout: Arc<StorageLayout>,
    pub qr: QrService,
    /// `None` disables admin endpoints
    pub admin_password: Option<Arc<str>>,
    pub rate_limiter: Arc<ApiRateLimiter>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        registry: SharedRegistry,
        layout: Arc<StorageLayout>,
        qr: QrService,
        admin_password: Option<&str>,
    ) -> Self {
        Self {
            registry,
            layout,
            qr,
            admin_password: admin_password.map(Arc::from),
            rate_limiter: Arc::new(api::api_rate_limiter()),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// `/api/*` is rate limited per client; the delete route additionally
/// requires the admin password.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post};

    let admin = Router::new()
        .route("/api/delete-session/:hash", delete(api::delete_session))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::admin_middleware,
        ));

    let limited = Router::new()
        .route("/api/photos", get(api::list_photos))
        .route("/api/generate-qr/:hash", get(api::generate_qr))
        .route("/api/session/:hash", get(api::get_session))
        .route("/api/create-session", post(api::create_session))
        .route("/api/photo/:hash", get(api::photo_details))
        .merge(admin)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::rate_limit_middleware,
        ));

    let public = Router::new()
        .route("/output-list", get(api::output_list))
        .route("/promo/random", get(api::promo_random))
        .merge(api::health_routes());

    Router::new()
        .merge(limited)
        .merge(public)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("same-origin"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
